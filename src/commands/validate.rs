use std::fs;
use std::path::Path;

use colored::Colorize;
use serde_json::{Value, json};

use crate::error::Result;
use crate::layout::{
    self, AGENT_FILES, AGENTS_DIR, CLAUDE_DIR, COMMANDS_DIR, CORE_DIR, CORE_DOCS, HANDOFF_FILE,
    HOOKS_DIR, REQUIRED_COMMANDS, REQUIRED_HOOKS, SETTINGS_FILE,
};
use crate::output::Format;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub level: Level,
    pub message: String,
}

impl Finding {
    fn warn(msg: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            message: msg.into(),
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: msg.into(),
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "level": match self.level {
                Level::Warn => "warn",
                Level::Error => "error",
            },
            "message": self.message,
        })
    }
}

/// Every problem found in the installed configuration. Empty means valid.
pub fn check(project_dir: &Path) -> Vec<Finding> {
    let mut findings = Vec::new();

    if layout::rel(project_dir, CLAUDE_DIR).is_dir() {
        check_settings(&mut findings, project_dir);
        check_agents(&mut findings, project_dir);
        check_commands(&mut findings, project_dir);
        check_hooks(&mut findings, project_dir);
    } else {
        findings.push(Finding::error(format!("{CLAUDE_DIR}/ directory is missing")));
    }

    check_docs(&mut findings, project_dir);
    check_handoff(&mut findings, project_dir);
    findings
}

fn check_settings(findings: &mut Vec<Finding>, root: &Path) {
    let path = layout::rel(root, SETTINGS_FILE);
    let Ok(data) = fs::read_to_string(&path) else {
        findings.push(Finding::error(format!("{SETTINGS_FILE} is missing")));
        return;
    };
    match serde_json::from_str::<Value>(&data) {
        Ok(val) if val.get("hooks").is_none() => {
            findings.push(Finding::warn("settings.json does not configure hooks"));
        }
        Ok(_) => {}
        Err(_) => findings.push(Finding::error("settings.json is malformed")),
    }
}

fn check_agents(findings: &mut Vec<Finding>, root: &Path) {
    let dir = layout::rel(root, AGENTS_DIR);
    if !dir.is_dir() {
        findings.push(Finding::error(format!("{AGENTS_DIR}/ directory is missing")));
        return;
    }
    for agent in AGENT_FILES {
        if !dir.join(agent).exists() {
            findings.push(Finding::error(format!("missing agent: {agent}")));
        }
    }
}

fn check_commands(findings: &mut Vec<Finding>, root: &Path) {
    let dir = layout::rel(root, COMMANDS_DIR);
    if !dir.is_dir() {
        findings.push(Finding::warn(format!("{COMMANDS_DIR}/ directory is missing")));
        return;
    }
    for command in REQUIRED_COMMANDS {
        if !dir.join(command).exists() {
            findings.push(Finding::warn(format!("missing command: {command}")));
        }
    }
}

fn check_hooks(findings: &mut Vec<Finding>, root: &Path) {
    let dir = layout::rel(root, HOOKS_DIR);
    if !dir.is_dir() {
        findings.push(Finding::warn(format!("{HOOKS_DIR}/ directory is missing")));
        return;
    }
    for hook in REQUIRED_HOOKS {
        let path = dir.join(hook);
        if !path.exists() {
            findings.push(Finding::warn(format!("missing hook: {hook}")));
        } else if !is_executable(&path) {
            findings.push(Finding::warn(format!("hook is not executable: {hook}")));
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

fn check_docs(findings: &mut Vec<Finding>, root: &Path) {
    let core = layout::rel(root, CORE_DIR);
    if !core.is_dir() {
        findings.push(Finding::warn(format!("{CORE_DIR}/ directory is missing")));
        return;
    }
    for doc in CORE_DOCS {
        if !core.join(doc.name).exists() {
            findings.push(Finding::warn(format!("missing core document: {}", doc.name)));
        }
    }
}

fn check_handoff(findings: &mut Vec<Finding>, root: &Path) {
    let path = layout::rel(root, HANDOFF_FILE);
    let Ok(data) = fs::read_to_string(&path) else {
        findings.push(Finding::warn(format!("missing task hand-off file: {HANDOFF_FILE}")));
        return;
    };
    if let Err(e) = serde_yaml::from_str::<serde_yaml::Value>(&data) {
        findings.push(Finding::warn(format!("{HANDOFF_FILE} is not valid YAML: {e}")));
    }
}

pub fn run(project_dir: &Path, format: Format) -> Result<()> {
    let findings = check(project_dir);
    let errors = findings.iter().filter(|f| f.level == Level::Error).count();
    let warnings = findings.len() - errors;

    match format {
        Format::Json => {
            let arr: Vec<Value> = findings.iter().map(Finding::to_json).collect();
            let output = json!({
                "valid": errors == 0,
                "findings": arr,
                "summary": { "warnings": warnings, "errors": errors },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            if findings.is_empty() {
                eprintln!("{}", "configuration is valid".green());
            }
            for finding in &findings {
                let prefix = match finding.level {
                    Level::Warn => "warn".yellow().to_string(),
                    Level::Error => " ERR".red().bold().to_string(),
                };
                eprintln!("  {}  {}", prefix, finding.message);
            }
            if !findings.is_empty() {
                eprintln!();
                eprintln!(
                    "{} warnings, {} errors",
                    warnings.to_string().yellow(),
                    if errors > 0 {
                        errors.to_string().red().bold().to_string()
                    } else {
                        errors.to_string()
                    },
                );
            }
        }
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
