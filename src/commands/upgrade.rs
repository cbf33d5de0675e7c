use std::fs;
use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::commands::ensure_initialized;
use crate::config::{EngineConfig, UpgradeOptions};
use crate::error::{JvibeError, Result};
use crate::layout::{self, HANDOFF_DIR, SETTINGS_FILE, WORK_ORDER_FILE};
use crate::migrate::report::{self, Summary};
use crate::migrate::{self, Catalog, Classifier, ExecutionReport};
use crate::model::MigrationPlan;
use crate::output::{self, Format};
use crate::settings::{self, StampKind};

#[derive(Debug, Serialize)]
pub struct UpgradeOutcome {
    pub summary: Summary,
    pub plan: MigrationPlan,
    /// `None` for `--check` runs and projects that were already current.
    pub execution: Option<ExecutionReport>,
    /// Project-relative path of the written work order.
    pub work_order: Option<String>,
    /// Version recorded in settings once the run finished.
    pub version: Option<String>,
}

pub fn run(
    project_dir: &Path,
    config: &EngineConfig,
    catalog: &Catalog,
    options: UpgradeOptions,
    format: Format,
) -> Result<()> {
    ensure_initialized(project_dir)?;

    let classifier = Classifier::new(catalog, config);
    let info = classifier.detect(project_dir);
    let plan = migrate::plan(project_dir, &info);
    let mut outcome = UpgradeOutcome {
        summary: report::summary(&info, &plan),
        plan,
        execution: None,
        work_order: None,
        version: info.version.clone(),
    };

    let up_to_date =
        outcome.plan.is_noop() && info.version.as_deref() == Some(config.tool_version.as_str());
    if up_to_date || options.check {
        return finish(&outcome, format);
    }

    if !options.force {
        confirm(&outcome.plan)?;
    }

    let execution = migrate::execute(
        project_dir,
        &config.template_dir,
        &outcome.plan,
        &config.tool_version,
    )?;

    // Re-diff against the moved documents so the work order names canonical paths.
    let content = classifier.content_migration(project_dir, info.version.as_deref());
    if let Some(text) = report::work_order(catalog, info.version.as_deref(), &content) {
        fs::create_dir_all(layout::rel(project_dir, HANDOFF_DIR))?;
        fs::write(layout::rel(project_dir, WORK_ORDER_FILE), text)?;
        tracing::info!(path = WORK_ORDER_FILE, "wrote migration work order");
        outcome.work_order = Some(WORK_ORDER_FILE.to_string());
    }

    let settings_path = layout::rel(project_dir, SETTINGS_FILE);
    let recorded = settings::stamp_of(&settings::read_settings_or_default(&settings_path)?).version;
    if recorded.as_deref() != Some(config.tool_version.as_str()) {
        settings::stamp_version(&settings_path, &config.tool_version, StampKind::Upgraded)?;
    }
    outcome.version = Some(config.tool_version.clone());
    outcome.execution = Some(execution);

    finish(&outcome, format)
}

fn confirm(plan: &MigrationPlan) -> Result<()> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Err(JvibeError::ConfirmationRequired);
    }
    eprint!(
        "Apply {} migration task(s) to this project? [y/N] ",
        plan.tasks.len()
    );
    std::io::stderr().flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    match answer.trim() {
        "y" | "Y" | "yes" => Ok(()),
        _ => Err(JvibeError::Cancelled),
    }
}

fn finish(outcome: &UpgradeOutcome, format: Format) -> Result<()> {
    if format == Format::Json {
        return output::print_json(outcome);
    }

    output::print_summary(&outcome.summary, format)?;
    let Some(execution) = &outcome.execution else {
        return Ok(());
    };
    output::print_execution(execution, format);
    if format == Format::Pretty {
        if let Some(path) = &outcome.work_order {
            eprintln!(
                "{} AI migration work order written to {}",
                "note:".yellow().bold(),
                path
            );
        }
        if let Some(version) = &outcome.version {
            eprintln!("{} project is now at {}", "done:".green().bold(), version);
        }
    }
    Ok(())
}
