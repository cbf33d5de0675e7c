use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::error::Result;
use crate::migrate::report::{ProjectState, Summary};
use crate::migrate::ExecutionReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn state_label(state: ProjectState) -> String {
    let text = state.to_string();
    match state {
        ProjectState::Current => text.green().to_string(),
        ProjectState::ContentDrift => text.yellow().to_string(),
        ProjectState::Legacy | ProjectState::LegacyWithContentDrift => {
            text.red().bold().to_string()
        }
    }
}

/// Render a detection summary. Pretty output goes to stderr, minimal to stdout.
pub fn print_summary(summary: &Summary, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(summary)?,
        Format::Pretty => {
            let version = summary.version.as_deref().unwrap_or("unrecorded");
            eprintln!("{} {}", "version:".bold(), version);
            eprintln!("{} {}", "state:".bold(), state_label(summary.state));
            if !summary.legacy_indicators.is_empty() {
                eprintln!();
                eprintln!("{}", "Legacy indicators".bold());
                for indicator in &summary.legacy_indicators {
                    eprintln!("  {}  {}", "warn".yellow(), indicator);
                }
            }
            if !summary.tasks.is_empty() {
                eprintln!();
                eprintln!("{}", "Mechanical tasks".bold());
                for task in &summary.tasks {
                    eprintln!("  - {task}");
                }
            }
            if !summary.ai_tasks.is_empty() {
                eprintln!();
                eprintln!("{}", "Needs AI migration".bold());
                for task in &summary.ai_tasks {
                    eprintln!("  - {task}");
                }
                eprintln!(
                    "  files: {}",
                    summary.ai_files.join(", ").dimmed()
                );
            }
        }
        Format::Minimal => {
            println!(
                "{} {} tasks={} ai_tasks={}",
                summary.version.as_deref().unwrap_or("-"),
                serde_json::to_value(summary.state)?
                    .as_str()
                    .unwrap_or_default(),
                summary.tasks.len(),
                summary.ai_tasks.len()
            );
        }
    }
    Ok(())
}

/// Pretty/minimal rendering of an execution; JSON callers embed the report themselves.
pub fn print_execution(report: &ExecutionReport, format: Format) {
    match format {
        Format::Json => {}
        Format::Pretty => {
            eprintln!();
            eprintln!("{}", "Applied".bold());
            for step in &report.applied {
                eprintln!("  {}  {}", " ok ".green(), step);
            }
            for path in &report.normalized {
                eprintln!("  {}  normalized status markers in {}", " ok ".green(), path);
            }
            if let Some(dir) = &report.backup_dir {
                eprintln!("  backup: {}", dir.display().to_string().dimmed());
            }
        }
        Format::Minimal => {
            let applied: Vec<String> = report.applied.iter().map(|s| s.to_string()).collect();
            println!("applied {}", applied.join(","));
        }
    }
}
