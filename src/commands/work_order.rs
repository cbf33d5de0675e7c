use std::fs;
use std::path::Path;

use serde_json::json;

use crate::commands::ensure_initialized;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::migrate::report;
use crate::migrate::{Catalog, Classifier};
use crate::output::{self, Format};

/// Render the AI work order for the project's current content drift.
///
/// Writes to `output_path` when given, otherwise prints the markdown to stdout.
pub fn run(
    project_dir: &Path,
    config: &EngineConfig,
    catalog: &Catalog,
    output_path: Option<&Path>,
    format: Format,
) -> Result<()> {
    ensure_initialized(project_dir)?;

    let info = Classifier::new(catalog, config).detect(project_dir);
    let text = report::work_order(catalog, info.version.as_deref(), &info.content_migration);

    if let (Some(path), Some(text)) = (output_path, &text) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
    }

    match format {
        Format::Json => {
            let written = output_path
                .filter(|_| text.is_some())
                .map(|p| p.display().to_string());
            let inline = text.as_deref().filter(|_| output_path.is_none());
            output::print_json(&json!({
                "required": text.is_some(),
                "files": info.content_migration.files,
                "path": written,
                "content": inline,
            }))?
        }
        _ => match (&text, output_path) {
            (None, _) => eprintln!("no content migration required"),
            (Some(_), Some(path)) => eprintln!("wrote work order to {}", path.display()),
            (Some(text), None) => print!("{text}"),
        },
    }
    Ok(())
}
