use std::path::PathBuf;

use thiserror::Error;

use crate::migrate::executor::Step;

#[derive(Debug, Error)]
pub enum JvibeError {
    #[error("no jvibe configuration found (expected .claude/ or docs/ in the project directory)")]
    NotInitialized,

    #[error("template directory '{0}' is missing or incomplete")]
    TemplateMissing(PathBuf),

    #[error("settings file '{0}' is not a JSON object")]
    InvalidSettings(PathBuf),

    #[error("refusing to overwrite existing file '{0}'")]
    DestinationExists(PathBuf),

    #[error("confirmation required on a non-interactive terminal (pass --force to proceed)")]
    ConfirmationRequired,

    #[error("cancelled by user")]
    Cancelled,

    #[error("migration step '{step}' failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: Box<JvibeError>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl JvibeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::TemplateMissing(_) => "template_missing",
            Self::InvalidSettings(_) => "invalid_settings",
            Self::DestinationExists(_) => "destination_exists",
            Self::ConfirmationRequired => "confirmation_required",
            Self::Cancelled => "cancelled",
            Self::Step { source, .. } => source.code(),
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Yaml(_) => "yaml_error",
        }
    }

    /// Wrap an error with the executor step it escaped from.
    pub fn at_step(self, step: Step) -> Self {
        match self {
            already @ Self::Step { .. } => already,
            other => Self::Step {
                step,
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, JvibeError>;
