//! LogoPlace Application
//!
//! Replay shell around the core: loads a scripted configuration session,
//! drives it through the session store and gesture engine, and reports the
//! resulting configuration, quote and print layout.

mod replay;
mod script;

pub use replay::{Rejection, Report, run_script};
pub use script::{BlueprintResponse, LogoSource, Script, ScriptGeometry, ScriptPointer, Step};

use logoplace_core::{Settings, SettingsError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("step {step}: invalid base64 logo data: {source}")]
    Logo {
        step: usize,
        #[source]
        source: base64::DecodeError,
    },
    #[error("step {step}: no logo with index {index}")]
    UnknownLogo { step: usize, index: usize },
}

fn read(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate engine settings from a JSON file.
pub fn load_settings(path: &Path) -> Result<Settings, AppError> {
    let settings = Settings::from_json(&read(path)?)?;
    log::info!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load a replay script from a JSON file.
pub fn load_script(path: &Path) -> Result<Script, AppError> {
    Ok(serde_json::from_str(&read(path)?)?)
}
