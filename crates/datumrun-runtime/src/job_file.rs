//! Job definitions loaded from files, extension-dispatched.

use std::fs;
use std::path::Path;

use thiserror::Error;

use datumrun_core::JobDefinition;

#[derive(Debug, Error)]
pub enum JobFileError {
    #[error("Cannot read job file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Job file '{path}' has an unsupported extension (expected json, yaml, yml or toml)")]
    UnsupportedExtension { path: String },

    #[error("Cannot parse job file '{path}': {reason}")]
    Parse { path: String, reason: String },
}

/// Load a job definition from a json, yaml, yml or toml file.
pub fn load_job_file(path: &Path) -> Result<JobDefinition, JobFileError> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| JobFileError::Read {
        path: display.clone(),
        source,
    })?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let parse = |reason: String| JobFileError::Parse {
        path: display.clone(),
        reason,
    };
    match extension.as_str() {
        "json" => serde_json::from_str(&text).map_err(|e| parse(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(&text).map_err(|e| parse(e.to_string())),
        "toml" => toml::from_str(&text).map_err(|e| parse(e.to_string())),
        _ => Err(JobFileError::UnsupportedExtension { path: display }),
    }
}
