//! Object datums: one serialized value per datum, codec picked by
//! file extension.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::datum::{locate_single_file, DatumDefinition};
use crate::error::{CommitError, DatumError};

/// Base name used when an object datum writes its first file.
const OBJECT_FILE_STEM: &str = "object";

/// Serialization format of an object datum file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFormat {
    Pickle,
    Json,
    Yaml,
    Toml,
}

impl ObjectFormat {
    /// Pick a format from a file extension. Unrecognized extensions
    /// fall back to pickle; the caller remembers the choice so a later
    /// `set` stays symmetric.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            _ => Self::Pickle,
        }
    }

    /// Canonical extension for files written in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pickle => "pkl",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }

    fn decode(&self, bytes: &[u8], path: &Path) -> Result<Value, DatumError> {
        match self {
            Self::Pickle => serde_pickle::from_slice(bytes, serde_pickle::DeOptions::new())
                .map_err(|e| DatumError::codec(path, e)),
            Self::Json => serde_json::from_slice(bytes).map_err(|e| DatumError::codec(path, e)),
            Self::Yaml => serde_yaml::from_slice(bytes).map_err(|e| DatumError::codec(path, e)),
            Self::Toml => {
                let text =
                    std::str::from_utf8(bytes).map_err(|e| DatumError::codec(path, e))?;
                toml::from_str(text).map_err(|e| DatumError::codec(path, e))
            }
        }
    }

    fn encode(&self, value: &Value, path: &Path) -> Result<Vec<u8>, DatumError> {
        match self {
            Self::Pickle => serde_pickle::to_vec(value, serde_pickle::SerOptions::new())
                .map_err(|e| DatumError::codec(path, e)),
            Self::Json => serde_json::to_vec_pretty(value).map_err(|e| DatumError::codec(path, e)),
            Self::Yaml => serde_yaml::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| DatumError::codec(path, e)),
            Self::Toml => toml::to_string_pretty(value)
                .map(String::into_bytes)
                .map_err(|e| DatumError::codec(path, e)),
        }
    }
}

/// A datum holding one serialized object.
///
/// Values are neutral JSON; the on-disk codec is inferred from the file
/// extension on first access and remembered for later writes.
#[derive(Debug)]
pub struct ObjectDatum {
    pub(super) definition: DatumDefinition,
    pub(super) committed: bool,
    value: Option<Value>,
    format: Option<ObjectFormat>,
    file_name: Option<String>,
}

impl ObjectDatum {
    pub(super) fn new(definition: DatumDefinition) -> Self {
        Self {
            definition,
            committed: false,
            value: None,
            format: None,
            file_name: None,
        }
    }

    /// Decode the located object file; cached after the first read.
    pub fn get(&mut self) -> Result<Value, DatumError> {
        if let Some(value) = &self.value {
            return Ok(value.clone());
        }
        let dir = &self.definition.path;
        let file_name = locate_single_file(dir)?.ok_or_else(|| DatumError::missing_file(dir))?;
        let format = ObjectFormat::from_extension(extension_of(&file_name));
        let file_path = dir.join(&file_name);
        let bytes = fs::read(&file_path).map_err(|e| DatumError::io(&file_path, e))?;
        let value = format.decode(&bytes, &file_path)?;
        self.format = Some(format);
        self.file_name = Some(file_name);
        self.value = Some(value.clone());
        Ok(value)
    }

    /// Serialize a value with the remembered/inferred codec and mark
    /// the datum committed.
    ///
    /// Object datums commit synchronously on write; this asymmetry with
    /// dataframe datums is part of the contract.
    pub fn set(&mut self, value: Value) -> Result<(), DatumError> {
        if self.committed {
            return Err(CommitError::new(&self.definition.path).into());
        }
        let dir = self.definition.path.clone();
        let format = match self.format {
            Some(format) => format,
            None => {
                // No format remembered yet: infer from an existing file,
                // defaulting to pickle for a fresh datum.
                let format = match locate_single_file(&dir)? {
                    Some(name) => {
                        let format = ObjectFormat::from_extension(extension_of(&name));
                        self.file_name = Some(name);
                        format
                    }
                    None => ObjectFormat::Pickle,
                };
                self.format = Some(format);
                format
            }
        };
        let file_name = self
            .file_name
            .clone()
            .unwrap_or_else(|| format!("{OBJECT_FILE_STEM}.{}", format.extension()));
        fs::create_dir_all(&dir).map_err(|e| DatumError::io(&dir, e))?;
        let file_path = dir.join(&file_name);
        let bytes = format.encode(&value, &file_path)?;
        fs::write(&file_path, bytes).map_err(|e| DatumError::io(&file_path, e))?;
        self.file_name = Some(file_name);
        self.value = Some(value);
        self.committed = true;
        Ok(())
    }

    /// Drop the cached value; codec and file name stay remembered.
    pub fn clear(&mut self) {
        self.value = None;
    }

    /// The remembered codec, if one was inferred yet.
    pub fn format(&self) -> Option<ObjectFormat> {
        self.format
    }
}

fn extension_of(file_name: &str) -> &str {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}
