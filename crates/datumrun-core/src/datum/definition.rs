//! Datum kinds and the serializable datum pointer.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind tag of a datum. The tag on a [`DatumDefinition`] decides which
/// concrete variant is constructed; dispatch is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatumKind {
    /// A plain directory; no assumptions about its content.
    Folder,
    /// A directory holding exactly one data file.
    File,
    /// A directory holding one columnar table file.
    #[serde(rename = "DATAFRAME")]
    DataFrame,
    /// A directory holding one serialized object file.
    Object,
    /// A datum that mints child datums under its own path.
    Factory,
    /// Concrete kind not decided yet; promoted later.
    NotYetKnown,
}

impl DatumKind {
    /// Whether this kind names a concrete on-disk layout.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::NotYetKnown)
    }
}

impl fmt::Display for DatumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Folder => "FOLDER",
            Self::File => "FILE",
            Self::DataFrame => "DATAFRAME",
            Self::Object => "OBJECT",
            Self::Factory => "FACTORY",
            Self::NotYetKnown => "NOT_YET_KNOWN",
        };
        write!(f, "{name}")
    }
}

/// Serializable pointer to on-disk data.
///
/// This is the only datum representation that crosses the wire; it
/// never carries loaded content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatumDefinition {
    /// Directory the datum materializes under.
    pub path: PathBuf,

    /// Kind tag selecting the concrete variant.
    pub kind: DatumKind,

    /// Content hash assigned by the controller; cache key. A definition
    /// without a hash is a fresh write target and is never cached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl DatumDefinition {
    /// Create a definition with no content hash.
    pub fn new(path: impl Into<PathBuf>, kind: DatumKind) -> Self {
        Self {
            path: path.into(),
            kind,
            content_hash: None,
        }
    }

    /// Builder method to attach a content hash.
    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    /// Copy of this definition with a different kind; used by promotion.
    pub fn with_kind(&self, kind: DatumKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    /// The datum path as a borrowed [`Path`].
    pub fn path(&self) -> &Path {
        &self.path
    }
}
