//! Core domain errors.
//!
//! One enum per failure class. Nothing in this crate retries: every
//! error propagates with `?` until it reaches the runtime loop and
//! then the process boundary.

use std::path::Path;

use thiserror::Error;

use crate::datum::DatumKind;

/// Errors raised while building a component descriptor.
///
/// Fatal at registration time; a component with a broken signature
/// never reaches the catalog.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    /// Parameter carries no annotation and is not a reserved context name.
    #[error("Parameter '{0}' is missing an annotation")]
    MissingAnnotation(String),

    /// Annotation cannot be classified into a slot, option, or context.
    #[error("Parameter '{name}' has an unsupported annotation: {reason}")]
    UnsupportedAnnotation { name: String, reason: String },

    /// Two metadata items set the same bound on one parameter.
    #[error("Parameter '{name}' declares conflicting {bound} bounds")]
    ConflictingBound { name: String, bound: String },

    /// The same parameter name is declared twice.
    #[error("Parameter '{0}' is declared more than once")]
    DuplicateParameter(String),

    /// More than one parameter claims the context handle.
    #[error("Component declares two context parameters: '{0}' and '{1}'")]
    DuplicateContext(String, String),

    /// A non-required option has a default that does not cast to its type.
    #[error("Option '{name}' has an invalid default: {reason}")]
    InvalidDefault { name: String, reason: String },
}

/// Errors raised while validating a task against a descriptor.
///
/// Fatal per task; aborts the task and propagates to the runtime loop.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// The number of provided bindings differs from the declared slots.
    #[error("Expected {declared} {direction} slots, got {provided}")]
    SlotCountMismatch {
        direction: String,
        declared: usize,
        provided: usize,
    },

    /// The task binds a slot name the descriptor does not declare.
    #[error("Unknown {direction} slot '{name}'")]
    UnknownSlot { direction: String, name: String },

    /// A required slot resolved to no datum.
    #[error("Slot '{0}' is required but not provided")]
    RequiredSlotMissing(String),

    /// A single-datum slot received a list of datums.
    #[error("Slot '{0}' expects exactly one datum, got a list")]
    MultiplicityMismatch(String),

    /// A datum of the wrong kind was bound to a slot.
    #[error("Slot '{name}' is of kind {expected} but the provided datum is {actual}")]
    KindMismatch {
        name: String,
        expected: DatumKind,
        actual: DatumKind,
    },

    /// The task supplies an option the descriptor does not declare.
    #[error("Unknown option '{0}'")]
    UnknownOption(String),

    /// A required option is absent and has no default.
    #[error("Option '{0}' is required but not provided")]
    MissingOption(String),

    /// An option value failed casting, bounds, or choices checks.
    #[error("Invalid value for option '{name}': {reason}")]
    InvalidOptionValue { name: String, reason: String },
}

/// A mutation was attempted on a committed datum.
///
/// Signals a component-author bug; committed datums are frozen.
#[derive(Debug, Error, PartialEq)]
#[error("Datum at '{path}' is already committed")]
pub struct CommitError {
    path: String,
}

impl CommitError {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
        }
    }
}

/// A datum kind was used where the type system forbids it.
#[derive(Debug, Error, PartialEq)]
pub enum UnsupportedTypeError {
    /// Only datums of kind `NOT_YET_KNOWN` support promotion.
    #[error("A datum of kind {0} is already concrete and cannot be promoted")]
    NotPromotable(DatumKind),

    /// Promotion must target a concrete kind.
    #[error("Cannot promote a datum to kind {0}")]
    InvalidPromotionTarget(DatumKind),

    /// Factories mint concrete children only.
    #[error("A factory cannot mint a child datum of kind {0}")]
    InvalidChildKind(DatumKind),
}

/// Errors from datum materialization and persistence.
#[derive(Debug, Error)]
pub enum DatumError {
    #[error("I/O failure at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A single-file datum folder contains more than one candidate file.
    #[error("Ambiguous single-file datum at '{path}': found {count} files")]
    AmbiguousFile { path: String, count: usize },

    /// A load was requested before any data file exists.
    #[error("No data file found at '{path}'")]
    MissingFile { path: String },

    /// Encoding or decoding through a datum codec failed.
    #[error("Codec failure at '{path}': {reason}")]
    Codec { path: String, reason: String },

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedTypeError),
}

impl DatumError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn codec(path: &Path, reason: impl ToString) -> Self {
        Self::Codec {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn missing_file(path: &Path) -> Self {
        Self::MissingFile {
            path: path.display().to_string(),
        }
    }
}

/// Errors from catalog resolution.
#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    #[error("Unknown library '{0}'")]
    UnknownLibrary(String),

    #[error("Unknown component '{component}' in library '{library}'")]
    UnknownComponent { library: String, component: String },
}

/// A component signalled failure while running.
#[derive(Debug, Error)]
#[error("Component execution failed: {0}")]
pub struct ExecutionError(String);

impl ExecutionError {
    /// Create an execution error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<DatumError> for ExecutionError {
    fn from(err: DatumError) -> Self {
        Self(err.to_string())
    }
}

impl From<CommitError> for ExecutionError {
    fn from(err: CommitError) -> Self {
        Self(err.to_string())
    }
}
