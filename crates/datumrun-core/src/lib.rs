//! Datumrun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Process I/O or the wire protocol
//! - The runtime loop
//!
//! All types here represent the core business domain of datumrun:
//! datums and their definitions, component descriptors, the catalog,
//! and task/job definitions.

pub mod catalog;
pub mod component;
pub mod context;
pub mod datum;
pub mod descriptor;
pub mod error;
pub mod task;

// Re-export commonly used types
pub use catalog::{Catalog, DEFAULT_LIBRARY};
pub use component::{
    ComponentBuilder, ComponentDescriptor, ComponentLabel, Invocation, ParameterSpec,
    ParameterType, Runnable, SlotBinding, SlotDirection,
};
pub use context::Context;
pub use datum::{shared, Datum, DatumDefinition, DatumFactory, DatumKind, SharedDatum, Table};
pub use descriptor::{OptionDefinition, OptionType, OptionValue, SlotDefinition};
pub use error::{
    BuildError, CommitError, DatumError, ExecutionError, LookupError, UnsupportedTypeError,
    ValidationError,
};
pub use task::{DatumRef, JobDefinition, TaskDefinition};
