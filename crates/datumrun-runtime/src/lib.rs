//! Datumrun Execution Runtime
//!
//! Everything between the controller and the component code: the wire
//! protocol, the two communication backends (interactive stdio and
//! single-shot CLI), job file loading, and the task execution loop.

pub mod cli;
pub mod job_file;
pub mod protocol;
pub mod runtime;
pub mod stdio;

// Re-export commonly used types
pub use cli::{CliBackend, CliError};
pub use job_file::{load_job_file, JobFileError};
pub use protocol::{Command, CommunicationBackend, Message, ProtocolError};
pub use runtime::{Runtime, RuntimeError};
pub use stdio::{StdioBackend, IN_MARKER, OUT_MARKER};
