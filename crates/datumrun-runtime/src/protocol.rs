//! The runtime/controller message protocol.
//!
//! One message shape in both directions: a command tag plus a free-form
//! JSON data object. The [`CommunicationBackend`] trait owns the
//! request/response contract; transports only move messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use datumrun_core::{DatumDefinition, JobDefinition};

/// Command tag of a protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    // runtime -> controller
    GetJob,
    JobFinished,
    CreateDatum,
    CommitDatum,
    // controller -> runtime
    JobDefinition,
    DatumDefinition,
    Ack,
    Stop,
    Error,
}

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub command: Command,

    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Message {
    /// A message with an empty data object.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            data: empty_object(),
        }
    }

    /// A message carrying a serializable payload.
    pub fn with_data<T: Serialize>(command: Command, data: &T) -> Result<Self, ProtocolError> {
        Ok(Self {
            command,
            data: serde_json::to_value(data)?,
        })
    }

    /// An error message carrying a `msg` field.
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            command: Command::Error,
            data: serde_json::json!({ "msg": msg.into() }),
        }
    }
}

/// Errors from the protocol layer.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The controller answered with a command the request does not allow.
    #[error("Unexpected response to {sent:?}: {received:?}")]
    UnexpectedResponse { sent: Command, received: Command },

    /// The controller reported a failure.
    #[error("Controller error: {0}")]
    ErrorResponse(String),

    /// A marked line did not decode as a message.
    #[error("Malformed protocol line: {0}")]
    MalformedMessage(String),

    /// The channel reached EOF before a protocol line arrived.
    #[error("Protocol channel closed")]
    ChannelClosed,

    #[error("Protocol serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Protocol I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode the `msg` field of an ERROR response.
fn error_response(message: &Message) -> ProtocolError {
    let msg = message
        .data
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or("unspecified controller error");
    ProtocolError::ErrorResponse(msg.to_owned())
}

/// A channel to the controller.
///
/// Implementors provide message exchange; the provided methods
/// implement the request/response contract on top of it.
pub trait CommunicationBackend {
    /// Send one message and block for the controller's response.
    fn send_message(&mut self, message: Message) -> Result<Message, ProtocolError>;

    /// Ask for the next job. `None` means the controller said STOP.
    fn get_job(&mut self) -> Result<Option<JobDefinition>, ProtocolError> {
        let response = self.send_message(Message::new(Command::GetJob))?;
        match response.command {
            Command::JobDefinition => Ok(Some(serde_json::from_value(response.data)?)),
            Command::Stop => Ok(None),
            Command::Error => Err(error_response(&response)),
            received => Err(ProtocolError::UnexpectedResponse {
                sent: Command::GetJob,
                received,
            }),
        }
    }

    /// Ask the controller to allocate a fresh datum.
    fn create_datum(&mut self) -> Result<DatumDefinition, ProtocolError> {
        let response = self.send_message(Message::new(Command::CreateDatum))?;
        match response.command {
            Command::DatumDefinition => Ok(serde_json::from_value(response.data)?),
            Command::Error => Err(error_response(&response)),
            received => Err(ProtocolError::UnexpectedResponse {
                sent: Command::CreateDatum,
                received,
            }),
        }
    }

    /// Report one datum as committed.
    fn commit_datum(&mut self, definition: &DatumDefinition) -> Result<(), ProtocolError> {
        let response =
            self.send_message(Message::with_data(Command::CommitDatum, definition)?)?;
        match response.command {
            Command::Ack => Ok(()),
            Command::Error => Err(error_response(&response)),
            received => Err(ProtocolError::UnexpectedResponse {
                sent: Command::CommitDatum,
                received,
            }),
        }
    }

    /// Report a whole job as finished.
    fn notify_job_completion(&mut self, job: &JobDefinition) -> Result<(), ProtocolError> {
        let response = self.send_message(Message::with_data(Command::JobFinished, job)?)?;
        match response.command {
            Command::Ack => Ok(()),
            Command::Error => Err(error_response(&response)),
            received => Err(ProtocolError::UnexpectedResponse {
                sent: Command::JobFinished,
                received,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datumrun_core::{DatumKind, TaskDefinition};
    use serde_json::json;
    use std::collections::VecDeque;

    /// Backend answering from a fixed script; records what was sent.
    struct Scripted {
        responses: VecDeque<Message>,
        sent: Vec<Message>,
    }

    impl Scripted {
        fn new(responses: Vec<Message>) -> Self {
            Self {
                responses: responses.into(),
                sent: Vec::new(),
            }
        }
    }

    impl CommunicationBackend for Scripted {
        fn send_message(&mut self, message: Message) -> Result<Message, ProtocolError> {
            self.sent.push(message);
            self.responses
                .pop_front()
                .ok_or(ProtocolError::ChannelClosed)
        }
    }

    #[test]
    fn test_command_wire_names() {
        assert_eq!(
            serde_json::to_value(Command::GetJob).unwrap(),
            json!("GET_JOB")
        );
        assert_eq!(
            serde_json::to_value(Command::JobFinished).unwrap(),
            json!("JOB_FINISHED")
        );
        assert_eq!(
            serde_json::to_value(Command::DatumDefinition).unwrap(),
            json!("DATUM_DEFINITION")
        );
    }

    #[test]
    fn test_message_data_defaults_to_empty_object() {
        let message: Message = serde_json::from_value(json!({ "command": "STOP" })).unwrap();
        assert_eq!(message.data, json!({}));
    }

    #[test]
    fn test_get_job_decodes_job_definition() {
        let job = JobDefinition::new(vec![TaskDefinition::new("copy_object")]);
        let mut backend = Scripted::new(vec![
            Message::with_data(Command::JobDefinition, &job).unwrap()
        ]);
        assert_eq!(backend.get_job().unwrap(), Some(job));
        assert_eq!(backend.sent[0].command, Command::GetJob);
    }

    #[test]
    fn test_get_job_stop_means_none() {
        let mut backend = Scripted::new(vec![Message::new(Command::Stop)]);
        assert_eq!(backend.get_job().unwrap(), None);
    }

    #[test]
    fn test_unexpected_response_is_rejected() {
        let mut backend = Scripted::new(vec![Message::new(Command::Ack)]);
        assert!(matches!(
            backend.get_job(),
            Err(ProtocolError::UnexpectedResponse {
                sent: Command::GetJob,
                received: Command::Ack,
            })
        ));
    }

    #[test]
    fn test_error_response_decodes_msg_field() {
        let mut backend = Scripted::new(vec![Message::error("no jobs for you")]);
        match backend.get_job() {
            Err(ProtocolError::ErrorResponse(msg)) => assert_eq!(msg, "no jobs for you"),
            other => panic!("expected error response, got {other:?}"),
        }
    }

    #[test]
    fn test_commit_datum_expects_ack() {
        let definition = DatumDefinition::new("/data/out", DatumKind::Object);
        let mut backend = Scripted::new(vec![Message::new(Command::Ack)]);
        backend.commit_datum(&definition).unwrap();

        assert_eq!(backend.sent[0].command, Command::CommitDatum);
        assert_eq!(
            backend.sent[0].data,
            serde_json::to_value(&definition).unwrap()
        );
    }

    #[test]
    fn test_create_datum_decodes_definition() {
        let definition = DatumDefinition::new("/data/fresh", DatumKind::NotYetKnown);
        let mut backend = Scripted::new(vec![
            Message::with_data(Command::DatumDefinition, &definition).unwrap(),
        ]);
        assert_eq!(backend.create_datum().unwrap(), definition);
    }
}
