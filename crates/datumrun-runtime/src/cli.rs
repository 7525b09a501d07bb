//! Single-shot CLI backend.
//!
//! Parses argv into exactly one job and then answers the protocol from
//! memory: the job on the first GET_JOB, STOP afterwards. No process
//! I/O happens after construction.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use datumrun_core::{
    Catalog, DatumDefinition, DatumKind, DatumRef, JobDefinition, LookupError, TaskDefinition,
};

use crate::job_file::{load_job_file, JobFileError};
use crate::protocol::{Command, CommunicationBackend, Message, ProtocolError};

#[derive(Debug, Parser)]
#[command(name = "datumrun", about = "Run one component as a local job")]
pub struct CliArgs {
    /// Component to run from the local catalog.
    #[arg(conflicts_with = "file")]
    pub component: Option<String>,

    /// Load a full job definition from a file instead.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Path bound to the component's first input slot.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Path bound to the component's first output slot.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Option values as comma-separated key=value pairs.
    #[arg(short = 'a', long = "argument", value_parser = parse_kv_group)]
    pub arguments: Vec<KvGroup>,

    /// Context values as comma-separated key=value pairs.
    #[arg(short = 'c', long = "context", value_parser = parse_kv_group)]
    pub context: Vec<KvGroup>,
}

/// One parsed `key=value[,key=value...]` argument group.
#[derive(Debug, Clone, PartialEq)]
pub struct KvGroup(Vec<(String, String)>);

fn parse_kv_group(raw: &str) -> Result<KvGroup, String> {
    let mut pairs = Vec::new();
    for item in raw.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{item}'"))?;
        pairs.push((key.trim().to_owned(), value.trim().to_owned()));
    }
    if pairs.is_empty() {
        return Err("expected at least one key=value pair".to_owned());
    }
    Ok(KvGroup(pairs))
}

/// Merge argument groups into one map.
///
/// Values parse as JSON first, falling back to plain strings. Dotted
/// keys (or `__`-separated, for shells where dots are awkward) nest
/// into objects.
fn merge_kv_groups(groups: &[KvGroup]) -> BTreeMap<String, Value> {
    let mut merged = serde_json::Map::new();
    for group in groups {
        for (key, raw) in &group.0 {
            let value = serde_json::from_str(raw).unwrap_or(Value::String(raw.clone()));
            let key = key.replace("__", ".");
            let parts: Vec<&str> = key.split('.').collect();
            insert_nested(&mut merged, &parts, value);
        }
    }
    merged.into_iter().collect()
}

fn insert_nested(map: &mut serde_json::Map<String, Value>, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [leaf] => {
            map.insert((*leaf).to_owned(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_owned())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(child) = entry {
                insert_nested(child, rest, value);
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error("Provide a component name or a job file")]
    MissingSelector,

    #[error(transparent)]
    JobFile(#[from] JobFileError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Component '{component}' declares no {direction} slot to bind")]
    NoSlotToBind {
        component: String,
        direction: &'static str,
    },
}

/// Backend that replays one locally synthesized job.
#[derive(Debug)]
pub struct CliBackend {
    job: Option<JobDefinition>,
    job_reported: bool,
}

impl CliBackend {
    /// Parse argv (without the program name) against the catalog.
    pub fn from_args<I, S>(catalog: &Catalog, args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv = std::iter::once("datumrun".to_owned()).chain(args.into_iter().map(Into::into));
        let args = CliArgs::try_parse_from(argv)?;
        let job = build_job(catalog, args)?;
        Ok(Self {
            job: Some(job),
            job_reported: false,
        })
    }
}

fn build_job(catalog: &Catalog, args: CliArgs) -> Result<JobDefinition, CliError> {
    if !args.context.is_empty() {
        // Context overrides only matter under a remote controller.
        debug!(context = ?merge_kv_groups(&args.context), "ignoring context overrides in local mode");
    }
    if let Some(path) = &args.file {
        return Ok(load_job_file(path)?);
    }
    let Some(component) = args.component else {
        return Err(CliError::MissingSelector);
    };
    let descriptor = catalog.resolve(datumrun_core::DEFAULT_LIBRARY, &component)?;

    let mut task = TaskDefinition::new(&component);
    task.options = merge_kv_groups(&args.arguments);

    // A bare -i/-o binds the first declared slot of its direction; the
    // datum kind stays open until the slot declaration promotes it.
    if let Some(path) = args.input {
        let slot = descriptor
            .input_slots()
            .keys()
            .next()
            .ok_or_else(|| CliError::NoSlotToBind {
                component: component.clone(),
                direction: "input",
            })?;
        task = task.with_input(
            slot,
            DatumRef::One(DatumDefinition::new(path, DatumKind::NotYetKnown)),
        );
    }
    if let Some(path) = args.output {
        let slot = descriptor
            .output_slots()
            .keys()
            .next()
            .ok_or_else(|| CliError::NoSlotToBind {
                component: component.clone(),
                direction: "output",
            })?;
        task = task.with_output(
            slot,
            DatumRef::One(DatumDefinition::new(path, DatumKind::NotYetKnown)),
        );
    }
    Ok(JobDefinition::new(vec![task]))
}

impl CommunicationBackend for CliBackend {
    fn send_message(&mut self, message: Message) -> Result<Message, ProtocolError> {
        let response = match message.command {
            Command::GetJob => match self.job.take() {
                Some(job) => Message::with_data(Command::JobDefinition, &job)?,
                None => Message::new(Command::Stop),
            },
            Command::JobFinished => {
                if self.job_reported {
                    Message::error("job already reported finished")
                } else {
                    self.job_reported = true;
                    Message::new(Command::Ack)
                }
            }
            Command::CreateDatum => Message::error("no controller to allocate datums"),
            Command::CommitDatum => Message::new(Command::Ack),
            other => Message::error(format!("unsupported command {other:?}")),
        };
        Ok(response)
    }
}
