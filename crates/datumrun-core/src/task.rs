//! Task and job definitions, the declarative wire payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::DEFAULT_LIBRARY;
use crate::datum::DatumDefinition;

/// One or many datum definitions bound to a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatumRef {
    One(DatumDefinition),
    Many(Vec<DatumDefinition>),
}

impl DatumRef {
    /// The referenced definitions as a slice.
    pub fn definitions(&self) -> &[DatumDefinition] {
        match self {
            Self::One(def) => std::slice::from_ref(def),
            Self::Many(defs) => defs,
        }
    }
}

/// Declarative description of one component invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub component: String,

    #[serde(default = "default_library")]
    pub library: String,

    #[serde(default)]
    pub options: BTreeMap<String, Value>,

    /// Slot name to datum reference; `None` leaves the slot unbound.
    #[serde(default)]
    pub input_data: BTreeMap<String, Option<DatumRef>>,

    #[serde(default)]
    pub output_data: BTreeMap<String, Option<DatumRef>>,
}

fn default_library() -> String {
    DEFAULT_LIBRARY.to_owned()
}

impl TaskDefinition {
    /// Create a task for a component in the default library.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            library: default_library(),
            options: BTreeMap::new(),
            input_data: BTreeMap::new(),
            output_data: BTreeMap::new(),
        }
    }

    /// Builder method to set the library.
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = library.into();
        self
    }

    /// Builder method to set one option value.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Builder method to bind one input slot.
    pub fn with_input(mut self, slot: impl Into<String>, datum: DatumRef) -> Self {
        self.input_data.insert(slot.into(), Some(datum));
        self
    }

    /// Builder method to bind one output slot.
    pub fn with_output(mut self, slot: impl Into<String>, datum: DatumRef) -> Self {
        self.output_data.insert(slot.into(), Some(datum));
        self
    }
}

/// A batch of tasks executed sequentially.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub tasks: Vec<TaskDefinition>,
}

impl JobDefinition {
    pub fn new(tasks: Vec<TaskDefinition>) -> Self {
        Self { tasks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::DatumKind;
    use serde_json::json;

    #[test]
    fn test_library_defaults_to_local() {
        let task: TaskDefinition =
            serde_json::from_value(json!({ "component": "copy_object" })).unwrap();
        assert_eq!(task.library, "local");
        assert!(task.options.is_empty());
    }

    #[test]
    fn test_datum_ref_is_untagged() {
        let one: DatumRef = serde_json::from_value(json!({
            "path": "/data/in",
            "kind": "OBJECT",
        }))
        .unwrap();
        assert_eq!(one.definitions().len(), 1);

        let many: DatumRef = serde_json::from_value(json!([
            { "path": "/data/a", "kind": "FOLDER" },
            { "path": "/data/b", "kind": "FOLDER" },
        ]))
        .unwrap();
        assert_eq!(many.definitions().len(), 2);
    }

    #[test]
    fn test_job_roundtrip() {
        let job = JobDefinition::new(vec![TaskDefinition::new("copy_object")
            .with_option("greeting", "hi")
            .with_input(
                "in_data",
                DatumRef::One(DatumDefinition::new("/data/in", DatumKind::Object)),
            )]);
        let value = serde_json::to_value(&job).unwrap();
        let decoded: JobDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, job);
    }

    #[test]
    fn test_unbound_slot_deserializes_to_none() {
        let task: TaskDefinition = serde_json::from_value(json!({
            "component": "copy_object",
            "input_data": { "in_data": null },
        }))
        .unwrap();
        assert_eq!(task.input_data["in_data"], None);
    }
}
