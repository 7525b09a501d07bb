//! Component descriptors and the declarative builder.
//!
//! A component is registered as a [`ComponentDescriptor`]: its external
//! contract (slots, options, context handle) plus the runnable closure.
//! Descriptors are immutable after build and shared through `Rc` by the
//! catalog. The builder consumes a flat list of [`ParameterSpec`]s and
//! classifies each one into a slot, an option, or the context handle.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::context::Context;
use crate::datum::{DatumKind, SharedDatum};
use crate::descriptor::{OptionDefinition, OptionType, OptionValue, SlotDefinition};
use crate::error::{BuildError, ExecutionError, ValidationError};

/// Reserved parameter names that bind the context handle without an
/// annotation.
const CONTEXT_NAMES: [&str; 2] = ["context", "ctx"];

/// Suggested label vocabulary for components.
///
/// Labels on a descriptor remain free-form strings; this enum only
/// standardizes the common ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentLabel {
    Importer,
    Exporter,
    Transformer,
    Analyzer,
    Visualizer,
    Model,
    Simulator,
    Evaluator,
    Raw,
    Timeseries,
}

impl ComponentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Importer => "importer",
            Self::Exporter => "exporter",
            Self::Transformer => "transformer",
            Self::Analyzer => "analyzer",
            Self::Visualizer => "visualizer",
            Self::Model => "model",
            Self::Simulator => "simulator",
            Self::Evaluator => "evaluator",
            Self::Raw => "raw",
            Self::Timeseries => "timeseries",
        }
    }
}

impl fmt::Display for ComponentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDirection {
    Input,
    Output,
}

impl SlotDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for SlotDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The datums resolved for one slot of one task.
#[derive(Debug, Clone, Default)]
pub enum SlotBinding {
    #[default]
    Empty,
    Single(SharedDatum),
    Many(Vec<SharedDatum>),
}

impl SlotBinding {
    /// The single bound datum, if the binding holds exactly one.
    pub fn single(&self) -> Option<&SharedDatum> {
        match self {
            Self::Single(datum) => Some(datum),
            Self::Many(datums) if datums.len() == 1 => datums.first(),
            _ => None,
        }
    }

    /// All bound datums as a slice; empty for [`SlotBinding::Empty`].
    pub fn many(&self) -> &[SharedDatum] {
        match self {
            Self::Empty => &[],
            Self::Single(datum) => std::slice::from_ref(datum),
            Self::Many(datums) => datums,
        }
    }

    /// Number of bound datums.
    pub fn len(&self) -> usize {
        self.many().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Everything a runnable sees for one task: cast options, resolved slot
/// bindings, and the optional context handle.
pub struct Invocation<'a> {
    options: &'a BTreeMap<String, OptionValue>,
    inputs: &'a BTreeMap<String, SlotBinding>,
    outputs: &'a BTreeMap<String, SlotBinding>,
    context: Option<&'a Context>,
}

impl<'a> Invocation<'a> {
    pub fn new(
        options: &'a BTreeMap<String, OptionValue>,
        inputs: &'a BTreeMap<String, SlotBinding>,
        outputs: &'a BTreeMap<String, SlotBinding>,
        context: Option<&'a Context>,
    ) -> Self {
        Self {
            options,
            inputs,
            outputs,
            context,
        }
    }

    /// Look up a cast option value.
    pub fn option(&self, name: &str) -> Result<&OptionValue, ExecutionError> {
        self.options
            .get(name)
            .ok_or_else(|| ExecutionError::new(format!("no option named '{name}'")))
    }

    /// An option that may legitimately be absent.
    pub fn option_opt(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// Look up an input slot binding.
    pub fn input(&self, name: &str) -> Result<&SlotBinding, ExecutionError> {
        self.inputs
            .get(name)
            .ok_or_else(|| ExecutionError::new(format!("no input slot named '{name}'")))
    }

    /// Look up an output slot binding.
    pub fn output(&self, name: &str) -> Result<&SlotBinding, ExecutionError> {
        self.outputs
            .get(name)
            .ok_or_else(|| ExecutionError::new(format!("no output slot named '{name}'")))
    }

    /// The context handle, when the component declared one.
    pub fn context(&self) -> Option<&Context> {
        self.context
    }
}

/// The closure a component executes with.
pub type Runnable = Rc<dyn Fn(&Invocation<'_>) -> Result<(), ExecutionError>>;

/// Immutable external contract of a registered component.
pub struct ComponentDescriptor {
    name: String,
    version: String,
    description: String,
    labels: BTreeSet<String>,
    input_slots: IndexMap<String, SlotDefinition>,
    output_slots: IndexMap<String, SlotDefinition>,
    options: IndexMap<String, OptionDefinition>,
    context_param: Option<String>,
    runnable: Runnable,
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("labels", &self.labels)
            .field("input_slots", &self.input_slots)
            .field("output_slots", &self.output_slots)
            .field("options", &self.options)
            .field("context_param", &self.context_param)
            .finish_non_exhaustive()
    }
}

impl ComponentDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Declared input slots, in declaration order.
    pub fn input_slots(&self) -> &IndexMap<String, SlotDefinition> {
        &self.input_slots
    }

    /// Declared output slots, in declaration order.
    pub fn output_slots(&self) -> &IndexMap<String, SlotDefinition> {
        &self.output_slots
    }

    /// Declared options, in declaration order.
    pub fn options(&self) -> &IndexMap<String, OptionDefinition> {
        &self.options
    }

    /// Name of the context parameter, if the component declared one.
    pub fn context_param(&self) -> Option<&str> {
        self.context_param.as_deref()
    }

    /// Look up one slot by direction and name.
    pub fn slot(&self, direction: SlotDirection, name: &str) -> Option<&SlotDefinition> {
        self.slots(direction).get(name)
    }

    fn slots(&self, direction: SlotDirection) -> &IndexMap<String, SlotDefinition> {
        match direction {
            SlotDirection::Input => &self.input_slots,
            SlotDirection::Output => &self.output_slots,
        }
    }

    /// Run the component against a prepared invocation.
    pub fn invoke(&self, invocation: &Invocation<'_>) -> Result<(), ExecutionError> {
        (self.runnable)(invocation)
    }

    /// Check one direction's bindings against the declared slots.
    ///
    /// The binding map must cover exactly the declared slot names; a
    /// required slot cannot be empty, a non-multiple slot cannot hold a
    /// list, and every bound datum's kind must equal the slot kind.
    pub fn validate_slots(
        &self,
        direction: SlotDirection,
        bindings: &BTreeMap<String, SlotBinding>,
    ) -> Result<(), ValidationError> {
        let declared = self.slots(direction);
        for name in bindings.keys() {
            if !declared.contains_key(name) {
                return Err(ValidationError::UnknownSlot {
                    direction: direction.to_string(),
                    name: name.clone(),
                });
            }
        }
        if bindings.len() != declared.len() {
            return Err(ValidationError::SlotCountMismatch {
                direction: direction.to_string(),
                declared: declared.len(),
                provided: bindings.len(),
            });
        }
        for (name, slot) in declared {
            let binding = &bindings[name];
            if binding.is_empty() {
                if slot.required {
                    return Err(ValidationError::RequiredSlotMissing(name.clone()));
                }
                continue;
            }
            if !slot.multiple && matches!(binding, SlotBinding::Many(_)) {
                return Err(ValidationError::MultiplicityMismatch(name.clone()));
            }
            for datum in binding.many() {
                let actual = datum.borrow().kind();
                if actual != slot.kind {
                    return Err(ValidationError::KindMismatch {
                        name: name.clone(),
                        expected: slot.kind,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }

    /// Cast and default-fill the task's raw option map.
    pub fn resolve_options(
        &self,
        provided: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, OptionValue>, ValidationError> {
        for name in provided.keys() {
            if !self.options.contains_key(name) {
                return Err(ValidationError::UnknownOption(name.clone()));
            }
        }
        let mut resolved = BTreeMap::new();
        for (name, option) in &self.options {
            let raw = provided.get(name).or(option.default.as_ref());
            match raw {
                Some(value) => {
                    resolved.insert(name.clone(), option.cast(value)?);
                }
                None if option.required => {
                    return Err(ValidationError::MissingOption(name.clone()));
                }
                None => {}
            }
        }
        Ok(resolved)
    }
}

/// Annotation of one declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    /// A slot carrying datums of the given kind.
    Datum(DatumKind),
    /// The context handle.
    Context,
    /// A scalar option.
    Scalar(OptionType),
}

/// Which end a numeric bound constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Gt,
    Ge,
    Lt,
    Le,
}

impl BoundKind {
    fn is_lower(&self) -> bool {
        matches!(self, Self::Gt | Self::Ge)
    }
}

/// Extra markers attached to a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataItem {
    Doc(String),
    /// The slot is an output rather than an input.
    Output,
    /// The slot accepts a list of datums.
    Multiple,
    Bound(BoundKind, f64),
    Choices(Vec<String>),
}

/// One declared parameter of a component, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    name: String,
    annotation: Option<ParameterType>,
    default: Option<Value>,
    metadata: Vec<MetadataItem>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, annotation: ParameterType) -> Self {
        Self {
            name: name.into(),
            annotation: Some(annotation),
            default: None,
            metadata: Vec::new(),
        }
    }

    /// A parameter with no annotation. Only legal for the reserved
    /// context names.
    pub fn unannotated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
            metadata: Vec::new(),
        }
    }

    /// Shorthand for an input slot of the given kind.
    pub fn input(name: impl Into<String>, kind: DatumKind) -> Self {
        Self::new(name, ParameterType::Datum(kind))
    }

    /// Shorthand for an output slot of the given kind.
    pub fn output(name: impl Into<String>, kind: DatumKind) -> Self {
        Self::new(name, ParameterType::Datum(kind)).with_metadata(MetadataItem::Output)
    }

    /// Shorthand for a scalar option.
    pub fn option(name: impl Into<String>, option_type: OptionType) -> Self {
        Self::new(name, ParameterType::Scalar(option_type))
    }

    /// Shorthand for an explicitly annotated context handle.
    pub fn context(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Context)
    }

    /// Builder method to set a default value; the parameter becomes
    /// optional.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Builder method to attach a doc line.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.with_metadata(MetadataItem::Doc(doc.into()))
    }

    /// Builder method to mark a slot as list-valued.
    pub fn multiple(self) -> Self {
        self.with_metadata(MetadataItem::Multiple)
    }

    /// Builder method to attach a numeric bound.
    pub fn with_bound(self, kind: BoundKind, value: f64) -> Self {
        self.with_metadata(MetadataItem::Bound(kind, value))
    }

    /// Builder method to restrict a string option to fixed choices.
    pub fn with_choices(self, choices: Vec<String>) -> Self {
        self.with_metadata(MetadataItem::Choices(choices))
    }

    fn with_metadata(mut self, item: MetadataItem) -> Self {
        self.metadata.push(item);
        self
    }

    fn doc(&self) -> String {
        self.metadata
            .iter()
            .find_map(|m| match m {
                MetadataItem::Doc(text) => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn has(&self, wanted: &MetadataItem) -> bool {
        self.metadata.iter().any(|m| m == wanted)
    }
}

/// Builds a [`ComponentDescriptor`] from declared parameters.
pub struct ComponentBuilder {
    name: String,
    version: String,
    description: String,
    labels: BTreeSet<String>,
    parameters: Vec<ParameterSpec>,
}

impl ComponentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1".to_owned(),
            description: String::new(),
            labels: BTreeSet::new(),
            parameters: Vec::new(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    pub fn parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// Classify every parameter and seal the descriptor.
    pub fn build(
        self,
        runnable: impl Fn(&Invocation<'_>) -> Result<(), ExecutionError> + 'static,
    ) -> Result<ComponentDescriptor, BuildError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut input_slots = IndexMap::new();
        let mut output_slots = IndexMap::new();
        let mut options = IndexMap::new();
        let mut context_param: Option<String> = None;

        for spec in &self.parameters {
            if !seen.insert(spec.name.clone()) {
                return Err(BuildError::DuplicateParameter(spec.name.clone()));
            }
            match &spec.annotation {
                None => {
                    if !CONTEXT_NAMES.contains(&spec.name.as_str()) {
                        return Err(BuildError::MissingAnnotation(spec.name.clone()));
                    }
                    bind_context(&mut context_param, &spec.name)?;
                }
                Some(ParameterType::Context) => {
                    bind_context(&mut context_param, &spec.name)?;
                }
                Some(ParameterType::Datum(kind)) => {
                    let slot = classify_slot(spec, *kind)?;
                    if spec.has(&MetadataItem::Output) {
                        output_slots.insert(spec.name.clone(), slot);
                    } else {
                        input_slots.insert(spec.name.clone(), slot);
                    }
                }
                Some(ParameterType::Scalar(option_type)) => {
                    options.insert(spec.name.clone(), classify_option(spec, *option_type)?);
                }
            }
        }

        Ok(ComponentDescriptor {
            name: self.name,
            version: self.version,
            description: self.description,
            labels: self.labels,
            input_slots,
            output_slots,
            options,
            context_param,
            runnable: Rc::new(runnable),
        })
    }
}

fn bind_context(context_param: &mut Option<String>, name: &str) -> Result<(), BuildError> {
    if let Some(existing) = context_param {
        return Err(BuildError::DuplicateContext(
            existing.clone(),
            name.to_owned(),
        ));
    }
    *context_param = Some(name.to_owned());
    Ok(())
}

fn classify_slot(spec: &ParameterSpec, kind: DatumKind) -> Result<SlotDefinition, BuildError> {
    let is_output = spec.has(&MetadataItem::Output);
    if kind == DatumKind::NotYetKnown {
        return Err(BuildError::UnsupportedAnnotation {
            name: spec.name.clone(),
            reason: "slots must declare a concrete datum kind".to_owned(),
        });
    }
    // Factories mint outputs; accepting one as input makes no sense.
    if kind == DatumKind::Factory && !is_output {
        return Err(BuildError::UnsupportedAnnotation {
            name: spec.name.clone(),
            reason: "factory datums are only valid on output slots".to_owned(),
        });
    }
    Ok(SlotDefinition {
        name: spec.name.clone(),
        description: spec.doc(),
        required: spec.default.is_none(),
        multiple: spec.has(&MetadataItem::Multiple),
        kind,
    })
}

fn classify_option(
    spec: &ParameterSpec,
    option_type: OptionType,
) -> Result<OptionDefinition, BuildError> {
    let mut option = OptionDefinition::new(spec.name.clone(), option_type);
    option.description = spec.doc();
    for item in &spec.metadata {
        match item {
            MetadataItem::Bound(kind, value) => {
                let target = if kind.is_lower() {
                    &mut option.min
                } else {
                    &mut option.max
                };
                if target.is_some() {
                    return Err(BuildError::ConflictingBound {
                        name: spec.name.clone(),
                        bound: if kind.is_lower() { "lower" } else { "upper" }.to_owned(),
                    });
                }
                *target = Some(*value);
            }
            MetadataItem::Choices(choices) => {
                option.choices = Some(choices.clone());
            }
            MetadataItem::Doc(_) | MetadataItem::Output | MetadataItem::Multiple => {}
        }
    }
    if let Some(default) = &spec.default {
        option
            .cast(default)
            .map_err(|e| BuildError::InvalidDefault {
                name: spec.name.clone(),
                reason: e.to_string(),
            })?;
        option.default = Some(default.clone());
        option.required = false;
    }
    Ok(option)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{shared, Datum, DatumDefinition};
    use serde_json::json;

    fn noop(_: &Invocation<'_>) -> Result<(), ExecutionError> {
        Ok(())
    }

    fn datum(kind: DatumKind) -> SharedDatum {
        let def = DatumDefinition::new("/data/x", kind);
        shared(Datum::from_definition(def).unwrap())
    }

    #[test]
    fn test_build_classifies_parameters() {
        let descriptor = ComponentBuilder::new("load")
            .description("loads things")
            .label(ComponentLabel::Importer.as_str())
            .parameter(ParameterSpec::input("in_data", DatumKind::Object))
            .parameter(ParameterSpec::output("out_data", DatumKind::DataFrame))
            .parameter(
                ParameterSpec::option("limit", OptionType::Integer).with_default(10),
            )
            .parameter(ParameterSpec::unannotated("context"))
            .build(noop)
            .unwrap();

        assert_eq!(descriptor.name(), "load");
        assert_eq!(descriptor.version(), "1");
        assert!(descriptor.labels().contains("importer"));
        assert!(descriptor.input_slots().contains_key("in_data"));
        assert!(descriptor.output_slots().contains_key("out_data"));
        assert!(!descriptor.options()["limit"].required);
        assert_eq!(descriptor.context_param(), Some("context"));
    }

    #[test]
    fn test_unannotated_non_context_name_is_rejected() {
        let result = ComponentBuilder::new("c")
            .parameter(ParameterSpec::unannotated("payload"))
            .build(noop);
        assert_eq!(
            result.err(),
            Some(BuildError::MissingAnnotation("payload".to_owned()))
        );
    }

    #[test]
    fn test_ctx_is_a_reserved_context_name() {
        let descriptor = ComponentBuilder::new("c")
            .parameter(ParameterSpec::unannotated("ctx"))
            .build(noop)
            .unwrap();
        assert_eq!(descriptor.context_param(), Some("ctx"));
    }

    #[test]
    fn test_two_context_parameters_are_rejected() {
        let result = ComponentBuilder::new("c")
            .parameter(ParameterSpec::unannotated("ctx"))
            .parameter(ParameterSpec::context("handle"))
            .build(noop);
        assert!(matches!(result, Err(BuildError::DuplicateContext(_, _))));
    }

    #[test]
    fn test_duplicate_parameter_names_are_rejected() {
        let result = ComponentBuilder::new("c")
            .parameter(ParameterSpec::input("x", DatumKind::Folder))
            .parameter(ParameterSpec::option("x", OptionType::String))
            .build(noop);
        assert_eq!(
            result.err(),
            Some(BuildError::DuplicateParameter("x".to_owned()))
        );
    }

    #[test]
    fn test_not_yet_known_slot_is_rejected() {
        let result = ComponentBuilder::new("c")
            .parameter(ParameterSpec::input("x", DatumKind::NotYetKnown))
            .build(noop);
        assert!(matches!(
            result,
            Err(BuildError::UnsupportedAnnotation { .. })
        ));
    }

    #[test]
    fn test_factory_is_output_only() {
        let rejected = ComponentBuilder::new("c")
            .parameter(ParameterSpec::input("x", DatumKind::Factory))
            .build(noop);
        assert!(matches!(
            rejected,
            Err(BuildError::UnsupportedAnnotation { .. })
        ));

        let accepted = ComponentBuilder::new("c")
            .parameter(ParameterSpec::output("x", DatumKind::Factory))
            .build(noop);
        assert!(accepted.is_ok());
    }

    #[test]
    fn test_conflicting_lower_bounds_are_rejected() {
        let result = ComponentBuilder::new("c")
            .parameter(
                ParameterSpec::option("n", OptionType::Integer)
                    .with_bound(BoundKind::Gt, 0.0)
                    .with_bound(BoundKind::Ge, 1.0),
            )
            .build(noop);
        assert_eq!(
            result.err(),
            Some(BuildError::ConflictingBound {
                name: "n".to_owned(),
                bound: "lower".to_owned(),
            })
        );
    }

    #[test]
    fn test_invalid_default_is_a_build_error() {
        let result = ComponentBuilder::new("c")
            .parameter(ParameterSpec::option("n", OptionType::Integer).with_default(3.5))
            .build(noop);
        assert!(matches!(result, Err(BuildError::InvalidDefault { .. })));
    }

    #[test]
    fn test_slot_with_default_is_optional() {
        let descriptor = ComponentBuilder::new("c")
            .parameter(ParameterSpec::input("x", DatumKind::Folder).with_default(Value::Null))
            .build(noop)
            .unwrap();
        assert!(!descriptor.input_slots()["x"].required);
    }

    #[test]
    fn test_validate_slots_full_pass() {
        let descriptor = ComponentBuilder::new("c")
            .parameter(ParameterSpec::input("in_data", DatumKind::Object))
            .parameter(ParameterSpec::input("extra", DatumKind::Folder).multiple())
            .build(noop)
            .unwrap();

        let mut bindings = BTreeMap::new();
        bindings.insert(
            "in_data".to_owned(),
            SlotBinding::Single(datum(DatumKind::Object)),
        );
        bindings.insert(
            "extra".to_owned(),
            SlotBinding::Many(vec![datum(DatumKind::Folder), datum(DatumKind::Folder)]),
        );
        descriptor
            .validate_slots(SlotDirection::Input, &bindings)
            .unwrap();
    }

    #[test]
    fn test_validate_slots_rejects_unknown_name() {
        let descriptor = ComponentBuilder::new("c")
            .parameter(ParameterSpec::input("in_data", DatumKind::Object))
            .build(noop)
            .unwrap();

        let mut bindings = BTreeMap::new();
        bindings.insert(
            "mystery".to_owned(),
            SlotBinding::Single(datum(DatumKind::Object)),
        );
        assert!(matches!(
            descriptor.validate_slots(SlotDirection::Input, &bindings),
            Err(ValidationError::UnknownSlot { .. })
        ));
    }

    #[test]
    fn test_validate_slots_rejects_count_mismatch() {
        let descriptor = ComponentBuilder::new("c")
            .parameter(ParameterSpec::input("a", DatumKind::Folder))
            .parameter(ParameterSpec::input("b", DatumKind::Folder))
            .build(noop)
            .unwrap();

        let mut bindings = BTreeMap::new();
        bindings.insert("a".to_owned(), SlotBinding::Single(datum(DatumKind::Folder)));
        assert!(matches!(
            descriptor.validate_slots(SlotDirection::Input, &bindings),
            Err(ValidationError::SlotCountMismatch {
                declared: 2,
                provided: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_validate_slots_rejects_empty_required() {
        let descriptor = ComponentBuilder::new("c")
            .parameter(ParameterSpec::input("in_data", DatumKind::Object))
            .build(noop)
            .unwrap();

        let mut bindings = BTreeMap::new();
        bindings.insert("in_data".to_owned(), SlotBinding::Empty);
        assert_eq!(
            descriptor
                .validate_slots(SlotDirection::Input, &bindings)
                .err(),
            Some(ValidationError::RequiredSlotMissing("in_data".to_owned()))
        );
    }

    #[test]
    fn test_validate_slots_rejects_list_on_single_slot() {
        let descriptor = ComponentBuilder::new("c")
            .parameter(ParameterSpec::input("in_data", DatumKind::Folder))
            .build(noop)
            .unwrap();

        let mut bindings = BTreeMap::new();
        bindings.insert(
            "in_data".to_owned(),
            SlotBinding::Many(vec![datum(DatumKind::Folder), datum(DatumKind::Folder)]),
        );
        assert_eq!(
            descriptor
                .validate_slots(SlotDirection::Input, &bindings)
                .err(),
            Some(ValidationError::MultiplicityMismatch("in_data".to_owned()))
        );
    }

    #[test]
    fn test_validate_slots_rejects_kind_mismatch() {
        let descriptor = ComponentBuilder::new("c")
            .parameter(ParameterSpec::input("in_data", DatumKind::Object))
            .build(noop)
            .unwrap();

        let mut bindings = BTreeMap::new();
        bindings.insert(
            "in_data".to_owned(),
            SlotBinding::Single(datum(DatumKind::Folder)),
        );
        assert!(matches!(
            descriptor.validate_slots(SlotDirection::Input, &bindings),
            Err(ValidationError::KindMismatch {
                expected: DatumKind::Object,
                actual: DatumKind::Folder,
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_options_defaults_and_errors() {
        let descriptor = ComponentBuilder::new("c")
            .parameter(ParameterSpec::option("limit", OptionType::Integer).with_default(10))
            .parameter(ParameterSpec::option("name", OptionType::String))
            .build(noop)
            .unwrap();

        let mut provided = BTreeMap::new();
        provided.insert("name".to_owned(), json!("run"));
        let resolved = descriptor.resolve_options(&provided).unwrap();
        assert_eq!(resolved["limit"], OptionValue::Integer(10));
        assert_eq!(resolved["name"], OptionValue::String("run".to_owned()));

        assert_eq!(
            descriptor.resolve_options(&BTreeMap::new()).err(),
            Some(ValidationError::MissingOption("name".to_owned()))
        );

        let mut unknown = provided.clone();
        unknown.insert("mystery".to_owned(), json!(1));
        assert_eq!(
            descriptor.resolve_options(&unknown).err(),
            Some(ValidationError::UnknownOption("mystery".to_owned()))
        );
    }

    #[test]
    fn test_invoke_reaches_the_runnable() {
        let descriptor = ComponentBuilder::new("c")
            .parameter(ParameterSpec::option("greeting", OptionType::String))
            .build(|invocation: &Invocation<'_>| {
                let greeting = invocation.option("greeting")?;
                if greeting.as_str() == Some("hello") {
                    Ok(())
                } else {
                    Err(ExecutionError::new("wrong greeting"))
                }
            })
            .unwrap();

        let mut options = BTreeMap::new();
        options.insert(
            "greeting".to_owned(),
            OptionValue::String("hello".to_owned()),
        );
        let inputs = BTreeMap::new();
        let outputs = BTreeMap::new();
        let invocation = Invocation::new(&options, &inputs, &outputs, None);
        descriptor.invoke(&invocation).unwrap();
    }
}
