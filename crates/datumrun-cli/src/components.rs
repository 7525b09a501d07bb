//! The bundled local component catalog.

use datumrun_core::{
    BuildError, Catalog, ComponentBuilder, ComponentDescriptor, ComponentLabel, Datum, DatumKind,
    ExecutionError, Invocation, OptionType, ParameterSpec,
};
use tracing::info;

/// Build the catalog this binary serves.
pub fn build_local_catalog() -> Result<Catalog, BuildError> {
    let mut catalog =
        Catalog::new("local").with_description("Components bundled with the datumrun binary");
    catalog.register(copy_object_component()?);
    Ok(catalog)
}

/// Demo component: copies one object datum to another, optionally
/// logging a greeting.
fn copy_object_component() -> Result<ComponentDescriptor, BuildError> {
    ComponentBuilder::new("copy_object")
        .description("Copy an object datum from input to output")
        .label(ComponentLabel::Transformer.as_str())
        .parameter(
            ParameterSpec::input("in_data", DatumKind::Object).with_doc("Object to copy"),
        )
        .parameter(
            ParameterSpec::output("out_data", DatumKind::Object)
                .with_doc("Where the copy is written"),
        )
        .parameter(
            ParameterSpec::option("greeting", OptionType::String)
                .with_default("")
                .with_doc("Logged before copying, when non-empty"),
        )
        .parameter(ParameterSpec::unannotated("context"))
        .build(run_copy_object)
}

fn run_copy_object(invocation: &Invocation<'_>) -> Result<(), ExecutionError> {
    if let Some(greeting) = invocation.option("greeting")?.as_str() {
        if !greeting.is_empty() {
            let target = invocation
                .context()
                .map(|c| c.log_target())
                .unwrap_or_default();
            info!(component = %target, "{greeting}");
        }
    }

    let input = invocation
        .input("in_data")?
        .single()
        .cloned()
        .ok_or_else(|| ExecutionError::new("in_data is not bound"))?;
    let value = match &mut *input.borrow_mut() {
        Datum::Object(object) => object.get()?,
        _ => return Err(ExecutionError::new("in_data is not an object datum")),
    };

    let output = invocation
        .output("out_data")?
        .single()
        .cloned()
        .ok_or_else(|| ExecutionError::new("out_data is not bound"))?;
    match &mut *output.borrow_mut() {
        Datum::Object(object) => object.set(value)?,
        _ => return Err(ExecutionError::new("out_data is not an object datum")),
    }
    Ok(())
}
