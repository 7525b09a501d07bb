//! The task execution loop.
//!
//! Pulls jobs from the backend until STOP, runs each task against the
//! catalog, and reports datum commits and job completion back. Any
//! error aborts the loop and propagates; retry policy belongs to the
//! controller.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, info};

use datumrun_core::{
    shared, Catalog, ComponentDescriptor, Context, Datum, DatumDefinition, DatumError, DatumKind,
    ExecutionError, Invocation, LookupError, SharedDatum, SlotBinding, SlotDirection,
    TaskDefinition, ValidationError,
};
use datumrun_core::task::DatumRef;

use crate::protocol::{CommunicationBackend, ProtocolError};

/// Errors that abort the runtime loop.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Datum(#[from] DatumError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// The execution engine: one catalog, one backend, one datum cache.
pub struct Runtime<B: CommunicationBackend> {
    catalog: Catalog,
    backend: B,
    /// Loaded datums keyed by controller-assigned content hash. Shared
    /// across tasks and jobs for the lifetime of the process.
    datum_cache: HashMap<String, SharedDatum>,
}

impl<B: CommunicationBackend> Runtime<B> {
    pub fn new(catalog: Catalog, backend: B) -> Self {
        Self {
            catalog,
            backend,
            datum_cache: HashMap::new(),
        }
    }

    /// Run jobs until the controller says STOP.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        info!(catalog = self.catalog.name(), "runtime started");
        loop {
            let Some(job) = self.backend.get_job()? else {
                info!("controller sent STOP, shutting down");
                return Ok(());
            };
            info!(tasks = job.tasks.len(), "running job");
            for task in &job.tasks {
                self.run_task(task)?;
            }
            self.backend.notify_job_completion(&job)?;
        }
    }

    fn run_task(&mut self, task: &TaskDefinition) -> Result<(), RuntimeError> {
        info!(component = %task.component, library = %task.library, "running task");
        let descriptor = self.catalog.resolve(&task.library, &task.component)?;

        let inputs =
            self.resolve_bindings(&task.input_data, SlotDirection::Input, &descriptor)?;
        let outputs =
            self.resolve_bindings(&task.output_data, SlotDirection::Output, &descriptor)?;
        descriptor.validate_slots(SlotDirection::Input, &inputs)?;
        descriptor.validate_slots(SlotDirection::Output, &outputs)?;
        let options = descriptor.resolve_options(&task.options)?;

        let context = descriptor
            .context_param()
            .map(|_| Context::new(&task.component, &task.library));
        let invocation = Invocation::new(&options, &inputs, &outputs, context.as_ref());
        descriptor.invoke(&invocation)?;

        self.commit_outputs(&outputs)?;
        Ok(())
    }

    /// Resolve one direction's datum references into slot bindings.
    ///
    /// Unknown slot names resolve without promotion and are rejected by
    /// slot validation afterwards.
    fn resolve_bindings(
        &mut self,
        refs: &BTreeMap<String, Option<DatumRef>>,
        direction: SlotDirection,
        descriptor: &Rc<ComponentDescriptor>,
    ) -> Result<BTreeMap<String, SlotBinding>, RuntimeError> {
        let mut bindings = BTreeMap::new();
        for (name, datum_ref) in refs {
            let target = descriptor.slot(direction, name).map(|slot| slot.kind);
            let binding = match datum_ref {
                None => SlotBinding::Empty,
                Some(DatumRef::One(definition)) => {
                    SlotBinding::Single(self.resolve_datum(definition, target)?)
                }
                Some(DatumRef::Many(definitions)) => {
                    let mut datums = Vec::with_capacity(definitions.len());
                    for definition in definitions {
                        datums.push(self.resolve_datum(definition, target)?);
                    }
                    SlotBinding::Many(datums)
                }
            };
            bindings.insert(name.clone(), binding);
        }
        Ok(bindings)
    }

    /// Materialize one definition, going through the cache when it
    /// carries a content hash.
    fn resolve_datum(
        &mut self,
        definition: &DatumDefinition,
        target: Option<DatumKind>,
    ) -> Result<SharedDatum, RuntimeError> {
        if let Some(hash) = &definition.content_hash {
            if let Some(cached) = self.datum_cache.get(hash).cloned() {
                debug!(hash, "datum cache hit");
                promote_in_place(&cached, target)?;
                return Ok(cached);
            }
        }
        debug!(path = %definition.path.display(), "materializing datum");
        let mut datum = Datum::from_definition(definition.clone())?;
        if datum.kind() == DatumKind::NotYetKnown {
            if let Some(kind) = target.filter(|k| k.is_concrete()) {
                datum = datum.promote(kind)?;
            }
        }
        let handle = shared(datum);
        if let Some(hash) = &definition.content_hash {
            self.datum_cache.insert(hash.clone(), handle.clone());
        }
        Ok(handle)
    }

    fn commit_outputs(
        &mut self,
        outputs: &BTreeMap<String, SlotBinding>,
    ) -> Result<(), RuntimeError> {
        for binding in outputs.values() {
            for datum in binding.many() {
                self.commit_datum_tree(datum)?;
            }
        }
        Ok(())
    }

    /// Commit one output datum and report it, expanding factories into
    /// their generated children.
    fn commit_datum_tree(&mut self, handle: &SharedDatum) -> Result<(), RuntimeError> {
        if !handle.borrow().is_committed() {
            handle.borrow_mut().commit().map_err(DatumError::from)?;
        }
        let children = match &*handle.borrow() {
            Datum::Factory(factory) => Some(factory.generated()),
            _ => None,
        };
        match children {
            Some(children) => {
                for child in children {
                    self.commit_datum_tree(&child)?;
                }
            }
            None => {
                let definition = handle.borrow().definition().clone();
                debug!(path = %definition.path.display(), "reporting datum commit");
                self.backend.commit_datum(&definition)?;
            }
        }
        Ok(())
    }
}

/// Promote a cached `NOT_YET_KNOWN` datum in place so every holder of
/// the shared handle sees the concrete variant.
fn promote_in_place(handle: &SharedDatum, target: Option<DatumKind>) -> Result<(), DatumError> {
    let Some(kind) = target.filter(|k| k.is_concrete()) else {
        return Ok(());
    };
    if handle.borrow().kind() != DatumKind::NotYetKnown {
        return Ok(());
    }
    let promoted = handle.borrow().promote(kind)?;
    *handle.borrow_mut() = promoted;
    Ok(())
}
