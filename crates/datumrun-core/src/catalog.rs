//! Component catalog and name resolution.

use std::collections::HashMap;
use std::rc::Rc;

use crate::component::ComponentDescriptor;
use crate::error::LookupError;

/// Library alias tasks use when they do not name one.
pub const DEFAULT_LIBRARY: &str = "local";

/// One named library of components.
///
/// A process carries a single catalog; tasks address it either by its
/// name or by the `"local"` alias.
#[derive(Debug)]
pub struct Catalog {
    name: String,
    description: String,
    components: HashMap<String, Rc<ComponentDescriptor>>,
}

impl Catalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            components: HashMap::new(),
        }
    }

    /// Builder method to set the catalog description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Register a component under its descriptor name.
    ///
    /// Registering the same name again replaces the earlier entry.
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> &mut Self {
        self.components
            .insert(descriptor.name().to_owned(), Rc::new(descriptor));
        self
    }

    /// Registered component names, unordered.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Resolve a component by library and name.
    ///
    /// The library must be this catalog's name or the default alias.
    pub fn resolve(
        &self,
        library: &str,
        component: &str,
    ) -> Result<Rc<ComponentDescriptor>, LookupError> {
        if library != self.name && library != DEFAULT_LIBRARY {
            return Err(LookupError::UnknownLibrary(library.to_owned()));
        }
        self.components
            .get(component)
            .cloned()
            .ok_or_else(|| LookupError::UnknownComponent {
                library: library.to_owned(),
                component: component.to_owned(),
            })
    }
}
