//! The narrow facade handed to a running component.

use tracing::Span;

/// Identifies the running component for logging.
///
/// Deliberately small: components allocate datums through factory
/// output slots, not through the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    component: String,
    library: String,
}

impl Context {
    pub fn new(component: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            library: library.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    /// Target string for component-scoped log lines.
    pub fn log_target(&self) -> String {
        format!("{}::{}", self.library, self.component)
    }

    /// A span covering one invocation of the component.
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "component",
            component = %self.component,
            library = %self.library,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_target_combines_library_and_component() {
        let context = Context::new("copy_object", "local");
        assert_eq!(context.log_target(), "local::copy_object");
    }
}
