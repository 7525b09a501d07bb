//! Factory datums: mint child datums under a parent path.

use std::fs;

use uuid::Uuid;

use crate::datum::{shared, Datum, DatumDefinition, DatumKind, SharedDatum};
use crate::error::{CommitError, DatumError, UnsupportedTypeError};

/// A datum whose purpose is to mint children.
///
/// Every [`create`](DatumFactory::create) call allocates a fresh unique
/// sub-path under the factory's own path. The factory tracks all minted
/// children; only the ones that reached the committed state count as
/// its generated set.
#[derive(Debug)]
pub struct DatumFactory {
    pub(super) definition: DatumDefinition,
    pub(super) committed: bool,
    children: Vec<SharedDatum>,
}

impl DatumFactory {
    pub(super) fn new(definition: DatumDefinition) -> Self {
        Self {
            definition,
            committed: false,
            children: Vec::new(),
        }
    }

    /// Mint a new child datum of a concrete kind.
    ///
    /// The child directory is created eagerly so the component can
    /// write into it right away.
    pub fn create(&mut self, kind: DatumKind) -> Result<SharedDatum, DatumError> {
        if self.committed {
            return Err(CommitError::new(&self.definition.path).into());
        }
        if kind == DatumKind::NotYetKnown {
            return Err(UnsupportedTypeError::InvalidChildKind(kind).into());
        }
        let child_path = self.definition.path.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&child_path).map_err(|e| DatumError::io(&child_path, e))?;
        let child = shared(Datum::from_definition(DatumDefinition::new(
            child_path, kind,
        ))?);
        self.children.push(child.clone());
        Ok(child)
    }

    /// All minted children, in minting order.
    pub fn children(&self) -> &[SharedDatum] {
        &self.children
    }

    /// Children that reached the committed state, in minting order.
    pub fn generated(&self) -> Vec<SharedDatum> {
        self.children
            .iter()
            .filter(|child| child.borrow().is_committed())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn factory(dir: &TempDir) -> DatumFactory {
        let def = DatumDefinition::new(dir.path(), DatumKind::Factory);
        match Datum::from_definition(def).unwrap() {
            Datum::Factory(factory) => factory,
            other => panic!("expected factory datum, got {other:?}"),
        }
    }

    #[test]
    fn test_create_allocates_unique_paths() {
        let dir = TempDir::new().unwrap();
        let mut factory = factory(&dir);

        let a = factory.create(DatumKind::Folder).unwrap();
        let b = factory.create(DatumKind::Folder).unwrap();

        let path_a = a.borrow().definition().path.clone();
        let path_b = b.borrow().definition().path.clone();
        assert_ne!(path_a, path_b);
        assert!(path_a.starts_with(dir.path()));
        assert!(path_a.is_dir());
        assert!(path_b.is_dir());
    }

    #[test]
    fn test_generated_filters_by_committed() {
        let dir = TempDir::new().unwrap();
        let mut factory = factory(&dir);

        let first = factory.create(DatumKind::Object).unwrap();
        let _second = factory.create(DatumKind::Object).unwrap();
        let third = factory.create(DatumKind::Folder).unwrap();

        // Object set() commits; folder needs an explicit commit.
        match &mut *first.borrow_mut() {
            Datum::Object(object) => object.set(json!("child")).unwrap(),
            other => panic!("expected object datum, got {other:?}"),
        }
        third.borrow_mut().commit().unwrap();

        let generated = factory.generated();
        assert_eq!(generated.len(), 2);
        assert_eq!(
            generated[0].borrow().definition().path,
            first.borrow().definition().path
        );
        assert_eq!(
            generated[1].borrow().definition().path,
            third.borrow().definition().path
        );
    }

    #[test]
    fn test_create_not_yet_known_child_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let mut factory = factory(&dir);
        assert!(matches!(
            factory.create(DatumKind::NotYetKnown),
            Err(DatumError::Unsupported(
                UnsupportedTypeError::InvalidChildKind(DatumKind::NotYetKnown)
            ))
        ));
    }

    #[test]
    fn test_create_after_commit_fails() {
        let dir = TempDir::new().unwrap();
        let def = DatumDefinition::new(dir.path(), DatumKind::Factory);
        let mut datum = Datum::from_definition(def).unwrap();
        datum.commit().unwrap();
        match &mut datum {
            Datum::Factory(factory) => {
                assert!(matches!(
                    factory.create(DatumKind::Folder),
                    Err(DatumError::Commit(_))
                ));
            }
            other => panic!("expected factory datum, got {other:?}"),
        }
    }
}
