//! The datum variant family.
//!
//! A [`Datum`] is a live handle to one persisted data artifact: it wraps
//! a [`DatumDefinition`], loads content lazily, and enforces the
//! commit-once write discipline. The family is a closed set of variants;
//! [`Datum::from_definition`] is the single construction point and
//! switches on the definition's kind tag.

mod definition;
mod factory;
mod frame;
mod object;

pub use definition::{DatumDefinition, DatumKind};
pub use factory::DatumFactory;
pub use frame::{Column, DataFrameDatum, Table, TABLE_FILE_NAME};
pub use object::{ObjectDatum, ObjectFormat};

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{CommitError, DatumError, UnsupportedTypeError};

/// Shared handle to a datum.
///
/// Execution is single-threaded; the runtime cache, factory children and
/// slot bindings all share loaded instances through this handle.
pub type SharedDatum = Rc<RefCell<Datum>>;

/// Wrap a datum into a [`SharedDatum`] handle.
pub fn shared(datum: Datum) -> SharedDatum {
    Rc::new(RefCell::new(datum))
}

/// Live handle to one persisted artifact; one variant per kind.
#[derive(Debug)]
pub enum Datum {
    Folder(FolderDatum),
    File(FileDatum),
    DataFrame(DataFrameDatum),
    Object(ObjectDatum),
    Unspecified(UnspecifiedDatum),
    Factory(DatumFactory),
}

impl Datum {
    /// Construct the concrete variant for a definition.
    ///
    /// The kind tag decides the variant; there is no other way to build
    /// a datum, so a match on `Datum` is always exhaustive over kinds.
    pub fn from_definition(definition: DatumDefinition) -> Result<Self, DatumError> {
        let datum = match definition.kind {
            DatumKind::Folder => Self::Folder(FolderDatum::new(definition)),
            DatumKind::File => Self::File(FileDatum::new(definition)?),
            DatumKind::DataFrame => Self::DataFrame(DataFrameDatum::new(definition)),
            DatumKind::Object => Self::Object(ObjectDatum::new(definition)),
            DatumKind::Factory => Self::Factory(DatumFactory::new(definition)),
            DatumKind::NotYetKnown => Self::Unspecified(UnspecifiedDatum::new(definition)),
        };
        Ok(datum)
    }

    /// The wrapped definition.
    pub fn definition(&self) -> &DatumDefinition {
        match self {
            Self::Folder(d) => &d.definition,
            Self::File(d) => &d.definition,
            Self::DataFrame(d) => &d.definition,
            Self::Object(d) => &d.definition,
            Self::Unspecified(d) => &d.definition,
            Self::Factory(d) => &d.definition,
        }
    }

    /// Kind tag of this datum.
    pub fn kind(&self) -> DatumKind {
        self.definition().kind
    }

    /// Whether the datum reached the committed state.
    pub fn is_committed(&self) -> bool {
        match self {
            Self::Folder(d) => d.committed,
            Self::File(d) => d.committed,
            Self::DataFrame(d) => d.committed,
            Self::Object(d) => d.committed,
            Self::Unspecified(d) => d.committed,
            Self::Factory(d) => d.committed,
        }
    }

    /// Mark the datum committed. One-way; committing twice fails.
    pub fn commit(&mut self) -> Result<(), CommitError> {
        let path = self.definition().path.clone();
        let committed = match self {
            Self::Folder(d) => &mut d.committed,
            Self::File(d) => &mut d.committed,
            Self::DataFrame(d) => &mut d.committed,
            Self::Object(d) => &mut d.committed,
            Self::Unspecified(d) => &mut d.committed,
            Self::Factory(d) => &mut d.committed,
        };
        if *committed {
            return Err(CommitError::new(&path));
        }
        *committed = true;
        Ok(())
    }

    /// Drop any in-memory cache; the next access reloads from disk.
    pub fn clear(&mut self) {
        match self {
            Self::DataFrame(d) => d.clear(),
            Self::Object(d) => d.clear(),
            _ => {}
        }
    }

    /// Promote an unspecified datum to a concrete kind.
    ///
    /// Returns a new datum backed by the same path; this instance is
    /// untouched. Only `NOT_YET_KNOWN` datums support promotion.
    pub fn promote(&self, target: DatumKind) -> Result<Datum, DatumError> {
        match self {
            Self::Unspecified(d) => d.promote(target),
            other => Err(UnsupportedTypeError::NotPromotable(other.kind()).into()),
        }
    }
}

/// The most generic datum: a directory on disk.
///
/// Makes no assumptions about the directory's content and never
/// materializes anything.
#[derive(Debug)]
pub struct FolderDatum {
    definition: DatumDefinition,
    committed: bool,
}

impl FolderDatum {
    fn new(definition: DatumDefinition) -> Self {
        Self {
            definition,
            committed: false,
        }
    }

    /// The definition path, verbatim.
    pub fn path(&self) -> &Path {
        &self.definition.path
    }
}

/// A datum whose path holds exactly one data file.
#[derive(Debug)]
pub struct FileDatum {
    definition: DatumDefinition,
    committed: bool,
    file_name: Option<String>,
}

impl FileDatum {
    /// Scan the containing folder for the single non-hidden file.
    ///
    /// Zero matches is legal (a not-yet-written output); more than one
    /// is an ambiguity error.
    fn new(definition: DatumDefinition) -> Result<Self, DatumError> {
        let file_name = locate_single_file(&definition.path)?;
        Ok(Self {
            definition,
            committed: false,
            file_name,
        })
    }

    /// Name of the located file, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Full path of the located file, if any.
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file_name
            .as_ref()
            .map(|name| self.definition.path.join(name))
    }
}

/// A datum of kind `NOT_YET_KNOWN`.
///
/// Placeholder bound by path only; promoted exactly once to a concrete
/// variant when the consuming slot declares its kind.
#[derive(Debug)]
pub struct UnspecifiedDatum {
    definition: DatumDefinition,
    committed: bool,
}

impl UnspecifiedDatum {
    fn new(definition: DatumDefinition) -> Self {
        Self {
            definition,
            committed: false,
        }
    }

    /// Produce a concrete datum for the same path.
    pub fn promote(&self, target: DatumKind) -> Result<Datum, DatumError> {
        if target == DatumKind::NotYetKnown {
            return Err(UnsupportedTypeError::InvalidPromotionTarget(target).into());
        }
        Datum::from_definition(self.definition.with_kind(target))
    }
}

/// Scan a datum folder for exactly one non-hidden file.
///
/// A missing folder counts as zero matches.
pub(crate) fn locate_single_file(dir: &Path) -> Result<Option<String>, DatumError> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut found: Vec<String> = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| DatumError::io(dir, e))? {
        let entry = entry.map_err(|e| DatumError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.path().is_file() {
            continue;
        }
        found.push(name);
    }
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        count => Err(DatumError::AmbiguousFile {
            path: dir.display().to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_folder_datum_path_is_verbatim() {
        let def = DatumDefinition::new("/no/such/place", DatumKind::Folder);
        let datum = Datum::from_definition(def.clone()).unwrap();
        match &datum {
            Datum::Folder(folder) => assert_eq!(folder.path(), def.path()),
            other => panic!("expected folder datum, got {other:?}"),
        }
    }

    #[test]
    fn test_file_datum_locates_single_file() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "payload.csv", "a,b");
        write_file(dir.path(), ".hidden", "ignored");

        let def = DatumDefinition::new(dir.path(), DatumKind::File);
        let datum = Datum::from_definition(def).unwrap();
        match &datum {
            Datum::File(file) => {
                assert_eq!(file.file_name(), Some("payload.csv"));
                assert_eq!(file.file_path(), Some(dir.path().join("payload.csv")));
            }
            other => panic!("expected file datum, got {other:?}"),
        }
    }

    #[test]
    fn test_file_datum_without_file_is_legal() {
        let dir = TempDir::new().unwrap();
        let def = DatumDefinition::new(dir.path(), DatumKind::File);
        let datum = Datum::from_definition(def).unwrap();
        match &datum {
            Datum::File(file) => assert!(file.file_name().is_none()),
            other => panic!("expected file datum, got {other:?}"),
        }
    }

    #[test]
    fn test_file_datum_ambiguous_is_construction_error() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "one.csv", "1");
        write_file(dir.path(), "two.csv", "2");

        let def = DatumDefinition::new(dir.path(), DatumKind::File);
        let result = Datum::from_definition(def);
        assert!(matches!(
            result,
            Err(DatumError::AmbiguousFile { count: 2, .. })
        ));
    }

    #[test]
    fn test_commit_is_one_way() {
        let def = DatumDefinition::new("/data/x", DatumKind::Folder);
        let mut datum = Datum::from_definition(def).unwrap();
        assert!(!datum.is_committed());
        datum.commit().unwrap();
        assert!(datum.is_committed());
        assert!(datum.commit().is_err());
    }

    #[test]
    fn test_promote_yields_target_kind() {
        let dir = TempDir::new().unwrap();
        let def = DatumDefinition::new(dir.path(), DatumKind::NotYetKnown);
        let datum = Datum::from_definition(def).unwrap();
        assert_eq!(datum.kind(), DatumKind::NotYetKnown);

        let promoted = datum.promote(DatumKind::Object).unwrap();
        assert_eq!(promoted.kind(), DatumKind::Object);
        // The source instance keeps its own definition.
        assert_eq!(datum.kind(), DatumKind::NotYetKnown);
    }

    #[test]
    fn test_promote_concrete_datum_is_unsupported() {
        let def = DatumDefinition::new("/data/x", DatumKind::Folder);
        let datum = Datum::from_definition(def).unwrap();
        let result = datum.promote(DatumKind::Object);
        assert!(matches!(
            result,
            Err(DatumError::Unsupported(
                UnsupportedTypeError::NotPromotable(DatumKind::Folder)
            ))
        ));
    }

    #[test]
    fn test_promote_to_not_yet_known_is_unsupported() {
        let def = DatumDefinition::new("/data/x", DatumKind::NotYetKnown);
        let datum = Datum::from_definition(def).unwrap();
        let result = datum.promote(DatumKind::NotYetKnown);
        assert!(matches!(
            result,
            Err(DatumError::Unsupported(
                UnsupportedTypeError::InvalidPromotionTarget(DatumKind::NotYetKnown)
            ))
        ));
    }

    #[test]
    fn test_locate_single_file_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        write_file(dir.path(), "only.bin", "x");

        let located = locate_single_file(dir.path()).unwrap();
        assert_eq!(located.as_deref(), Some("only.bin"));
    }
}
