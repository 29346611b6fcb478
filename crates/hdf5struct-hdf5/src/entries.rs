use std::{
    fmt,
    path::{Path, PathBuf},
};

use hdf5::H5Type;
use hdf5struct_node::prelude::{Node, Value};
use ndarray::{ArrayView, Dimension};

use crate::{
    error::{Result, ResultExt as _},
    file::{OpenMode, close_file, open_file},
    lazy::{LazyEntry, LazyGroup, Listing, resolve},
    write::{write_array, write_value},
};

/// Read/write view of the top level entries of an HDF5 file
#[derive(Debug)]
pub struct Hdf5Structure {
    path: PathBuf,
    file: hdf5::File,
}

impl Hdf5Structure {
    /// Open an existing file for reading and writing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_mode(path, OpenMode::ReadWrite)
    }

    pub fn open_with_mode(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_file(&path, mode)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The root group
    pub fn root(&self) -> LazyGroup<'_> {
        LazyGroup::new((*self.file).clone(), &self.path)
    }

    /// Names of the entries directly below the root, in the order the library lists them
    pub fn entries(&self) -> Result<Vec<String>> {
        self.file.member_names().at(&self.path, "/")
    }

    /// Look up an entry by a slash-delimited path without reading it
    pub fn get_lazy_entry(&self, name: &str) -> Result<Option<LazyEntry<'_>>> {
        resolve(&self.file, &self.path, name)
    }

    /// Read an entry fully into memory, recursing into groups
    pub fn get_entry(&self, name: &str) -> Result<Option<Node>> {
        self.get_lazy_entry(name)?
            .map(|entry| entry.force())
            .transpose()
    }

    /// Write `value` as a new dataset at `path`, creating missing intermediate groups.
    ///
    /// # Errors
    ///
    /// Fails if an entry already exists at `path`, if `path` has no components, or if `value` is
    /// a [`Value::Compound`] or [`Value::Unsupported`].
    pub fn write_dataset(&self, path: &str, value: &Value) -> Result<()> {
        write_value(&self.file, &self.path, path, value)
    }

    /// Write an array of any type the library can store, e.g. `f32` or `i16`, without widening it.
    ///
    /// The view may be in any memory order, e.g. transposed.
    pub fn write_array<T: H5Type + Clone, D: Dimension>(
        &self,
        path: &str,
        data: ArrayView<'_, T, D>,
    ) -> Result<()> {
        write_array(&self.file, &self.path, path, data)
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.file.flush().at(&self.path, "/")
    }

    /// Close the file, reporting any error the library raises doing so
    pub fn close(self) -> Result<()> {
        close_file(&self.path, self.file)
    }
}

/// e.g.
///
/// ```text
/// file: data/eeg.mat
/// entries: EEG, version
/// ```
impl fmt::Display for Hdf5Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file: {}\n{}",
            self.path.display(),
            Listing("entries", self.entries())
        )
    }
}

#[cfg(test)]
mod tests {
    use hdf5struct_node::prelude::DataClass;
    use hdf5struct_test_util::*;
    use ndarray::{arr0, array};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{EntryKind, error::Error};

    #[test]
    fn test_entries_lists_root_children() -> TestResult {
        let fixture = matlab_eeg()?;
        let structure = Hdf5Structure::open(fixture.path())?;
        assert_eq!(structure.entries()?, EEG_FILE_ENTRIES);

        let group = structure
            .get_lazy_entry(EEG_GROUP)?
            .and_then(LazyEntry::into_group)
            .expect("EEG is a group");
        assert_eq!(group.member_names()?, EEG_GROUP_ENTRIES);
        Ok(())
    }

    #[test]
    fn test_forced_group_keys_match_lazy_children() -> TestResult {
        let fixture = matlab_eeg()?;
        let structure = Hdf5Structure::open(fixture.path())?;

        let lazy = structure
            .get_lazy_entry(EEG_GROUP)?
            .and_then(LazyEntry::into_group)
            .expect("EEG is a group");
        let lazy_keys: Vec<String> = lazy.children()?.into_keys().collect();

        let forced = structure.get_entry(EEG_GROUP)?.expect("EEG exists");
        let forced_keys: Vec<&str> = forced.keys().collect();
        assert_eq!(forced_keys, lazy_keys);
        Ok(())
    }

    #[test]
    fn test_forced_leaves_equal_stored_data() -> TestResult {
        let fixture = matlab_eeg()?;
        let structure = Hdf5Structure::open_with_mode(fixture.path(), OpenMode::ReadOnly)?;

        let eeg = structure.get_entry(EEG_GROUP)?.expect("EEG exists");
        let data = eeg.leaf("data").expect("data is a dataset");
        assert_eq!(data, &Value::from(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn()));

        assert_eq!(eeg.leaf("srate"), Some(&Value::from(EEG_SRATE)));
        assert_eq!(eeg.leaf("nbchan"), Some(&Value::from(i64::from(EEG_NBCHAN))));
        assert_eq!(eeg.leaf("setname"), Some(&Value::from(EEG_SETNAME)));
        assert_eq!(eeg.leaf("ref"), Some(&Value::from(EEG_REF)));
        assert_eq!(eeg.leaf("flags"), Some(&Value::from(vec![1_u64, 0, 1])));
        assert_eq!(eeg.leaf("rejected"), Some(&Value::from(EEG_REJECTED.to_vec())));
        assert_eq!(
            eeg.leaf("chanlocs/labels"),
            Some(&Value::from(vec!["Fz".to_owned(), "Cz".to_owned()]))
        );
        assert_eq!(eeg.get("event"), Some(&Node::empty_group()));

        let xyz = eeg.leaf("chanlocs/xyz").expect("xyz exists");
        assert_eq!(xyz.class(), DataClass::Float);
        assert_eq!(xyz.shape(), [2, 3]);
        let table = eeg.leaf("chanlocs_table").expect("chanlocs_table exists");
        assert_eq!(table.class(), DataClass::Compound);
        assert_eq!(table.field("urchan"), Some(&Value::from(vec![1_i64, 2])));
        Ok(())
    }

    #[test]
    fn test_forcing_a_group_keeps_unreadable_leaves() -> TestResult {
        let fixture = matlab_eeg()?;
        let structure = Hdf5Structure::open_with_mode(fixture.path(), OpenMode::ReadOnly)?;

        let eeg = structure.get_entry(EEG_GROUP)?.expect("EEG exists");
        assert_eq!(eeg.keys().collect::<Vec<_>>(), EEG_GROUP_ENTRIES);
        assert_eq!(
            eeg.leaf("comments"),
            Some(&Value::Unsupported {
                class: DataClass::Reference,
                shape: vec![EEG_COMMENT_TARGETS.len()]
            })
        );
        assert_eq!(eeg.leaf("srate"), Some(&Value::from(EEG_SRATE)));
        Ok(())
    }

    #[test]
    fn test_absent_entries_are_none() -> TestResult {
        let fixture = matlab_eeg()?;
        let structure = Hdf5Structure::open(fixture.path())?;
        assert!(structure.get_lazy_entry("missing")?.is_none());
        assert!(structure.get_entry("missing")?.is_none());
        assert!(structure.get_entry("EEG/missing")?.is_none());
        Ok(())
    }

    #[test]
    fn test_repeated_reads_are_identical() -> TestResult {
        let fixture = matlab_eeg()?;
        let structure = Hdf5Structure::open(fixture.path())?;
        let first = structure.get_entry(EEG_GROUP)?;
        let second = structure.get_entry(EEG_GROUP)?;
        assert_eq!(first, second);
        assert_eq!(structure.entries()?, structure.entries()?);
        Ok(())
    }

    #[test_log::test]
    fn test_written_dataset_is_listed_and_read_back() -> TestResult {
        let fixture = empty_file()?;
        let structure = Hdf5Structure::open(fixture.path())?;
        assert!(structure.entries()?.is_empty());

        let values = Value::from(vec![0.5, 1.5, 2.5]);
        structure.write_dataset("x", &values)?;
        assert_eq!(structure.entries()?, ["x"]);
        assert_eq!(structure.get_entry("x")?, Some(Node::Leaf(values)));
        Ok(())
    }

    #[test_log::test]
    fn test_write_creates_intermediate_groups() -> TestResult {
        let fixture = empty_file()?;
        let structure = Hdf5Structure::open(fixture.path())?;

        let stored = Value::from(array![[1_i64, 2], [3, 4]].into_dyn());
        structure.write_dataset("/a/b", &stored)?;
        structure.write_dataset("a/c", &Value::from("label"))?;

        let a = structure.get_entry("a")?.expect("a was created");
        assert_eq!(a.keys().collect::<Vec<_>>(), ["b", "c"]);
        assert_eq!(a.leaf("b"), Some(&stored));
        assert_eq!(a.leaf("c"), Some(&Value::from("label")));
        assert_eq!(
            structure.get_lazy_entry("a")?.map(|e| e.kind()),
            Some(EntryKind::Group)
        );
        Ok(())
    }

    #[test]
    fn test_write_scalar_and_narrow_types() -> TestResult {
        let fixture = empty_file()?;
        let structure = Hdf5Structure::open(fixture.path())?;

        structure.write_dataset("rate", &Value::from(arr0(128.0).into_dyn()))?;
        structure.write_array("samples", array![1_i16, -2, 3].view())?;
        structure.write_array("gains", array![0.5_f32, 0.25].view())?;

        let rate = structure.get_entry("rate")?.and_then(Node::into_leaf);
        assert_eq!(rate.as_ref().and_then(Value::scalar_f64), Some(128.0));
        assert_eq!(structure.get_entry("samples")?, Some(Node::Leaf(Value::from(vec![1_i64, -2, 3]))));
        assert_eq!(structure.get_entry("gains")?, Some(Node::Leaf(Value::from(vec![0.5, 0.25]))));
        Ok(())
    }

    #[test]
    fn test_write_transposed_view() -> TestResult {
        let fixture = empty_file()?;
        let structure = Hdf5Structure::open(fixture.path())?;

        let data = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let transposed = data.view().reversed_axes();
        assert!(!transposed.is_standard_layout());
        structure.write_array("transposed", transposed)?;

        let expected = Value::from(transposed.to_owned().into_dyn());
        assert_eq!(expected.shape(), [3, 2]);
        assert_eq!(structure.get_entry("transposed")?, Some(Node::Leaf(expected.clone())));

        structure.write_dataset("via_value", &expected)?;
        assert_eq!(structure.get_entry("via_value")?, Some(Node::Leaf(expected)));
        Ok(())
    }

    #[test]
    fn test_empty_datasets_round_trip() -> TestResult {
        let fixture = empty_file()?;
        let structure = Hdf5Structure::open(fixture.path())?;

        let no_samples = Value::from(Vec::<f64>::new());
        structure.write_dataset("no_samples", &no_samples)?;
        let read = structure.get_entry("no_samples")?.and_then(Node::into_leaf);
        assert_eq!(read.as_ref().map(Value::shape), Some([0].as_slice()));
        assert_eq!(read, Some(no_samples));

        let blank = Value::from("");
        structure.write_dataset("blank", &blank)?;
        let read = structure.get_entry("blank")?.and_then(Node::into_leaf);
        assert_eq!(read.as_ref().and_then(Value::scalar_str), Some(""));
        assert_eq!(read, Some(blank));

        let no_labels = Value::from(Vec::<String>::new());
        structure.write_dataset("no_labels", &no_labels)?;
        assert_eq!(structure.get_entry("no_labels")?, Some(Node::Leaf(no_labels)));
        Ok(())
    }

    #[test]
    fn test_writes_persist_after_close() -> TestResult {
        let fixture = empty_file()?;
        let structure = Hdf5Structure::open(fixture.path())?;
        structure.write_dataset("grp/flags", &Value::from(vec![true, false]))?;
        structure.flush()?;
        structure.close()?;

        let reopened = Hdf5Structure::open_with_mode(fixture.path(), OpenMode::ReadOnly)?;
        assert_eq!(
            reopened.get_entry("grp/flags")?,
            Some(Node::Leaf(Value::from(vec![true, false])))
        );
        Ok(())
    }

    #[test]
    fn test_invalid_writes() -> TestResult {
        let fixture = matlab_eeg()?;
        let structure = Hdf5Structure::open(fixture.path())?;

        let err = structure.write_dataset("//", &Value::from(1.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }), "{err}");

        let unsupported = Value::Unsupported {
            class: DataClass::Reference,
            shape: vec![2],
        };
        let err = structure.write_dataset("blob", &unsupported).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { .. }), "{err}");
        assert_eq!(err.key(), Some("blob"));

        let compound = Value::Compound {
            shape: vec![1],
            fields: vec![("x".to_owned(), Value::from(vec![1.0]))],
        };
        let err = structure.write_dataset("table", &compound).unwrap_err();
        assert!(
            matches!(
                err,
                Error::UnsupportedValue {
                    class: DataClass::Compound,
                    ..
                }
            ),
            "{err}"
        );

        // Existing names are not overwritten
        let err = structure.write_dataset("version", &Value::from(1_i64)).unwrap_err();
        assert!(matches!(err, Error::Access { .. }), "{err}");
        assert!(structure.get_lazy_entry("blob")?.is_none());
        Ok(())
    }

    #[test]
    fn test_read_only_mode_rejects_writes() -> TestResult {
        let fixture = matlab_eeg()?;
        let structure = Hdf5Structure::open_with_mode(fixture.path(), OpenMode::ReadOnly)?;
        assert!(structure.write_dataset("x", &Value::from(1.0)).is_err());
        Ok(())
    }

    #[test]
    fn test_create_mode_starts_empty() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("new.h5");
        let structure = Hdf5Structure::open_with_mode(&path, OpenMode::Create)?;
        assert!(structure.entries()?.is_empty());
        structure.write_dataset("x", &Value::from(vec![1_u64, 2]))?;
        assert_eq!(structure.entries()?, ["x"]);
        Ok(())
    }

    #[test]
    fn test_display() -> TestResult {
        let fixture = matlab_eeg()?;
        let structure = Hdf5Structure::open(fixture.path())?;
        assert_eq!(
            structure.to_string(),
            format!("file: {}\nentries: EEG, version", fixture.path().display())
        );
        Ok(())
    }
}
