use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use hdf5::Group;
use hdf5struct_node::prelude::{Node, Value};

use crate::{
    EntryKind,
    dataset::LazyDataset,
    error::{Error, Result, ResultExt as _},
    file::{OpenMode, close_file, open_file},
    lazy::{LazyEntry, LazyGroup, Listing, resolve},
};

/// Read-only view of the groups below the root of a file, or below a sub-path of it
#[derive(Debug)]
pub struct Hdf5Groups {
    path: PathBuf,
    file: hdf5::File,
    root: Group,
}

impl Hdf5Groups {
    /// Open `path` read-only, rooted at `/`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_at(path, "/")
    }

    /// Open `path` read-only, rooted at the group `sub_path`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `sub_path` doesn't exist and [`Error::WrongKind`] if it is a dataset.
    pub fn open_at(path: impl AsRef<Path>, sub_path: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_file(&path, OpenMode::ReadOnly)?;
        let root = match resolve(&file, &path, sub_path)? {
            Some(LazyEntry::Group(group)) => group.inner().clone(),
            Some(LazyEntry::Dataset(_)) => {
                return Err(Error::WrongKind {
                    path: path.clone(),
                    key: sub_path.to_owned(),
                    expected: EntryKind::Group,
                    found: EntryKind::Dataset,
                });
            }
            None => {
                return Err(Error::NotFound {
                    path: path.clone(),
                    key: sub_path.to_owned(),
                });
            }
        };
        log::debug!("Viewing groups of {} at {}", path.display(), root.name());
        Ok(Self { path, file, root })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The group this view is rooted at
    pub fn root(&self) -> LazyGroup<'_> {
        LazyGroup::new(self.root.clone(), &self.path)
    }

    /// Names of the entries directly below the root of this view
    pub fn groups(&self) -> Result<Vec<String>> {
        self.root.member_names().at(&self.path, &self.root.name())
    }

    /// Look up an entry relative to the root of this view without reading it
    pub fn get_lazy_entry(&self, name: &str) -> Result<Option<LazyEntry<'_>>> {
        resolve(&self.root, &self.path, name)
    }

    /// The children of the group `name`, each left unread.
    ///
    /// # Errors
    ///
    /// [`Error::WrongKind`] if `name` is a dataset.
    pub fn get_lazy_group(&self, name: &str) -> Result<Option<BTreeMap<String, LazyEntry<'_>>>> {
        self.get_group_handle(name)?
            .map(|group| group.children())
            .transpose()
    }

    /// Read the group `name` fully into memory.
    ///
    /// # Errors
    ///
    /// [`Error::WrongKind`] if `name` is a dataset.
    pub fn get_group(&self, name: &str) -> Result<Option<Node>> {
        self.get_group_handle(name)?
            .map(|group| group.force())
            .transpose()
    }

    /// The group `name`, failing if it names a dataset
    pub fn get_group_handle(&self, name: &str) -> Result<Option<LazyGroup<'_>>> {
        match self.get_lazy_entry(name)? {
            Some(LazyEntry::Group(group)) => Ok(Some(group)),
            Some(LazyEntry::Dataset(_)) => Err(self.wrong_kind(name, EntryKind::Group, EntryKind::Dataset)),
            None => Ok(None),
        }
    }

    /// The dataset `name`, failing if it names a group
    pub fn get_dataset(&self, name: &str) -> Result<Option<LazyDataset<'_>>> {
        match self.get_lazy_entry(name)? {
            Some(LazyEntry::Dataset(dataset)) => Ok(Some(dataset)),
            Some(LazyEntry::Group(_)) => Err(self.wrong_kind(name, EntryKind::Dataset, EntryKind::Group)),
            None => Ok(None),
        }
    }

    /// First group named `name` anywhere below the root, searching depth-first
    pub fn find_group(&self, name: &str) -> Result<Option<LazyGroup<'_>>> {
        Ok(self
            .root()
            .find(name, EntryKind::Group)?
            .and_then(LazyEntry::into_group))
    }

    /// First dataset named `name` anywhere below the root, searching depth-first
    pub fn find_dataset(&self, name: &str) -> Result<Option<LazyDataset<'_>>> {
        Ok(self
            .root()
            .find(name, EntryKind::Dataset)?
            .and_then(LazyEntry::into_dataset))
    }

    pub fn close(self) -> Result<()> {
        let Self { path, file, root } = self;
        drop(root);
        close_file(&path, file)
    }

    fn wrong_kind(&self, name: &str, expected: EntryKind, found: EntryKind) -> Error {
        Error::WrongKind {
            path: self.path.clone(),
            key: name.to_owned(),
            expected,
            found,
        }
    }
}

/// e.g.
///
/// ```text
/// file: data/eeg.mat
/// groups: EEG, version
/// ```
impl fmt::Display for Hdf5Groups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file: {}\n{}",
            self.path.display(),
            Listing("groups", self.groups())
        )
    }
}

/// Group view at a fixed sub-path that also reads one named dataset of that group on open
#[derive(Debug)]
pub struct FixedPathGroups {
    groups: Hdf5Groups,
    field: String,
    dataset: Value,
}

impl FixedPathGroups {
    /// Where the PREP pipeline stores its noisy channel parameters
    pub const NOISY_PARAMETERS_PATH: &'static str = "noisyParameters";
    /// Dataset of [`Self::NOISY_PARAMETERS_PATH`] naming the processed data set
    pub const NOISY_PARAMETERS_FIELD: &'static str = "name";

    /// Open `path` read-only rooted at `sub_path` and read its dataset `field`.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`Hdf5Groups::open_at`], [`Error::NotFound`] if `field` doesn't exist
    /// and [`Error::WrongKind`] if it is a group.
    pub fn open(path: impl AsRef<Path>, sub_path: &str, field: &str) -> Result<Self> {
        let groups = Hdf5Groups::open_at(path, sub_path)?;
        let dataset = groups
            .get_dataset(field)?
            .ok_or_else(|| Error::NotFound {
                path: groups.path.clone(),
                key: format!("{sub_path}/{field}"),
            })?
            .read()?;
        log::debug!("Read '{field}' of {sub_path}: {dataset}");
        Ok(Self {
            groups,
            field: field.to_owned(),
            dataset,
        })
    }

    /// The `noisyParameters` group written by the PREP pipeline, identified by its `name` field
    pub fn noisy_parameters(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, Self::NOISY_PARAMETERS_PATH, Self::NOISY_PARAMETERS_FIELD)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// The value of the field read on open
    pub fn dataset(&self) -> &Value {
        &self.dataset
    }

    pub fn as_groups(&self) -> &Hdf5Groups {
        &self.groups
    }

    pub fn into_groups(self) -> Hdf5Groups {
        self.groups
    }

    pub fn path(&self) -> &Path {
        self.groups.path()
    }

    pub fn groups(&self) -> Result<Vec<String>> {
        self.groups.groups()
    }

    pub fn get_lazy_group(&self, name: &str) -> Result<Option<BTreeMap<String, LazyEntry<'_>>>> {
        self.groups.get_lazy_group(name)
    }

    pub fn get_group(&self, name: &str) -> Result<Option<Node>> {
        self.groups.get_group(name)
    }
}

/// e.g.
///
/// ```text
/// file: out/prep.h5
/// dataset: EEG.set
/// groups: highPass, lineNoise, name, reference
/// ```
impl fmt::Display for FixedPathGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file: {}\ndataset: {}\n{}",
            self.path().display(),
            self.dataset,
            Listing("groups", self.groups())
        )
    }
}
