use std::{collections::BTreeMap, fmt, path::Path};

use hdf5::{Group, LocationType};
use hdf5struct_node::prelude::Node;

use crate::{
    EntryKind,
    dataset::LazyDataset,
    error::{Error, Result, ResultExt as _},
};

/// A reference to an entry of an open file, nothing is read until it is forced.
///
/// The handle borrows the accessor it came from so it cannot outlive the open file.
#[derive(Debug, Clone)]
pub enum LazyEntry<'f> {
    Group(LazyGroup<'f>),
    Dataset(LazyDataset<'f>),
}

impl<'f> LazyEntry<'f> {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Group(_) => EntryKind::Group,
            Self::Dataset(_) => EntryKind::Dataset,
        }
    }

    /// Absolute path of the entry within the file
    pub fn name(&self) -> String {
        match self {
            Self::Group(g) => g.name(),
            Self::Dataset(d) => d.name(),
        }
    }

    /// Read the entry into memory, recursing into groups
    pub fn force(&self) -> Result<Node> {
        match self {
            Self::Group(group) => group.force(),
            Self::Dataset(dataset) => dataset.read().map(Node::Leaf),
        }
    }

    pub fn into_group(self) -> Option<LazyGroup<'f>> {
        match self {
            Self::Group(g) => Some(g),
            Self::Dataset(_) => None,
        }
    }

    pub fn into_dataset(self) -> Option<LazyDataset<'f>> {
        match self {
            Self::Dataset(d) => Some(d),
            Self::Group(_) => None,
        }
    }
}

impl fmt::Display for LazyEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(g) => fmt::Display::fmt(g, f),
            Self::Dataset(d) => fmt::Display::fmt(d, f),
        }
    }
}

/// A group of an open file
#[derive(Debug, Clone)]
pub struct LazyGroup<'f> {
    group: Group,
    file: &'f Path,
}

impl<'f> LazyGroup<'f> {
    pub(crate) fn new(group: Group, file: &'f Path) -> Self {
        Self { group, file }
    }

    /// The underlying library handle
    pub fn inner(&self) -> &Group {
        &self.group
    }

    pub fn name(&self) -> String {
        self.group.name()
    }

    /// Names of the immediate children, in the order the library lists them
    pub fn member_names(&self) -> Result<Vec<String>> {
        self.group.member_names().at(self.file, &self.name())
    }

    /// Look up a descendant by a slash-delimited path relative to this group
    pub fn child(&self, path: &str) -> Result<Option<LazyEntry<'f>>> {
        resolve(&self.group, self.file, path)
    }

    /// All immediate children.
    ///
    /// Links to anything other than groups and datasets, e.g. committed datatypes, are skipped.
    pub fn children(&self) -> Result<BTreeMap<String, LazyEntry<'f>>> {
        let mut children = BTreeMap::new();
        for name in self.member_names()? {
            match self.child(&name) {
                Ok(Some(entry)) => {
                    children.insert(name, entry);
                }
                Ok(None) => log::warn!("'{name}' disappeared from {}", self.name()),
                Err(Error::UnsupportedObject { key, .. }) => {
                    log::warn!("Skipping '{key}', it is neither a group nor a dataset");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(children)
    }

    /// Read every dataset below this group into memory, keeping the group structure
    pub fn force(&self) -> Result<Node> {
        log::trace!("Forcing group {}", self.name());
        self.children()?
            .into_iter()
            .map(|(name, child)| child.force().map(|node| (name, node)))
            .collect::<Result<_>>()
            .map(Node::Group)
    }

    /// Depth-first search of this subtree for the first entry of the given kind whose own name
    /// is `name`. Children are visited in name order, each child before its siblings' subtrees.
    pub fn find(&self, name: &str, kind: EntryKind) -> Result<Option<LazyEntry<'f>>> {
        for (child_name, child) in self.children()? {
            if child_name == name && child.kind() == kind {
                return Ok(Some(child));
            }
            if let LazyEntry::Group(group) = &child
                && let Some(found) = group.find(name, kind)?
            {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

/// Summarizes the group, e.g.
///
/// ```text
/// Path: /EEG
///     Number of entries: 2
///     Entries: [data, srate]
/// ```
impl fmt::Display for LazyGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.member_names() {
            Ok(entries) => write!(
                f,
                "Path: {}\n\tNumber of entries: {}\n\tEntries: [{}]",
                self.name(),
                entries.len(),
                entries.join(", ")
            ),
            Err(e) => write!(f, "Path: {}\n\tError: {e}", self.name()),
        }
    }
}

/// Entry names after a label, e.g. `groups: a, b`, or the error listing them failed with
pub(crate) struct Listing<'a>(pub(crate) &'a str, pub(crate) Result<Vec<String>>);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.1 {
            Ok(names) => write!(f, "{}: {}", self.0, names.join(", ")),
            Err(e) => write!(f, "\tError: {e}"),
        }
    }
}

/// Resolve a slash-delimited `path` below `root`.
///
/// Returns `Ok(None)` if any component is missing or if the path descends through a dataset.
/// An empty path (or `/`) resolves to `root` itself.
pub(crate) fn resolve<'f>(root: &Group, file: &'f Path, path: &str) -> Result<Option<LazyEntry<'f>>> {
    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    let Some((last, parents)) = components.split_last() else {
        return Ok(Some(LazyEntry::Group(LazyGroup::new(root.clone(), file))));
    };

    let mut current = root.clone();
    for parent in parents {
        match open_child(&current, file, parent)? {
            Some(LazyEntry::Group(group)) => current = group.group,
            Some(LazyEntry::Dataset(_)) | None => {
                log::debug!("No entry '{path}' in {}", current.name());
                return Ok(None);
            }
        }
    }
    let entry = open_child(&current, file, last)?;
    if entry.is_none() {
        log::debug!("No entry '{path}' in {}", root.name());
    }
    Ok(entry)
}

fn open_child<'f>(parent: &Group, file: &'f Path, name: &str) -> Result<Option<LazyEntry<'f>>> {
    if !parent.link_exists(name) {
        return Ok(None);
    }
    let key = join(&parent.name(), name);
    let entry = match parent.loc_type_by_name(name).at(file, &key)? {
        LocationType::Group => {
            LazyEntry::Group(LazyGroup::new(parent.group(name).at(file, &key)?, file))
        }
        LocationType::Dataset => {
            LazyEntry::Dataset(LazyDataset::new(parent.dataset(name).at(file, &key)?, file))
        }
        _ => {
            return Err(Error::UnsupportedObject {
                path: file.to_path_buf(),
                key,
            });
        }
    };
    Ok(Some(entry))
}

fn join(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use hdf5struct_test_util::*;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_resolve_nested_and_missing() -> TestResult {
        let fixture = matlab_eeg()?;
        let file = hdf5::File::open(fixture.path())?;
        let path = fixture.path();

        let root = resolve(&file, path, "/")?.expect("root always resolves");
        assert_eq!(root.kind(), EntryKind::Group);
        assert_eq!(root.name(), "/");

        let radius = resolve(&file, path, "/EEG/chanlocs/radius")?.expect("radius exists");
        assert_eq!(radius.kind(), EntryKind::Dataset);
        assert_eq!(radius.name(), "/EEG/chanlocs/radius");

        let same = resolve(&file, path, "EEG//chanlocs/radius/")?.expect("radius exists");
        assert_eq!(same.name(), radius.name());

        assert!(resolve(&file, path, "EEG/missing")?.is_none());
        assert!(resolve(&file, path, "missing/radius")?.is_none());
        // Through a dataset
        assert!(resolve(&file, path, "EEG/srate/x")?.is_none());
        Ok(())
    }

    #[test]
    fn test_group_display() -> TestResult {
        let fixture = matlab_eeg()?;
        let file = hdf5::File::open(fixture.path())?;
        let chanlocs = resolve(&file, fixture.path(), "EEG/chanlocs")?
            .and_then(LazyEntry::into_group)
            .expect("chanlocs is a group");
        assert_eq!(
            chanlocs.to_string(),
            "Path: /EEG/chanlocs\n\tNumber of entries: 3\n\tEntries: [labels, radius, xyz]"
        );
        Ok(())
    }

    #[test]
    fn test_group_display_reports_listing_errors() -> TestResult {
        let fixture = matlab_eeg()?;
        // A strong close invalidates every handle into the file
        let file = hdf5::File::with_options()
            .with_fapl(|fapl| fapl.fclose_degree(hdf5::file::FileCloseDegree::Strong))
            .open(fixture.path())?;
        let chanlocs = resolve(&file, fixture.path(), "EEG/chanlocs")?
            .and_then(LazyEntry::into_group)
            .expect("chanlocs is a group");
        file.close()?;

        assert!(chanlocs.member_names().is_err());
        let shown = chanlocs.to_string();
        assert!(shown.contains("\n\tError: "), "{shown}");
        assert!(!shown.contains("Number of entries"), "{shown}");
        Ok(())
    }

    #[test]
    fn test_listing_shows_names_or_error() {
        let names = Listing("groups", Ok(vec!["a".to_owned(), "b".to_owned()]));
        assert_eq!(names.to_string(), "groups: a, b");

        let failed = Listing(
            "groups",
            Err(Error::NotFound {
                path: "eeg.mat".into(),
                key: "/".to_owned(),
            }),
        );
        let shown = failed.to_string();
        assert!(shown.starts_with("\tError: "), "{shown}");
        assert!(!shown.contains("groups:"), "{shown}");
    }

    #[test]
    fn test_find_is_depth_first() -> TestResult {
        let fixture = noisy_parameters()?;
        let file = hdf5::File::open(fixture.path())?;
        let root = LazyGroup::new(file.group("/")?, fixture.path());

        let found = root
            .find("badChannelsFromDeviation", EntryKind::Dataset)?
            .expect("nested dataset is found");
        assert_eq!(
            found.name(),
            "/noisyParameters/reference/noisyStatistics/noisyChannels/badChannelsFromDeviation"
        );
        let found = root
            .find("noisyChannels", EntryKind::Group)?
            .expect("nested group is found");
        assert_eq!(found.kind(), EntryKind::Group);

        // Matching name but wrong kind
        assert!(root.find("highPassCutoff", EntryKind::Group)?.is_none());
        assert!(root.find("nothing", EntryKind::Dataset)?.is_none());
        Ok(())
    }
}
