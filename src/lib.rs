//! Inspect and edit the group/dataset tree of HDF5 files.
//!
//! The accessors live in [`hdf5struct_hdf5`] and the in-memory tree in [`hdf5struct_node`], this
//! crate adds the `hdf5struct` command line tool on top of them.
use std::{fmt, io::Write};

use anyhow::Context as _;
use hdf5struct_hdf5::{
    FixedPathGroups, Hdf5Groups, Hdf5Structure, LazyEntry, OpenMode, path_has_hdf5_extension,
};
use serde_json::json;

pub mod config;

pub use {
    config::{Config, OutputFormat},
    hdf5struct_hdf5 as accessors, hdf5struct_node as node,
};

/// Print what `config` asks for to `out`
pub fn run(config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    let path = &config.file_path;
    if !path_has_hdf5_extension(path) {
        log::warn!(
            "{} does not have a known HDF5 extension, opening it anyway",
            path.display()
        );
    }
    let view = View::open(config).with_context(|| format!("Failed opening {}", path.display()))?;

    let Some(name) = &config.entry else {
        match config.format {
            OutputFormat::Text => writeln!(out, "{view}")?,
            OutputFormat::Json => write_json(out, &view.summary_json()?)?,
        }
        return Ok(());
    };

    let entry = view
        .lazy_entry(name)?
        .with_context(|| format!("No entry named '{name}' in {}", path.display()))?;
    match (config.lazy, config.format) {
        (true, OutputFormat::Text) => writeln!(out, "{entry}")?,
        (true, OutputFormat::Json) => write_json(out, &lazy_json(&entry)?)?,
        (false, OutputFormat::Text) => write!(out, "{}", entry.force()?)?,
        (false, OutputFormat::Json) => write_json(out, &entry.force()?)?,
    }
    Ok(())
}

fn write_json(out: &mut impl Write, value: &impl serde::Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn lazy_json(entry: &LazyEntry<'_>) -> anyhow::Result<serde_json::Value> {
    Ok(match entry {
        LazyEntry::Group(group) => json!({
            "path": group.name(),
            "entries": group.member_names()?,
        }),
        LazyEntry::Dataset(dataset) => serde_json::to_value(dataset.info()?)?,
    })
}

/// The accessor chosen by the command line arguments
enum View {
    Entries(Hdf5Structure),
    Groups(Hdf5Groups),
    FixedPath(FixedPathGroups),
}

impl View {
    fn open(config: &Config) -> hdf5struct_hdf5::Result<Self> {
        let path = &config.file_path;
        Ok(match (&config.sub_path, &config.field) {
            (None, _) => Self::Entries(Hdf5Structure::open_with_mode(path, OpenMode::ReadOnly)?),
            (Some(sub_path), None) => Self::Groups(Hdf5Groups::open_at(path, sub_path)?),
            (Some(sub_path), Some(field)) => {
                Self::FixedPath(FixedPathGroups::open(path, sub_path, field)?)
            }
        })
    }

    fn lazy_entry(&self, name: &str) -> hdf5struct_hdf5::Result<Option<LazyEntry<'_>>> {
        match self {
            Self::Entries(entries) => entries.get_lazy_entry(name),
            Self::Groups(groups) => groups.get_lazy_entry(name),
            Self::FixedPath(fixed) => fixed.as_groups().get_lazy_entry(name),
        }
    }

    fn summary_json(&self) -> hdf5struct_hdf5::Result<serde_json::Value> {
        Ok(match self {
            Self::Entries(entries) => json!({
                "file": entries.path().display().to_string(),
                "entries": entries.entries()?,
            }),
            Self::Groups(groups) => json!({
                "file": groups.path().display().to_string(),
                "groups": groups.groups()?,
            }),
            Self::FixedPath(fixed) => json!({
                "file": fixed.path().display().to_string(),
                "field": fixed.field(),
                "dataset": fixed.dataset(),
                "groups": fixed.groups()?,
            }),
        })
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entries(entries) => fmt::Display::fmt(entries, f),
            Self::Groups(groups) => fmt::Display::fmt(groups, f),
            Self::FixedPath(fixed) => fmt::Display::fmt(fixed, f),
        }
    }
}
