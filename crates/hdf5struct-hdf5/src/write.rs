use std::path::Path;

use hdf5::{Group, H5Type, types::VarLenUnicode};
use hdf5struct_node::prelude::Value;
use ndarray::{ArrayD, ArrayView, Dimension};

use crate::error::{Error, Result, ResultExt as _};

/// Write `value` as a new dataset at the slash-delimited `path` below `root`
pub(crate) fn write_value(root: &Group, file: &Path, path: &str, value: &Value) -> Result<()> {
    match value {
        Value::Float(a) => write_array(root, file, path, a.view()),
        Value::Int(a) => write_array(root, file, path, a.view()),
        Value::UInt(a) => write_array(root, file, path, a.view()),
        Value::Bool(a) => write_array(root, file, path, a.view()),
        Value::Str(a) => {
            let strings = to_varlen(a).at(file, path)?;
            write_array(root, file, path, strings.view())
        }
        Value::Compound { .. } | Value::Unsupported { .. } => Err(Error::UnsupportedValue {
            path: file.to_path_buf(),
            key: path.to_owned(),
            class: value.class(),
        }),
    }
}

/// Write `data` as a new dataset, creating missing intermediate groups.
///
/// Views in any memory order are accepted, e.g. transposed ones.
pub(crate) fn write_array<T: H5Type + Clone, D: Dimension>(
    root: &Group,
    file: &Path,
    path: &str,
    data: ArrayView<'_, T, D>,
) -> Result<()> {
    let (parent, name) = parent_group(root, file, path)?;
    match data.first() {
        Some(scalar) if data.ndim() == 0 => parent
            .new_dataset::<T>()
            .shape(())
            .create(name)
            .and_then(|ds| ds.write_scalar(scalar))
            .at(file, path)?,
        _ => {
            let data = data.as_standard_layout();
            parent
                .new_dataset_builder()
                .with_data(data.view())
                .create(name)
                .at(file, path)?;
        }
    }
    log::debug!("Wrote dataset {path} to {}", file.display());
    Ok(())
}

/// Split `path` into its parent group, created if missing, and the dataset name
fn parent_group<'p>(root: &Group, file: &Path, path: &'p str) -> Result<(Group, &'p str)> {
    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    let Some((name, parents)) = components.split_last() else {
        return Err(Error::InvalidPath {
            path: file.to_path_buf(),
            key: path.to_owned(),
        });
    };

    let mut current = root.clone();
    for parent in parents {
        current = if current.link_exists(parent) {
            current.group(parent)
        } else {
            log::trace!("Creating intermediate group {parent} in {}", current.name());
            current.create_group(parent)
        }
        .at(file, path)?;
    }
    Ok((current, *name))
}

fn to_varlen(strings: &ArrayD<String>) -> hdf5::Result<ArrayD<VarLenUnicode>> {
    let converted = strings
        .iter()
        .map(|s| {
            s.parse::<VarLenUnicode>()
                .map_err(|e| hdf5::Error::from(format!("invalid string '{s}': {e}")))
        })
        .collect::<hdf5::Result<Vec<_>>>()?;
    ArrayD::from_shape_vec(strings.raw_dim(), converted)
        .map_err(|e| hdf5::Error::from(format!("string array shape: {e}")))
}
