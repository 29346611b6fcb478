use std::{fmt, path::Path};

use hdf5::{
    Dataset, Datatype, H5Type,
    types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode},
};
use hdf5struct_node::prelude::{DataClass, Value};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::{
    decode::{raw_class, read_structured},
    error::{Error, Result, ResultExt as _},
};

/// Longest fixed-length string element that is read in full, longer elements are truncated
pub const MAX_FIXED_STRING_LEN: usize = 1024;

/// Layout of a dataset, available without reading its contents
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatasetInfo {
    pub path: String,
    pub shape: Vec<usize>,
    pub class: DataClass,
    /// Size of a single element in bytes as stored in the file
    pub element_size: usize,
}

impl DatasetInfo {
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// Summarizes the dataset, e.g.
///
/// ```text
/// Path: /EEG/data
///     Dimensions: [2, 3]
///     Type: float
/// ```
impl fmt::Display for DatasetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Path: {}\n\tDimensions: {:?}\n\tType: {}",
            self.path, self.shape, self.class
        )
    }
}

/// A dataset of an open file
#[derive(Debug, Clone)]
pub struct LazyDataset<'f> {
    dataset: Dataset,
    file: &'f Path,
}

impl<'f> LazyDataset<'f> {
    pub(crate) fn new(dataset: Dataset, file: &'f Path) -> Self {
        Self { dataset, file }
    }

    /// The underlying library handle
    pub fn inner(&self) -> &Dataset {
        &self.dataset
    }

    pub fn name(&self) -> String {
        self.dataset.name()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dataset.shape()
    }

    pub fn rank(&self) -> usize {
        self.dataset.ndim()
    }

    fn dtype(&self) -> Result<Datatype> {
        self.dataset.dtype().at(self.file, &self.name())
    }

    fn element(&self) -> Result<Element> {
        let dtype = self.dtype()?;
        Ok(match dtype.to_descriptor() {
            Ok(descriptor) => Element::Described(descriptor),
            Err(e) => {
                log::debug!("{}: no type descriptor: {e}", self.name());
                Element::Raw(raw_class(&dtype))
            }
        })
    }

    pub fn class(&self) -> Result<DataClass> {
        Ok(match self.element()? {
            Element::Described(descriptor) => class_of(&descriptor),
            Element::Raw(class) => class,
        })
    }

    pub fn info(&self) -> Result<DatasetInfo> {
        let element_size = self.dtype()?.size();
        Ok(DatasetInfo {
            path: self.name(),
            shape: self.shape(),
            class: self.class()?,
            element_size,
        })
    }

    /// Read the whole dataset into memory.
    ///
    /// Compounds become one column per field, enums their integer values and fixed-size arrays
    /// an extra trailing axis. Elements of a class without an in-memory mapping, such as
    /// references, come back as [`Value::Unsupported`].
    pub fn read(&self) -> Result<Value> {
        let descriptor = match self.element()? {
            Element::Described(descriptor) => descriptor,
            Element::Raw(class) => return Ok(self.unsupported(class)),
        };
        let value = match &descriptor {
            TypeDescriptor::Integer(_) => Value::Int(self.read_as::<i64>()?),
            TypeDescriptor::Unsigned(_) => Value::UInt(self.read_as::<u64>()?),
            TypeDescriptor::Float(_) => Value::Float(self.read_as::<f64>()?),
            TypeDescriptor::Boolean => Value::Bool(self.read_as::<bool>()?),
            TypeDescriptor::VarLenUnicode
            | TypeDescriptor::VarLenAscii
            | TypeDescriptor::FixedAscii(_)
            | TypeDescriptor::FixedUnicode(_) => Value::Str(self.read_strings_as(&descriptor)?),
            TypeDescriptor::Enum(_)
            | TypeDescriptor::Compound(_)
            | TypeDescriptor::FixedArray(..) => read_structured(&self.dataset, &descriptor)
                .at(self.file, &self.name())?
                .unwrap_or_else(|| self.unsupported(class_of(&descriptor))),
            TypeDescriptor::VarLenArray(_) | TypeDescriptor::Reference(_) => {
                self.unsupported(class_of(&descriptor))
            }
        };
        log::trace!("Read {}: {value}", self.name());
        Ok(value)
    }

    fn unsupported(&self, class: DataClass) -> Value {
        log::warn!(
            "{}: not reading {}, {class} data is unsupported",
            self.file.display(),
            self.name()
        );
        Value::Unsupported {
            class,
            shape: self.shape(),
        }
    }

    /// Read a float dataset, widened to [`f64`]
    pub fn read_f64(&self) -> Result<ArrayD<f64>> {
        self.expect_class(DataClass::Float)?;
        self.read_as()
    }

    /// Read a signed integer dataset, widened to [`i64`]
    pub fn read_i64(&self) -> Result<ArrayD<i64>> {
        self.expect_class(DataClass::Integer)?;
        self.read_as()
    }

    /// Read an unsigned integer dataset, widened to [`u64`]
    pub fn read_u64(&self) -> Result<ArrayD<u64>> {
        self.expect_class(DataClass::Unsigned)?;
        self.read_as()
    }

    /// Read a dataset of fixed or variable length strings
    pub fn read_strings(&self) -> Result<ArrayD<String>> {
        match self.element()? {
            Element::Described(descriptor) if class_of(&descriptor) == DataClass::String => {
                self.read_strings_as(&descriptor)
            }
            Element::Described(descriptor) => {
                Err(self.mismatch(class_of(&descriptor), DataClass::String))
            }
            Element::Raw(class) => Err(self.mismatch(class, DataClass::String)),
        }
    }

    fn expect_class(&self, requested: DataClass) -> Result<()> {
        let class = self.class()?;
        if class == requested {
            Ok(())
        } else {
            Err(self.mismatch(class, requested))
        }
    }

    fn mismatch(&self, class: DataClass, requested: DataClass) -> Error {
        Error::TypeMismatch {
            path: self.file.to_path_buf(),
            key: self.name(),
            class,
            requested,
        }
    }

    fn read_as<T: H5Type>(&self) -> Result<ArrayD<T>> {
        self.dataset.read_dyn::<T>().at(self.file, &self.name())
    }

    fn read_strings_as(&self, descriptor: &TypeDescriptor) -> Result<ArrayD<String>> {
        let strings = match descriptor {
            TypeDescriptor::VarLenUnicode => self
                .read_as::<VarLenUnicode>()?
                .map(|s| s.as_str().to_owned()),
            TypeDescriptor::VarLenAscii => self
                .read_as::<VarLenAscii>()?
                .map(|s| s.as_str().to_owned()),
            TypeDescriptor::FixedAscii(len) => {
                warn_if_truncated(&self.name(), *len);
                self.read_as::<FixedAscii<MAX_FIXED_STRING_LEN>>()?
                    .map(|s| s.as_str().to_owned())
            }
            TypeDescriptor::FixedUnicode(len) => {
                warn_if_truncated(&self.name(), *len);
                self.read_as::<FixedUnicode<MAX_FIXED_STRING_LEN>>()?
                    .map(|s| s.as_str().to_owned())
            }
            other => return Err(self.mismatch(class_of(other), DataClass::String)),
        };
        Ok(strings)
    }
}

fn warn_if_truncated(name: &str, len: usize) {
    if len > MAX_FIXED_STRING_LEN {
        log::warn!(
            "{name}: fixed strings of {len} bytes are truncated to {MAX_FIXED_STRING_LEN} bytes"
        );
    }
}

/// Summarizes the dataset like [`DatasetInfo`]
impl fmt::Display for LazyDataset<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.info() {
            Ok(info) => fmt::Display::fmt(&info, f),
            Err(e) => write!(f, "Path: {}\n\tError: {e}", self.name()),
        }
    }
}

pub(crate) fn class_of(descriptor: &TypeDescriptor) -> DataClass {
    match descriptor {
        TypeDescriptor::Integer(_) => DataClass::Integer,
        TypeDescriptor::Unsigned(_) => DataClass::Unsigned,
        TypeDescriptor::Float(_) => DataClass::Float,
        TypeDescriptor::Boolean => DataClass::Boolean,
        TypeDescriptor::Enum(_) => DataClass::Enum,
        TypeDescriptor::Compound(_) => DataClass::Compound,
        TypeDescriptor::FixedArray(..) => DataClass::Array,
        TypeDescriptor::FixedAscii(_)
        | TypeDescriptor::FixedUnicode(_)
        | TypeDescriptor::VarLenAscii
        | TypeDescriptor::VarLenUnicode => DataClass::String,
        TypeDescriptor::VarLenArray(_) => DataClass::VarLen,
        TypeDescriptor::Reference(_) => DataClass::Reference,
    }
}

/// The element type of a dataset
enum Element {
    Described(TypeDescriptor),
    /// A class the library has no descriptor for, e.g. references or opaque data
    Raw(DataClass),
}
