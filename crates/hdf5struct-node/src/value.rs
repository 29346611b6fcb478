use std::fmt;

use ndarray::{Array1, ArrayD};
use serde::{Deserialize, Serialize};

use crate::data_class::DataClass;

/// The concrete contents of a dataset after it has been read into memory.
///
/// Scalars are 0-dimensional arrays. Integers and floats are widened to their 64-bit
/// counterparts when read.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Value {
    Float(ArrayD<f64>),
    Int(ArrayD<i64>),
    UInt(ArrayD<u64>),
    Bool(ArrayD<bool>),
    Str(ArrayD<String>),
    /// A compound dataset split into one column per field.
    ///
    /// Every column has the compound's shape, followed by the field's own dimensions when
    /// the field is a fixed-size array.
    Compound {
        shape: Vec<usize>,
        fields: Vec<(String, Value)>,
    },
    /// Elements of a class that has no in-memory mapping, only the layout is kept
    Unsupported {
        class: DataClass,
        shape: Vec<usize>,
    },
}

impl Value {
    pub fn class(&self) -> DataClass {
        match self {
            Self::Float(_) => DataClass::Float,
            Self::Int(_) => DataClass::Integer,
            Self::UInt(_) => DataClass::Unsigned,
            Self::Bool(_) => DataClass::Boolean,
            Self::Str(_) => DataClass::String,
            Self::Compound { .. } => DataClass::Compound,
            Self::Unsupported { class, .. } => *class,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Float(a) => a.shape(),
            Self::Int(a) => a.shape(),
            Self::UInt(a) => a.shape(),
            Self::Bool(a) => a.shape(),
            Self::Str(a) => a.shape(),
            Self::Compound { shape, .. } | Self::Unsupported { shape, .. } => shape,
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        self.ndim() == 0
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            Self::Float(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<&ArrayD<i64>> {
        match self {
            Self::Int(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<&ArrayD<u64>> {
        match self {
            Self::UInt(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&ArrayD<bool>> {
        match self {
            Self::Bool(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&ArrayD<String>> {
        match self {
            Self::Str(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&[(String, Self)]> {
        match self {
            Self::Compound { fields, .. } => Some(fields.as_slice()),
            _ => None,
        }
    }

    /// The column of a compound value named `name`
    pub fn field(&self, name: &str) -> Option<&Self> {
        self.as_compound()?
            .iter()
            .find_map(|(field, value)| (field == name).then_some(value))
    }

    /// The single number held by a scalar numeric value, converted to [`f64`]
    pub fn scalar_f64(&self) -> Option<f64> {
        if !self.is_scalar() {
            return None;
        }
        match self {
            Self::Float(a) => a.first().copied(),
            Self::Int(a) => a.first().map(|v| *v as f64),
            Self::UInt(a) => a.first().map(|v| *v as f64),
            _ => None,
        }
    }

    /// The text of a scalar string value, or of a 1-element string array.
    ///
    /// MATLAB stores char arrays as a single string element, this treats both layouts alike.
    pub fn scalar_str(&self) -> Option<&str> {
        match self {
            Self::Str(a) if a.len() == 1 => a.first().map(String::as_str),
            _ => None,
        }
    }
}

macro_rules! impl_value_from {
    ( $( $variant:ident => $ty:ty ),* $(,)? ) => {
        $(
            impl From<ArrayD<$ty>> for Value {
                fn from(value: ArrayD<$ty>) -> Self {
                    Self::$variant(value)
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(value: Vec<$ty>) -> Self {
                    Self::$variant(Array1::from(value).into_dyn())
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(ndarray::arr0(value).into_dyn())
                }
            }
        )*
    };
}

impl_value_from! {
    Float => f64,
    Int => i64,
    UInt => u64,
    Bool => bool,
    Str => String,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        value.to_owned().into()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_scalar() {
            match self {
                Self::Float(a) => return fmt_first(f, a),
                Self::Int(a) => return fmt_first(f, a),
                Self::UInt(a) => return fmt_first(f, a),
                Self::Bool(a) => return fmt_first(f, a),
                Self::Str(a) => return fmt_first(f, a),
                Self::Compound { .. } | Self::Unsupported { .. } => (),
            }
        }
        let dims = self
            .shape()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("x");
        write!(f, "{}[{dims}]", self.class())?;
        if let Self::Compound { fields, .. } = self {
            let names: Vec<&str> = fields.iter().map(|(name, _)| name.as_str()).collect();
            write!(f, " {{{}}}", names.join(", "))?;
        }
        if !self.is_supported() {
            write!(f, " (unsupported)")?;
        }
        Ok(())
    }
}

fn fmt_first<T: fmt::Display>(f: &mut fmt::Formatter<'_>, a: &ArrayD<T>) -> fmt::Result {
    match a.first() {
        Some(v) => write!(f, "{v}"),
        None => Ok(()),
    }
}
