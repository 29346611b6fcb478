use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The element class of a dataset, as reported by the file.
///
/// Displays in lowercase, e.g. `float` or `string`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Deserialize,
    Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DataClass {
    Integer,
    Unsigned,
    Float,
    Boolean,
    String,
    Enum,
    Compound,
    Array,
    #[strum(serialize = "vlen")]
    #[serde(rename = "vlen")]
    VarLen,
    Reference,
    Opaque,
    Bitfield,
    Time,
}

impl DataClass {
    /// Whether values of this class are read into memory when a tree is materialized.
    ///
    /// Enum elements are read as their base integers and fixed arrays as a trailing axis.
    pub fn is_materialized(self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::Unsigned
                | Self::Float
                | Self::Boolean
                | Self::String
                | Self::Enum
                | Self::Compound
                | Self::Array
        )
    }
}
