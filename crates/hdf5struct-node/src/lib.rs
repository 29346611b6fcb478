//! In-memory representation of materialized HDF5 trees.
//!
//! Nothing in here touches a file, the types are produced by `hdf5struct-hdf5` and consumed by
//! numeric code.
pub mod data_class;
pub mod node;
pub mod value;

pub use ndarray;

pub mod prelude {
    pub use crate::data_class::DataClass;
    pub use crate::node::Node;
    pub use crate::value::Value;
}
