//! Reads of datasets whose elements have no single Rust type: compounds, enums and fixed-size
//! arrays, with numeric and string leaves.
//!
//! The file type is mapped to a native memory type and the whole dataset is read as raw bytes.
//! Every leaf of the type then becomes its own [`Value`] column.
#![allow(unsafe_code)]

use std::{ffi::CStr, os::raw::c_char, ptr};

use hdf5::{
    Dataset, Datatype,
    types::{CompoundField, CompoundType, EnumType, FloatSize, IntSize, TypeDescriptor},
};
use hdf5_sys::{
    h5::H5free_memory,
    h5d::H5Dread,
    h5p::H5P_DEFAULT,
    h5s::H5S_ALL,
    h5t::{H5T_class_t, H5Tget_class},
};
use hdf5struct_node::prelude::{DataClass, Value};
use ndarray::{ArrayD, IxDyn};

use crate::dataset::class_of;

/// The class of a datatype as the library reports it.
///
/// Covers the classes that have no [`TypeDescriptor`], e.g. references, opaque and time types.
pub(crate) fn raw_class(dtype: &Datatype) -> DataClass {
    let class = hdf5::sync::sync(|| {
        // SAFETY: `dtype` holds its id open for the duration of the call
        unsafe { H5Tget_class(dtype.id()) }
    });
    match class {
        H5T_class_t::H5T_INTEGER => DataClass::Integer,
        H5T_class_t::H5T_FLOAT => DataClass::Float,
        H5T_class_t::H5T_STRING => DataClass::String,
        H5T_class_t::H5T_ENUM => DataClass::Enum,
        H5T_class_t::H5T_COMPOUND => DataClass::Compound,
        H5T_class_t::H5T_ARRAY => DataClass::Array,
        H5T_class_t::H5T_VLEN => DataClass::VarLen,
        H5T_class_t::H5T_REFERENCE => DataClass::Reference,
        H5T_class_t::H5T_BITFIELD => DataClass::Bitfield,
        H5T_class_t::H5T_TIME => DataClass::Time,
        H5T_class_t::H5T_OPAQUE | H5T_class_t::H5T_NO_CLASS | H5T_class_t::H5T_NCLASSES => {
            DataClass::Opaque
        }
    }
}

/// Read a dataset of compound, enum or fixed-array elements.
///
/// Leaves that cannot be read (references, variable-length sequences) are kept as
/// [`Value::Unsupported`] columns. `None` means no part of the element type can be read.
pub(crate) fn read_structured(
    dataset: &Dataset,
    descriptor: &TypeDescriptor,
) -> hdf5::Result<Option<Value>> {
    let Some(memory) = memory_type(descriptor).map(|ty| ty.to_c_repr()) else {
        return Ok(None);
    };
    let shape = dataset.shape();
    let count: usize = shape.iter().product();
    let bytes = read_raw(dataset, &memory, count)?;
    let positions: Vec<usize> = (0..count).map(|i| i * memory.size()).collect();
    column(descriptor, &memory, &bytes, &positions, shape).map(Some)
}

/// The native type `descriptor` is read into, with numbers widened to 64 bits
fn memory_type(descriptor: &TypeDescriptor) -> Option<TypeDescriptor> {
    match descriptor {
        TypeDescriptor::Integer(_) => Some(TypeDescriptor::Integer(IntSize::U8)),
        TypeDescriptor::Unsigned(_) => Some(TypeDescriptor::Unsigned(IntSize::U8)),
        TypeDescriptor::Float(_) => Some(TypeDescriptor::Float(FloatSize::U8)),
        TypeDescriptor::Boolean
        | TypeDescriptor::Enum(_)
        | TypeDescriptor::FixedAscii(_)
        | TypeDescriptor::FixedUnicode(_)
        | TypeDescriptor::VarLenAscii
        | TypeDescriptor::VarLenUnicode => Some(descriptor.clone()),
        TypeDescriptor::FixedArray(elem, len) => {
            memory_type(elem).map(|elem| TypeDescriptor::FixedArray(Box::new(elem), *len))
        }
        TypeDescriptor::Compound(compound) => {
            let fields: Vec<CompoundField> = compound
                .fields
                .iter()
                .filter_map(|field| {
                    let ty = memory_type(&field.ty)?;
                    Some(CompoundField::new(&field.name, ty, field.offset, field.index))
                })
                .collect();
            (!fields.is_empty()).then(|| {
                TypeDescriptor::Compound(CompoundType {
                    fields,
                    size: compound.size,
                })
            })
        }
        TypeDescriptor::VarLenArray(_) | TypeDescriptor::Reference(_) => None,
    }
}

fn read_raw(dataset: &Dataset, memory: &TypeDescriptor, count: usize) -> hdf5::Result<Vec<u8>> {
    let len = count * memory.size();
    if len == 0 {
        return Ok(Vec::new());
    }
    let mem_dtype = Datatype::from_descriptor(memory)?;
    // Word-sized storage keeps every native field aligned
    let mut words = vec![0_u64; len.div_ceil(size_of::<u64>())];
    hdf5::sync::sync(|| {
        // SAFETY: both ids are open, the whole dataset is selected and `words` holds `count`
        // elements of `mem_dtype`
        let status = unsafe {
            H5Dread(
                dataset.id(),
                mem_dtype.id(),
                H5S_ALL,
                H5S_ALL,
                H5P_DEFAULT,
                words.as_mut_ptr().cast(),
            )
        };
        hdf5::h5check(status)
    })?;
    Ok(words
        .iter()
        .flat_map(|word| word.to_ne_bytes())
        .take(len)
        .collect())
}

/// Decode the elements of type `memory` starting at each of `positions` in `bytes`.
///
/// `file` is the stored type, it names the compound fields that were left out of `memory`.
fn column(
    file: &TypeDescriptor,
    memory: &TypeDescriptor,
    bytes: &[u8],
    positions: &[usize],
    shape: Vec<usize>,
) -> hdf5::Result<Value> {
    let value = match (file, memory) {
        (TypeDescriptor::Compound(file), TypeDescriptor::Compound(memory)) => {
            let mut file_fields: Vec<&CompoundField> = file.fields.iter().collect();
            file_fields.sort_by_key(|field| field.index);
            let fields = file_fields
                .into_iter()
                .map(|field| -> hdf5::Result<(String, Value)> {
                    let value = match memory.fields.iter().find(|f| f.name == field.name) {
                        Some(member) => {
                            let at: Vec<usize> =
                                positions.iter().map(|p| p + member.offset).collect();
                            column(&field.ty, &member.ty, bytes, &at, shape.clone())?
                        }
                        None => Value::Unsupported {
                            class: class_of(&field.ty),
                            shape: shape.clone(),
                        },
                    };
                    Ok((field.name.clone(), value))
                })
                .collect::<hdf5::Result<Vec<_>>>()?;
            Value::Compound { shape, fields }
        }
        (TypeDescriptor::FixedArray(file_elem, len), TypeDescriptor::FixedArray(elem, _)) => {
            let step = elem.size();
            let at: Vec<usize> = positions
                .iter()
                .flat_map(|p| (0..*len).map(move |j| p + j * step))
                .collect();
            let mut shape = shape;
            shape.push(*len);
            column(file_elem, elem, bytes, &at, shape)?
        }
        (_, TypeDescriptor::Integer(_)) => Value::Int(decode_each(&shape, positions, |p| {
            i64::from_ne_bytes(bytes_at(bytes, p))
        })?),
        (_, TypeDescriptor::Unsigned(_)) => Value::UInt(decode_each(&shape, positions, |p| {
            u64::from_ne_bytes(bytes_at(bytes, p))
        })?),
        (_, TypeDescriptor::Float(_)) => Value::Float(decode_each(&shape, positions, |p| {
            f64::from_ne_bytes(bytes_at(bytes, p))
        })?),
        (_, TypeDescriptor::Boolean) => {
            Value::Bool(decode_each(&shape, positions, |p| bytes[p] != 0)?)
        }
        (_, TypeDescriptor::Enum(enum_type)) => enum_column(enum_type, bytes, positions, &shape)?,
        (_, TypeDescriptor::FixedAscii(len) | TypeDescriptor::FixedUnicode(len)) => {
            Value::Str(decode_each(&shape, positions, |p| {
                let raw = &bytes[p..p + len];
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                String::from_utf8_lossy(&raw[..end]).into_owned()
            })?)
        }
        (_, TypeDescriptor::VarLenAscii | TypeDescriptor::VarLenUnicode) => {
            Value::Str(decode_each(&shape, positions, |p| take_varlen_string(bytes, p))?)
        }
        (file, _) => Value::Unsupported {
            class: class_of(file),
            shape,
        },
    };
    Ok(value)
}

/// Enum elements as their underlying integers
fn enum_column(
    enum_type: &EnumType,
    bytes: &[u8],
    positions: &[usize],
    shape: &[usize],
) -> hdf5::Result<Value> {
    let value = if enum_type.signed {
        Value::Int(decode_each(shape, positions, |p| match enum_type.size {
            IntSize::U1 => i64::from(i8::from_ne_bytes(bytes_at(bytes, p))),
            IntSize::U2 => i64::from(i16::from_ne_bytes(bytes_at(bytes, p))),
            IntSize::U4 => i64::from(i32::from_ne_bytes(bytes_at(bytes, p))),
            IntSize::U8 => i64::from_ne_bytes(bytes_at(bytes, p)),
        })?)
    } else {
        Value::UInt(decode_each(shape, positions, |p| match enum_type.size {
            IntSize::U1 => u64::from(u8::from_ne_bytes(bytes_at(bytes, p))),
            IntSize::U2 => u64::from(u16::from_ne_bytes(bytes_at(bytes, p))),
            IntSize::U4 => u64::from(u32::from_ne_bytes(bytes_at(bytes, p))),
            IntSize::U8 => u64::from_ne_bytes(bytes_at(bytes, p)),
        })?)
    };
    Ok(value)
}

/// Copy out the string a variable-length element points to and release the library's copy
fn take_varlen_string(bytes: &[u8], at: usize) -> String {
    let ptr = ptr::with_exposed_provenance_mut::<c_char>(usize::from_ne_bytes(bytes_at(bytes, at)));
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: the library wrote the address of a NUL terminated string it allocated. Each
    // element position is decoded once, so the string is read and freed once.
    unsafe {
        let text = CStr::from_ptr(ptr).to_string_lossy().into_owned();
        H5free_memory(ptr.cast());
        text
    }
}

fn bytes_at<const N: usize>(bytes: &[u8], at: usize) -> [u8; N] {
    let mut out = [0; N];
    out.copy_from_slice(&bytes[at..at + N]);
    out
}

fn decode_each<T>(
    shape: &[usize],
    positions: &[usize],
    decode: impl Fn(usize) -> T,
) -> hdf5::Result<ArrayD<T>> {
    let data: Vec<T> = positions.iter().map(|&p| decode(p)).collect();
    Ok(ArrayD::from_shape_vec(IxDyn(shape), data)?)
}
