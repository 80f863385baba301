use super::attribute::ComponentDataType;

use core::fmt;
use std::ops;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeValueIdx(usize);
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceIdx(usize);
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointIdx(usize);

macro_rules! idx_op_impl {
    ($($trait_:ident, $method:ident, $op:tt, $t:ty);*) => {
        $(
            impl ops::$trait_<$t> for $t {
                type Output = Self;

                fn $method(self, other: Self) -> Self::Output {
                    Self( self.0 $op other.0 )
                }
            }
        )*
    };
}

macro_rules! all_idx_ops_impl {
    ($($t:ty),*) => {
        $(
            idx_op_impl! {
                Add, add, +, $t;
                Sub, sub, -, $t
            }
        )*
    };
}

all_idx_ops_impl!{
    AttributeValueIdx,
    FaceIdx,
    PointIdx
}

macro_rules! idx_debug_impl {
    ($($t:ty),*) => {
        $(
            impl fmt::Debug for $t {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }
        )*
    };
}

idx_debug_impl!{
    AttributeValueIdx,
    FaceIdx,
    PointIdx
}

macro_rules! vec_with_new_idx {
    ($($Idx:ident),*) => {
        $(
            paste::paste! {
                /// Vector wrapper indexed by `$Idx` and named `Vec$Idx` (e.g. `VecPointIdx`).
                #[derive(Debug, Clone, Default, PartialEq, Eq)]
                pub struct [<Vec $Idx:camel>]<T> {
                    inner: ::std::vec::Vec<T>,
                }

                impl<T: Clone> [<Vec $Idx:camel>]<T> {
                    #[allow(unused)]
                    pub fn new() -> Self {
                        Self { inner: ::std::vec::Vec::new() }
                    }

                    #[allow(unused)]
                    pub fn with_capacity(capacity: usize) -> Self {
                        Self { inner: ::std::vec::Vec::with_capacity(capacity) }
                    }

                    #[allow(unused)]
                    pub fn push(&mut self, value: T) {
                        self.inner.push(value)
                    }

                    #[allow(unused)]
                    pub fn len(&self) -> usize { self.inner.len() }
                    #[allow(unused)]
                    pub fn is_empty(&self) -> bool { self.inner.is_empty() }

                    #[allow(unused)]
                    pub fn get(&self, idx: $Idx) -> Option<&T> {
                        self.inner.get(usize::from(idx))
                    }

                    #[allow(unused)]
                    pub fn iter(&self) -> impl Iterator<Item = &T> {
                        self.inner.iter()
                    }

                    #[allow(unused)]
                    pub fn into_inner(self) -> ::std::vec::Vec<T> { self.inner }
                }

                impl<T> ::std::ops::Index<$Idx> for [<Vec $Idx:camel>]<T> {
                    type Output = T;
                    fn index(&self, idx: $Idx) -> &Self::Output {
                        &self.inner[usize::from(idx)]
                    }
                }

                impl<T> ::std::ops::IndexMut<$Idx> for [<Vec $Idx:camel>]<T> {
                    fn index_mut(&mut self, idx: $Idx) -> &mut Self::Output {
                        &mut self.inner[usize::from(idx)]
                    }
                }

                impl<T> ::std::convert::From<::std::vec::Vec<T>> for [<Vec $Idx:camel>]<T> {
                    fn from(inner: ::std::vec::Vec<T>) -> Self {
                        Self { inner }
                    }
                }

                impl<T> ::std::iter::IntoIterator for [<Vec $Idx:camel>]<T> {
                    type Item = T;
                    type IntoIter = ::std::vec::IntoIter<T>;

                    fn into_iter(self) -> Self::IntoIter {
                        self.inner.into_iter()
                    }
                }
            }
        )*
    };
}

vec_with_new_idx!(
    AttributeValueIdx,
    FaceIdx,
    PointIdx
);

macro_rules! idx_impl {
    ($($t:ty),*) => {
        $(
            impl From<usize> for $t {
                fn from(idx: usize) -> Self {
                    Self(idx)
                }
            }

            impl From<$t> for usize {
                fn from(idx: $t) -> Self {
                    idx.0
                }
            }
        )*
    };
}

idx_impl! {
    AttributeValueIdx,
    FaceIdx,
    PointIdx
}


pub trait ConfigType {
    fn default()-> Self;
}


/// A scalar that can live in an attribute buffer. Values are stored little-endian,
/// exactly `size_of::<Self>()` bytes per component.
pub trait DataValue:
    Clone + Copy + fmt::Debug + PartialEq + PartialOrd
    + ops::Add<Output=Self> + ops::Sub<Output=Self> + ops::Mul<Output=Self>
{
    fn get_dyn() -> ComponentDataType;
    fn zero() -> Self;
    /// Reads one value from the first `size_of::<Self>()` bytes of `bytes`.
    fn from_le_slice(bytes: &[u8]) -> Self;
    fn write_le(self, out: &mut Vec<u8>);
    fn from_u64(data: u64) -> Self;
    fn from_f64(data: f64) -> Self;
    fn to_f64(self) -> f64;
}

macro_rules! impl_data_value {
    ($(($t:ty, $component_type: expr)),*) => {
        $(
            impl DataValue for $t {
                fn get_dyn() -> ComponentDataType {
                    $component_type
                }

                fn zero() -> Self {
                    0 as $t
                }

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
                    <$t>::from_le_bytes(buf)
                }

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn from_u64(data: u64) -> Self {
                    data as $t
                }

                fn from_f64(data: f64) -> Self {
                    data as $t
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_data_value!(
    (u8, ComponentDataType::U8),
    (u16, ComponentDataType::U16),
    (u32, ComponentDataType::U32),
    (i8, ComponentDataType::I8),
    (i16, ComponentDataType::I16),
    (i32, ComponentDataType::I32),
    (f32, ComponentDataType::F32),
    (f64, ComponentDataType::F64)
);
