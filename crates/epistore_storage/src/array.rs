//! Array model types shared by the store contract and its callers.

use std::fmt;

/// Element type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// Boolean, stored one byte per element.
    Bool,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
}

impl Dtype {
    /// Returns the width of one element in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Returns the short lowercase name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar attribute value attached to a dataset or group.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// UTF-8 string value.
    Str(String),
    /// Signed integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Compression codec recorded at dataset creation.
///
/// The store records the choice; codec internals belong to the concrete
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Gzip: best ratio, slow.
    Gzip,
    /// LZF: good ratio, fast.
    Lzf,
}

impl Compression {
    /// Returns the codec name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Lzf => "lzf",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creation parameters for a resizable array.
///
/// The leading axis is the growth axis: the array starts at `initial_rows`
/// and may be grown without bound via
/// [`ArrayStore::resize_rows`](crate::ArrayStore::resize_rows). All trailing
/// dimensions are fixed by `item_shape`.
#[derive(Debug, Clone)]
pub struct ArraySpec {
    /// Length of the leading axis at creation.
    pub initial_rows: u64,
    /// Fixed shape of one row (empty for scalars).
    pub item_shape: Vec<u64>,
    /// Element type.
    pub dtype: Dtype,
    /// On-disk chunk shape; `None` delegates chunk sizing to the store.
    pub chunk_shape: Option<Vec<u64>>,
    /// Compression codec; `None` = uncompressed.
    pub compression: Option<Compression>,
}

impl ArraySpec {
    /// Returns the number of elements in one row.
    #[must_use]
    pub fn item_len(&self) -> usize {
        self.item_shape.iter().product::<u64>() as usize
    }

    /// Returns the byte width of one row.
    #[must_use]
    pub fn item_nbytes(&self) -> usize {
        self.item_len() * self.dtype.size()
    }
}
