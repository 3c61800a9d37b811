//! Batched payloads and slot masks.

use crate::error::{CoreError, CoreResult};
use epistore_storage::Dtype;

/// An element type that can be carried in a [`Batch`].
///
/// Elements are encoded little-endian, matching the row encoding the
/// array store receives.
pub trait Element: Copy {
    /// The store-level dtype tag for this element type.
    const DTYPE: Dtype;

    /// Appends the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: Dtype = $dtype;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_element!(
    i8 => Dtype::I8,
    i16 => Dtype::I16,
    i32 => Dtype::I32,
    i64 => Dtype::I64,
    u8 => Dtype::U8,
    u16 => Dtype::U16,
    u32 => Dtype::U32,
    u64 => Dtype::U64,
    f32 => Dtype::F32,
    f64 => Dtype::F64,
);

impl Element for bool {
    const DTYPE: Dtype = Dtype::Bool;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }
}

/// A batch of rows for one field.
///
/// The first axis is the batch axis; every row is one fixed-shape item,
/// stored row-major as little-endian bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    dtype: Dtype,
    item_shape: Vec<u64>,
    rows: usize,
    data: Vec<u8>,
}

impl Batch {
    /// Builds a batch of `rows` items of shape `item_shape` from typed
    /// values in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBatch`] if `values.len()` is not
    /// `rows` times the item element count.
    ///
    /// # Example
    ///
    /// ```rust
    /// use epistore_core::Batch;
    ///
    /// // two rows, each a 3-vector
    /// let batch = Batch::new(2, vec![3], &[0.0f32, 0.1, 0.2, 1.0, 1.1, 1.2]).unwrap();
    /// assert_eq!(batch.rows(), 2);
    /// assert_eq!(batch.item_nbytes(), 12);
    /// ```
    pub fn new<T: Element>(rows: usize, item_shape: Vec<u64>, values: &[T]) -> CoreResult<Self> {
        let item_len = item_shape.iter().product::<u64>() as usize;
        if values.len() != rows * item_len {
            return Err(CoreError::invalid_batch(format!(
                "{} values cannot fill {rows} rows of {item_len} elements",
                values.len()
            )));
        }
        let mut data = Vec::with_capacity(values.len() * T::DTYPE.size());
        for value in values {
            value.write_le(&mut data);
        }
        Ok(Self {
            dtype: T::DTYPE,
            item_shape,
            rows,
            data,
        })
    }

    /// Builds a batch of scalars, one row per value.
    #[must_use]
    pub fn scalars<T: Element>(values: &[T]) -> Self {
        let mut data = Vec::with_capacity(values.len() * T::DTYPE.size());
        for value in values {
            value.write_le(&mut data);
        }
        Self {
            dtype: T::DTYPE,
            item_shape: Vec::new(),
            rows: values.len(),
            data,
        }
    }

    /// Builds a single-row batch from one item of shape `item_shape`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBatch`] if `values.len()` is not the
    /// item element count.
    pub fn item<T: Element>(item_shape: Vec<u64>, values: &[T]) -> CoreResult<Self> {
        Self::new(1, item_shape, values)
    }

    /// Wraps raw little-endian row bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBatch`] if `data.len()` is not
    /// `rows` times the item byte width.
    pub fn from_bytes(
        dtype: Dtype,
        rows: usize,
        item_shape: Vec<u64>,
        data: Vec<u8>,
    ) -> CoreResult<Self> {
        let item_nbytes = item_shape.iter().product::<u64>() as usize * dtype.size();
        if data.len() != rows * item_nbytes {
            return Err(CoreError::invalid_batch(format!(
                "{} bytes cannot fill {rows} rows of {item_nbytes} bytes",
                data.len()
            )));
        }
        Ok(Self {
            dtype,
            item_shape,
            rows,
            data,
        })
    }

    /// Returns the number of rows (the leading axis).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the element type.
    #[must_use]
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Returns the fixed shape of one row (empty for scalars).
    #[must_use]
    pub fn item_shape(&self) -> &[u64] {
        &self.item_shape
    }

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

    /// Returns the total byte size of the batch.
    #[must_use]
    pub fn nbytes(&self) -> usize {
        self.data.len()
    }

    /// Returns the raw row-major bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// A boolean selector over slots.
///
/// `true` marks a slot as active in the call the mask accompanies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(Vec<bool>);

impl Mask {
    /// Creates a mask from per-slot flags.
    #[must_use]
    pub fn new(slots: Vec<bool>) -> Self {
        Self(slots)
    }

    /// Returns the number of slots covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the mask covers no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns whether `slot` is active. Slots beyond the mask are
    /// inactive.
    #[must_use]
    pub fn is_active(&self, slot: usize) -> bool {
        self.0.get(slot).copied().unwrap_or(false)
    }

    /// Returns the number of active slots.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|&&active| active).count()
    }

    /// Returns the buffered byte estimate of the mask (one byte per slot).
    #[must_use]
    pub fn nbytes(&self) -> usize {
        self.0.len()
    }

    /// Returns the per-slot flags.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

impl From<Vec<bool>> for Mask {
    fn from(slots: Vec<bool>) -> Self {
        Self(slots)
    }
}

impl From<&[bool]> for Mask {
    fn from(slots: &[bool]) -> Self {
        Self(slots.to_vec())
    }
}

impl<const N: usize> From<[bool; N]> for Mask {
    fn from(slots: [bool; N]) -> Self {
        Self(slots.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_batch_layout() {
        let batch = Batch::scalars(&[1.0f64, 2.0, 3.0]);
        assert_eq!(batch.rows(), 3);
        assert_eq!(batch.dtype(), Dtype::F64);
        assert!(batch.item_shape().is_empty());
        assert_eq!(batch.item_nbytes(), 8);
        assert_eq!(batch.nbytes(), 24);
    }

    #[test]
    fn vector_batch_layout() {
        let batch = Batch::new(2, vec![2, 2], &[0u8, 1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(batch.rows(), 2);
        assert_eq!(batch.item_len(), 4);
        assert_eq!(batch.item_nbytes(), 4);
        assert_eq!(batch.as_bytes(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn wrong_element_count_rejected() {
        let result = Batch::new(2, vec![3], &[1.0f32, 2.0, 3.0, 4.0]);
        assert!(matches!(result, Err(CoreError::InvalidBatch { .. })));
    }

    #[test]
    fn item_is_one_row() {
        let batch = Batch::item(vec![2], &[5i64, 6]).unwrap();
        assert_eq!(batch.rows(), 1);
        assert_eq!(batch.item_nbytes(), 16);
    }

    #[test]
    fn from_bytes_validates_length() {
        assert!(Batch::from_bytes(Dtype::F32, 1, vec![2], vec![0; 8]).is_ok());
        let result = Batch::from_bytes(Dtype::F32, 1, vec![2], vec![0; 7]);
        assert!(matches!(result, Err(CoreError::InvalidBatch { .. })));
    }

    #[test]
    fn little_endian_encoding() {
        let batch = Batch::scalars(&[1u16]);
        assert_eq!(batch.as_bytes(), &[1, 0]);
    }

    #[test]
    fn bool_batch() {
        let batch = Batch::scalars(&[true, false]);
        assert_eq!(batch.dtype(), Dtype::Bool);
        assert_eq!(batch.as_bytes(), &[1, 0]);
    }

    #[test]
    fn mask_counts() {
        let mask = Mask::from([true, false, true]);
        assert_eq!(mask.len(), 3);
        assert_eq!(mask.active_count(), 2);
        assert!(mask.is_active(0));
        assert!(!mask.is_active(1));
        assert!(!mask.is_active(7));
        assert_eq!(mask.nbytes(), 3);
    }
}
