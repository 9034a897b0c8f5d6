//! Validity bitmap used by spaced writes.
//!
//! One bit per slot, packed LSB-first: slot `i` lives in byte `i / 8` at bit
//! `i % 8`. A set bit marks a slot holding a real value.

use crate::common::DefinitionLevel;
use crate::error::{LevelError, Result};

/// Returns the bit at index `i` of an LSB-first byte buffer. Bits past the
/// end of the buffer read as unset.
#[inline]
pub fn get_bit(bytes: &[u8], i: usize) -> bool {
    bytes
        .get(i / 8)
        .is_some_and(|byte| byte & (1 << (i % 8)) != 0)
}

#[inline]
fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidityBitmap {
    bytes: Vec<u8>,
    len: usize,
}

impl ValidityBitmap {
    /// Creates a bitmap of `len` bits, all unset.
    pub fn new_unset(len: usize) -> Self {
        Self {
            bytes: vec![0; bytes_for_bits(len)],
            len,
        }
    }

    /// Creates a bitmap of `len` bits, all set.
    pub fn new_set(len: usize) -> Self {
        let mut bitmap = Self::new_unset(len);
        for i in 0..len {
            bitmap.set(i, true);
        }
        bitmap
    }

    /// Wraps a packed byte buffer. Bits at or past `len` are cleared.
    pub fn from_bytes(mut bytes: Vec<u8>, len: usize) -> Self {
        bytes.resize(bytes_for_bits(len), 0);
        let mut bitmap = Self { bytes, len };
        bitmap.clear_tail();
        bitmap
    }

    /// Copies `len` bits starting at bit `offset` of a packed byte buffer.
    pub fn from_bytes_with_offset(bytes: &[u8], offset: usize, len: usize) -> Self {
        (0..len).map(|i| get_bit(bytes, offset + i)).collect()
    }

    /// Builds a bitmap of `len` bits where bit `i` is set iff slot `i` is at
    /// the maximum definition level. Bits past the end of `levels` are unset.
    pub fn from_definition_levels(
        levels: &[DefinitionLevel],
        max_definition_level: DefinitionLevel,
        len: usize,
    ) -> Self {
        let mut bitmap = Self::new_unset(len.max(levels.len()));
        for (i, &level) in levels.iter().enumerate() {
            if level == max_definition_level {
                bitmap.set(i, true);
            }
        }
        bitmap
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns bit `i`. Out of range bits read as unset.
    pub fn get(&self, i: usize) -> bool {
        i < self.len && get_bit(&self.bytes, i)
    }

    /// Sets bit `i`, growing the bitmap when `i` is past the end.
    pub fn set(&mut self, i: usize, valid: bool) {
        if i >= self.len {
            self.len = i + 1;
            self.bytes.resize(bytes_for_bits(self.len), 0);
        }
        let mask = 1 << (i % 8);
        if valid {
            self.bytes[i / 8] |= mask;
        } else {
            self.bytes[i / 8] &= !mask;
        }
    }

    /// Count of set bits.
    pub fn count_set(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|i| get_bit(&self.bytes, i))
    }

    /// Compacts a spaced buffer, keeping `spaced[i]` iff bit `offset + i` is
    /// set.
    pub fn put_spaced<'a, T>(&self, spaced: &'a [T], offset: usize) -> Vec<&'a T> {
        spaced
            .iter()
            .enumerate()
            .filter(|(i, _)| self.get(offset + i))
            .map(|(_, value)| value)
            .collect()
    }

    /// Spreads dense values into a buffer of `num_values` slots. Slot `i`
    /// receives the next dense value iff bit `offset + i` is set, otherwise
    /// it holds `filler`.
    ///
    /// Fails with [`LevelError::CapacityMismatch`] if there are fewer dense
    /// values than valid slots.
    pub fn decode_spaced<T: Clone>(
        &self,
        dense: &[T],
        num_values: usize,
        offset: usize,
        filler: T,
    ) -> Result<Vec<T>> {
        let valid = (0..num_values).filter(|i| self.get(offset + i)).count();
        if dense.len() < valid {
            return Err(LevelError::CapacityMismatch {
                stride: dense.len(),
                slots: valid,
            });
        }

        let mut dense = dense.iter();
        let spaced = (0..num_values)
            .map(|i| {
                if self.get(offset + i) {
                    dense.next().cloned().unwrap_or_else(|| filler.clone())
                } else {
                    filler.clone()
                }
            })
            .collect();
        Ok(spaced)
    }

    fn clear_tail(&mut self) {
        let tail = self.len % 8;
        if tail != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= (1u8 << tail) - 1;
            }
        }
    }
}

impl FromIterator<bool> for ValidityBitmap {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bitmap = ValidityBitmap::default();
        let mut len = 0;
        for (i, valid) in iter.into_iter().enumerate() {
            if i % 8 == 0 {
                bitmap.bytes.push(0);
            }
            if valid {
                bitmap.bytes[i / 8] |= 1 << (i % 8);
            }
            len = i + 1;
        }
        bitmap.len = len;
        bitmap
    }
}
