//! Bounded reads over a column triple.

use crate::bitmap::ValidityBitmap;
use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::error::Result;
use crate::levels::{FlatColumn, SpacedColumn};
use crate::schema_path::ColumnPath;
use crate::value::ColumnValue;
use tracing::debug;

/// Outcome of one bounded read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRead {
    /// Count of slots read, never more than the requested maximum.
    pub levels_read: usize,
    /// Count of present values among the slots read.
    pub values_read: usize,
    requested: usize,
}

impl BatchRead {
    /// Returns `true` if fewer slots were available than requested. This
    /// happens once the reader reaches the end of the column.
    pub fn is_short(&self) -> bool {
        self.levels_read < self.requested
    }
}

/// A cursor over a [`FlatColumn`] which reads a prefix of the remaining
/// slots on every call.
#[derive(Debug)]
pub struct ColumnReader<'a, T> {
    column: &'a FlatColumn<T>,
    max_definition_level: DefinitionLevel,
    level_offset: usize,
    value_offset: usize,
}

impl<'a, T: ColumnValue> ColumnReader<'a, T> {
    /// Fails if `column` is not a well-formed triple for `path`.
    pub fn new(column: &'a FlatColumn<T>, path: &ColumnPath) -> Result<Self> {
        path.check_type::<T>()?;
        column.validate(path)?;

        Ok(Self {
            column,
            max_definition_level: path.max_definition_level(),
            level_offset: 0,
            value_offset: 0,
        })
    }

    pub fn has_next(&self) -> bool {
        self.level_offset < self.column.num_slots()
    }

    pub fn remaining_slots(&self) -> usize {
        self.column.num_slots() - self.level_offset
    }

    /// Reads up to `max_slots` slots, appending their levels and present
    /// values to the output buffers.
    ///
    /// The read may stop in the middle of a record. The next call continues
    /// from the following slot.
    pub fn read_batch(
        &mut self,
        max_slots: usize,
        definition_levels: &mut Vec<DefinitionLevel>,
        repetition_levels: &mut Vec<RepetitionLevel>,
        values: &mut Vec<T>,
    ) -> BatchRead {
        let (levels_read, values_read) = self.advance(max_slots);
        let levels = self.level_offset - levels_read..self.level_offset;
        let present = self.value_offset - values_read..self.value_offset;

        definition_levels.extend_from_slice(&self.column.definition_levels()[levels.clone()]);
        repetition_levels.extend_from_slice(&self.column.repetition_levels()[levels]);
        values.extend_from_slice(&self.column.values()[present]);

        BatchRead {
            levels_read,
            values_read,
            requested: max_slots,
        }
    }

    /// Reads up to `max_slots` slots into a spaced buffer with one entry per
    /// slot. Absent slots hold `filler` and have their validity bit unset.
    pub fn read_batch_spaced(
        &mut self,
        max_slots: usize,
        filler: T,
    ) -> Result<(SpacedColumn<T>, BatchRead)> {
        let (mut definition_levels, mut repetition_levels, mut values) = (vec![], vec![], vec![]);
        let read = self.read_batch(
            max_slots,
            &mut definition_levels,
            &mut repetition_levels,
            &mut values,
        );

        let validity = ValidityBitmap::from_definition_levels(
            &definition_levels,
            self.max_definition_level,
            read.levels_read,
        );
        let spaced = validity.decode_spaced(&values, read.levels_read, 0, filler)?;
        Ok((
            SpacedColumn::new(spaced, validity, definition_levels, repetition_levels),
            read,
        ))
    }

    /// Skips up to `max_slots` slots without copying them.
    pub fn skip_batch(&mut self, max_slots: usize) -> BatchRead {
        let (levels_read, values_read) = self.advance(max_slots);
        BatchRead {
            levels_read,
            values_read,
            requested: max_slots,
        }
    }

    fn advance(&mut self, max_slots: usize) -> (usize, usize) {
        let levels_read = max_slots.min(self.remaining_slots());
        let end = self.level_offset + levels_read;
        let values_read = self.column.definition_levels()[self.level_offset..end]
            .iter()
            .filter(|&&level| level == self.max_definition_level)
            .count();

        self.level_offset = end;
        self.value_offset += values_read;

        debug!(
            requested = max_slots,
            levels_read,
            values_read,
            remaining = self.remaining_slots(),
            "read batch"
        );
        (levels_read, values_read)
    }
}

/// Reads at most `max_slots` slots from the start of `column` and returns
/// them as a new triple.
pub fn decode_batch<T: ColumnValue>(
    column: &FlatColumn<T>,
    path: &ColumnPath,
    max_slots: usize,
) -> Result<(FlatColumn<T>, BatchRead)> {
    let mut reader = ColumnReader::new(column, path)?;
    let mut definition_levels = vec![];
    let mut repetition_levels = vec![];
    let mut values = vec![];

    let read = reader.read_batch(
        max_slots,
        &mut definition_levels,
        &mut repetition_levels,
        &mut values,
    );
    Ok((
        FlatColumn::new(values, definition_levels, repetition_levels),
        read,
    ))
}
