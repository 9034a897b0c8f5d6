//! Column striping: flattens nested values along one column path into
//! definition levels, repetition levels and values.
//!
//! The technique is described in the paper:
//! [Dremel: Interactive Analysis of Web-Scale Datasets](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/36632.pdf).

use crate::bitmap::ValidityBitmap;
use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::error::{LevelError, Result};
use crate::field::Repetition;
use crate::levels::{FlatColumn, SpacedColumn};
use crate::schema_path::ColumnPath;
use crate::value::{ColumnValue, Value};
use tracing::{debug, trace};

/// Destination for the slots produced while striping a record.
trait SlotSink<T> {
    fn put_slot(
        &mut self,
        definition_level: DefinitionLevel,
        repetition_level: RepetitionLevel,
        value: Option<&T>,
    );
}

impl<T: Clone> SlotSink<T> for FlatColumn<T> {
    fn put_slot(
        &mut self,
        definition_level: DefinitionLevel,
        repetition_level: RepetitionLevel,
        value: Option<&T>,
    ) {
        self.push_slot(definition_level, repetition_level, value.cloned())
    }
}

/// Writes present values straight into their slot of a fixed-stride buffer.
///
/// Slots past the end of the buffer are still counted so the capacity error
/// can report how many were needed.
#[derive(Debug)]
struct SpacedSink<T> {
    buffer: Vec<T>,
    validity: ValidityBitmap,
    definition_levels: Vec<DefinitionLevel>,
    repetition_levels: Vec<RepetitionLevel>,
}

impl<T: Clone> SlotSink<T> for SpacedSink<T> {
    fn put_slot(
        &mut self,
        definition_level: DefinitionLevel,
        repetition_level: RepetitionLevel,
        value: Option<&T>,
    ) {
        let slot = self.definition_levels.len();
        self.definition_levels.push(definition_level);
        self.repetition_levels.push(repetition_level);

        if let (Some(value), Some(entry)) = (value, self.buffer.get_mut(slot)) {
            *entry = value.clone();
            self.validity.set(slot, true);
        }
    }
}

/// Stripes records for a single [`ColumnPath`].
#[derive(Debug)]
pub struct Shredder<'a> {
    path: &'a ColumnPath,
    /// Repetition kinds of the optional and repeated nodes on the path. The
    /// index into this list is the definition level of the parent.
    kinds: Vec<Repetition>,
}

impl<'a> Shredder<'a> {
    pub fn new(path: &'a ColumnPath) -> Self {
        Self {
            path,
            kinds: path.nullable_kinds().collect(),
        }
    }

    /// Stripes all records into a compact [`FlatColumn`].
    pub fn shred<T: ColumnValue>(&self, records: &[Value<T>]) -> Result<FlatColumn<T>> {
        self.path.check_type::<T>()?;

        let mut column = FlatColumn::default();
        for (index, record) in records.iter().enumerate() {
            self.shred_value(record, 0, 0, 0, 0, &mut column)?;
            trace!(record = index, slots = column.num_slots(), "striped record");
        }

        debug!(
            path = %self.path,
            records = records.len(),
            slots = column.num_slots(),
            values = column.num_values(),
            "encoded column"
        );
        Ok(column)
    }

    /// Stripes all records into the caller's fixed-stride `buffer`. Entries
    /// of the buffer at absent slots are left untouched.
    ///
    /// Fails with [`LevelError::CapacityMismatch`] if the records produce
    /// more slots than the buffer holds.
    pub fn shred_spaced<T: ColumnValue>(
        &self,
        records: &[Value<T>],
        buffer: Vec<T>,
    ) -> Result<SpacedColumn<T>> {
        self.path.check_type::<T>()?;

        let stride = buffer.len();
        let mut sink = SpacedSink {
            buffer,
            validity: ValidityBitmap::new_unset(stride),
            definition_levels: vec![],
            repetition_levels: vec![],
        };
        for record in records {
            self.shred_value(record, 0, 0, 0, 0, &mut sink)?;
        }

        let slots = sink.definition_levels.len();
        if slots > stride {
            return Err(LevelError::CapacityMismatch { stride, slots });
        }

        debug!(
            path = %self.path,
            records = records.len(),
            slots,
            stride,
            values = sink.validity.count_set(),
            "encoded spaced column"
        );
        Ok(SpacedColumn::new(
            sink.buffer,
            sink.validity,
            sink.definition_levels,
            sink.repetition_levels,
        ))
    }

    /// Visits `value` which sits below `level` optional or repeated nodes.
    ///
    /// `definition_level` counts the nodes present so far, which equals
    /// `level` as every visited node was present. `repetition_depth` counts
    /// the repeated nodes passed.
    fn shred_value<T: Clone>(
        &self,
        value: &Value<T>,
        level: usize,
        definition_level: DefinitionLevel,
        repetition_level: RepetitionLevel,
        repetition_depth: RepetitionLevel,
        sink: &mut impl SlotSink<T>,
    ) -> Result<()> {
        let Some(kind) = self.kinds.get(level) else {
            return match value {
                Value::Leaf(v) => {
                    sink.put_slot(definition_level, repetition_level, Some(v));
                    Ok(())
                }
                Value::Null => Err(LevelError::schema_violation(
                    self.path,
                    "required value is null",
                )),
                Value::List(_) => Err(LevelError::schema_violation(
                    self.path,
                    "expected a leaf value, found list",
                )),
            };
        };

        match (kind, value) {
            (Repetition::Optional, Value::Null) => {
                sink.put_slot(definition_level, repetition_level, None);
                Ok(())
            }
            (Repetition::Repeated, Value::List(items)) if items.is_empty() => {
                sink.put_slot(definition_level, repetition_level, None);
                Ok(())
            }
            (Repetition::Repeated, Value::List(items)) => {
                for (index, item) in items.iter().enumerate() {
                    // The first element continues the parent, the others
                    // start a new element of this list
                    let item_repetition_level = if index == 0 {
                        repetition_level
                    } else {
                        repetition_depth + 1
                    };
                    self.shred_value(
                        item,
                        level + 1,
                        definition_level + 1,
                        item_repetition_level,
                        repetition_depth + 1,
                        sink,
                    )?;
                }
                Ok(())
            }
            (Repetition::Repeated, other) => Err(LevelError::schema_violation(
                self.path.name_at_level(level),
                format!("expected a list, found {}", other.type_label()),
            )),
            // `kinds` holds no required nodes, so this is a present optional
            (_, present) => self.shred_value(
                present,
                level + 1,
                definition_level + 1,
                repetition_level,
                repetition_depth,
                sink,
            ),
        }
    }
}

/// Encodes records into a compact [`FlatColumn`].
pub fn encode<T: ColumnValue>(records: &[Value<T>], path: &ColumnPath) -> Result<FlatColumn<T>> {
    Shredder::new(path).shred(records)
}

/// Encodes records into a values buffer of exactly `stride` entries. Absent
/// slots and the entries past the last slot hold `filler`.
pub fn encode_spaced<T: ColumnValue>(
    records: &[Value<T>],
    path: &ColumnPath,
    stride: usize,
    filler: T,
) -> Result<SpacedColumn<T>> {
    Shredder::new(path).shred_spaced(records, vec![filler; stride])
}
