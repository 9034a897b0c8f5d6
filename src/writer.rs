//! In-memory column chunk writer.
//!
//! A [`ColumnWriter`] accepts already striped levels, spaced buffers with a
//! validity bitmap, or whole records. Every batch is checked against the
//! column path before it is appended. [`ColumnWriter::close`] seals the
//! buffered triple into a [`ColumnChunk`].

use crate::assembler::decode;
use crate::bitmap::get_bit;
use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::error::{LevelError, Result};
use crate::levels::{check_levels, FlatColumn};
use crate::properties::WriterProperties;
use crate::reader::ColumnReader;
use crate::schema_path::ColumnPath;
use crate::shredder::Shredder;
use crate::value::{ColumnValue, Value};
use std::borrow::Cow;
use tracing::debug;

#[derive(Debug)]
pub struct ColumnWriter<T> {
    path: ColumnPath,
    properties: WriterProperties,
    column: FlatColumn<T>,
    num_batches: usize,
}

impl<T: ColumnValue> ColumnWriter<T> {
    /// Fails with [`LevelError::SchemaViolation`] if `T` does not match the
    /// physical type of the column.
    pub fn new(path: ColumnPath, properties: WriterProperties) -> Result<Self> {
        path.check_type::<T>()?;

        Ok(Self {
            path,
            properties,
            column: FlatColumn::default(),
            num_batches: 0,
        })
    }

    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    /// Count of slots buffered so far.
    pub fn num_buffered_slots(&self) -> usize {
        self.column.num_slots()
    }

    /// Appends a batch of striped levels and their present values.
    ///
    /// Definition levels may be omitted only for a column without optional
    /// or repeated nodes, in which case every value is one slot. Repetition
    /// levels may be omitted only for a column without repeated nodes.
    ///
    /// Returns the count of values consumed. Values past the count of slots
    /// at the maximum definition level are ignored.
    pub fn write_batch(
        &mut self,
        values: &[T],
        definition_levels: Option<&[DefinitionLevel]>,
        repetition_levels: Option<&[RepetitionLevel]>,
    ) -> Result<usize> {
        let (definition_levels, repetition_levels) =
            self.resolve_levels(values.len(), definition_levels, repetition_levels)?;
        let present = check_levels(
            &self.path,
            &definition_levels,
            &repetition_levels,
            self.last_definition_level(),
        )?;

        if values.len() < present {
            return Err(LevelError::CapacityMismatch {
                stride: values.len(),
                slots: present,
            });
        }

        self.append(
            values[..present].iter().cloned(),
            &definition_levels,
            &repetition_levels,
        );
        Ok(present)
    }

    /// Appends `num_levels` slots whose values are spaced: `spaced_values[i]`
    /// belongs to slot `i` and holds a real value iff bit
    /// `valid_bits_offset + i` of `valid_bits` is set. Without a bitmap every
    /// slot is valid.
    ///
    /// Only the first `num_levels` entries of the level and value buffers
    /// are read. The bitmap must agree with the definition levels. Entries at
    /// invalid slots are never read.
    pub fn write_batch_spaced(
        &mut self,
        num_levels: usize,
        definition_levels: Option<&[DefinitionLevel]>,
        repetition_levels: Option<&[RepetitionLevel]>,
        valid_bits: Option<&[u8]>,
        valid_bits_offset: usize,
        spaced_values: &[T],
    ) -> Result<usize> {
        let (definition_levels, repetition_levels) =
            self.resolve_levels(num_levels, definition_levels, repetition_levels)?;
        if definition_levels.len() < num_levels || repetition_levels.len() < num_levels {
            return Err(LevelError::corrupt(format!(
                "expected {} levels but found {} definition and {} repetition levels",
                num_levels,
                definition_levels.len(),
                repetition_levels.len()
            )));
        }
        if spaced_values.len() < num_levels {
            return Err(LevelError::CapacityMismatch {
                stride: spaced_values.len(),
                slots: num_levels,
            });
        }

        let definition_levels = &definition_levels[..num_levels];
        let repetition_levels = &repetition_levels[..num_levels];
        check_levels(
            &self.path,
            definition_levels,
            repetition_levels,
            self.last_definition_level(),
        )?;

        let max_definition_level = self.path.max_definition_level();
        let is_valid =
            |slot: usize| valid_bits.map_or(true, |bits| get_bit(bits, valid_bits_offset + slot));
        for (slot, &level) in definition_levels.iter().enumerate() {
            if is_valid(slot) != (level == max_definition_level) {
                return Err(LevelError::corrupt(format!(
                    "validity bit at slot {slot} disagrees with definition level {level}"
                )));
            }
        }

        let values: Vec<T> = spaced_values[..num_levels]
            .iter()
            .enumerate()
            .filter(|&(slot, _)| is_valid(slot))
            .map(|(_, value)| value.clone())
            .collect();
        let written = values.len();

        self.append(values, definition_levels, repetition_levels);
        Ok(written)
    }

    /// Stripes and appends whole records, at most
    /// [`WriterProperties::write_batch_size`] records per step. Returns the
    /// count of slots written.
    pub fn write_records(&mut self, records: &[Value<T>]) -> Result<usize> {
        let shredder = Shredder::new(&self.path);
        let mut striped = Vec::new();
        for chunk in records.chunks(self.properties.write_batch_size()) {
            striped.push(shredder.shred(chunk)?);
        }

        // Nothing is appended unless every record matched the schema
        let mut written = 0;
        for batch in striped {
            written += batch.num_slots();
            let (values, definition_levels, repetition_levels) = batch.into_parts();
            self.append(values, &definition_levels, &repetition_levels);
        }
        Ok(written)
    }

    /// Seals the buffered levels and values into a [`ColumnChunk`].
    pub fn close(self) -> ColumnChunk<T> {
        let metadata = ColumnChunkMetadata::new(&self.column);
        debug!(
            path = %self.path,
            batches = self.num_batches,
            rows = metadata.num_rows,
            levels = metadata.num_levels,
            values = metadata.num_values,
            compression = %self.properties.compression(),
            encoding = %self.properties.encoding(),
            created_by = self.properties.created_by(),
            "closed column chunk"
        );

        ColumnChunk {
            path: self.path,
            properties: self.properties,
            column: self.column,
            metadata,
        }
    }

    /// Definition level of the last buffered slot, which the next batch
    /// may continue.
    fn last_definition_level(&self) -> Option<DefinitionLevel> {
        self.column.definition_levels().last().copied()
    }

    fn resolve_levels<'b>(
        &self,
        num_values: usize,
        definition_levels: Option<&'b [DefinitionLevel]>,
        repetition_levels: Option<&'b [RepetitionLevel]>,
    ) -> Result<(Cow<'b, [DefinitionLevel]>, Cow<'b, [RepetitionLevel]>)> {
        let definition_levels = match definition_levels {
            Some(levels) => Cow::Borrowed(levels),
            None if self.path.max_definition_level() == 0 => Cow::Owned(vec![0; num_values]),
            None => {
                return Err(LevelError::corrupt(format!(
                    "definition levels are required for column {}",
                    self.path
                )))
            }
        };
        let repetition_levels = match repetition_levels {
            Some(levels) => Cow::Borrowed(levels),
            None if self.path.max_repetition_level() == 0 => {
                Cow::Owned(vec![0; definition_levels.len()])
            }
            None => {
                return Err(LevelError::corrupt(format!(
                    "repetition levels are required for column {}",
                    self.path
                )))
            }
        };
        Ok((definition_levels, repetition_levels))
    }

    fn append(
        &mut self,
        values: impl IntoIterator<Item = T>,
        definition_levels: &[DefinitionLevel],
        repetition_levels: &[RepetitionLevel],
    ) {
        self.column.extend(values, definition_levels, repetition_levels);
        self.num_batches += 1;
        debug!(
            path = %self.path,
            batch = self.num_batches,
            slots = definition_levels.len(),
            buffered = self.column.num_slots(),
            "wrote batch"
        );
    }
}

/// Counts describing a sealed column chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnChunkMetadata {
    /// Count of records, which is the count of slots with repetition level 0.
    pub num_rows: usize,
    pub num_levels: usize,
    pub num_values: usize,
    /// Count of slots below the maximum definition level.
    pub null_count: usize,
}

impl ColumnChunkMetadata {
    fn new<T>(column: &FlatColumn<T>) -> Self {
        Self {
            num_rows: column.num_records(),
            num_levels: column.num_slots(),
            num_values: column.num_values(),
            null_count: column.num_slots() - column.num_values(),
        }
    }
}

/// A sealed column triple together with the properties it was written with.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChunk<T> {
    path: ColumnPath,
    properties: WriterProperties,
    column: FlatColumn<T>,
    metadata: ColumnChunkMetadata,
}

impl<T: ColumnValue> ColumnChunk<T> {
    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    pub fn properties(&self) -> &WriterProperties {
        &self.properties
    }

    pub fn column(&self) -> &FlatColumn<T> {
        &self.column
    }

    pub fn metadata(&self) -> ColumnChunkMetadata {
        self.metadata
    }

    pub fn reader(&self) -> Result<ColumnReader<'_, T>> {
        ColumnReader::new(&self.column, &self.path)
    }

    /// Reassembles every record in the chunk.
    pub fn decode(&self) -> Result<Vec<Value<T>>> {
        decode(&self.column, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::PhysicalType;
    use crate::field::Repetition::{Optional, Repeated, Required};
    use crate::properties::Compression;

    fn nullable_list() -> ColumnPath {
        ColumnPath::with_nodes(
            [("a", Optional), ("list", Repeated), ("element", Optional)],
            PhysicalType::Int32,
        )
    }

    fn writer() -> ColumnWriter<i32> {
        ColumnWriter::new(nullable_list(), WriterProperties::default()).unwrap()
    }

    #[test]
    fn test_write_batch() {
        let mut writer = writer();
        let written = writer
            .write_batch(
                &[1, 2, 3, 4, 5],
                Some(&[3, 2, 3, 3, 3]),
                Some(&[0, 1, 1, 1, 1]),
            )
            .unwrap();

        assert_eq!(written, 4);

        let chunk = writer.close();
        assert_eq!(chunk.column().values(), &[1, 2, 3, 4]);
        assert_eq!(
            chunk.metadata(),
            ColumnChunkMetadata {
                num_rows: 1,
                num_levels: 5,
                num_values: 4,
                null_count: 1,
            }
        );
    }

    #[test]
    fn test_write_batch_spaced() {
        let mut writer = writer();
        let written = writer
            .write_batch_spaced(
                5,
                Some(&[3, 2, 3, 3, 3]),
                Some(&[0, 1, 1, 1, 1]),
                Some(&[0b11101]),
                0,
                &[1, -999, 2, 3, 4],
            )
            .unwrap();

        assert_eq!(written, 4);

        let chunk = writer.close();
        assert_eq!(chunk.column().values(), &[1, 2, 3, 4]);
        assert_eq!(chunk.column().definition_levels(), &[3, 2, 3, 3, 3]);
    }

    #[test]
    fn test_write_batch_spaced_with_offset() {
        let mut writer = writer();
        // bits 2..7 of 0b0111_0100 are 1 0 1 1 1
        writer
            .write_batch_spaced(
                5,
                Some(&[3, 2, 3, 3, 3]),
                Some(&[0, 1, 1, 1, 1]),
                Some(&[0b0111_0100]),
                2,
                &[1, 0, 2, 3, 4],
            )
            .unwrap();

        assert_eq!(writer.close().column().values(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_spaced_bitmap_disagrees_with_levels() {
        let mut writer = writer();
        let result =
            writer.write_batch_spaced(2, Some(&[3, 2]), Some(&[0, 1]), Some(&[0b11]), 0, &[1, 2]);

        assert!(matches!(result, Err(LevelError::CorruptLevels { .. })));
        assert_eq!(writer.num_buffered_slots(), 0);
    }

    #[test]
    fn test_spaced_buffer_too_small() {
        let mut writer = writer();
        let result =
            writer.write_batch_spaced(3, Some(&[3, 3, 3]), Some(&[0, 1, 1]), None, 0, &[1, 2]);

        assert_eq!(
            result,
            Err(LevelError::CapacityMismatch {
                stride: 2,
                slots: 3
            })
        );
    }

    #[test]
    fn test_spaced_reads_only_num_levels() {
        let path = ColumnPath::with_nodes([("id", Required)], PhysicalType::Int64);
        let mut writer = ColumnWriter::<i64>::new(path, WriterProperties::default()).unwrap();

        assert_eq!(writer.write_batch_spaced(2, None, None, None, 0, &[5, 6, 7]), Ok(2));
        assert_eq!(
            writer.write_batch_spaced(1, Some(&[0, 0]), None, None, 0, &[8, 9]),
            Ok(1)
        );

        let chunk = writer.close();
        assert_eq!(chunk.column().values(), &[5, 6, 8]);
        assert_eq!(chunk.column().definition_levels(), &[0, 0, 0]);
    }

    #[test]
    fn test_spaced_too_few_levels() {
        let mut writer = writer();
        let result =
            writer.write_batch_spaced(3, Some(&[3, 3]), Some(&[0, 1, 1]), None, 0, &[1, 2, 3]);

        assert!(matches!(result, Err(LevelError::CorruptLevels { .. })));
        assert_eq!(writer.num_buffered_slots(), 0);
    }

    #[test]
    fn test_too_few_values() {
        let mut writer = writer();
        let result = writer.write_batch(&[1], Some(&[3, 3]), Some(&[0, 1]));

        assert_eq!(
            result,
            Err(LevelError::CapacityMismatch {
                stride: 1,
                slots: 2
            })
        );
    }

    #[test]
    fn test_invalid_levels() {
        let mut writer = writer();

        assert!(matches!(
            writer.write_batch(&[1], Some(&[4]), Some(&[0])),
            Err(LevelError::CorruptLevels { .. })
        ));
        assert!(matches!(
            writer.write_batch(&[1], Some(&[3]), Some(&[2])),
            Err(LevelError::CorruptLevels { .. })
        ));
        assert!(matches!(
            writer.write_batch(&[1], None, Some(&[0])),
            Err(LevelError::CorruptLevels { .. })
        ));
        assert!(matches!(
            writer.write_batch(&[1], Some(&[3]), None),
            Err(LevelError::CorruptLevels { .. })
        ));
    }

    #[test]
    fn test_required_column_without_levels() {
        let path = ColumnPath::with_nodes([("id", Required)], PhysicalType::Int64);
        let mut writer = ColumnWriter::<i64>::new(path, WriterProperties::default()).unwrap();

        assert_eq!(writer.write_batch(&[10, 20, 30], None, None), Ok(3));

        let chunk = writer.close();
        assert_eq!(chunk.metadata().num_rows, 3);
        assert_eq!(chunk.metadata().null_count, 0);
        assert_eq!(chunk.column().definition_levels(), &[0, 0, 0]);
    }

    #[test]
    fn test_batches_may_continue_a_record() {
        let mut writer = writer();
        writer
            .write_batch(&[1, 2], Some(&[3, 2, 3]), Some(&[0, 1, 1]))
            .unwrap();
        writer
            .write_batch(&[3, 4], Some(&[3, 3]), Some(&[1, 1]))
            .unwrap();

        let chunk = writer.close();
        assert_eq!(chunk.metadata().num_rows, 1);
        assert_eq!(
            chunk.decode().unwrap(),
            vec![Value::list([Some(1), None, Some(2), Some(3), Some(4)])]
        );
    }

    #[test]
    fn test_batch_cannot_extend_empty_list() {
        let mut writer = writer();
        // an empty list leaves nothing for the next batch to extend
        assert_eq!(writer.write_batch(&[], Some(&[1]), Some(&[0])), Ok(0));

        assert!(matches!(
            writer.write_batch(&[5], Some(&[3]), Some(&[1])),
            Err(LevelError::CorruptLevels { .. })
        ));
        assert_eq!(writer.num_buffered_slots(), 1);

        assert_eq!(writer.write_batch(&[5], Some(&[3]), Some(&[0])), Ok(1));
        let chunk = writer.close();
        assert_eq!(
            chunk.decode().unwrap(),
            vec![Value::List(vec![]), Value::list([Some(5)])]
        );
    }

    #[test]
    fn test_spaced_batch_cannot_extend_absent_list() {
        let mut writer = writer();
        assert_eq!(
            writer.write_batch_spaced(1, Some(&[0]), Some(&[0]), Some(&[0]), 0, &[0]),
            Ok(0)
        );

        assert!(matches!(
            writer.write_batch_spaced(1, Some(&[3]), Some(&[1]), None, 0, &[5]),
            Err(LevelError::CorruptLevels { .. })
        ));
        assert_eq!(writer.num_buffered_slots(), 1);
        assert!(writer.close().reader().is_ok());
    }

    #[test]
    fn test_write_records_in_steps() {
        let properties = WriterProperties::builder()
            .write_batch_size(2)
            .compression(Compression::Snappy)
            .build();
        let mut writer = ColumnWriter::new(nullable_list(), properties).unwrap();
        let records = vec![
            Value::list([Some(1), None]),
            Value::Null,
            Value::List(vec![]),
            Value::list([Some(7)]),
            Value::list([None, Some(8), Some(9)]),
        ];

        assert_eq!(writer.write_records(&records), Ok(8));

        let chunk = writer.close();
        assert_eq!(chunk.properties().compression(), Compression::Snappy);
        assert!(chunk.properties().created_by().starts_with("leveler version"));
        assert_eq!(chunk.metadata().num_rows, 5);
        assert_eq!(chunk.metadata().num_values, 4);
        assert_eq!(chunk.decode().unwrap(), records);
    }

    #[test]
    fn test_write_records_all_or_nothing() {
        let properties = WriterProperties::builder().write_batch_size(1).build();
        let mut writer = ColumnWriter::new(nullable_list(), properties).unwrap();
        let records = vec![Value::list([Some(1)]), Value::Leaf(2)];

        assert!(matches!(
            writer.write_records(&records),
            Err(LevelError::SchemaViolation { .. })
        ));
        assert_eq!(writer.num_buffered_slots(), 0);
    }

    #[test]
    fn test_wrong_physical_type() {
        assert!(matches!(
            ColumnWriter::<i64>::new(nullable_list(), WriterProperties::default()),
            Err(LevelError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn test_chunk_reader() {
        let mut writer = writer();
        writer
            .write_batch(&[1, 2, 3, 4], Some(&[3, 2, 3, 3, 3]), Some(&[0, 1, 1, 1, 1]))
            .unwrap();
        let chunk = writer.close();
        let mut reader = chunk.reader().unwrap();
        let (mut def, mut rep, mut values) = (vec![], vec![], vec![]);

        let read = reader.read_batch(3, &mut def, &mut rep, &mut values);
        assert_eq!((read.levels_read, read.values_read), (3, 2));
        assert_eq!(values, vec![1, 2]);
    }
}
