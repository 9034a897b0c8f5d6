//! Record assembly: rebuilds nested values from definition levels,
//! repetition levels and values.

use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::error::{LevelError, Result};
use crate::field::Repetition;
use crate::levels::{FlatColumn, SpacedColumn};
use crate::schema_path::ColumnPath;
use crate::value::{ColumnValue, Value};
use tracing::debug;

/// Reassembles records for a single [`ColumnPath`].
#[derive(Debug)]
pub struct Assembler<'a> {
    path: &'a ColumnPath,
    kinds: Vec<Repetition>,
}

impl<'a> Assembler<'a> {
    pub fn new(path: &'a ColumnPath) -> Self {
        Self {
            path,
            kinds: path.nullable_kinds().collect(),
        }
    }

    /// Replays the levels of `column` and returns one [`Value`] per record.
    ///
    /// A repetition level of zero starts a new record. A repetition level
    /// `r > 0` appends a new element to the list of the r-th repeated node
    /// of the current record. A definition level below the maximum ends the
    /// value at the first absent node.
    pub fn assemble<T: ColumnValue>(&self, column: &FlatColumn<T>) -> Result<Vec<Value<T>>> {
        self.path.check_type::<T>()?;
        column.validate(self.path)?;

        let max_definition_level = self.path.max_definition_level();
        let mut values = column.values().iter();
        let mut records: Vec<Value<T>> = Vec::with_capacity(column.num_records());

        for (&definition_level, &repetition_level) in column
            .definition_levels()
            .iter()
            .zip(column.repetition_levels())
        {
            let leaf = if definition_level == max_definition_level {
                values.next().cloned()
            } else {
                None
            };

            if repetition_level == 0 {
                records.push(self.build(0, definition_level, leaf)?);
            } else {
                let record = records.last_mut().ok_or_else(|| {
                    LevelError::corrupt("repetition level above zero before the first record")
                })?;
                self.insert(record, 0, 0, definition_level, repetition_level, leaf)?;
            }
        }

        debug!(
            path = %self.path,
            slots = column.num_slots(),
            values = column.num_values(),
            records = records.len(),
            "decoded column"
        );
        Ok(records)
    }

    /// Builds a fresh chain of nodes starting at `level` for a slot with the
    /// given definition level.
    fn build<T>(
        &self,
        level: usize,
        definition_level: DefinitionLevel,
        leaf: Option<T>,
    ) -> Result<Value<T>> {
        let Some(kind) = self.kinds.get(level) else {
            return leaf.map(Value::Leaf).ok_or_else(|| {
                LevelError::corrupt("slot at max definition level has no value")
            });
        };

        // Every node before `level` is present, so the node at `level` is
        // absent when the definition level stops here.
        let is_absent = definition_level as usize == level;
        match kind {
            Repetition::Repeated if is_absent => Ok(Value::List(vec![])),
            Repetition::Repeated => Ok(Value::List(vec![self.build(
                level + 1,
                definition_level,
                leaf,
            )?])),
            _ if is_absent => Ok(Value::Null),
            _ => self.build(level + 1, definition_level, leaf),
        }
    }

    /// Walks down the current record to the list of the repeated node at
    /// depth `repetition_level` and appends a new element to it.
    fn insert<T>(
        &self,
        node: &mut Value<T>,
        level: usize,
        repetition_depth: RepetitionLevel,
        definition_level: DefinitionLevel,
        repetition_level: RepetitionLevel,
        leaf: Option<T>,
    ) -> Result<()> {
        match self.kinds.get(level) {
            Some(Repetition::Repeated) => {
                let Value::List(items) = node else {
                    return Err(LevelError::corrupt(format!(
                        "expected a list at {} while repeating at level {}",
                        self.path.name_at_level(level),
                        repetition_level
                    )));
                };

                if repetition_depth + 1 == repetition_level {
                    items.push(self.build(level + 1, definition_level, leaf)?);
                    Ok(())
                } else {
                    let last = items.last_mut().ok_or_else(|| {
                        LevelError::corrupt(format!(
                            "cannot repeat at level {} inside empty list {}",
                            repetition_level,
                            self.path.name_at_level(level)
                        ))
                    })?;
                    self.insert(
                        last,
                        level + 1,
                        repetition_depth + 1,
                        definition_level,
                        repetition_level,
                        leaf,
                    )
                }
            }
            // A present optional node has no wrapper of its own
            Some(_) => self.insert(
                node,
                level + 1,
                repetition_depth,
                definition_level,
                repetition_level,
                leaf,
            ),
            None => Err(LevelError::corrupt(format!(
                "repetition level {} is deeper than path {}",
                repetition_level, self.path
            ))),
        }
    }
}

/// Decodes a [`FlatColumn`] into one [`Value`] per record.
pub fn decode<T: ColumnValue>(column: &FlatColumn<T>, path: &ColumnPath) -> Result<Vec<Value<T>>> {
    Assembler::new(path).assemble(column)
}

/// Decodes a [`SpacedColumn`] using its validity bitmap to pick the real
/// values. Filler entries are never read.
pub fn decode_spaced<T: ColumnValue>(
    column: &SpacedColumn<T>,
    path: &ColumnPath,
) -> Result<Vec<Value<T>>> {
    decode(&column.to_flat(path)?, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::ValidityBitmap;
    use crate::field::PhysicalType;
    use crate::field::Repetition::{Optional, Repeated, Required};
    use crate::shredder::encode;

    fn nullable_list() -> ColumnPath {
        ColumnPath::with_nodes(
            [("a", Optional), ("list", Repeated), ("element", Optional)],
            PhysicalType::Int32,
        )
    }

    #[test]
    fn test_decode_reference_levels() {
        let column = FlatColumn::new(vec![1, 2, 3, 4], vec![3, 2, 3, 3, 3], vec![0, 1, 1, 1, 1]);
        let records = decode(&column, &nullable_list()).unwrap();

        assert_eq!(
            records,
            vec![Value::list([Some(1), None, Some(2), Some(3), Some(4)])]
        );
    }

    #[test]
    fn test_decode_spaced_reference_levels() {
        let spaced = SpacedColumn::new(
            vec![1, -999, 2, 3, 4],
            ValidityBitmap::from_bytes(vec![0b11101], 5),
            vec![3, 2, 3, 3, 3],
            vec![0, 1, 1, 1, 1],
        );
        let records = decode_spaced(&spaced, &nullable_list()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].leaves(), vec![&1, &2, &3, &4]);
    }

    #[test]
    fn test_decode_absent_levels() {
        let column = FlatColumn::<i32>::new(vec![], vec![0, 1], vec![0, 0]);
        let records = decode(&column, &nullable_list()).unwrap();

        assert_eq!(records, vec![Value::Null, Value::List(vec![])]);
    }

    #[test]
    fn test_decode_nested_lists() {
        let path = ColumnPath::with_nodes([("a", Repeated), ("b", Repeated)], PhysicalType::Int32);
        let column = FlatColumn::new(vec![1, 2, 3], vec![2, 2, 1, 2], vec![0, 2, 1, 1]);
        let records = decode(&column, &path).unwrap();

        assert_eq!(
            records,
            vec![Value::list([
                Value::list([Value::Leaf(1), Value::Leaf(2)]),
                Value::List(vec![]),
                Value::list([Value::Leaf(3)]),
            ])]
        );
    }

    #[test]
    fn test_decode_required_path() {
        let path = ColumnPath::with_nodes([("g", Required), ("id", Required)], PhysicalType::Int64);
        let column = FlatColumn::new(vec![7i64, 8, 9], vec![0, 0, 0], vec![0, 0, 0]);

        assert_eq!(
            decode(&column, &path).unwrap(),
            vec![Value::Leaf(7), Value::Leaf(8), Value::Leaf(9)]
        );
    }

    #[test]
    fn test_round_trip_with_optional_between_lists() {
        // repeated a / optional b / repeated c / required d
        let path = ColumnPath::with_nodes(
            [("a", Repeated), ("b", Optional), ("c", Repeated), ("d", Required)],
            PhysicalType::Int32,
        );
        let records = vec![
            Value::list([
                Value::Null,
                Value::list([Value::Leaf(1), Value::Leaf(2)]),
                Value::List(vec![]),
            ]),
            Value::List(vec![]),
            Value::list([Value::list([Value::Leaf(3)]), Value::Null]),
        ];

        let column = encode(&records, &path).unwrap();
        assert_eq!(decode(&column, &path).unwrap(), records);
    }

    #[test]
    fn test_decode_corrupt_levels() {
        let mismatched = FlatColumn::new(vec![1], vec![3], vec![0, 1]);
        let too_deep = FlatColumn::new(vec![1, 2], vec![3, 3], vec![0, 2]);

        assert!(matches!(
            decode(&mismatched, &nullable_list()),
            Err(LevelError::CorruptLevels { .. })
        ));
        assert!(matches!(
            decode(&too_deep, &nullable_list()),
            Err(LevelError::CorruptLevels { .. })
        ));
    }

    #[test]
    fn test_decode_empty_column() {
        let column = FlatColumn::<i32>::default();

        assert_eq!(decode(&column, &nullable_list()).unwrap(), vec![]);
    }
}
