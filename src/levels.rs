//! Flat column triples and the checks which keep their levels well-formed.

use crate::bitmap::ValidityBitmap;
use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::error::{LevelError, Result};
use crate::schema_path::ColumnPath;

/// Values, definition levels and repetition levels of one leaf column.
///
/// Every slot has one definition and one repetition level. Only slots at the
/// maximum definition level have an entry in `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatColumn<T> {
    values: Vec<T>,
    definition_levels: Vec<DefinitionLevel>,
    repetition_levels: Vec<RepetitionLevel>,
}

impl<T> Default for FlatColumn<T> {
    fn default() -> Self {
        Self {
            values: vec![],
            definition_levels: vec![],
            repetition_levels: vec![],
        }
    }
}

impl<T> FlatColumn<T> {
    /// Creates a triple without checking it against a column path. Use
    /// [`FlatColumn::validate`] before trusting the levels.
    pub fn new(
        values: Vec<T>,
        definition_levels: Vec<DefinitionLevel>,
        repetition_levels: Vec<RepetitionLevel>,
    ) -> Self {
        Self {
            values,
            definition_levels,
            repetition_levels,
        }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn definition_levels(&self) -> &[DefinitionLevel] {
        &self.definition_levels
    }

    pub fn repetition_levels(&self) -> &[RepetitionLevel] {
        &self.repetition_levels
    }

    /// Count of logical slot occurrences, present or not.
    pub fn num_slots(&self) -> usize {
        self.definition_levels.len()
    }

    /// Count of present values.
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// Count of records, which is the count of slots starting a new record.
    pub fn num_records(&self) -> usize {
        self.repetition_levels.iter().filter(|&&r| r == 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.definition_levels.is_empty()
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<DefinitionLevel>, Vec<RepetitionLevel>) {
        (self.values, self.definition_levels, self.repetition_levels)
    }

    /// Checks the triple against a column path.
    ///
    /// Fails with [`LevelError::CorruptLevels`] when the level arrays differ
    /// in length, a level exceeds its maximum, the first slot does not start
    /// a record, a repetition level opens an element under an undefined
    /// ancestor, or the values do not match the count of present slots.
    pub fn validate(&self, path: &ColumnPath) -> Result<()> {
        let present = check_levels(
            path,
            &self.definition_levels,
            &self.repetition_levels,
            None,
        )?;
        if present != self.values.len() {
            return Err(LevelError::corrupt(format!(
                "{} slots are at max definition level but found {} values",
                present,
                self.values.len()
            )));
        }
        Ok(())
    }

    pub(crate) fn push_slot(
        &mut self,
        definition_level: DefinitionLevel,
        repetition_level: RepetitionLevel,
        value: Option<T>,
    ) {
        self.definition_levels.push(definition_level);
        self.repetition_levels.push(repetition_level);
        if let Some(value) = value {
            self.values.push(value);
        }
    }

    pub(crate) fn extend(
        &mut self,
        values: impl IntoIterator<Item = T>,
        definition_levels: &[DefinitionLevel],
        repetition_levels: &[RepetitionLevel],
    ) {
        self.values.extend(values);
        self.definition_levels.extend_from_slice(definition_levels);
        self.repetition_levels.extend_from_slice(repetition_levels);
    }
}

/// A column written with a fixed-stride values buffer.
///
/// `values` holds `stride` entries. Slot `i` has a real value iff bit `i` of
/// `validity` is set, every other entry is filler which is never read.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacedColumn<T> {
    values: Vec<T>,
    validity: ValidityBitmap,
    definition_levels: Vec<DefinitionLevel>,
    repetition_levels: Vec<RepetitionLevel>,
}

impl<T> SpacedColumn<T> {
    pub fn new(
        values: Vec<T>,
        validity: ValidityBitmap,
        definition_levels: Vec<DefinitionLevel>,
        repetition_levels: Vec<RepetitionLevel>,
    ) -> Self {
        Self {
            values,
            validity,
            definition_levels,
            repetition_levels,
        }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn validity(&self) -> &ValidityBitmap {
        &self.validity
    }

    pub fn definition_levels(&self) -> &[DefinitionLevel] {
        &self.definition_levels
    }

    pub fn repetition_levels(&self) -> &[RepetitionLevel] {
        &self.repetition_levels
    }

    pub fn stride(&self) -> usize {
        self.values.len()
    }

    pub fn num_slots(&self) -> usize {
        self.definition_levels.len()
    }
}

impl<T: Clone> SpacedColumn<T> {
    /// Compacts the spaced values into a [`FlatColumn`], reading only the
    /// slots marked valid.
    ///
    /// The bitmap is authoritative: it must agree with the definition levels
    /// on which slots are present, otherwise this fails with
    /// [`LevelError::CorruptLevels`].
    pub fn to_flat(&self, path: &ColumnPath) -> Result<FlatColumn<T>> {
        let num_slots = self.num_slots();
        if self.values.len() < num_slots || self.validity.len() < num_slots {
            return Err(LevelError::CapacityMismatch {
                stride: self.values.len().min(self.validity.len()),
                slots: num_slots,
            });
        }

        let max_definition_level = path.max_definition_level();
        for (slot, &level) in self.definition_levels.iter().enumerate() {
            if self.validity.get(slot) != (level == max_definition_level) {
                return Err(LevelError::corrupt(format!(
                    "validity bit at slot {slot} disagrees with definition level {level}"
                )));
            }
        }

        let values = self
            .validity
            .put_spaced(&self.values[..num_slots], 0)
            .into_iter()
            .cloned()
            .collect();
        let column = FlatColumn::new(
            values,
            self.definition_levels.clone(),
            self.repetition_levels.clone(),
        );
        column.validate(path)?;
        Ok(column)
    }
}

/// Checks definition and repetition levels against a column path and returns
/// the count of slots at the maximum definition level.
///
/// `previous_definition_level` is the level of the slot just before the
/// batch. Without one the first slot must have a repetition level of zero. A
/// writer appending to a column which already holds levels passes its last
/// definition level, so a batch may continue the previous record but not
/// repeat a list that record left empty or absent.
pub(crate) fn check_levels(
    path: &ColumnPath,
    definition_levels: &[DefinitionLevel],
    repetition_levels: &[RepetitionLevel],
    previous_definition_level: Option<DefinitionLevel>,
) -> Result<usize> {
    if definition_levels.len() != repetition_levels.len() {
        return Err(LevelError::corrupt(format!(
            "found {} definition levels and {} repetition levels",
            definition_levels.len(),
            repetition_levels.len()
        )));
    }

    let max_definition_level = path.max_definition_level();
    let max_repetition_level = path.max_repetition_level();
    let mut present = 0;
    let mut previous = previous_definition_level;

    for (slot, (&d, &r)) in definition_levels
        .iter()
        .zip(repetition_levels.iter())
        .enumerate()
    {
        if d < 0 || d > max_definition_level {
            return Err(LevelError::corrupt(format!(
                "definition level {d} at slot {slot} is outside [0, {max_definition_level}]"
            )));
        }
        if r < 0 || r > max_repetition_level {
            return Err(LevelError::corrupt(format!(
                "repetition level {r} at slot {slot} is outside [0, {max_repetition_level}]"
            )));
        }
        if slot == 0 && previous.is_none() && r != 0 {
            return Err(LevelError::corrupt(format!(
                "first slot has repetition level {r}, expected 0"
            )));
        }
        if let Some(required) = path.definition_level_of(r) {
            if d < required {
                return Err(LevelError::corrupt(format!(
                    "slot {slot} repeats at level {r} but its definition level {d} \
                     is below the repeated node's level {required}"
                )));
            }
            // The list being repeated must already hold an element
            if previous.is_some_and(|p| p < required) {
                return Err(LevelError::corrupt(format!(
                    "slot {slot} repeats at level {r} after an empty or absent list"
                )));
            }
        }
        if d == max_definition_level {
            present += 1;
        }
        previous = Some(d);
    }

    Ok(present)
}
