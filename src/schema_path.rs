//! Representation of a single root-to-leaf column path.
//!
//! Only one path matters for a column, so the schema tree is flattened into an
//! ordered list of nodes. The maximum definition and repetition levels are
//! derived from the repetition kinds along the path.

use crate::common::{DefinitionLevel, RepetitionLevel};
use crate::error::{LevelError, Result};
use crate::field::{PhysicalType, Repetition};
use crate::value::ColumnValue;
use std::fmt::{Display, Formatter};

/// A named node on a column path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    name: String,
    repetition: Repetition,
}

impl PathNode {
    pub fn new(name: impl Into<String>, repetition: Repetition) -> Self {
        Self {
            name: name.into(),
            repetition,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repetition(&self) -> Repetition {
        self.repetition
    }
}

/// The path from the root of a schema to one primitive leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath {
    nodes: Vec<PathNode>,
    physical_type: PhysicalType,
    /// Indices into `nodes` of every optional or repeated node. The position
    /// in this list plus one is the definition level at which the node is
    /// present.
    nullable_nodes: Vec<usize>,
    /// Definition level of the r-th repeated node, stored at index r - 1.
    repeated_definition_levels: Vec<DefinitionLevel>,
}

impl ColumnPath {
    pub fn new(nodes: Vec<PathNode>, physical_type: PhysicalType) -> Self {
        let nullable_nodes = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.repetition.is_nullable())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        let repeated_definition_levels = nullable_nodes
            .iter()
            .enumerate()
            .filter(|(_, index)| nodes[**index].repetition == Repetition::Repeated)
            .map(|(position, _)| (position + 1) as DefinitionLevel)
            .collect();

        Self {
            nodes,
            physical_type,
            nullable_nodes,
            repeated_definition_levels,
        }
    }

    /// Creates a column path from `(name, repetition)` pairs ordered from the
    /// root to the leaf.
    pub fn with_nodes<I, S>(nodes: I, physical_type: PhysicalType) -> Self
    where
        I: IntoIterator<Item = (S, Repetition)>,
        S: Into<String>,
    {
        Self::new(
            nodes
                .into_iter()
                .map(|(name, repetition)| PathNode::new(name, repetition))
                .collect(),
            physical_type,
        )
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    /// Returns the count of nodes(depth) in the path
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.physical_type
    }

    pub fn max_definition_level(&self) -> DefinitionLevel {
        self.nullable_nodes.len() as DefinitionLevel
    }

    pub fn max_repetition_level(&self) -> RepetitionLevel {
        self.repeated_definition_levels.len() as RepetitionLevel
    }

    /// Returns the definition level at which the repeated node at repetition
    /// depth `repetition_level` holds an element.
    ///
    /// Returns `None` for a repetition level of zero or one deeper than the
    /// path allows.
    pub fn definition_level_of(
        &self,
        repetition_level: RepetitionLevel,
    ) -> Option<DefinitionLevel> {
        if repetition_level < 1 {
            return None;
        }
        self.repeated_definition_levels
            .get(repetition_level as usize - 1)
            .copied()
    }

    /// Repetition kinds of the optional and repeated nodes, in path order.
    pub(crate) fn nullable_kinds(&self) -> impl Iterator<Item = Repetition> + '_ {
        self.nullable_nodes
            .iter()
            .map(|&index| self.nodes[index].repetition)
    }

    /// Dotted name of the path up to and including the nullable node which
    /// is entered at `definition_level`. Past the last nullable node this is
    /// the full path.
    pub(crate) fn name_at_level(&self, definition_level: usize) -> String {
        let len = self
            .nullable_nodes
            .get(definition_level)
            .map_or(self.nodes.len(), |&index| index + 1);
        self.prefix(len)
    }

    /// Dotted name of the first `len` nodes
    pub(crate) fn prefix(&self, len: usize) -> String {
        if len == 0 {
            return String::from("<root>");
        }
        self.nodes
            .iter()
            .take(len)
            .map(PathNode::name)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Checks that values of type `T` can be stored at this path's leaf.
    pub fn check_type<T: ColumnValue>(&self) -> Result<()> {
        if T::PHYSICAL_TYPE == self.physical_type {
            Ok(())
        } else {
            Err(LevelError::schema_violation(
                self,
                format!(
                    "leaf type is {} but values are {}",
                    self.physical_type,
                    T::PHYSICAL_TYPE
                ),
            ))
        }
    }
}

impl Display for ColumnPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix(self.nodes.len()))
    }
}
