//! Schema tree registration and root-to-leaf column path resolution.

use crate::error::{LevelError, Result};
use crate::field::{DataType, Field, PhysicalType, Repetition};
use crate::schema_path::{ColumnPath, PathNode};
use std::fmt;
use std::fmt::Formatter;
use std::slice::Iter;

/// The root of a schema tree. The root itself is always required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Resolves a dotted sequence of field names into a [`ColumnPath`].
    ///
    /// Returns an error if a name is not found or if the path ends at a
    /// group.
    pub fn column_path(&self, names: &[&str]) -> Result<ColumnPath> {
        let mut nodes = Vec::with_capacity(names.len());
        let mut current_fields = self.fields();
        let mut physical_type = None;

        for (depth, name) in names.iter().enumerate() {
            let field = current_fields
                .iter()
                .find(|f| f.name() == *name)
                .ok_or_else(|| LevelError::UnknownColumn {
                    path: names[..=depth].join("."),
                })?;

            nodes.push(PathNode::new(field.name(), field.repetition()));
            match field.data_type() {
                DataType::Group(children) => {
                    current_fields = children;
                    physical_type = None;
                }
                DataType::Primitive(leaf_type) => {
                    current_fields = &[];
                    physical_type = Some(*leaf_type);
                }
            }
        }

        match physical_type {
            Some(physical_type) => Ok(ColumnPath::new(nodes, physical_type)),
            None => Err(LevelError::LeafIsGroup {
                path: if names.is_empty() {
                    String::from("<root>")
                } else {
                    names.join(".")
                },
            }),
        }
    }

    /// Returns an iterator over the column path of every primitive leaf in
    /// depth-first order.
    pub fn column_paths(&self) -> ColumnPathIterator<'_> {
        ColumnPathIterator {
            stack: vec![FieldLevel {
                iter: self.fields.iter(),
                nodes: vec![],
            }],
        }
    }
}

#[derive(Debug)]
struct FieldLevel<'a> {
    iter: Iter<'a, Field>,
    nodes: Vec<PathNode>,
}

/// A depth-first iterator which yields a [`ColumnPath`] for each leaf.
#[derive(Debug)]
pub struct ColumnPathIterator<'a> {
    stack: Vec<FieldLevel<'a>>,
}

impl Iterator for ColumnPathIterator<'_> {
    type Item = ColumnPath;

    /**
    message Document {
        required int64 DocId;
        optional group Links {
            repeated int64 Backward;
            repeated int64 Forward;
        }
        repeated group Name { .. }
    }

    Stack Traversal:
    1. Push TopLevel Iterator; nodes = []
    2. Yield DocId
    3. Push Links Iterator; nodes = [Links]
    4. Yield Links.Backward, Links.Forward
    5. Pop Links Iterator
    6. Push Name Iterator; nodes = [Name]
    ..
    **/
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(level) = self.stack.last_mut() {
            if let Some(field) = level.iter.next() {
                let mut nodes = level.nodes.clone();
                nodes.push(PathNode::new(field.name(), field.repetition()));

                match field.data_type() {
                    DataType::Primitive(physical_type) => {
                        return Some(ColumnPath::new(nodes, *physical_type));
                    }
                    DataType::Group(children) => self.stack.push(FieldLevel {
                        iter: children.iter(),
                        nodes,
                    }),
                }
            } else {
                self.stack.pop();
            }
        }

        None
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "message {} {{", self.name)?;
        for field in &self.fields {
            if !field.data_type().is_group() {
                writeln!(f, "  {field};")?;
                continue;
            }
            for line in field.to_string().lines() {
                writeln!(f, "  {line}")?;
            }
        }
        write!(f, "}}")
    }
}

#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: vec![],
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Schema {
        Schema::new(self.name, self.fields)
    }
}

pub fn primitive(name: &str, physical_type: PhysicalType, repetition: Repetition) -> Field {
    Field::new(name, DataType::Primitive(physical_type), repetition)
}

pub fn bool(name: &str) -> Field {
    primitive(name, PhysicalType::Boolean, Repetition::Required)
}

pub fn int32(name: &str) -> Field {
    primitive(name, PhysicalType::Int32, Repetition::Required)
}

pub fn int64(name: &str) -> Field {
    primitive(name, PhysicalType::Int64, Repetition::Required)
}

pub fn string(name: &str) -> Field {
    primitive(name, PhysicalType::ByteArray, Repetition::Required)
}

pub fn optional_int32(name: &str) -> Field {
    primitive(name, PhysicalType::Int32, Repetition::Optional)
}

pub fn optional_int64(name: &str) -> Field {
    primitive(name, PhysicalType::Int64, Repetition::Optional)
}

pub fn optional_string(name: &str) -> Field {
    primitive(name, PhysicalType::ByteArray, Repetition::Optional)
}

pub fn repeated_int32(name: &str) -> Field {
    primitive(name, PhysicalType::Int32, Repetition::Repeated)
}

pub fn repeated_int64(name: &str) -> Field {
    primitive(name, PhysicalType::Int64, Repetition::Repeated)
}

pub fn repeated_string(name: &str) -> Field {
    primitive(name, PhysicalType::ByteArray, Repetition::Repeated)
}

pub fn required_group(name: &str, fields: Vec<Field>) -> Field {
    Field::new(name, DataType::Group(fields), Repetition::Required)
}

pub fn optional_group(name: &str, fields: Vec<Field>) -> Field {
    Field::new(name, DataType::Group(fields), Repetition::Optional)
}

pub fn repeated_group(name: &str, fields: Vec<Field>) -> Field {
    Field::new(name, DataType::Group(fields), Repetition::Repeated)
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;

    /// Creates the nested schema from the Dremel paper
    ///
    /// ```text
    /// message Document {
    ///   required int64 DocId;
    ///   optional group Links {
    ///     repeated int64 Backward;
    ///     repeated int64 Forward;
    ///   }
    ///   repeated group Name {
    ///     repeated group Language {
    ///       required string Code;
    ///       optional string Country;
    ///     }
    ///     optional string Url;
    ///   }
    /// }
    /// ```
    pub fn create_doc() -> Schema {
        SchemaBuilder::new("Document")
            .field(int64("DocId"))
            .field(optional_group(
                "Links",
                vec![repeated_int64("Backward"), repeated_int64("Forward")],
            ))
            .field(repeated_group(
                "Name",
                vec![
                    repeated_group("Language", vec![string("Code"), optional_string("Country")]),
                    optional_string("Url"),
                ],
            ))
            .build()
    }

    /// Creates the schema written by the low level reader/writer example:
    /// a single nullable int32 column nested inside a list.
    ///
    /// ```text
    /// message schema {
    ///   optional group a {
    ///     repeated group list {
    ///       optional int32 element;
    ///     }
    ///   }
    /// }
    /// ```
    pub fn create_nullable_list() -> Schema {
        SchemaBuilder::new("schema")
            .field(optional_group(
                "a",
                vec![repeated_group("list", vec![optional_int32("element")])],
            ))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::{create_doc, create_nullable_list};
    use super::*;

    #[test]
    fn test_empty_schema() {
        let empty = SchemaBuilder::new("empty").build();

        assert_eq!(empty.name(), "empty");
        assert!(empty.is_empty());
        assert_eq!(empty.column_paths().count(), 0);
    }

    #[test]
    fn test_flat_schema_paths() {
        let schema = SchemaBuilder::new("account")
            .field(int64("userid"))
            .field(bool("active"))
            .field(optional_string("email"))
            .build();

        let paths = schema.column_paths().collect::<Vec<_>>();
        assert_eq!(paths.len(), 3);

        assert_eq!(paths[0].to_string(), "userid");
        assert_eq!(paths[0].physical_type(), PhysicalType::Int64);
        assert_eq!(paths[1].to_string(), "active");
        assert_eq!(paths[1].physical_type(), PhysicalType::Boolean);
        assert_eq!(paths[2].to_string(), "email");
        assert_eq!(paths[2].max_definition_level(), 1);
    }

    #[test]
    fn test_column_path_lookup() {
        let doc = create_doc();
        let country = doc.column_path(&["Name", "Language", "Country"]).unwrap();

        assert_eq!(country.depth(), 3);
        assert_eq!(country.max_definition_level(), 3);
        assert_eq!(country.max_repetition_level(), 2);
        assert_eq!(country.physical_type(), PhysicalType::ByteArray);
    }

    #[test]
    fn test_column_path_unknown_field() {
        let doc = create_doc();

        assert_eq!(
            doc.column_path(&["Name", "Lang"]),
            Err(LevelError::UnknownColumn {
                path: String::from("Name.Lang")
            })
        );
        assert_eq!(
            doc.column_path(&["DocId", "x"]),
            Err(LevelError::UnknownColumn {
                path: String::from("DocId.x")
            })
        );
    }

    #[test]
    fn test_column_path_ends_at_group() {
        let doc = create_doc();

        assert_eq!(
            doc.column_path(&["Name", "Language"]),
            Err(LevelError::LeafIsGroup {
                path: String::from("Name.Language")
            })
        );
        assert!(matches!(
            doc.column_path(&[]),
            Err(LevelError::LeafIsGroup { .. })
        ));
    }

    #[test]
    fn test_nullable_list_levels() {
        let schema = create_nullable_list();
        let path = schema.column_path(&["a", "list", "element"]).unwrap();

        assert_eq!(path.max_definition_level(), 3);
        assert_eq!(path.max_repetition_level(), 1);
        assert_eq!(path.definition_level_of(1), Some(2));
    }

    #[test]
    fn test_display() {
        let schema = SchemaBuilder::new("m")
            .field(optional_group("a", vec![repeated_int32("b")]))
            .build();

        assert_eq!(
            schema.to_string(),
            "message m {\n  optional group a {\n    repeated int32 b;\n  }\n}"
        );
    }
}
