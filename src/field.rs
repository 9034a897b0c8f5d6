//! Defines the building blocks for defining schemas: [`Field`], [`DataType`]
//! and [`Repetition`]

use std::fmt::{self, Formatter, Write};

/// How many times a schema node may occur inside its parent.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Repetition {
    /// Exactly one occurrence. Does not contribute a definition level.
    Required,
    /// Zero or one occurrence. Contributes one definition level.
    Optional,
    /// Zero or more occurrences. Contributes one definition level and one
    /// repetition level.
    Repeated,
}

impl Repetition {
    /// Returns `true` if the node can be absent, which is the case for both
    /// optional and repeated nodes.
    pub fn is_nullable(&self) -> bool {
        !matches!(self, Repetition::Required)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Repetition::Required => "required",
            Repetition::Optional => "optional",
            Repetition::Repeated => "repeated",
        }
    }
}

impl fmt::Display for Repetition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Physical storage type of a primitive leaf.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Float,
    Double,
    /// Variable length bytes, also used for UTF-8 strings.
    ByteArray,
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhysicalType::Boolean => "boolean",
            PhysicalType::Int32 => "int32",
            PhysicalType::Int64 => "int64",
            PhysicalType::Float => "float",
            PhysicalType::Double => "double",
            PhysicalType::ByteArray => "binary",
        };
        write!(f, "{label}")
    }
}

/// Either a primitive leaf or a group of named child fields.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DataType {
    Primitive(PhysicalType),
    /// A nested structure (group/record) containing named fields.
    Group(Vec<Field>),
}

impl DataType {
    /// Checks if data type is a [`DataType::Group`]
    pub fn is_group(&self) -> bool {
        matches!(self, DataType::Group(_))
    }
}

/// Represents a named schema node, its data type and how often it may occur
/// in its parent.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Field {
    name: String,
    data_type: DataType,
    repetition: Repetition,
}

impl Field {
    /// Creates a field definition.
    ///
    /// # Parameters
    /// * `name` - Name of the field.
    /// * `data_type` - The [`DataType`] of the field.
    /// * `repetition` - The [`Repetition`] kind of the field.
    pub fn new(name: impl Into<String>, data_type: DataType, repetition: Repetition) -> Self {
        Field {
            name: name.into(),
            data_type,
            repetition,
        }
    }

    /// Returns the name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a reference to the [`DataType`] of the field.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn repetition(&self) -> Repetition {
        self.repetition
    }

    /// Checks if a field is either optional or repeated.
    pub fn is_optional(&self) -> bool {
        self.repetition.is_nullable()
    }

    /// Checks if a field is repeated
    pub fn is_repeated(&self) -> bool {
        self.repetition == Repetition::Repeated
    }

    /// Returns the child fields of a group, or an empty slice for a leaf.
    pub fn children(&self) -> &[Field] {
        match &self.data_type {
            DataType::Group(fields) => fields,
            DataType::Primitive(_) => &[],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.data_type {
            DataType::Primitive(physical_type) => {
                write!(f, "{} {} {}", self.repetition, physical_type, self.name)
            }
            DataType::Group(fields) => {
                writeln!(f, "{} group {} {{", self.repetition, self.name)?;
                let mut buf = String::new();
                for field in fields.iter() {
                    if field.data_type.is_group() {
                        writeln!(buf, "{field}")?;
                    } else {
                        writeln!(buf, "{field};")?;
                    }
                }
                for line in buf.lines() {
                    writeln!(f, "  {line}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Primitive(physical_type) => write!(f, "{physical_type}"),
            DataType::Group(_) => write!(f, "group"),
        }
    }
}
