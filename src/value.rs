//! Defines the logical representation of a nested value along one column path.

use crate::field::PhysicalType;
use std::fmt;
use std::fmt::{Debug, Formatter};

/// A primitive value which can be stored in a leaf column.
pub trait ColumnValue: Clone + PartialEq + Debug {
    /// The leaf type this value is stored as.
    const PHYSICAL_TYPE: PhysicalType;
}

impl ColumnValue for bool {
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Boolean;
}

impl ColumnValue for i32 {
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Int32;
}

impl ColumnValue for i64 {
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Int64;
}

impl ColumnValue for f32 {
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Float;
}

impl ColumnValue for f64 {
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Double;
}

/// Variable length bytes stored in a [`PhysicalType::ByteArray`] leaf.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ByteArray(Vec<u8>);

impl ByteArray {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the bytes as a string slice if they are valid UTF-8.
    pub fn as_utf8(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl ColumnValue for ByteArray {
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::ByteArray;
}

impl From<&str> for ByteArray {
    fn from(value: &str) -> Self {
        ByteArray(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(value: Vec<u8>) -> Self {
        ByteArray(value)
    }
}

impl fmt::Display for ByteArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.as_utf8() {
            Some(s) => write!(f, "{s:?}"),
            None => write!(f, "{:?}", self.0),
        }
    }
}

/// One logical record, or a part of it, for a single column path.
///
/// Only optional and repeated nodes on the path have a representation. A
/// present required or optional node adds no wrapper, so a record for the
/// path `optional a / repeated b / optional c` is a [`Value::List`] whose
/// elements are either [`Value::Leaf`] or [`Value::Null`].
#[derive(Debug, PartialEq, Clone)]
pub enum Value<T> {
    /// An absent optional node.
    Null,
    /// The elements of a repeated node. An empty list means the repeated
    /// node has no elements.
    List(Vec<Value<T>>),
    /// A present primitive leaf.
    Leaf(T),
}

impl<T> Value<T> {
    /// Creates a present leaf value
    pub fn leaf(value: impl Into<T>) -> Self {
        Value::Leaf(value.into())
    }

    /// Creates a list from elements which are either nested values or
    /// `Option<T>` leaves.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value<T>>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Checks if this is an absent optional node.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the variant name, used in error messages.
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::List(_) => "list",
            Value::Leaf(_) => "leaf",
        }
    }

    /// Returns the leaf values in depth-first order.
    pub fn leaves(&self) -> Vec<&T> {
        let mut out = vec![];
        let mut stack = vec![self];
        while let Some(value) = stack.pop() {
            match value {
                Value::Null => {}
                Value::Leaf(v) => out.push(v),
                Value::List(items) => stack.extend(items.iter().rev()),
            }
        }
        out
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Value::Leaf(v),
            None => Value::Null,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Value<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Leaf(v) => write!(f, "{v}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
