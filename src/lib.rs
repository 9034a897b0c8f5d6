//! A library which encodes nested values along a single column path into
//! definition levels, repetition levels and values, and decodes them back.
//! The definition and repetition levels preserve the structural hierarchy
//! of the encoded values, so the original records can be reconstructed from
//! the flat columns.
//!
//! Values may also be written spaced, into a fixed-stride buffer together
//! with a validity bitmap, and read back in bounded batches.
//!
//! # Design
//! The technique for column shredding is described in the paper:
//! [Dremel: Interactive Analysis of Web-Scale Datasets](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/36632.pdf).
//!
//! # Example
//! ```
//! use leveler::schema::{optional_group, optional_int32, repeated_group};
//! use leveler::{decode, encode, Result, SchemaBuilder, Value};
//!
//! # fn main() -> Result<()> {
//! let schema = SchemaBuilder::new("schema")
//!     .field(optional_group(
//!         "a",
//!         vec![repeated_group("list", vec![optional_int32("element")])],
//!     ))
//!     .build();
//! let path = schema.column_path(&["a", "list", "element"])?;
//!
//! let records = vec![Value::list([Some(1), None, Some(2), Some(3), Some(4)])];
//! let column = encode(&records, &path)?;
//!
//! assert_eq!(column.definition_levels(), &[3, 2, 3, 3, 3]);
//! assert_eq!(column.repetition_levels(), &[0, 1, 1, 1, 1]);
//! assert_eq!(column.values(), &[1, 2, 3, 4]);
//! assert_eq!(decode(&column, &path)?, records);
//! # Ok(())
//! # }
//! ```

#![warn(missing_debug_implementations)]

pub mod assembler;
pub mod bitmap;
pub mod common;
pub mod error;
pub mod field;
pub mod levels;
pub mod properties;
pub mod reader;
pub mod schema;
pub mod schema_path;
pub mod shredder;
pub mod value;
pub mod writer;

pub use self::assembler::{decode, decode_spaced};
pub use self::bitmap::ValidityBitmap;
pub use self::common::{DefinitionLevel, RepetitionLevel};
pub use self::error::{LevelError, Result};
pub use self::field::{DataType, Field, PhysicalType, Repetition};
pub use self::levels::{FlatColumn, SpacedColumn};
pub use self::properties::{Compression, Encoding, WriterProperties};
pub use self::reader::{decode_batch, BatchRead, ColumnReader};
pub use self::schema::{Schema, SchemaBuilder};
pub use self::schema_path::{ColumnPath, PathNode};
pub use self::shredder::{encode, encode_spaced};
pub use self::value::{ByteArray, ColumnValue, Value};
pub use self::writer::{ColumnChunk, ColumnChunkMetadata, ColumnWriter};
