//! Configuration for writing a column chunk.
//!
//! The codec never compresses or encodes pages itself. The chosen options are
//! recorded on the [`crate::writer::ColumnChunk`] for the storage layer.

use std::fmt;

/// Compression codec requested for the column chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Compression {
    #[default]
    Uncompressed,
    Snappy,
    Gzip,
    Lz4,
    Zstd,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Compression::Uncompressed => "UNCOMPRESSED",
            Compression::Snappy => "SNAPPY",
            Compression::Gzip => "GZIP",
            Compression::Lz4 => "LZ4",
            Compression::Zstd => "ZSTD",
        };
        write!(f, "{label}")
    }
}

/// Value encoding requested for the column chunk. Levels are always run
/// length encoded by the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Encoding {
    #[default]
    Plain,
    RleDictionary,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Encoding::Plain => "PLAIN",
            Encoding::RleDictionary => "RLE_DICTIONARY",
        };
        write!(f, "{label}")
    }
}

const DEFAULT_WRITE_BATCH_SIZE: usize = 1024;
const DEFAULT_CREATED_BY: &str = concat!("leveler version ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterProperties {
    compression: Compression,
    encoding: Encoding,
    write_batch_size: usize,
    created_by: String,
}

impl Default for WriterProperties {
    fn default() -> Self {
        WriterPropertiesBuilder::default().build()
    }
}

impl WriterProperties {
    pub fn builder() -> WriterPropertiesBuilder {
        WriterPropertiesBuilder::default()
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Maximum count of records the writer stripes in one step.
    pub fn write_batch_size(&self) -> usize {
        self.write_batch_size
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }
}

/// Builder for [`WriterProperties`]
#[derive(Debug, Clone)]
pub struct WriterPropertiesBuilder {
    compression: Compression,
    encoding: Encoding,
    write_batch_size: usize,
    created_by: String,
}

impl Default for WriterPropertiesBuilder {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            encoding: Encoding::default(),
            write_batch_size: DEFAULT_WRITE_BATCH_SIZE,
            created_by: DEFAULT_CREATED_BY.to_string(),
        }
    }
}

impl WriterPropertiesBuilder {
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the write batch size. A size of zero is treated as one.
    pub fn write_batch_size(mut self, size: usize) -> Self {
        self.write_batch_size = size.max(1);
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    pub fn build(self) -> WriterProperties {
        WriterProperties {
            compression: self.compression,
            encoding: self.encoding,
            write_batch_size: self.write_batch_size,
            created_by: self.created_by,
        }
    }
}
