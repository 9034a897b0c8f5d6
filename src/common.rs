//! Level types shared by the codec, the column writer and the column reader.

/// Count of optional or repeated nodes present along a column path.
pub type DefinitionLevel = i16;

/// Depth of the repeated node which started a new element. Zero starts a
/// new record.
pub type RepetitionLevel = i16;
