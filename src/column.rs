//! Column descriptor for result-set metadata.

/// Immutable metadata snapshot for one result column.
///
/// Copied out of the driver's field descriptors at the moment columns are
/// fetched; `original_name` and `original_table` carry the pre-alias names.
/// `flags` and `type_code` are the driver's raw bit set and type tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub original_name: String,
    pub table: String,
    pub original_table: String,
    pub database: String,
    pub length: u64,
    pub max_length: u64,
    pub flags: u32,
    pub decimals: u32,
    pub charset: u32,
    pub type_code: u32,
}

impl Column {
    /// Create a descriptor with the given name; everything else defaults.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
