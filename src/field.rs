//! Read-only view into one cell of a row, with typed extraction.

use crate::column::Column;
use crate::error::{Error, Result};
use crate::row::Row;

/// A non-owning view into one field of the current row.
///
/// Valid only as long as the row it came from; advancing or dropping the
/// owning result invalidates the row and with it every field view.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    row: &'a Row,
    index: usize,
    data: Option<&'a [u8]>,
}

impl<'a> Field<'a> {
    pub(crate) fn new(row: &'a Row, index: usize, data: Option<&'a [u8]>) -> Self {
        Self { row, index, data }
    }

    /// Zero-based column index of this field.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Descriptor of the column this field belongs to. The index is
    /// bounds-checked at field construction, so the slot always exists.
    pub fn column(&self) -> &'a Column {
        &self.row.columns()[self.index]
    }

    /// Whether the field is SQL NULL.
    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    /// Whether the field is NULL or has zero length.
    pub fn is_empty(&self) -> bool {
        self.data.map_or(true, |d| d.is_empty())
    }

    /// `true` iff the field is neither NULL nor empty.
    pub fn as_bool(&self) -> bool {
        !self.is_empty()
    }

    /// Raw bytes of the field; `None` for SQL NULL.
    pub fn data(&self) -> Option<&'a [u8]> {
        self.data
    }

    /// Byte length of the field (0 for NULL).
    pub fn size(&self) -> usize {
        self.data.map_or(0, <[u8]>::len)
    }

    /// Parse the field's byte range into `T`.
    ///
    /// Malformed numeric text, invalid UTF-8, and NULL into a non-`Option`
    /// target all fail with [`Error::Conversion`]; use `Option<T>` as the
    /// target to map NULL to `None`.
    pub fn get<T: FromField>(&self) -> Result<T> {
        T::from_field(self)
    }

    fn bytes(&self, target: &'static str) -> Result<&'a [u8]> {
        self.data
            .ok_or_else(|| Error::conversion(target, "field is null"))
    }

    fn text(&self, target: &'static str) -> Result<&'a str> {
        std::str::from_utf8(self.bytes(target)?)
            .map_err(|e| Error::conversion(target, e.to_string()))
    }
}

/// Conversion from a raw field into a concrete Rust type.
///
/// One explicit conversion per supported target type; every impl rejects
/// malformed input instead of guessing.
pub trait FromField: Sized {
    fn from_field(field: &Field<'_>) -> Result<Self>;
}

impl FromField for String {
    fn from_field(field: &Field<'_>) -> Result<Self> {
        field.text("String").map(str::to_owned)
    }
}

impl FromField for Vec<u8> {
    fn from_field(field: &Field<'_>) -> Result<Self> {
        field.bytes("Vec<u8>").map(<[u8]>::to_vec)
    }
}

impl<T: FromField> FromField for Option<T> {
    fn from_field(field: &Field<'_>) -> Result<Self> {
        if field.is_null() {
            Ok(None)
        } else {
            T::from_field(field).map(Some)
        }
    }
}

macro_rules! from_field_via_parse {
    ($($t:ty),* $(,)?) => {$(
        impl FromField for $t {
            fn from_field(field: &Field<'_>) -> Result<Self> {
                field
                    .text(stringify!($t))?
                    .parse()
                    .map_err(|e| Error::conversion(stringify!($t), format!("{e}")))
            }
        }
    )*};
}

from_field_via_parse!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::tests::test_row;

    #[test]
    fn test_null_field() {
        let row = test_row(vec![None]);
        let field = row.at(0).unwrap();
        assert!(field.is_null());
        assert!(field.is_empty());
        assert!(!field.as_bool());
        assert_eq!(field.data(), None);
        assert_eq!(field.size(), 0);
    }

    #[test]
    fn test_empty_field() {
        let row = test_row(vec![Some(Vec::new())]);
        let field = row.at(0).unwrap();
        assert!(!field.is_null());
        assert!(field.is_empty());
        assert!(!field.as_bool());
        assert_eq!(field.size(), 0);
    }

    #[test]
    fn test_populated_field() {
        let row = test_row(vec![Some(b"abc".to_vec())]);
        let field = row.at(0).unwrap();
        assert!(!field.is_null());
        assert!(!field.is_empty());
        assert!(field.as_bool());
        assert_eq!(field.data(), Some(&b"abc"[..]));
        assert_eq!(field.size(), 3);
        assert_eq!(field.column().name, "c0");
    }

    #[test]
    fn test_get_numeric() {
        let row = test_row(vec![Some(b"42".to_vec()), Some(b"-1.5".to_vec())]);
        assert_eq!(row.at(0).unwrap().get::<i64>().unwrap(), 42);
        assert_eq!(row.at(0).unwrap().get::<u32>().unwrap(), 42);
        assert_eq!(row.at(1).unwrap().get::<f64>().unwrap(), -1.5);
    }

    #[test]
    fn test_get_string_and_bytes() {
        let row = test_row(vec![Some(b"hello".to_vec())]);
        assert_eq!(row.at(0).unwrap().get::<String>().unwrap(), "hello");
        assert_eq!(row.at(0).unwrap().get::<Vec<u8>>().unwrap(), b"hello");
    }

    #[test]
    fn test_get_malformed_numeric_rejected() {
        let row = test_row(vec![Some(b"12abc".to_vec())]);
        let err = row.at(0).unwrap().get::<i32>().unwrap_err();
        assert!(matches!(err, Error::Conversion { target: "i32", .. }));
    }

    #[test]
    fn test_get_null_into_non_option_rejected() {
        let row = test_row(vec![None]);
        let err = row.at(0).unwrap().get::<String>().unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn test_get_option_maps_null() {
        let row = test_row(vec![None, Some(b"7".to_vec())]);
        assert_eq!(row.at(0).unwrap().get::<Option<i32>>().unwrap(), None);
        assert_eq!(row.at(1).unwrap().get::<Option<i32>>().unwrap(), Some(7));
    }

    #[test]
    fn test_get_invalid_utf8_rejected() {
        let row = test_row(vec![Some(vec![0xff, 0xfe])]);
        let err = row.at(0).unwrap().get::<String>().unwrap_err();
        assert!(matches!(err, Error::Conversion { target: "String", .. }));
        // raw bytes still come through untouched
        assert_eq!(row.at(0).unwrap().get::<Vec<u8>>().unwrap(), vec![0xff, 0xfe]);
    }
}
