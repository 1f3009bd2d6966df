//! Row - the table's fixed-schema record and its on-disk encoding.
//!
//! # Layout (293 bytes)
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     id (u32, little-endian)
//! 4       33    username (NUL-padded)
//! 37      256   email (NUL-padded)
//! ```
//!
//! Each text field has one byte more than the column width so a value of
//! maximum length is still followed by a NUL.

use std::fmt;

use crate::common::config::{COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE};
use crate::error::{Error, Result};

/// Size of the `id` field.
pub const ID_SIZE: usize = std::mem::size_of::<u32>();
/// Size of the stored `username` field.
pub const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE + 1;
/// Size of the stored `email` field.
pub const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE + 1;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Size of a serialized row in bytes.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A single table row: `(id, username, email)`.
///
/// `id` is the primary key. Text columns are bounded by
/// [`COLUMN_USERNAME_SIZE`] and [`COLUMN_EMAIL_SIZE`] bytes.
///
/// # Example
/// ```
/// use rowstore::Row;
///
/// let row = Row::new(1, "user1", "person1@example.com").unwrap();
/// let bytes = row.to_bytes();
/// assert_eq!(Row::from_bytes(&bytes).unwrap(), row);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    username: String,
    email: String,
}

impl Row {
    /// Create a row, checking both text columns against their widths.
    ///
    /// # Errors
    /// Returns `Error::StringTooLong` if a column value is too long.
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let email = email.into();

        if username.len() > COLUMN_USERNAME_SIZE {
            return Err(Error::StringTooLong {
                field: "username",
                max: COLUMN_USERNAME_SIZE,
            });
        }
        if email.len() > COLUMN_EMAIL_SIZE {
            return Err(Error::StringTooLong {
                field: "email",
                max: COLUMN_EMAIL_SIZE,
            });
        }

        Ok(Self { id, username, email })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Serialize into the fixed-width layout.
    pub fn to_bytes(&self) -> [u8; ROW_SIZE] {
        let mut buf = [0u8; ROW_SIZE];
        self.write_to(&mut buf);
        buf
    }

    /// Serialize into the first [`ROW_SIZE`] bytes of `buf`.
    ///
    /// # Panics
    /// Panics if `buf.len() < ROW_SIZE`.
    pub fn write_to(&self, buf: &mut [u8]) {
        assert!(buf.len() >= ROW_SIZE, "buffer too small for Row");

        buf[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        write_padded(
            &mut buf[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE],
            self.username.as_bytes(),
        );
        write_padded(
            &mut buf[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE],
            self.email.as_bytes(),
        );
    }

    /// Deserialize from the first [`ROW_SIZE`] bytes of `buf`.
    ///
    /// # Errors
    /// Returns `Error::Corrupt` if `buf` is too short or a text field is not
    /// valid UTF-8.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < ROW_SIZE {
            return Err(Error::Corrupt(format!(
                "row needs {} bytes, got {}",
                ROW_SIZE,
                buf.len()
            )));
        }

        let mut id_bytes = [0u8; ID_SIZE];
        id_bytes.copy_from_slice(&buf[ID_OFFSET..ID_OFFSET + ID_SIZE]);

        Ok(Self {
            id: u32::from_le_bytes(id_bytes),
            username: read_padded(&buf[USERNAME_OFFSET..USERNAME_OFFSET + COLUMN_USERNAME_SIZE])?,
            email: read_padded(&buf[EMAIL_OFFSET..EMAIL_OFFSET + COLUMN_EMAIL_SIZE])?,
        })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn write_padded(field: &mut [u8], value: &[u8]) {
    field.fill(0);
    field[..value.len()].copy_from_slice(value);
}

fn read_padded(field: &[u8]) -> Result<String> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8(field[..end].to_vec())
        .map_err(|e| Error::Corrupt(format!("row text is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(ROW_SIZE, 293);
        assert_eq!(USERNAME_OFFSET, 4);
        assert_eq!(EMAIL_OFFSET, 37);
    }

    #[test]
    fn test_roundtrip_lengths() {
        for (ulen, elen) in [(0, 0), (1, 1), (COLUMN_USERNAME_SIZE, COLUMN_EMAIL_SIZE)] {
            let row = Row::new(u32::MAX, "u".repeat(ulen), "e".repeat(elen)).unwrap();
            let recovered = Row::from_bytes(&row.to_bytes()).unwrap();
            assert_eq!(recovered, row);
        }
    }

    #[test]
    fn test_byte_layout() {
        let row = Row::new(0x04030201, "ab", "c").unwrap();
        let bytes = row.to_bytes();

        assert_eq!(&bytes[..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[4..7], b"ab\0");
        assert_eq!(bytes[EMAIL_OFFSET], b'c');
        assert!(bytes[EMAIL_OFFSET + 1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_clears_previous_contents() {
        let mut buf = Row::new(1, "long-username", "long@example.com")
            .unwrap()
            .to_bytes();
        Row::new(2, "x", "y").unwrap().write_to(&mut buf);

        let row = Row::from_bytes(&buf).unwrap();
        assert_eq!(row.username(), "x");
        assert_eq!(row.email(), "y");
    }

    #[test]
    fn test_rejects_long_strings() {
        let err = Row::new(1, "a".repeat(COLUMN_USERNAME_SIZE + 1), "e").unwrap_err();
        assert!(matches!(err, Error::StringTooLong { field: "username", .. }));

        let err = Row::new(1, "u", "a".repeat(COLUMN_EMAIL_SIZE + 1)).unwrap_err();
        assert!(matches!(err, Error::StringTooLong { field: "email", .. }));
    }

    #[test]
    fn test_from_short_buffer() {
        assert!(matches!(Row::from_bytes(&[0u8; 10]), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_display() {
        let row = Row::new(1, "user1", "person1@example.com").unwrap();
        assert_eq!(row.to_string(), "(1, user1, person1@example.com)");
    }
}
