use std::string::{FromUtf8Error, FromUtf16Error};
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum TextError {
    #[error("UTF-16 data needs to contain an even amount of bytes")]
    UnevenByteCount,
    #[error(transparent)]
    InvalidUtf8(FromUtf8Error),
    #[error(transparent)]
    InvalidUtf16(FromUtf16Error),
}

const UTF_8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes resource content as text.
///
/// UTF-16 is only recognized when a byte order mark is present.
/// A UTF-8 byte order mark is dropped.
pub(crate) fn decode(mut data: Vec<u8>) -> Result<String, TextError> {
    if is_utf16(&data) {
        return from_utf16(&data);
    }
    if data.starts_with(UTF_8_BOM) {
        data.drain(..UTF_8_BOM.len());
    }
    String::from_utf8(data).map_err(TextError::InvalidUtf8)
}

fn is_utf16(data: &[u8]) -> bool {
    data.starts_with(b"\xFF\xFE") || data.starts_with(b"\xFE\xFF")
}

fn from_utf16(data: &[u8]) -> Result<String, TextError> {
    let endian = if data.starts_with(b"\xFF") {
        u16::from_le_bytes
    } else {
        u16::from_be_bytes
    };

    let units = data[2..]
        .chunks(2)
        .map(|chunk| chunk.try_into().map(endian))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| TextError::UnevenByteCount)?;

    String::from_utf16(&units).map_err(TextError::InvalidUtf16)
}
