//! Byte-to-text decoding for sheet exports.
//!
//! Spreadsheet tools commonly write a UTF-8 BOM, and older sheets may be saved
//! in a legacy code page such as GBK or Shift-JIS.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use crate::error::{Result, TableError};

/// Decodes `data`, honouring a leading BOM before falling back to `fallback`
/// (UTF-8 when `None`). The BOM is never part of the returned text.
pub fn decode_text<'a>(data: &'a [u8], fallback: Option<&'static Encoding>) -> Cow<'a, str> {
    let (encoding, body) = match Encoding::for_bom(data) {
        Some((enc, bom_len)) => (enc, &data[bom_len..]),
        None => (fallback.unwrap_or(UTF_8), data),
    };
    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        tracing::warn!("decode_text: malformed {} sequence replaced", encoding.name());
    }
    text
}

/// Looks up an encoding by its WHATWG label, e.g. `"gbk"` or `"shift_jis"`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| TableError::Other(format!("unknown encoding label `{label}`")))
}
