//! String to typed value conversion for sheet cells.
//!
//! The `parse_*` functions are lenient: an empty cell is zero, a malformed
//! cell is logged and read as zero, and an out-of-range value for a narrow
//! integer is logged and truncated. [`FromCell`] is the strict counterpart
//! that reports the same problems as [`TableError::Conv`].

use std::collections::HashMap;
use std::hash::Hash;
use std::num::{IntErrorKind, ParseIntError};

use crate::error::{Result, TableError};

/// Parses a boolean cell. Besides the usual `1/t/true` spellings this also
/// accepts `y`, `on` and `yes` as true.
pub fn parse_bool(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    match s {
        "y" | "Y" | "on" | "ON" | "yes" | "YES" => true,
        _ => strict_bool(s).unwrap_or(false),
    }
}

fn strict_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Overflowing input saturates to the bound it crossed, syntax errors read as zero.
fn saturate<T: Copy + Default>(err: &ParseIntError, min: T, max: T) -> T {
    match err.kind() {
        IntErrorKind::PosOverflow => max,
        IntErrorKind::NegOverflow => min,
        _ => T::default(),
    }
}

macro_rules! lenient_int {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $label:literal) => {
        $(#[$doc])*
        pub fn $name(s: &str) -> $ty {
            if s.is_empty() {
                return 0;
            }
            if <$ty>::MIN == 0 && s.starts_with('+') {
                tracing::warn!("{}: cannot parse [{}] to {}: sign on unsigned", stringify!($name), s, $label);
                return 0;
            }
            match s.parse::<$ty>() {
                Ok(n) => n,
                Err(err) => {
                    tracing::warn!("{}: cannot parse [{}] to {}: {}", stringify!($name), s, $label, err);
                    saturate(&err, <$ty>::MIN, <$ty>::MAX)
                }
            }
        }
    };
}

lenient_int!(
    /// Parses a base-10 `i32`; the empty string is zero.
    parse_i32, i32, "int32"
);
lenient_int!(parse_u32, u32, "uint32");
lenient_int!(parse_i64, i64, "int64");
lenient_int!(parse_u64, u64, "uint64");

/// Parses a platform `isize` with 64-bit range.
pub fn parse_int(s: &str) -> isize {
    parse_i64(s) as isize
}

/// Parses a platform `usize` with 64-bit range.
pub fn parse_uint(s: &str) -> usize {
    parse_u64(s) as usize
}

macro_rules! narrow_int {
    ($name:ident, $ty:ty, $wide:ident) => {
        pub fn $name(s: &str) -> $ty {
            let n = $wide(s);
            if <$ty>::try_from(n).is_err() {
                tracing::warn!("{}: value {} out of range", stringify!($name), s);
            }
            n as $ty
        }
    };
}

narrow_int!(parse_i8, i8, parse_i32);
narrow_int!(parse_u8, u8, parse_u32);
narrow_int!(parse_i16, i16, parse_i32);
narrow_int!(parse_u16, u16, parse_u32);

pub fn parse_f32(s: &str) -> f32 {
    if s.is_empty() {
        return 0.0;
    }
    s.parse().unwrap_or_else(|err| {
        tracing::warn!("parse_f32: cannot parse [{}] to float: {}", s, err);
        0.0
    })
}

pub fn parse_f64(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    s.parse().unwrap_or_else(|err| {
        tracing::warn!("parse_f64: cannot parse [{}] to double: {}", s, err);
        0.0
    })
}

/// Scalar types a cell can be converted to with [`conv_to`].
pub trait ConvTo: Sized + Default {
    /// Converts a non-empty cell.
    fn conv(s: &str) -> Self;
}

impl ConvTo for String {
    fn conv(s: &str) -> Self {
        s.to_string()
    }
}

impl ConvTo for bool {
    fn conv(s: &str) -> Self {
        parse_bool(s)
    }
}

macro_rules! conv_impl {
    ($($ty:ty => $func:ident),* $(,)?) => {
        $(impl ConvTo for $ty {
            #[inline]
            fn conv(s: &str) -> Self {
                $func(s)
            }
        })*
    };
}

conv_impl! {
    i8 => parse_i8, u8 => parse_u8,
    i16 => parse_i16, u16 => parse_u16,
    i32 => parse_i32, u32 => parse_u32,
    isize => parse_int, usize => parse_uint,
    i64 => parse_i64, u64 => parse_u64,
    f32 => parse_f32, f64 => parse_f64,
}

/// Generic cell conversion, e.g. `conv_to::<i32>("12")`.
#[inline]
pub fn conv_to<T: ConvTo>(s: &str) -> T {
    if s.is_empty() {
        return T::default();
    }
    T::conv(s)
}

/// Splits on `sep`. An empty separator splits after each character, so
/// `split_by("12", "")` yields `"1"`, `"2"`.
pub(crate) fn split_by<'a>(text: &'a str, sep: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    if sep.is_empty() {
        Box::new(text.char_indices().map(move |(i, c)| &text[i..i + c.len_utf8()]))
    } else {
        Box::new(text.split(sep))
    }
}

/// Parses a delimited list such as `1|2|3`. Blank items are skipped.
pub fn parse_slice<T: ConvTo>(text: &str, sep: &str) -> Vec<T> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    split_by(text, sep)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(conv_to::<T>)
        .collect()
}

/// Parses a delimited dictionary such as `a=1|b=2`. Items that are not
/// exactly one key and one value are ignored.
pub fn parse_map<K, V>(text: &str, sep1: &str, sep2: &str) -> HashMap<K, V>
where
    K: ConvTo + Eq + Hash,
    V: ConvTo,
{
    let mut ret = HashMap::new();
    if text.trim().is_empty() {
        return ret;
    }
    for part in split_by(text, sep1).map(str::trim) {
        if part.is_empty() {
            continue;
        }
        let pair = split_by(part, sep2).collect::<Vec<_>>();
        if pair.len() == 2 {
            ret.insert(conv_to(pair[0].trim()), conv_to(pair[1].trim()));
        }
    }
    ret
}

/// Strict cell conversion. Empty cells still read as the zero value.
pub trait FromCell: Sized {
    fn from_cell(s: &str) -> Result<Self>;
}

impl FromCell for String {
    fn from_cell(s: &str) -> Result<Self> {
        Ok(s.to_string())
    }
}

impl FromCell for bool {
    fn from_cell(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(false);
        }
        match s {
            "y" | "Y" | "on" | "ON" | "yes" | "YES" => Ok(true),
            _ => strict_bool(s).ok_or_else(|| TableError::conv(s, "bool", "invalid syntax")),
        }
    }
}

macro_rules! from_cell_impl {
    (unsigned: $($ty:ty => $label:literal),* $(,)?) => {
        $(impl FromCell for $ty {
            fn from_cell(s: &str) -> Result<Self> {
                if s.is_empty() {
                    return Ok(0);
                }
                if s.starts_with('+') {
                    return Err(TableError::conv(s, $label, "sign on unsigned"));
                }
                s.parse::<$ty>().map_err(|err| TableError::conv(s, $label, err))
            }
        })*
    };
    ($($ty:ty => $label:literal),* $(,)?) => {
        $(impl FromCell for $ty {
            fn from_cell(s: &str) -> Result<Self> {
                if s.is_empty() {
                    return Ok(<$ty>::default());
                }
                s.parse::<$ty>().map_err(|err| TableError::conv(s, $label, err))
            }
        })*
    };
}

from_cell_impl! {
    i8 => "int8", i16 => "int16", i32 => "int32",
    isize => "int", i64 => "int64",
    f32 => "float", f64 => "double",
}

from_cell_impl! {
    unsigned: u8 => "uint8", u16 => "uint16", u32 => "uint32",
    usize => "uint", u64 => "uint64",
}

/// Strict [`parse_slice`]: the first bad item fails the whole list.
pub fn try_parse_slice<T: FromCell>(text: &str, sep: &str) -> Result<Vec<T>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_by(text, sep)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(T::from_cell)
        .collect()
}

/// Strict [`parse_map`]: malformed items are errors instead of being skipped.
pub fn try_parse_map<K, V>(text: &str, sep1: &str, sep2: &str) -> Result<HashMap<K, V>>
where
    K: FromCell + Eq + Hash,
    V: FromCell,
{
    let mut ret = HashMap::new();
    if text.trim().is_empty() {
        return Ok(ret);
    }
    for part in split_by(text, sep1).map(str::trim) {
        if part.is_empty() {
            continue;
        }
        let pair = split_by(part, sep2).collect::<Vec<_>>();
        if pair.len() != 2 {
            return Err(TableError::conv(part, "map entry", format!("expected key{sep2}value")));
        }
        ret.insert(K::from_cell(pair[0].trim())?, V::from_cell(pair[1].trim())?);
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_spellings() {
        for s in ["y", "Y", "on", "ON", "yes", "YES", "1", "t", "TRUE", "True"] {
            assert!(parse_bool(s), "{s}");
        }
        for s in ["", "n", "no", "off", "0", "F", "false", "maybe"] {
            assert!(!parse_bool(s), "{s}");
        }
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(parse_i32(""), 0);
        assert_eq!(parse_u64(""), 0);
        assert_eq!(parse_f64(""), 0.0);
        assert_eq!(conv_to::<String>(""), "");
    }

    #[test]
    fn malformed_is_zero() {
        assert_eq!(parse_i32("12abc"), 0);
        assert_eq!(parse_u32("-1"), 0);
        assert_eq!(parse_f32("x"), 0.0);
    }

    #[test]
    fn unsigned_rejects_plus_sign() {
        assert_eq!(parse_u32("+5"), 0);
        assert_eq!(parse_u64("+5"), 0);
        assert_eq!(parse_u8("+5"), 0);
        assert_eq!(conv_to::<usize>("+5"), 0);
        assert_eq!(parse_i32("+5"), 5);
        assert!(u32::from_cell("+5").is_err());
        assert_eq!(i64::from_cell("+5").unwrap(), 5);
    }

    #[test]
    fn overflow_saturates() {
        assert_eq!(parse_i32("3000000000"), i32::MAX);
        assert_eq!(parse_i32("-3000000000"), i32::MIN);
        assert_eq!(parse_u32("5000000000"), u32::MAX);
    }

    #[test]
    fn narrow_widths_truncate() {
        assert_eq!(parse_i8("127"), 127);
        assert_eq!(parse_i8("300"), 300i32 as i8);
        assert_eq!(parse_u8("256"), 0);
        assert_eq!(parse_i16("-40000"), -40000i32 as i16);
        assert_eq!(parse_u16("65535"), u16::MAX);
    }

    #[test]
    fn conv_dispatch() {
        assert_eq!(conv_to::<i32>("42"), 42);
        assert_eq!(conv_to::<u8>("7"), 7);
        assert_eq!(conv_to::<i64>("-9000000000"), -9_000_000_000);
        assert_eq!(conv_to::<f64>("1.5"), 1.5);
        assert!(conv_to::<bool>("yes"));
        assert_eq!(conv_to::<String>("abc"), "abc");
    }

    #[test]
    fn slice_skips_blanks() {
        assert_eq!(parse_slice::<i32>("1| 2 ||3 ", "|"), vec![1, 2, 3]);
        assert!(parse_slice::<i32>("   ", "|").is_empty());
        assert_eq!(parse_slice::<String>("a,b", ","), vec!["a", "b"]);
        assert_eq!(parse_slice::<i32>("12", ""), vec![1, 2]);
    }

    #[test]
    fn map_pairs() {
        let m = parse_map::<String, i32>("gold=100| gem = 5 |bad|x=1=2", "|", "=");
        assert_eq!(m.len(), 2);
        assert_eq!(m["gold"], 100);
        assert_eq!(m["gem"], 5);
        assert!(parse_map::<i32, i32>("", "|", "=").is_empty());
        let chars = parse_map::<String, i32>("a1|b2", "|", "");
        assert_eq!(chars["b"], 2);
    }

    #[test]
    fn map_later_duplicate_wins() {
        let m = parse_map::<String, i32>("a=1|b=3|a=2", "|", "=");
        assert_eq!(m.len(), 2);
        assert_eq!(m["a"], 2);
        let strict = try_parse_map::<String, i32>("a=1|a=2", "|", "=").unwrap();
        assert_eq!(strict["a"], 2);
    }

    #[test]
    fn strict_reports_errors() {
        assert_eq!(i32::from_cell("").unwrap(), 0);
        assert_eq!(u8::from_cell("200").unwrap(), 200);
        assert!(u8::from_cell("300").is_err());
        assert!(bool::from_cell("maybe").is_err());
        assert!(bool::from_cell("on").unwrap());
        let err = i32::from_cell("abc").unwrap_err();
        assert!(matches!(err, TableError::Conv { target: "int32", .. }));
    }

    #[test]
    fn strict_collections() {
        assert_eq!(try_parse_slice::<u32>("1|2", "|").unwrap(), vec![1, 2]);
        assert!(try_parse_slice::<u32>("1|x", "|").is_err());
        let m = try_parse_map::<i32, String>("1=a|2=b", "|", "=").unwrap();
        assert_eq!(m[&2], "b");
        assert!(try_parse_map::<i32, i32>("1=2|3", "|", "=").is_err());
    }
}
