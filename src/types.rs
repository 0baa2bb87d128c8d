use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::conv;
use crate::error::{Result, TableError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The scalar types a sheet column can declare.
pub enum ScalarKind {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    /// Platform sized, parsed with 64-bit range.
    Int,
    /// Platform sized, parsed with 64-bit range.
    Uint,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    String,
}

impl ScalarKind {
    /// Resolves a type name from a sheet's type row. `float` is `float32`,
    /// `double` is `float64` and `enum` is stored as `int32`.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.trim() {
            "bool" => Self::Bool,
            "int8" => Self::Int8,
            "uint8" | "byte" => Self::Uint8,
            "int16" => Self::Int16,
            "uint16" => Self::Uint16,
            "int" => Self::Int,
            "uint" => Self::Uint,
            "int32" | "enum" => Self::Int32,
            "uint32" => Self::Uint32,
            "int64" => Self::Int64,
            "uint64" => Self::Uint64,
            "float" | "float32" => Self::Float32,
            "double" | "float64" => Self::Float64,
            "string" => Self::String,
            _ => return None,
        };
        Some(kind)
    }
    /// The canonical type name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
        }
    }
    #[inline]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Uint8
                | Self::Int16
                | Self::Uint16
                | Self::Int
                | Self::Uint
                | Self::Int32
                | Self::Uint32
                | Self::Int64
                | Self::Uint64
        )
    }
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
    /// Converts one cell, lenient like the [`conv`] parsers.
    pub fn parse(&self, text: &str) -> Value {
        let text = text.trim();
        match self {
            Self::Bool => Value::Bool(conv::parse_bool(text)),
            Self::Int8 => Value::Int(conv::parse_i8(text).into()),
            Self::Int16 => Value::Int(conv::parse_i16(text).into()),
            Self::Int32 => Value::Int(conv::parse_i32(text).into()),
            Self::Int => Value::Int(conv::parse_int(text) as i64),
            Self::Int64 => Value::Int(conv::parse_i64(text)),
            Self::Uint8 => Value::Uint(conv::parse_u8(text).into()),
            Self::Uint16 => Value::Uint(conv::parse_u16(text).into()),
            Self::Uint32 => Value::Uint(conv::parse_u32(text).into()),
            Self::Uint => Value::Uint(conv::parse_uint(text) as u64),
            Self::Uint64 => Value::Uint(conv::parse_u64(text)),
            Self::Float32 => Value::Float(conv::parse_f32(text).into()),
            Self::Float64 => Value::Float(conv::parse_f64(text)),
            Self::String => Value::Str(text.to_string()),
        }
    }
}

impl Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// A column type: a scalar, a delimited list of scalars, or a delimited
/// dictionary of scalars.
pub enum Kind {
    Scalar(ScalarKind),
    Array(ScalarKind),
    Map(ScalarKind, ScalarKind),
}

impl Kind {
    /// Parses `int32`, `int[]`, `array<int>`, `<string,int>` or `map<string,int>`.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        let unknown = || TableError::Type(name.to_string());
        let scalar = |s: &str| ScalarKind::from_name(s).ok_or_else(unknown);
        if let Some(elem) = name.strip_suffix("[]") {
            return Ok(Self::Array(scalar(elem)?));
        }
        if let Some(elem) = name.strip_prefix("array<").and_then(|s| s.strip_suffix('>')) {
            return Ok(Self::Array(scalar(elem)?));
        }
        let pair = name
            .strip_prefix("map<")
            .or_else(|| name.strip_prefix('<'))
            .and_then(|s| s.strip_suffix('>'));
        if let Some(pair) = pair {
            let parts = pair.split(',').collect::<Vec<_>>();
            if parts.len() != 2 {
                return Err(unknown());
            }
            return Ok(Self::Map(scalar(parts[0])?, scalar(parts[1])?));
        }
        Ok(Self::Scalar(scalar(name)?))
    }
    /// Converts one cell according to this kind.
    pub fn parse_value(&self, text: &str, delims: &Delimiters) -> Value {
        match self {
            Self::Scalar(kind) => kind.parse(text),
            Self::Array(elem) => {
                let items = split_items(text, &delims.array)
                    .map(|item| elem.parse(item))
                    .collect();
                Value::Array(items)
            }
            Self::Map(key, val) => {
                let mut entries: Vec<(Value, Value)> = vec![];
                for item in split_items(text, &delims.map_item) {
                    let pair = conv::split_by(item, &delims.map_pair).collect::<Vec<_>>();
                    if pair.len() != 2 {
                        tracing::warn!("parse_value: ignored map entry [{}] of {}", item, self);
                        continue;
                    }
                    let k = key.parse(pair[0]);
                    let v = val.parse(pair[1]);
                    match entries.iter_mut().find(|(old, _)| *old == k) {
                        Some(slot) => slot.1 = v,
                        None => entries.push((k, v)),
                    }
                }
                Value::Map(entries)
            }
        }
    }
}

fn split_items<'a>(text: &'a str, sep: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    conv::split_by(text, sep).map(str::trim).filter(|s| !s.is_empty())
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Array(elem) => write!(f, "{elem}[]"),
            Self::Map(key, val) => write!(f, "<{key},{val}>"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Separators for list and dictionary cells.
pub struct Delimiters {
    /// Between list items, `|` by default.
    pub array: String,
    /// Between dictionary entries, `|` by default.
    pub map_item: String,
    /// Between a dictionary key and its value, `=` by default.
    pub map_pair: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            array: "|".into(),
            map_item: "|".into(),
            map_pair: "=".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// A typed cell. Integers are widened to 64 bits after being range checked
/// at their declared width.
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    /// Entries keep sheet order; a repeated key replaces the earlier value.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// The JSON form. Dictionary keys are rendered as strings, and
    /// non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(n) => Json::from(*n),
            Self::Uint(n) => Json::from(*n),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::Str(s) => Json::String(s.clone()),
            Self::Array(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Map(entries) => {
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                Ok(())
            }
        }
    }
}
