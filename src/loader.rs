//! Data sources that hand out raw config payloads by key, and the glue that
//! turns those payloads into typed rows.
//!
//! A payload is either a JSON document (array for row tables, object for
//! `Key`/`Value` tables) or a CSV sheet. The payload is decoded first (BOM,
//! else the configured fallback encoding), then its first non-whitespace
//! character decides.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;

use crate::csv_parse::{read_csv_str, ReadOptions};
use crate::encoding::decode_text;
use crate::error::{Result, TableError};
use crate::schema::{parse_table_rows, ParseKv, ParseRow};

/// Something that can fetch a config payload by its key.
pub trait DataSource {
    fn load_data_by_key(&self, key: &str) -> Result<Vec<u8>>;

    /// Runs every loader against this source in order, stopping at the
    /// first failure.
    fn load_all(&self, loaders: &mut [&mut dyn ConfigLoader]) -> Result<()>
    where
        Self: Sized,
    {
        for loader in loaders.iter_mut() {
            loader.load_config_data(self)?;
        }
        Ok(())
    }
}

/// A config holder that knows which key to fetch and how to parse it.
pub trait ConfigLoader {
    fn load_config_data(&mut self, source: &dyn DataSource) -> Result<()>;
}

/// Reads `<dir>/<key><suffix>` for the first suffix that exists.
#[derive(Clone, Debug)]
pub struct FileLoader {
    path: PathBuf,
    suffixes: Vec<String>,
}

impl FileLoader {
    pub const DEFAULT_SUFFIXES: [&'static str; 2] = ["_config.json", ".csv"];

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            suffixes: Self::DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn find_file(&self, key: &str) -> Option<PathBuf> {
        self.suffixes
            .iter()
            .map(|suffix| self.path.join(format!("{key}{suffix}")))
            .find(|candidate| candidate.is_file())
    }
}

impl DataSource for FileLoader {
    fn load_data_by_key(&self, key: &str) -> Result<Vec<u8>> {
        let filename = self
            .find_file(key)
            .ok_or_else(|| TableError::NotFound(format!("{key} in {}", self.path.display())))?;
        tracing::info!("start load file {}", filename.display());
        Ok(std::fs::read(&filename)?)
    }
}

/// Reads payloads from a `config(name, type, text)` table. A `type` of the
/// form `<format>-deflate` marks `text` as base64 of zlib-compressed bytes.
pub struct SqlLoader {
    conn: Connection,
}

impl SqlLoader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn create_config_table(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS `config` (
                `name` TEXT PRIMARY KEY,
                `type` TEXT NOT NULL,
                `text` TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Writes (or replaces) one payload, compressing it when `typ` asks for deflate.
    pub fn store(&self, name: &str, typ: &str, data: &[u8]) -> Result<()> {
        let text = if is_deflate(typ) {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            BASE64.encode(encoder.finish()?)
        } else {
            String::from_utf8(data.to_vec())
                .map_err(|_| TableError::Other(format!("{name}: payload is not UTF-8")))?
        };
        self.conn.execute(
            "INSERT OR REPLACE INTO `config`(`name`, `type`, `text`) VALUES(?1, ?2, ?3)",
            params![name, typ, text],
        )?;
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}

fn is_deflate(typ: &str) -> bool {
    typ.split('-').nth(1) == Some("deflate")
}

fn inflate(text: &str) -> Result<Vec<u8>> {
    let data = BASE64.decode(text.trim())?;
    let mut out = vec![];
    ZlibDecoder::new(data.as_slice()).read_to_end(&mut out)?;
    Ok(out)
}

impl DataSource for SqlLoader {
    fn load_data_by_key(&self, key: &str) -> Result<Vec<u8>> {
        let stmt = "SELECT `type`, `text` FROM `config` WHERE `name` = ?1";
        let found = self
            .conn
            .query_row(stmt, [key], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .optional()
            .map_err(|err| {
                tracing::error!("load_data_by_key: query [{}], {}", key, err);
                err
            })?;
        let (typ, text) = found.ok_or_else(|| TableError::NotFound(key.to_string()))?;
        if is_deflate(&typ) {
            return inflate(&text).map_err(|err| {
                tracing::error!("load_data_by_key: inflate [{}], {}", key, err);
                err
            });
        }
        Ok(text.into_bytes())
    }
}

/// First non-whitespace character of a decoded payload.
fn leading_char(text: &str) -> Option<char> {
    text.trim_start().chars().next()
}

/// Loads a row table stored under `key`.
pub fn load_list<T>(source: &dyn DataSource, key: &str) -> Result<Vec<T>>
where
    T: ParseRow + DeserializeOwned,
{
    load_list_with(source, key, &ReadOptions::default())
}

pub fn load_list_with<T>(source: &dyn DataSource, key: &str, options: &ReadOptions) -> Result<Vec<T>>
where
    T: ParseRow + DeserializeOwned,
{
    let data = source.load_data_by_key(key)?;
    let text = decode_text(&data, options.encoding);
    if leading_char(&text) == Some('[') {
        return serde_json::from_str(&text).map_err(|err| {
            tracing::error!("{}: json decode, {}", key, err);
            err.into()
        });
    }
    let table = read_csv_str(&text, options.delimiter)?;
    parse_table_rows(&table).map_err(|err| {
        tracing::error!("{}: {}", key, err);
        err
    })
}

/// Loads a single object stored under `key` as a JSON object or a
/// `Key`/`Value` sheet.
pub fn load_kv<T>(source: &dyn DataSource, key: &str) -> Result<T>
where
    T: ParseKv + DeserializeOwned,
{
    load_kv_with(source, key, &ReadOptions::default())
}

pub fn load_kv_with<T>(source: &dyn DataSource, key: &str, options: &ReadOptions) -> Result<T>
where
    T: ParseKv + DeserializeOwned,
{
    let data = source.load_data_by_key(key)?;
    let text = decode_text(&data, options.encoding);
    if leading_char(&text) == Some('{') {
        return Ok(serde_json::from_str(&text)?);
    }
    let table = read_csv_str(&text, options.delimiter)?;
    let map = table
        .to_kv_map()
        .ok_or_else(|| TableError::MissingColumn(format!("{key}: Key/Value")))?;
    T::parse_kv(&map)
}

/// A [`ConfigLoader`] for a row table.
#[derive(Clone, Debug)]
pub struct TableSet<T> {
    pub key: String,
    pub items: Vec<T>,
    pub options: ReadOptions,
}

impl<T> TableSet<T> {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), items: vec![], options: ReadOptions::default() }
    }
}

impl<T: ParseRow + DeserializeOwned> ConfigLoader for TableSet<T> {
    fn load_config_data(&mut self, source: &dyn DataSource) -> Result<()> {
        self.items = load_list_with(source, &self.key, &self.options)?;
        tracing::debug!("loaded {} rows of `{}`", self.items.len(), self.key);
        Ok(())
    }
}

/// A [`ConfigLoader`] for a single `Key`/`Value` object.
#[derive(Clone, Debug)]
pub struct KvConfig<T> {
    pub key: String,
    pub value: T,
    pub options: ReadOptions,
}

impl<T: Default> KvConfig<T> {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), value: T::default(), options: ReadOptions::default() }
    }
}

impl<T: ParseKv + DeserializeOwned> ConfigLoader for KvConfig<T> {
    fn load_config_data(&mut self, source: &dyn DataSource) -> Result<()> {
        self.value = load_kv_with(source, &self.key, &self.options)?;
        Ok(())
    }
}
