//! Loader settings read from a TOML file.
//!
//! ```toml
//! data_dir = "res"
//! suffixes = ["_config.json", ".csv"]
//! delimiter = ";"
//! encoding = "gbk"
//! sqlite_path = "config.db"
//!
//! [delimiters]
//! map_pair = ":"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::csv_parse::ReadOptions;
use crate::encoding::encoding_for_label;
use crate::error::{Result, TableError};
use crate::loader::{FileLoader, SqlLoader};
use crate::types::Delimiters;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory searched by the file loader.
    pub data_dir: PathBuf,
    /// File name suffixes tried after the key, in order.
    pub suffixes: Vec<String>,
    /// CSV field delimiter. Must be ASCII.
    pub delimiter: char,
    /// Encoding label for sheets without a BOM, UTF-8 when unset.
    pub encoding: Option<String>,
    pub delimiters: Delimiters,
    /// SQLite database holding the `config` table.
    pub sqlite_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            suffixes: FileLoader::DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            delimiter: ',',
            encoding: None,
            delimiters: Delimiters::default(),
            sqlite_path: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::info!("load settings {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn read_options(&self) -> Result<ReadOptions> {
        if !self.delimiter.is_ascii() {
            return Err(TableError::Other(format!("delimiter `{}` is not ASCII", self.delimiter)));
        }
        let encoding = self.encoding.as_deref().map(encoding_for_label).transpose()?;
        Ok(ReadOptions { delimiter: self.delimiter as u8, encoding })
    }

    pub fn file_loader(&self) -> FileLoader {
        FileLoader::new(&self.data_dir).with_suffixes(self.suffixes.iter().cloned())
    }

    /// Opens the SQLite source, `None` when no database is configured.
    pub fn sql_loader(&self) -> Option<Result<SqlLoader>> {
        self.sqlite_path.as_ref().map(SqlLoader::open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_missing_fields() {
        let settings = Settings::from_toml_str("data_dir = \"res\"").unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("res"));
        assert_eq!(settings.suffixes, vec!["_config.json", ".csv"]);
        assert_eq!(settings.delimiters, Delimiters::default());
        assert!(settings.sql_loader().is_none());
        let opts = settings.read_options().unwrap();
        assert_eq!(opts.delimiter, b',');
        assert!(opts.encoding.is_none());
    }

    #[test]
    fn full_settings() {
        let text = r#"
            delimiter = ";"
            encoding = "gbk"
            suffixes = [".txt"]

            [delimiters]
            map_pair = ":"
        "#;
        let settings = Settings::from_toml_str(text).unwrap();
        assert_eq!(settings.delimiters.map_pair, ":");
        assert_eq!(settings.delimiters.array, "|");
        let opts = settings.read_options().unwrap();
        assert_eq!(opts.delimiter, b';');
        assert_eq!(opts.encoding, Some(encoding_rs::GBK));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(Settings::from_toml_str("delimiter = 3"), Err(TableError::Toml(_))));
        let bad_label = Settings { encoding: Some("klingon".into()), ..Default::default() };
        assert!(bad_label.read_options().is_err());
        let wide = Settings { delimiter: '；', ..Default::default() };
        assert!(wide.read_options().is_err());
    }
}
