// Default mods and exports
pub mod conv;
pub mod convert;
pub mod csv_parse;
pub mod defines;
pub mod encoding;
pub mod error;
pub mod loader;
pub mod orm;
pub mod schema;
pub mod settings;
pub mod types;
pub use csv;
pub use rusqlite;
pub use csv_parse::{GDTable, ReadOptions, Record};
pub use error::{Result, TableError};
pub use loader::{ConfigLoader, DataSource, FileLoader, SqlLoader};
pub use settings::Settings;
// Crate only mods
mod serde_impls;
