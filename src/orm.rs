//! Row mapping between structs and SQL tables.
//!
//! A [`SqlTable`] names its table, columns and keys; the provided methods
//! build the `SELECT`/`INSERT`/`UPDATE`/`DELETE` statements with `?`
//! placeholders and bind the struct's current values.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

use crate::error::Result;

/// A statement with its bound arguments, ready to run.
#[derive(Clone, Debug, PartialEq)]
pub struct DbOperation {
    pub stmt: String,
    pub args: Vec<Value>,
}

impl DbOperation {
    pub fn new(stmt: impl Into<String>, args: Vec<Value>) -> Self {
        Self { stmt: stmt.into(), args }
    }

    /// Runs the statement and returns the number of affected rows.
    pub fn execute(&self, conn: &Connection) -> Result<usize> {
        let changed = conn
            .execute(&self.stmt, params_from_iter(self.args.iter()))
            .map_err(|err| {
                tracing::error!("execute `{}`: {}", self.stmt, err);
                err
            })?;
        Ok(changed)
    }
}

fn quoted(names: &[&str]) -> String {
    names.iter().map(|n| format!("`{n}`")).collect::<Vec<_>>().join(", ")
}

fn assignments<'a>(names: impl Iterator<Item = &'a &'a str>, sep: &str) -> String {
    names.map(|n| format!("`{n}`=?")).collect::<Vec<_>>().join(sep)
}

pub trait SqlTable: Sized {
    const TABLE: &'static str;
    /// Column names in the order of [`SqlTable::column_values`].
    const COLUMNS: &'static [&'static str];
    const PRIMARY_KEYS: &'static [&'static str] = &[];
    const UNIQUE_KEYS: &'static [&'static str] = &[];

    fn column_values(&self) -> Vec<Value>;

    /// Reads one row selected by [`SqlTable::select_stmt`].
    fn load(row: &Row) -> rusqlite::Result<Self>;

    fn select_stmt() -> String {
        format!("SELECT {} FROM `{}`", quoted(Self::COLUMNS), Self::TABLE)
    }

    /// Columns that identify a row: the first primary key, or else every
    /// unique key.
    fn where_keys() -> &'static [&'static str] {
        if Self::PRIMARY_KEYS.is_empty() {
            Self::UNIQUE_KEYS
        } else {
            &Self::PRIMARY_KEYS[..1]
        }
    }

    /// ` WHERE ...` with a leading space, or `""` when the table has no keys.
    fn where_clause() -> String {
        let keys = Self::where_keys();
        if keys.is_empty() {
            return String::new();
        }
        format!(" WHERE {}", assignments(keys.iter(), " AND "))
    }

    fn insert_stmt(&self) -> DbOperation {
        let marks = vec!["?"; Self::COLUMNS.len()].join(", ");
        let stmt = format!(
            "INSERT INTO `{}`({}) VALUES({})",
            Self::TABLE,
            quoted(Self::COLUMNS),
            marks
        );
        DbOperation::new(stmt, self.column_values())
    }

    /// Updates every non-key column of the row matched by the where clause.
    /// Arguments are the non-key values followed by the key values.
    fn update_stmt(&self) -> Option<DbOperation> {
        let keys = Self::where_keys();
        if keys.is_empty() {
            return None;
        }
        let (mut set_args, mut key_args) = (vec![], vec![]);
        let mut set_cols = vec![];
        for (name, value) in Self::COLUMNS.iter().zip(self.column_values()) {
            if keys.contains(name) {
                key_args.push(value);
            } else {
                set_cols.push(name);
                set_args.push(value);
            }
        }
        if set_cols.is_empty() {
            return None;
        }
        let stmt = format!(
            "UPDATE `{}` SET {}{}",
            Self::TABLE,
            assignments(set_cols.into_iter(), ", "),
            Self::where_clause()
        );
        set_args.append(&mut key_args);
        Some(DbOperation::new(stmt, set_args))
    }

    fn delete_stmt(&self) -> Option<DbOperation> {
        let keys = Self::where_keys();
        if keys.is_empty() {
            return None;
        }
        let args = Self::COLUMNS
            .iter()
            .zip(self.column_values())
            .filter(|(name, _)| keys.contains(name))
            .map(|(_, value)| value)
            .collect();
        let stmt = format!("DELETE FROM `{}`{}", Self::TABLE, Self::where_clause());
        Some(DbOperation::new(stmt, args))
    }
}

/// Loads every row of `T`'s table.
pub fn query_all<T: SqlTable>(conn: &Connection) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(&T::select_stmt())?;
    let rows = stmt
        .query_map([], |row| T::load(row))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Player {
    pub id: i32,
    pub name: String,
    pub level: u32,
}

impl Player {
    pub fn set_id(&mut self, v: i32) {
        self.id = v;
    }
    pub fn set_name(&mut self, v: impl Into<String>) {
        self.name = v.into();
    }
    pub fn set_level(&mut self, v: u32) {
        self.level = v;
    }
}

impl SqlTable for Player {
    const TABLE: &'static str = "player";
    const COLUMNS: &'static [&'static str] = &["id", "name", "level"];
    const PRIMARY_KEYS: &'static [&'static str] = &["id"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id.into()),
            Value::Text(self.name.clone()),
            Value::Integer(self.level.into()),
        ]
    }

    fn load(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            level: row.get(2)?,
        })
    }
}
