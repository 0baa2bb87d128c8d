//! Traits implemented by typed sheet rows.
//!
//! A schema struct picks the entry points it supports: by column name from a
//! [`GDTable`], positionally from a raw row, from a [`Record`], or from the
//! dictionary of a `Key`/`Value` sheet. Cell conversion inside these is
//! lenient (see [`crate::conv`]); the `Result` covers structural problems.

use std::collections::HashMap;

use crate::csv_parse::{GDTable, Record};
use crate::error::{Result, TableError};

/// Builds a value from one data row of a table, reading cells by column name.
pub trait ParseRow: Sized {
    fn parse_row(table: &GDTable, row: usize) -> Result<Self>;
}

/// Builds a value from a raw row whose cells are in declaration order.
pub trait ParseFromRow: Sized {
    /// Minimum number of cells a row must carry.
    const FIELD_COUNT: usize;
    fn parse_from_row(row: &[String]) -> Result<Self>;
}

/// Builds a value from a header-keyed record.
pub trait ParseRecord: Sized {
    fn parse_from(record: &Record) -> Result<Self>;
}

/// Builds a single value from a `Key` -> `Value` dictionary.
pub trait ParseKv: Sized {
    fn parse_kv(map: &HashMap<String, String>) -> Result<Self>;
}

/// The named cell of a record, `""` when absent.
#[inline]
pub fn cell<'a>(record: &'a Record, name: &str) -> &'a str {
    record.get(name).map(String::as_str).unwrap_or("")
}

pub(crate) fn check_row_len(table: &'static str, row: &[String], expected: usize) -> Result<()> {
    if row.len() < expected {
        return Err(TableError::RowLength { table, expected, actual: row.len() });
    }
    Ok(())
}

/// Parses every data row of `table`. The first failing row aborts the load.
pub fn parse_table_rows<T: ParseRow>(table: &GDTable) -> Result<Vec<T>> {
    let mut list = Vec::with_capacity(table.row_size());
    for row in 0..table.row_size() {
        let item = T::parse_row(table, row).map_err(|err| {
            tracing::error!("parse row {}: {}", row + 1, err);
            err
        })?;
        list.push(item);
    }
    Ok(list)
}

pub fn parse_raw_rows<T: ParseFromRow>(rows: &[Vec<String>]) -> Result<Vec<T>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            T::parse_from_row(row).map_err(|err| {
                tracing::error!("parse row {}: {:?}, {}", i + 1, row, err);
                err
            })
        })
        .collect()
}

pub fn parse_records<T: ParseRecord>(records: &[Record]) -> Result<Vec<T>> {
    records.iter().map(T::parse_from).collect()
}
