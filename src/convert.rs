//! Writers that turn a [`GDTable`] into JSON, CSV text or an Excel sheet.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::csv_parse::GDTable;
use crate::error::{Result, TableError};
use crate::types::{Delimiters, Kind};

/// Typed columns of a row table, in output order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<(String, Kind)>,
    /// Columns whose cells must differ across the exported rows.
    #[serde(default)]
    pub unique_columns: Vec<String>,
}

impl Schema {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Kind)>,
        S: Into<String>,
    {
        Self {
            columns: pairs.into_iter().map(|(name, kind)| (name.into(), kind)).collect(),
            unique_columns: vec![],
        }
    }

    pub fn with_unique(mut self, column: impl Into<String>) -> Self {
        self.unique_columns.push(column.into());
        self
    }

    /// Reads the type names stored in data row `row`, the way sheets keep a
    /// type row under the header. Columns with a blank type cell are left out.
    pub fn from_type_row(table: &GDTable, row: usize) -> Result<Self> {
        let cells = table
            .get_row(row)
            .ok_or_else(|| TableError::NotFound(format!("type row {row}")))?;
        let mut columns = vec![];
        for (name, type_name) in table.headers.iter().zip(cells) {
            if name.is_empty() || type_name.is_empty() {
                continue;
            }
            columns.push((name.clone(), Kind::parse(type_name)?));
        }
        Ok(Self { columns, unique_columns: vec![] })
    }
}

/// Fails on the first repeated cell of `column` among the data rows after
/// `skip_rows`. Row numbers in the error are 1-based data row numbers.
pub fn validate_unique_column(table: &GDTable, column: &str, skip_rows: usize) -> Result<()> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| TableError::MissingColumn(column.to_string()))?;
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, row) in table.rows.iter().enumerate().skip(skip_rows) {
        let value = row.get(idx).map(String::as_str).unwrap_or("");
        if let Some(first) = seen.insert(value, i + 1) {
            tracing::error!("duplicate field {} value found, row {} and row {}", column, first, i + 1);
            return Err(TableError::Duplicate {
                column: column.to_string(),
                value: value.to_string(),
                first,
                row: i + 1,
            });
        }
    }
    Ok(())
}

/// One JSON object per data row after the first `skip_rows`, holding the
/// schema's columns as typed values. The schema's unique columns are
/// checked first.
pub fn table_to_json(
    table: &GDTable,
    schema: &Schema,
    delims: &Delimiters,
    skip_rows: usize,
) -> Result<Json> {
    let mut cols = Vec::with_capacity(schema.columns.len());
    for (name, kind) in &schema.columns {
        let idx = table
            .column_index(name)
            .ok_or_else(|| TableError::MissingColumn(name.clone()))?;
        cols.push((name, kind, idx));
    }
    for column in &schema.unique_columns {
        validate_unique_column(table, column, skip_rows)?;
    }
    let mut list = vec![];
    for row in table.rows.iter().skip(skip_rows) {
        let mut obj = Map::new();
        for (name, kind, idx) in &cols {
            let text = row.get(*idx).map(String::as_str).unwrap_or("");
            obj.insert(name.to_string(), kind.parse_value(text, delims).to_json());
        }
        list.push(Json::Object(obj));
    }
    Ok(Json::Array(list))
}

/// Folds a `Key`/`Type`/`Value` sheet into a single JSON object. Rows with a
/// blank key are skipped.
pub fn kv_table_to_json(table: &GDTable, delims: &Delimiters) -> Result<Json> {
    for name in ["Key", "Type", "Value"] {
        if !table.has_column(name) {
            return Err(TableError::MissingColumn(name.into()));
        }
    }
    let mut obj = Map::new();
    for row in 0..table.row_size() {
        let key = table.get_cell("Key", row);
        if key.is_empty() {
            continue;
        }
        let kind = Kind::parse(table.get_cell("Type", row)).map_err(|err| {
            tracing::error!("kv_table_to_json: key {}, {}", key, err);
            err
        })?;
        let value = kind.parse_value(table.get_cell("Value", row), delims);
        obj.insert(key.to_string(), value.to_json());
    }
    Ok(Json::Object(obj))
}

/// Writes the header and the rows back out as CSV text.
pub fn table_to_csv(table: &GDTable, delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(vec![]);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    let data = writer.into_inner().map_err(|err| err.into_error())?;
    String::from_utf8(data).map_err(|err| TableError::Other(err.to_string()))
}

#[cfg(feature = "xlsx")]
/// Writes the table to a single worksheet, header on the first line.
pub fn table_to_xlsx<S: AsRef<str>>(table: &GDTable, name: S) -> Result<()> {
    let book = xlsxwriter::Workbook::new(name.as_ref())?;
    let mut sheet = book.add_worksheet(None)?;
    for (i, header) in table.headers.iter().enumerate() {
        sheet.write_string(0, i as u16, header, None)?;
    }
    for (j, row) in table.rows.iter().enumerate() {
        for (i, cell) in row.iter().enumerate() {
            sheet.write_string((j + 1) as u32, i as u16, cell, None)?;
        }
    }
    book.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::csv_parse::read_csv_table;
    use crate::types::ScalarKind;

    const SHEET: &str = "ID,Name,Rewards,Tags,Note\n\
                         int32,string,\"<string,int>\",int[],\n\
                         1,Archer,gold=5|gem=1,1|2,x\n\
                         2,Knight,,,\n";

    #[test]
    fn typed_rows() {
        let table = read_csv_table(SHEET.as_bytes()).unwrap();
        let schema = Schema::from_type_row(&table, 0).unwrap();
        assert_eq!(schema.columns.len(), 4);
        assert_eq!(schema.columns[3].1, Kind::Array(ScalarKind::Int));
        let json = table_to_json(&table, &schema, &Delimiters::default(), 1).unwrap();
        assert_eq!(
            json,
            json!([
                {"ID": 1, "Name": "Archer", "Rewards": {"gold": 5, "gem": 1}, "Tags": [1, 2]},
                {"ID": 2, "Name": "Knight", "Rewards": {}, "Tags": []}
            ])
        );
    }

    #[test]
    fn missing_schema_column() {
        let table = read_csv_table(SHEET.as_bytes()).unwrap();
        let schema = Schema::from_pairs([("Hp", Kind::Scalar(ScalarKind::Int32))]);
        let err = table_to_json(&table, &schema, &Delimiters::default(), 0).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(name) if name == "Hp"));
    }

    #[test]
    fn unique_column_rejects_repeats() {
        let data = "ID,Name\nint32,string\n1,a\n2,b\n1,c\n";
        let table = read_csv_table(data.as_bytes()).unwrap();
        let schema = Schema::from_type_row(&table, 0).unwrap();
        let d = Delimiters::default();
        assert_eq!(table_to_json(&table, &schema, &d, 1).unwrap().as_array().unwrap().len(), 3);

        let err = table_to_json(&table, &schema.clone().with_unique("ID"), &d, 1).unwrap_err();
        assert!(matches!(
            err,
            TableError::Duplicate { ref column, ref value, first: 2, row: 4 } if column == "ID" && value == "1"
        ));
        assert!(table_to_json(&table, &schema.with_unique("Name"), &d, 1).is_ok());
        assert!(matches!(
            validate_unique_column(&table, "Hp", 0),
            Err(TableError::MissingColumn(_))
        ));
    }

    #[test]
    fn kv_mode() {
        let data = "Key,Type,Value\nSpeed,float,1.5\n,int,9\nOpen,bool,yes\nLimits,int[],1|2\n";
        let table = read_csv_table(data.as_bytes()).unwrap();
        let json = kv_table_to_json(&table, &Delimiters::default()).unwrap();
        assert_eq!(json, json!({"Speed": 1.5, "Open": true, "Limits": [1, 2]}));

        let bad = read_csv_table(b"Key,Type,Value\nA,vector,1\n").unwrap();
        assert!(matches!(
            kv_table_to_json(&bad, &Delimiters::default()),
            Err(TableError::Type(_))
        ));
        let no_type = read_csv_table(b"Key,Value\nA,1\n").unwrap();
        assert!(kv_table_to_json(&no_type, &Delimiters::default()).is_err());
    }

    #[test]
    fn csv_text() {
        let table = read_csv_table(b"a,b\n1,\"x,y\"\n2\n").unwrap();
        assert_eq!(table_to_csv(&table, b',').unwrap(), "a,b\n1,\"x,y\"\n2\n");
        assert_eq!(table_to_csv(&table, b';').unwrap(), "a;b\n1;x,y\n2\n");
    }
}
