use std::collections::HashMap;
use std::path::Path;

use encoding_rs::Encoding;

use crate::encoding::decode_text;
use crate::error::Result;

/// One data row keyed by header name.
pub type Record = HashMap<String, String>;

#[derive(Clone, Copy, Debug)]
/// How raw sheet bytes are turned into a [`GDTable`].
pub struct ReadOptions {
    /// Field delimiter, `,` by default.
    pub delimiter: u8,
    /// Encoding used when the data carries no BOM. `None` means UTF-8.
    pub encoding: Option<&'static Encoding>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { delimiter: b',', encoding: None }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// A parsed CSV sheet: the header row plus the raw data rows.
pub struct GDTable {
    /// Header name to zero-based column index. A repeated name maps to its last column.
    pub head_names: HashMap<String, usize>,
    /// Header names in column order.
    pub headers: Vec<String>,
    /// Data rows. Rows may be shorter or longer than the header.
    pub rows: Vec<Vec<String>>,
}

impl GDTable {
    /// Number of header columns.
    #[inline]
    pub fn col_size(&self) -> usize {
        self.head_names.len()
    }
    /// Number of data rows.
    #[inline]
    pub fn row_size(&self) -> usize {
        self.rows.len()
    }
    #[inline]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.head_names.get(name).copied()
    }
    /// The cell at column `name` of data row `row`, or `""` when the row, the
    /// column, or the cell does not exist.
    pub fn get_cell(&self, name: &str, row: usize) -> &str {
        match (self.rows.get(row), self.column_index(name)) {
            (Some(cells), Some(col)) => cells.get(col).map(String::as_str).unwrap_or(""),
            _ => "",
        }
    }
    #[inline]
    pub fn get_row(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(Vec::as_slice)
    }
    #[inline]
    pub fn has_column(&self, name: &str) -> bool {
        self.head_names.contains_key(name)
    }
    /// Every cell of column `name`, skipping rows too short to have one.
    pub fn get_columns(&self, name: &str) -> Option<Vec<&str>> {
        let col = self.column_index(name)?;
        let cells = self
            .rows
            .iter()
            .filter_map(|row| row.get(col).map(String::as_str))
            .collect();
        Some(cells)
    }
    /// Reads a `Key`/`Value` sheet into a dictionary. `None` when either
    /// column is missing.
    pub fn to_kv_map(&self) -> Option<HashMap<String, String>> {
        let key_col = self.column_index("Key")?;
        let val_col = self.column_index("Value")?;
        let mut dict = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            if let (Some(k), Some(v)) = (row.get(key_col), row.get(val_col)) {
                dict.insert(k.clone(), v.clone());
            }
        }
        Some(dict)
    }
    /// Data rows as [`Record`]s. Cells past the header are dropped.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows.iter().map(|row| {
            self.headers
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.clone(), cell.clone()))
                .collect()
        })
    }
}

/// Reads a comma separated UTF-8 sheet. The first record is the header,
/// blank rows are skipped and every cell is trimmed.
pub fn read_csv_table(data: &[u8]) -> Result<GDTable> {
    read_csv_table_with(data, &ReadOptions::default())
}

pub fn read_csv_table_with(data: &[u8], options: &ReadOptions) -> Result<GDTable> {
    let text = decode_text(data, options.encoding);
    read_csv_str(&text, options.delimiter)
}

/// Same as [`read_csv_table`] for text that is already decoded.
pub fn read_csv_str(text: &str, delimiter: u8) -> Result<GDTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    let mut table = GDTable::default();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|err| {
            tracing::warn!("read_csv_table: read csv {}", err);
            err
        })?;
        let row = record.iter().map(String::from).collect::<Vec<_>>();
        if i == 0 {
            for (j, name) in row.iter().enumerate() {
                table.head_names.insert(name.clone(), j);
            }
            table.headers = row;
        } else if row.iter().any(|cell| !cell.is_empty()) {
            table.rows.push(row);
        }
    }
    tracing::debug!(
        "read_csv_table: {} columns, {} rows",
        table.col_size(),
        table.row_size()
    );
    Ok(table)
}

pub fn read_csv_file_to_table<P: AsRef<Path>>(path: P) -> Result<GDTable> {
    let data = std::fs::read(path)?;
    read_csv_table(&data)
}

/// The non-blank data rows of a sheet, header excluded.
pub fn read_csv_rows(data: &[u8]) -> Result<Vec<Vec<String>>> {
    Ok(read_csv_table(data)?.rows)
}

/// The data rows of a sheet keyed by header name.
pub fn read_csv_records(data: &[u8]) -> Result<Vec<Record>> {
    let table = read_csv_table(data)?;
    Ok(table.records().collect())
}

/// Collects the `Key` -> `Value` cells of each record. Records missing
/// either cell are skipped.
pub fn records_to_kv_map(records: &[Record]) -> HashMap<String, String> {
    records
        .iter()
        .filter_map(|rec| Some((rec.get("Key")?.clone(), rec.get("Value")?.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "ID,Name,Level\n1, Archer ,3\n\n , ,\n2,Knight\n3,Mage,5,extra\n";

    #[test]
    fn header_and_rows() {
        let table = read_csv_table(SHEET.as_bytes()).unwrap();
        assert_eq!(table.col_size(), 3);
        assert_eq!(table.row_size(), 3);
        assert_eq!(table.headers, vec!["ID", "Name", "Level"]);
        assert_eq!(table.get_cell("ID", 0), "1");
        assert_eq!(table.get_cell("Name", 0), "Archer");
        assert_eq!(table.get_cell("Level", 1), "");
        assert_eq!(table.get_cell("Level", 9), "");
        assert_eq!(table.get_cell("Missing", 0), "");
        assert_eq!(table.get_row(2).unwrap().len(), 4);
        assert!(table.get_row(3).is_none());
    }

    #[test]
    fn columns() {
        let table = read_csv_table(SHEET.as_bytes()).unwrap();
        assert!(table.has_column("Name"));
        assert!(!table.has_column("name"));
        assert_eq!(table.get_columns("Level").unwrap(), vec!["3", "5"]);
        assert!(table.get_columns("Nope").is_none());
    }

    #[test]
    fn bom_and_quotes() {
        let data = b"\xEF\xBB\xBFKey,Value\nName,\"a, b\"\n";
        let table = read_csv_table(data).unwrap();
        assert!(table.has_column("Key"));
        assert_eq!(table.get_cell("Value", 0), "a, b");
    }

    #[test]
    fn kv_map() {
        let table = read_csv_table(b"Key,Type,Value\nA,int,1\nB,string,x\nC\n").unwrap();
        let kv = table.to_kv_map().unwrap();
        assert_eq!(kv.len(), 2);
        assert_eq!(kv["A"], "1");
        let no_value = read_csv_table(b"Key,Type\nA,int\n").unwrap();
        assert!(no_value.to_kv_map().is_none());
    }

    #[test]
    fn rows_and_records() {
        let rows = read_csv_rows(SHEET.as_bytes()).unwrap();
        assert_eq!(rows[1], vec!["2", "Knight"]);
        let records = read_csv_records(SHEET.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["Name"], "Archer");
        assert!(!records[1].contains_key("Level"));
        assert_eq!(records[2].len(), 3);
    }

    #[test]
    fn records_kv() {
        let records = read_csv_records(b"Key,Value\nx,1\ny,2\n").unwrap();
        let kv = records_to_kv_map(&records);
        assert_eq!(kv["y"], "2");
        let mut partial = Record::new();
        partial.insert("Key".into(), "z".into());
        assert!(records_to_kv_map(&[partial]).is_empty());
    }

    #[test]
    fn semicolon_delimiter() {
        let opts = ReadOptions { delimiter: b';', ..Default::default() };
        let table = read_csv_table_with(b"a;b\n1;2\n", &opts).unwrap();
        assert_eq!(table.get_cell("b", 0), "2");
        assert_eq!(read_csv_str("a;b\n1;2\n", b';').unwrap(), table);
    }

    #[test]
    fn empty_input() {
        let table = read_csv_table(b"").unwrap();
        assert_eq!(table.col_size(), 0);
        assert_eq!(table.row_size(), 0);
    }
}
