//! Results table domain types
//!
//! The training pipeline summarises every finished model as one row of a
//! performance table. The harness only reads it: count rows, look up metric
//! columns, take maxima.

use std::io::Read;

/// Performance results, one row per trained model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultsTable {
    /// Builds a table, padding or truncating rows to the header width
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Reads a CSV document with a header row
    pub fn from_csv_reader<R: Read>(reader: R) -> csv::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self::new(headers, rows))
    }

    pub fn from_csv_str(csv: &str) -> csv::Result<Self> {
        Self::from_csv_reader(csv.as_bytes())
    }

    /// Concatenates tables row-wise over the union of their columns
    ///
    /// Column order follows first appearance. Cells a table does not have
    /// are left empty.
    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = ResultsTable>,
    {
        let mut headers: Vec<String> = Vec::new();
        let mut pending = Vec::new();

        for table in tables {
            for header in &table.headers {
                if !headers.contains(header) {
                    headers.push(header.clone());
                }
            }
            pending.push(table);
        }

        let mut rows = Vec::new();
        for table in pending {
            let positions: Vec<usize> = table
                .headers
                .iter()
                .filter_map(|h| headers.iter().position(|x| x == h))
                .collect();

            for row in table.rows {
                let mut merged = vec![String::new(); headers.len()];
                for (cell, &pos) in row.into_iter().zip(&positions) {
                    merged[pos] = cell;
                }
                rows.push(merged);
            }
        }

        Self { headers, rows }
    }

    /// Number of result rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Column names containing `fragment`
    pub fn columns_containing(&self, fragment: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| h.contains(fragment))
            .map(String::as_str)
            .collect()
    }

    /// Numeric cells of a column
    ///
    /// Blank, non-numeric and NaN cells are skipped. Returns `None` when
    /// the column does not exist.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(idx))
                .filter_map(|cell| cell.trim().parse::<f64>().ok())
                .filter(|v| !v.is_nan())
                .collect(),
        )
    }

    /// Largest numeric value in a column
    pub fn column_max(&self, name: &str) -> Option<f64> {
        self.numeric_column(name)?
            .into_iter()
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}
