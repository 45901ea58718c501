//! Parser for delimited nutrition tables.
//!
//! Spreadsheet exports often carry a title row and blank rows above the
//! real header, so the header is located by probing candidate rows until
//! one contains every required column title.
//!
//! Parsing is deliberately lenient about cell contents: a macro cell that
//! is empty, non-numeric, non-finite or negative becomes `None` and the
//! row is dropped later by the completeness check.

use crate::error::{DataLoadError, Result};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub const NAME_COLUMN: &str = "Name";
pub const CATEGORY_COLUMN: &str = "Category";
pub const ENERGY_COLUMN: &str = "Energy, kilocalories (kcal)";
pub const PROTEIN_COLUMN: &str = "Protein (g)";
pub const FAT_COLUMN: &str = "Fat, total (g)";
pub const CARBS_COLUMN: &str = "Carbohydrates, available (g)";

/// Rows probed first when looking for the header, matching the usual
/// layout of title row, blank row, header.
const PREFERRED_HEADER_ROWS: [usize; 4] = [2, 1, 0, 3];

/// Header titles of the six required columns.
#[derive(Debug, Clone)]
pub struct ColumnTitles {
    pub name: String,
    pub category: String,
    pub energy: String,
    pub protein: String,
    pub fat: String,
    pub carbs: String,
}

impl Default for ColumnTitles {
    fn default() -> Self {
        Self {
            name: NAME_COLUMN.to_string(),
            category: CATEGORY_COLUMN.to_string(),
            energy: ENERGY_COLUMN.to_string(),
            protein: PROTEIN_COLUMN.to_string(),
            fat: FAT_COLUMN.to_string(),
            carbs: CARBS_COLUMN.to_string(),
        }
    }
}

impl ColumnTitles {
    /// Titles in the order name, category, energy, protein, fat, carbs.
    pub fn required(&self) -> [&str; 6] {
        [
            self.name.as_str(),
            self.category.as_str(),
            self.energy.as_str(),
            self.protein.as_str(),
            self.fat.as_str(),
            self.carbs.as_str(),
        ]
    }
}

/// Options controlling how a table file is read.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Field delimiter; `None` picks tab for `.tsv`/`.tab` files and comma otherwise
    pub delimiter: Option<u8>,
    /// How many leading rows may be probed for the header
    pub max_header_probe: usize,
    pub columns: ColumnTitles,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_header_probe: 10,
            columns: ColumnTitles::default(),
        }
    }
}

impl LoaderOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_max_header_probe(mut self, rows: usize) -> Self {
        self.max_header_probe = rows;
        self
    }

    pub fn with_columns(mut self, columns: ColumnTitles) -> Self {
        self.columns = columns;
        self
    }

    fn delimiter_for(&self, path: &Path) -> u8 {
        if let Some(d) = self.delimiter {
            return d;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => b'\t',
            _ => b',',
        }
    }
}

/// Column positions of the required fields inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPositions {
    pub name: usize,
    pub category: usize,
    pub energy: usize,
    pub protein: usize,
    pub fat: usize,
    pub carbs: usize,
}

/// One data row before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFoodRow {
    /// 1-based record number in the file
    pub line: usize,
    pub name: Option<String>,
    pub category: Option<String>,
    pub energy_kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
}

/// Header position plus every row found below it.
#[derive(Debug)]
pub struct ParsedSheet {
    pub header_row: usize,
    pub rows: Vec<RawFoodRow>,
}

/// Leading bytes of zip containers (xlsx, ods).
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// Leading bytes of OLE compound files (legacy xls).
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Reject content that cannot be delimited text.
fn check_text_content(bytes: &[u8]) -> std::result::Result<(), &'static str> {
    if bytes.starts_with(ZIP_MAGIC) {
        return Err("found a zip container such as an xlsx workbook; export it as CSV");
    }
    if bytes.starts_with(OLE_MAGIC) {
        return Err("found a legacy Excel workbook; export it as CSV");
    }
    if bytes.contains(&0) {
        return Err("found binary content (NUL bytes)");
    }
    Ok(())
}

/// Read a file as text.
///
/// UTF-8 is tried first (with an optional BOM); anything else is decoded
/// as ISO-8859-1, which maps every byte to the code point of equal value.
fn read_text(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    check_text_content(&bytes).map_err(|reason| DataLoadError::NotTabular {
        path: path.display().to_string(),
        reason: reason.to_string(),
    })?;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    };
    if text.starts_with('\u{feff}') {
        Ok(text['\u{feff}'.len_utf8()..].to_string())
    } else {
        Ok(text)
    }
}

/// Read every record of a delimited file without interpreting headers.
pub fn read_records(path: &Path, delimiter: u8) -> Result<Vec<StringRecord>> {
    let text = read_text(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|source| DataLoadError::ParseError {
            path: path.display().to_string(),
            source,
        })
}

/// Order in which rows are probed: the preferred rows first, then every
/// other row up to `max_probe`.
fn probe_order(record_count: usize, max_probe: usize) -> Vec<usize> {
    let limit = max_probe.min(record_count);
    let mut order: Vec<usize> = PREFERRED_HEADER_ROWS
        .iter()
        .copied()
        .filter(|&row| row < limit)
        .collect();
    for row in 0..limit {
        if !order.contains(&row) {
            order.push(row);
        }
    }
    order
}

fn position_of(record: &StringRecord, title: &str) -> Option<usize> {
    record.iter().position(|field| field.trim() == title)
}

fn match_header(record: &StringRecord, columns: &ColumnTitles) -> Option<ColumnPositions> {
    Some(ColumnPositions {
        name: position_of(record, &columns.name)?,
        category: position_of(record, &columns.category)?,
        energy: position_of(record, &columns.energy)?,
        protein: position_of(record, &columns.protein)?,
        fat: position_of(record, &columns.fat)?,
        carbs: position_of(record, &columns.carbs)?,
    })
}

/// Find the header row among the probed rows.
///
/// On failure the error reports the columns missing from the row that
/// matched the most required titles, along with look-alike headers.
pub fn locate_header(
    records: &[StringRecord],
    columns: &ColumnTitles,
    max_probe: usize,
    path: &Path,
) -> Result<(usize, ColumnPositions)> {
    let order = probe_order(records.len(), max_probe);

    if !order.iter().any(|&row| records[row].len() > 1) {
        return Err(DataLoadError::NotTabular {
            path: path.display().to_string(),
            reason: format!("none of the first {} rows has more than one field", order.len()),
        });
    }

    for &row in &order {
        if let Some(positions) = match_header(&records[row], columns) {
            debug!("Found header at row {} of {}", row, path.display());
            return Ok((row, positions));
        }
    }

    let best = order.iter().copied().max_by_key(|&row| {
        // Prefer the topmost row on ties
        let hits = columns
            .required()
            .iter()
            .filter(|title| position_of(&records[row], title).is_some())
            .count();
        (hits, std::cmp::Reverse(row))
    });

    let available: Vec<String> = best
        .map(|row| records[row].iter().map(|f| f.trim().to_string()).collect())
        .unwrap_or_default();

    let missing: Vec<String> = columns
        .required()
        .iter()
        .filter(|title| !available.iter().any(|a| a == *title))
        .map(|title| title.to_string())
        .collect();

    let similar = missing
        .iter()
        .filter_map(|title| {
            let wanted = title.to_lowercase();
            let hits: Vec<String> = available
                .iter()
                .filter(|a| {
                    let a = a.to_lowercase();
                    !a.is_empty() && (a.contains(&wanted) || wanted.contains(&a))
                })
                .take(5)
                .cloned()
                .collect();
            (!hits.is_empty()).then(|| (title.clone(), hits))
        })
        .collect();

    Err(DataLoadError::SchemaError {
        path: path.display().to_string(),
        missing,
        probed_rows: order.len(),
        similar,
    })
}

/// Parse a macro cell. Empty, non-numeric, non-finite and negative values
/// are treated as missing.
pub fn parse_macro(field: &str) -> Option<f64> {
    let value: f64 = field.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn text_field(record: &StringRecord, position: usize) -> Option<String> {
    record
        .get(position)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn macro_field(record: &StringRecord, position: usize) -> Option<f64> {
    record.get(position).and_then(parse_macro)
}

/// Read the table at `path` into raw rows.
pub fn parse_food_sheet(path: &Path, options: &LoaderOptions) -> Result<ParsedSheet> {
    let records = read_records(path, options.delimiter_for(path))?;
    let (header_row, columns) =
        locate_header(&records, &options.columns, options.max_header_probe, path)?;

    let rows = records
        .iter()
        .enumerate()
        .skip(header_row + 1)
        .filter(|(_, record)| record.iter().any(|field| !field.trim().is_empty()))
        .map(|(idx, record)| RawFoodRow {
            line: idx + 1,
            name: text_field(record, columns.name),
            category: text_field(record, columns.category),
            energy_kcal: macro_field(record, columns.energy),
            protein_g: macro_field(record, columns.protein),
            fat_g: macro_field(record, columns.fat),
            carbs_g: macro_field(record, columns.carbs),
        })
        .collect();

    Ok(ParsedSheet { header_row, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    fn header() -> StringRecord {
        record(&[
            "ID",
            NAME_COLUMN,
            CATEGORY_COLUMN,
            ENERGY_COLUMN,
            PROTEIN_COLUMN,
            FAT_COLUMN,
            CARBS_COLUMN,
        ])
    }

    #[test]
    fn test_parse_macro() {
        assert_eq!(parse_macro("31.0"), Some(31.0));
        assert_eq!(parse_macro(" 0 "), Some(0.0));
        assert_eq!(parse_macro(""), None);
        assert_eq!(parse_macro("tr."), None);
        assert_eq!(parse_macro("NaN"), None);
        assert_eq!(parse_macro("-1.5"), None);
    }

    #[test]
    fn test_probe_order_prefers_third_row() {
        assert_eq!(probe_order(10, 6), vec![2, 1, 0, 3, 4, 5]);
        assert_eq!(probe_order(2, 10), vec![1, 0]);
    }

    #[test]
    fn test_locate_header_after_title_rows() {
        let records = vec![
            record(&["Swiss Food Composition Database"]),
            record(&["Version 6.5"]),
            header(),
            record(&["1", "Apple", "Fruit", "52", "0.3", "0.2", "14"]),
        ];
        let (row, positions) =
            locate_header(&records, &ColumnTitles::default(), 10, Path::new("t.csv")).unwrap();
        assert_eq!(row, 2);
        assert_eq!(positions.name, 1);
        assert_eq!(positions.carbs, 6);
    }

    #[test]
    fn test_check_text_content() {
        assert!(check_text_content(b"Name,Category\nApple,Fruit\n").is_ok());
        assert!(check_text_content(b"PK\x03\x04\x14\x00\x06\x00").is_err());
        assert!(check_text_content(OLE_MAGIC).is_err());
        assert!(check_text_content(b"Name,\x00Category").is_err());
    }

    #[test]
    fn test_locate_header_rejects_undelimited_rows() {
        let records = vec![record(&["just a note"]), record(&["another line"])];
        let err = locate_header(&records, &ColumnTitles::default(), 10, Path::new("t.csv"))
            .unwrap_err();
        assert!(matches!(err, DataLoadError::NotTabular { .. }));
    }

    #[test]
    fn test_locate_header_reports_missing_columns() {
        let records = vec![
            record(&["Name", "Category", "Energy (kcal)", "Protein (g)"]),
            record(&["Apple", "Fruit", "52", "0.3"]),
        ];
        let err = locate_header(&records, &ColumnTitles::default(), 10, Path::new("t.csv"))
            .unwrap_err();
        match err {
            DataLoadError::SchemaError { missing, .. } => {
                assert_eq!(
                    missing,
                    vec![
                        ENERGY_COLUMN.to_string(),
                        FAT_COLUMN.to_string(),
                        CARBS_COLUMN.to_string()
                    ]
                );
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }
}
