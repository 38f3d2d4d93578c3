//! Spreadsheet decoder.
//!
//! Credit card statements come as spreadsheets whose header row sits below a
//! few lines of preamble. The schema names the header of each column it
//! wants; everything else is dropped.

use crate::amount::Amount;
use crate::dates::{excel_serial_to_date, parse_date};
use crate::error::{ConvertError, Result};
use crate::record::{FieldValue, RawRow};
use crate::schema::{FieldDefinition, FieldKind, ReaderType, Schema};
use calamine::{Data, DataType, Reader};
use chrono::NaiveDateTime;
use log::debug;
use std::path::Path;
use std::str::FromStr;

/// A spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for string fields and header names.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::DateTime(dt) => dt.to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(_) | Data::DateTimeIso(_) => match data.as_datetime() {
                Some(dt) => Cell::DateTime(dt),
                None => Cell::Text(data.to_string()),
            },
            other => Cell::Text(other.to_string()),
        }
    }
}

/// A raw grid of cells, before any header handling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Sheet { rows }
    }

    /// Builds a sheet of text cells; handy for CSV exports and tests.
    pub fn from_text_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Sheet {
            rows: rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|value| {
                            let value: String = value.into();
                            if value.is_empty() {
                                Cell::Empty
                            } else {
                                Cell::Text(value)
                            }
                        })
                        .collect()
                })
                .collect(),
        }
    }

    /// Reads the first worksheet of an `.xlsx`, `.xls` or `.ods` workbook.
    ///
    /// Leading empty rows and columns are kept so row counts match what a
    /// spreadsheet application shows.
    pub fn from_workbook(path: &Path) -> Result<Self> {
        let mut workbook = calamine::open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| {
                ConvertError::UnsupportedInput(format!("{} has no worksheets", path.display()))
            })??;

        let (top, left) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<Cell>> = (0..top).map(|_| Vec::new()).collect();
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; left as usize];
            cells.extend(row.iter().map(Cell::from));
            rows.push(cells);
        }
        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(Sheet { rows })
    }

    /// Reads a CSV export of a spreadsheet. All cells are text; blank lines
    /// are not rows.
    pub fn from_csv<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        Ok(Sheet::from_text_rows(rows))
    }

    /// Opens a spreadsheet file, using the extension to pick the reader.
    pub fn open(path: &Path) -> Result<Self> {
        let is_csv = path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
        if is_csv {
            let file = std::fs::File::open(path)?;
            Sheet::from_csv(std::io::BufReader::new(file))
        } else {
            Sheet::from_workbook(path)
        }
    }
}

/// A schema field bound to a sheet column.
struct MappedColumn<'s> {
    field: &'s FieldDefinition,
    index: usize,
}

/// Decodes sheet rows according to an `xlsx` schema.
pub struct TabularDecoder<'a> {
    schema: &'a Schema,
}

impl<'a> TabularDecoder<'a> {
    pub fn new(schema: &'a Schema) -> Result<Self> {
        if schema.reader_type() != ReaderType::Xlsx {
            return Err(ConvertError::schema(
                "tabular decoding requires reader_type 'xlsx'",
            ));
        }
        Ok(TabularDecoder { schema })
    }

    /// Decodes every data row below the header.
    pub fn decode(&self, sheet: &Sheet) -> Result<Vec<RawRow>> {
        let skiprows = self.schema.config().skiprows;
        let header_row = sheet.rows.get(skiprows).ok_or_else(|| {
            ConvertError::UnsupportedInput(format!(
                "sheet has {} rows, expected a header after skipping {}",
                sheet.rows.len(),
                skiprows
            ))
        })?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_text().trim().to_string())
            .collect();

        let columns = self.map_columns(&headers)?;
        let amount = self.required_mapped("amount", &columns)?;
        self.required_mapped("date", &columns)?;

        let payment_rule = amount.amount_is_payment_if_contains.as_ref();
        if let Some(rule) = payment_rule {
            if !columns.iter().any(|c| c.field.name == rule.column_name) {
                return Err(ConvertError::missing_field(
                    &rule.column_name,
                    "payment rule refers to a column that is not mapped",
                ));
            }
        }

        let mut out = Vec::new();
        for (offset, cells) in sheet.rows.iter().enumerate().skip(skiprows + 1) {
            // 1-based spreadsheet row number.
            let row_no = offset + 1;
            if cells.iter().all(Cell::is_empty) {
                continue;
            }

            let mut row = RawRow::new(row_no);
            for column in &columns {
                let cell = cells.get(column.index).unwrap_or(&Cell::Empty);
                let value = coerce_cell(row_no, column.field, cell)?;
                row.insert(column.field.name.clone(), value);
            }

            if let Some(rule) = payment_rule {
                let companion = row
                    .get(&rule.column_name)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                if companion.contains(rule.value.as_str()) {
                    row.negate("amount");
                }
            }
            if amount.reverse_amount {
                row.negate("amount");
            }

            out.push(row);
        }

        debug!("Decoded {} spreadsheet rows", out.len());
        Ok(out)
    }

    /// Binds each field declaring a `column_name` to its header position.
    fn map_columns(&self, headers: &[String]) -> Result<Vec<MappedColumn<'a>>> {
        let mut columns = Vec::new();
        for field in self.schema.fields() {
            let Some(column_name) = field.column_name.as_deref() else {
                continue;
            };
            let index = headers
                .iter()
                .position(|h| h == column_name)
                .ok_or_else(|| {
                    ConvertError::missing_field(
                        &field.name,
                        format!("column '{}' not found in sheet header", column_name),
                    )
                })?;
            columns.push(MappedColumn { field, index });
        }
        Ok(columns)
    }

    fn required_mapped(
        &self,
        name: &str,
        columns: &[MappedColumn<'a>],
    ) -> Result<&'a FieldDefinition> {
        columns
            .iter()
            .find(|c| c.field.name == name)
            .map(|c| c.field)
            .ok_or_else(|| {
                ConvertError::missing_field(name, "schema does not map it to a sheet column")
            })
    }
}

/// Strict conversion of a cell to the field's declared type.
fn coerce_cell(row: usize, field: &FieldDefinition, cell: &Cell) -> Result<FieldValue> {
    match &field.kind {
        FieldKind::String => Ok(FieldValue::Text(cell.to_text().trim().to_string())),
        FieldKind::Date { format } => {
            let date = match cell {
                Cell::DateTime(dt) => Some(dt.date()),
                // .xls exports often carry bare serials without a date format;
                // anything outside Excel's calendar is rejected.
                Cell::Number(serial) => excel_serial_to_date(*serial),
                Cell::Text(s) => parse_date(s.trim(), format),
                Cell::Empty => None,
            };
            date.map(FieldValue::Date).ok_or_else(|| ConvertError::DateParse {
                row,
                field: field.name.clone(),
                value: cell.to_text(),
                format: format.clone(),
            })
        }
        FieldKind::Decimal => {
            let amount = match cell {
                Cell::Number(n) => Amount::from_f64(*n),
                Cell::Text(s) => Amount::from_str(s).ok(),
                _ => None,
            };
            amount.map(FieldValue::Amount).ok_or_else(|| ConvertError::InvalidValue {
                row,
                field: field.name.clone(),
                value: cell.to_text(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const CARD_SCHEMA: &str = r#"{
        "__config__": {"reader_type": "xlsx", "skiprows": 2},
        "date": {"type": "date", "format": "%d/%m/%Y", "column_name": "Fecha"},
        "description": {"type": "string", "column_name": "Descripción"},
        "amount": {"type": "decimal", "column_name": "Monto"}
    }"#;

    fn card_sheet(rows: &[[&str; 4]]) -> Sheet {
        let mut all = vec![
            vec!["Estado de cuenta".to_string()],
            vec![],
            vec![" Fecha ".to_string(), "Descripción".to_string(), "Ciudad".to_string(), "Monto ".to_string()],
        ];
        all.extend(rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()));
        Sheet::from_text_rows(all)
    }

    fn decode(schema_json: &str, sheet: &Sheet) -> Result<Vec<RawRow>> {
        let schema = Schema::from_json(schema_json).unwrap();
        TabularDecoder::new(&schema)?.decode(sheet)
    }

    #[test]
    fn test_skiprows_and_header_trimming() {
        let sheet = card_sheet(&[["01/07/2025", "LIDER", "SANTIAGO", "15990"]]);
        let rows = decode(CARD_SCHEMA, &sheet).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.source_row, 4);
        assert_eq!(
            row.get("date").and_then(FieldValue::as_date),
            NaiveDate::from_ymd_opt(2025, 7, 1)
        );
        assert_eq!(row.text("description"), Some("LIDER"));
        assert_eq!(row.amount("amount").unwrap().to_string(), "15990");
    }

    #[test]
    fn test_unmapped_columns_are_dropped() {
        let sheet = card_sheet(&[["01/07/2025", "LIDER", "SANTIAGO", "15990"]]);
        let rows = decode(CARD_SCHEMA, &sheet).unwrap();
        let names: Vec<_> = rows[0].field_names().collect();
        assert_eq!(names, ["date", "description", "amount"]);
    }

    #[test]
    fn test_missing_column_is_missing_field_error() {
        let schema = CARD_SCHEMA.replace("\"Monto\"", "\"Monto Total\"");
        let sheet = card_sheet(&[["01/07/2025", "LIDER", "SANTIAGO", "15990"]]);
        let err = decode(&schema, &sheet).unwrap_err();
        match err {
            ConvertError::MissingField { field, reason } => {
                assert_eq!(field, "amount");
                assert!(reason.contains("Monto Total"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_schema_without_amount_is_missing_field_error() {
        let schema = r#"{
            "__config__": {"reader_type": "xlsx", "skiprows": 2},
            "date": {"type": "date", "format": "%d/%m/%Y", "column_name": "Fecha"}
        }"#;
        let sheet = card_sheet(&[]);
        let err = decode(schema, &sheet).unwrap_err();
        assert!(matches!(err, ConvertError::MissingField { ref field, .. } if field == "amount"));
    }

    #[test]
    fn test_payment_rule_negates_matching_rows() {
        let schema = CARD_SCHEMA.replace(
            "\"column_name\": \"Monto\"",
            "\"column_name\": \"Monto\", \"amount_is_payment_if_contains\": {\"column_name\": \"description\", \"value\": \"Pago\"}",
        );
        let sheet = card_sheet(&[
            ["01/07/2025", "Pago Tarjeta", "", "50000"],
            ["02/07/2025", "PAGO EN LINEA", "", "1000"],
            ["03/07/2025", "Farmacia", "", "2500"],
        ]);
        let rows = decode(&schema, &sheet).unwrap();
        assert_eq!(rows[0].amount("amount").unwrap().to_string(), "-50000");
        // Containment is case-sensitive.
        assert_eq!(rows[1].amount("amount").unwrap().to_string(), "1000");
        assert_eq!(rows[2].amount("amount").unwrap().to_string(), "2500");
    }

    #[test]
    fn test_reverse_amount_negates_every_row() {
        let schema = CARD_SCHEMA.replace(
            "\"column_name\": \"Monto\"",
            "\"column_name\": \"Monto\", \"reverse_amount\": true",
        );
        let sheet = card_sheet(&[
            ["01/07/2025", "LIDER", "", "15990"],
            ["03/07/2025", "Reverso", "", "-4500"],
        ]);
        let rows = decode(&schema, &sheet).unwrap();
        assert_eq!(rows[0].amount("amount").unwrap().to_string(), "-15990");
        assert_eq!(rows[1].amount("amount").unwrap().to_string(), "4500");
    }

    #[test]
    fn test_payment_rule_and_reverse_both_apply() {
        let schema = CARD_SCHEMA.replace(
            "\"column_name\": \"Monto\"",
            "\"column_name\": \"Monto\", \"reverse_amount\": true, \"amount_is_payment_if_contains\": {\"value\": \"Pago\"}",
        );
        let sheet = card_sheet(&[
            ["01/07/2025", "Pago Tarjeta", "", "50000"],
            ["02/07/2025", "LIDER", "", "15990"],
        ]);
        let rows = decode(&schema, &sheet).unwrap();
        assert_eq!(rows[0].amount("amount").unwrap().to_string(), "50000");
        assert_eq!(rows[1].amount("amount").unwrap().to_string(), "-15990");
    }

    #[test]
    fn test_malformed_date_is_strict_error_with_row() {
        let sheet = card_sheet(&[
            ["01/07/2025", "LIDER", "", "15990"],
            ["2025-07-02", "COPEC", "", "32000"],
        ]);
        let err = decode(CARD_SCHEMA, &sheet).unwrap_err();
        match err {
            ConvertError::DateParse { row, value, .. } => {
                assert_eq!(row, 5);
                assert_eq!(value, "2025-07-02");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_amount_is_error() {
        let sheet = card_sheet(&[["01/07/2025", "LIDER", "", "n/a"]]);
        let err = decode(CARD_SCHEMA, &sheet).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidValue { row: 4, .. }));
    }

    #[test]
    fn test_native_cells_are_accepted() {
        let schema = Schema::from_json(CARD_SCHEMA).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let sheet = Sheet::new(vec![
            vec![],
            vec![],
            vec![
                Cell::Text("Fecha".into()),
                Cell::Text("Descripción".into()),
                Cell::Text("Monto".into()),
            ],
            vec![
                Cell::DateTime(date.and_hms_opt(0, 0, 0).unwrap()),
                Cell::Number(1234.0),
                Cell::Number(99.5),
            ],
            vec![Cell::Number(45839.0), Cell::Text("X".into()), Cell::Number(1.0)],
        ]);
        let rows = TabularDecoder::new(&schema).unwrap().decode(&sheet).unwrap();
        assert_eq!(rows[0].get("date").and_then(FieldValue::as_date), Some(date));
        assert_eq!(rows[0].text("description"), Some("1234"));
        assert_eq!(rows[0].amount("amount").unwrap().to_string(), "99.5");
        assert_eq!(rows[1].get("date").and_then(FieldValue::as_date), Some(date));
    }

    #[test]
    fn test_serial_outside_excel_calendar_is_date_parse_error() {
        let schema = Schema::from_json(CARD_SCHEMA).unwrap();
        let sheet = Sheet::new(vec![
            vec![],
            vec![],
            vec![
                Cell::Text("Fecha".into()),
                Cell::Text("Descripción".into()),
                Cell::Text("Monto".into()),
            ],
            vec![Cell::Number(1e18), Cell::Text("LIDER".into()), Cell::Number(10.0)],
        ]);
        let err = TabularDecoder::new(&schema)
            .unwrap()
            .decode(&sheet)
            .unwrap_err();
        assert!(matches!(err, ConvertError::DateParse { row: 4, ref field, .. } if field == "date"));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let sheet = card_sheet(&[
            ["01/07/2025", "LIDER", "", "15990"],
            ["", "", "", ""],
            ["02/07/2025", "COPEC", "", "32000"],
        ]);
        let rows = decode(CARD_SCHEMA, &sheet).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].source_row, 6);
    }

    #[test]
    fn test_sheet_from_csv() {
        let csv = "Preamble\n,\nFecha,Descripción,Ciudad,Monto\n01/07/2025,\"A, B\",X,10\n";
        let sheet = Sheet::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(sheet.rows.len(), 4);
        let rows = decode(CARD_SCHEMA, &sheet).unwrap();
        assert_eq!(rows[0].text("description"), Some("A, B"));
    }

    #[test]
    fn test_missing_header_row_is_error() {
        let sheet = Sheet::from_text_rows(vec![vec!["only row"]]);
        assert!(decode(CARD_SCHEMA, &sheet).is_err());
    }
}
