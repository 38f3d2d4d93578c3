//! One conversion run: decode a statement with its schema, normalize the
//! rows and write canonical CSV.
//!
//! The converter owns the schema for the duration of the run. Which decoder
//! runs is decided by the schema's `reader_type`.

use crate::error::{ConvertError, Result};
use crate::fixed_width::{DecodeOptions, FixedWidthDecoder};
use crate::normalize::normalize;
use crate::record::RawRow;
use crate::schema::{ReaderType, Schema};
use crate::tabular::{Sheet, TabularDecoder};
use crate::transaction::CanonicalTransaction;
use log::info;
use std::io::{Read, Write};
use std::path::Path;

/// Converts statements of one format to canonical transactions.
pub struct StatementConverter {
    schema: Schema,
    options: DecodeOptions,
}

impl StatementConverter {
    /// Creates a lenient converter for the given schema.
    pub fn new(schema: Schema) -> Self {
        StatementConverter {
            schema,
            options: DecodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Decodes fixed-width text without normalizing.
    pub fn decode_text(&self, text: &str) -> Result<Vec<RawRow>> {
        FixedWidthDecoder::new(&self.schema, self.options)?.decode_str(text)
    }

    /// Decodes a sheet without normalizing.
    pub fn decode_sheet(&self, sheet: &Sheet) -> Result<Vec<RawRow>> {
        TabularDecoder::new(&self.schema)?.decode(sheet)
    }

    /// Converts fixed-width text.
    pub fn convert_text(&self, text: &str) -> Result<Vec<CanonicalTransaction>> {
        self.finish(self.decode_text(text)?)
    }

    /// Converts a fixed-width statement read from `reader`, typically stdin.
    pub fn convert_reader<R: Read>(&self, mut reader: R) -> Result<Vec<CanonicalTransaction>> {
        if self.schema.reader_type() != ReaderType::Txt {
            return Err(ConvertError::UnsupportedInput(
                "spreadsheet statements must be given as a file path".to_string(),
            ));
        }
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        self.convert_text(&text)
    }

    /// Converts a sheet.
    pub fn convert_sheet(&self, sheet: &Sheet) -> Result<Vec<CanonicalTransaction>> {
        self.finish(self.decode_sheet(sheet)?)
    }

    /// Converts a statement file using the decoder the schema asks for.
    pub fn convert_file(&self, path: &Path) -> Result<Vec<CanonicalTransaction>> {
        match self.schema.reader_type() {
            ReaderType::Txt => {
                let text = std::fs::read_to_string(path)?;
                self.convert_text(&text)
            }
            ReaderType::Xlsx => self.convert_sheet(&Sheet::open(path)?),
        }
    }

    fn finish(&self, rows: Vec<RawRow>) -> Result<Vec<CanonicalTransaction>> {
        let fallbacks = rows.iter().filter(|r| !r.fallbacks().is_empty()).count();
        let decoded = rows.len();
        let transactions = normalize(rows)?;
        info!(
            "Converted {} transactions from {} records ({} with fallback values)",
            transactions.len(),
            decoded,
            fallbacks
        );
        Ok(transactions)
    }
}

/// Writes transactions as CSV with the canonical header.
pub fn write_output<W: Write>(transactions: &[CanonicalTransaction], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for tx in transactions {
        csv_writer.serialize(tx)?;
    }
    csv_writer.flush()?;
    Ok(())
}
