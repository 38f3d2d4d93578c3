//! Fixed-width text decoder.
//!
//! Each line is sliced into fields at the character offsets the schema
//! declares. Statement exports occasionally write a description longer than
//! its nominal width; when a line overflows the schema, fields flagged
//! `grow_to_fit` absorb the extra characters and every later field is read
//! further to the right.

use crate::amount::Amount;
use crate::dates::parse_date;
use crate::error::{ConvertError, Result};
use crate::record::{Coercion, FieldValue, RawRow};
use crate::schema::{FieldKind, ReaderType, Schema};
use log::{debug, warn};
use std::borrow::Cow;
use std::str::FromStr;

/// Decoder behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Treat unparseable dates and decimals as errors instead of
    /// substituting the raw text or zero.
    pub strict: bool,
}

/// Position of one field within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: usize,
    /// 1-based start offset.
    pub start: usize,
    pub length: usize,
    pub grow_to_fit: bool,
}

/// Decodes fixed-width lines according to a `txt` schema.
pub struct FixedWidthDecoder<'a> {
    schema: &'a Schema,
    layout: Vec<Column>,
    expected_length: usize,
    options: DecodeOptions,
}

impl<'a> FixedWidthDecoder<'a> {
    /// Builds the nominal layout. Every field must declare `start` and `length`.
    pub fn new(schema: &'a Schema, options: DecodeOptions) -> Result<Self> {
        if schema.reader_type() != ReaderType::Txt {
            return Err(ConvertError::schema(
                "fixed-width decoding requires reader_type 'txt'",
            ));
        }

        let mut layout = Vec::with_capacity(schema.fields().len());
        for (i, field) in schema.fields().iter().enumerate() {
            let (Some(start), Some(length)) = (field.start, field.length) else {
                return Err(ConvertError::schema(format!(
                    "fixed-width field '{}' needs both start and length",
                    field.name
                )));
            };
            layout.push(Column {
                field: i,
                start,
                length,
                grow_to_fit: field.grow_to_fit,
            });
        }

        let expected_length = layout
            .iter()
            .try_fold(0usize, |total, c| total.checked_add(c.length))
            .ok_or_else(|| ConvertError::schema("fixed-width field lengths overflow"))?;
        Ok(FixedWidthDecoder {
            schema,
            layout,
            expected_length,
            options,
        })
    }

    /// Sum of all field lengths.
    pub fn expected_length(&self) -> usize {
        self.expected_length
    }

    /// Layout to use for a line of `line_length` characters.
    ///
    /// Lines no longer than the nominal length use the schema as declared.
    /// Otherwise each `grow_to_fit` field is widened by the full overflow and
    /// every other field after the first growing one starts that much later.
    pub fn layout_for(&self, line_length: usize) -> Cow<'_, [Column]> {
        if line_length <= self.expected_length {
            return Cow::Borrowed(&self.layout);
        }

        let diff = line_length - self.expected_length;
        let mut found = false;
        let adjusted: Vec<Column> = self
            .layout
            .iter()
            .map(|column| {
                let mut column = column.clone();
                if column.grow_to_fit {
                    column.length = column.length.saturating_add(diff);
                    found = true;
                } else if found {
                    column.start = column.start.saturating_add(diff);
                }
                column
            })
            .collect();
        Cow::Owned(adjusted)
    }

    /// Decodes a whole text blob, one record per non-blank line.
    pub fn decode_str(&self, text: &str) -> Result<Vec<RawRow>> {
        self.decode_lines(text.lines())
    }

    /// Decodes lines in order. Blank lines are skipped but still counted
    /// for line numbers.
    pub fn decode_lines<I, S>(&self, lines: I) -> Result<Vec<RawRow>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rows = Vec::new();
        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            rows.push(self.decode_line(idx + 1, line)?);
        }
        debug!("Decoded {} fixed-width records", rows.len());
        Ok(rows)
    }

    /// Decodes a single line; `line_no` is used in errors and logs.
    pub fn decode_line(&self, line_no: usize, line: &str) -> Result<RawRow> {
        let chars: Vec<char> = line.chars().collect();
        let layout = self.layout_for(chars.len());
        if let Cow::Owned(_) = layout {
            debug!(
                "Line {}: {} characters exceeds nominal {}, growing fields",
                line_no,
                chars.len(),
                self.expected_length
            );
        }

        let mut row = RawRow::new(line_no);
        for column in layout.iter() {
            let field = &self.schema.fields()[column.field];
            let raw = slice_field(&chars, column.start, column.length);
            let raw = raw.trim();

            let coerced = coerce(raw, &field.kind);
            if coerced.fell_back() {
                if self.options.strict {
                    return Err(ConvertError::InvalidValue {
                        row: line_no,
                        field: field.name.clone(),
                        value: raw.to_string(),
                    });
                }
                warn!(
                    "Line {}: field '{}' value '{}' could not be parsed, using fallback",
                    line_no, field.name, raw
                );
                row.record_fallback(&field.name);
            }
            row.insert(field.name.clone(), coerced.into_value());
        }

        if self.schema.has_field("sign")
            && self.schema.has_field("amount")
            && row.text("sign") == Some("-")
        {
            row.negate("amount");
        }

        Ok(row)
    }
}

/// Characters `[start-1, start-1+length)` of the line, or an empty string
/// when that range does not lie entirely within the line.
fn slice_field(chars: &[char], start: usize, length: usize) -> String {
    let Some(begin) = start.checked_sub(1) else {
        return String::new();
    };
    match begin.checked_add(length) {
        Some(end) if begin < chars.len() && end <= chars.len() => {
            chars[begin..end].iter().collect()
        }
        _ => String::new(),
    }
}

/// Lenient coercion of trimmed text to a field kind.
///
/// Dates that do not match keep their raw text; decimals that do not parse
/// become zero. An empty slice stays empty text whatever its kind.
pub fn coerce(raw: &str, kind: &FieldKind) -> Coercion {
    match kind {
        FieldKind::String => Coercion::Parsed(FieldValue::Text(raw.to_string())),
        _ if raw.is_empty() => Coercion::Parsed(FieldValue::Text(String::new())),
        FieldKind::Date { format } => match parse_date(raw, format) {
            Some(date) => Coercion::Parsed(FieldValue::Date(date)),
            None => Coercion::FellBack(FieldValue::Text(raw.to_string())),
        },
        FieldKind::Decimal => match Amount::from_str(raw) {
            Ok(amount) => Coercion::Parsed(FieldValue::Amount(amount)),
            Err(_) => Coercion::FellBack(FieldValue::Amount(Amount::ZERO)),
        },
    }
}
