//! Field schema: the declarative description of a statement format.
//!
//! A schema is a JSON object with a `__config__` block and one entry per
//! field. Field order in the file is significant: the fixed-width decoder
//! shifts every field declared after a growing field, so the schema keeps
//! an ordered list of definitions alongside a name index.

use crate::error::{ConvertError, Result};
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Key of the configuration block inside a schema document.
pub const CONFIG_KEY: &str = "__config__";

/// Which decoder a schema is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderType {
    /// Fixed-width text records.
    Txt,
    /// Spreadsheet table.
    Xlsx,
}

impl ReaderType {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "txt" => Some(ReaderType::Txt),
            "xlsx" => Some(ReaderType::Xlsx),
            _ => None,
        }
    }
}

/// Global schema settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    pub reader_type: ReaderType,
    /// Leading spreadsheet rows to skip before the header row.
    pub skiprows: usize,
}

/// How a field's raw text is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Date { format: String },
    Decimal,
}

/// Negate the amount when `column_name` contains `value`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentRule {
    #[serde(default = "default_companion_column")]
    pub column_name: String,
    #[serde(default)]
    pub value: String,
}

fn default_companion_column() -> String {
    "description".to_string()
}

/// One field of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    /// 1-based offset into a fixed-width line.
    pub start: Option<usize>,
    pub length: Option<usize>,
    pub kind: FieldKind,
    pub grow_to_fit: bool,
    /// Source spreadsheet header.
    pub column_name: Option<String>,
    pub amount_is_payment_if_contains: Option<PaymentRule>,
    pub reverse_amount: bool,
}

/// Field entry as written in the JSON document.
#[derive(Debug, Deserialize)]
struct RawField {
    start: Option<usize>,
    length: Option<usize>,
    #[serde(rename = "type")]
    kind: Option<String>,
    format: Option<String>,
    #[serde(default)]
    grow_to_fit: bool,
    column_name: Option<String>,
    amount_is_payment_if_contains: Option<PaymentRule>,
    #[serde(default)]
    reverse_amount: bool,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    reader_type: Option<String>,
    #[serde(default)]
    skiprows: usize,
}

impl RawField {
    fn into_definition(self, name: &str) -> Result<FieldDefinition> {
        let kind = match self.kind.as_deref().unwrap_or("string") {
            "string" => FieldKind::String,
            "decimal" => FieldKind::Decimal,
            "date" => match self.format {
                Some(format) => FieldKind::Date { format },
                None => {
                    return Err(ConvertError::schema(format!(
                        "date field '{}' has no format",
                        name
                    )))
                }
            },
            other => {
                return Err(ConvertError::schema(format!(
                    "field '{}' has unknown type '{}'",
                    name, other
                )))
            }
        };

        Ok(FieldDefinition {
            name: name.to_string(),
            start: self.start,
            length: self.length,
            kind,
            grow_to_fit: self.grow_to_fit,
            column_name: self.column_name,
            amount_is_payment_if_contains: self.amount_is_payment_if_contains,
            reverse_amount: self.reverse_amount,
        })
    }
}

/// An ordered, immutable set of field definitions plus configuration.
#[derive(Debug, Clone)]
pub struct Schema {
    config: SchemaConfig,
    fields: Vec<FieldDefinition>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Builds a schema from already-constructed definitions.
    pub fn new(config: SchemaConfig, fields: Vec<FieldDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if field.start == Some(0) {
                return Err(ConvertError::schema(format!(
                    "field '{}' has start 0; offsets are 1-based",
                    field.name
                )));
            }
            if index.insert(field.name.clone(), i).is_some() {
                return Err(ConvertError::schema(format!(
                    "field '{}' is declared twice",
                    field.name
                )));
            }
        }

        let growing = fields.iter().filter(|f| f.grow_to_fit).count();
        if growing > 1 {
            warn!(
                "Schema declares {} grow_to_fit fields; each one grows by the full overflow",
                growing
            );
        }

        Ok(Schema {
            config,
            fields,
            index,
        })
    }

    /// Parses a schema from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| ConvertError::schema(format!("invalid JSON: {}", e)))?;
        Self::from_value(document)
    }

    /// Parses a schema from a JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: Value = serde_json::from_reader(reader)
            .map_err(|e| ConvertError::schema(format!("invalid JSON: {}", e)))?;
        Self::from_value(document)
    }

    /// Reads and parses a schema file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::schema(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    fn from_value(document: Value) -> Result<Self> {
        let Value::Object(entries) = document else {
            return Err(ConvertError::schema("schema must be a JSON object"));
        };

        let mut config = None;
        let mut fields = Vec::with_capacity(entries.len());
        for (name, entry) in entries {
            if name == CONFIG_KEY {
                let raw: RawConfig = serde_json::from_value(entry)
                    .map_err(|e| ConvertError::schema(format!("invalid {}: {}", CONFIG_KEY, e)))?;
                let reader = raw
                    .reader_type
                    .ok_or_else(|| ConvertError::schema("config.reader_type is missing"))?;
                let reader_type = ReaderType::parse(&reader).ok_or_else(|| {
                    ConvertError::schema(format!("unknown reader type '{}'", reader))
                })?;
                config = Some(SchemaConfig {
                    reader_type,
                    skiprows: raw.skiprows,
                });
                continue;
            }

            let raw: RawField = serde_json::from_value(entry)
                .map_err(|e| ConvertError::schema(format!("invalid field '{}': {}", name, e)))?;
            fields.push(raw.into_definition(&name)?);
        }

        let config = config
            .ok_or_else(|| ConvertError::schema(format!("{} block is missing", CONFIG_KEY)))?;
        Schema::new(config, fields)
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn reader_type(&self) -> ReaderType {
        self.config.reader_type
    }

    /// Field definitions in declaration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}
