//! # Cartola Converter
//!
//! Converts bank statement exports ("cartolas") into canonical transaction
//! CSV (`date,amount,description,notes`) for budgeting tools.
//!
//! ## Design Principles
//!
//! - **Schema-driven**: a JSON field schema tells a generic decoder how to
//!   read each format; no bank-specific parsing code
//! - **Two readers**: fixed-width text records and spreadsheet tables
//! - **Exact amounts**: `rust_decimal` instead of floating point
//! - **Stateless**: every run is a pure transform of its input
//!
//! ## Example
//!
//! ```no_run
//! use cartola_converter::{write_output, SchemaRegistry, StatementConverter};
//! use cartola_converter::registry::{default_schema_dir, DEFAULT_FORMAT};
//!
//! let registry = SchemaRegistry::with_builtin(&default_schema_dir());
//! let converter = StatementConverter::new(registry.load(DEFAULT_FORMAT).unwrap());
//! let transactions = converter.convert_file("cartola.txt".as_ref()).unwrap();
//! write_output(&transactions, std::io::stdout()).unwrap();
//! ```

pub mod amount;
pub mod converter;
pub mod dates;
pub mod error;
pub mod fixed_width;
pub mod normalize;
pub mod record;
pub mod registry;
pub mod schema;
pub mod tabular;
pub mod transaction;

pub use amount::Amount;
pub use converter::{write_output, StatementConverter};
pub use error::{ConvertError, Result};
pub use fixed_width::{DecodeOptions, FixedWidthDecoder};
pub use normalize::normalize;
pub use record::{Coercion, FieldValue, RawRow};
pub use registry::SchemaRegistry;
pub use schema::{FieldDefinition, FieldKind, ReaderType, Schema};
pub use tabular::{Cell, Sheet, TabularDecoder};
pub use transaction::CanonicalTransaction;
