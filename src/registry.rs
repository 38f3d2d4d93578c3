//! Named statement formats and where their schemas live.

use crate::error::{ConvertError, Result};
use crate::schema::Schema;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Format used when none is requested.
pub const DEFAULT_FORMAT: &str = "banco_de_chile_cuenta_corriente_txt";

/// Formats with a bundled schema file.
pub const BUILTIN_FORMATS: [&str; 3] = [
    "banco_de_chile_cuenta_corriente_txt",
    "banco_de_chile_tarjeta_credito_no_facturados_xls",
    "banco_de_chile_tarjeta_credito_facturados_xls",
];

/// Directory holding the bundled schema files.
pub fn default_schema_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/schemas"))
}

/// Read-only mapping from format name to schema file.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: BTreeMap<String, PathBuf>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the bundled formats, resolved as `<dir>/<name>.json`.
    pub fn with_builtin(dir: &Path) -> Self {
        let entries = BUILTIN_FORMATS
            .iter()
            .map(|name| (name.to_string(), dir.join(format!("{}.json", name))))
            .collect();
        SchemaRegistry { entries }
    }

    pub fn register(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.entries.insert(name.into(), path.into());
        self
    }

    pub fn resolve(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Loads the schema for a format name, or for a schema file path when
    /// the name is not registered.
    pub fn load(&self, name_or_path: &str) -> Result<Schema> {
        let path = match self.resolve(name_or_path) {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = PathBuf::from(name_or_path);
                if !candidate.is_file() {
                    return Err(ConvertError::UnknownFormat(name_or_path.to_string()));
                }
                candidate
            }
        };
        debug!("Loading schema '{}' from {}", name_or_path, path.display());
        Schema::load(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ReaderType;
    use std::io::Write;

    #[test]
    fn test_builtin_entries_resolve_under_dir() {
        let registry = SchemaRegistry::with_builtin(Path::new("/etc/cartolas"));
        assert_eq!(
            registry.resolve(DEFAULT_FORMAT),
            Some(Path::new(
                "/etc/cartolas/banco_de_chile_cuenta_corriente_txt.json"
            ))
        );
        assert_eq!(registry.names().count(), 3);
        assert!(registry.resolve("unknown").is_none());
    }

    #[test]
    fn test_bundled_schemas_load() {
        let registry = SchemaRegistry::with_builtin(&default_schema_dir());
        let txt = registry.load(DEFAULT_FORMAT).unwrap();
        assert_eq!(txt.reader_type(), ReaderType::Txt);
        for name in &BUILTIN_FORMATS[1..] {
            let schema = registry.load(name).unwrap();
            assert_eq!(schema.reader_type(), ReaderType::Xlsx);
        }
    }

    #[test]
    fn test_unregistered_path_is_loaded_directly() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"__config__": {{"reader_type": "txt"}}}}"#).unwrap();

        let registry = SchemaRegistry::new();
        let schema = registry.load(file.path().to_str().unwrap()).unwrap();
        assert!(schema.fields().is_empty());
    }

    #[test]
    fn test_unknown_name_is_error() {
        let err = SchemaRegistry::new().load("no_such_format").unwrap_err();
        assert!(matches!(err, ConvertError::UnknownFormat(_)));
    }

    #[test]
    fn test_registered_name_with_missing_file_is_schema_error() {
        let registry = SchemaRegistry::new().register("custom", "/nonexistent/custom.json");
        let err = registry.load("custom").unwrap_err();
        assert!(matches!(err, ConvertError::Schema(_)));
    }
}
