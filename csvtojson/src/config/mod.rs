//! Settings for a single transform invocation.
//!
//! [`Settings`] is immutable once built. [`SettingsBuilder`] applies setters in
//! call order, so a later call for the same field replaces the earlier one.
//! Nothing is validated here: the header checks need the header row, which is
//! only known once the source is read.
//!
//! # Absent vs empty mapping
//!
//! | `field_mapping`     | Effect                                   |
//! |---------------------|------------------------------------------|
//! | `None`              | every header is emitted under its name   |
//! | `Some({})`          | no field is emitted, each row is `{}`    |
//! | `Some({a: b, ..})`  | only mapped headers, renamed             |
//!
//! # Example
//!
//! ```rust,ignore
//! use csvtojson::SettingsBuilder;
//!
//! let settings = SettingsBuilder::new()
//!     .separator('|')
//!     .field_mapping([("field1", "id"), ("field2", "name")])
//!     .build();
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Default field separator.
pub const DEFAULT_SEPARATOR: char = ',';

/// Header name -> output key, or static key -> static value.
pub type StringMap = BTreeMap<String, String>;

/// Resolved, read-only options for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Field separator (one code point)
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Optional header renaming; restricts output to mapped headers
    #[serde(default, rename = "mapping")]
    pub field_mapping: Option<StringMap>,

    /// Optional static key/value pairs added to every output object
    #[serde(default, rename = "inject")]
    pub injection: Option<StringMap>,
}

fn default_separator() -> char {
    DEFAULT_SEPARATOR
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            field_mapping: None,
            injection: None,
        }
    }
}

impl Settings {
    /// Start a builder seeded with the defaults.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Load settings from a JSON file (`{"separator": ";", "mapping": {...}, "inject": {...}}`).
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse settings from a JSON document. Missing keys take their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|source| ConfigError::InvalidJson {
            flag: "settings",
            source,
        })
    }

    /// The separator as the single byte the CSV reader works with.
    ///
    /// Fails for separators outside ASCII and for the characters the
    /// delimited-text grammar reserves.
    pub fn delimiter(&self) -> ConfigResult<u8> {
        let sep = self.separator;
        if !sep.is_ascii() {
            return Err(ConfigError::InvalidSeparator(
                sep.to_string(),
                "only single-byte (ASCII) separators are supported",
            ));
        }
        match sep {
            '"' | '\r' | '\n' => Err(ConfigError::InvalidSeparator(
                sep.to_string(),
                "quote and line-break characters cannot separate fields",
            )),
            _ => Ok(sep as u8),
        }
    }
}

/// Builder for [`Settings`]. Setters overwrite; last write wins.
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.settings.separator = separator;
        self
    }

    /// Set the header mapping. An empty iterator yields a present-but-empty mapping.
    pub fn field_mapping<K, V>(mut self, mapping: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.settings.field_mapping = Some(collect_map(mapping));
        self
    }

    /// Set or clear the header mapping.
    pub fn field_mapping_opt(mut self, mapping: Option<StringMap>) -> Self {
        self.settings.field_mapping = mapping;
        self
    }

    pub fn injection<K, V>(mut self, injection: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.settings.injection = Some(collect_map(injection));
        self
    }

    /// Set or clear the injection.
    pub fn injection_opt(mut self, injection: Option<StringMap>) -> Self {
        self.settings.injection = injection;
        self
    }

    /// Replace every field with the values of `settings`.
    pub fn merge(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}

fn collect_map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> StringMap
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// =============================================================================
// Boundary parsing (CLI flags, environment)
// =============================================================================

/// Parse a separator flag: exactly one code point.
pub fn parse_separator(raw: &str) -> ConfigResult<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        (None, _) => Err(ConfigError::InvalidSeparator(raw.to_string(), "separator is empty")),
        (Some(_), Some(_)) => Err(ConfigError::InvalidSeparator(
            raw.to_string(),
            "separator must be a single character",
        )),
    }
}

/// Parse a JSON object of strings.
///
/// An empty (or blank) flag means "not provided" and yields `None`;
/// `{}` yields `Some` of an empty map.
pub fn parse_string_map(flag: &'static str, raw: &str) -> ConfigResult<Option<StringMap>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|source| ConfigError::InvalidJson { flag, source })
}

/// Parse a timeout like `250ms`, `2s`, `1m`, `1h` or a bare number of seconds.
///
/// Zero means "no timeout" and yields `None`.
pub fn parse_timeout(raw: &str) -> ConfigResult<Option<Duration>> {
    let raw = raw.trim();
    let invalid = || ConfigError::InvalidTimeout(raw.to_string());

    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    let value: f64 = number.parse().map_err(|_| invalid())?;

    let secs = match unit.trim() {
        "" | "s" => value,
        "ms" => value / 1000.0,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        _ => return Err(invalid()),
    };

    if secs == 0.0 {
        Ok(None)
    } else {
        Duration::try_from_secs_f64(secs).map(Some).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.separator, ',');
        assert!(settings.field_mapping.is_none());
        assert!(settings.injection.is_none());
    }

    #[test]
    fn test_builder_last_write_wins() {
        let settings = SettingsBuilder::new()
            .separator(';')
            .field_mapping([("a", "x")])
            .separator('|')
            .field_mapping([("b", "y")])
            .build();

        assert_eq!(settings.separator, '|');
        let mapping = settings.field_mapping.unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["b"], "y");
    }

    #[test]
    fn test_empty_mapping_is_not_absent() {
        let settings = SettingsBuilder::new()
            .field_mapping(Vec::<(String, String)>::new())
            .build();
        assert_eq!(settings.field_mapping, Some(StringMap::new()));
    }

    #[test]
    fn test_merge_then_override() {
        let file = Settings::from_json(r#"{"separator": ";", "inject": {"src": "file"}}"#).unwrap();
        let settings = SettingsBuilder::new()
            .merge(file)
            .injection([("src", "flag")])
            .build();

        assert_eq!(settings.separator, ';');
        assert_eq!(settings.injection.unwrap()["src"], "flag");
        assert!(settings.field_mapping.is_none());
    }

    #[test]
    fn test_from_json_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());

        let settings = Settings::from_json(r#"{"mapping": {}}"#).unwrap();
        assert_eq!(settings.field_mapping, Some(StringMap::new()));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"mapping": {"field1": "id"}}"#).unwrap();

        let settings = Settings::from_json_file(&path).unwrap();
        assert_eq!(settings.field_mapping.unwrap()["field1"], "id");

        let missing = Settings::from_json_file(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_delimiter() {
        assert_eq!(Settings::default().delimiter().unwrap(), b',');
        let tab = SettingsBuilder::new().separator('\t').build();
        assert_eq!(tab.delimiter().unwrap(), b'\t');

        let unicode = SettingsBuilder::new().separator('§').build();
        assert!(unicode.delimiter().is_err());
        let quote = SettingsBuilder::new().separator('"').build();
        assert!(quote.delimiter().is_err());
    }

    #[test]
    fn test_parse_separator() {
        assert_eq!(parse_separator("|").unwrap(), '|');
        assert_eq!(parse_separator("é").unwrap(), 'é');
        assert!(parse_separator("").is_err());
        assert!(parse_separator(";;").is_err());
    }

    #[test]
    fn test_parse_string_map() {
        assert_eq!(parse_string_map("mapping", "").unwrap(), None);
        assert_eq!(parse_string_map("mapping", "{}").unwrap(), Some(StringMap::new()));

        let map = parse_string_map("inject", r#"{"k": "v"}"#).unwrap().unwrap();
        assert_eq!(map["k"], "v");

        let err = parse_string_map("inject", r#"{"k": 1}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid inject json"));
        assert!(parse_string_map("mapping", "[1, 2]").is_err());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("0").unwrap(), None);
        assert_eq!(parse_timeout("0s").unwrap(), None);
        assert_eq!(parse_timeout("2").unwrap(), Some(Duration::from_secs(2)));
        assert_eq!(parse_timeout("250ms").unwrap(), Some(Duration::from_millis(250)));
        assert_eq!(parse_timeout("1.5s").unwrap(), Some(Duration::from_millis(1500)));
        assert_eq!(parse_timeout("2m").unwrap(), Some(Duration::from_secs(120)));
        assert_eq!(parse_timeout("1h").unwrap(), Some(Duration::from_secs(3600)));
        assert!(parse_timeout("soon").is_err());
        assert!(parse_timeout("5d").is_err());
        assert!(parse_timeout("").is_err());
    }
}
