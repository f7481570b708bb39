//! Index Schema Versions
//!
//! Persisted documents carry `index_metadata.version`. Every version the
//! loader understands is a variant here; anything else is rejected rather
//! than half-read. Version 3 documents stored a single file id per name in
//! the function/class lookups and are upgraded in place on load.
//!
//! @module index/schema

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::info;

use crate::core::error::{Error, Result};

/// Oldest version the loader will accept (after migration)
pub const MINIMUM_SUPPORTED: &str = "3.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaVersion {
    /// Single id per name in lookups, no qualified-name relationships
    V3,
    /// Duplicate-safe id lists and qualified-name relationships
    V4,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::V4;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V3 => "3.0",
            Self::V4 => "4.0",
        }
    }

    /// Parse a `major.minor` version string
    pub fn parse(version: &str) -> Result<Self> {
        let unsupported = || Error::UnsupportedSchema {
            version: version.to_string(),
            minimum: MINIMUM_SUPPORTED,
        };

        let major = version
            .trim()
            .split('.')
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(unsupported)?;

        match major {
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            _ => Err(unsupported()),
        }
    }

    pub fn is_current(&self) -> bool {
        *self == Self::CURRENT
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SchemaVersion::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Read the version recorded in a raw index document
pub fn document_version(doc: &Value) -> Result<SchemaVersion> {
    let version = doc
        .pointer("/index_metadata/version")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::IndexError {
            message: "Index document has no index_metadata.version".to_string(),
        })?;
    SchemaVersion::parse(version)
}

/// Bring a raw document up to the current schema.
///
/// Returns the version the document was written with.
pub fn migrate(doc: &mut Value) -> Result<SchemaVersion> {
    let original = document_version(doc)?;

    if original == SchemaVersion::V3 {
        info!(from = original.as_str(), to = SchemaVersion::CURRENT.as_str(), "Upgrading index document");
        upgrade_v3(doc);
    }

    Ok(original)
}

/// v3 -> v4: wrap scalar lookup ids into lists and fill the new metadata flags
fn upgrade_v3(doc: &mut Value) {
    for table in ["function_to_file_id", "class_to_file_id"] {
        if let Some(Value::Object(map)) = doc.pointer_mut(&format!("/lookups/{}", table)) {
            for value in map.values_mut() {
                if value.is_u64() {
                    *value = Value::Array(vec![value.take()]);
                }
            }
        }
    }

    if let Some(Value::Object(meta)) = doc.get_mut("index_metadata") {
        meta.insert(
            "version".to_string(),
            Value::String(SchemaVersion::CURRENT.as_str().to_string()),
        );
        meta.insert("duplicate_names_support".to_string(), Value::Bool(true));
        meta.insert("qualified_names_support".to_string(), Value::Bool(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_versions() {
        assert_eq!(SchemaVersion::parse("4.0").unwrap(), SchemaVersion::V4);
        assert_eq!(SchemaVersion::parse("4.2").unwrap(), SchemaVersion::V4);
        assert_eq!(SchemaVersion::parse("3.1").unwrap(), SchemaVersion::V3);
        assert!(matches!(
            SchemaVersion::parse("2.0"),
            Err(Error::UnsupportedSchema { .. })
        ));
        assert!(SchemaVersion::parse("5.0").is_err());
        assert!(SchemaVersion::parse("banana").is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&SchemaVersion::V4).unwrap();
        assert_eq!(json, "\"4.0\"");
        let back: SchemaVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SchemaVersion::V4);
        assert!(serde_json::from_str::<SchemaVersion>("\"1.0\"").is_err());
    }

    #[test]
    fn test_migrate_v3_wraps_scalar_lookups() {
        let mut doc = json!({
            "lookups": {
                "function_to_file_id": {"main": 0, "helper": [1, 2]},
                "class_to_file_id": {"App": 3}
            },
            "index_metadata": {"version": "3.0"}
        });

        let original = migrate(&mut doc).unwrap();
        assert_eq!(original, SchemaVersion::V3);
        assert_eq!(doc["lookups"]["function_to_file_id"]["main"], json!([0]));
        assert_eq!(doc["lookups"]["function_to_file_id"]["helper"], json!([1, 2]));
        assert_eq!(doc["lookups"]["class_to_file_id"]["App"], json!([3]));
        assert_eq!(doc["index_metadata"]["version"], json!("4.0"));
    }

    #[test]
    fn test_migrate_rejects_missing_version() {
        let mut doc = json!({"index_metadata": {}});
        assert!(migrate(&mut doc).is_err());
    }
}
