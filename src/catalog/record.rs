//! Medicine record model
//!
//! Records are immutable once loaded. Only `name` is searched; every other
//! field is carried through to responses unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: String,
    #[serde(default)]
    pub sku_id: Option<String>,
    /// Primary searchable text, never absent (may be empty)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    #[serde(default)]
    pub marketer_name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    #[serde(default)]
    pub pack_size_label: Option<String>,
    #[serde(default)]
    pub short_composition: Option<String>,
    #[serde(default)]
    pub is_discontinued: bool,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Accept prices as JSON numbers or numeric strings; blanks become absent
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid price '{}'", s)))
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid price value: {}",
            other
        ))),
    }
}

impl Medicine {
    /// Minimal record with only an id and a name
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sku_id: None,
            name: name.into(),
            manufacturer_name: None,
            marketer_name: None,
            kind: None,
            price: None,
            pack_size_label: None,
            short_composition: None,
            is_discontinued: false,
            available: true,
        }
    }
}
