//! Record types - the two shapes a crawler hands to the pipeline
//!
//! Every input line is exactly one of:
//! - `{"restaurants": {...}}`: restaurants discovered under a postcode
//! - `{"menu": {...}}`: a full restaurant page with categories, items and tags
//!
//! Anything else fails to decode and is reported as a classification error.

use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// A single scraped record, tagged by its top-level key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Record {
    /// Restaurant urls reachable from one customer postcode
    Restaurants(Discovery),
    /// A restaurant menu page
    Menu(MenuRecord),
}

impl Record {
    /// Decode one JSON line into a record
    pub fn from_json(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Restaurants(_) => RecordKind::Discovery,
            Record::Menu(_) => RecordKind::Menu,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Discovery,
    Menu,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Discovery => "discovery",
            RecordKind::Menu => "menu",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Restaurant-discovery payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    pub postcode: String,
    pub urls: Vec<String>,
}

/// Menu payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuRecord {
    pub url: String,
    pub name: String,
    /// Absent, null or unparseable ratings decode to `None`
    #[serde(default, deserialize_with = "lenient_rating")]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagEntry>,
    #[serde(default)]
    pub menu_categories: Vec<MenuCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub name: String,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// Price in minor currency units (pence)
    pub price: i64,
    #[serde(default)]
    pub is_popular: bool,
}

fn lenient_rating<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_rating))
}

/// Interpret a scraped rating value, yielding `None` for anything that is
/// not a finite number.
pub fn parse_rating(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(rating) if rating.is_finite() => Some(rating),
        _ => {
            if !value.is_null() {
                tracing::debug!("Discarding unparseable rating {}", value);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn test_decode_discovery() {
        let line = r#"{"restaurants": {"postcode": "NW1 8AB", "urls": ["https://r/menu/a", "https://r/menu/b"]}}"#;
        let record = Record::from_json(line).unwrap();

        assert_eq!(record.kind(), RecordKind::Discovery);
        match record {
            Record::Restaurants(d) => {
                assert_eq!(d.postcode, "NW1 8AB");
                assert_eq!(d.urls.len(), 2);
            }
            other => panic!("expected discovery, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_menu_with_defaults() {
        let line = r#"{"menu": {"url": "r1", "name": "X"}}"#;
        let record = Record::from_json(line).unwrap();

        let Record::Menu(menu) = record else { panic!("expected menu") };
        assert_eq!(menu.avg_rating, None);
        assert_eq!(menu.street_address, None);
        assert!(menu.tags.is_empty());
        assert!(menu.menu_categories.is_empty());
    }

    #[test]
    fn test_decode_menu_tags_and_products() {
        let line = json!({"menu": {
            "url": "r1", "name": "X", "avg_rating": 4.2,
            "street_address": "a", "description": "d",
            "tags": [{"name": "Vegan", "type": "Diet"}],
            "menu_categories": [{"name": "Mains", "products": [
                {"name": "Soup", "price": 500, "is_popular": true}
            ]}]
        }})
        .to_string();

        let Record::Menu(menu) = Record::from_json(&line).unwrap() else { panic!("expected menu") };
        assert_eq!(menu.avg_rating, Some(4.2));
        assert_eq!(menu.tags[0].tag_type, "Diet");
        assert_eq!(menu.menu_categories[0].products[0].price, 500);
        assert!(menu.menu_categories[0].products[0].is_popular);
    }

    #[test]
    fn test_rating_leniency() {
        assert_eq!(parse_rating(&json!("4.5")), Some(4.5));
        assert_eq!(parse_rating(&json!(" 3 ")), Some(3.0));
        assert_eq!(parse_rating(&json!("n/a")), None);
        assert_eq!(parse_rating(&json!("NaN")), None);
        assert_eq!(parse_rating(&json!(null)), None);
        assert_eq!(parse_rating(&json!([1])), None);
    }

    #[test]
    fn test_unknown_shape_is_classification_error() {
        let err = Record::from_json(r#"{"error": {"url": "https://r/menu/x"}}"#).unwrap_err();
        assert!(matches!(err, Error::Classification(_)));

        let err = Record::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::Classification(_)));

        // Right tag, wrong payload
        let err = Record::from_json(r#"{"restaurants": {"postcode": "X"}}"#).unwrap_err();
        assert!(matches!(err, Error::Classification(_)));
    }
}
