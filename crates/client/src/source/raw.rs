//! Loosely-typed views of upstream catalog records.
//!
//! Storefront feeds disagree on field names and types (Shopify sends numeric
//! ids and string prices, WooCommerce-style feeds send `name` instead of
//! `title`, tags arrive as arrays or comma-separated strings). Every field
//! here is optional and type-tolerant; the normalizer decides defaults.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProduct {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub body_html: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vendor: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_type: Option<String>,
    #[serde(default, rename = "productType", deserialize_with = "lenient_string")]
    pub product_type_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub handle: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub variants: Vec<RawVariant>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub images: Vec<RawImage>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVariant {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub available: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub option1: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub option2: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub option3: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub compare_at_price: Option<String>,
    #[serde(default)]
    pub featured_image: Option<RawImageRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub src: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub alt: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub position: Option<u64>,
}

impl RawImage {
    pub fn location(&self) -> Option<&str> {
        non_empty(self.src.as_deref()).or_else(|| non_empty(self.url.as_deref()))
    }
}

/// An image given either as a bare URL or as an object carrying one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawImageRef {
    Url(String),
    Object(RawImage),
    Other(Value),
}

impl RawImageRef {
    pub fn location(&self) -> Option<&str> {
        match self {
            RawImageRef::Url(url) => non_empty(Some(url)),
            RawImageRef::Object(image) => image.location(),
            RawImageRef::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCollection {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub handle: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub body_html: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub products_count: Option<u64>,
    #[serde(default)]
    pub image: Option<RawImageRef>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_at: Option<String>,
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let tags = match Value::deserialize(deserializer)? {
        Value::String(s) => s.split(',').map(|t| t.trim().to_string()).collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(map) => map.get("name").and_then(Value::as_str).map(|s| s.trim().to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(tags.into_iter().filter(|t: &String| !t.is_empty()).collect())
}

/// A list whose malformed or null entries are dropped instead of failing the record.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shopify_shapes() {
        let raw: RawProduct = serde_json::from_value(json!({
            "id": 7012345678901_u64,
            "title": "Shield",
            "tags": "sport, polarized ,",
            "variants": [{"id": 1, "price": "129.00", "available": true}],
            "images": [{"id": 9, "src": "https://cdn.example/shield.jpg", "position": 1}]
        }))
        .unwrap();

        assert_eq!(raw.id.as_deref(), Some("7012345678901"));
        assert_eq!(raw.tags, vec!["sport", "polarized"]);
        assert_eq!(raw.variants[0].price.as_deref(), Some("129.00"));
        assert!(raw.variants[0].available);
        assert_eq!(raw.images[0].location(), Some("https://cdn.example/shield.jpg"));
        assert_eq!(raw.images[0].position, Some(1));
    }

    #[test]
    fn test_woocommerce_shapes() {
        let raw: RawProduct = serde_json::from_value(json!({
            "id": "42",
            "name": "Dragon",
            "tags": [{"name": "lifestyle"}, "audio"],
            "variants": [{"price": 89, "available": "true"}],
            "images": [{"url": "https://cdn.example/dragon.png"}]
        }))
        .unwrap();

        assert_eq!(raw.name.as_deref(), Some("Dragon"));
        assert_eq!(raw.tags, vec!["lifestyle", "audio"]);
        assert_eq!(raw.variants[0].price.as_deref(), Some("89"));
        assert!(raw.variants[0].available);
        assert_eq!(raw.images[0].location(), Some("https://cdn.example/dragon.png"));
    }

    #[test]
    fn test_nulls_and_garbage_are_tolerated() {
        let raw: RawProduct = serde_json::from_value(json!({
            "id": 1,
            "title": null,
            "tags": null,
            "variants": null,
            "images": [null, {"src": ""}, 3]
        }))
        .unwrap();

        assert!(raw.title.is_none());
        assert!(raw.tags.is_empty());
        assert!(raw.variants.is_empty());
        assert_eq!(raw.images.len(), 1);
        assert_eq!(raw.images[0].location(), None);
    }

    #[test]
    fn test_collection_image_forms() {
        let with_string: RawCollection =
            serde_json::from_value(json!({"id": 1, "image": "https://cdn.example/a.jpg"})).unwrap();
        assert_eq!(with_string.image.unwrap().location(), Some("https://cdn.example/a.jpg"));

        let with_object: RawCollection =
            serde_json::from_value(json!({"id": 2, "image": {"src": "https://cdn.example/b.jpg"}})).unwrap();
        assert_eq!(with_object.image.unwrap().location(), Some("https://cdn.example/b.jpg"));

        let with_number: RawCollection = serde_json::from_value(json!({"id": 3, "image": 5})).unwrap();
        assert_eq!(with_number.image.unwrap().location(), None);

        let counted: RawCollection = serde_json::from_value(json!({"id": 4, "products_count": "12"})).unwrap();
        assert_eq!(counted.products_count, Some(12));
    }
}
