//! Normalization from raw feed records to canonical catalog records.
//!
//! Normalization is pure apart from logging: the caller supplies the
//! `scraped_at` stamp. Missing optional fields become empty/absent/false;
//! only a record without an identifier is rejected.

use chameleo_core::{Collection, Error, Product, catalog::Image, catalog::Variant};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::source::raw::{RawCollection, RawImage, RawProduct, RawVariant, non_empty};

/// Normalizes one raw product record.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the record is not an object or has no id.
pub fn normalize_product(record: &Value, scraped_at: DateTime<Utc>) -> Result<Product, Error> {
    let raw: RawProduct = serde_json::from_value(record.clone())
        .map_err(|e| Error::InvalidInput(format!("unreadable product record: {e}")))?;

    let id = non_empty(raw.id.as_deref())
        .ok_or_else(|| Error::InvalidInput("product record has no id".into()))?
        .to_string();

    let (price_min, price_max) = price_range(&raw.variants);
    let available = raw.variants.iter().any(|v| v.available);
    let compare_at_price = raw
        .variants
        .first()
        .and_then(|v| v.compare_at_price.as_deref())
        .and_then(parse_price);

    let images: Vec<Image> = raw
        .images
        .iter()
        .enumerate()
        .filter_map(|(idx, image)| normalize_image(image, idx))
        .collect();
    let main_image = images.first().map(|image| image.url.clone());

    let name = non_empty(raw.title.as_deref())
        .or_else(|| non_empty(raw.name.as_deref()))
        .unwrap_or_default()
        .to_string();

    Ok(Product {
        id,
        name,
        description: raw.body_html.or(raw.description).unwrap_or_default(),
        vendor: raw.vendor.unwrap_or_default(),
        product_type: raw.product_type.or(raw.product_type_camel).unwrap_or_default(),
        handle: raw.handle.or(raw.slug).unwrap_or_default(),
        status: raw.status.unwrap_or_else(|| "active".to_string()),
        tags: raw.tags,
        price_min,
        price_max,
        compare_at_price,
        available,
        variants: raw.variants.into_iter().map(normalize_variant).collect(),
        images,
        main_image,
        published_at: raw.published_at,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        scraped_at,
    })
}

/// Normalizes one raw collection record.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the record is not an object or has no id.
pub fn normalize_collection(record: &Value, scraped_at: DateTime<Utc>) -> Result<Collection, Error> {
    let raw: RawCollection = serde_json::from_value(record.clone())
        .map_err(|e| Error::InvalidInput(format!("unreadable collection record: {e}")))?;

    let id = non_empty(raw.id.as_deref())
        .ok_or_else(|| Error::InvalidInput("collection record has no id".into()))?
        .to_string();

    let title = non_empty(raw.title.as_deref())
        .or_else(|| non_empty(raw.name.as_deref()))
        .unwrap_or_default()
        .to_string();

    Ok(Collection {
        id,
        title,
        handle: raw.handle.or(raw.slug).unwrap_or_default(),
        description: raw.description.or(raw.body_html).unwrap_or_default(),
        products_count: raw.products_count.unwrap_or(0),
        image_url: raw.image.as_ref().and_then(|i| i.location()).map(str::to_string),
        published_at: raw.published_at,
        updated_at: raw.updated_at,
        scraped_at,
    })
}

/// Normalizes a batch of product records, skipping ones that cannot be read.
pub fn normalize_products(records: &[Value], scraped_at: DateTime<Utc>) -> Vec<Product> {
    records
        .iter()
        .filter_map(|record| match normalize_product(record, scraped_at) {
            Ok(product) => {
                if !product.has_price() {
                    tracing::warn!(id = %product.id, name = %product.name, "product has no positive variant price; reported as 0");
                }
                Some(product)
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping product: normalization failed");
                None
            }
        })
        .collect()
}

/// Normalizes a batch of collection records, skipping ones that cannot be read.
pub fn normalize_collections(records: &[Value], scraped_at: DateTime<Utc>) -> Vec<Collection> {
    records
        .iter()
        .filter_map(|record| {
            normalize_collection(record, scraped_at)
                .map_err(|e| tracing::warn!(error = %e, "skipping collection: normalization failed"))
                .ok()
        })
        .collect()
}

/// Min and max over positive, parseable variant prices; `(0, 0)` if there are none.
fn price_range(variants: &[RawVariant]) -> (f64, f64) {
    variants
        .iter()
        .filter_map(|v| v.price.as_deref().and_then(parse_price))
        .filter(|price| *price > 0.0)
        .fold(None, |range: Option<(f64, f64)>, price| match range {
            Some((min, max)) => Some((min.min(price), max.max(price))),
            None => Some((price, price)),
        })
        .unwrap_or((0.0, 0.0))
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

fn normalize_variant(raw: RawVariant) -> Variant {
    Variant {
        id: raw.id.unwrap_or_default(),
        price: raw.price.unwrap_or_else(|| "0".to_string()),
        available: raw.available,
        name: raw.title.or(raw.name),
        option1: raw.option1,
        option2: raw.option2,
        option3: raw.option3,
        sku: raw.sku.filter(|s| !s.is_empty()),
        compare_at_price: raw.compare_at_price,
        featured_image: raw
            .featured_image
            .as_ref()
            .and_then(|i| i.location())
            .map(str::to_string),
    }
}

/// Images without a URL are dropped.
fn normalize_image(raw: &RawImage, idx: usize) -> Option<Image> {
    let url = raw.location()?.to_string();
    Some(Image {
        id: raw.id.clone().unwrap_or_else(|| idx.to_string()),
        url,
        alt: raw.alt.clone().filter(|a| !a.is_empty()),
        position: raw.position.and_then(|p| u32::try_from(p).ok()),
    })
}
