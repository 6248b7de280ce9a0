//! Data models for café menu products, cafés, and upload reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A menu product as extracted from a café site, before it reaches the store.
///
/// This is the shape written to crawl batch files, camelCase on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedProduct {
    /// Display name, usually Korean
    pub name: String,
    /// English name when the site carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    /// Marketing description if present on the page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Price in KRW; most chains do not publish one on menu pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Absolute image URL on the site's CDN
    pub external_image_url: String,
    /// Coarse internal category bucket (constant per site)
    pub category: String,
    /// The site's own category label
    pub external_category: String,
    /// Reconciliation key, unique within one café's catalog
    pub external_id: String,
    /// Canonical detail-page URL
    pub external_url: String,
}

/// A product as held by the catalog store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProduct {
    /// Store-assigned identifier
    pub id: String,
    /// Owning café
    pub cafe_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub external_image_url: String,
    pub category: String,
    pub external_category: String,
    pub external_id: String,
    pub external_url: String,
    /// False once the product vanished from a crawl
    pub is_active: bool,
    pub added_at: DateTime<Utc>,
    /// Refreshed only when observable content changes
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_at: Option<DateTime<Utc>>,
    /// Set once the image mirror has copied the external image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_storage_id: Option<String>,
}

impl StoredProduct {
    /// Compares the content fields against a freshly extracted record.
    ///
    /// Activity state, timestamps, and storage pointers are deliberately
    /// excluded: `updated_at` must move only when one of these differs.
    pub fn content_matches(&self, incoming: &ExtractedProduct) -> bool {
        self.name == incoming.name
            && self.name_en == incoming.name_en
            && self.description == incoming.description
            && self.price == incoming.price
            && self.external_image_url == incoming.external_image_url
            && self.category == incoming.category
            && self.external_category == incoming.external_category
            && self.external_url == incoming.external_url
    }

    /// Builds a stored product from an extracted record.
    pub fn from_extracted(
        id: impl Into<String>,
        cafe_id: impl Into<String>,
        product: &ExtractedProduct,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            cafe_id: cafe_id.into(),
            name: product.name.clone(),
            name_en: product.name_en.clone(),
            description: product.description.clone(),
            price: product.price,
            external_image_url: product.external_image_url.clone(),
            category: product.category.clone(),
            external_category: product.external_category.clone(),
            external_id: product.external_id.clone(),
            external_url: product.external_url.clone(),
            is_active: true,
            added_at: now,
            updated_at: now,
            removed_at: None,
            image_storage_id: None,
        }
    }

    /// Overwrites the content fields from an extracted record.
    ///
    /// Leaves activity state and `added_at` alone; the caller decides
    /// whether `updated_at` moves.
    pub fn apply_content(&mut self, incoming: &ExtractedProduct) {
        self.name = incoming.name.clone();
        self.name_en = incoming.name_en.clone();
        self.description = incoming.description.clone();
        self.price = incoming.price;
        self.external_image_url = incoming.external_image_url.clone();
        self.category = incoming.category.clone();
        self.external_category = incoming.external_category.clone();
        self.external_url = incoming.external_url.clone();
    }
}

/// A café chain registered in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cafe {
    pub id: String,
    /// Display name, e.g. "스타벅스"
    pub name: String,
    /// URL-safe key, e.g. "starbucks"
    pub slug: String,
}

/// One record that failed during an upload, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordError {
    /// External id when known, else the record's name
    pub record: String,
    pub message: String,
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    /// Café slug the batch was reconciled against
    pub cafe_slug: String,
    pub dry_run: bool,
    /// Records read from the batch, valid or not
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub reactivated: usize,
    pub errors: Vec<RecordError>,
    /// Names of products the removal pass deactivated
    pub removed_names: Vec<String>,
    /// Names of products the removal pass brought back
    pub reactivated_names: Vec<String>,
    /// First few input records, echoed on dry runs
    pub sample: Vec<ExtractedProduct>,
    /// (product id, external image URL) pairs for the image mirror
    #[serde(skip)]
    pub image_targets: Vec<(String, String)>,
}

impl UploadReport {
    /// Creates an empty report for a café.
    pub fn new(cafe_slug: impl Into<String>, dry_run: bool) -> Self {
        Self { cafe_slug: cafe_slug.into(), dry_run, ..Self::default() }
    }

    /// Returns true if every record was applied without error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
