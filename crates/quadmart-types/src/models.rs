use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::CategoryId;

/// Substituted for the photo list when a listing is saved without photos.
pub const PLACEHOLDER_PHOTO_URI: &str = "https://placehold.co/300x300/png?text=No+Photo";

/// Listing identifier, assigned once at first save.
///
/// Generated ids are UUIDv7 strings, so they sort by creation time. Any
/// string is accepted when decoding, which keeps blobs written by older
/// clients readable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Only `Published` listings are visible when browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Published,
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Published => f.write_str("published"),
        }
    }
}

/// A persisted marketplace listing. Field names match the stored JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    /// Decimal string as typed by the seller, e.g. `"12.50"`.
    pub price: String,
    #[serde(default)]
    pub category_id: CategoryId,
    #[serde(default)]
    pub open_to_offer: bool,
    #[serde(default)]
    pub photos: Vec<String>,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_published(&self) -> bool {
        self.status == ListingStatus::Published
    }

    /// First photo, used as the listing's thumbnail.
    pub fn cover_photo(&self) -> &str {
        self.photos
            .first()
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_PHOTO_URI)
    }
}

/// The in-memory shape of a listing being authored: no id, no timestamp,
/// no status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price: String,
    pub category_id: CategoryId,
    pub open_to_offer: bool,
    pub photos: Vec<String>,
}

impl ListingDraft {
    /// Promote the draft to a persisted listing.
    ///
    /// Text fields are trimmed and an empty photo list is replaced by the
    /// placeholder. Does not validate; callers check the draft first.
    pub fn to_listing(&self, id: ListingId, status: ListingStatus, created_at: DateTime<Utc>) -> Listing {
        let photos = if self.photos.is_empty() {
            vec![PLACEHOLDER_PHOTO_URI.to_string()]
        } else {
            self.photos.clone()
        };

        Listing {
            id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            price: self.price.trim().to_string(),
            category_id: self.category_id,
            open_to_offer: self.open_to_offer,
            photos,
            status,
            created_at,
        }
    }
}
