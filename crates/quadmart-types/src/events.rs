use serde::{Deserialize, Serialize};

use crate::models::ListingId;

/// Change notifications published by the listing store after a write lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StoreEvent {
    /// A listing was appended to the collection
    Appended { id: ListingId },

    /// A listing was removed by id
    Removed { id: ListingId },

    /// A listing was replaced in place, keeping its id and creation time
    Replaced { id: ListingId },

    /// The whole collection was deleted
    Cleared,
}
