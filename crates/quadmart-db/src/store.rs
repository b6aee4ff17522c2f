use quadmart_types::{Listing, ListingId, StoreEvent};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::kv::KvBackend;

/// Storage key of the collection blob.
pub const LISTINGS_KEY: &str = "listings";

const EVENT_CAPACITY: usize = 64;

/// Whole-collection listing persistence over a [`KvBackend`].
///
/// All listings live in one JSON array under one key. Every mutation reads
/// the array, edits it in memory and writes the whole array back.
///
/// Mutations through one `ListingStore` are serialized by an internal
/// writer lock, so concurrent saves from the same process never lose each
/// other's updates. Two `ListingStore` values over the same backend do not
/// share that lock and can still overwrite each other; share one store
/// (e.g. behind an `Arc`) instead of building several.
pub struct ListingStore<B> {
    backend: B,
    key: String,
    writer: Mutex<()>,
    events: broadcast::Sender<StoreEvent>,
}

impl<B: KvBackend> ListingStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, LISTINGS_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            key: key.into(),
            writer: Mutex::new(()),
            events,
        }
    }

    /// Subscribe to change events. Only writes that succeeded are published.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Read every stored listing in insertion order.
    ///
    /// A missing blob, a failed read and an undecodable blob all yield an
    /// empty list; the last two are logged.
    pub async fn load_all(&self) -> Vec<Listing> {
        let raw = match self.backend.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Reading '{}' failed, treating as empty: {}", self.key, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Listing>>(&raw) {
            Ok(listings) => listings,
            Err(e) => {
                warn!("Blob under '{}' is not a listing array, treating as empty: {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Push `listing` onto the end of the collection. The listing is stored
    /// as given; validation belongs to the caller.
    ///
    /// The current collection comes from [`ListingStore::load_all`], so a
    /// failed or undecodable read counts as empty here too. An append after
    /// such a read writes back a collection holding only `listing`, and the
    /// listings that were stored before are gone.
    pub async fn append(&self, listing: Listing) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;

        let mut listings = self.load_all().await;
        let id = listing.id.clone();
        listings.push(listing);
        self.write_all(&listings).await?;

        info!("Appended listing {} ({} stored)", id, listings.len());
        self.publish(StoreEvent::Appended { id });
        Ok(())
    }

    /// Drop every listing whose id matches. Returns `false`, without
    /// writing, if no listing had that id.
    pub async fn remove_by_id(&self, id: &ListingId) -> Result<bool, StoreError> {
        let _writer = self.writer.lock().await;

        let mut listings = self.load_all().await;
        let before = listings.len();
        listings.retain(|l| &l.id != id);

        if listings.len() == before {
            debug!("Remove of unknown listing {} skipped", id);
            return Ok(false);
        }

        self.write_all(&listings).await?;

        info!("Removed listing {} ({} stored)", id, listings.len());
        self.publish(StoreEvent::Removed { id: id.clone() });
        Ok(true)
    }

    /// Swap the listing stored under `id` for `updated`, keeping its
    /// position, its id and its creation time.
    pub async fn replace_by_id(&self, id: &ListingId, updated: Listing) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;

        let mut listings = self.load_all().await;
        let slot = listings
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let created_at = slot.created_at;
        *slot = Listing {
            id: id.clone(),
            created_at,
            ..updated
        };
        self.write_all(&listings).await?;

        info!("Replaced listing {}", id);
        self.publish(StoreEvent::Replaced { id: id.clone() });
        Ok(())
    }

    /// Delete the whole collection blob.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;

        self.backend
            .remove(&self.key)
            .await
            .map_err(StoreError::Write)?;

        info!("Cleared all listings under '{}'", self.key);
        self.publish(StoreEvent::Cleared);
        Ok(())
    }

    async fn write_all(&self, listings: &[Listing]) -> Result<(), StoreError> {
        let body = serde_json::to_string(listings)?;
        self.backend
            .set(&self.key, body)
            .await
            .map_err(StoreError::Write)
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
