use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

use quadmart_db::{KvBackend, ListingStore};
use quadmart_types::{CategoryFilter, Listing, StoreEvent};

/// What the user typed and which category chip is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseQuery {
    pub text: String,
    pub category: CategoryFilter,
}

/// Shown when nothing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub hint: &'static str,
}

const NO_RESULTS: EmptyState = EmptyState {
    title: "No items found",
    hint: "Try adjusting your search or category",
};

/// Published listings whose title contains `query.text` (case-insensitive)
/// and whose category passes `query.category`, in stored order.
pub fn filter_listings<'a>(listings: &'a [Listing], query: &BrowseQuery) -> Vec<&'a Listing> {
    let needle = query.text.to_lowercase();
    listings
        .iter()
        .filter(|l| l.is_published())
        .filter(|l| query.category.matches(l.category_id))
        .filter(|l| l.title.to_lowercase().contains(&needle))
        .collect()
}

/// The browse screen's view of the store.
///
/// Holds the snapshot from the last load. Call [`ListingBrowser::on_focus`]
/// whenever the screen becomes visible; [`ListingBrowser::poll_changes`]
/// reloads early if the store reported a write since then.
pub struct ListingBrowser<B> {
    store: Arc<ListingStore<B>>,
    events: broadcast::Receiver<StoreEvent>,
    listings: Vec<Listing>,
    query: BrowseQuery,
}

impl<B: KvBackend> ListingBrowser<B> {
    pub fn new(store: Arc<ListingStore<B>>) -> Self {
        let events = store.subscribe();
        Self {
            store,
            events,
            listings: Vec::new(),
            query: BrowseQuery::default(),
        }
    }

    pub async fn on_focus(&mut self) {
        self.reload().await;
    }

    /// Reload if any store event arrived since the last load. Returns
    /// whether a reload happened.
    pub async fn poll_changes(&mut self) -> bool {
        let mut stale = false;
        loop {
            match self.events.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => stale = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if stale {
            self.reload().await;
        }
        stale
    }

    async fn reload(&mut self) {
        // Events queued before this read are covered by it.
        while !matches!(
            self.events.try_recv(),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed)
        ) {}

        self.listings = self.store.load_all().await;
        debug!("Browser loaded {} listings", self.listings.len());
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.query.text = text.into();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.query.category = category;
    }

    /// Everything from the last load, drafts included.
    pub fn snapshot(&self) -> &[Listing] {
        &self.listings
    }

    pub fn results(&self) -> Vec<&Listing> {
        filter_listings(&self.listings, &self.query)
    }

    pub fn result_count(&self) -> usize {
        self.results().len()
    }

    pub fn count_label(&self) -> String {
        format!("{} items", self.result_count())
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        (self.result_count() == 0).then_some(NO_RESULTS)
    }
}
