//! Quadmart shared types.
//!
//! The persisted listing model, the category catalog with its `0` sentinel,
//! store change events, and the request shapes handed to the identity
//! provider. Nothing in here performs I/O.

pub mod api;
pub mod category;
pub mod events;
pub mod models;

pub use category::{Category, CategoryCatalog, CategoryFilter, CategoryId};
pub use events::StoreEvent;
pub use models::{Listing, ListingDraft, ListingId, ListingStatus, PLACEHOLDER_PHOTO_URI};
