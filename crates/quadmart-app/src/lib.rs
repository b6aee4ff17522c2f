//! Quadmart client logic above the listing store.
//!
//! - `form`: authoring one listing, validation and the save action
//! - `browser`: the filtered view of published listings
//! - `auth`: sign-up/sign-in input checks and the email-domain gate in
//!   front of an external identity provider

pub mod auth;
pub mod browser;
pub mod form;

pub use auth::{AuthError, AuthGate, DomainPolicy, IdentityProvider, ProviderError, REQUIRED_DOMAIN};
pub use browser::{BrowseQuery, EmptyState, ListingBrowser, filter_listings};
pub use form::{FormState, ListingForm, SaveError, ValidationError, validate_draft};
