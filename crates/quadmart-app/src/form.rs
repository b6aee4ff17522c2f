use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use quadmart_db::{KvBackend, ListingStore, StoreError};
use quadmart_types::{CategoryCatalog, CategoryId, Listing, ListingDraft, ListingId, ListingStatus};

/// The first rule a draft breaks. Display strings are shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a title")]
    MissingTitle,

    #[error("Please enter a description")]
    MissingDescription,

    #[error("Please enter a valid price")]
    InvalidPrice,

    #[error("Please select a category")]
    MissingCategory,

    #[error("Please select one of the listed categories")]
    UnknownCategory(CategoryId),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("This listing was already saved as {0}")]
    AlreadySaved(ListingId),

    #[error("Could not save listing")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    Empty,
    Editing,
    Invalid(ValidationError),
    /// The last check passed; nothing has been written yet.
    ReadyToSave,
    Saving,
    Saved(ListingId),
    /// The store failure with its cause; the draft is untouched.
    SaveFailed(String),
}

/// Parse a price the way the form accepts it: trimmed, finite, not negative.
pub fn parse_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

/// Check a draft for saving with `status`.
///
/// Rules run in a fixed order and only the first failure is reported.
/// A category is required to publish, not to keep a draft.
pub fn validate_draft(
    draft: &ListingDraft,
    status: ListingStatus,
    catalog: Option<&CategoryCatalog>,
) -> Result<(), ValidationError> {
    if draft.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if draft.description.trim().is_empty() {
        return Err(ValidationError::MissingDescription);
    }
    if parse_price(&draft.price).is_none() {
        return Err(ValidationError::InvalidPrice);
    }

    if status == ListingStatus::Published && draft.category_id.is_unselected() {
        return Err(ValidationError::MissingCategory);
    }
    if let Some(catalog) = catalog {
        let id = draft.category_id;
        if !id.is_unselected() && !catalog.contains(id) {
            return Err(ValidationError::UnknownCategory(id));
        }
    }

    Ok(())
}

/// One listing being authored on the sell screen.
///
/// Field edits are never rejected; rules are checked when a save is
/// attempted. A session that has saved once refuses to save again until
/// [`ListingForm::reset`], so a draft cannot turn into two listings.
#[derive(Debug, Clone)]
pub struct ListingForm {
    draft: ListingDraft,
    state: FormState,
    saved_as: Option<ListingId>,
    catalog: Option<CategoryCatalog>,
}

impl Default for ListingForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingForm {
    pub fn new() -> Self {
        Self {
            draft: ListingDraft::default(),
            state: FormState::Empty,
            saved_as: None,
            catalog: None,
        }
    }

    /// Also reject category ids missing from `catalog`.
    pub fn with_catalog(catalog: CategoryCatalog) -> Self {
        Self {
            catalog: Some(catalog),
            ..Self::new()
        }
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    // -- Field edits --

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.edit(|d| d.title = title.into());
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.edit(|d| d.description = description.into());
    }

    pub fn set_price(&mut self, price: impl Into<String>) {
        self.edit(|d| d.price = price.into());
    }

    pub fn set_category(&mut self, id: CategoryId) {
        self.edit(|d| d.category_id = id);
    }

    pub fn set_open_to_offer(&mut self, open: bool) {
        self.edit(|d| d.open_to_offer = open);
    }

    pub fn add_photo(&mut self, uri: impl Into<String>) {
        self.edit(|d| d.photos.push(uri.into()));
    }

    pub fn remove_photo(&mut self, index: usize) -> Option<String> {
        if index >= self.draft.photos.len() {
            return None;
        }
        let mut removed = None;
        self.edit(|d| removed = Some(d.photos.remove(index)));
        removed
    }

    fn edit(&mut self, f: impl FnOnce(&mut ListingDraft)) {
        f(&mut self.draft);
        self.state = FormState::Editing;
    }

    // -- Save --

    pub fn validate(&self, status: ListingStatus) -> Result<(), ValidationError> {
        validate_draft(&self.draft, status, self.catalog.as_ref())
    }

    /// Run the rules for `status` and move to `Invalid` or `ReadyToSave`.
    pub fn check(&mut self, status: ListingStatus) -> Result<(), ValidationError> {
        match self.validate(status) {
            Ok(()) => {
                self.state = FormState::ReadyToSave;
                Ok(())
            }
            Err(e) => {
                self.state = FormState::Invalid(e.clone());
                Err(e)
            }
        }
    }

    pub async fn publish<B: KvBackend>(&mut self, store: &ListingStore<B>) -> Result<Listing, SaveError> {
        self.save(store, ListingStatus::Published).await
    }

    pub async fn save_draft<B: KvBackend>(&mut self, store: &ListingStore<B>) -> Result<Listing, SaveError> {
        self.save(store, ListingStatus::Draft).await
    }

    /// Validate, then append a new listing with `status` to `store`.
    ///
    /// On any failure the draft keeps every field value so the user can
    /// fix it or retry.
    pub async fn save<B: KvBackend>(
        &mut self,
        store: &ListingStore<B>,
        status: ListingStatus,
    ) -> Result<Listing, SaveError> {
        if let Some(id) = &self.saved_as {
            return Err(SaveError::AlreadySaved(id.clone()));
        }

        self.check(status)?;

        self.state = FormState::Saving;
        let listing = self.draft.to_listing(ListingId::generate(), status, Utc::now());

        match store.append(listing.clone()).await {
            Ok(()) => {
                info!("Saved listing {} as {}", listing.id, status);
                self.saved_as = Some(listing.id.clone());
                self.state = FormState::Saved(listing.id.clone());
                Ok(listing)
            }
            Err(e) => {
                let message = match std::error::Error::source(&e) {
                    Some(cause) => format!("{e}: {cause}"),
                    None => e.to_string(),
                };
                warn!("Saving listing failed: {}", message);
                self.state = FormState::SaveFailed(message);
                Err(e.into())
            }
        }
    }

    /// Start over with an empty draft, keeping the catalog.
    pub fn reset(&mut self) {
        self.draft = ListingDraft::default();
        self.state = FormState::Empty;
        self.saved_as = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadmart_db::MemoryKv;
    use quadmart_types::PLACEHOLDER_PHOTO_URI;

    fn filled_form() -> ListingForm {
        let mut form = ListingForm::new();
        form.set_title("Mini fridge");
        form.set_description("Fits under a dorm desk");
        form.set_price("45.5");
        form.set_category(CategoryId(1));
        form
    }

    #[test]
    fn price_rules() {
        assert_eq!(parse_price(" 12.50 "), Some(12.5));
        assert_eq!(parse_price("0"), Some(0.0));
        for bad in ["", "   ", "abc", "12abc", "-3", "inf", "NaN"] {
            assert_eq!(parse_price(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn first_failing_rule_wins() {
        let mut form = ListingForm::new();
        form.set_description("has one");
        // empty title and empty price: title is reported
        assert_eq!(form.validate(ListingStatus::Published), Err(ValidationError::MissingTitle));

        form.set_title("  ");
        assert_eq!(form.validate(ListingStatus::Published), Err(ValidationError::MissingTitle));

        form.set_title("Lamp");
        form.set_description(" ");
        assert_eq!(form.validate(ListingStatus::Published), Err(ValidationError::MissingDescription));

        form.set_description("Bright");
        assert_eq!(form.validate(ListingStatus::Published), Err(ValidationError::InvalidPrice));

        form.set_price("10");
        assert_eq!(form.validate(ListingStatus::Published), Err(ValidationError::MissingCategory));
    }

    #[test]
    fn drafts_may_skip_category() {
        let mut form = filled_form();
        form.set_category(CategoryId::UNSELECTED);
        assert_eq!(form.validate(ListingStatus::Draft), Ok(()));
        assert_eq!(form.validate(ListingStatus::Published), Err(ValidationError::MissingCategory));
    }

    #[test]
    fn catalog_rejects_unknown_category() {
        let mut form = ListingForm::with_catalog(CategoryCatalog::default());
        form.set_title("Scooter");
        form.set_description("Electric");
        form.set_price("150");
        form.set_category(CategoryId(99));
        assert_eq!(
            form.validate(ListingStatus::Draft),
            Err(ValidationError::UnknownCategory(CategoryId(99)))
        );
        form.set_category(CategoryId(3));
        assert_eq!(form.validate(ListingStatus::Published), Ok(()));
    }

    #[test]
    fn check_moves_to_invalid_or_ready() {
        let mut form = filled_form();
        form.set_price("free");
        assert_eq!(form.check(ListingStatus::Published), Err(ValidationError::InvalidPrice));
        assert_eq!(form.state(), &FormState::Invalid(ValidationError::InvalidPrice));

        form.set_price("0");
        assert_eq!(form.state(), &FormState::Editing);
        assert_eq!(form.check(ListingStatus::Published), Ok(()));
        assert_eq!(form.state(), &FormState::ReadyToSave);
    }

    #[test]
    fn edits_move_to_editing() {
        let mut form = ListingForm::new();
        assert_eq!(form.state(), &FormState::Empty);
        form.set_open_to_offer(true);
        assert_eq!(form.state(), &FormState::Editing);
        form.add_photo("file:///a.jpg");
        form.add_photo("file:///b.jpg");
        assert_eq!(form.remove_photo(0).as_deref(), Some("file:///a.jpg"));
        assert_eq!(form.remove_photo(5), None);
        assert_eq!(form.draft().photos, vec!["file:///b.jpg".to_string()]);
    }

    #[tokio::test]
    async fn publish_appends_listing() {
        let store = ListingStore::new(MemoryKv::new());
        let mut form = filled_form();
        form.set_open_to_offer(true);

        let saved = form.publish(&store).await.unwrap();
        assert_eq!(form.state(), &FormState::Saved(saved.id.clone()));
        assert_eq!(saved.status, ListingStatus::Published);
        assert_eq!(saved.photos, vec![PLACEHOLDER_PHOTO_URI.to_string()]);
        assert!(!saved.id.as_str().is_empty());

        let stored = store.load_all().await;
        assert_eq!(stored, vec![saved]);
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_store() {
        let kv = MemoryKv::new();
        let store = ListingStore::new(kv.clone());
        let mut form = ListingForm::new();
        form.set_title("Only a title");

        let err = form.save_draft(&store).await.unwrap_err();
        assert!(matches!(err, SaveError::Invalid(ValidationError::MissingDescription)));
        assert_eq!(form.state(), &FormState::Invalid(ValidationError::MissingDescription));
        assert_eq!(kv.write_count(), 0);
    }

    #[tokio::test]
    async fn failed_save_keeps_fields_and_allows_retry() {
        let kv = MemoryKv::new();
        let store = ListingStore::new(kv.clone());
        let mut form = filled_form();
        let before = form.draft().clone();

        kv.set_fail_writes(true);
        let err = form.publish(&store).await.unwrap_err();
        assert!(matches!(err, SaveError::Store(StoreError::Write(_))));
        assert_eq!(
            form.state(),
            &FormState::SaveFailed("failed to save listings: storage unavailable: write rejected".into())
        );
        assert_eq!(err.to_string(), "Could not save listing");
        assert_eq!(form.draft(), &before);

        kv.set_fail_writes(false);
        form.publish(&store).await.unwrap();
        assert_eq!(store.load_all().await.len(), 1);
    }

    #[tokio::test]
    async fn second_save_is_refused_until_reset() {
        let store = ListingStore::new(MemoryKv::new());
        let mut form = filled_form();

        let first = form.save_draft(&store).await.unwrap();
        form.set_title("Edited after save");
        let err = form.publish(&store).await.unwrap_err();
        assert!(matches!(err, SaveError::AlreadySaved(id) if id == first.id));
        assert_eq!(store.load_all().await.len(), 1);

        form.reset();
        assert_eq!(form.state(), &FormState::Empty);
        assert_eq!(form.draft(), &ListingDraft::default());
    }
}
