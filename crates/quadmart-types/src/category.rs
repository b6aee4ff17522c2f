use serde::{Deserialize, Serialize};

/// Category identifier as stored on a listing.
///
/// `0` is reserved. On a listing or a draft it means "no category chosen",
/// which blocks publishing. Browsing never uses a raw id for "all
/// categories"; that is [`CategoryFilter::All`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u32);

impl CategoryId {
    /// Sentinel for a draft whose category has not been picked yet.
    pub const UNSELECTED: CategoryId = CategoryId(0);

    pub fn is_unselected(self) -> bool {
        self == Self::UNSELECTED
    }
}

/// Category restriction applied while browsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(CategoryId),
}

impl CategoryFilter {
    /// Map a raw picker value where `0` is the "All" chip.
    pub fn from_raw(id: u32) -> Self {
        match id {
            0 => Self::All,
            id => Self::Only(CategoryId(id)),
        }
    }

    pub fn matches(self, id: CategoryId) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Ordered, read-only list of the categories a seller can pick from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
}

impl CategoryCatalog {
    /// Build a catalog from externally supplied entries. Entries using the
    /// reserved id are dropped.
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories: categories
                .into_iter()
                .filter(|c| !c.id.is_unselected())
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    pub fn name_of(&self, id: CategoryId) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        let entries = [
            (1, "Appliances"),
            (2, "Furniture"),
            (3, "Transportation"),
            (4, "Technology"),
        ];
        Self::new(
            entries
                .into_iter()
                .map(|(id, name)| Category {
                    id: CategoryId(id),
                    name: name.to_string(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_from_raw_zero_means_all() {
        assert_eq!(CategoryFilter::from_raw(0), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_raw(3), CategoryFilter::Only(CategoryId(3)));
        assert!(CategoryFilter::All.matches(CategoryId::UNSELECTED));
        assert!(!CategoryFilter::Only(CategoryId(2)).matches(CategoryId(3)));
    }

    #[test]
    fn catalog_drops_reserved_id() {
        let catalog = CategoryCatalog::new(vec![
            Category { id: CategoryId(0), name: "All".into() },
            Category { id: CategoryId(7), name: "Books".into() },
        ]);
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.contains(CategoryId::UNSELECTED));
        assert_eq!(catalog.name_of(CategoryId(7)), Some("Books"));
    }

    #[test]
    fn default_catalog_is_ordered() {
        let catalog = CategoryCatalog::default();
        let names: Vec<&str> = catalog.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Appliances", "Furniture", "Transportation", "Technology"]);
    }
}
