//! Resource collection names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a path segment does not name a known collection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown collection: {0}")]
pub struct UnknownCollection(pub String);

/// A named group of documents of one logical kind.
///
/// The set is fixed: every variant gets the full list/get/create/update/delete
/// surface, both in the durable store and in the in-memory mock store.
///
/// ## Examples
///
/// ```
/// use rootedlane_core::Collection;
///
/// let collection: Collection = "userLocations".parse().unwrap();
/// assert_eq!(collection, Collection::UserLocations);
/// assert_eq!(collection.singular(), "userLocation");
///
/// assert!("widgets".parse::<Collection>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Products,
    Wishlist,
    Test,
    Orders,
    Users,
    Cart,
    Reviews,
    Payments,
    Deliveries,
    UserLocations,
}

impl Collection {
    /// Every collection, in route registration order.
    pub const ALL: [Self; 10] = [
        Self::Products,
        Self::Wishlist,
        Self::Test,
        Self::Orders,
        Self::Users,
        Self::Cart,
        Self::Reviews,
        Self::Payments,
        Self::Deliveries,
        Self::UserLocations,
    ];

    /// The plural resource name as it appears in URLs and in the store.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Wishlist => "wishlist",
            Self::Test => "test",
            Self::Orders => "orders",
            Self::Users => "users",
            Self::Cart => "cart",
            Self::Reviews => "reviews",
            Self::Payments => "payments",
            Self::Deliveries => "deliveries",
            Self::UserLocations => "userLocations",
        }
    }

    /// The resource name with its trailing character dropped.
    ///
    /// Used in error messages such as `"product not found"`. This is not a
    /// general pluralization rule, only one that fits the fixed names above.
    #[must_use]
    pub fn singular(&self) -> &'static str {
        let name = self.as_str();
        let end = name
            .char_indices()
            .next_back()
            .map_or(0, |(index, _)| index);
        name.get(..end).unwrap_or(name)
    }

    /// Fields that must be unique across the collection, when present.
    #[must_use]
    pub const fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Users => &["email"],
            _ => &[],
        }
    }

    /// Fields that are never returned to API callers.
    #[must_use]
    pub const fn redacted_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Users => &["password"],
            _ => &[],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|collection| collection.as_str() == s)
            .ok_or_else(|| UnknownCollection(s.to_owned()))
    }
}
