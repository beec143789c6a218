//! Offer catalog loading.
//!
//! The catalog is a JSON document mapping offer names to cost/price/
//! eligibility terms. It is reloaded from disk on every report request so a
//! report always reflects the document as it currently stands — there is no
//! cache and no staleness window beyond a single request.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Commercial terms for a single sellable offer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Delivery cost to us.
    pub cost: f64,
    /// Sell price to the lead.
    pub price: f64,
    /// Whether the offer may be recommended.
    pub allowed: bool,
}

/// The full offer catalog, keyed by offer name.
///
/// A `BTreeMap` keeps prompt embedding order deterministic.
pub type Catalog = BTreeMap<String, Offer>;

/// Errors from catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog document could not be read.
    #[error("failed to read catalog at {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The catalog document is not valid JSON of the expected shape.
    #[error("failed to parse catalog at {path}: {source}")]
    Parse {
        /// Path that was attempted.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Load the catalog from a JSON document.
///
/// There is no partial or default fallback: a missing or malformed
/// document fails the whole request that needed it.
///
/// # Errors
///
/// Returns [`CatalogError::Io`] if the file cannot be read and
/// [`CatalogError::Parse`] if it is not a valid offer map.
pub fn load(path: &Path) -> Result<Catalog, CatalogError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CatalogError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Return the subset of the catalog eligible for recommendation.
pub fn allowed_offers(catalog: &Catalog) -> Catalog {
    catalog
        .iter()
        .filter(|(_, offer)| offer.allowed)
        .map(|(name, offer)| (name.clone(), *offer))
        .collect()
}
