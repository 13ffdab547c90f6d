// src/db/conform.rs

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use crate::db::marshal::{to_store, StoreValue};
use crate::domain::listing::Listing;
use crate::schema::{SchemaRegistry, ValidationError};

/// Wire namespace for persisted listing attributes.
pub const STORE_NAMESPACE: &str = "listing";

/// One listing in store-ready shape: namespaced attribute name to
/// store-native value. Derived and disposable; the `Listing` stays canonical.
pub type PersistedRecord = BTreeMap<String, StoreValue>;

#[derive(Debug)]
pub enum ConformanceError {
    Invalid(ValidationError),
}

impl fmt::Display for ConformanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConformanceError::Invalid(e) => write!(f, "cannot conform invalid listing: {e}"),
        }
    }
}

impl Error for ConformanceError {}

/// Validates, then projects the listing onto the persisted field set,
/// marshalling each value and renaming it to `listing/<field>`. Never accepts
/// an invalid listing.
pub fn conform(
    registry: &SchemaRegistry,
    listing: &Listing,
) -> Result<PersistedRecord, ConformanceError> {
    registry
        .validate(listing)
        .map_err(ConformanceError::Invalid)?;

    let mut record = PersistedRecord::new();
    for contract in registry.contracts() {
        if !contract.persisted {
            continue;
        }
        if let Some(value) = listing.field_value(contract.field) {
            let attribute = format!("{STORE_NAMESPACE}/{}", contract.field.name());
            record.insert(attribute, to_store(value));
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::marshal::StoreValue;
    use crate::schema::SchemaRegistry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn valid_listings_conform_to_exactly_the_persisted_set() {
        let registry = SchemaRegistry::new();
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let listing = registry.gen_listing(&mut rng);
            let record = conform(&registry, &listing).unwrap();

            let keys: Vec<&str> = record.keys().map(String::as_str).collect();
            assert_eq!(
                keys,
                vec![
                    "listing/bath_count",
                    "listing/bed_count",
                    "listing/body",
                    "listing/move_in_date",
                    "listing/price",
                    "listing/tags",
                    "listing/url",
                ]
            );

            assert!(matches!(record["listing/price"], StoreValue::Int(_)));
            assert!(matches!(record["listing/move_in_date"], StoreValue::Instant(_)));
            assert!(matches!(record["listing/tags"], StoreValue::Set(_)));
            assert!(matches!(record["listing/url"], StoreValue::Uri(_)));
            assert!(matches!(record["listing/bed_count"], StoreValue::Float(_)));
        }
    }

    #[test]
    fn invalid_listing_is_rejected_with_the_offending_field() {
        let registry = SchemaRegistry::new();
        let mut listing = registry.gen_listing(&mut StdRng::seed_from_u64(19));
        listing.price = 50;

        let err = conform(&registry, &listing).unwrap_err();
        let ConformanceError::Invalid(validation) = err;
        assert_eq!(validation.failures.len(), 1);
        assert_eq!(validation.failures[0].0.name(), "price");
    }
}
