// src/db/gateway.rs
//
// The store's transact/query seam. The core only ever hands the gateway
// already-conformed records and treats both calls as opaque.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use crate::db::conform::{conform, PersistedRecord};
use crate::db::marshal::from_store;
use crate::domain::listing::Listing;
use crate::domain::value::{Symbol, Value};
use crate::errors::IngestError;
use crate::schema::SchemaRegistry;

#[derive(Debug)]
pub enum StoreError {
    /// The whole transaction was rejected; nothing was committed.
    Rejected(String),
    Query(String),
    /// Stored data the application cannot unmarshal.
    Corrupt(String),
    /// Connection-level failure in the backend itself.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Rejected(msg) => write!(f, "Transaction rejected: {msg}"),
            StoreError::Query(msg) => write!(f, "Query failed: {msg}"),
            StoreError::Corrupt(msg) => write!(f, "Corrupt store value: {msg}"),
            StoreError::Backend(msg) => write!(f, "Store backend error: {msg}"),
        }
    }
}

impl Error for StoreError {}

/// Completion handle for one committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReport {
    pub tx_id: i64,
    pub records_written: usize,
}

pub trait StoreGateway {
    /// Commits every record in one transaction, all or nothing.
    fn transact(&self, records: Vec<PersistedRecord>) -> Result<TxReport, StoreError>;

    /// Every stored record carrying the given attribute, all attributes
    /// included.
    fn query(&self, attribute: &str) -> Result<Vec<PersistedRecord>, StoreError>;
}

/// Conforms every listing, then writes the whole batch in one transaction.
/// A rejected transaction fails the batch as a whole; no retry.
pub fn write_listings(
    gateway: &dyn StoreGateway,
    registry: &SchemaRegistry,
    listings: &[Listing],
) -> Result<TxReport, IngestError> {
    let mut records = Vec::with_capacity(listings.len());
    for listing in listings {
        records.push(conform(registry, listing)?);
    }

    match gateway.transact(records) {
        Ok(report) => Ok(report),
        Err(e) => {
            eprintln!("Listing batch write failed: {e}");
            Err(IngestError::Store(e))
        }
    }
}

/// Reads every stored listing back as application-native values keyed by
/// qualified field symbol (`listing/price` etc.).
pub fn read_listings(
    gateway: &dyn StoreGateway,
) -> Result<Vec<BTreeMap<Symbol, Value>>, IngestError> {
    let rows = gateway.query("listing/url")?;

    let mut listings = Vec::with_capacity(rows.len());
    for row in rows {
        let mut listing = BTreeMap::new();
        for (attribute, stored) in row {
            let value = from_store(stored).map_err(|e| StoreError::Corrupt(e.to_string()))?;
            listing.insert(Symbol::parse(&attribute), value);
        }
        listings.push(listing);
    }
    Ok(listings)
}
