//! Extracts structured apartment listings from rental-ad HTML, validates
//! them against a declared schema, and persists them into a transactional
//! fact store, marshalling values between the application's and the store's
//! type systems in both directions.

pub mod db;
pub mod domain;
pub mod errors;
pub mod schema;
pub mod scrape;

pub use db::conform::{conform, ConformanceError, PersistedRecord};
pub use db::connection::{Database, SqliteGateway};
pub use db::gateway::{read_listings, write_listings, StoreError, StoreGateway, TxReport};
pub use db::marshal::{from_store, to_store, StoreValue};
pub use domain::listing::{Field, Listing};
pub use domain::value::{Symbol, Value};
pub use errors::IngestError;
pub use schema::{SchemaRegistry, ValidationError};
pub use scrape::{parse_page, ExtractionError};
