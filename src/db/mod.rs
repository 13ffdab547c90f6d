pub mod conform;
pub mod connection;
pub mod gateway;
pub mod marshal;

pub use conform::{conform, ConformanceError, PersistedRecord};
pub use connection::{Database, SqliteGateway};
pub use gateway::{read_listings, write_listings, StoreError, StoreGateway, TxReport};
pub use marshal::{from_store, to_store, MarshalError, StoreValue};
