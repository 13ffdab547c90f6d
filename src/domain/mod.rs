pub mod listing;
pub mod value;

pub use listing::{Field, Listing};
pub use value::{Symbol, Value};
