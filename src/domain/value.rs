// src/domain/value.rs

use std::fmt;

use chrono::NaiveDate;
use url::Url;

/// Two-part qualified name, e.g. `listing/price`. The qualifier is metadata
/// used for store-wire attribute naming; a bare name has no qualifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    pub namespace: Option<String>,
    pub name: String,
}

impl Symbol {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            name: name.to_string(),
        }
    }

    pub fn plain(name: &str) -> Self {
        Self {
            namespace: None,
            name: name.to_string(),
        }
    }

    /// Parses `"ns/name"` or `"name"`. A leading `:` sigil, if present, is
    /// not part of the symbol and is stripped.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix(':').unwrap_or(raw);
        match raw.split_once('/') {
            Some((namespace, name)) => Symbol::new(namespace, name),
            None => Symbol::plain(raw),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}/{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Closed set of application-native value kinds flowing through the schema
/// and the marshaller. Adding a kind forces every match over it to be
/// extended, which is the point.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Symbol(Symbol),
    Date(NaiveDate),
    Uri(Url),
    /// Deduplicated collection; element order is whatever the producer
    /// emitted (listing tags arrive sorted from a `BTreeSet`).
    Set(Vec<Value>),
    Seq(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Builds a `Set`, collapsing duplicates while keeping first-occurrence
    /// order.
    pub fn set(items: Vec<Value>) -> Self {
        let mut unique: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_parse_handles_qualifier_and_sigil() {
        assert_eq!(Symbol::parse("listing/price"), Symbol::new("listing", "price"));
        assert_eq!(Symbol::parse(":listing/price"), Symbol::new("listing", "price"));
        assert_eq!(Symbol::parse("price"), Symbol::plain("price"));
        assert_eq!(Symbol::new("listing", "price").to_string(), "listing/price");
    }

    #[test]
    fn set_constructor_collapses_duplicates() {
        let set = Value::set(vec![
            Value::Str("laundry on site".to_string()),
            Value::Str("carport".to_string()),
            Value::Str("laundry on site".to_string()),
        ]);
        assert_eq!(
            set,
            Value::Set(vec![
                Value::Str("laundry on site".to_string()),
                Value::Str("carport".to_string()),
            ])
        );
    }
}
