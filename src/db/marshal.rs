// src/db/marshal.rs
//
// Bidirectional conversion between application-native values and the
// fact-store's native value kinds. Both sides are closed variants, so a new
// kind cannot be added without extending every match here.

use std::error::Error;
use std::fmt;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::value::{Symbol, Value};

/// Store-native value kinds, serialized as JSON for the sqlite backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// Qualified keyword with the store's leading `:` sigil, e.g.
    /// `:listing/price`.
    Keyword(String),
    Instant(DateTime<Utc>),
    Uri(String),
    Set(Vec<StoreValue>),
    List(Vec<StoreValue>),
    Map(Vec<(StoreValue, StoreValue)>),
}

#[derive(Debug)]
pub struct MarshalError {
    pub value: String,
    pub reason: String,
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot unmarshal '{}': {}", self.value, self.reason)
    }
}

impl Error for MarshalError {}

/// Outbound conversion, application → store. Deterministic and, with one
/// exception, lossless: a `Date` lands as the midnight-UTC `Instant`, and the
/// reverse direction truncates back to day precision. Everything else round
/// trips exactly.
pub fn to_store(value: Value) -> StoreValue {
    match value {
        Value::Int(n) => StoreValue::Int(n),
        Value::Float(x) => StoreValue::Float(x),
        Value::Str(s) => StoreValue::Str(s),
        Value::Bool(b) => StoreValue::Bool(b),
        Value::Symbol(sym) => StoreValue::Keyword(format!(":{sym}")),
        Value::Date(date) => {
            StoreValue::Instant(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
        }
        Value::Uri(url) => StoreValue::Uri(url.to_string()),
        Value::Set(items) => StoreValue::Set(items.into_iter().map(to_store).collect()),
        Value::Seq(items) => StoreValue::List(items.into_iter().map(to_store).collect()),
        Value::Map(entries) => StoreValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (to_store(k), to_store(v)))
                .collect(),
        ),
    }
}

/// Inbound conversion, store → application. Fails only on store data the
/// application cannot represent (a malformed URI).
pub fn from_store(value: StoreValue) -> Result<Value, MarshalError> {
    Ok(match value {
        StoreValue::Int(n) => Value::Int(n),
        StoreValue::Float(x) => Value::Float(x),
        StoreValue::Str(s) => Value::Str(s),
        StoreValue::Bool(b) => Value::Bool(b),
        StoreValue::Keyword(raw) => Value::Symbol(Symbol::parse(&raw)),
        StoreValue::Instant(instant) => Value::Date(instant.date_naive()),
        StoreValue::Uri(raw) => Value::Uri(Url::parse(&raw).map_err(|e| MarshalError {
            value: raw.clone(),
            reason: e.to_string(),
        })?),
        StoreValue::Set(items) => Value::Set(
            items
                .into_iter()
                .map(from_store)
                .collect::<Result<_, _>>()?,
        ),
        StoreValue::List(items) => Value::Seq(
            items
                .into_iter()
                .map(from_store)
                .collect::<Result<_, _>>()?,
        ),
        StoreValue::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| Ok((from_store(k)?, from_store(v)?)))
                .collect::<Result<_, MarshalError>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::Field;
    use crate::schema::SchemaRegistry;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_schema_field_value_round_trips() {
        let registry = SchemaRegistry::new();
        let mut rng = StdRng::seed_from_u64(23);
        for contract in registry.contracts() {
            for _ in 0..200 {
                let value = contract.generate(&mut rng);
                let back = from_store(to_store(value.clone())).unwrap();
                assert_eq!(back, value, "round trip failed for {}", contract.field);
            }
        }
        // Make sure the loop covered the whole vocabulary.
        assert!(registry.contract(Field::Tags).is_some());
    }

    #[test]
    fn dates_marshal_to_midnight_utc_instants() {
        let date = NaiveDate::from_ymd_opt(2017, 3, 1).unwrap();
        let stored = to_store(Value::Date(date));
        match &stored {
            StoreValue::Instant(instant) => {
                assert_eq!(instant.to_rfc3339(), "2017-03-01T00:00:00+00:00")
            }
            other => panic!("expected Instant, got {other:?}"),
        }
        assert_eq!(from_store(stored).unwrap(), Value::Date(date));
    }

    #[test]
    fn instant_to_date_truncates_to_day_precision() {
        let instant = Utc.with_ymd_and_hms(2017, 3, 1, 13, 45, 12).unwrap();
        let back = from_store(StoreValue::Instant(instant)).unwrap();
        assert_eq!(
            back,
            Value::Date(NaiveDate::from_ymd_opt(2017, 3, 1).unwrap())
        );
    }

    #[test]
    fn symbols_gain_and_lose_the_keyword_sigil() {
        let sym = Symbol::new("listing", "price");
        let stored = to_store(Value::Symbol(sym.clone()));
        assert_eq!(stored, StoreValue::Keyword(":listing/price".to_string()));
        assert_eq!(from_store(stored).unwrap(), Value::Symbol(sym));
    }

    #[test]
    fn nested_maps_and_sequences_convert_recursively() {
        let value = Value::Map(vec![(
            Value::Symbol(Symbol::plain("tags")),
            Value::Seq(vec![
                Value::Str("loft".to_string()),
                Value::Set(vec![Value::Int(1), Value::Int(2)]),
            ]),
        )]);
        let back = from_store(to_store(value.clone())).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn malformed_store_uri_is_an_error() {
        let err = from_store(StoreValue::Uri("not a url".to_string())).unwrap_err();
        assert!(err.value.contains("not a url"));
    }

    #[test]
    fn store_values_survive_json_serialization() {
        let registry = SchemaRegistry::new();
        let mut rng = StdRng::seed_from_u64(31);
        for contract in registry.contracts() {
            let stored = to_store(contract.generate(&mut rng));
            let json = serde_json::to_string(&stored).unwrap();
            let parsed: StoreValue = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, stored);
        }
    }
}
