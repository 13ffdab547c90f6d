// src/schema/mod.rs
//
// Declarative field contracts for the listing record: each field gets a
// predicate plus a seedable generator, composed into the record contract.
// The registry is built once at startup and passed explicitly; there is no
// global registration.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use url::Url;

use crate::domain::listing::{Field, Listing};
use crate::domain::value::Value;

pub const PRICE_MIN: i64 = 1_000;
pub const PRICE_MAX: i64 = 10_000;
pub const COUNT_MIN: f64 = 0.0;
pub const COUNT_MAX: f64 = 10.0;
/// Upper bound on tag-set size at generation time only.
pub const MAX_GENERATED_TAGS: usize = 6;

/// Tag vocabulary used by the generator. Validation accepts any string tag;
/// these are just realistic examples.
pub const EXAMPLE_TAGS: &[&str] = &[
    "apartment",
    "laundry in bldg",
    "carport",
    "cats are OK - purrr",
    "dogs are OK - wooof",
    "loft",
    "no smoking",
    "attached garage",
    "w/d in unit",
    "condo",
    "furnished",
    "detached garage",
    "off-street parking",
    "flat",
    "street parking",
    "no parking",
    "laundry on site",
    "wheelchair accessible",
];

const BODY_LINES: &[&str] = &[
    "Bright corner unit with lots of light.",
    "Walking distance to shops and transit.",
    "Recently remodeled kitchen and bath.",
    "Quiet street, friendly neighbors.",
];

fn window_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 1).unwrap()
}

fn window_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 6, 1).unwrap()
}

#[derive(Debug)]
pub struct ValidationError {
    pub failures: Vec<(Field, String)>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listing failed validation:")?;
        for (field, reason) in &self.failures {
            write!(f, " [{field}: {reason}]")?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

type Check = fn(&Value) -> Result<(), String>;
type Gen = fn(&mut StdRng) -> Value;

/// One field's contract: predicate plus generator, with record-composition
/// flags.
pub struct FieldContract {
    pub field: Field,
    /// Required fields must be present on a listing for the record contract
    /// to hold.
    pub required: bool,
    /// Persisted fields survive conformance onto the store wire.
    pub persisted: bool,
    check: Check,
    gen: Gen,
}

impl FieldContract {
    pub fn check(&self, value: &Value) -> Result<(), String> {
        (self.check)(value)
    }

    pub fn generate(&self, rng: &mut StdRng) -> Value {
        (self.gen)(rng)
    }
}

pub struct SchemaRegistry {
    contracts: Vec<FieldContract>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        fn contract(
            field: Field,
            required: bool,
            persisted: bool,
            check: Check,
            gen: Gen,
        ) -> FieldContract {
            FieldContract {
                field,
                required,
                persisted,
                check,
                gen,
            }
        }

        Self {
            contracts: vec![
                contract(Field::Url, true, true, check_url, gen_url),
                contract(Field::Price, true, true, check_price, gen_price),
                contract(Field::MoveInDate, true, true, check_move_in_date, gen_move_in_date),
                contract(Field::BedCount, true, true, check_count, gen_count),
                contract(Field::BathCount, true, true, check_count, gen_count),
                contract(Field::Tags, true, true, check_tags, gen_tags),
                contract(Field::Body, false, true, check_body, gen_body),
                contract(Field::Id, false, false, check_id, gen_id),
            ],
        }
    }

    pub fn contracts(&self) -> &[FieldContract] {
        &self.contracts
    }

    pub fn contract(&self, field: Field) -> Option<&FieldContract> {
        self.contracts.iter().find(|c| c.field == field)
    }

    pub fn persisted_fields(&self) -> Vec<Field> {
        self.contracts
            .iter()
            .filter(|c| c.persisted)
            .map(|c| c.field)
            .collect()
    }

    /// Every field whose contract fails, with the reason. Empty means valid.
    pub fn explain(&self, listing: &Listing) -> Vec<(Field, String)> {
        let mut failures = Vec::new();
        for contract in &self.contracts {
            match listing.field_value(contract.field) {
                Some(value) => {
                    if let Err(reason) = contract.check(&value) {
                        failures.push((contract.field, reason));
                    }
                }
                None if contract.required => {
                    failures.push((contract.field, "missing required field".to_string()));
                }
                None => {}
            }
        }
        failures
    }

    pub fn valid(&self, listing: &Listing) -> bool {
        self.explain(listing).is_empty()
    }

    pub fn validate(&self, listing: &Listing) -> Result<(), ValidationError> {
        let failures = self.explain(listing);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { failures })
        }
    }

    /// Synthesizes one value satisfying the field's contract.
    pub fn gen_value(&self, field: Field, rng: &mut StdRng) -> Option<Value> {
        self.contract(field).map(|c| c.generate(rng))
    }

    /// Synthesizes a whole listing satisfying the record contract. Same seed,
    /// same listing.
    pub fn gen_listing(&self, rng: &mut StdRng) -> Listing {
        Listing {
            url: gen_url_raw(rng),
            body: gen_body_raw(rng),
            price: rng.gen_range(PRICE_MIN..=PRICE_MAX),
            move_in_date: gen_move_in_raw(rng),
            bed_count: gen_count_raw(rng),
            bath_count: gen_count_raw(rng),
            tags: gen_tags_raw(rng),
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ----- predicates -----

fn check_price(value: &Value) -> Result<(), String> {
    match value {
        Value::Int(price) if (PRICE_MIN..=PRICE_MAX).contains(price) => Ok(()),
        Value::Int(price) => Err(format!("price {price} outside {PRICE_MIN}..={PRICE_MAX}")),
        other => Err(format!("expected integer price, got {other:?}")),
    }
}

fn check_move_in_date(value: &Value) -> Result<(), String> {
    match value {
        Value::Date(date) if (window_start()..=window_end()).contains(date) => Ok(()),
        Value::Date(date) => Err(format!(
            "date {date} outside {}..={}",
            window_start(),
            window_end()
        )),
        other => Err(format!("expected date, got {other:?}")),
    }
}

fn check_count(value: &Value) -> Result<(), String> {
    match value {
        Value::Float(count) if !count.is_finite() => {
            Err(format!("count {count} is not finite"))
        }
        Value::Float(count) if !(COUNT_MIN..=COUNT_MAX).contains(count) => {
            Err(format!("count {count} outside {COUNT_MIN}..={COUNT_MAX}"))
        }
        Value::Float(_) => Ok(()),
        other => Err(format!("expected float count, got {other:?}")),
    }
}

fn check_tags(value: &Value) -> Result<(), String> {
    match value {
        Value::Set(items) => {
            for item in items {
                if !matches!(item, Value::Str(_)) {
                    return Err(format!("tag {item:?} is not a string"));
                }
            }
            Ok(())
        }
        other => Err(format!("expected set of tags, got {other:?}")),
    }
}

fn check_url(value: &Value) -> Result<(), String> {
    match value {
        Value::Uri(_) => Ok(()),
        other => Err(format!("expected URI, got {other:?}")),
    }
}

fn check_body(value: &Value) -> Result<(), String> {
    match value {
        Value::Str(_) => Ok(()),
        other => Err(format!("expected string body, got {other:?}")),
    }
}

fn check_id(value: &Value) -> Result<(), String> {
    match value {
        Value::Str(id) => id
            .parse::<i64>()
            .map(|_| ())
            .map_err(|e| format!("id '{id}' is not an integer string: {e}")),
        other => Err(format!("expected string id, got {other:?}")),
    }
}

// ----- generators -----

fn gen_price(rng: &mut StdRng) -> Value {
    Value::Int(rng.gen_range(PRICE_MIN..=PRICE_MAX))
}

fn gen_move_in_raw(rng: &mut StdRng) -> NaiveDate {
    let span = (window_end() - window_start()).num_days();
    window_start() + Duration::days(rng.gen_range(0..=span))
}

fn gen_move_in_date(rng: &mut StdRng) -> Value {
    Value::Date(gen_move_in_raw(rng))
}

// Half-unit counts keep generated values exactly representable.
fn gen_count_raw(rng: &mut StdRng) -> f64 {
    rng.gen_range(0..=20) as f64 * 0.5
}

fn gen_count(rng: &mut StdRng) -> Value {
    Value::Float(gen_count_raw(rng))
}

fn gen_tags_raw(rng: &mut StdRng) -> BTreeSet<String> {
    let n = rng.gen_range(0..=MAX_GENERATED_TAGS);
    EXAMPLE_TAGS
        .choose_multiple(rng, n)
        .map(|t| t.to_string())
        .collect()
}

fn gen_tags(rng: &mut StdRng) -> Value {
    Value::Set(gen_tags_raw(rng).into_iter().map(Value::Str).collect())
}

fn gen_url_raw(rng: &mut StdRng) -> Url {
    let id: u32 = rng.gen_range(1_000_000..10_000_000);
    Url::parse(&format!("https://sf.example.org/apa/d/{id}.html")).unwrap()
}

fn gen_url(rng: &mut StdRng) -> Value {
    Value::Uri(gen_url_raw(rng))
}

fn gen_body_raw(rng: &mut StdRng) -> String {
    let n = rng.gen_range(1..=3);
    BODY_LINES
        .choose_multiple(rng, n)
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

fn gen_body(rng: &mut StdRng) -> Value {
    Value::Str(gen_body_raw(rng))
}

fn gen_id(rng: &mut StdRng) -> Value {
    Value::Str(rng.gen_range(0..100_000).to_string())
}
