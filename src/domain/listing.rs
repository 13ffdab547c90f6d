// src/domain/listing.rs

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use url::Url;

use crate::domain::value::Value;

/// One parsed apartment listing, flattened and owned. This is the canonical
/// in-memory record; everything the store sees is a derived projection of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub url: Url,
    pub price: i64,
    pub move_in_date: NaiveDate,
    pub bed_count: f64,
    pub bath_count: f64,
    // BTreeSet so tag iteration order is stable across runs.
    pub tags: BTreeSet<String>,
    pub body: String,
}

/// Closed identifier set for listing fields. `Id` is declared by the schema
/// but never carried on a parsed listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Url,
    Price,
    MoveInDate,
    BedCount,
    BathCount,
    Tags,
    Body,
    Id,
}

impl Field {
    pub const fn name(self) -> &'static str {
        match self {
            Field::Url => "url",
            Field::Price => "price",
            Field::MoveInDate => "move_in_date",
            Field::BedCount => "bed_count",
            Field::BathCount => "bath_count",
            Field::Tags => "tags",
            Field::Body => "body",
            Field::Id => "id",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Listing {
    /// Projects one field into the tagged value vocabulary. Returns `None`
    /// for fields a listing does not carry (`Id`).
    pub fn field_value(&self, field: Field) -> Option<Value> {
        match field {
            Field::Url => Some(Value::Uri(self.url.clone())),
            Field::Price => Some(Value::Int(self.price)),
            Field::MoveInDate => Some(Value::Date(self.move_in_date)),
            Field::BedCount => Some(Value::Float(self.bed_count)),
            Field::BathCount => Some(Value::Float(self.bath_count)),
            Field::Tags => Some(Value::Set(
                self.tags.iter().cloned().map(Value::Str).collect(),
            )),
            Field::Body => Some(Value::Str(self.body.clone())),
            Field::Id => None,
        }
    }
}
