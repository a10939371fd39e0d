//! Field-level structural diff between two versions of a product.
//!
//! # Equality rule
//!
//! - List fields (`buyerTypes`, `berEligible`, `perks`) compare as sets:
//!   length first, then sorted copies. Order changes are not differences.
//! - Everything else compares by value.
//! - Absent on both sides is equal; absent vs present is a difference.
//!
//! Output follows the order of the `fields` slice and only lists fields that
//! differ.

use rh_schemas::Product;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparable product attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Rate,
    Apr,
    Name,
    MinLtv,
    MaxLtv,
    BuyerTypes,
    BerEligible,
    Perks,
    FixedTerm,
    MinLoan,
    NewBusiness,
    Warning,
}

/// Non-rate attributes. Callers that classify on `rate` compare it separately.
pub const COMPARED_FIELDS: &[Field] = &[
    Field::Apr,
    Field::Name,
    Field::MinLtv,
    Field::MaxLtv,
    Field::BuyerTypes,
    Field::BerEligible,
    Field::Perks,
    Field::FixedTerm,
    Field::MinLoan,
    Field::NewBusiness,
    Field::Warning,
];

/// `rate` plus every compared attribute, for change-log audit entries.
pub const AUDITED_FIELDS: &[Field] = &[
    Field::Rate,
    Field::Apr,
    Field::Name,
    Field::MinLtv,
    Field::MaxLtv,
    Field::BuyerTypes,
    Field::BerEligible,
    Field::Perks,
    Field::FixedTerm,
    Field::MinLoan,
    Field::NewBusiness,
    Field::Warning,
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: Field,
    /// `null` when the field was absent.
    pub previous_value: Value,
    pub new_value: Value,
}

enum FieldValue<'a> {
    Number(Option<f64>),
    Text(Option<&'a str>),
    List(Option<&'a [String]>),
    Flag(Option<bool>),
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Rate => "rate",
            Field::Apr => "apr",
            Field::Name => "name",
            Field::MinLtv => "minLtv",
            Field::MaxLtv => "maxLtv",
            Field::BuyerTypes => "buyerTypes",
            Field::BerEligible => "berEligible",
            Field::Perks => "perks",
            Field::FixedTerm => "fixedTerm",
            Field::MinLoan => "minLoan",
            Field::NewBusiness => "newBusiness",
            Field::Warning => "warning",
        }
    }

    fn value<'a>(&self, p: &'a Product) -> FieldValue<'a> {
        match self {
            Field::Rate => FieldValue::Number(Some(p.rate)),
            Field::Apr => FieldValue::Number(p.apr),
            Field::Name => FieldValue::Text(Some(&p.name)),
            Field::MinLtv => FieldValue::Number(Some(p.min_ltv)),
            Field::MaxLtv => FieldValue::Number(Some(p.max_ltv)),
            Field::BuyerTypes => FieldValue::List(Some(&p.buyer_types)),
            Field::BerEligible => FieldValue::List(p.ber_eligible.as_deref()),
            Field::Perks => FieldValue::List(Some(&p.perks)),
            Field::FixedTerm => FieldValue::Number(p.fixed_term.map(f64::from)),
            Field::MinLoan => FieldValue::Number(p.min_loan),
            Field::NewBusiness => FieldValue::Flag(p.new_business),
            Field::Warning => FieldValue::Text(p.warning.as_deref()),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldValue<'_> {
    fn same_as(&self, other: &FieldValue<'_>) -> bool {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Flag(a), FieldValue::Flag(b)) => a == b,
            (FieldValue::List(a), FieldValue::List(b)) => match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => same_members(a, b),
                _ => false,
            },
            _ => false,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Number(v) => serde_json::json!(v),
            FieldValue::Text(v) => serde_json::json!(v),
            FieldValue::List(v) => serde_json::json!(v),
            FieldValue::Flag(v) => serde_json::json!(v),
        }
    }
}

fn same_members(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<&str> = a.iter().map(String::as_str).collect();
    let mut b: Vec<&str> = b.iter().map(String::as_str).collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Diff `before` against `after` over `fields`.
pub fn diff_fields(before: &Product, after: &Product, fields: &[Field]) -> Vec<FieldChange> {
    let mut out = Vec::new();
    for field in fields {
        let prev = field.value(before);
        let next = field.value(after);
        if !prev.same_as(&next) {
            out.push(FieldChange {
                field: *field,
                previous_value: prev.to_json(),
                new_value: next.to_json(),
            });
        }
    }
    out
}

/// Diff over [`COMPARED_FIELDS`] (everything but `rate`).
pub fn diff_products(before: &Product, after: &Product) -> Vec<FieldChange> {
    diff_fields(before, after, COMPARED_FIELDS)
}
