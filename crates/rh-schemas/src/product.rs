use serde::{Deserialize, Serialize};

/// Fixed vs variable rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Fixed,
    Variable,
}

/// A single mortgage rate offering.
///
/// `id` is stable across the product's lifetime and unique within any
/// reconstructed snapshot. `rate` is the headline percentage and the primary
/// comparison key; `apr` is the annualised cost of credit when published.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub lender_id: String,
    #[serde(rename = "type")]
    pub rate_type: RateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_term: Option<u32>,
    pub rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apr: Option<f64>,
    pub min_ltv: f64,
    pub max_ltv: f64,
    #[serde(default)]
    pub buyer_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ber_eligible: Option<Vec<String>>,
    #[serde(default)]
    pub perks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_loan: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_business: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Product {
    /// Minimal product: variable, full LTV range, no buyer types.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        lender_id: impl Into<String>,
        rate: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lender_id: lender_id.into(),
            rate_type: RateType::Variable,
            fixed_term: None,
            rate,
            apr: None,
            min_ltv: 0.0,
            max_ltv: 100.0,
            buyer_types: Vec::new(),
            ber_eligible: None,
            perks: Vec::new(),
            min_loan: None,
            new_business: None,
            warning: None,
        }
    }
}

/// Derived rate-type key used for filtering: `variable`, `fixed-{term}`.
///
/// A fixed product without a published term maps to plain `fixed`.
pub fn rate_type_key(product: &Product) -> String {
    match (product.rate_type, product.fixed_term) {
        (RateType::Variable, _) => "variable".to_string(),
        (RateType::Fixed, Some(term)) => format!("fixed-{term}"),
        (RateType::Fixed, None) => "fixed".to_string(),
    }
}

/// Sparse partial update for a product.
///
/// Only `id` is mandatory. Every other field is `Some` when the update sets
/// it and `None` when it leaves it unchanged. A patch cannot clear an
/// optional field back to "absent"; the history document has no way to say so.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lender_id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub rate_type: Option<RateType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_term: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_ltv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ltv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ber_eligible: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_loan: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_business: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ProductPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_apr(mut self, apr: f64) -> Self {
        self.apr = Some(apr);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Merge every present field onto `product`. `id` is never rewritten.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(v) = &self.name {
            product.name = v.clone();
        }
        if let Some(v) = &self.lender_id {
            product.lender_id = v.clone();
        }
        if let Some(v) = self.rate_type {
            product.rate_type = v;
        }
        if let Some(v) = self.fixed_term {
            product.fixed_term = Some(v);
        }
        if let Some(v) = self.rate {
            product.rate = v;
        }
        if let Some(v) = self.apr {
            product.apr = Some(v);
        }
        if let Some(v) = self.min_ltv {
            product.min_ltv = v;
        }
        if let Some(v) = self.max_ltv {
            product.max_ltv = v;
        }
        if let Some(v) = &self.buyer_types {
            product.buyer_types = v.clone();
        }
        if let Some(v) = &self.ber_eligible {
            product.ber_eligible = Some(v.clone());
        }
        if let Some(v) = &self.perks {
            product.perks = v.clone();
        }
        if let Some(v) = self.min_loan {
            product.min_loan = Some(v);
        }
        if let Some(v) = self.new_business {
            product.new_business = Some(v);
        }
        if let Some(v) = &self.warning {
            product.warning = Some(v.clone());
        }
    }

    /// Non-mutating variant of [`apply_to`](Self::apply_to).
    pub fn applied(&self, product: &Product) -> Product {
        let mut out = product.clone();
        self.apply_to(&mut out);
        out
    }
}
