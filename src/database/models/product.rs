use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::str::FromStr;

use super::ValidationErrors;

const BLANK: &str = "can't be blank";
const NOT_A_NUMBER: &str = "is not a number";
const NEGATIVE: &str = "must be greater than or equal to 0";
const OUT_OF_RANGE: &str = "is out of range";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub published: bool,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub price: Decimal,
    pub published: bool,
    pub user_id: i64,
}

/// Partial update; `None` leaves the column alone.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub published: Option<bool>,
}

impl ProductChanges {
    pub fn apply(self, product: &mut Product) {
        if let Some(title) = self.title {
            product.title = title;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(published) = self.published {
            product.published = published;
        }
    }
}

/// Permitted attributes of the `product` request root.
///
/// `price` stays untyped until validation so that `"20 pesos"` surfaces as a
/// field error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductParams {
    /// `Some(None)` is an explicit `null`
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub price: Option<Value>,
    pub published: Option<bool>,
}

// Tells an explicit `null` apart from a missing key
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl ProductParams {
    /// Builds a product owned by `user_id`, or every field error at once.
    pub fn into_new(self, user_id: i64) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = self.title.flatten().unwrap_or_default();
        if title.trim().is_empty() {
            errors.add("title", BLANK);
        }

        let price = match &self.price {
            None => Some(Decimal::ZERO),
            Some(value) => validate_price(value, &mut errors),
        };

        errors.into_result()?;
        Ok(NewProduct {
            title,
            price: price.unwrap_or_default(),
            published: self.published.unwrap_or(false),
            user_id,
        })
    }

    /// Validates the submitted attributes as they would look once merged into `existing`.
    pub fn into_changes(self, existing: &Product) -> Result<ProductChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = self
            .title
            .map(Option::unwrap_or_default)
            .filter(|t| *t != existing.title);
        if let Some(title) = &title {
            if title.trim().is_empty() {
                errors.add("title", BLANK);
            }
        }

        let price = match &self.price {
            None => None,
            Some(value) => validate_price(value, &mut errors),
        };

        errors.into_result()?;
        Ok(ProductChanges {
            title,
            price,
            published: self.published,
        })
    }
}

fn validate_price(value: &Value, errors: &mut ValidationErrors) -> Option<Decimal> {
    let parsed = match value {
        Value::Null => {
            errors.add("price", BLANK);
            Err(NOT_A_NUMBER)
        }
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) if s.trim().is_empty() => {
            errors.add("price", BLANK);
            Err(NOT_A_NUMBER)
        }
        Value::String(s) => parse_decimal(s.trim()),
        _ => Err(NOT_A_NUMBER),
    };

    match parsed {
        Err(message) => {
            errors.add("price", message);
            None
        }
        Ok(price) if price.is_sign_negative() && !price.is_zero() => {
            errors.add("price", NEGATIVE);
            None
        }
        Ok(price) => Some(price),
    }
}

// Numbers beyond Decimal's 96-bit mantissa and 28-digit scale are out of range
fn parse_decimal(raw: &str) -> Result<Decimal, &'static str> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .or_else(|_| match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Err(OUT_OF_RANGE),
            _ => Err(NOT_A_NUMBER),
        })
}
