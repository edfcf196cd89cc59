//! Product validation.
//!
//! The schema every queued product must satisfy before it is persisted.
//! Candidates arrive with numeric fields already coerced; anything that fails
//! here is dropped by the batch processor, never retried.

use serde::Serialize;

/// Length limits for validated fields.
pub mod limits {
    /// Maximum product name length, in characters.
    pub const MAX_NAME_LENGTH: usize = 256;
    /// Maximum description length, in characters.
    pub const MAX_DESCRIPTION_LENGTH: usize = 4096;
    /// Largest stock count accepted.
    pub const MAX_COUNT: u64 = u32::MAX as u64;
    /// Largest price accepted. Keeps the stored number short enough for any
    /// table backend.
    pub const MAX_PRICE: f64 = 1e12;
    /// Smallest non-zero price accepted.
    pub const MIN_NONZERO_PRICE: f64 = 1e-6;
}

/// Error constants for validation failures.
pub mod errmsg {
    pub const NAME_MISSING: &str = "name is required";
    pub const NAME_BLANK: &str = "name cannot be blank";
    pub const NAME_TOO_LONG: &str = "name exceeds maximum length";

    pub const DESCRIPTION_TOO_LONG: &str = "description exceeds maximum length";

    pub const PRICE_NOT_A_NUMBER: &str = "price must be a number";
    pub const PRICE_NEGATIVE: &str = "price cannot be negative";
    pub const PRICE_TOO_LARGE: &str = "price exceeds maximum";
    pub const PRICE_TOO_SMALL: &str = "price is below the smallest accepted amount";

    pub const COUNT_NOT_A_NUMBER: &str = "count must be a number";
    pub const COUNT_NEGATIVE: &str = "count cannot be negative";
    pub const COUNT_NOT_INTEGER: &str = "count must be a whole number";
    pub const COUNT_TOO_LARGE: &str = "count exceeds maximum";
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A decoded product with numeric fields coerced but nothing checked.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    /// NaN when the source value was missing or not numeric.
    pub price: f64,
    /// NaN when the source value was missing or not numeric.
    pub count: f64,
}

/// A product that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidProduct {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub count: u64,
}

/// Validate a candidate product.
///
/// Rules:
/// - `name` present, non-blank, at most 256 characters
/// - `price` a finite number, zero or between `MIN_NONZERO_PRICE` and
///   `MAX_PRICE`
/// - `count` a whole number between 0 and `u32::MAX`
/// - `description` optional, at most 4096 characters
pub fn validate_product(candidate: &CandidateProduct) -> Result<ValidProduct, ValidationError> {
    let name = validate_name(candidate.name.as_deref())?;
    let price = validate_price(candidate.price)?;
    let count = validate_count(candidate.count)?;

    if let Some(description) = &candidate.description {
        let len = description.chars().count();
        if len > limits::MAX_DESCRIPTION_LENGTH {
            return Err(ValidationError::new(
                "description",
                format!(
                    "{} (max: {}, got: {})",
                    errmsg::DESCRIPTION_TOO_LONG,
                    limits::MAX_DESCRIPTION_LENGTH,
                    len
                ),
            ));
        }
    }

    Ok(ValidProduct {
        name,
        description: candidate.description.clone(),
        price,
        count,
    })
}

fn validate_name(name: Option<&str>) -> Result<String, ValidationError> {
    let name = name.ok_or_else(|| ValidationError::new("name", errmsg::NAME_MISSING))?;
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", errmsg::NAME_BLANK));
    }
    let len = name.chars().count();
    if len > limits::MAX_NAME_LENGTH {
        return Err(ValidationError::new(
            "name",
            format!(
                "{} (max: {}, got: {})",
                errmsg::NAME_TOO_LONG,
                limits::MAX_NAME_LENGTH,
                len
            ),
        ));
    }
    Ok(name.to_string())
}

fn validate_price(price: f64) -> Result<f64, ValidationError> {
    if !price.is_finite() {
        return Err(ValidationError::new("price", errmsg::PRICE_NOT_A_NUMBER));
    }
    if price < 0.0 {
        return Err(ValidationError::new("price", errmsg::PRICE_NEGATIVE));
    }
    if price > limits::MAX_PRICE {
        return Err(ValidationError::new(
            "price",
            format!("{} (max: {})", errmsg::PRICE_TOO_LARGE, limits::MAX_PRICE),
        ));
    }
    if price > 0.0 && price < limits::MIN_NONZERO_PRICE {
        return Err(ValidationError::new(
            "price",
            format!(
                "{} (min: {})",
                errmsg::PRICE_TOO_SMALL,
                limits::MIN_NONZERO_PRICE
            ),
        ));
    }
    Ok(price)
}

fn validate_count(count: f64) -> Result<u64, ValidationError> {
    if !count.is_finite() {
        return Err(ValidationError::new("count", errmsg::COUNT_NOT_A_NUMBER));
    }
    if count < 0.0 {
        return Err(ValidationError::new("count", errmsg::COUNT_NEGATIVE));
    }
    if count.fract() != 0.0 {
        return Err(ValidationError::new("count", errmsg::COUNT_NOT_INTEGER));
    }
    if count > limits::MAX_COUNT as f64 {
        return Err(ValidationError::new("count", errmsg::COUNT_TOO_LARGE));
    }
    Ok(count as u64)
}
