use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::util::require_fields;

/// A purchasable program listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub title: String,
    pub body_fat_range: String,
    pub description: String,
    pub long_description: String,
    pub emoji: String,
    #[serde(default)]
    pub price_gbp: f64,
    #[serde(default)]
    pub price_usd: f64,
    #[serde(default)]
    pub discount_percentage: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Admin create payload. Text fields are optional here so validation can
/// name the first missing one instead of failing deserialization.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreatePackage {
    pub title: Option<String>,
    pub body_fat_range: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub emoji: Option<String>,
    #[serde(default)]
    pub price_gbp: f64,
    #[serde(default)]
    pub price_usd: f64,
    #[serde(default)]
    pub discount_percentage: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_true() -> bool {
    true
}

/// Keep an explicit `null` distinct from an absent field.
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl CreatePackage {
    pub const REQUIRED: [&'static str; 5] = [
        "title",
        "body_fat_range",
        "description",
        "long_description",
        "emoji",
    ];

    pub fn validate(&self) -> Result<()> {
        require_fields(&[
            ("title", self.title.as_deref()),
            ("body_fat_range", self.body_fat_range.as_deref()),
            ("description", self.description.as_deref()),
            ("long_description", self.long_description.as_deref()),
            ("emoji", self.emoji.as_deref()),
        ])?;
        validate_pricing(Some(self.price_gbp), Some(self.price_usd), Some(self.discount_percentage))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdatePackage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_gbp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<i32>,
    /// `Some(None)` clears the image
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

impl UpdatePackage {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("title", &self.title),
            ("body_fat_range", &self.body_fat_range),
            ("description", &self.description),
            ("long_description", &self.long_description),
            ("emoji", &self.emoji),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(crate::error::AppError::BadRequest(format!(
                    "Field must not be empty: {}",
                    name
                )));
            }
        }
        validate_pricing(self.price_gbp, self.price_usd, self.discount_percentage)
    }
}

fn validate_pricing(gbp: Option<f64>, usd: Option<f64>, discount: Option<i32>) -> Result<()> {
    use crate::error::AppError;

    for (name, price) in [("price_gbp", gbp), ("price_usd", usd)] {
        if let Some(p) = price {
            if !p.is_finite() || p < 0.0 {
                return Err(AppError::BadRequest(format!("Invalid price: {}", name)));
            }
        }
    }
    if let Some(d) = discount {
        if !(0..=100).contains(&d) {
            return Err(AppError::BadRequest(
                "discount_percentage must be between 0 and 100".into(),
            ));
        }
    }
    Ok(())
}
