//! House data models and API request/response types.
//!
//! This module defines:
//! - `House`: Database entity representing a listing
//! - `HouseForm`: Raw multipart fields as sent by the frontend
//! - `NewHouse` / `HouseChanges`: Validated create and partial-update payloads
//! - `HouseResponse`: Response body with the public image URL

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

use crate::error::AppError;

/// Represents a house record from the database.
///
/// `image` holds the stored filename only. It becomes a URL in
/// [`HouseResponse`].
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct House {
    pub id: i64,
    pub name: String,
    pub city_name: String,
    pub address: String,
    pub price: i64,
    pub type_rent: String,

    /// Free-form amenities document, e.g. `["Furnished", "Pet Allowed"]`
    pub amenities: serde_json::Value,

    pub bedroom: i32,
    pub bathroom: i32,
    pub description: String,
    pub area: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated payload for inserting a house.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewHouse {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "cityname is required"))]
    pub city_name: String,

    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,

    #[validate(range(min = 1, message = "price must be greater than zero"))]
    pub price: i64,

    #[validate(length(min = 1, message = "type_rent is required"))]
    pub type_rent: String,

    pub amenities: serde_json::Value,

    #[validate(range(min = 1, message = "bedroom must be greater than zero"))]
    pub bedroom: i32,

    #[validate(range(min = 1, message = "bathroom must be greater than zero"))]
    pub bathroom: i32,

    pub description: String,
    pub area: String,

    /// Stored filename, filled in once the upload has been written
    pub image: String,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HouseChanges {
    pub name: Option<String>,
    pub city_name: Option<String>,
    pub address: Option<String>,
    pub price: Option<i64>,
    pub type_rent: Option<String>,
    pub amenities: Option<serde_json::Value>,
    pub bedroom: Option<i32>,
    pub bathroom: Option<i32>,
    pub description: Option<String>,
    pub area: Option<String>,
    pub image: Option<String>,
}

impl HouseChanges {
    /// Overwrite the fields of `house` that this update carries.
    pub fn apply(self, house: &mut House) {
        if let Some(name) = self.name {
            house.name = name;
        }
        if let Some(city_name) = self.city_name {
            house.city_name = city_name;
        }
        if let Some(address) = self.address {
            house.address = address;
        }
        if let Some(price) = self.price {
            house.price = price;
        }
        if let Some(type_rent) = self.type_rent {
            house.type_rent = type_rent;
        }
        if let Some(amenities) = self.amenities {
            house.amenities = amenities;
        }
        if let Some(bedroom) = self.bedroom {
            house.bedroom = bedroom;
        }
        if let Some(bathroom) = self.bathroom {
            house.bathroom = bathroom;
        }
        if let Some(description) = self.description {
            house.description = description;
        }
        if let Some(area) = self.area {
            house.area = area;
        }
        if let Some(image) = self.image {
            house.image = image;
        }
    }
}

/// Text fields of the house multipart form, exactly as received.
///
/// Field names follow the frontend (`cityname`, `type_rent`, `Bedroom`...)
/// and are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct HouseForm {
    pub name: Option<String>,
    pub city_name: Option<String>,
    pub address: Option<String>,
    pub price: Option<String>,
    pub type_rent: Option<String>,
    pub amenities: Option<String>,
    pub bedroom: Option<String>,
    pub bathroom: Option<String>,
    pub description: Option<String>,
    pub area: Option<String>,
}

impl HouseForm {
    /// Store a text field. Returns `false` when the name is not a house field.
    pub fn set(&mut self, field: &str, value: String) -> bool {
        let slot = match field.to_ascii_lowercase().as_str() {
            "name" => &mut self.name,
            "cityname" | "city_name" => &mut self.city_name,
            "address" => &mut self.address,
            "price" => &mut self.price,
            "type_rent" => &mut self.type_rent,
            "amenities" => &mut self.amenities,
            "bedroom" => &mut self.bedroom,
            "bathroom" => &mut self.bathroom,
            "description" => &mut self.description,
            "area" => &mut self.area,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Parse and validate a complete listing.
    ///
    /// Numeric fields that are present but not whole numbers are rejected
    /// rather than read as zero. The returned `image` is empty; the caller
    /// sets it after storing the upload.
    pub fn into_new_house(self) -> Result<NewHouse, AppError> {
        let amenities = match non_empty(self.amenities) {
            Some(raw) => parse_amenities(&raw)?,
            None => return Err(AppError::Validation("amenities is required".to_string())),
        };

        let house = NewHouse {
            name: non_empty(self.name).unwrap_or_default(),
            city_name: non_empty(self.city_name).unwrap_or_default(),
            address: non_empty(self.address).unwrap_or_default(),
            price: parse_whole("price", self.price)?.unwrap_or_default(),
            type_rent: non_empty(self.type_rent).unwrap_or_default(),
            amenities,
            bedroom: parse_whole("bedroom", self.bedroom)?.unwrap_or_default(),
            bathroom: parse_whole("bathroom", self.bathroom)?.unwrap_or_default(),
            description: non_empty(self.description).unwrap_or_default(),
            area: non_empty(self.area).unwrap_or_default(),
            image: String::new(),
        };

        house.validate()?;
        Ok(house)
    }

    /// Parse a partial update.
    ///
    /// Empty strings and zero numbers mean "unchanged". Negative numbers and
    /// unparseable values are validation errors.
    pub fn into_changes(self, image: Option<String>) -> Result<HouseChanges, AppError> {
        let amenities = non_empty(self.amenities)
            .map(|raw| parse_amenities(&raw))
            .transpose()?;

        Ok(HouseChanges {
            name: non_empty(self.name),
            city_name: non_empty(self.city_name),
            address: non_empty(self.address),
            price: positive("price", parse_whole("price", self.price)?)?,
            type_rent: non_empty(self.type_rent),
            amenities,
            bedroom: positive("bedroom", parse_whole("bedroom", self.bedroom)?)?,
            bathroom: positive("bathroom", parse_whole("bathroom", self.bathroom)?)?,
            description: non_empty(self.description),
            area: non_empty(self.area),
            image,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_whole<T: FromStr>(field: &str, value: Option<String>) -> Result<Option<T>, AppError> {
    non_empty(value)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| AppError::Validation(format!("{field} must be a whole number")))
        })
        .transpose()
}

/// Zero is "not provided" for updates.
fn positive<T>(field: &str, value: Option<T>) -> Result<Option<T>, AppError>
where
    T: PartialOrd + Default,
{
    match value {
        Some(v) if v < T::default() => Err(AppError::Validation(format!(
            "{field} must be greater than zero"
        ))),
        Some(v) if v == T::default() => Ok(None),
        other => Ok(other),
    }
}

fn parse_amenities(raw: &str) -> Result<serde_json::Value, AppError> {
    serde_json::from_str(raw)
        .map_err(|_| AppError::Validation("amenities must be a JSON document".to_string()))
}

/// Response body for house endpoints.
///
/// Identical to [`House`] except that `image` is a fully-qualified URL.
#[derive(Debug, Clone, Serialize)]
pub struct HouseResponse {
    pub id: i64,
    pub name: String,
    pub city_name: String,
    pub address: String,
    pub price: i64,
    pub type_rent: String,
    pub amenities: serde_json::Value,
    pub bedroom: i32,
    pub bathroom: i32,
    pub description: String,
    pub area: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HouseResponse {
    /// Build the response, prefixing the stored filename with `base_url`.
    pub fn with_base_url(house: House, base_url: &str) -> Self {
        Self {
            id: house.id,
            name: house.name,
            city_name: house.city_name,
            address: house.address,
            price: house.price,
            type_rent: house.type_rent,
            amenities: house.amenities,
            bedroom: house.bedroom,
            bathroom: house.bathroom,
            description: house.description,
            area: house.area,
            image: format!("{base_url}{}", house.image),
            created_at: house.created_at,
            updated_at: house.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_form() -> HouseForm {
        let mut form = HouseForm::default();
        for (field, value) in [
            ("name", "Sunny Loft"),
            ("cityname", "Jakarta"),
            ("address", "Jl. Sudirman 1"),
            ("price", "900000"),
            ("type_rent", "day"),
            ("amenities", r#"["Furnished","Pet Allowed"]"#),
            ("Bedroom", "2"),
            ("Bathroom", "1"),
            ("description", "Close to the station"),
            ("area", "1800 sqft"),
        ] {
            assert!(form.set(field, value.to_string()));
        }
        form
    }

    fn stored_house() -> House {
        House {
            id: 7,
            name: "Old Name".to_string(),
            city_name: "Bandung".to_string(),
            address: "Jl. Braga 2".to_string(),
            price: 500_000,
            type_rent: "month".to_string(),
            amenities: json!(["Furnished"]),
            bedroom: 3,
            bathroom: 2,
            description: "Quiet".to_string(),
            area: "2000 sqft".to_string(),
            image: "abc-house.png".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn complete_form_parses() {
        let house = full_form().into_new_house().unwrap();

        assert_eq!(house.name, "Sunny Loft");
        assert_eq!(house.price, 900_000);
        assert_eq!(house.bedroom, 2);
        assert_eq!(house.amenities, json!(["Furnished", "Pet Allowed"]));
    }

    #[test]
    fn missing_name_is_validation_error() {
        let mut form = full_form();
        form.name = None;

        let err = form.into_new_house().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("name is required")));
    }

    #[test]
    fn unparseable_price_is_rejected_not_zeroed() {
        let mut form = full_form();
        form.price = Some("nine hundred".to_string());

        let err = form.into_new_house().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg == "price must be a whole number"));
    }

    #[test]
    fn invalid_amenities_json_is_rejected() {
        let mut form = full_form();
        form.amenities = Some("{not json".to_string());

        assert!(matches!(
            form.into_new_house(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn unknown_field_is_reported() {
        let mut form = HouseForm::default();
        assert!(!form.set("colour", "blue".to_string()));
    }

    #[test]
    fn price_only_update_changes_only_price() {
        let mut form = HouseForm::default();
        form.set("price", "750000".to_string());
        form.set("name", "   ".to_string());
        form.set("bedroom", "0".to_string());

        let changes = form.into_changes(None).unwrap();
        assert_eq!(
            changes,
            HouseChanges {
                price: Some(750_000),
                ..HouseChanges::default()
            }
        );

        let original = stored_house();
        let mut updated = original.clone();
        changes.apply(&mut updated);

        assert_eq!(updated.price, 750_000);
        assert_eq!(
            House {
                price: original.price,
                ..updated
            },
            original
        );
    }

    #[test]
    fn negative_update_is_rejected() {
        let mut form = HouseForm::default();
        form.set("bathroom", "-1".to_string());

        assert!(matches!(
            form.into_changes(None),
            Err(AppError::Validation(ref msg)) if msg == "bathroom must be greater than zero"
        ));
    }

    #[test]
    fn response_prefixes_image() {
        let response = HouseResponse::with_base_url(stored_house(), "http://localhost:5000/uploads/");
        assert_eq!(response.image, "http://localhost:5000/uploads/abc-house.png");
    }
}
