//! Shop account data models and API request/response types.
//!
//! This module defines:
//! - `Shop`: Database entity representing a ration shop and its stock
//! - `InventoryItem` / `Unit`: one line of a shop's inventory
//! - Request and response bodies for login, listing and inventory edits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product names that `set_quantity` recognizes as measured by volume.
pub const OIL_TERMS: &[&str] = &["oil", "cooking oil"];

/// Measurement unit for a stock line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Weight, in kilograms
    Kg,
    /// Volume, in liters
    Liters,
}

impl Unit {
    /// Exact-term inference: only a recognized oil name is a volume.
    pub fn for_known_product(product_name: &str) -> Self {
        let normalized = product_name.trim().to_lowercase();
        if OIL_TERMS.contains(&normalized.as_str()) {
            Unit::Liters
        } else {
            Unit::Kg
        }
    }

    /// Substring inference: anything mentioning oil is a volume.
    pub fn for_new_product(product_name: &str) -> Self {
        if product_name.to_lowercase().contains("oil") {
            Unit::Liters
        } else {
            Unit::Kg
        }
    }
}

/// A single trackable stock line within a shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Unique within a shop, compared case-insensitively
    pub product_name: String,

    /// Never negative
    pub current_stock: f64,

    pub unit: Unit,

    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    /// Case-insensitive name comparison used by every inventory operation.
    pub fn is_named(&self, product_name: &str) -> bool {
        self.product_name.to_lowercase() == product_name.to_lowercase()
    }
}

/// Postal address of a shop, stored as a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Represents a shop record from the database.
///
/// # Database Table
///
/// Maps to the `shops` table. `shop_id` and `license_number` are unique.
/// `address` and `inventory` are JSONB columns so the whole stock list is
/// read and written as one document.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Shop {
    /// Internal surrogate key
    pub id: Uuid,

    /// Business identifier the owner logs in with (e.g. "SHOP001")
    pub shop_id: String,

    pub name: String,

    #[sqlx(json)]
    pub address: Address,

    pub owner_name: String,

    pub license_number: String,

    pub phone_number: String,

    /// Argon2 PHC string; the plaintext is never stored
    pub password_hash: String,

    /// Inactive shops are hidden from the directory
    pub is_active: bool,

    /// Ordered stock lines
    #[sqlx(json)]
    pub inventory: Vec<InventoryItem>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a shop. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewShop {
    pub shop_id: String,
    pub name: String,
    pub address: Address,
    pub owner_name: String,
    pub license_number: String,
    pub phone_number: String,
    pub password_hash: String,
    pub inventory: Vec<InventoryItem>,
}

/// Public directory entry. Everything except the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopResponse {
    pub id: Uuid,
    pub shop_id: String,
    pub name: String,
    pub address: Address,
    pub owner_name: String,
    pub license_number: String,
    pub phone_number: String,
    pub is_active: bool,
    pub inventory: Vec<InventoryItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Shop> for ShopResponse {
    fn from(shop: Shop) -> Self {
        Self {
            id: shop.id,
            shop_id: shop.shop_id,
            name: shop.name,
            address: shop.address,
            owner_name: shop.owner_name,
            license_number: shop.license_number,
            phone_number: shop.phone_number,
            is_active: shop.is_active,
            inventory: shop.inventory,
            created_at: shop.created_at,
            updated_at: shop.updated_at,
        }
    }
}

/// The slice of a shop returned on owner login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSession {
    pub id: Uuid,
    pub shop_id: String,
    pub name: String,
    pub owner_name: String,
    pub inventory: Vec<InventoryItem>,
}

impl From<Shop> for ShopSession {
    fn from(shop: Shop) -> Self {
        Self {
            id: shop.id,
            shop_id: shop.shop_id,
            name: shop.name,
            owner_name: shop.owner_name,
            inventory: shop.inventory,
        }
    }
}

/// Request body for `POST /api/shops/login`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopLoginRequest {
    #[serde(default)]
    pub shop_id: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for `PUT /api/shops/{shopId}/password`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request body for setting or adding a stock line.
///
/// # JSON Example
///
/// ```json
/// {
///   "productName": "Cooking Oil",
///   "quantity": 20,
///   "unit": "liters"
/// }
/// ```
///
/// `unit` is optional and overrides inference from the name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRequest {
    pub product_name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<Unit>,
}

/// Response body for every inventory mutation.
#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub success: bool,
    pub message: String,
    pub inventory: Vec<InventoryItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_product_inference_is_exact() {
        assert_eq!(Unit::for_known_product("Cooking Oil"), Unit::Liters);
        assert_eq!(Unit::for_known_product("  OIL "), Unit::Liters);
        assert_eq!(Unit::for_known_product("Mustard Oil"), Unit::Kg);
        assert_eq!(Unit::for_known_product("Wheat"), Unit::Kg);
    }

    #[test]
    fn new_product_inference_matches_substring() {
        assert_eq!(Unit::for_new_product("Mustard Oil"), Unit::Liters);
        assert_eq!(Unit::for_new_product("Boiled Rice"), Unit::Liters);
        assert_eq!(Unit::for_new_product("Sugar"), Unit::Kg);
    }

    #[test]
    fn unit_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Unit::Liters).unwrap(), "\"liters\"");
        let unit: Unit = serde_json::from_str("\"kg\"").unwrap();
        assert_eq!(unit, Unit::Kg);
    }
}
