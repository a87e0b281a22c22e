//! Persistence seams.
//!
//! Each component receives only the repository trait it needs. Both
//! backends honour the same contract:
//! - `OtpStore::consume` is a compare-and-set on `is_used`, so two racing
//!   verifications of one code cannot both succeed
//! - `UserStore::upsert_verified` never creates a second row for a phone number
//! - `ShopStore::insert` rejects duplicate `shop_id` / `license_number` with `Conflict`
//! - `ShopStore::save_inventory` replaces the whole list (last write wins)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        otp::{NewOtp, OtpRecord},
        shop::{InventoryItem, NewShop, Shop},
        user::User,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Delete every record for the phone number, then insert the new one.
    async fn replace(&self, otp: NewOtp) -> Result<OtpRecord, AppError>;

    /// Find the unused record matching phone number and code digest.
    async fn find_unused(
        &self,
        phone_number: &str,
        code_hash: &str,
    ) -> Result<Option<OtpRecord>, AppError>;

    /// Flip `is_used` from false to true. Returns false when another caller
    /// got there first or the record is gone.
    async fn consume(&self, id: uuid::Uuid) -> Result<bool, AppError>;

    /// Delete records whose expiry is before `cutoff`. Returns how many.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the user verified, or mark the existing one verified.
    async fn upsert_verified(&self, phone_number: &str) -> Result<User, AppError>;
}

#[async_trait]
pub trait ShopStore: Send + Sync {
    async fn count(&self) -> Result<i64, AppError>;

    async fn insert(&self, shop: NewShop) -> Result<Shop, AppError>;

    /// Active shops ordered by name.
    async fn list_active(&self) -> Result<Vec<Shop>, AppError>;

    async fn find_by_shop_id(&self, shop_id: &str) -> Result<Option<Shop>, AppError>;

    /// Returns false when no such shop exists.
    async fn update_password_hash(
        &self,
        shop_id: &str,
        password_hash: &str,
    ) -> Result<bool, AppError>;

    /// Returns false when no such shop exists.
    async fn save_inventory(
        &self,
        shop_id: &str,
        inventory: &[InventoryItem],
    ) -> Result<bool, AppError>;
}

/// Everything the server needs from a backend.
#[async_trait]
pub trait Store: OtpStore + UserStore + ShopStore {
    /// Cheap connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}
