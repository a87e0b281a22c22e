//! In-process store with the same contract as the Postgres backend.
//!
//! Each operation holds the write lock for its whole read-check-write, which
//! gives the same atomicity the SQL statements provide.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        otp::{NewOtp, OtpRecord},
        shop::{InventoryItem, NewShop, Shop},
        user::User,
    },
    store::{OtpStore, ShopStore, Store, UserStore},
};

#[derive(Debug, Default)]
struct Tables {
    otps: Vec<OtpRecord>,
    users: HashMap<String, User>,
    shops: Vec<Shop>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of OTP rows currently held, expired or not.
    #[cfg(test)]
    pub async fn otp_count(&self) -> usize {
        self.tables.read().await.otps.len()
    }

    #[cfg(test)]
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    #[cfg(test)]
    pub async fn user(&self, phone_number: &str) -> Option<User> {
        self.tables.read().await.users.get(phone_number).cloned()
    }

    #[cfg(test)]
    pub async fn set_shop_active(&self, shop_id: &str, active: bool) {
        let mut tables = self.tables.write().await;
        if let Some(shop) = tables.shops.iter_mut().find(|s| s.shop_id == shop_id) {
            shop.is_active = active;
        }
    }
}

#[async_trait]
impl OtpStore for MemoryStore {
    async fn replace(&self, otp: NewOtp) -> Result<OtpRecord, AppError> {
        let mut tables = self.tables.write().await;
        tables.otps.retain(|r| r.phone_number != otp.phone_number);

        let record = OtpRecord {
            id: Uuid::new_v4(),
            phone_number: otp.phone_number,
            code_hash: otp.code_hash,
            expires_at: otp.expires_at,
            is_used: false,
            created_at: otp.created_at,
        };
        tables.otps.push(record.clone());

        Ok(record)
    }

    async fn find_unused(
        &self,
        phone_number: &str,
        code_hash: &str,
    ) -> Result<Option<OtpRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .otps
            .iter()
            .find(|r| r.phone_number == phone_number && r.code_hash == code_hash && !r.is_used)
            .cloned())
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.otps.iter_mut().find(|r| r.id == id && !r.is_used) {
            Some(record) => {
                record.is_used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.otps.len();
        tables.otps.retain(|r| r.expires_at >= cutoff);
        Ok((before - tables.otps.len()) as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_verified(&self, phone_number: &str) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let user = tables
            .users
            .entry(phone_number.to_string())
            .and_modify(|user| {
                user.is_verified = true;
                user.updated_at = now;
            })
            .or_insert_with(|| User {
                id: Uuid::new_v4(),
                phone_number: phone_number.to_string(),
                name: String::new(),
                is_verified: true,
                ration_card_number: None,
                family_members: 1,
                created_at: now,
                updated_at: now,
            });

        Ok(user.clone())
    }
}

#[async_trait]
impl ShopStore for MemoryStore {
    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.tables.read().await.shops.len() as i64)
    }

    async fn insert(&self, shop: NewShop) -> Result<Shop, AppError> {
        let mut tables = self.tables.write().await;

        if tables.shops.iter().any(|s| s.shop_id == shop.shop_id) {
            return Err(AppError::Conflict(format!(
                "Shop {} already exists",
                shop.shop_id
            )));
        }
        if tables
            .shops
            .iter()
            .any(|s| s.license_number == shop.license_number)
        {
            return Err(AppError::Conflict(format!(
                "License {} already registered",
                shop.license_number
            )));
        }

        let now = Utc::now();
        let created = Shop {
            id: Uuid::new_v4(),
            shop_id: shop.shop_id,
            name: shop.name,
            address: shop.address,
            owner_name: shop.owner_name,
            license_number: shop.license_number,
            phone_number: shop.phone_number,
            password_hash: shop.password_hash,
            is_active: true,
            inventory: shop.inventory,
            created_at: now,
            updated_at: now,
        };
        tables.shops.push(created.clone());

        Ok(created)
    }

    async fn list_active(&self) -> Result<Vec<Shop>, AppError> {
        let tables = self.tables.read().await;
        let mut shops: Vec<Shop> = tables.shops.iter().filter(|s| s.is_active).cloned().collect();
        shops.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(shops)
    }

    async fn find_by_shop_id(&self, shop_id: &str) -> Result<Option<Shop>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.shops.iter().find(|s| s.shop_id == shop_id).cloned())
    }

    async fn update_password_hash(
        &self,
        shop_id: &str,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.shops.iter_mut().find(|s| s.shop_id == shop_id) {
            Some(shop) => {
                shop.password_hash = password_hash.to_string();
                shop.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_inventory(
        &self,
        shop_id: &str,
        inventory: &[InventoryItem],
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.shops.iter_mut().find(|s| s.shop_id == shop_id) {
            Some(shop) => {
                shop.inventory = inventory.to_vec();
                shop.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
