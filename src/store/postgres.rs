//! PostgreSQL-backed store.
//!
//! Every mutation that must be atomic is a single SQL statement (or one
//! transaction), never a read followed by a separate write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    db::{DbPool, unique_violation},
    error::AppError,
    models::{
        otp::{NewOtp, OtpRecord},
        shop::{InventoryItem, NewShop, Shop},
        user::User,
    },
    store::{OtpStore, ShopStore, Store, UserStore},
};

/// Store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for PgStore {
    async fn replace(&self, otp: NewOtp) -> Result<OtpRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        // Invalidate anything outstanding for this number
        sqlx::query("DELETE FROM otps WHERE phone_number = $1")
            .bind(&otp.phone_number)
            .execute(&mut *tx)
            .await?;

        let record = sqlx::query_as::<_, OtpRecord>(
            r#"
            INSERT INTO otps (phone_number, code_hash, expires_at, is_used, created_at)
            VALUES ($1, $2, $3, FALSE, $4)
            RETURNING id, phone_number, code_hash, expires_at, is_used, created_at
            "#,
        )
        .bind(&otp.phone_number)
        .bind(&otp.code_hash)
        .bind(otp.expires_at)
        .bind(otp.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn find_unused(
        &self,
        phone_number: &str,
        code_hash: &str,
    ) -> Result<Option<OtpRecord>, AppError> {
        let record = sqlx::query_as::<_, OtpRecord>(
            r#"
            SELECT id, phone_number, code_hash, expires_at, is_used, created_at
            FROM otps
            WHERE phone_number = $1 AND code_hash = $2 AND is_used = FALSE
            "#,
        )
        .bind(phone_number)
        .bind(code_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AppError> {
        let updated = sqlx::query("UPDATE otps SET is_used = TRUE WHERE id = $1 AND is_used = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(updated == 1)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let deleted = sqlx::query("DELETE FROM otps WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn upsert_verified(&self, phone_number: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (phone_number, is_verified)
            VALUES ($1, TRUE)
            ON CONFLICT (phone_number)
            DO UPDATE SET is_verified = TRUE, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(phone_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl ShopStore for PgStore {
    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shops")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn insert(&self, shop: NewShop) -> Result<Shop, AppError> {
        let result = sqlx::query_as::<_, Shop>(
            r#"
            INSERT INTO shops (
                shop_id,
                name,
                address,
                owner_name,
                license_number,
                phone_number,
                password_hash,
                inventory
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&shop.shop_id)
        .bind(&shop.name)
        .bind(Json(&shop.address))
        .bind(&shop.owner_name)
        .bind(&shop.license_number)
        .bind(&shop.phone_number)
        .bind(&shop.password_hash)
        .bind(Json(&shop.inventory))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) => match unique_violation(&e) {
                Some(constraint) => Err(AppError::Conflict(format!(
                    "Shop violates {constraint}"
                ))),
                None => Err(e.into()),
            },
        }
    }

    async fn list_active(&self) -> Result<Vec<Shop>, AppError> {
        let shops =
            sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE is_active = TRUE ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(shops)
    }

    async fn find_by_shop_id(&self, shop_id: &str) -> Result<Option<Shop>, AppError> {
        let shop = sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE shop_id = $1")
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shop)
    }

    async fn update_password_hash(
        &self,
        shop_id: &str,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let updated = sqlx::query(
            "UPDATE shops SET password_hash = $1, updated_at = NOW() WHERE shop_id = $2",
        )
        .bind(password_hash)
        .bind(shop_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn save_inventory(
        &self,
        shop_id: &str,
        inventory: &[InventoryItem],
    ) -> Result<bool, AppError> {
        let updated =
            sqlx::query("UPDATE shops SET inventory = $1, updated_at = NOW() WHERE shop_id = $2")
                .bind(Json(inventory))
                .bind(shop_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(updated == 1)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
