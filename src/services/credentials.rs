//! Shop owner credentials.
//!
//! Passwords are hashed with Argon2id behind the `CredentialHasher` seam.
//! Hashing is CPU-bound, so it runs on the blocking pool.

use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::{
    error::{AppError, Resource},
    models::shop::Shop,
    store::ShopStore,
};

/// One-way, salted password hashing.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, AppError>;

    /// `Ok(false)` for a mismatch; `Err` only when the stored hash is unusable.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, AppError>;
}

/// Argon2id with a fixed parameter set.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Argon2id, 19 MiB, 2 passes, 1 lane.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Cheap parameters so tests do not spend seconds hashing.
    #[cfg(test)]
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AppError::Internal(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AppError::Internal("Password hashing failed".to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Stored password hash is malformed".to_string()))?;

        // Parameters come from the PHC string, so older hashes keep verifying
        Ok(self
            .argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Verifies and rotates shop owner passwords.
#[derive(Clone)]
pub struct CredentialStore {
    shops: Arc<dyn ShopStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl CredentialStore {
    pub fn new(shops: Arc<dyn ShopStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { shops, hasher }
    }

    /// Hash a plaintext password for a shop being created.
    pub async fn hash_password(&self, plaintext: &str) -> Result<String, AppError> {
        validate_password(plaintext)?;
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
    }

    /// Check a candidate password against the shop's stored hash.
    ///
    /// # Errors
    ///
    /// - `NotFound(Shop)`: no shop with that id
    pub async fn verify_password(&self, shop_id: &str, candidate: &str) -> Result<bool, AppError> {
        Ok(self.authenticate(shop_id, candidate).await?.is_some())
    }

    /// Load the shop and check the candidate password in one lookup.
    ///
    /// Returns `None` when the password does not match.
    ///
    /// # Errors
    ///
    /// - `NotFound(Shop)`: no shop with that id
    pub async fn authenticate(
        &self,
        shop_id: &str,
        candidate: &str,
    ) -> Result<Option<Shop>, AppError> {
        let shop = self
            .shops
            .find_by_shop_id(shop_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Shop))?;

        let hasher = self.hasher.clone();
        let candidate = candidate.to_string();
        let stored = shop.password_hash.clone();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&candidate, &stored))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {e}")))??;

        if !matched {
            tracing::info!(shop_id = %shop_id, "shop password mismatch");
            return Ok(None);
        }

        Ok(Some(shop))
    }

    /// Replace a shop's password. Only the hash is stored.
    ///
    /// # Errors
    ///
    /// - `Validation`: empty password
    /// - `NotFound(Shop)`: no shop with that id
    pub async fn set_password(&self, shop_id: &str, plaintext: &str) -> Result<(), AppError> {
        let hash = self.hash_password(plaintext).await?;

        if !self.shops.update_password_hash(shop_id, &hash).await? {
            return Err(AppError::NotFound(Resource::Shop));
        }

        tracing::info!(shop_id = %shop_id, "shop password changed");

        Ok(())
    }
}

fn validate_password(plaintext: &str) -> Result<(), AppError> {
    if plaintext.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> Arc<dyn CredentialHasher> {
    Arc::new(Argon2Hasher::with_cost(64, 1).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::shop::{Address, NewShop},
        store::MemoryStore,
    };

    async fn store_with_shop(credentials: &CredentialStore, store: &MemoryStore, password: &str) {
        use crate::store::ShopStore;

        let password_hash = credentials.hash_password(password).await.unwrap();
        store
            .insert(NewShop {
                shop_id: "SHOP001".to_string(),
                name: "Main Street Ration".to_string(),
                address: Address::default(),
                owner_name: "John Doe".to_string(),
                license_number: "LIC001".to_string(),
                phone_number: "9876543210".to_string(),
                password_hash,
                inventory: Vec::new(),
            })
            .await
            .unwrap();
    }

    fn setup() -> (CredentialStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CredentialStore::new(store.clone(), fast_hasher()), store)
    }

    #[test]
    fn hashes_are_salted_and_never_plaintext() {
        let hasher = Argon2Hasher::with_cost(64, 1).unwrap();
        let a = hasher.hash("admin123").unwrap();
        let b = hasher.hash("admin123").unwrap();

        assert_ne!(a, b);
        assert!(!a.contains("admin123"));
        assert!(a.starts_with("$argon2id$"));
        assert!(hasher.verify("admin123", &a).unwrap());
        assert!(!hasher.verify("admin124", &a).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_internal_error() {
        let hasher = Argon2Hasher::with_cost(64, 1).unwrap();
        assert!(matches!(
            hasher.verify("x", "not-a-hash"),
            Err(AppError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn verify_password_matches_only_original_plaintext() {
        let (credentials, store) = setup();
        store_with_shop(&credentials, &store, "admin123").await;

        assert!(credentials.verify_password("SHOP001", "admin123").await.unwrap());
        assert!(!credentials.verify_password("SHOP001", "Admin123").await.unwrap());
        assert!(!credentials.verify_password("SHOP001", "").await.unwrap());
    }

    #[tokio::test]
    async fn verify_password_for_missing_shop_is_not_found() {
        let (credentials, _store) = setup();
        assert!(matches!(
            credentials.verify_password("NOPE", "admin123").await,
            Err(AppError::NotFound(Resource::Shop))
        ));
    }

    #[tokio::test]
    async fn authenticate_returns_the_loaded_shop() {
        let (credentials, store) = setup();
        store_with_shop(&credentials, &store, "admin123").await;

        let shop = credentials
            .authenticate("SHOP001", "admin123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shop.shop_id, "SHOP001");
        assert_eq!(shop.owner_name, "John Doe");

        assert!(credentials
            .authenticate("SHOP001", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            credentials.authenticate("NOPE", "admin123").await,
            Err(AppError::NotFound(Resource::Shop))
        ));
    }

    #[tokio::test]
    async fn set_password_rotates_hash() {
        let (credentials, store) = setup();
        store_with_shop(&credentials, &store, "admin123").await;

        credentials.set_password("SHOP001", "n3w-pass").await.unwrap();

        assert!(!credentials.verify_password("SHOP001", "admin123").await.unwrap());
        assert!(credentials.verify_password("SHOP001", "n3w-pass").await.unwrap());
        assert!(matches!(
            credentials.set_password("SHOP001", "").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            credentials.set_password("NOPE", "x").await,
            Err(AppError::NotFound(Resource::Shop))
        ));
    }
}
