//! Inventory mutator - add, overwrite and remove stock lines for a shop.
//!
//! Product names are unique per shop, compared case-insensitively. Each
//! operation loads the shop's stock list, edits it, and writes the whole list
//! back, so two concurrent edits of one shop resolve last-write-wins.

use std::sync::Arc;

use crate::{
    clock::Clock,
    error::{AppError, Resource},
    models::shop::{InventoryItem, Unit},
    store::ShopStore,
};

#[derive(Clone)]
pub struct InventoryMutator {
    shops: Arc<dyn ShopStore>,
    clock: Arc<dyn Clock>,
}

impl InventoryMutator {
    pub fn new(shops: Arc<dyn ShopStore>, clock: Arc<dyn Clock>) -> Self {
        Self { shops, clock }
    }

    /// Overwrite the stock of a product, creating the line if missing.
    ///
    /// New lines get `liters` only when the name is a recognized oil term,
    /// unless `unit` is given.
    ///
    /// # Errors
    ///
    /// - `Validation`: empty name, negative or non-finite quantity
    /// - `NotFound(Shop)`: unknown shop
    pub async fn set_quantity(
        &self,
        shop_id: &str,
        product_name: &str,
        quantity: f64,
        unit: Option<Unit>,
    ) -> Result<Vec<InventoryItem>, AppError> {
        let product_name = validate_product(product_name, quantity)?;
        let mut inventory = self.load(shop_id).await?;
        let now = self.clock.now();

        match inventory.iter_mut().find(|item| item.is_named(product_name)) {
            Some(item) => {
                item.current_stock = quantity;
                item.last_updated = now;
                if let Some(unit) = unit {
                    item.unit = unit;
                }
            }
            None => inventory.push(InventoryItem {
                product_name: product_name.to_string(),
                current_stock: quantity,
                unit: unit.unwrap_or_else(|| Unit::for_known_product(product_name)),
                last_updated: now,
            }),
        }

        self.save(shop_id, &inventory).await?;
        tracing::info!(shop_id = %shop_id, product = %product_name, quantity, "stock set");

        Ok(inventory)
    }

    /// Append a new product.
    ///
    /// # Errors
    ///
    /// - `Validation`: empty name, negative or non-finite quantity
    /// - `Conflict`: a product with the same name (ignoring case) exists
    /// - `NotFound(Shop)`: unknown shop
    pub async fn add_product(
        &self,
        shop_id: &str,
        product_name: &str,
        quantity: f64,
        unit: Option<Unit>,
    ) -> Result<Vec<InventoryItem>, AppError> {
        let product_name = validate_product(product_name, quantity)?;
        let mut inventory = self.load(shop_id).await?;

        if inventory.iter().any(|item| item.is_named(product_name)) {
            return Err(AppError::Conflict("Product already exists".to_string()));
        }

        inventory.push(InventoryItem {
            product_name: product_name.to_string(),
            current_stock: quantity,
            unit: unit.unwrap_or_else(|| Unit::for_new_product(product_name)),
            last_updated: self.clock.now(),
        });

        self.save(shop_id, &inventory).await?;
        tracing::info!(shop_id = %shop_id, product = %product_name, quantity, "product added");

        Ok(inventory)
    }

    /// Remove every line with this name. Removing nothing is not an error.
    pub async fn remove_product(
        &self,
        shop_id: &str,
        product_name: &str,
    ) -> Result<Vec<InventoryItem>, AppError> {
        let product_name = product_name.trim();
        let mut inventory = self.load(shop_id).await?;
        let before = inventory.len();

        inventory.retain(|item| !item.is_named(product_name));

        if inventory.len() != before {
            self.save(shop_id, &inventory).await?;
            tracing::info!(shop_id = %shop_id, product = %product_name, "product removed");
        }

        Ok(inventory)
    }

    async fn load(&self, shop_id: &str) -> Result<Vec<InventoryItem>, AppError> {
        self.shops
            .find_by_shop_id(shop_id)
            .await?
            .map(|shop| shop.inventory)
            .ok_or(AppError::NotFound(Resource::Shop))
    }

    async fn save(&self, shop_id: &str, inventory: &[InventoryItem]) -> Result<(), AppError> {
        if self.shops.save_inventory(shop_id, inventory).await? {
            Ok(())
        } else {
            // Deleted between load and save
            Err(AppError::NotFound(Resource::Shop))
        }
    }
}

/// Trimmed product name, or a validation error.
fn validate_product(product_name: &str, quantity: f64) -> Result<&str, AppError> {
    let product_name = product_name.trim();
    if product_name.is_empty() {
        return Err(AppError::Validation("Product name is required".to_string()));
    }
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(AppError::Validation(
            "Quantity must be a non-negative number".to_string(),
        ));
    }
    Ok(product_name)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        clock::ManualClock,
        models::shop::{Address, NewShop},
        store::MemoryStore,
    };

    async fn setup() -> (InventoryMutator, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        store
            .insert(NewShop {
                shop_id: "SHOP001".to_string(),
                name: "Main Street Ration".to_string(),
                address: Address::default(),
                owner_name: "John Doe".to_string(),
                license_number: "LIC001".to_string(),
                phone_number: "9876543210".to_string(),
                password_hash: "hash".to_string(),
                inventory: Vec::new(),
            })
            .await
            .unwrap();
        (
            InventoryMutator::new(store.clone(), clock.clone()),
            store,
            clock,
        )
    }

    async fn stored(store: &MemoryStore) -> Vec<InventoryItem> {
        store
            .find_by_shop_id("SHOP001")
            .await
            .unwrap()
            .unwrap()
            .inventory
    }

    #[tokio::test]
    async fn duplicate_add_conflicts_ignoring_case() {
        let (mutator, store, _) = setup().await;

        mutator.add_product("SHOP001", "Rice", 10.0, None).await.unwrap();
        assert!(matches!(
            mutator.add_product("SHOP001", "rice", 5.0, None).await,
            Err(AppError::Conflict(_))
        ));

        let inventory = stored(&store).await;
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].product_name, "Rice");
        assert_eq!(inventory[0].current_stock, 10.0);
    }

    #[tokio::test]
    async fn set_quantity_infers_unit_for_new_lines() {
        let (mutator, _, _) = setup().await;

        mutator
            .set_quantity("SHOP001", "Cooking Oil", 20.0, None)
            .await
            .unwrap();
        let inventory = mutator
            .set_quantity("SHOP001", "Wheat", 20.0, None)
            .await
            .unwrap();

        assert_eq!(inventory[0].unit, Unit::Liters);
        assert_eq!(inventory[1].unit, Unit::Kg);
    }

    #[tokio::test]
    async fn set_quantity_overwrites_existing_line() {
        let (mutator, store, clock) = setup().await;
        mutator.add_product("SHOP001", "Sugar", 75.0, None).await.unwrap();
        let first_update = stored(&store).await[0].last_updated;

        clock.advance(Duration::minutes(3));
        let inventory = mutator
            .set_quantity("SHOP001", "SUGAR", 40.0, None)
            .await
            .unwrap();

        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].product_name, "Sugar");
        assert_eq!(inventory[0].current_stock, 40.0);
        assert_eq!(inventory[0].last_updated, first_update + Duration::minutes(3));
    }

    #[tokio::test]
    async fn add_product_uses_substring_oil_rule_and_explicit_unit() {
        let (mutator, _, _) = setup().await;

        mutator
            .add_product("SHOP001", "Mustard Oil", 5.0, None)
            .await
            .unwrap();
        let inventory = mutator
            .add_product("SHOP001", "Milk", 5.0, Some(Unit::Liters))
            .await
            .unwrap();

        assert_eq!(inventory[0].unit, Unit::Liters);
        assert_eq!(inventory[1].unit, Unit::Liters);
    }

    #[tokio::test]
    async fn negative_or_invalid_input_is_rejected() {
        let (mutator, store, _) = setup().await;

        assert!(matches!(
            mutator.set_quantity("SHOP001", "Rice", -1.0, None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            mutator.add_product("SHOP001", "Rice", f64::NAN, None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            mutator.add_product("SHOP001", "   ", 1.0, None).await,
            Err(AppError::Validation(_))
        ));
        assert!(stored(&store).await.is_empty());

        mutator.set_quantity("SHOP001", "Rice", 0.0, None).await.unwrap();
    }

    #[tokio::test]
    async fn remove_is_idempotent_and_case_insensitive() {
        let (mutator, store, _) = setup().await;
        mutator.add_product("SHOP001", "Lentils", 60.0, None).await.unwrap();

        let unchanged = mutator
            .remove_product("SHOP001", "Nonexistent")
            .await
            .unwrap();
        assert_eq!(unchanged.len(), 1);

        let emptied = mutator.remove_product("SHOP001", "lentils").await.unwrap();
        assert!(emptied.is_empty());
        assert!(stored(&store).await.is_empty());
        assert!(mutator.remove_product("SHOP001", "lentils").await.is_ok());
    }

    #[tokio::test]
    async fn remove_matches_the_trimmed_name_that_was_stored() {
        let (mutator, store, _) = setup().await;
        mutator.add_product("SHOP001", " Rice ", 10.0, None).await.unwrap();
        assert_eq!(stored(&store).await[0].product_name, "Rice");

        let inventory = mutator.remove_product("SHOP001", " Rice ").await.unwrap();
        assert!(inventory.is_empty());
        assert!(stored(&store).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_shop_is_not_found() {
        let (mutator, _, _) = setup().await;
        assert!(matches!(
            mutator.set_quantity("SHOP999", "Rice", 1.0, None).await,
            Err(AppError::NotFound(Resource::Shop))
        ));
        assert!(matches!(
            mutator.remove_product("SHOP999", "Rice").await,
            Err(AppError::NotFound(Resource::Shop))
        ));
    }

    #[tokio::test]
    async fn concurrent_edits_of_one_product_keep_one_writer() {
        let (mutator, store, _) = setup().await;
        mutator.add_product("SHOP001", "Rice", 100.0, None).await.unwrap();

        let a = mutator.clone();
        let b = mutator.clone();
        let (ra, rb) = tokio::join!(
            a.set_quantity("SHOP001", "Rice", 10.0, None),
            b.set_quantity("SHOP001", "Rice", 20.0, None),
        );
        ra.unwrap();
        rb.unwrap();

        let inventory = stored(&store).await;
        assert_eq!(inventory.len(), 1);
        assert!(inventory[0].current_stock == 10.0 || inventory[0].current_stock == 20.0);
    }

    #[tokio::test]
    async fn concurrent_edits_of_different_products_never_corrupt() {
        let (mutator, store, _) = setup().await;

        let a = mutator.clone();
        let b = mutator.clone();
        let (ra, rb) = tokio::join!(
            a.add_product("SHOP001", "Wheat", 1.0, None),
            b.add_product("SHOP001", "Sugar", 2.0, None),
        );
        ra.unwrap();
        rb.unwrap();

        // Last write wins: one or both lines survive, never a duplicate
        let inventory = stored(&store).await;
        assert!(!inventory.is_empty() && inventory.len() <= 2);
        let mut names: Vec<_> = inventory.iter().map(|i| i.product_name.clone()).collect();
        names.dedup();
        assert_eq!(names.len(), inventory.len());
    }
}
