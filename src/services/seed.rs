//! Sample shops for an empty store.

use chrono::Utc;

use crate::{
    error::AppError,
    models::shop::{Address, InventoryItem, NewShop, Unit},
    services::credentials::CredentialStore,
    store::ShopStore,
};

struct SampleShop {
    shop_id: &'static str,
    name: &'static str,
    street: &'static str,
    owner_name: &'static str,
    license_number: &'static str,
    phone_number: &'static str,
    password: &'static str,
    stock: [(&'static str, f64, Unit); 5],
}

const SAMPLE_SHOPS: [SampleShop; 2] = [
    SampleShop {
        shop_id: "SHOP001",
        name: "Main Street Ration",
        street: "123 Main Street",
        owner_name: "John Doe",
        license_number: "LIC001",
        phone_number: "9876543210",
        password: "admin123",
        stock: [
            ("Wheat", 50.0, Unit::Kg),
            ("Rice", 100.0, Unit::Kg),
            ("Sugar", 75.0, Unit::Kg),
            ("Lentils", 60.0, Unit::Kg),
            ("Cooking Oil", 40.0, Unit::Liters),
        ],
    },
    SampleShop {
        shop_id: "SHOP002",
        name: "Central Ration Depot",
        street: "456 Central Avenue",
        owner_name: "Jane Smith",
        license_number: "LIC002",
        phone_number: "9876543211",
        password: "shop123",
        stock: [
            ("Wheat", 80.0, Unit::Kg),
            ("Rice", 120.0, Unit::Kg),
            ("Sugar", 50.0, Unit::Kg),
            ("Lentils", 70.0, Unit::Kg),
            ("Cooking Oil", 35.0, Unit::Liters),
        ],
    },
];

/// Insert the sample shops if no shop exists yet. Returns how many were created.
pub async fn seed_sample_shops(
    shops: &dyn ShopStore,
    credentials: &CredentialStore,
) -> Result<usize, AppError> {
    if shops.count().await? > 0 {
        tracing::debug!("shops present, skipping sample data");
        return Ok(0);
    }

    let now = Utc::now();
    for sample in &SAMPLE_SHOPS {
        let password_hash = credentials.hash_password(sample.password).await?;

        shops
            .insert(NewShop {
                shop_id: sample.shop_id.to_string(),
                name: sample.name.to_string(),
                address: Address {
                    street: sample.street.to_string(),
                    city: "Anytown".to_string(),
                    state: "State".to_string(),
                    pincode: "123456".to_string(),
                },
                owner_name: sample.owner_name.to_string(),
                license_number: sample.license_number.to_string(),
                phone_number: sample.phone_number.to_string(),
                password_hash,
                inventory: sample
                    .stock
                    .iter()
                    .map(|&(product_name, current_stock, unit)| InventoryItem {
                        product_name: product_name.to_string(),
                        current_stock,
                        unit,
                        last_updated: now,
                    })
                    .collect(),
            })
            .await?;
    }

    tracing::info!(count = SAMPLE_SHOPS.len(), "sample shops created");

    Ok(SAMPLE_SHOPS.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{services::credentials::fast_hasher, store::MemoryStore};

    #[tokio::test]
    async fn seeds_once_with_hashed_passwords() {
        let store = Arc::new(MemoryStore::new());
        let credentials = CredentialStore::new(store.clone(), fast_hasher());

        assert_eq!(seed_sample_shops(store.as_ref(), &credentials).await.unwrap(), 2);
        assert_eq!(seed_sample_shops(store.as_ref(), &credentials).await.unwrap(), 0);

        let shops = store.list_active().await.unwrap();
        assert_eq!(shops.len(), 2);
        assert_eq!(shops[0].name, "Central Ration Depot");
        assert_eq!(shops[1].inventory.len(), 5);
        assert_ne!(shops[1].password_hash, "admin123");

        assert!(credentials.verify_password("SHOP001", "admin123").await.unwrap());
        assert!(credentials.verify_password("SHOP002", "shop123").await.unwrap());
    }
}
