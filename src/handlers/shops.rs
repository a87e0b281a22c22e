//! Shop directory, owner login and inventory handlers.
//!
//! - GET /api/shops - List active shops
//! - POST /api/shops/login - Owner login with shop id and password
//! - PUT /api/shops/{shopId}/inventory - Set stock for a product
//! - POST /api/shops/{shopId}/inventory - Add a new product
//! - DELETE /api/shops/{shopId}/inventory/{productName} - Remove a product
//! - PUT /api/shops/{shopId}/password - Change the owner password

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use crate::{
    error::AppError,
    extract::AppJson,
    middleware::auth::AuthContext,
    models::{
        session::{ShopLoginResponse, SubjectType},
        shop::{
            ChangePasswordRequest, InventoryItem, InventoryRequest, InventoryResponse,
            ShopLoginRequest, ShopResponse,
        },
    },
    state::AppState,
};

/// List all active shops, sorted by name. Password hashes are never included.
pub async fn list_shops(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let shops: Vec<ShopResponse> = state
        .shops
        .list_active()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(json!({
        "success": true,
        "shops": shops
    })))
}

/// Shop owner login.
///
/// # Response
///
/// - **Success (200 OK)**: token plus the shop's id, name, owner and inventory
/// - **Error (400)**: missing shop id or password
/// - **Error (404)**: unknown shop
/// - **Error (401)**: wrong password
pub async fn shop_login(
    State(state): State<AppState>,
    AppJson(request): AppJson<ShopLoginRequest>,
) -> Result<Json<ShopLoginResponse>, AppError> {
    if request.shop_id.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Shop id and password are required".to_string(),
        ));
    }

    let shop = state
        .credentials
        .authenticate(&request.shop_id, &request.password)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let session = state.sessions.issue(&shop.shop_id, SubjectType::Shop)?;
    tracing::info!(shop_id = %shop.shop_id, "shop owner logged in");

    Ok(Json(ShopLoginResponse {
        success: true,
        message: "Shop login successful".to_string(),
        token: session.token,
        expires_at: session.expires_at,
        shop: shop.into(),
    }))
}

/// Set the stock of a product, creating it if absent.
///
/// # Authentication
///
/// Requires a shop session for `{shopId}`.
pub async fn update_inventory(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<String>,
    AppJson(request): AppJson<InventoryRequest>,
) -> Result<Json<InventoryResponse>, AppError> {
    auth.require_shop(&shop_id)?;

    let inventory = state
        .inventory
        .set_quantity(
            &shop_id,
            &request.product_name,
            request.quantity,
            request.unit,
        )
        .await?;

    Ok(inventory_response("Inventory updated successfully", inventory))
}

/// Add a product that does not exist yet.
///
/// # Response
///
/// - **Error (400)**: a product with the same name (ignoring case) exists
pub async fn add_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<String>,
    AppJson(request): AppJson<InventoryRequest>,
) -> Result<Json<InventoryResponse>, AppError> {
    auth.require_shop(&shop_id)?;

    let inventory = state
        .inventory
        .add_product(
            &shop_id,
            &request.product_name,
            request.quantity,
            request.unit,
        )
        .await?;

    Ok(inventory_response("Product added successfully", inventory))
}

/// Remove a product. Succeeds even if there was nothing to remove.
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, product_name)): Path<(String, String)>,
) -> Result<Json<InventoryResponse>, AppError> {
    auth.require_shop(&shop_id)?;

    let inventory = state
        .inventory
        .remove_product(&shop_id, &product_name)
        .await?;

    Ok(inventory_response("Product deleted successfully", inventory))
}

/// Change the owner password after re-checking the current one.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<String>,
    AppJson(request): AppJson<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    auth.require_shop(&shop_id)?;

    if !state
        .credentials
        .verify_password(&shop_id, &request.current_password)
        .await?
    {
        return Err(AppError::Unauthorized);
    }

    state
        .credentials
        .set_password(&shop_id, &request.new_password)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}

fn inventory_response(message: &str, inventory: Vec<InventoryItem>) -> Json<InventoryResponse> {
    Json(InventoryResponse {
        success: true,
        message: message.to_string(),
        inventory,
    })
}
