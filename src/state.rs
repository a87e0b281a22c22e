//! Shared handler state.

use std::sync::Arc;

use crate::{
    clock::Clock,
    config::Config,
    models::otp::CodeHasher,
    services::{
        credentials::{CredentialHasher, CredentialStore},
        identity::IdentityResolver,
        inventory::InventoryMutator,
        otp_ledger::OtpLedger,
        session::{JwtCodec, SessionIssuer},
        sms::SmsSender,
    },
    store::{ShopStore, Store},
};

/// Everything a handler can reach. Cloned per request; all fields are `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub shops: Arc<dyn ShopStore>,
    pub otp: OtpLedger,
    pub credentials: CredentialStore,
    pub identities: IdentityResolver,
    pub sessions: SessionIssuer,
    pub inventory: InventoryMutator,
    pub expose_otp: bool,
}

impl AppState {
    /// Wire every component to one backend.
    pub fn new<S: Store + 'static>(
        store: Arc<S>,
        config: &Config,
        sms: Arc<dyn SmsSender>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sessions = SessionIssuer::new(Arc::new(JwtCodec::new(&config.jwt_secret)), clock.clone());

        Self {
            otp: OtpLedger::new(
                store.clone(),
                sms,
                clock.clone(),
                CodeHasher::new(config.otp_secret()),
            ),
            credentials: CredentialStore::new(store.clone(), hasher),
            identities: IdentityResolver::new(store.clone()),
            inventory: InventoryMutator::new(store.clone(), clock),
            shops: store.clone(),
            store,
            sessions,
            expose_otp: config.exposes_otp(),
        }
    }
}
