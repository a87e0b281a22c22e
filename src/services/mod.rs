//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! Each receives its store and capabilities at construction.

pub mod credentials;
pub mod identity;
pub mod inventory;
pub mod otp_ledger;
pub mod seed;
pub mod session;
pub mod sms;
