//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the JSON bodies exchanged with clients.

/// One-time passcode records
pub mod otp;
/// Session token claims and login responses
pub mod session;
/// Shop accounts and inventory
pub mod shop;
/// Phone-verified end users
pub mod user;
