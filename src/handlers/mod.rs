//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Calls into a service
//! 3. Returns HTTP response (JSON, status code)

/// End-user login
pub mod auth;
/// Health check endpoints
pub mod health;
/// OTP issue and verify
pub mod otp;
/// Shop directory, owner login and inventory
pub mod shops;
