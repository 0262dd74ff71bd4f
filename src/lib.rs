//! Wayfarer API Library
//!
//! Tour-booking REST API: catalog browsing, accounts, reviews, and paid
//! bookings confirmed through a payment-processor webhook. `app::build_app`
//! assembles the middleware pipeline and routers over pluggable
//! repositories.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod payments;
