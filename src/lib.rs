//! Sokoni - terminal storefront browser
//!
//! This library provides the core of Sokoni, a terminal UI for browsing the
//! homepage banners, categories and products of a storefront API.
//!
//! ## Architecture
//!
//! - `loader`: category fetch state machine with rate-limit backoff
//! - `carousel`: time-driven banner rotation
//! - `api` / `net`: HTTP client, status classification
//! - `app` / `ui`: state and ratatui rendering
//!
//! ## Usage
//!
//! ```bash
//! cargo run --features native -- --api-url https://shop.example/api
//! ```

// Core modules
pub mod config;
pub mod constants;
pub mod types;

// Network + API
pub mod api;
pub mod auth;
pub mod customers;
pub mod net;
pub mod telemetry;

// State machines
pub mod carousel;
pub mod category_strip;
pub mod loader;

// Deep link router
pub mod router;

// Theme system
pub mod theme;

pub mod app;
pub mod clipboard;
pub mod ui;

// Re-export commonly used types
pub use api::{HttpStorefront, StorefrontApi};
pub use app::App;
pub use config::Config;
pub use net::ApiError;
pub use types::AppEvent;
