//! # Landmark Store
//!
//! A local HTTP endpoint that saves labeled gesture-landmark samples as JSON
//! files, one directory per gesture, and loads the whole corpus back for
//! model training.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  POST /api/training-data      ┌─────────────┐   ┌──────────────────┐
//! │ Front-end │ ─────────────────────────────▶│   server    │──▶│      store       │
//! │ (browser) │ ◀──────────────────────────── │ axum + CORS │   │ training-data/*/ │
//! └───────────┘  GET /api/training-data/load  └─────────────┘   └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and command-line overrides |
//! | [`models`] | Sample envelope and aggregated training set |
//! | [`naming`] | Gesture label ↔ directory and file names |
//! | [`store`] | Atomic sample writes and corpus loading |
//! | [`error`] | Store error kinds |
//! | [`server`] | HTTP server |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod naming;
pub mod server;
pub mod store;
