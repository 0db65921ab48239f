// src/lib.rs
pub mod advice;
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod portfolio;
pub mod presenter;
pub mod transactions;
pub mod validation;

pub use app::App;
pub use error::{ClientError, Result};
