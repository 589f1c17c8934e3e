// src/lib.rs

pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod io;
pub mod lifecycle;
pub mod repository;
pub mod service;
pub mod views;

pub use config::AppConfig;
pub use error::{AppError, FetchErrorKind, Result};
pub use lifecycle::AppState;
