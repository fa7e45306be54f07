//! Common utilities shared by the directory service and the gateway.
//!
//! This crate provides:
//! - Unified error handling for HTTP
//! - Configuration structures
//! - Pagination types

pub mod config;
pub mod error;
pub mod pagination;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
pub use pagination::{PageOutcome, PageRequest, Paginated, PaginationMeta};
