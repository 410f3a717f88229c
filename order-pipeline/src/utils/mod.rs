//! 工具模块
//!
//! - [`AppError`] - HTTP error type
//! - logger setup

pub mod error;
pub mod logger;

pub use error::{AppError, AppResponse, AppResult, ok};
