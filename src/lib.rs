pub mod config;
pub mod error;
pub mod formats;
pub mod handlers;
pub mod storage;
pub mod types;

pub use config::{BuildConfig, QueryConfig};
pub use error::{Error, Result};
