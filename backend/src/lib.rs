pub mod config;
pub mod routes;
pub mod services;
pub mod utils;

pub use config::{AppConfig, ServerArgs};
pub use services::card_service::{CardComposer, CardRequest};
pub use utils::error::{AppError, Result};
