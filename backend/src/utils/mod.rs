pub mod error;
pub mod image_ops;
pub mod logger;
