pub mod assets;
pub mod card_service;
pub mod text_layer;
