pub mod images;
pub mod render;
pub mod settings;
