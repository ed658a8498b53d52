pub mod client_handlers;
pub mod health_handlers;
pub mod image_handlers;
