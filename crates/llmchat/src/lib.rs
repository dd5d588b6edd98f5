pub mod chat;
pub mod errors;
pub mod models;
pub mod providers;
pub mod settings;
pub mod store;
pub mod stream;
