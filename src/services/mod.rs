pub mod auth;
pub mod stickers;
