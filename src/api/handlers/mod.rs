pub mod auth;
pub mod scan;
pub mod stickers;
