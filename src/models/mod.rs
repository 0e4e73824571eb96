pub mod profile;
pub mod sticker;

pub use profile::*;
pub use sticker::*;
