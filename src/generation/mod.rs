pub mod gemini;
pub mod prompt;
pub mod qr;
pub mod styles;

pub use gemini::{GeminiClient, ImageSynthesizer};
pub use qr::{PngQrEncoder, QrEncoder, QrOptions};
pub use styles::StickerStyle;
