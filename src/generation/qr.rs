use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{ImageFormat, Rgb, RgbImage};
use qrcode::{EcLevel, QrCode};

use crate::error::{AppError, AppResult};

/// Rendering options for a QR raster. Margin is measured in quiet-zone
/// modules, width in pixels.
#[derive(Debug, Clone)]
pub struct QrOptions {
    pub width: u32,
    pub margin: u32,
    pub dark: String,
    pub light: String,
    pub ec_level: EcLevel,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width: 256,
            margin: 2,
            dark: "#000000".to_string(),
            light: "#FFFFFF".to_string(),
            ec_level: EcLevel::M,
        }
    }
}

/// Narrow seam over QR rendering so the generation pipeline can be tested
/// without pulling in the real encoder.
pub trait QrEncoder: Send + Sync {
    /// Encodes `data` into a PNG raster wrapped as a base64 data URL.
    fn encode(&self, data: &str, options: &QrOptions) -> AppResult<String>;
}

/// Default encoder backed by the `qrcode` and `image` crates.
pub struct PngQrEncoder;

impl QrEncoder for PngQrEncoder {
    fn encode(&self, data: &str, options: &QrOptions) -> AppResult<String> {
        let png = self.encode_png(data, options)?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
    }
}

impl PngQrEncoder {
    /// Raw-buffer variant of [`QrEncoder::encode`].
    pub fn encode_png(&self, data: &str, options: &QrOptions) -> AppResult<Vec<u8>> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), options.ec_level)
            .map_err(|e| AppError::Encoding(e.to_string()))?;

        let dark = parse_hex_color(&options.dark)?;
        let light = parse_hex_color(&options.light)?;

        let modules = code.to_colors();
        let module_count = code.width() as u32;
        let total = module_count + 2 * options.margin;

        let scale = (options.width / total).max(1);
        let img_size = total * scale;
        let offset = options.margin * scale;

        let mut img = RgbImage::from_pixel(img_size, img_size, light);

        for (i, color) in modules.iter().enumerate() {
            if *color != qrcode::Color::Dark {
                continue;
            }
            let x = (i as u32) % module_count;
            let y = (i as u32) / module_count;
            for dx in 0..scale {
                for dy in 0..scale {
                    img.put_pixel(offset + x * scale + dx, offset + y * scale + dy, dark);
                }
            }
        }

        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| AppError::Encoding(e.to_string()))?;

        Ok(png)
    }
}

fn parse_hex_color(hex: &str) -> AppResult<Rgb<u8>> {
    let raw = hex.strip_prefix('#').unwrap_or(hex);
    if raw.len() != 6 {
        return Err(AppError::Encoding(format!("invalid color: {}", hex)));
    }
    let value = u32::from_str_radix(raw, 16)
        .map_err(|_| AppError::Encoding(format!("invalid color: {}", hex)))?;
    Ok(Rgb([
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
    ]))
}

/// Prefixes `https://` when the URL carries no explicit scheme. Idempotent.
pub fn format_url(url: &str) -> String {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return format!("https://{}", url);
    }
    url.to_string()
}
