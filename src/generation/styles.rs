use serde::Serialize;

/// A named bundle of palette, mood, and prose guidance used to steer the
/// image model. The catalog is static; styles are never mutated at runtime.
#[derive(Debug, Clone, Serialize)]
pub struct StickerStyle {
    pub key: &'static str,
    pub theme: &'static str,
    pub colors: &'static [&'static str],
    pub style: &'static str,
    pub elements: &'static [&'static str],
    pub mood: &'static str,
}

pub static MODERN: StickerStyle = StickerStyle {
    key: "modern",
    theme: "Modern Clean",
    colors: &["#3B82F6", "#FFFFFF", "#1F2937"],
    style: "Clean, modern branding with custom die-cut shapes",
    elements: &["modern fonts", "geometric shapes", "clean lines"],
    mood: "Professional and sleek",
};

pub static CHIBI: StickerStyle = StickerStyle {
    key: "chibi",
    theme: "Chibi Cartoon Emotes",
    colors: &["#FF5FA2", "#FFD93D", "#6BCB77", "#4D96FF", "#F72585"],
    style: "Cute chibi-style characters with big eyes, bold outlines, and exaggerated expressions",
    elements: &[
        "rounded cartoon faces",
        "expressive eyes and mouths",
        "emoji-like gestures",
        "funny props (headphones, pets, food, signs)",
        "comic-style text bubbles (HI!, GG, RAID)",
    ],
    mood: "Playful, colorful, and expressive — perfect for Twitch/Discord emotes",
};

pub static BOLD: StickerStyle = StickerStyle {
    key: "bold",
    theme: "Retro Arcade",
    colors: &["#FF006E", "#8338EC", "#3A86FF", "#FFBE0B", "#FB5607"],
    style: "Pixel-inspired meets modern cartoon with 80s arcade flair",
    elements: &[
        "joysticks, arcade machines",
        "pixel hearts and coins",
        "retro shades",
        "speech bubbles like 'LEVEL UP!'",
    ],
    mood: "Nostalgic, fun, and bold — old-school gamer energy",
};

pub static CLASSIC: StickerStyle = StickerStyle {
    key: "classic",
    theme: "Retro Brand Stickers",
    colors: &[
        "#FF4C4C", "#FFD93D", "#4CC9F0", "#6BCB77", "#8338EC", "#FF8FA3", "#F72585", "#FFFFFF",
        "#000000",
    ],
    style: "Bold flat vector art with minimal shading, clean lines, and high-contrast palettes inspired by retro logos and anime mascots",
    elements: &[
        "mascot-style characters",
        "geometric borders and badge frames",
        "blocky retro text",
        "playful shapes like circles, shields, banners, and hexagons",
        "icons, stars, and flames for accent",
    ],
    mood: "Collectible, nostalgic, and energetic — like anime brand logos and arcade decals",
};

static ALL: [&StickerStyle; 4] = [&MODERN, &CHIBI, &BOLD, &CLASSIC];

pub fn all() -> &'static [&'static StickerStyle] {
    &ALL
}

/// Looks a style up by key; unknown or absent keys fall back to modern.
pub fn resolve(key: Option<&str>) -> &'static StickerStyle {
    match key {
        Some(k) => all()
            .iter()
            .find(|s| s.key == k)
            .copied()
            .unwrap_or(&MODERN),
        None => &MODERN,
    }
}

const BOLD_KEYWORDS: &[&str] = &["bold", "vibrant", "bright", "colorful", "gaming", "esports"];
const CLASSIC_KEYWORDS: &[&str] = &["classic", "vintage", "retro", "traditional", "elegant"];

/// Picks a style from free-text description. Rules are evaluated top to
/// bottom, first match wins; no match falls through to modern.
pub fn suggest(description: &str) -> &'static StickerStyle {
    let text = description.to_lowercase();
    let rules: [(&[&str], &'static StickerStyle); 2] =
        [(BOLD_KEYWORDS, &BOLD), (CLASSIC_KEYWORDS, &CLASSIC)];

    for (keywords, style) in rules {
        if keywords.iter().any(|k| text.contains(k)) {
            return style;
        }
    }
    &MODERN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_falls_back_to_modern() {
        assert_eq!(resolve(None).theme, "Modern Clean");
        assert_eq!(resolve(Some("nonsense")).theme, "Modern Clean");
        assert_eq!(resolve(Some("bold")).theme, "Retro Arcade");
        assert_eq!(resolve(Some("chibi")).theme, "Chibi Cartoon Emotes");
    }

    #[test]
    fn suggest_bold_wins_over_classic() {
        // "gaming" matches the first rule even though no classic keyword is
        // present; priority order must hold regardless.
        let style = suggest("A bold, colorful gaming sticker");
        assert_eq!(style.theme, "Retro Arcade");
    }

    #[test]
    fn suggest_classic_keywords() {
        assert_eq!(suggest("A classic vintage logo").theme, "Retro Brand Stickers");
        assert_eq!(suggest("Elegant stationery brand").theme, "Retro Brand Stickers");
    }

    #[test]
    fn suggest_defaults_to_modern() {
        assert_eq!(suggest("a sticker for my coffee shop").theme, "Modern Clean");
        assert_eq!(suggest("").theme, "Modern Clean");
    }

    #[test]
    fn suggest_is_deterministic() {
        let text = "BRIGHT esports team badge";
        assert_eq!(suggest(text).key, suggest(text).key);
        assert_eq!(suggest(text).key, "bold");
    }
}
