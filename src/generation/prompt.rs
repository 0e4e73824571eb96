use super::styles::StickerStyle;

// Character rules are checked in order against the lower-cased description;
// the first hit appends its block. Generic keywords only apply when no named
// character matched.
const CHARACTER_RULES: &[(&[&str], &str)] = &[
    (
        &["spiderman", "spider-man", "spidey"],
        r#"
CHARACTER REQUIREMENTS:
- Include Spider-Man character prominently in the design
- Use Spider-Man's signature red and blue colors
- Add "Spidey" tagline below the character as requested
- Place Spider-Man next to the QR code, not overlapping it
- Make Spider-Man clearly recognizable and well-drawn
- Ensure the character and QR code are combined in a cohesive design
"#,
    ),
    (
        &["superman"],
        r#"
CHARACTER REQUIREMENTS:
- Include Superman character prominently in the design
- Use Superman's signature red, blue, and yellow colors
- Add appropriate tagline below the character
- Place Superman next to the QR code, not overlapping it
- Make Superman clearly recognizable and well-drawn
"#,
    ),
    (
        &["batman"],
        r#"
CHARACTER REQUIREMENTS:
- Include Batman character prominently in the design
- Use Batman's signature black and yellow colors
- Add appropriate tagline below the character
- Place Batman next to the QR code, not overlapping it
- Make Batman clearly recognizable and well-drawn
"#,
    ),
];

const GENERIC_KEYWORDS: &[&str] = &["character", "cartoon", "superhero"];

const GENERIC_BLOCK: &str = r#"
CHARACTER REQUIREMENTS:
- Include the requested character prominently in the design
- Use appropriate colors for the character
- Add relevant tagline below the character if mentioned
- Place the character next to the QR code, not overlapping it
- Make the character clearly recognizable and well-drawn
- Ensure the character and QR code are combined in a cohesive design
"#;

fn character_block(description: Option<&str>) -> &'static str {
    let Some(description) = description else {
        return "";
    };
    let text = description.to_lowercase();

    for (keywords, block) in CHARACTER_RULES {
        if keywords.iter().any(|k| text.contains(k)) {
            return block;
        }
    }

    if GENERIC_KEYWORDS.iter().any(|k| text.contains(k)) {
        return GENERIC_BLOCK;
    }

    ""
}

/// Assembles the image-model prompt for one sticker. Pure text assembly;
/// never fails, tolerates any title/description/url strings.
pub fn compose(title: &str, description: Option<&str>, style: &StickerStyle, url: &str) -> String {
    let description_line = match description {
        Some(d) if !d.is_empty() => format!("- Description: \"{}\"\n", d),
        _ => String::new(),
    };

    format!(
        r#"
Create a professional, custom-shaped die-cut sticker design with the provided QR code prominently displayed and easily scannable.

STICKER SPECIFICATIONS:
- Title: "{title}"
{description_line}- Target URL: {url}

DESIGN REQUIREMENTS:
- Theme: {theme}
- Color Palette: {colors}
- Style: {style_desc}
- Design Elements: {elements}
- Overall Mood: {mood}
{character}
CRITICAL REQUIREMENTS:
1. The QR code must be CLEARLY VISIBLE and EASILY SCANNABLE - do not obscure or blend it into the background
2. Create a custom-shaped die-cut sticker (not just square/circle) - the shape should relate to the brand/theme
3. Place the QR code in a prominent position with high contrast (black QR code on white background or white QR code on dark background)
4. Keep the QR code as a separate, distinct element - do not integrate it into patterns or backgrounds
5. Add the title text in a clear, readable font that matches the brand style
6. Include relevant characters, icons, or decorative elements based on the description
7. Design should look like a professional branded sticker that could be printed and cut out

CUSTOM SHAPE REQUIREMENTS:
- Create an irregular, custom die-cut shape that relates to the brand/theme
- Examples: wavy edges, speech bubbles, banners, geometric shapes, character silhouettes, etc.
- The shape should enhance the brand identity, not just be decorative
- Consider the sticker's purpose (business card, product label, promotional item, etc.)

DESIGN LAYOUT:
- QR code should occupy 30-40% of the sticker space in a clear, unobstructed area
- Place the QR code in a distinct section (often rectangular) within the custom shape
- Add the title and any character/icon elements in separate areas
- Use the theme colors for backgrounds and decorative elements
- Maintain high contrast for readability
- Design should look professional and brandable

DESIGN GOALS:
- Functional and scannable QR code
- Custom die-cut shape that enhances brand identity
- Professional quality suitable for printing and cutting
- Easy to scan with any QR code reader
- Visually appealing and memorable
- Looks like a real branded sticker you'd see on products or business cards

Create a custom-shaped sticker that prioritizes QR code functionality while creating a strong brand identity and professional appearance.
"#,
        title = title,
        description_line = description_line,
        url = url,
        theme = style.theme,
        colors = style.colors.join(", "),
        style_desc = style.style,
        elements = style.elements.join(", "),
        mood = style.mood,
        character = character_block(description),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::styles::{BOLD, MODERN};

    #[test]
    fn compose_embeds_title_url_and_style() {
        let prompt = compose("My Shop", None, &MODERN, "https://example.com");
        assert!(prompt.contains("Title: \"My Shop\""));
        assert!(prompt.contains("Target URL: https://example.com"));
        assert!(prompt.contains("Theme: Modern Clean"));
        assert!(prompt.contains("#3B82F6"));
        assert!(prompt.contains("QR code should occupy 30-40%"));
    }

    #[test]
    fn spiderman_description_appends_character_block() {
        let prompt = compose(
            "Hero Shop",
            Some("a spiderman themed sticker"),
            &BOLD,
            "https://example.com",
        );
        assert!(prompt.contains("CHARACTER REQUIREMENTS"));
        assert!(prompt.contains("red and blue colors"));
        assert!(prompt.contains("not overlapping"));
    }

    #[test]
    fn named_character_wins_over_generic_keywords() {
        let prompt = compose(
            "Hero Shop",
            Some("a batman cartoon sticker"),
            &MODERN,
            "https://example.com",
        );
        assert!(prompt.contains("Batman"));
        assert!(!prompt.contains("Include the requested character"));
    }

    #[test]
    fn generic_keywords_append_generic_block() {
        let prompt = compose(
            "Toon Shop",
            Some("a fun cartoon mascot"),
            &MODERN,
            "https://example.com",
        );
        assert!(prompt.contains("Include the requested character"));
    }

    #[test]
    fn plain_description_has_no_character_block() {
        let prompt = compose(
            "Bakery",
            Some("sourdough bread and pastries"),
            &MODERN,
            "https://example.com",
        );
        assert!(!prompt.contains("CHARACTER REQUIREMENTS"));
    }

    #[test]
    fn compose_is_total_for_empty_input() {
        let prompt = compose("", None, &MODERN, "");
        assert!(prompt.contains("CRITICAL REQUIREMENTS"));
        let prompt = compose("t", Some(""), &MODERN, "u");
        assert!(!prompt.contains("Description:"));
    }
}
