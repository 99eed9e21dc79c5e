//! Report color templates
//!
//! Templates are immutable style records picked from a fixed catalog. A
//! draft only stores the template id; lookups that miss fall back to the
//! first catalog entry.

/// A named color scheme applied to the rendered report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    /// Headings, top border, service chips
    pub primary: &'static str,
    /// Card background
    pub secondary: &'static str,
    /// Body text
    pub text: &'static str,
    pub accent: &'static str,
}

/// The template catalog, in display order
pub const TEMPLATES: &[Template] = &[
    Template {
        id: "modern-blue",
        name: "Modern Blue",
        primary: "#2563eb",
        secondary: "#f0f9ff",
        text: "#1e293b",
        accent: "#3b82f6",
    },
    Template {
        id: "sweet-pink",
        name: "Sweet Pink",
        primary: "#db2777",
        secondary: "#fdf2f8",
        text: "#4c0519",
        accent: "#ec4899",
    },
    Template {
        id: "nature-green",
        name: "Nature Green",
        primary: "#059669",
        secondary: "#ecfdf5",
        text: "#064e3b",
        accent: "#10b981",
    },
    Template {
        id: "elegant-gold",
        name: "Elegant Gold",
        primary: "#92400e",
        secondary: "#fffbeb",
        text: "#451a03",
        accent: "#d97706",
    },
];

/// Id of the template used for new drafts
pub const DEFAULT_TEMPLATE_ID: &str = "modern-blue";

/// Look up a template by id
pub fn find(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Look up a template by id, falling back to the first catalog entry
pub fn resolve(id: &str) -> &'static Template {
    find(id).unwrap_or(&TEMPLATES[0])
}

/// Parse a `#rrggbb` color into its components
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique_and_colors_parse() {
        for (i, t) in TEMPLATES.iter().enumerate() {
            assert!(TEMPLATES[i + 1..].iter().all(|o| o.id != t.id));
            for c in [t.primary, t.secondary, t.text, t.accent] {
                assert!(parse_hex(c).is_some(), "bad color {c} in {}", t.id);
            }
        }
    }

    #[test]
    fn parse_hex_rejects_malformed_colors() {
        assert_eq!(parse_hex("#ffffff"), Some((255, 255, 255)));
        assert_eq!(parse_hex("#2563EB"), Some((0x25, 0x63, 0xeb)));
        // six bytes, but not six ASCII digits
        assert_eq!(parse_hex("#a\u{e9}bcd"), None);
        assert_eq!(parse_hex("#\u{1f436}ab"), None);
        assert_eq!(parse_hex("#+1+2+3"), None);
        assert_eq!(parse_hex("ffffff"), None);
        assert_eq!(parse_hex("#fff"), None);
    }

    #[test]
    fn unknown_id_falls_back_to_first() {
        assert!(find("neon-purple").is_none());
        assert_eq!(resolve("neon-purple").id, DEFAULT_TEMPLATE_ID);
        assert_eq!(resolve("sweet-pink").primary, "#db2777");
    }

    #[test]
    fn parse_hex_rejects_short_values() {
        assert_eq!(parse_hex("#2563eb"), Some((0x25, 0x63, 0xeb)));
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("2563eb"), None);
    }
}
