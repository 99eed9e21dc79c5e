/// Report card layout
///
/// Lays the draft out as a fixed-width card, top to bottom: header, pet
/// info, services, photos, feedback, footer. Text metrics are estimated
/// from per-character advances, which is enough to wrap and truncate
/// without shaping.

use crate::draft::{PhotoRole, ReportDraft};
use crate::rendering::paint::{PaintCommand, TextAnchor, TextStyle};
use crate::rendering::{ReportDocument, TextSnapshot};
use crate::template::Template;

/// Logical width of the card in CSS pixels
pub const CARD_WIDTH: f32 = 420.0;
const PADDING: f32 = 24.0;
const TOP_BORDER: f32 = 10.0;
const SECTION_GAP: f32 = 20.0;

const WHITE: &str = "#ffffff";
const MUTED: &str = "#94a3b8";
const BODY: &str = "#334155";
const STRONG: &str = "#1e293b";
const RULE: &str = "#e2e8f0";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Info,
    Services,
    Photos,
    Feedback,
    Footer,
}

/// Where a section of the card ended up
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub section: Section,
    pub rect: Rect,
}

struct Composer<'a> {
    template: &'a Template,
    commands: Vec<PaintCommand>,
    texts: Vec<String>,
    sections: Vec<LayoutNode>,
    y: f32,
}

impl<'a> Composer<'a> {
    fn content_width(&self) -> f32 {
        CARD_WIDTH - PADDING * 2.0
    }

    fn text(&mut self, x: f32, y: f32, text: impl Into<String>, style: TextStyle) {
        let text = text.into();
        self.texts.push(text.clone());
        self.commands.push(PaintCommand::Text { x, y, text, style });
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32, fill: &str) {
        self.commands.push(PaintCommand::Rect {
            x,
            y,
            width,
            height,
            radius,
            fill: fill.to_string(),
        });
    }

    fn section(&mut self, section: Section, top: f32) {
        self.sections.push(LayoutNode {
            section,
            rect: Rect {
                x: PADDING,
                y: top,
                width: self.content_width(),
                height: self.y - top,
            },
        });
    }

    /// Dot + uppercase heading used by the services and feedback sections
    fn heading(&mut self, x: f32, y: f32, label: &str) {
        let primary = self.template.primary;
        self.commands.push(PaintCommand::Circle {
            cx: x + 3.0,
            cy: y - 4.0,
            r: 3.0,
            fill: primary.to_string(),
        });
        self.text(x + 12.0, y, label, TextStyle::new(11.0, primary).bold());
    }

    fn header(&mut self, draft: &ReportDraft) {
        let top = self.y;
        let t = self.template;
        self.text(PADDING, top + 22.0, "Grooming Report", TextStyle::new(22.0, t.primary).bold());
        self.text(
            CARD_WIDTH - PADDING,
            top + 16.0,
            draft.date.format("%Y-%m-%d").to_string(),
            TextStyle::new(11.0, t.primary).bold().anchor(TextAnchor::End),
        );
        self.text(
            PADDING,
            top + 40.0,
            "PET GROOMING DAILY REPORT",
            TextStyle::new(9.0, t.text).bold().opacity(0.7),
        );
        self.y = top + 48.0;
        self.section(Section::Header, top);
        self.y += SECTION_GAP;
    }

    fn info(&mut self, draft: &ReportDraft) {
        const INSET: f32 = 16.0;
        const ROW: f32 = 40.0;
        const ROW_GAP: f32 = 8.0;
        const COL_GAP: f32 = 8.0;

        let pet = &draft.pet;
        let or_dash = |s: &str| {
            let s = s.trim();
            if s.is_empty() {
                "-".to_string()
            } else {
                s.to_string()
            }
        };
        let weight = if pet.weight.trim().is_empty() {
            "-".to_string()
        } else {
            format!("{}kg", pet.weight.trim())
        };
        let fields = [
            ("NAME", draft.display_name().to_string()),
            ("BREED", or_dash(&pet.breed)),
            ("AGE", or_dash(&pet.age)),
            ("WEIGHT", weight),
            ("GENDER", pet.gender.label().to_string()),
            ("GROOMER", or_dash(&draft.groomer_name)),
        ];

        let top = self.y;
        let rows = fields.len().div_ceil(2);
        let height = INSET * 2.0 + rows as f32 * ROW + (rows as f32 - 1.0) * ROW_GAP;
        self.rect(PADDING, top, self.content_width(), height, 16.0, WHITE);

        let col_width = (self.content_width() - INSET * 2.0 - COL_GAP) / 2.0;
        for (i, (label, value)) in fields.into_iter().enumerate() {
            let x = PADDING + INSET + (i % 2) as f32 * (col_width + COL_GAP);
            let y = top + INSET + (i / 2) as f32 * (ROW + ROW_GAP);
            self.text(x, y + 12.0, label, TextStyle::new(9.0, MUTED));
            let value = fit_text(&value, col_width, 13.0, true);
            self.text(x, y + 32.0, value, TextStyle::new(13.0, STRONG).bold());
        }

        self.y = top + height;
        self.section(Section::Info, top);
        self.y += SECTION_GAP;
    }

    fn services(&mut self, draft: &ReportDraft) {
        const CHIP_H: f32 = 24.0;
        const CHIP_GAP: f32 = 8.0;
        const CHIP_PAD: f32 = 12.0;

        let top = self.y;
        self.heading(PADDING, top + 11.0, "SERVICES");
        self.y = top + 22.0;

        let services = draft.services.ordered();
        if services.is_empty() {
            self.text(
                PADDING,
                self.y + 12.0,
                "No services selected",
                TextStyle::new(11.0, MUTED).italic(),
            );
            self.y += 18.0;
        } else {
            let max_w = self.content_width();
            let mut x = PADDING;
            let mut row_top = self.y;
            for name in services {
                let label = fit_text(name, max_w - CHIP_PAD * 2.0, 10.0, true);
                let w = text_width(&label, 10.0, true) + CHIP_PAD * 2.0;
                if x > PADDING && x + w > PADDING + max_w {
                    x = PADDING;
                    row_top += CHIP_H + CHIP_GAP;
                }
                let primary = self.template.primary;
                self.rect(x, row_top, w, CHIP_H, 8.0, primary);
                self.text(
                    x + w / 2.0,
                    row_top + 16.0,
                    label,
                    TextStyle::new(10.0, WHITE).bold().anchor(TextAnchor::Middle),
                );
                x += w + CHIP_GAP;
            }
            self.y = row_top + CHIP_H;
        }

        self.section(Section::Services, top);
        self.y += SECTION_GAP;
    }

    fn photos(&mut self, draft: &ReportDraft) {
        const GAP: f32 = 16.0;
        const LABEL: f32 = 16.0;
        const FRAME: f32 = 2.0;

        let present: Vec<_> = draft.photos().collect();
        if present.is_empty() {
            return;
        }

        let top = self.y;
        let tile = (self.content_width() - GAP) / 2.0;
        for (slot, (role, photo)) in present.into_iter().enumerate() {
            let x = PADDING + slot as f32 * (tile + GAP);
            let label = match role {
                PhotoRole::Before => "BEFORE",
                PhotoRole::After => "AFTER",
            };
            self.text(
                x + tile / 2.0,
                top + 10.0,
                label,
                TextStyle::new(8.0, MUTED).bold().anchor(TextAnchor::Middle),
            );
            self.rect(
                x - FRAME,
                top + LABEL - FRAME,
                tile + FRAME * 2.0,
                tile + FRAME * 2.0,
                14.0,
                WHITE,
            );
            self.commands.push(PaintCommand::Image {
                x,
                y: top + LABEL,
                width: tile,
                height: tile,
                radius: 12.0,
                href: photo.to_data_uri(),
            });
        }

        self.y = top + LABEL + tile + FRAME;
        self.section(Section::Photos, top);
        self.y += SECTION_GAP;
    }

    fn feedback(&mut self, draft: &ReportDraft) {
        const INSET: f32 = 16.0;
        const BAR: f32 = 4.0;
        const LINE: f32 = 20.0;
        const SIZE: f32 = 13.0;

        let top = self.y;
        let text_x = PADDING + BAR + INSET;
        let text_w = self.content_width() - BAR - INSET * 2.0;
        let quoted = format!("\u{201C}{}\u{201D}", draft.display_notes().trim());
        let lines = wrap_text(&quoted, text_w, SIZE);
        let height = INSET + 16.0 + 10.0 + lines.len() as f32 * LINE + INSET - 6.0;

        let primary = self.template.primary;
        self.rect(PADDING, top, self.content_width(), height, 16.0, WHITE);
        self.rect(PADDING, top, BAR, height, 2.0, primary);
        self.heading(text_x, top + INSET + 10.0, "GROOMER FEEDBACK");

        // The snapshot keeps the feedback as one string; the paint list
        // gets the wrapped lines.
        self.texts.push(quoted);
        let mut baseline = top + INSET + 16.0 + 10.0 + 13.0;
        for line in lines {
            self.commands.push(PaintCommand::Text {
                x: text_x,
                y: baseline,
                text: line,
                style: TextStyle::new(SIZE, BODY).italic(),
            });
            baseline += LINE;
        }

        self.y = top + height;
        self.section(Section::Feedback, top);
        self.y += SECTION_GAP + 8.0;
    }

    fn footer(&mut self) {
        let top = self.y;
        self.commands.push(PaintCommand::Line {
            x1: PADDING,
            y1: top,
            x2: CARD_WIDTH - PADDING,
            y2: top,
            color: RULE.to_string(),
            width: 1.0,
        });
        self.text(
            CARD_WIDTH / 2.0,
            top + 22.0,
            "PROFESSIONAL PET GROOMING SERVICE",
            TextStyle::new(8.0, MUTED).bold().anchor(TextAnchor::Middle),
        );
        self.y = top + 26.0;
        self.section(Section::Footer, top);
        self.y += PADDING;
    }
}

/// Lay out `draft` with the given template into a paintable document.
pub fn compose(draft: &ReportDraft, template: &Template) -> ReportDocument {
    let mut c = Composer {
        template,
        commands: Vec::new(),
        texts: Vec::new(),
        sections: Vec::new(),
        y: TOP_BORDER + PADDING,
    };

    c.header(draft);
    c.info(draft);
    c.services(draft);
    c.photos(draft);
    c.feedback(draft);
    c.footer();

    let height = c.y.ceil();
    let mut commands = Vec::with_capacity(c.commands.len() + 2);
    commands.push(PaintCommand::Rect {
        x: 0.0,
        y: 0.0,
        width: CARD_WIDTH,
        height,
        radius: 0.0,
        fill: template.secondary.to_string(),
    });
    commands.push(PaintCommand::Rect {
        x: 0.0,
        y: 0.0,
        width: CARD_WIDTH,
        height: TOP_BORDER,
        radius: 0.0,
        fill: template.primary.to_string(),
    });
    commands.extend(c.commands);

    ReportDocument {
        width: CARD_WIDTH,
        height,
        commands,
        sections: c.sections,
        text: TextSnapshot {
            title: format!("Grooming Report: {}", draft.display_name()),
            text: c.texts.join("\n"),
        },
    }
}

// Glyph advance in em units. Wide (CJK, emoji) glyphs take a full em.
fn char_advance(c: char) -> f32 {
    if is_wide(c) {
        1.0
    } else if c.is_whitespace() {
        0.28
    } else if c.is_ascii_uppercase() || c.is_ascii_digit() {
        0.64
    } else {
        0.56
    }
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1FAFF
        | 0x20000..=0x3FFFD)
}

/// Estimated rendered width of `text` at `size` px
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let em: f32 = text.chars().map(char_advance).sum();
    em * size * if bold { 1.06 } else { 1.0 }
}

/// Truncate `text` with an ellipsis so it fits in `max_width`
pub fn fit_text(text: &str, max_width: f32, size: f32, bold: bool) -> String {
    if text_width(text, size, bold) <= max_width {
        return text.to_string();
    }
    let budget = max_width - text_width("\u{2026}", size, bold);
    let mut out = String::new();
    let mut width = 0.0;
    for c in text.chars() {
        let cw = char_advance(c) * size * if bold { 1.06 } else { 1.0 };
        if width + cw > budget {
            break;
        }
        width += cw;
        out.push(c);
    }
    format!("{}\u{2026}", out.trim_end())
}

// Break points: whitespace runs, every wide glyph, and runs of other text.
fn tokenize(paragraph: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut in_space = false;
    for c in paragraph.chars() {
        if is_wide(c) {
            if !cur.is_empty() {
                tokens.push(std::mem::take(&mut cur));
            }
            tokens.push(c.to_string());
            in_space = false;
        } else if c.is_whitespace() {
            if !in_space && !cur.is_empty() {
                tokens.push(std::mem::take(&mut cur));
            }
            if !in_space {
                cur.push(' ');
            }
            in_space = true;
        } else {
            if in_space {
                tokens.push(std::mem::take(&mut cur));
            }
            cur.push(c);
            in_space = false;
        }
    }
    if !cur.is_empty() {
        tokens.push(cur);
    }
    tokens
}

/// Greedy line wrapping. Explicit newlines start new lines; tokens wider
/// than a whole line are broken between characters.
pub fn wrap_text(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.trim().split('\n') {
        let mut line = String::new();
        let mut width = 0.0;
        for token in tokenize(paragraph.trim_end()) {
            let is_space = token == " ";
            let token_w = text_width(&token, size, false);
            if width + token_w > max_width && !line.trim().is_empty() {
                lines.push(line.trim_end().to_string());
                line.clear();
                width = 0.0;
                if is_space {
                    continue;
                }
            }
            if token_w > max_width {
                for c in token.chars() {
                    let cw = char_advance(c) * size;
                    if width + cw > max_width && !line.is_empty() {
                        lines.push(std::mem::take(&mut line));
                        width = 0.0;
                    }
                    line.push(c);
                    width += cw;
                }
                continue;
            }
            line.push_str(&token);
            width += token_w;
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::{Photo, PHOTO_MIME};
    use crate::template;

    fn tiny_photo() -> Photo {
        Photo {
            data: vec![0xFF, 0xD8, 0xFF, 0xD9],
            mime: PHOTO_MIME,
            width: 4,
            height: 4,
            quality: 80,
        }
    }

    #[test]
    fn wrap_breaks_on_words_and_keeps_short_text_whole() {
        assert_eq!(wrap_text("did great", 300.0, 13.0), vec!["did great"]);
        let lines = wrap_text("one two three four five six seven eight nine ten", 80.0, 13.0);
        assert!(lines.len() > 1);
        for l in &lines {
            assert!(!l.starts_with(' '));
            assert!(text_width(l, 13.0, false) <= 80.0 || !l.contains(' '));
        }
    }

    #[test]
    fn wrap_breaks_cjk_between_glyphs() {
        let lines = wrap_text("宝贝今天表现得非常棒期待下次再见", 60.0, 13.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l, 13.0, false) <= 60.0));
        assert_eq!(lines.concat(), "宝贝今天表现得非常棒期待下次再见");
    }

    #[test]
    fn wrap_honours_newlines() {
        assert_eq!(wrap_text("a\nb", 300.0, 13.0), vec!["a", "b"]);
    }

    #[test]
    fn fit_text_adds_ellipsis_only_when_needed() {
        assert_eq!(fit_text("Mochi", 200.0, 13.0, true), "Mochi");
        let long = fit_text("Sir Fluffington the Third of Barkshire", 80.0, 13.0, true);
        assert!(long.ends_with('\u{2026}'));
        assert!(text_width(&long, 13.0, true) <= 80.0);
    }

    #[test]
    fn compose_lists_sections_and_skips_photos_when_absent() {
        let mut draft = ReportDraft::new();
        draft.pet.name = "Mochi".into();
        let doc = compose(&draft, template::resolve("modern-blue"));
        let kinds: Vec<_> = doc.sections.iter().map(|n| n.section).collect();
        assert_eq!(
            kinds,
            vec![
                Section::Header,
                Section::Info,
                Section::Services,
                Section::Feedback,
                Section::Footer
            ]
        );
        assert!(doc.text.text.contains("No services selected"));
        assert!(doc.text.title.contains("Mochi"));
        assert!(doc.height > 0.0);
    }

    #[test]
    fn compose_places_one_tile_per_photo() {
        let mut draft = ReportDraft::new();
        draft.set_photo(PhotoRole::After, tiny_photo());
        let doc = compose(&draft, template::resolve("sweet-pink"));
        let images = doc
            .commands
            .iter()
            .filter(|c| matches!(c, PaintCommand::Image { .. }))
            .count();
        assert_eq!(images, 1);
        assert!(doc.text.text.contains("AFTER"));
        assert!(!doc.text.text.contains("BEFORE"));
    }

    #[test]
    fn more_notes_make_a_taller_card() {
        let mut short = ReportDraft::new();
        short.set_notes("ok");
        let mut long = ReportDraft::new();
        long.set_notes("word ".repeat(200));
        let t = template::resolve("modern-blue");
        assert!(compose(&long, t).height > compose(&short, t).height);
    }

    #[test]
    fn services_wrap_onto_rows() {
        let mut draft = ReportDraft::new();
        for s in crate::draft::DEFAULT_SERVICES {
            draft.services.insert(*s);
        }
        let doc = compose(&draft, template::resolve("modern-blue"));
        let services = doc
            .sections
            .iter()
            .find(|n| n.section == Section::Services)
            .unwrap();
        assert!(services.rect.height > 22.0 + 24.0 + 8.0);
    }
}
