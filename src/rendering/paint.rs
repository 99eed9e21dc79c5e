/// Paint command set for report cards, serialized to SVG for rasterization

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_svg(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Styling for a single line of text
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: String,
    pub opacity: f32,
    pub anchor: TextAnchor,
}

impl TextStyle {
    pub fn new(size: f32, color: &str) -> Self {
        Self {
            size,
            bold: false,
            italic: false,
            color: color.to_string(),
            opacity: 1.0,
            anchor: TextAnchor::Start,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        fill: String,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        fill: String,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: String,
        width: f32,
    },
    /// `y` is the text baseline
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
    /// An embedded photo, cropped to fill the box and clipped to rounded corners
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        href: String,
    },
}

const FONT_FAMILY: &str = "Noto Sans, Helvetica, Arial, PingFang SC, Microsoft YaHei, sans-serif";

/// Serialize paint commands into a standalone SVG document
pub fn to_svg(width: f32, height: f32, commands: &[PaintCommand]) -> String {
    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
        w = fmt_num(width),
        h = fmt_num(height),
        font = FONT_FAMILY,
    );

    let mut clip_id = 0usize;
    for cmd in commands {
        match cmd {
            PaintCommand::Rect { x, y, width, height, radius, fill } => {
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}"/>"#,
                    fmt_num(*x),
                    fmt_num(*y),
                    fmt_num(*width),
                    fmt_num(*height),
                    fmt_num(*radius),
                    escape_xml(fill)
                );
            }
            PaintCommand::Circle { cx, cy, r, fill } => {
                let _ = write!(
                    svg,
                    r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
                    fmt_num(*cx),
                    fmt_num(*cy),
                    fmt_num(*r),
                    escape_xml(fill)
                );
            }
            PaintCommand::Line { x1, y1, x2, y2, color, width } => {
                let _ = write!(
                    svg,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
                    fmt_num(*x1),
                    fmt_num(*y1),
                    fmt_num(*x2),
                    fmt_num(*y2),
                    escape_xml(color),
                    fmt_num(*width)
                );
            }
            PaintCommand::Text { x, y, text, style } => {
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" font-size="{}" fill="{}" text-anchor="{}""#,
                    fmt_num(*x),
                    fmt_num(*y),
                    fmt_num(style.size),
                    escape_xml(&style.color),
                    style.anchor.as_svg()
                );
                if style.bold {
                    svg.push_str(r#" font-weight="bold""#);
                }
                if style.italic {
                    svg.push_str(r#" font-style="italic""#);
                }
                if style.opacity < 1.0 {
                    let _ = write!(svg, r#" fill-opacity="{}""#, fmt_num(style.opacity));
                }
                let _ = write!(svg, ">{}</text>", escape_xml(text));
            }
            PaintCommand::Image { x, y, width, height, radius, href } => {
                clip_id += 1;
                let _ = write!(
                    svg,
                    r#"<clipPath id="clip{id}"><rect x="{x}" y="{y}" width="{w}" height="{h}" rx="{r}"/></clipPath><image x="{x}" y="{y}" width="{w}" height="{h}" preserveAspectRatio="xMidYMid slice" clip-path="url(#clip{id})" xlink:href="{href}"/>"#,
                    id = clip_id,
                    x = fmt_num(*x),
                    y = fmt_num(*y),
                    w = fmt_num(*width),
                    h = fmt_num(*height),
                    r = fmt_num(*radius),
                    href = escape_xml(href),
                );
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Escape text for use in XML content and attribute values
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

// Two decimals keeps the markup stable across platforms
fn fmt_num(v: f32) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
