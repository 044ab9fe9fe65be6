//! Rich text subset for `content_html`
//!
//! Only paragraphs, line breaks and bold/italic/underline are understood.
//! Parsing goes through quick-xml in a relaxed mode so that ordinary HTML
//! (`<br>`, unclosed `<p>`, mismatched end tags) is accepted.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::block::TextFormat;

/// One paragraph-like unit of rich text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub format: TextFormat,
}

fn is_paragraph_tag(name: &[u8]) -> bool {
    matches!(
        name,
        b"p" | b"div"
            | b"h1"
            | b"h2"
            | b"h3"
            | b"h4"
            | b"h5"
            | b"h6"
            | b"li"
            | b"blockquote"
            | b"pre"
    )
}

/// Tags that end the current paragraph without holding text of their own
fn is_boundary_tag(name: &[u8]) -> bool {
    matches!(name, b"hr")
}

fn is_skipped_tag(name: &[u8]) -> bool {
    matches!(name, b"script" | b"style" | b"head" | b"title")
}

/// Entities outside the XML set that editors commonly emit
fn resolve_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        "nbsp" => Some("\u{a0}"),
        "ndash" => Some("–"),
        "mdash" => Some("—"),
        "hellip" => Some("…"),
        "lsquo" => Some("‘"),
        "rsquo" => Some("’"),
        "ldquo" => Some("“"),
        "rdquo" => Some("”"),
        "copy" => Some("©"),
        _ => None,
    }
}

#[derive(Default)]
struct ParagraphBuilder {
    paragraphs: Vec<Paragraph>,
    current: String,
    format: TextFormat,
    bold: usize,
    italic: usize,
    underline: usize,
    skipped: usize,
    pending_space: bool,
}

impl ParagraphBuilder {
    fn open(&mut self, name: &[u8]) {
        match name {
            b"br" => self.line_break(),
            b"b" | b"strong" => self.bold += 1,
            b"i" | b"em" => self.italic += 1,
            b"u" | b"ins" => self.underline += 1,
            n if is_skipped_tag(n) => self.skipped += 1,
            n if is_paragraph_tag(n) || is_boundary_tag(n) => self.flush(),
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"b" | b"strong" => self.bold = self.bold.saturating_sub(1),
            b"i" | b"em" => self.italic = self.italic.saturating_sub(1),
            b"u" | b"ins" => self.underline = self.underline.saturating_sub(1),
            n if is_skipped_tag(n) => self.skipped = self.skipped.saturating_sub(1),
            n if is_paragraph_tag(n) || is_boundary_tag(n) => self.flush(),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.skipped > 0 {
            return;
        }

        // Spaces are kept as written; a line break in the source is layout
        // and reads as at most one space
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\n' || c == '\r' {
                let kept = self.current.trim_end_matches(&[' ', '\t'][..]).len();
                self.current.truncate(kept);
                while chars.next_if(|c| c.is_ascii_whitespace()).is_some() {}
                self.pending_space = true;
                continue;
            }

            if std::mem::take(&mut self.pending_space)
                && !self.current.is_empty()
                && !self.current.ends_with(char::is_whitespace)
            {
                self.current.push(' ');
            }
            self.current.push(c);
        }

        if !text.trim().is_empty() {
            self.format.bold |= self.bold > 0;
            self.format.italic |= self.italic > 0;
            self.format.underline |= self.underline > 0;
        }
    }

    fn line_break(&mut self) {
        self.pending_space = false;
        self.current.push('\n');
    }

    fn flush(&mut self) {
        let text = std::mem::take(&mut self.current);
        let format = std::mem::take(&mut self.format);
        self.pending_space = false;

        if !text.trim().is_empty() {
            self.paragraphs.push(Paragraph { text, format });
        }
    }

    fn finish(mut self) -> Vec<Paragraph> {
        self.flush();
        self.paragraphs
    }
}

/// Split HTML into paragraphs.
///
/// Returns an empty list when the markup cannot be read; callers then fall
/// back to the plain-text body.
pub fn parse_paragraphs(html: &str) -> Vec<Paragraph> {
    let mut reader = Reader::from_str(html);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.check_comments = false;
        config.trim_text(false);
    }

    let mut builder = ParagraphBuilder::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                builder.open(&name);
            }
            Ok(Event::Empty(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                builder.open(&name);
                if name != b"br" {
                    builder.close(&name);
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                builder.close(&name);
            }
            Ok(Event::Text(t)) => {
                let text = match t.unescape_with(resolve_entity) {
                    Ok(text) => text.into_owned(),
                    Err(_) => String::from_utf8_lossy(&t).into_owned(),
                };
                builder.text(&text);
            }
            Ok(Event::CData(c)) => {
                builder.text(&String::from_utf8_lossy(&c));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    "Unreadable content_html at position {}: {}",
                    reader.buffer_position(),
                    e
                );
                return Vec::new();
            }
        }
    }

    builder.finish()
}

/// Render one text block as a paragraph: escaped text, newlines as `<br/>`,
/// wrapped in `<b>`, `<i>`, `<u>` (outermost first) per flag.
pub fn render_paragraph(text: &str, format: TextFormat) -> String {
    let mut inner = text
        .split('\n')
        .map(|line| escape(line).into_owned())
        .collect::<Vec<_>>()
        .join("<br/>");

    if format.underline {
        inner = format!("<u>{}</u>", inner);
    }
    if format.italic {
        inner = format!("<i>{}</i>", inner);
    }
    if format.bold {
        inner = format!("<b>{}</b>", inner);
    }

    format!("<p>{}</p>", inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(paragraphs: &[Paragraph]) -> Vec<&str> {
        paragraphs.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_paragraphs_and_breaks() {
        let paragraphs = parse_paragraphs("<p>Milk<br/>Eggs</p><p>Second</p>");
        assert_eq!(texts(&paragraphs), vec!["Milk\nEggs", "Second"]);
        assert!(paragraphs.iter().all(|p| p.format.is_plain()));
    }

    #[test]
    fn test_formatting_presence() {
        let paragraphs =
            parse_paragraphs("<p><strong>Bold</strong> text</p><div><em><u>Both</u></em></div>");
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].format.bold);
        assert!(!paragraphs[0].format.italic);
        assert!(paragraphs[1].format.italic);
        assert!(paragraphs[1].format.underline);
        assert!(!paragraphs[1].format.bold);
    }

    #[test]
    fn test_loose_html_is_accepted() {
        let paragraphs = parse_paragraphs("Intro<p>One<br>Two</div><p>Three &amp; four&nbsp;!</p></span>");
        assert_eq!(
            texts(&paragraphs),
            vec!["Intro", "One\nTwo", "Three & four\u{a0}!"]
        );
    }

    #[test]
    fn test_empty_paragraphs_are_dropped() {
        assert!(parse_paragraphs("<p><br></p><p>   </p>").is_empty());
        assert!(parse_paragraphs("").is_empty());
    }

    #[test]
    fn test_script_content_is_ignored() {
        let paragraphs = parse_paragraphs("<p>Keep</p><script>alert(1)</script>");
        assert_eq!(texts(&paragraphs), vec!["Keep"]);
    }

    #[test]
    fn test_render_escapes_and_wraps() {
        assert_eq!(
            render_paragraph("Milk\nEggs", TextFormat::default()),
            "<p>Milk<br/>Eggs</p>"
        );
        let format = TextFormat {
            bold: true,
            italic: false,
            underline: true,
        };
        assert_eq!(
            render_paragraph("a < b & c", format),
            "<p><b><u>a &lt; b &amp; c</u></b></p>"
        );
    }

    #[test]
    fn test_render_then_parse_keeps_text_and_flags() {
        let format = TextFormat {
            bold: false,
            italic: true,
            underline: false,
        };
        let html = render_paragraph("Tom & \"Jerry\"\nline two", format);
        let paragraphs = parse_paragraphs(&html);
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].text, "Tom & \"Jerry\"\nline two");
        assert_eq!(paragraphs[0].format, format);
    }

    #[test]
    fn test_spaces_survive_render_and_parse() {
        let text = "Recipe:\n    indented step\nx  y";
        let paragraphs = parse_paragraphs(&render_paragraph(text, TextFormat::default()));
        assert_eq!(texts(&paragraphs), vec![text]);
    }

    #[test]
    fn test_source_line_breaks_are_layout() {
        let paragraphs = parse_paragraphs("<div>\n  <p>\n    Hello   \n    world\n  </p>\n  <hr/>\n</div>");
        assert_eq!(texts(&paragraphs), vec!["Hello world"]);
    }
}
