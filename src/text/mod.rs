//! # Text Wrapping
//!
//! Field values and paragraphs are wrapped greedily: the text is cut into
//! UAX#14 segments (a word plus its trailing space, roughly), and segments
//! are added to the current line until the next one would overflow. A
//! segment wider than a whole line is split between characters. Mandatory
//! breaks (newlines) always end the line.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::{FontContext, StandardFont};

/// A line of text after wrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    /// Width in points, trailing spaces excluded.
    pub width: f64,
}

/// Text between two break opportunities.
struct Segment<'a> {
    text: &'a str,
    /// The line must end after this segment.
    hard: bool,
}

fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut start = 0;
    linebreaks(text)
        .map(|(end, opportunity)| {
            let segment = Segment {
                text: &text[start..end],
                hard: opportunity == BreakOpportunity::Mandatory,
            };
            start = end;
            segment
        })
        .collect()
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// The line being filled.
struct Pending<'f> {
    fonts: &'f FontContext,
    font: StandardFont,
    size: f64,
    text: String,
    /// Advance including trailing spaces.
    advance: f64,
}

impl<'f> Pending<'f> {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn push(&mut self, text: &str, width: f64) {
        self.text.push_str(text);
        self.advance += width;
    }

    fn take(&mut self) -> BrokenLine {
        let text = std::mem::take(&mut self.text);
        self.advance = 0.0;
        let visible = text.trim_end_matches(' ');
        BrokenLine {
            width: self.fonts.measure_string(visible, self.font, self.size),
            text: visible.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextLayout;

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Wrap `text` into lines no wider than `max_width`.
    ///
    /// Always returns at least one line; empty input gives one empty line.
    pub fn break_into_lines(
        &self,
        fonts: &FontContext,
        text: &str,
        max_width: f64,
        font: StandardFont,
        font_size: f64,
    ) -> Vec<BrokenLine> {
        let mut lines = Vec::new();
        let mut line = Pending {
            fonts,
            font,
            size: font_size,
            text: String::new(),
            advance: 0.0,
        };

        for segment in segments(text) {
            let body = segment.text.trim_end_matches(is_newline);
            let visible = fonts.measure_string(body.trim_end_matches(' '), font, font_size);

            if !line.is_empty() && line.advance + visible > max_width {
                lines.push(line.take());
            }

            if visible > max_width {
                for ch in body.chars() {
                    let w = fonts.char_width(ch, font, font_size);
                    if !line.is_empty() && line.advance + w > max_width && ch != ' ' {
                        lines.push(line.take());
                    }
                    line.push(ch.encode_utf8(&mut [0u8; 4]), w);
                }
            } else {
                line.push(body, fonts.measure_string(body, font, font_size));
            }

            if segment.hard {
                lines.push(line.take());
            }
        }

        if !line.is_empty() || lines.is_empty() {
            lines.push(line.take());
        }
        lines
    }

    /// Width of `text` set on a single line.
    pub fn measure_width(
        &self,
        fonts: &FontContext,
        text: &str,
        font: StandardFont,
        font_size: f64,
    ) -> f64 {
        fonts.measure_string(text, font, font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(text: &str, width: f64, size: f64) -> Vec<BrokenLine> {
        TextLayout::new().break_into_lines(&FontContext::new(), text, width, StandardFont::Helvetica, size)
    }

    fn texts(lines: &[BrokenLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(texts(&wrap("Hello", 200.0, 12.0)), vec!["Hello"]);
    }

    #[test]
    fn breaks_between_words() {
        let lines = wrap("Hello World", 40.0, 12.0);
        assert_eq!(texts(&lines), vec!["Hello", "World"]);
        assert!(lines[0].width < 40.0, "trailing space not counted");
    }

    #[test]
    fn newlines_are_mandatory() {
        assert_eq!(texts(&wrap("Hello\nWorld", 200.0, 12.0)), vec!["Hello", "World"]);
        assert_eq!(texts(&wrap("Right\r\n\r\nLeft", 200.0, 12.0)), vec!["Right", "", "Left"]);
    }

    #[test]
    fn empty_input_gives_one_empty_line() {
        let lines = wrap("", 200.0, 12.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].width, 0.0);
    }

    #[test]
    fn overlong_word_is_split_between_characters() {
        let lines = wrap("WWWWWWWWWW", 30.0, 10.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 30.0 + 1e-9));
        let joined: String = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(joined, "WWWWWWWWWW");
    }

    #[test]
    fn overlong_word_after_short_one_starts_a_new_line() {
        let lines = wrap("ok WWWWWWWWWW", 30.0, 10.0);
        assert_eq!(lines[0].text, "ok");
        assert!(lines[1].text.starts_with('W'));
    }

    #[test]
    fn bold_is_wider() {
        let tl = TextLayout::new();
        let fonts = FontContext::new();
        let regular = tl.measure_width(&fonts, "Audiometry", StandardFont::Helvetica, 10.0);
        let bold = tl.measure_width(&fonts, "Audiometry", StandardFont::HelveticaBold, 10.0);
        assert!(bold > regular);
    }

    #[test]
    fn every_line_fits() {
        let text = "Mild high frequency hearing loss noted in both ears, advised periodic review";
        let lines = wrap(text, 120.0, 9.0);
        assert!(lines.len() >= 3);
        for line in &lines {
            assert!(line.width <= 120.0 + 1e-9, "line '{}' too wide", line.text);
        }
        assert_eq!(texts(&lines).join(" "), text);
    }
}
