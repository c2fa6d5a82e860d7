//! Story building, line wrapping, and pagination
//!
//! The notice text becomes a story of paragraphs and spacers, which is then
//! flowed into fixed frames on Letter-sized pages.

use crate::pdf::metrics::{encode_char, Font};
use crate::pdf::RenderError;

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;

const FRAME_LEFT: f32 = MARGIN;
const FRAME_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const FRAME_TOP: f32 = PAGE_HEIGHT - MARGIN;
const FRAME_BOTTOM: f32 = MARGIN;

const TITLE_SPACING: f32 = 12.0;
const PARAGRAPH_SPACING: f32 = 6.0;

const BOLD_MARKER: &str = "**";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphStyle {
    pub size: f32,
    pub leading: f32,
    pub alignment: Alignment,
    /// Every run is set bold regardless of markup.
    pub force_bold: bool,
}

pub const TITLE_STYLE: ParagraphStyle = ParagraphStyle {
    size: 18.0,
    leading: 22.0,
    alignment: Alignment::Center,
    force_bold: true,
};

pub const BODY_STYLE: ParagraphStyle = ParagraphStyle {
    size: 10.0,
    leading: 12.0,
    alignment: Alignment::Left,
    force_bold: false,
};

/// A stretch of text set in a single font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub style: ParagraphStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    Paragraph(Paragraph),
    Spacer(f32),
}

/// Encoded text placed at an absolute baseline position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub font: Font,
    pub size: f32,
    pub x: f32,
    pub y: f32,
    pub text: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub texts: Vec<PlacedText>,
}

const ESCAPE: char = '\\';

/// Escape `text` so `parse_runs` reads it back literally.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == ESCAPE || c == '*' {
            escaped.push(ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

enum Token {
    Char(char),
    Marker,
}

fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => tokens.push(Token::Char(chars.next().unwrap_or(ESCAPE))),
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                tokens.push(Token::Marker);
            }
            c => tokens.push(Token::Char(c)),
        }
    }
    tokens
}

/// Split a line on `**` markers into alternating plain and bold runs.
///
/// A backslash makes the next character literal. A line with an unbalanced
/// marker is kept literally.
pub fn parse_runs(line: &str) -> Vec<Run> {
    let tokens = tokenize(line);
    let markers = tokens
        .iter()
        .filter(|token| matches!(token, Token::Marker))
        .count();
    let balanced = markers % 2 == 0;

    let mut runs = Vec::new();
    let mut current = String::new();
    let mut bold = false;
    for token in tokens {
        match token {
            Token::Char(c) => current.push(c),
            Token::Marker if balanced => {
                if !current.is_empty() {
                    runs.push(Run {
                        text: std::mem::take(&mut current),
                        bold,
                    });
                }
                bold = !bold;
            }
            Token::Marker => current.push_str(BOLD_MARKER),
        }
    }
    if !current.is_empty() {
        runs.push(Run {
            text: current,
            bold,
        });
    }
    runs
}

fn has_visible_text(runs: &[Run]) -> bool {
    runs.iter().any(|run| !run.text.trim().is_empty())
}

/// Build the story: the first non-blank line is the centered title, every
/// other non-blank line becomes one body paragraph followed by a spacer.
pub fn build_story(text: &str) -> Result<Vec<Flowable>, RenderError> {
    let mut paragraphs = text
        .lines()
        .map(str::trim)
        .map(parse_runs)
        .filter(|runs| has_visible_text(runs));

    let title = paragraphs.next().ok_or(RenderError::EmptyDocument)?;

    let mut story = vec![
        Flowable::Paragraph(Paragraph {
            runs: title,
            style: TITLE_STYLE,
        }),
        Flowable::Spacer(TITLE_SPACING),
    ];

    for runs in paragraphs {
        story.push(Flowable::Paragraph(Paragraph {
            runs,
            style: BODY_STYLE,
        }));
        story.push(Flowable::Spacer(PARAGRAPH_SPACING));
    }

    Ok(story)
}

/// A word split into font pieces, already encoded.
#[derive(Debug, Clone, Default)]
struct Word {
    pieces: Vec<(Font, Vec<u8>)>,
}

impl Word {
    fn push(&mut self, font: Font, byte: u8) {
        if let Some((last, bytes)) = self.pieces.last_mut() {
            if *last == font {
                bytes.push(byte);
                return;
            }
        }
        self.pieces.push((font, vec![byte]));
    }

    fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    fn width(&self, size: f32) -> f32 {
        self.pieces
            .iter()
            .map(|(font, bytes)| font.text_width(bytes, size))
            .sum()
    }

    /// Break a word wider than `max_width` into chunks that fit.
    fn split_to_fit(self, size: f32, max_width: f32) -> Vec<Word> {
        let mut chunks = Vec::new();
        let mut current = Word::default();
        let mut width = 0.0;

        for (font, bytes) in self.pieces {
            for byte in bytes {
                let glyph = font.text_width(&[byte], size);
                if !current.is_empty() && width + glyph > max_width {
                    chunks.push(std::mem::take(&mut current));
                    width = 0.0;
                }
                current.push(font, byte);
                width += glyph;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

fn font_for(bold: bool, style: &ParagraphStyle) -> Font {
    if bold || style.force_bold {
        Font::Bold
    } else {
        Font::Regular
    }
}

fn split_words(paragraph: &Paragraph) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word::default();

    for run in &paragraph.runs {
        let font = font_for(run.bold, &paragraph.style);
        for c in run.text.chars() {
            if c.is_whitespace() {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            } else {
                current.push(font, encode_char(c));
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Greedily fill lines up to `max_width`.
fn wrap_words(words: Vec<Word>, size: f32, max_width: f32) -> Vec<Vec<Word>> {
    let space = Font::Regular.text_width(b" ", size);
    let mut lines = Vec::new();
    let mut line: Vec<Word> = Vec::new();
    let mut width = 0.0;

    for word in words {
        let word_width = word.width(size);

        if word_width > max_width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                width = 0.0;
            }
            let mut chunks = word.split_to_fit(size, max_width);
            let last = chunks.pop();
            lines.extend(chunks.into_iter().map(|chunk| vec![chunk]));
            if let Some(last) = last {
                width = last.width(size);
                line.push(last);
            }
            continue;
        }

        let needed = if line.is_empty() {
            word_width
        } else {
            width + space + word_width
        };
        if needed > max_width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            width = word_width;
        } else {
            width = needed;
        }
        line.push(word);
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Merge a line's words into font segments with inter-word spaces.
fn line_segments(words: Vec<Word>) -> Vec<(Font, Vec<u8>)> {
    let mut segments: Vec<(Font, Vec<u8>)> = Vec::new();
    for (i, word) in words.into_iter().enumerate() {
        if i > 0 {
            if let Some((_, bytes)) = segments.last_mut() {
                bytes.push(b' ');
            }
        }
        for (font, bytes) in word.pieces {
            let same_font = matches!(segments.last(), Some((last, _)) if *last == font);
            if same_font {
                if let Some((_, existing)) = segments.last_mut() {
                    existing.extend(bytes);
                }
            } else {
                segments.push((font, bytes));
            }
        }
    }
    segments
}

/// Flows a story into frames, opening new pages as needed.
struct Paginator {
    pages: Vec<Page>,
    current: Page,
    cursor: f32,
}

impl Paginator {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Page::default(),
            cursor: FRAME_TOP,
        }
    }

    fn at_page_top(&self) -> bool {
        self.cursor >= FRAME_TOP
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.cursor = FRAME_TOP;
    }

    fn add_spacer(&mut self, height: f32) {
        if self.at_page_top() {
            return;
        }
        self.cursor = (self.cursor - height).max(FRAME_BOTTOM);
    }

    fn add_paragraph(&mut self, paragraph: Paragraph) {
        let style = paragraph.style;
        let words = split_words(&paragraph);

        for words in wrap_words(words, style.size, FRAME_WIDTH) {
            if self.cursor - style.leading < FRAME_BOTTOM && !self.at_page_top() {
                self.new_page();
            }

            let segments = line_segments(words);
            let line_width: f32 = segments
                .iter()
                .map(|(font, bytes)| font.text_width(bytes, style.size))
                .sum();
            let mut x = match style.alignment {
                Alignment::Left => FRAME_LEFT,
                Alignment::Center => FRAME_LEFT + (FRAME_WIDTH - line_width) / 2.0,
            };
            let baseline = self.cursor - style.size;

            for (font, text) in segments {
                let width = font.text_width(&text, style.size);
                self.current.texts.push(PlacedText {
                    font,
                    size: style.size,
                    x,
                    y: baseline,
                    text,
                });
                x += width;
            }

            self.cursor -= style.leading;
        }
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.texts.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Lay the story out onto pages.
pub fn paginate(story: Vec<Flowable>) -> Vec<Page> {
    let mut paginator = Paginator::new();
    for flowable in story {
        match flowable {
            Flowable::Paragraph(paragraph) => paginator.add_paragraph(paragraph),
            Flowable::Spacer(height) => paginator.add_spacer(height),
        }
    }
    paginator.finish()
}
