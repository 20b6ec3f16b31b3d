//! A4 rendering of generated documents.
//!
//! Layout runs first over plain text and yields positioned lines, then the
//! lines are drawn with the built-in Helvetica faces. Widths are estimated
//! from an average glyph width, which is close enough for wrapping prose and
//! centering short lines.
use std::fmt::Debug;

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::error::AppError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const PT: f32 = 0.3528;

const TITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;
const LEADING: f32 = 18.0 * PT;
const PARAGRAPH_GAP: f32 = 12.0 * PT;
const BLANK_LINE: f32 = 12.0 * PT;
const TITLE_GAP: f32 = 40.0 * PT;
const SIGNATURE_GAP: f32 = 40.0 * PT;

/// Average Helvetica advance as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

#[derive(Debug, PartialEq)]
pub struct Placed {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
    pub text: String,
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH * PT
}

fn centered_x(text: &str, size: f32) -> f32 {
    ((PAGE_WIDTH - text_width(text, size)) / 2.0).max(MARGIN)
}

/// Greedy word wrap; a word longer than the line is hard-broken at `max_chars`.
pub fn wrap(line: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();

        for piece in chars.chunks(max_chars) {
            let needed = if current_len == 0 {
                piece.len()
            } else {
                current_len + 1 + piece.len()
            };

            if needed > max_chars && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(piece);
            current_len += piece.len();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

struct Cursor {
    page: usize,
    y: f32,
    placed: Vec<Placed>,
}

impl Cursor {
    fn skip(&mut self, height: f32) {
        self.y -= height;
    }

    fn line(&mut self, text: String, size: f32, bold: bool, centered: bool) {
        if self.y - LEADING < MARGIN {
            self.page += 1;
            self.y = PAGE_HEIGHT - MARGIN;
        }

        self.y -= LEADING;

        let x = if centered {
            centered_x(&text, size)
        } else {
            MARGIN
        };

        self.placed.push(Placed {
            page: self.page,
            x,
            y: self.y,
            size,
            bold,
            text,
        });
    }
}

pub fn layout(header: &str, content: &str) -> Vec<Placed> {
    let max_chars = ((PAGE_WIDTH - 2.0 * MARGIN) / (BODY_SIZE * GLYPH_WIDTH * PT)) as usize;

    let mut cursor = Cursor {
        page: 0,
        y: PAGE_HEIGHT - MARGIN,
        placed: Vec::new(),
    };

    cursor.line(header.to_string(), TITLE_SIZE, true, true);
    cursor.skip(TITLE_GAP);

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            cursor.skip(BLANK_LINE);
        } else if trimmed.starts_with('_') {
            cursor.skip(SIGNATURE_GAP);
            cursor.line(trimmed.to_string(), BODY_SIZE, false, true);
        } else {
            for wrapped in wrap(trimmed, max_chars) {
                cursor.line(wrapped, BODY_SIZE, false, false);
            }
            cursor.skip(PARAGRAPH_GAP);
        }
    }

    cursor.placed
}

fn pdf_error(e: impl Debug) -> AppError {
    AppError::InternalError(format!("PDF rendering failed: {e:?}").into())
}

pub fn render_pdf(title: &str, header: &str, content: &str) -> Result<Vec<u8>, AppError> {
    let placed = layout(header, content);
    let pages = placed.last().map_or(1, |p| p.page + 1);

    let (document, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Página 1");

    let regular = document
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = document
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut layers = vec![document.get_page(first_page).get_layer(first_layer)];
    for number in 2..=pages {
        let (page, layer) = document.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Página {number}"),
        );
        layers.push(document.get_page(page).get_layer(layer));
    }

    for line in &placed {
        let font = if line.bold { &bold } else { &regular };

        layers[line.page].use_text(line.text.as_str(), line.size, Mm(line.x), Mm(line.y), font);
    }

    document.save_to_bytes().map_err(pdf_error)
}
