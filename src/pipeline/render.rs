//! PDF report rendering: [`ReportLayout`] → A4 PDF bytes via `printpdf`.
//!
//! The renderer walks the layout blocks top to bottom, wrapping text with the
//! real glyph advances of the embedded fonts and starting a new page whenever
//! the next line would cross the bottom margin. Table rows that do not fit
//! continue on the next page, with the cell borders drawn per fragment.
//!
//! Page footers (`Trang p/N` plus the footer text) need the total page
//! count, so they are appended to each page's operations only after the body
//! has been paginated.
//!
//! Fonts are loaded once per call. Any failure is returned as a
//! [`RenderError`]; a partially written document is never returned.

use crate::config::{FontSource, LayoutVariant};
use crate::error::RenderError;
use crate::pipeline::fonts::{FontFace, FontSet};
use crate::pipeline::layout::{layout_report, Block, ReportLayout};
use crate::prompts::page_label;
use crate::report::Report;
use printpdf::font::ParsedFont;
use printpdf::graphics::{LinePoint, PaintMode, Point, Polygon, PolygonRing, WindingOrder};
use printpdf::matrix::TextMatrix;
use printpdf::ops::Op;
use printpdf::text::TextItem;
use printpdf::{FontId, Mm, PdfDocument, PdfPage, PdfSaveOptions, Pt, Rgb};
use std::sync::Arc;
use tracing::{debug, info};

// ── Page geometry (points) ───────────────────────────────────────────────

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 40.0;
const MARGIN_BOTTOM: f32 = 30.0;
/// Bottom margin when a footer band is drawn below the body.
const MARGIN_BOTTOM_FOOTER: f32 = 40.0;
const FOOTER_BASELINE: f32 = 20.0;

const TITLE_SIZE: f32 = 16.0;
const TITLE_SPACING: f32 = 20.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 11.0;
const FOOTER_SIZE: f32 = 9.0;
const LINE_HEIGHT: f32 = 1.4;
const BLOCK_SPACING: f32 = 6.0;
const INDENT: f32 = 20.0;

const LABEL_COLUMN: f32 = 170.0;
const CELL_PADDING: f32 = 5.0;
const BORDER_WIDTH: f32 = 0.5;

/// A rendered report and its page count.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

/// Lay out `report` with `variant` and render it with fonts from `fonts`.
pub fn render_report(
    report: &Report,
    variant: LayoutVariant,
    fonts: &FontSource,
) -> Result<RenderedReport, RenderError> {
    let fonts = FontSet::load(fonts)?;
    let layout = layout_report(report, variant);
    render_layout(&layout, &fonts)
}

/// Render an already normalised layout.
pub fn render_layout(layout: &ReportLayout, fonts: &FontSet) -> Result<RenderedReport, RenderError> {
    let mut doc = PdfDocument::new(layout.title.as_deref().unwrap_or("Report"));

    let regular_id = add_font(&mut doc, &fonts.regular)?;
    let bold_id = if Arc::ptr_eq(&fonts.regular.data, &fonts.bold.data) {
        regular_id.clone()
    } else {
        add_font(&mut doc, &fonts.bold)?
    };

    let bottom = if layout.footer.is_some() {
        MARGIN_BOTTOM_FOOTER
    } else {
        MARGIN_BOTTOM
    };
    let mut writer = PageWriter {
        fonts,
        regular_id: regular_id.clone(),
        bold_id,
        pages: Vec::new(),
        ops: Vec::new(),
        y: PAGE_HEIGHT - MARGIN,
        bottom,
    };

    if let Some(title) = &layout.title {
        writer.title(title);
    }
    for block in &layout.blocks {
        match block {
            Block::Label(label) => {
                writer.space(BLOCK_SPACING);
                writer.wrapped(label, MARGIN, BODY_SIZE, true);
            }
            Block::Heading(heading) => {
                writer.space(BLOCK_SPACING * 2.0);
                writer.wrapped(heading, MARGIN, HEADING_SIZE, true);
            }
            Block::Paragraph { text, indented } => {
                let x = if *indented { MARGIN + INDENT } else { MARGIN };
                writer.wrapped(text, x, BODY_SIZE, false);
            }
            Block::TableRow { label, value } => writer.table_row(label, value),
        }
    }

    let mut pages = writer.finish();
    let total = pages.len();

    if let Some(footer) = &layout.footer {
        for (i, ops) in pages.iter_mut().enumerate() {
            let number = page_label(i + 1, total);
            let number_x =
                PAGE_WIDTH - MARGIN - fonts.regular.text_width(&number, FOOTER_SIZE);
            push_text(ops, &regular_id, MARGIN, FOOTER_BASELINE, FOOTER_SIZE, &footer.text);
            push_text(ops, &regular_id, number_x, FOOTER_BASELINE, FOOTER_SIZE, &number);
        }
    }

    doc.pages = pages
        .into_iter()
        .map(|ops| PdfPage::new(Mm(210.0), Mm(297.0), ops))
        .collect();

    let mut bytes = Vec::new();
    let mut warnings = Vec::new();
    doc.save_writer(&mut bytes, &PdfSaveOptions::default(), &mut warnings);

    if !bytes.starts_with(b"%PDF") {
        return Err(RenderError::Pdf("writer produced no PDF output".into()));
    }

    info!("Rendered report: {} pages, {} bytes", total, bytes.len());
    Ok(RenderedReport {
        bytes,
        pages: total,
    })
}

fn add_font(doc: &mut PdfDocument, face: &FontFace) -> Result<FontId, RenderError> {
    let mut warnings = Vec::new();
    let index = face.index.try_into().unwrap_or(0);
    let parsed = ParsedFont::from_bytes(&face.data, index, &mut warnings).ok_or_else(|| {
        RenderError::FontParse {
            font: face.name.clone(),
        }
    })?;
    Ok(doc.add_font(&parsed))
}

// ── Page writer ──────────────────────────────────────────────────────────

/// Accumulates drawing operations page by page.
///
/// `y` is the top of the next line in PDF coordinates (origin bottom-left).
struct PageWriter<'a> {
    fonts: &'a FontSet,
    regular_id: FontId,
    bold_id: FontId,
    pages: Vec<Vec<Op>>,
    ops: Vec<Op>,
    y: f32,
    bottom: f32,
}

impl PageWriter<'_> {
    fn at_page_top(&self) -> bool {
        self.y >= PAGE_HEIGHT - MARGIN
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Vertical gap before a block; dropped at the top of a page.
    fn space(&mut self, gap: f32) {
        if !self.at_page_top() {
            self.y -= gap;
        }
    }

    fn face(&self, bold: bool) -> (&FontFace, FontId) {
        if bold {
            (&self.fonts.bold, self.bold_id.clone())
        } else {
            (&self.fonts.regular, self.regular_id.clone())
        }
    }

    fn title(&mut self, title: &str) {
        let (face, font) = self.face(true);
        let lines = wrap_text(title, PAGE_WIDTH - 2.0 * MARGIN, |s| {
            face.text_width(s, TITLE_SIZE)
        });
        for line in lines {
            let width = self.fonts.bold.text_width(&line, TITLE_SIZE);
            let x = (PAGE_WIDTH - width) / 2.0;
            self.line(&font, x, TITLE_SIZE, &line);
        }
        self.y -= TITLE_SPACING;
    }

    /// Draw `text` wrapped between `x` and the right margin.
    fn wrapped(&mut self, text: &str, x: f32, size: f32, bold: bool) {
        let (face, font) = self.face(bold);
        let lines = wrap_text(text, PAGE_WIDTH - MARGIN - x, |s| face.text_width(s, size));
        for line in lines {
            self.line(&font, x, size, &line);
        }
    }

    fn line(&mut self, font: &FontId, x: f32, size: f32, text: &str) {
        let height = size * LINE_HEIGHT;
        if self.y - height < self.bottom && !self.at_page_top() {
            self.new_page();
        }
        push_text(&mut self.ops, font, x, self.y - size, size, text);
        self.y -= height;
    }

    /// Two-column bordered row, split across pages when it does not fit.
    fn table_row(&mut self, label: &str, value: &[String]) {
        let line_height = BODY_SIZE * LINE_HEIGHT;
        let label_width = LABEL_COLUMN - 2.0 * CELL_PADDING;
        let value_width = PAGE_WIDTH - 2.0 * MARGIN - LABEL_COLUMN - 2.0 * CELL_PADDING;

        let bold = &self.fonts.bold;
        let regular = &self.fonts.regular;
        let label_lines = wrap_text(label, label_width, |s| bold.text_width(s, BODY_SIZE));
        let value_lines: Vec<String> = value
            .iter()
            .flat_map(|v| wrap_text(v, value_width, |s| regular.text_width(s, BODY_SIZE)))
            .collect();
        let rows = label_lines.len().max(value_lines.len()).max(1);

        let mut drawn = 0;
        while drawn < rows {
            let room = ((self.y - self.bottom - 2.0 * CELL_PADDING) / line_height).floor();
            if room < 1.0 && !self.at_page_top() {
                self.new_page();
                continue;
            }
            let take = (room.max(1.0) as usize).min(rows - drawn);
            let height = take as f32 * line_height + 2.0 * CELL_PADDING;

            self.cell_borders(height);
            let top = self.y - CELL_PADDING;
            for i in 0..take {
                let baseline = top - i as f32 * line_height - BODY_SIZE;
                if let Some(text) = label_lines.get(drawn + i) {
                    let font = self.bold_id.clone();
                    push_text(&mut self.ops, &font, MARGIN + CELL_PADDING, baseline, BODY_SIZE, text);
                }
                if let Some(text) = value_lines.get(drawn + i) {
                    let font = self.regular_id.clone();
                    let x = MARGIN + LABEL_COLUMN + CELL_PADDING;
                    push_text(&mut self.ops, &font, x, baseline, BODY_SIZE, text);
                }
            }

            self.y -= height;
            drawn += take;
            if drawn < rows {
                debug!("Table row continues on the next page");
                self.new_page();
            }
        }
    }

    fn cell_borders(&mut self, height: f32) {
        let left = MARGIN;
        let right = PAGE_WIDTH - MARGIN;
        let divider = MARGIN + LABEL_COLUMN;
        let top = self.y;
        let bottom = self.y - height;

        self.ops.push(Op::SetOutlineThickness {
            pt: Pt(BORDER_WIDTH),
        });
        self.ops.push(Op::SetOutlineColor { col: black() });
        self.ops.push(Op::DrawPolygon {
            polygon: stroke(&[(left, top), (right, top), (right, bottom), (left, bottom)]),
        });
        self.ops.push(Op::DrawPolygon {
            polygon: stroke(&[(divider, top), (divider, bottom)]),
        });
    }

    fn finish(mut self) -> Vec<Vec<Op>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }
}

fn black() -> printpdf::color::Color {
    printpdf::color::Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn stroke(points: &[(f32, f32)]) -> Polygon {
    Polygon {
        rings: vec![PolygonRing {
            points: points
                .iter()
                .map(|&(x, y)| LinePoint {
                    p: Point { x: Pt(x), y: Pt(y) },
                    bezier: false,
                })
                .collect(),
        }],
        mode: PaintMode::Stroke,
        winding_order: WindingOrder::EvenOdd,
    }
}

fn push_text(ops: &mut Vec<Op>, font: &FontId, x: f32, baseline: f32, size: f32, text: &str) {
    if text.is_empty() {
        return;
    }
    ops.push(Op::StartTextSection);
    ops.push(Op::SetFillColor { col: black() });
    ops.push(Op::SetFontSize {
        size: Pt(size),
        font: font.clone(),
    });
    ops.push(Op::SetTextMatrix {
        matrix: TextMatrix::Translate(Pt(x), Pt(baseline)),
    });
    ops.push(Op::WriteText {
        items: vec![TextItem::Text(text.to_string())],
        font: font.clone(),
    });
    ops.push(Op::EndTextSection);
}

// ── Word wrapping ────────────────────────────────────────────────────────

/// Greedy word wrap of `text` to `max_width`, as measured by `measure`.
///
/// Runs of whitespace collapse to one space. A word wider than the line is
/// broken between characters. Empty text yields no lines.
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure(word) <= max_width {
            current = word.to_string();
            continue;
        }

        for c in word.chars() {
            current.push(c);
            if measure(&current) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
