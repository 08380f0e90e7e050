//! PDF encoding of grid layouts with `lopdf`.

use crate::config::render::{Color, RenderConfig};
use crate::core::grid::{layout_report, DrawOp, Font, PageLayout, ReportLayout};
use crate::domain::model::PivotRow;
use crate::utils::error::Result;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::io::Write;

const REGULAR_FONT: &[u8] = b"F1";
const BOLD_FONT: &[u8] = b"F2";

/// Renders one (seller, category) pivot into a standalone PDF. Holds only the
/// immutable configuration, so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct GridRenderer {
    config: RenderConfig,
}

impl GridRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn render_layout(&self, seller: &str, category: &str, rows: &[PivotRow]) -> ReportLayout {
        layout_report(&self.config, seller, category, rows)
    }

    pub fn render(&self, seller: &str, category: &str, rows: &[PivotRow]) -> Result<Vec<u8>> {
        let layout = self.render_layout(seller, category, rows);
        self.encode(seller, category, &layout)
    }

    pub fn encode(&self, seller: &str, category: &str, layout: &ReportLayout) -> Result<Vec<u8>> {
        let page = &self.config.page;
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();

        let regular_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = document.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut page_ids = Vec::with_capacity(layout.pages.len());
        for page_layout in &layout.pages {
            let content = PageContext::new(page.height, page.line_width).draw(page_layout);
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&content.encode()?)?;
            let stream = Stream::new(dictionary! { "Filter" => "FlateDecode" }, encoder.finish()?);
            let content_id = document.add_object(stream);

            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_ids.push(page_id);
        }

        let kids: Vec<Object> = page_ids.iter().map(|id| Object::from(*id)).collect();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_ids.len() as i64,
            }),
        );

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let title = format!("{} - {} / {}", self.config.title, seller, category);
        let info_id = document.add_object(dictionary! {
            "Title" => Object::String(to_win_ansi(&title), StringFormat::Literal),
            "Producer" => Object::string_literal("pivot-reports"),
        });
        document.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        document.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

/// Characters WinAnsiEncoding places in 0x80..=0x9F, where Latin-1 has controls.
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

fn to_win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c as u32 {
            0x00..=0x7F | 0xA0..=0xFF => c as u8,
            _ => WIN_ANSI_HIGH
                .iter()
                .find(|(mapped, _)| *mapped == c)
                .map(|(_, byte)| *byte)
                .unwrap_or(b'?'),
        })
        .collect()
}

#[derive(Default)]
struct PageRenderState {
    fill_color: Option<Color>,
    font: Option<(Font, f32)>,
}

/// Serialises one page's primitives. PDF y grows upwards, layout y downwards.
struct PageContext {
    page_height: f32,
    line_width: f32,
    content: Content,
    state: PageRenderState,
}

impl PageContext {
    fn new(page_height: f32, line_width: f32) -> Self {
        Self {
            page_height,
            line_width,
            content: Content { operations: vec![] },
            state: PageRenderState::default(),
        }
    }

    fn draw(mut self, page: &PageLayout) -> Content {
        let mut stroke_ready = false;
        for op in &page.ops {
            match op {
                DrawOp::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => self.fill_rect(*x, *y, *width, *height, *color),
                DrawOp::Text {
                    x,
                    y,
                    text,
                    font,
                    size,
                    angle,
                } => self.text(*x, *y, text, *font, *size, *angle),
                DrawOp::Line { x1, y1, x2, y2 } => {
                    if !stroke_ready {
                        self.push("RG", vec![0.into(), 0.into(), 0.into()]);
                        self.push("w", vec![self.line_width.into()]);
                        stroke_ready = true;
                    }
                    self.push("m", vec![(*x1).into(), (self.page_height - y1).into()]);
                    self.push("l", vec![(*x2).into(), (self.page_height - y2).into()]);
                    self.push("S", vec![]);
                }
            }
        }
        self.content
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.content
            .operations
            .push(Operation::new(operator, operands));
    }

    fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color != Some(color) {
            let [r, g, b] = color.components();
            self.push("rg", vec![r.into(), g.into(), b.into()]);
            self.state.fill_color = Some(color);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.set_fill_color(color);
        let pdf_y = self.page_height - (y + height);
        self.push("re", vec![x.into(), pdf_y.into(), width.into(), height.into()]);
        self.push("f", vec![]);
    }

    fn text(&mut self, x: f32, y: f32, text: &str, font: Font, size: f32, angle: f32) {
        self.set_fill_color(Color::BLACK);
        self.push("BT", vec![]);
        if self.state.font != Some((font, size)) {
            let name = match font {
                Font::Regular => REGULAR_FONT,
                Font::Bold => BOLD_FONT,
            };
            self.push("Tf", vec![Object::Name(name.to_vec()), size.into()]);
            self.state.font = Some((font, size));
        }
        let (sin, cos) = angle.to_radians().sin_cos();
        self.push(
            "Tm",
            vec![
                cos.into(),
                sin.into(),
                (-sin).into(),
                cos.into(),
                x.into(),
                (self.page_height - y).into(),
            ],
        );
        self.push(
            "Tj",
            vec![Object::String(to_win_ansi(text), StringFormat::Literal)],
        );
        self.push("ET", vec![]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::render::OverflowMode;

    fn rows(count: usize) -> Vec<PivotRow> {
        (0..count)
            .map(|i| {
                let mut row = PivotRow::new(format!("{}", i), format!("Cliente {}", i));
                row.add("P1 - Widget".to_string(), i as f64);
                row.add("P2 - Gadget".to_string(), 1.0);
                row
            })
            .collect()
    }

    fn page_text(pdf: &[u8], page: u32) -> String {
        let doc = Document::load_mem(pdf).unwrap();
        let pages = doc.get_pages();
        let content = doc.get_page_content(*pages.get(&page).unwrap()).unwrap();
        String::from_utf8_lossy(&content).to_string()
    }

    #[test]
    fn test_render_produces_single_page_pdf() {
        let renderer = GridRenderer::default();
        let pdf = renderer.render("S1", "C1", &rows(3)).unwrap();

        assert!(pdf.starts_with(b"%PDF-1.7"));
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let content = page_text(&pdf, 1);
        assert!(content.contains("SELLER: S1"));
        assert!(content.contains("CATEGORY: C1"));
        assert!(content.contains("P2 - Gadget"));
        assert!(content.contains("Cliente 2"));
    }

    #[test]
    fn test_render_empty_pivot() {
        let renderer = GridRenderer::default();
        let pdf = renderer.render("S9", "C9", &[]).unwrap();

        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(page_text(&pdf, 1).contains("No data available"));
    }

    #[test]
    fn test_render_paginated_document() {
        let renderer = GridRenderer::new(RenderConfig {
            overflow: OverflowMode::Paginate,
            ..RenderConfig::default()
        });
        let max_rows = renderer.config().page.max_rows();
        let pdf = renderer.render("S1", "C1", &rows(max_rows + 1)).unwrap();

        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        assert!(page_text(&pdf, 2).contains(&format!("Cliente {}", max_rows)));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = GridRenderer::default();
        let first = renderer.render("S1", "C1", &rows(5)).unwrap();
        let second = renderer.render("S1", "C1", &rows(5)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fill_color_emitted_once_per_change() {
        let mut page = PageLayout::default();
        for x in [0.0, 10.0, 20.0] {
            page.ops.push(DrawOp::FillRect {
                x,
                y: 0.0,
                width: 10.0,
                height: 10.0,
                color: Color::LIGHT_GREEN,
            });
        }
        let content = PageContext::new(100.0, 0.5).draw(&page);
        let fills = content
            .operations
            .iter()
            .filter(|op| op.operator == "rg")
            .count();
        let rects = content
            .operations
            .iter()
            .filter(|op| op.operator == "re")
            .count();
        assert_eq!(fills, 1);
        assert_eq!(rects, 3);
    }

    #[test]
    fn test_non_latin_text_is_replaced() {
        assert_eq!(to_win_ansi("José"), b"Jos\xe9".to_vec());
        assert_eq!(to_win_ansi("日本"), b"??".to_vec());
        assert_eq!(to_win_ansi("€5 – “ok”"), b"\x805 \x96 \x93ok\x94".to_vec());
        // C1 控制字元不在 WinAnsi 中
        assert_eq!(to_win_ansi("a\u{0085}b"), b"a?b".to_vec());
    }
}
