//! Page layout for the customer × product grid.
//!
//! Layout is computed here as a list of drawing primitives in top-left page
//! coordinates (points, y grows downwards). The PDF encoder only serialises
//! these primitives, so every geometric rule can be checked without parsing
//! a PDF.

use crate::config::render::{Color, OverflowMode, PageGeometry, RenderConfig};
use crate::core::aggregator::column_set;
use crate::domain::model::PivotRow;

const TITLE_SELLER_OFFSET: f32 = 14.0;
const TITLE_CATEGORY_OFFSET: f32 = 30.0;
const EMPTY_MESSAGE_OFFSET: f32 = 60.0;
const HEADER_TEXT_INSET_X: f32 = 6.0;
const HEADER_TEXT_LIFT: f32 = 10.0;
const CELL_TEXT_INSET: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline; `angle` is counter-clockwise, in degrees.
    Text {
        x: f32,
        y: f32,
        text: String,
        font: Font,
        size: f32,
        angle: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
    pub row_count: usize,
}

impl PageLayout {
    pub fn fills(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillRect { .. }))
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Line { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportLayout {
    pub columns: Vec<String>,
    pub pages: Vec<PageLayout>,
    pub rendered_rows: usize,
    pub truncated_rows: usize,
}

/// Horizontal metrics of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub left: f32,
    pub usable_width: f32,
    pub code_width: f32,
    pub name_width: f32,
    pub product_width: f32,
}

impl GridMetrics {
    pub fn new(page: &PageGeometry, product_count: usize) -> Self {
        let usable_width = page.usable_width();
        let product_area = usable_width - page.code_width - page.name_width;
        let product_width = if product_count == 0 {
            0.0
        } else {
            product_area / product_count as f32
        };

        Self {
            left: page.margin_x,
            usable_width,
            code_width: page.code_width,
            name_width: page.name_width,
            product_width,
        }
    }

    pub fn products_left(&self) -> f32 {
        self.left + self.code_width + self.name_width
    }

    /// x of every vertical grid line, left to right.
    pub fn column_edges(&self, product_count: usize) -> Vec<f32> {
        let mut edges = vec![
            self.left,
            self.left + self.code_width,
            self.products_left(),
        ];
        let products_left = self.products_left();
        edges.extend((1..=product_count).map(|i| products_left + i as f32 * self.product_width));
        edges
    }
}

/// Lays out one report. Pure and deterministic.
pub fn layout_report(
    config: &RenderConfig,
    seller: &str,
    category: &str,
    rows: &[PivotRow],
) -> ReportLayout {
    let page = &config.page;

    if rows.is_empty() {
        let mut empty = PageLayout::default();
        push_title(&mut empty, config, seller, category);
        empty.ops.push(DrawOp::Text {
            x: page.margin_x,
            y: page.margin_y + EMPTY_MESSAGE_OFFSET,
            text: config.empty_message.clone(),
            font: Font::Bold,
            size: page.title_font_size,
            angle: 0.0,
        });
        return ReportLayout {
            pages: vec![empty],
            ..ReportLayout::default()
        };
    }

    let columns = column_set(rows, config.column_set);
    let metrics = GridMetrics::new(page, columns.len());
    let max_rows = page.max_rows();

    let chunks: Vec<&[PivotRow]> = match config.overflow {
        OverflowMode::Paginate if max_rows > 0 => rows.chunks(max_rows).collect(),
        _ => vec![&rows[..max_rows.min(rows.len())]],
    };

    let pages: Vec<PageLayout> = chunks
        .into_iter()
        .map(|chunk| layout_page(config, &metrics, &columns, seller, category, chunk))
        .collect();

    let rendered_rows: usize = pages.iter().map(|p| p.row_count).sum();
    if rendered_rows < rows.len() {
        tracing::debug!(
            "Report {}/{}: {} of {} rows do not fit on the page",
            seller,
            category,
            rows.len() - rendered_rows,
            rows.len()
        );
    }

    ReportLayout {
        columns,
        pages,
        rendered_rows,
        truncated_rows: rows.len() - rendered_rows,
    }
}

fn push_title(layout: &mut PageLayout, config: &RenderConfig, seller: &str, category: &str) {
    let page = &config.page;
    for (offset, caption, value) in [
        (TITLE_SELLER_OFFSET, &config.seller_caption, seller),
        (TITLE_CATEGORY_OFFSET, &config.category_caption, category),
    ] {
        layout.ops.push(DrawOp::Text {
            x: page.margin_x,
            y: page.margin_y + offset,
            text: format!("{}: {}", caption, value),
            font: Font::Bold,
            size: page.title_font_size,
            angle: 0.0,
        });
    }
}

fn layout_page(
    config: &RenderConfig,
    metrics: &GridMetrics,
    columns: &[String],
    seller: &str,
    category: &str,
    rows: &[PivotRow],
) -> PageLayout {
    let page = &config.page;
    let mut layout = PageLayout {
        ops: Vec::new(),
        row_count: rows.len(),
    };

    push_title(&mut layout, config, seller, category);

    // 斜體欄位標題，錨定在標題列底部
    let header_baseline = page.header_top() + page.header_height - HEADER_TEXT_LIFT;
    for (i, column) in columns.iter().enumerate() {
        layout.ops.push(DrawOp::Text {
            x: metrics.products_left() + i as f32 * metrics.product_width + HEADER_TEXT_INSET_X,
            y: header_baseline,
            text: column.clone(),
            font: Font::Regular,
            size: page.header_font_size,
            angle: page.header_angle,
        });
    }

    let top = page.grid_top();
    for (i, row) in rows.iter().enumerate() {
        let row_y = top + i as f32 * page.row_height;
        let text_y = row_y + page.row_height - CELL_TEXT_INSET;

        for (x, text) in [
            (metrics.left, &row.customer_code),
            (metrics.left + metrics.code_width, &row.customer_name),
        ] {
            layout.ops.push(DrawOp::Text {
                x: x + CELL_TEXT_INSET,
                y: text_y,
                text: text.clone(),
                font: Font::Regular,
                size: page.body_font_size,
                angle: 0.0,
            });
        }

        let mut x = metrics.products_left();
        for column in columns {
            let value = row.quantity(column);
            layout.ops.push(DrawOp::FillRect {
                x,
                y: row_y,
                width: metrics.product_width,
                height: page.row_height,
                color: cell_color(config, value),
            });

            let text = format_quantity(value);
            let width = text_width(&text, page.body_font_size);
            layout.ops.push(DrawOp::Text {
                x: x + metrics.product_width / 2.0 - width / 2.0,
                y: row_y + page.row_height / 2.0 + 2.0,
                text,
                font: Font::Regular,
                size: page.body_font_size,
                angle: 0.0,
            });

            x += metrics.product_width;
        }
    }

    let bottom = top + rows.len() as f32 * page.row_height;
    for i in 0..=rows.len() {
        let y = top + i as f32 * page.row_height;
        layout.ops.push(DrawOp::Line {
            x1: metrics.left,
            y1: y,
            x2: metrics.left + metrics.usable_width,
            y2: y,
        });
    }
    for x in metrics.column_edges(columns.len()) {
        layout.ops.push(DrawOp::Line {
            x1: x,
            y1: top,
            x2: x,
            y2: bottom,
        });
    }

    layout
}

/// Present/absent coloring; magnitude does not matter.
pub fn cell_color(config: &RenderConfig, value: f64) -> Color {
    if value > 0.0 {
        config.has_sales_color
    } else {
        config.no_sales_color
    }
}

/// Integral quantities print without a decimal part.
pub fn format_quantity(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// Advance width of `text` in Helvetica at `size` points.
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(helvetica_advance).sum();
    units as f32 * size / 1000.0
}

fn helvetica_advance(c: char) -> u32 {
    match c {
        ' ' | '!' | ',' | '.' | '/' | ':' | ';' | '[' | '\\' | ']' | 'I' | 'f' | 't' => 278,
        '"' => 355,
        '%' => 889,
        '&' | 'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667,
        '\'' => 191,
        '(' | ')' | '-' | '`' | 'r' => 333,
        '*' => 389,
        '+' | '<' | '=' | '>' | '~' => 584,
        '@' => 1015,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' | 'w' => 722,
        'F' | 'T' | 'Z' => 611,
        'G' | 'O' | 'Q' => 778,
        'J' | 'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500,
        'M' | 'm' => 833,
        'W' => 944,
        '^' => 469,
        'i' | 'j' | 'l' => 222,
        '{' | '}' => 334,
        '|' => 260,
        _ => 556,
    }
}
