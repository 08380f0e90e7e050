use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Sales Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const LIGHT_GREEN: Color = Color::rgb(144, 238, 144);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#RRGGBB` / `RRGGBB`
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#').unwrap_or(value.trim());
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// 不合法或缺少時使用預設顏色，渲染不因外觀設定失敗
    pub fn from_hex_or(value: Option<&str>, default: Color) -> Color {
        match value {
            None => default,
            Some(raw) => Self::from_hex(raw).unwrap_or_else(|| {
                tracing::warn!("Invalid color '{}', using default {:?}", raw, default);
                default
            }),
        }
    }

    pub(crate) fn components(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Which product labels become columns on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSet {
    /// Columns come from the first pivot row only; products that appear only
    /// in later rows are not drawn.
    #[default]
    FirstRow,
    /// Union of products across all rows, in first-appearance order.
    Union,
}

impl std::str::FromStr for ColumnSet {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_row" => Ok(ColumnSet::FirstRow),
            "union" => Ok(ColumnSet::Union),
            other => Err(format!(
                "unknown column set '{}', expected first_row or union",
                other
            )),
        }
    }
}

/// What happens to rows that do not fit on the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowMode {
    #[default]
    Truncate,
    /// Continue on extra pages of the same document, repeating title and headers.
    Paginate,
}

impl std::str::FromStr for OverflowMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truncate" => Ok(OverflowMode::Truncate),
            "paginate" => Ok(OverflowMode::Paginate),
            other => Err(format!(
                "unknown overflow mode '{}', expected truncate or paginate",
                other
            )),
        }
    }
}

/// Fixed page geometry, in points. Defaults describe an A3 landscape page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    pub code_width: f32,
    pub name_width: f32,
    pub row_height: f32,
    pub header_height: f32,
    pub header_angle: f32,
    pub header_font_size: f32,
    pub body_font_size: f32,
    pub title_font_size: f32,
    pub line_width: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 1190.55,
            height: 841.89,
            margin_x: 10.0,
            margin_y: 10.0,
            code_width: 60.0,
            name_width: 150.0,
            row_height: 10.0,
            header_height: 38.0,
            header_angle: 60.0,
            header_font_size: 6.0,
            body_font_size: 6.0,
            title_font_size: 14.0,
            line_width: 0.5,
        }
    }
}

impl PageGeometry {
    pub fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin_x
    }

    /// Top edge of the header band.
    pub fn header_top(&self) -> f32 {
        self.margin_y + 50.0
    }

    /// Top edge of the first data row.
    pub fn grid_top(&self) -> f32 {
        self.header_top() + self.header_height
    }

    pub fn max_rows(&self) -> usize {
        let available = self.height - self.grid_top() - self.margin_y;
        if available <= 0.0 || self.row_height <= 0.0 {
            return 0;
        }
        (available / self.row_height).floor() as usize
    }
}

/// Immutable renderer configuration, passed explicitly to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub title: String,
    pub seller_caption: String,
    pub category_caption: String,
    pub empty_message: String,
    pub no_sales_color: Color,
    pub has_sales_color: Color,
    pub column_set: ColumnSet,
    pub overflow: OverflowMode,
    pub page: PageGeometry,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            seller_caption: "SELLER".to_string(),
            category_caption: "CATEGORY".to_string(),
            empty_message: "No data available".to_string(),
            no_sales_color: Color::WHITE,
            has_sales_color: Color::LIGHT_GREEN,
            column_set: ColumnSet::default(),
            overflow: OverflowMode::default(),
            page: PageGeometry::default(),
        }
    }
}
