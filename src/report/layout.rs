//! Top-down flow layout of report blocks onto A4 pages.
//!
//! Blocks are placed in order inside the page frame. A block that does not fit
//! in the remaining space moves to a fresh page; tables are split by row and
//! may repeat their header rows.

use super::chart::PieChart;
use super::fonts::{encode_win_ansi, ReportFont};
use lopdf::content::Operation;
use lopdf::Object;

pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

/// Resource name of the regular font in every page
pub const FONT_RESOURCE: &str = "F1";
/// Resource name of the logo image
pub const LOGO_RESOURCE: &str = "Im1";

/// Millimetres to PDF points
pub fn mm(value: f32) -> f32 {
    value * 72.0 / 25.4
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
    pub const GREY: Rgb = Rgb(0.5, 0.5, 0.5);

    pub fn hex(value: u32) -> Rgb {
        Rgb(
            ((value >> 16) & 0xFF) as f32 / 255.0,
            ((value >> 8) & 0xFF) as f32 / 255.0,
            (value & 0xFF) as f32 / 255.0,
        )
    }

    fn operands(self) -> Vec<Object> {
        vec![self.0.into(), self.1.into(), self.2.into()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub width: f32,
    pub align: Align,
}

impl Column {
    pub fn new(width: f32, align: Align) -> Self {
        Self { width, align }
    }
}

#[derive(Debug, Clone)]
pub struct TableStyle {
    pub font_size: f32,
    pub padding: f32,
    pub header_background: Option<Rgb>,
    pub header_text: Rgb,
    pub body_background: Option<Rgb>,
    pub grid: Option<(Rgb, f32)>,
    pub repeat_header: bool,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            padding: 4.0,
            header_background: None,
            header_text: Rgb::BLACK,
            body_background: None,
            grid: None,
            repeat_header: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    pub header_rows: usize,
    pub style: TableStyle,
}

impl Table {
    pub fn width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    fn row_height(&self) -> f32 {
        self.style.font_size * 1.2 + self.style.padding * 2.0
    }
}

#[derive(Debug, Clone)]
pub struct Paragraph {
    pub text: String,
    pub size: f32,
    pub leading: f32,
    pub align: Align,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, size: f32, leading: f32, align: Align) -> Self {
        Self {
            text: text.into(),
            size,
            leading,
            align,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Block {
    Paragraph(Paragraph),
    Spacer(f32),
    Table(Table),
    Chart(PieChart),
    /// Horizontal line across the frame with padding above and below
    Rule { color: Rgb, width: f32, padding: f32 },
    /// Logo XObject drawn centered at the given size
    Image { width: f32, height: f32 },
    PageBreak,
}

/// Geometry of the writable area of a page
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl Frame {
    pub fn a4(margin: f32) -> Self {
        Self {
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin,
        }
    }

    pub fn width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    fn top(&self) -> f32 {
        self.page_height - self.margin
    }

    fn bottom(&self) -> f32 {
        self.margin
    }
}

/// Content operations of one page
pub type PageOps = Vec<Operation>;

pub struct Composer<'a> {
    font: &'a ReportFont,
    frame: Frame,
    pages: Vec<PageOps>,
    ops: PageOps,
    cursor: f32,
}

impl<'a> Composer<'a> {
    pub fn new(font: &'a ReportFont, frame: Frame) -> Self {
        Self {
            font,
            frame,
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: frame.top(),
        }
    }

    /// Lay out all blocks and return the finished pages
    pub fn compose(mut self, blocks: &[Block]) -> Vec<PageOps> {
        for block in blocks {
            match block {
                Block::Paragraph(paragraph) => self.paragraph(paragraph),
                Block::Spacer(height) => self.cursor -= height,
                Block::Table(table) => self.table(table),
                Block::Chart(chart) => self.chart(chart),
                Block::Rule {
                    color,
                    width,
                    padding,
                } => self.rule(*color, *width, *padding),
                Block::Image { width, height } => self.image(*width, *height),
                Block::PageBreak => {
                    if !self.ops.is_empty() {
                        self.new_page();
                    }
                }
            }
        }

        self.pages.push(self.ops);
        self.pages
    }

    fn remaining(&self) -> f32 {
        self.cursor - self.frame.bottom()
    }

    fn at_page_top(&self) -> bool {
        self.ops.is_empty()
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.cursor = self.frame.top();
    }

    fn ensure_space(&mut self, height: f32) {
        if height > self.remaining() && !self.at_page_top() {
            self.new_page();
        }
    }

    fn aligned_x(&self, left: f32, width: f32, content_width: f32, align: Align) -> f32 {
        match align {
            Align::Left => left,
            Align::Center => left + (width - content_width) / 2.0,
            Align::Right => left + width - content_width,
        }
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        let lines = self
            .font
            .wrap(&paragraph.text, paragraph.size, self.frame.width());

        for line in lines {
            self.ensure_space(paragraph.leading);
            let width = self.font.text_width(&line, paragraph.size);
            let x = self.aligned_x(self.frame.margin, self.frame.width(), width, paragraph.align);
            let baseline = self.cursor - paragraph.size;
            push_text(&mut self.ops, &line, paragraph.size, x, baseline, Rgb::BLACK);
            self.cursor -= paragraph.leading;
        }
    }

    fn table(&mut self, table: &Table) {
        let row_height = table.row_height();
        let left = self.frame.margin + (self.frame.width() - table.width()).max(0.0) / 2.0;
        let header_rows = table.header_rows.min(table.rows.len());
        let (header, body) = table.rows.split_at(header_rows);

        // Keep the header together with at least one body row
        let lead = (header.len() + usize::from(!body.is_empty())) as f32 * row_height;
        self.ensure_space(lead);

        for row in header {
            self.table_row(table, row, left, true);
        }

        for row in body {
            if row_height > self.remaining() {
                self.new_page();
                if table.style.repeat_header {
                    for row in header {
                        self.table_row(table, row, left, true);
                    }
                }
            }
            self.table_row(table, row, left, false);
        }
    }

    fn table_row(&mut self, table: &Table, row: &[String], left: f32, is_header: bool) {
        let style = &table.style;
        let height = table.row_height();
        let bottom = self.cursor - height;

        let background = if is_header {
            style.header_background
        } else {
            style.body_background
        };
        if let Some(color) = background {
            self.ops.push(Operation::new("rg", color.operands()));
            self.ops.push(rect(left, bottom, table.width(), height));
            self.ops.push(Operation::new("f", vec![]));
        }

        let text_color = if is_header {
            style.header_text
        } else {
            Rgb::BLACK
        };
        let baseline = bottom + (height - style.font_size) / 2.0 + style.font_size * 0.22;

        let mut x = left;
        for (column, cell) in table.columns.iter().zip(row.iter()) {
            let inner = (column.width - 2.0 * style.padding).max(0.0);
            let text = self.font.fit_text(cell, style.font_size, inner);
            let width = self.font.text_width(&text, style.font_size);
            let text_x = self.aligned_x(x + style.padding, inner, width, column.align);
            push_text(&mut self.ops, &text, style.font_size, text_x, baseline, text_color);

            if let Some((color, line_width)) = style.grid {
                self.ops.push(Operation::new("RG", color.operands()));
                self.ops.push(Operation::new("w", vec![line_width.into()]));
                self.ops.push(rect(x, bottom, column.width, height));
                self.ops.push(Operation::new("S", vec![]));
            }
            x += column.width;
        }

        self.cursor = bottom;
    }

    fn chart(&mut self, chart: &PieChart) {
        let height = chart.height();
        self.ensure_space(height);

        let bottom = self.cursor - height;
        chart.draw(&mut self.ops, self.font, self.frame.margin, bottom, self.frame.width());
        self.cursor = bottom;
    }

    fn rule(&mut self, color: Rgb, width: f32, padding: f32) {
        self.ensure_space(padding * 2.0);
        let y = self.cursor - padding;

        self.ops.push(Operation::new("RG", color.operands()));
        self.ops.push(Operation::new("w", vec![width.into()]));
        self.ops.push(Operation::new(
            "m",
            vec![self.frame.margin.into(), y.into()],
        ));
        self.ops.push(Operation::new(
            "l",
            vec![(self.frame.margin + self.frame.width()).into(), y.into()],
        ));
        self.ops.push(Operation::new("S", vec![]));

        self.cursor -= padding * 2.0;
    }

    fn image(&mut self, width: f32, height: f32) {
        self.ensure_space(height);
        let x = self.aligned_x(self.frame.margin, self.frame.width(), width, Align::Center);
        let y = self.cursor - height;

        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                width.into(),
                0.0_f32.into(),
                0.0_f32.into(),
                height.into(),
                x.into(),
                y.into(),
            ],
        ));
        self.ops.push(Operation::new("Do", vec![LOGO_RESOURCE.into()]));
        self.ops.push(Operation::new("Q", vec![]));

        self.cursor = y;
    }
}

fn rect(x: f32, y: f32, width: f32, height: f32) -> Operation {
    Operation::new(
        "re",
        vec![x.into(), y.into(), width.into(), height.into()],
    )
}

/// Emit a single line of text in the report font
pub fn push_text(ops: &mut PageOps, text: &str, size: f32, x: f32, y: f32, color: Rgb) {
    if text.is_empty() {
        return;
    }
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![FONT_RESOURCE.into(), size.into()]));
    ops.push(Operation::new("rg", color.operands()));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(encode_win_ansi(text))],
    ));
    ops.push(Operation::new("ET", vec![]));
}
