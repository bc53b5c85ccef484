// Pie chart of vote shares drawn with PDF path operators

use super::fonts::ReportFont;
use super::layout::{push_text, PageOps, Rgb};
use lopdf::content::Operation;
use std::f32::consts::PI;

const HEIGHT: f32 = 140.0;
const RADIUS: f32 = 60.0;
const LABEL_SIZE: f32 = 8.0;

const PALETTE: [u32; 8] = [
    0x2563EB, 0xDC2626, 0x16A34A, 0xD97706, 0x7C3AED, 0x0D9488, 0xDB2777, 0x64748B,
];

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("nothing to plot")]
    Empty,
    #[error("invalid value for slice {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone)]
pub struct Slice {
    pub label: String,
    pub value: f64,
}

impl Slice {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PieChart {
    slices: Vec<Slice>,
    total: f64,
}

impl PieChart {
    /// Negative values count as zero; a chart needs a positive, finite total.
    pub fn new(slices: Vec<Slice>) -> Result<Self, ChartError> {
        let mut clamped = Vec::with_capacity(slices.len());
        for slice in slices {
            if !slice.value.is_finite() {
                return Err(ChartError::InvalidValue(slice.label));
            }
            clamped.push(Slice {
                value: slice.value.max(0.0),
                ..slice
            });
        }

        let total: f64 = clamped.iter().map(|s| s.value).sum();
        if total <= 0.0 {
            return Err(ChartError::Empty);
        }

        Ok(Self {
            slices: clamped,
            total,
        })
    }

    pub fn height(&self) -> f32 {
        HEIGHT
    }

    #[cfg(test)]
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Angular extent of each slice in radians, clockwise from twelve o'clock
    pub fn sweeps(&self) -> Vec<f32> {
        self.slices
            .iter()
            .map(|s| (s.value / self.total) as f32 * 2.0 * PI)
            .collect()
    }

    pub fn draw(&self, ops: &mut PageOps, font: &ReportFont, left: f32, bottom: f32, width: f32) {
        let cx = left + width / 2.0;
        let cy = bottom + HEIGHT / 2.0;
        let mut start = PI / 2.0;

        for (index, (slice, sweep)) in self.slices.iter().zip(self.sweeps()).enumerate() {
            if sweep <= 0.0 {
                continue;
            }
            let end = start - sweep;
            let color = Rgb::hex(PALETTE[index % PALETTE.len()]);

            ops.push(Operation::new(
                "rg",
                vec![color.0.into(), color.1.into(), color.2.into()],
            ));
            ops.push(Operation::new("RG", vec![1.0_f32.into(), 1.0_f32.into(), 1.0_f32.into()]));
            ops.push(Operation::new("w", vec![0.5_f32.into()]));
            wedge(ops, cx, cy, RADIUS, start, end);
            ops.push(Operation::new("B", vec![]));

            let middle = start - sweep / 2.0;
            self.label(ops, font, &slice.label, cx, cy, middle);

            start = end;
        }
    }

    fn label(&self, ops: &mut PageOps, font: &ReportFont, text: &str, cx: f32, cy: f32, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        let inner = (cx + RADIUS * cos, cy + RADIUS * sin);
        let outer = (cx + (RADIUS + 8.0) * cos, cy + (RADIUS + 8.0) * sin);

        ops.push(Operation::new("RG", vec![0.4_f32.into(), 0.4_f32.into(), 0.4_f32.into()]));
        ops.push(Operation::new("w", vec![0.5_f32.into()]));
        ops.push(Operation::new("m", vec![inner.0.into(), inner.1.into()]));
        ops.push(Operation::new("l", vec![outer.0.into(), outer.1.into()]));
        ops.push(Operation::new("S", vec![]));

        let text_width = font.text_width(text, LABEL_SIZE);
        let x = if cos >= 0.0 {
            outer.0 + 2.0
        } else {
            outer.0 - 2.0 - text_width
        };
        let y = outer.1 - LABEL_SIZE * 0.35;
        push_text(ops, text, LABEL_SIZE, x, y, Rgb::BLACK);
    }
}

/// Closed wedge path from the centre along an arc from `start` to `end`
fn wedge(ops: &mut PageOps, cx: f32, cy: f32, r: f32, start: f32, end: f32) {
    let point = |a: f32| (cx + r * a.cos(), cy + r * a.sin());

    let (x0, y0) = point(start);
    ops.push(Operation::new("m", vec![cx.into(), cy.into()]));
    ops.push(Operation::new("l", vec![x0.into(), y0.into()]));

    // Cubic Bézier segments of at most a quarter turn each
    let sweep = end - start;
    let segments = (sweep.abs() / (PI / 2.0)).ceil().max(1.0) as usize;
    let step = sweep / segments as f32;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    for i in 0..segments {
        let a0 = start + step * i as f32;
        let a1 = a0 + step;
        let (px0, py0) = point(a0);
        let (px3, py3) = point(a1);
        let c1 = (px0 - k * r * a0.sin(), py0 + k * r * a0.cos());
        let c2 = (px3 + k * r * a1.sin(), py3 - k * r * a1.cos());

        ops.push(Operation::new(
            "c",
            vec![
                c1.0.into(),
                c1.1.into(),
                c2.0.into(),
                c2.1.into(),
                px3.into(),
                py3.into(),
            ],
        ));
    }

    ops.push(Operation::new("h", vec![]));
}
