//! Quality measures between two frames of the same format (MSE, PSNR)
//!
//! **Why**: Comparing a processed stream against its reference is the main
//! analysis use of multi-view display; measures run on the same `Frame`
//! type the scheduler carries.
//!
//! **Used by**: Hosts comparing two views; headless binary summary
//!
//! Rows are compared over their packed byte length, so stride padding never
//! contributes to the error.

use std::fmt;

use crate::entities::{ColorModel, Frame, FrameFormat, Plane};
use crate::error::MeasureError;

/// PSNR peak term: 20 * log10(255)
const PSNR_PEAK_DB: f64 = 48.130_803_608_679_1;

/// MSE floor used for PSNR so identical inputs give a finite value (~68.1 dB)
const PSNR_MIN_MSE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureKind {
    Mse,
    Psnr,
}

impl MeasureKind {
    pub const ALL: [MeasureKind; 2] = [MeasureKind::Mse, MeasureKind::Psnr];

    pub fn name(self) -> &'static str {
        match self {
            MeasureKind::Mse => "MSE",
            MeasureKind::Psnr => "PSNR",
        }
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One measure on one plane (`None` = all planes combined)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeasureItem {
    pub kind: MeasureKind,
    pub plane: Option<Plane>,
}

impl MeasureItem {
    /// Display label, e.g. "PSNR Y Component"
    pub fn label(&self, format: &FrameFormat) -> String {
        match self.plane {
            Some(plane) => format!("{} {} Component", self.kind, format.plane_name(plane)),
            None => self.kind.name().to_string(),
        }
    }
}

/// Measures available for a pair of formats. Empty when color model or
/// size differ.
pub fn supported_measures(a: &FrameFormat, b: &FrameFormat) -> Vec<MeasureItem> {
    if a.color != b.color || !a.same_size(b) {
        return Vec::new();
    }
    let mut items = Vec::new();
    for kind in MeasureKind::ALL {
        items.push(MeasureItem { kind, plane: None });
        items.extend(
            Plane::ALL
                .into_iter()
                .filter(|p| a.has_plane(*p))
                .map(|p| MeasureItem { kind, plane: Some(p) }),
        );
    }
    items
}

/// Result of [`compute`]: one value per supported item
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureReport {
    values: Vec<(MeasureItem, f64)>,
}

impl MeasureReport {
    pub fn get(&self, kind: MeasureKind, plane: Option<Plane>) -> Option<f64> {
        self.values
            .iter()
            .find(|(item, _)| item.kind == kind && item.plane == plane)
            .map(|(_, v)| *v)
    }

    pub fn values(&self) -> &[(MeasureItem, f64)] {
        &self.values
    }
}

pub fn psnr_from_mse(mse: f64) -> f64 {
    PSNR_PEAK_DB - 10.0 * mse.max(PSNR_MIN_MSE).log10()
}

/// Sum of squared differences and sample count for one plane
fn plane_error(a: &Frame, b: &Frame, plane: Plane) -> (f64, usize) {
    let row_bytes = a.format().row_bytes(plane);
    let rows = a.format().plane_height(plane);
    let (stride_a, stride_b) = (a.format().stride(plane), b.format().stride(plane));
    let (pa, pb) = (a.plane(plane), b.plane(plane));

    let mut sum = 0.0;
    for y in 0..rows {
        let ra = &pa[y * stride_a..y * stride_a + row_bytes];
        let rb = &pb[y * stride_b..y * stride_b + row_bytes];
        sum += ra
            .iter()
            .zip(rb)
            .map(|(x, y)| {
                let d = *x as i32 - *y as i32;
                (d * d) as f64
            })
            .sum::<f64>();
    }
    (sum, row_bytes * rows)
}

/// Compute MSE and PSNR per plane and over all planes.
///
/// Inputs must share the exact same format (strides included).
pub fn compute(a: &Frame, b: &Frame) -> Result<MeasureReport, MeasureError> {
    if a.format() != b.format() {
        return Err(MeasureError::FormatMismatch {
            left: *a.format(),
            right: *b.format(),
        });
    }

    let mut values = Vec::new();
    let (mut total_sum, mut total_samples) = (0.0, 0usize);
    for plane in Plane::ALL.into_iter().filter(|p| a.format().has_plane(*p)) {
        let (sum, samples) = plane_error(a, b, plane);
        total_sum += sum;
        total_samples += samples;
        let mse = if samples > 0 { sum / samples as f64 } else { 0.0 };
        values.push((MeasureItem { kind: MeasureKind::Mse, plane: Some(plane) }, mse));
        values.push((MeasureItem { kind: MeasureKind::Psnr, plane: Some(plane) }, psnr_from_mse(mse)));
    }

    let mse = if total_samples > 0 { total_sum / total_samples as f64 } else { 0.0 };
    values.push((MeasureItem { kind: MeasureKind::Mse, plane: None }, mse));
    values.push((MeasureItem { kind: MeasureKind::Psnr, plane: None }, psnr_from_mse(mse)));

    Ok(MeasureReport { values })
}

/// Per-sample squared error of one plane as a Gray8 frame (clamped to 255).
///
/// The map has the plane's sample grid in bytes: packed formats produce one
/// map pixel per byte.
pub fn distortion_map(a: &Frame, b: &Frame, plane: Plane) -> Result<Frame, MeasureError> {
    if a.format() != b.format() {
        return Err(MeasureError::FormatMismatch {
            left: *a.format(),
            right: *b.format(),
        });
    }
    let fmt = a.format();
    let row_bytes = fmt.row_bytes(plane);
    let rows = fmt.plane_height(plane);
    let mut map = Frame::new(FrameFormat::new(ColorModel::Gray8, row_bytes as u32, rows as u32));
    if let Some(view) = a.view_id() {
        map.set_view_id(view);
    }

    let stride = fmt.stride(plane);
    let (pa, pb) = (a.plane(plane), b.plane(plane));
    let out = map.plane_mut(Plane::P0);
    for y in 0..rows {
        let ra = &pa[y * stride..y * stride + row_bytes];
        let rb = &pb[y * stride..y * stride + row_bytes];
        let ro = &mut out[y * row_bytes..(y + 1) * row_bytes];
        for ((o, x), y) in ro.iter_mut().zip(ra).zip(rb) {
            let d = *x as i32 - *y as i32;
            *o = (d * d).min(255) as u8;
        }
    }
    Ok(map)
}
