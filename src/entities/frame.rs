//! Frame buffers with up to four pixel planes (planar YUV, semi-planar, packed RGB/YUV)
//!
//! **Why**: Source scenes and display buffers share one representation so the
//! pool can copy plane-by-plane when formats match and hand both sides to the
//! color converter when they don't.
//!
//! **Used by**: Producers (source scenes), FramePool (display buffers),
//! Renderer implementations, measures.
//!
//! # Plane Layout
//!
//! Each color model maps to a fixed set of planes. For each plane the layout
//! gives the horizontal/vertical subsampling divisor and bytes per sample:
//!
//! - `I420`/`Yv12`: Y full, two chroma planes at 1/2 x 1/2
//! - `Nv12`: Y full, interleaved UV at 1/2 x 1/2 (2 bytes per sample)
//! - `I422`: chroma at 1/2 x 1, `I444`: all planes full
//! - `Yuy2`/`Uyvy`: one packed plane, 2 bytes per pixel
//! - `Rgb24`: 3 bytes, `Bgra32`/`Rgba32`: 4 bytes, `Gray8`: 1 byte
//!
//! Odd dimensions round chroma sizes up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use super::layout::Rect;

/// Logical display view identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub u32);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plane index. Closed set: frames never have more than four planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Plane {
    P0,
    P1,
    P2,
    P3,
}

impl Plane {
    pub const ALL: [Plane; 4] = [Plane::P0, Plane::P1, Plane::P2, Plane::P3];

    pub fn index(self) -> usize {
        match self {
            Plane::P0 => 0,
            Plane::P1 => 1,
            Plane::P2 => 2,
            Plane::P3 => 3,
        }
    }
}

/// Pixel color model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorModel {
    I420,
    Yv12,
    Nv12,
    I422,
    I444,
    Yuy2,
    Uyvy,
    Rgb24,
    Bgra32,
    Rgba32,
    Gray8,
}

/// Per-plane geometry: subsampling divisors and sample size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlaneLayout {
    x_div: u32,
    y_div: u32,
    bytes_per_sample: usize,
    name: &'static str,
}

const fn pl(x_div: u32, y_div: u32, bytes_per_sample: usize, name: &'static str) -> Option<PlaneLayout> {
    Some(PlaneLayout { x_div, y_div, bytes_per_sample, name })
}

impl ColorModel {
    pub const ALL: [ColorModel; 11] = [
        ColorModel::I420,
        ColorModel::Yv12,
        ColorModel::Nv12,
        ColorModel::I422,
        ColorModel::I444,
        ColorModel::Yuy2,
        ColorModel::Uyvy,
        ColorModel::Rgb24,
        ColorModel::Bgra32,
        ColorModel::Rgba32,
        ColorModel::Gray8,
    ];

    fn plane_layout(self, plane: Plane) -> Option<PlaneLayout> {
        use ColorModel::*;
        match (self, plane) {
            (I420 | Yv12 | Nv12 | I422 | I444 | Gray8, Plane::P0) => pl(1, 1, 1, "Y"),
            (I420, Plane::P1) => pl(2, 2, 1, "U"),
            (I420, Plane::P2) => pl(2, 2, 1, "V"),
            (Yv12, Plane::P1) => pl(2, 2, 1, "V"),
            (Yv12, Plane::P2) => pl(2, 2, 1, "U"),
            (Nv12, Plane::P1) => pl(2, 2, 2, "UV"),
            (I422, Plane::P1) => pl(2, 1, 1, "U"),
            (I422, Plane::P2) => pl(2, 1, 1, "V"),
            (I444, Plane::P1) => pl(1, 1, 1, "U"),
            (I444, Plane::P2) => pl(1, 1, 1, "V"),
            (Yuy2, Plane::P0) => pl(1, 1, 2, "YUYV"),
            (Uyvy, Plane::P0) => pl(1, 1, 2, "UYVY"),
            (Rgb24, Plane::P0) => pl(1, 1, 3, "RGB"),
            (Bgra32, Plane::P0) => pl(1, 1, 4, "BGRA"),
            (Rgba32, Plane::P0) => pl(1, 1, 4, "RGBA"),
            _ => None,
        }
    }

    /// Number of planes used by this model
    pub fn plane_count(self) -> usize {
        Plane::ALL
            .iter()
            .filter(|p| self.plane_layout(**p).is_some())
            .count()
    }

    pub fn name(self) -> &'static str {
        use ColorModel::*;
        match self {
            I420 => "i420",
            Yv12 => "yv12",
            Nv12 => "nv12",
            I422 => "i422",
            I444 => "i444",
            Yuy2 => "yuy2",
            Uyvy => "uyvy",
            Rgb24 => "rgb24",
            Bgra32 => "bgra32",
            Rgba32 => "rgba32",
            Gray8 => "gray8",
        }
    }
}

impl FromStr for ColorModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        ColorModel::ALL
            .iter()
            .copied()
            .find(|c| c.name() == lower)
            .ok_or_else(|| format!("unknown color model '{}'", s))
    }
}

/// Format descriptor: color model, dimensions and optional explicit strides.
///
/// A stride of 0 means "packed": the row length in bytes is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameFormat {
    pub color: ColorModel,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub strides: [usize; 4],
}

impl FrameFormat {
    pub fn new(color: ColorModel, width: u32, height: u32) -> Self {
        Self {
            color,
            width,
            height,
            strides: [0; 4],
        }
    }

    /// Builder: set an explicit stride (bytes per row) for one plane
    pub fn with_stride(mut self, plane: Plane, stride: usize) -> Self {
        self.strides[plane.index()] = stride;
        self
    }

    pub fn has_plane(&self, plane: Plane) -> bool {
        self.color.plane_layout(plane).is_some()
    }

    pub fn plane_count(&self) -> usize {
        self.color.plane_count()
    }

    /// Plane width in samples (0 if the plane is absent)
    pub fn plane_width(&self, plane: Plane) -> usize {
        self.color
            .plane_layout(plane)
            .map(|l| self.width.div_ceil(l.x_div) as usize)
            .unwrap_or(0)
    }

    /// Plane height in rows (0 if the plane is absent)
    pub fn plane_height(&self, plane: Plane) -> usize {
        self.color
            .plane_layout(plane)
            .map(|l| self.height.div_ceil(l.y_div) as usize)
            .unwrap_or(0)
    }

    /// Packed row length in bytes
    pub fn row_bytes(&self, plane: Plane) -> usize {
        self.color
            .plane_layout(plane)
            .map(|l| self.plane_width(plane) * l.bytes_per_sample)
            .unwrap_or(0)
    }

    /// Bytes per row: explicit stride, never shorter than the packed row length
    pub fn stride(&self, plane: Plane) -> usize {
        if !self.has_plane(plane) {
            return 0;
        }
        self.strides[plane.index()].max(self.row_bytes(plane))
    }

    /// Total bytes in plane
    pub fn plane_size(&self, plane: Plane) -> usize {
        self.stride(plane) * self.plane_height(plane)
    }

    /// Total bytes across all planes
    pub fn frame_size(&self) -> usize {
        Plane::ALL.iter().map(|p| self.plane_size(*p)).sum()
    }

    /// Component name for plane ("Y", "U", "UV", "RGB", ...), empty if absent
    pub fn plane_name(&self, plane: Plane) -> &'static str {
        self.color.plane_layout(plane).map(|l| l.name).unwrap_or("")
    }

    pub fn same_size(&self, other: &FrameFormat) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Process-unique frame identity (stable across pool reuse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

impl FrameId {
    fn next() -> Self {
        Self(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Frame attributes: owning view and, once placed in a scene, its rectangles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInfo {
    pub view_id: Option<ViewId>,
    pub src_rect: Option<Rect>,
    pub dst_rect: Option<Rect>,
}

/// Single frame owning its pixel planes.
///
/// Not `Clone`: a frame belongs to exactly one stage at a time and is moved
/// at every hand-off (producer -> queue -> scheduler, renderer -> pool).
pub struct Frame {
    id: FrameId,
    format: FrameFormat,
    planes: [Vec<u8>; 4],
    info: FrameInfo,
}

impl Frame {
    /// Allocate a zeroed frame sized per `format`
    pub fn new(format: FrameFormat) -> Self {
        let planes = Plane::ALL.map(|p| vec![0u8; format.plane_size(p)]);
        Self {
            id: FrameId::next(),
            format,
            planes,
            info: FrameInfo::default(),
        }
    }

    /// Builder: tag frame with its owning view
    pub fn with_view(mut self, view_id: ViewId) -> Self {
        self.info.view_id = Some(view_id);
        self
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    pub fn width(&self) -> u32 {
        self.format.width
    }

    pub fn height(&self) -> u32 {
        self.format.height
    }

    pub fn info(&self) -> &FrameInfo {
        &self.info
    }

    pub fn view_id(&self) -> Option<ViewId> {
        self.info.view_id
    }

    pub fn set_view_id(&mut self, view_id: ViewId) {
        self.info.view_id = Some(view_id);
    }

    /// Attach layout rectangles (frame is part of the composite)
    pub fn set_placement(&mut self, src: Rect, dst: Rect) {
        self.info.src_rect = Some(src);
        self.info.dst_rect = Some(dst);
    }

    pub fn clear_placement(&mut self) {
        self.info.src_rect = None;
        self.info.dst_rect = None;
    }

    pub fn is_placed(&self) -> bool {
        self.info.dst_rect.is_some()
    }

    pub fn plane(&self, plane: Plane) -> &[u8] {
        &self.planes[plane.index()]
    }

    pub fn plane_mut(&mut self, plane: Plane) -> &mut [u8] {
        &mut self.planes[plane.index()]
    }

    /// Fill every byte of a plane
    pub fn fill_plane(&mut self, plane: Plane, value: u8) {
        self.planes[plane.index()].fill(value);
    }

    /// Byte-exact copy of every non-empty plane from `src`.
    ///
    /// Length per plane comes from this frame's format; both buffers are
    /// bounds-clamped so a short source cannot panic. Returns bytes copied.
    pub fn copy_planes_from(&mut self, src: &Frame) -> usize {
        let mut copied = 0;
        for plane in Plane::ALL {
            let len = self.format.plane_size(plane);
            if len == 0 {
                continue;
            }
            let dst_buf = &mut self.planes[plane.index()];
            let src_buf = &src.planes[plane.index()];
            let n = len.min(dst_buf.len()).min(src_buf.len());
            dst_buf[..n].copy_from_slice(&src_buf[..n]);
            copied += n;
        }
        copied
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("format", &self.format)
            .field("plane_bytes", &self.planes.each_ref().map(|p| p.len()))
            .field("info", &self.info)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i420_plane_sizes() {
        let fmt = FrameFormat::new(ColorModel::I420, 64, 48);
        assert_eq!(fmt.plane_count(), 3);
        assert_eq!(fmt.plane_size(Plane::P0), 64 * 48);
        assert_eq!(fmt.plane_size(Plane::P1), 32 * 24);
        assert_eq!(fmt.plane_size(Plane::P2), 32 * 24);
        assert_eq!(fmt.plane_size(Plane::P3), 0);
        assert_eq!(fmt.frame_size(), 64 * 48 * 3 / 2);
    }

    #[test]
    fn test_odd_dimensions_round_chroma_up() {
        let fmt = FrameFormat::new(ColorModel::I420, 5, 3);
        assert_eq!(fmt.plane_width(Plane::P1), 3);
        assert_eq!(fmt.plane_height(Plane::P1), 2);
    }

    #[test]
    fn test_packed_and_semi_planar() {
        let nv12 = FrameFormat::new(ColorModel::Nv12, 16, 16);
        assert_eq!(nv12.plane_count(), 2);
        assert_eq!(nv12.row_bytes(Plane::P1), 16);
        assert_eq!(nv12.plane_name(Plane::P1), "UV");

        let yuy2 = FrameFormat::new(ColorModel::Yuy2, 16, 4);
        assert_eq!(yuy2.plane_count(), 1);
        assert_eq!(yuy2.plane_size(Plane::P0), 16 * 2 * 4);

        let bgra = FrameFormat::new(ColorModel::Bgra32, 10, 10);
        assert_eq!(bgra.plane_size(Plane::P0), 400);
    }

    #[test]
    fn test_explicit_stride() {
        let fmt = FrameFormat::new(ColorModel::Gray8, 10, 4).with_stride(Plane::P0, 16);
        assert_eq!(fmt.stride(Plane::P0), 16);
        assert_eq!(fmt.plane_size(Plane::P0), 64);
        assert_ne!(fmt, FrameFormat::new(ColorModel::Gray8, 10, 4));
    }

    #[test]
    fn test_short_stride_clamped_to_row() {
        let fmt = FrameFormat::new(ColorModel::Gray8, 10, 2).with_stride(Plane::P0, 4);
        assert_eq!(fmt.stride(Plane::P0), 10);
        assert_eq!(fmt.plane_size(Plane::P0), 20);
        assert_eq!(Frame::new(fmt).plane(Plane::P0).len(), 20);
    }

    #[test]
    fn test_yv12_swaps_chroma_names() {
        let fmt = FrameFormat::new(ColorModel::Yv12, 8, 8);
        assert_eq!(fmt.plane_name(Plane::P1), "V");
        assert_eq!(fmt.plane_name(Plane::P2), "U");
    }

    #[test]
    fn test_color_model_from_str() {
        assert_eq!("I420".parse::<ColorModel>(), Ok(ColorModel::I420));
        assert_eq!("bgra32".parse::<ColorModel>(), Ok(ColorModel::Bgra32));
        assert!("yuv9".parse::<ColorModel>().is_err());
    }

    #[test]
    fn test_frame_ids_unique() {
        let fmt = FrameFormat::new(ColorModel::Gray8, 2, 2);
        let a = Frame::new(fmt);
        let b = Frame::new(fmt);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_copy_planes() {
        let fmt = FrameFormat::new(ColorModel::I420, 4, 4);
        let mut src = Frame::new(fmt);
        src.fill_plane(Plane::P0, 10);
        src.fill_plane(Plane::P1, 20);
        src.fill_plane(Plane::P2, 30);

        let mut dst = Frame::new(fmt);
        let copied = dst.copy_planes_from(&src);
        assert_eq!(copied, fmt.frame_size());
        assert!(dst.plane(Plane::P0).iter().all(|b| *b == 10));
        assert!(dst.plane(Plane::P2).iter().all(|b| *b == 30));
    }

    #[test]
    fn test_placement() {
        let mut frame = Frame::new(FrameFormat::new(ColorModel::Gray8, 2, 2)).with_view(ViewId(3));
        assert_eq!(frame.view_id(), Some(ViewId(3)));
        assert!(!frame.is_placed());

        let r = Rect::new(0, 0, 2, 2);
        frame.set_placement(r, r);
        assert!(frame.is_placed());
        frame.clear_placement();
        assert_eq!(frame.info().src_rect, None);
    }
}
