//! View layout: which views are on screen and where.
//!
//! Supplied by the host (window/UI layer) and replaced atomically as a whole.
//! A scene is only presented when every view listed here has a frame.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::frame::ViewId;
use crate::error::LayoutError;

/// Integer rectangle in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// One view: where to read from the frame and where to draw it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub view_id: ViewId,
    pub src: Rect,
    pub dst: Rect,
}

/// Ordered set of layout entries, unique by view id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LayoutEntry>", into = "Vec<LayoutEntry>")]
pub struct ViewLayout {
    entries: Vec<LayoutEntry>,
}

impl ViewLayout {
    /// Build from three parallel lists (view ids, source rects, destination rects)
    pub fn new(view_ids: Vec<ViewId>, src_rects: Vec<Rect>, dst_rects: Vec<Rect>) -> Result<Self, LayoutError> {
        if view_ids.len() != src_rects.len() || view_ids.len() != dst_rects.len() {
            return Err(LayoutError::LengthMismatch {
                views: view_ids.len(),
                src: src_rects.len(),
                dst: dst_rects.len(),
            });
        }
        let entries = view_ids
            .into_iter()
            .zip(src_rects)
            .zip(dst_rects)
            .map(|((view_id, src), dst)| LayoutEntry { view_id, src, dst })
            .collect();
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<LayoutEntry>) -> Result<Self, LayoutError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.view_id) {
                return Err(LayoutError::DuplicateView(entry.view_id));
            }
        }
        Ok(Self { entries })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn lookup(&self, view_id: ViewId) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.view_id == view_id)
    }

    pub fn contains(&self, view_id: ViewId) -> bool {
        self.lookup(view_id).is_some()
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn view_ids(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.entries.iter().map(|e| e.view_id)
    }

    /// Number of views expected in a complete composite
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<LayoutEntry>> for ViewLayout {
    type Error = LayoutError;

    fn try_from(entries: Vec<LayoutEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<ViewLayout> for Vec<LayoutEntry> {
    fn from(layout: ViewLayout) -> Self {
        layout.entries
    }
}
