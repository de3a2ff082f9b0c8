//! Collaborator traits implemented by the host application.
//!
//! The core never talks to a GPU or windowing system directly: display buffers
//! come from a [`Renderer`] and pixel transforms from a [`ColorConverter`].
//! Both run synchronously on the render thread.

use super::frame::{Frame, FrameFormat};
use crate::error::{ConvertError, RenderError};

/// Display backend: owns display buffer resources and presents scenes.
pub trait Renderer: Send {
    /// Allocate a display frame able to hold `format`.
    ///
    /// `None` means the backend could not allocate; the view is skipped this
    /// tick and retried next time a source frame for it arrives.
    fn allocate(&mut self, format: &FrameFormat) -> Option<Frame>;

    /// Release backend resources of a display frame.
    fn deallocate(&mut self, frame: Frame);

    /// Acquire a writable mapping of `frame` before its planes are written.
    fn get_frame(&mut self, frame: &mut Frame) -> Result<(), RenderError>;

    /// Release the mapping taken by a successful [`Renderer::get_frame`].
    fn release_frame(&mut self, frame: &mut Frame);

    /// Present a composited scene. Frames carry their src/dst rectangles.
    fn render_scene(&mut self, scene: &[&Frame]);
}

/// Pixel transform between two formats (called only when formats differ).
pub trait ColorConverter: Send {
    fn convert(&self, src: &Frame, dst: &mut Frame) -> Result<(), ConvertError>;
}

impl<T: Renderer + ?Sized> Renderer for Box<T> {
    fn allocate(&mut self, format: &FrameFormat) -> Option<Frame> {
        (**self).allocate(format)
    }

    fn deallocate(&mut self, frame: Frame) {
        (**self).deallocate(frame)
    }

    fn get_frame(&mut self, frame: &mut Frame) -> Result<(), RenderError> {
        (**self).get_frame(frame)
    }

    fn release_frame(&mut self, frame: &mut Frame) {
        (**self).release_frame(frame)
    }

    fn render_scene(&mut self, scene: &[&Frame]) {
        (**self).render_scene(scene)
    }
}

impl<T: ColorConverter + ?Sized> ColorConverter for Box<T> {
    fn convert(&self, src: &Frame, dst: &mut Frame) -> Result<(), ConvertError> {
        (**self).convert(src, dst)
    }
}
