//! Typeface access
//!
//! The external font service implements [`TypeFace`]; glyphs come back
//! pre-rasterized as single-channel alpha textures plus baseline metrics.

use lumo_core::{Point, Rect, Size};
use lumo_gpu::Texture;
use std::sync::Arc;

/// One rasterized glyph, baseline-aligned (the baseline is y = 0).
#[derive(Clone)]
pub struct GlyphData {
    /// Backing alpha texture; `None` for whitespace and other blank glyphs.
    pub texture: Option<Arc<dyn Texture>>,
    /// Texel rectangle within the texture.
    pub frame: Rect,
    /// Texture origin relative to the baseline.
    pub offset: Point,
    /// Distance to the next glyph.
    pub advance: Size,
    /// Distance from the baseline to the highest grid coordinate.
    pub ascender: f32,
    /// Distance from the baseline to the lowest grid coordinate (negative
    /// below the baseline).
    pub descender: f32,
}

/// A single face of a font at a fixed size, serving pre-rasterized glyphs.
pub trait TypeFace: Send + Sync {
    fn has_glyph(&self, c: char) -> bool;
    fn glyph_data(&self, c: char) -> Option<GlyphData>;
    /// Kerning between two glyphs of this face.
    fn kern_advance(&self, left: char, right: char) -> Point;
    fn ascender(&self) -> f32;
    fn descender(&self) -> f32;
}

/// Faces are compared by identity; two handles to the same face object kern
/// across run boundaries.
pub(crate) fn same_face(a: &Arc<dyn TypeFace>, b: &Arc<dyn TypeFace>) -> bool {
    Arc::ptr_eq(a, b)
}
