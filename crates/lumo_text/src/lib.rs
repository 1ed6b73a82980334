//! Lumo text layout
//!
//! Lays out runs of pre-rasterized glyphs into wrapped lines. Shaping and
//! rasterization live outside this crate: a [`TypeFace`] hands back alpha
//! textures and metrics per character, and the drawing layer turns the
//! resulting [`LineGlyphs`] into textured quads.

pub mod face;
pub mod resolved;

pub use face::{GlyphData, TypeFace};
pub use resolved::{for_each_glyph, Glyph, InlineAttachment, LineGlyphs, ResolvedText, TextRun};
