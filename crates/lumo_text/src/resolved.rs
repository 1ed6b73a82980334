//! Resolved text: glyph runs laid out into wrapped lines
//!
//! Wrapping packs glyphs greedily until the accumulated advance exceeds the
//! available width, then breaks at the last breakable character scanning
//! backward (whitespace or one of `-/?!}|`), force-breaking mid-run when no
//! break point exists. Whitespace is trimmed at wrap boundaries. Vertical
//! overflow truncates to the lines that fit and ends the last visible line
//! with an `...` run, trimming glyphs until the ellipsis fits.

use crate::face::{same_face, GlyphData, TypeFace};
use lumo_core::{Point, Rect, Size};
use lumo_gpu::Texture;
use std::collections::VecDeque;
use std::sync::Arc;

/// A non-glyph inline element (e.g. an image) flowing with the text.
#[derive(Clone)]
pub struct InlineAttachment {
    pub texture: Option<Arc<dyn Texture>>,
    /// Size in points.
    pub size: Size,
    /// Baseline offset in points.
    pub baseline: f32,
}

/// One run of resolved content.
#[derive(Clone)]
pub enum TextRun {
    Text {
        faces: Vec<Arc<dyn TypeFace>>,
        text: String,
    },
    Attachment {
        faces: Vec<Arc<dyn TypeFace>>,
        attachment: InlineAttachment,
    },
}

/// A positioned glyph. Attachments use scalar `'\0'`.
#[derive(Clone)]
pub struct Glyph {
    pub scalar: char,
    pub face: Arc<dyn TypeFace>,
    pub texture: Option<Arc<dyn Texture>>,
    pub frame: Rect,
    pub advance: Size,
    pub offset: Point,
    pub ascender: f32,
    pub descender: f32,
    /// Kern advance from the previous glyph.
    pub kerning: Point,
}

impl Glyph {
    fn blank(scalar: char, face: Arc<dyn TypeFace>) -> Self {
        Self {
            scalar,
            face,
            texture: None,
            frame: Rect::ZERO,
            advance: Size::ZERO,
            offset: Point::ZERO,
            ascender: 0.0,
            descender: 0.0,
            kerning: Point::ZERO,
        }
    }

    fn fill(&mut self, data: GlyphData) {
        self.texture = data.texture;
        self.frame = data.frame;
        self.offset = data.offset;
        self.advance = data.advance;
        self.ascender = data.ascender;
        self.descender = data.descender;
    }
}

/// One laid-out line.
#[derive(Clone)]
pub struct LineGlyphs {
    pub glyphs: Vec<Glyph>,
    pub ascender: f32,
    pub descender: f32,
    pub width: f32,
}

impl LineGlyphs {
    pub fn height(&self) -> f32 {
        self.ascender - self.descender
    }

    fn from_glyphs(mut glyphs: Vec<Glyph>) -> Self {
        if let Some(first) = glyphs.first_mut() {
            first.kerning = Point::ZERO;
        }
        let ascender = glyphs.iter().fold(0.0f32, |a, g| a.max(g.ascender));
        let descender = glyphs.iter().fold(0.0f32, |d, g| d.min(g.descender));
        let width = glyphs_width(&glyphs);
        Self {
            glyphs,
            ascender,
            descender,
            width,
        }
    }
}

/// Advance width of a glyph range, ignoring the leading kern.
fn glyphs_width(glyphs: &[Glyph]) -> f32 {
    let total: f32 = glyphs.iter().map(|g| g.advance.width + g.kerning.x).sum();
    total - glyphs.first().map(|g| g.kerning.x).unwrap_or(0.0)
}

fn is_breakable(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '/' | '?' | '!' | '}' | '|')
}

/// Index of the last glyph the line may break after, honoring the numeric
/// exceptions: no break at `-` before a digit, none at `/` between digits.
fn breakable_index(glyphs: &[Glyph]) -> Option<usize> {
    for index in (0..glyphs.len()).rev() {
        let scalar = glyphs[index].scalar;
        if !is_breakable(scalar) {
            continue;
        }
        let before_digit = glyphs
            .get(index + 1)
            .is_some_and(|g| g.scalar.is_ascii_digit());
        let after_digit = index > 0 && glyphs[index - 1].scalar.is_ascii_digit();
        if scalar == '-' && before_digit {
            continue;
        }
        if scalar == '/' && before_digit && after_digit {
            continue;
        }
        return Some(index);
    }
    None
}

fn exceeds(value: f32, limit: u32) -> bool {
    value.ceil() as u64 > limit as u64
}

/// Splits an over-long line, preferring the last breakable character and
/// trimming whitespace at the boundary.
fn split_line(glyphs: Vec<Glyph>, max_width: u32) -> (Vec<Glyph>, Vec<Glyph>) {
    let mut first = glyphs;
    let mut second: Vec<Glyph> = Vec::new();

    while first.len() > 1 && exceeds(glyphs_width(&first), max_width) {
        match breakable_index(&first) {
            Some(index) if index + 1 != first.len() => {
                let tail: Vec<Glyph> = first.drain(index + 1..).collect();
                second.splice(0..0, tail);
            }
            _ => {
                let glyph = first.pop().unwrap();
                second.insert(0, glyph);
            }
        }
    }

    while first.len() > 1 && first.last().is_some_and(|g| g.scalar.is_whitespace()) {
        first.pop();
    }
    while second.first().is_some_and(|g| g.scalar.is_whitespace()) {
        second.remove(0);
    }

    (first, second)
}

/// Glyphs produced from one contiguous character sequence.
struct TextGlyphs {
    glyphs: Vec<Glyph>,
    width: f32,
    ascender: f32,
    descender: f32,
    last_face: Option<Arc<dyn TypeFace>>,
    last_char: char,
}

impl TextGlyphs {
    fn from_chars(
        text: impl Iterator<Item = char>,
        faces: &[Arc<dyn TypeFace>],
        draw_missing_glyphs: bool,
        prev_face: Option<Arc<dyn TypeFace>>,
        prev_char: char,
    ) -> Self {
        debug_assert!(!faces.is_empty());
        let mut glyphs: Vec<Glyph> = Vec::new();
        let mut ascender = 0.0f32;
        let mut descender = 0.0f32;
        let mut width = 0.0f32;
        let mut face1 = prev_face;
        let mut char1 = prev_char;

        for char2 in text {
            let face2 = faces
                .iter()
                .find(|f| f.has_glyph(char2))
                .cloned()
                .unwrap_or_else(|| faces[0].clone());
            let make_glyph = draw_missing_glyphs || face2.has_glyph(char2);

            let mut glyph = Glyph::blank(char2, face2.clone());
            let data = if make_glyph { face2.glyph_data(char2) } else { None };
            if let Some(data) = data {
                glyph.fill(data);
                if let Some(f1) = &face1 {
                    if same_face(f1, &face2) {
                        glyph.kerning = f1.kern_advance(char1, char2);
                    }
                }
            } else {
                glyph.ascender = face2.ascender();
                glyph.descender = face2.descender();
            }
            ascender = ascender.max(glyph.ascender);
            descender = descender.min(glyph.descender);
            width += glyph.advance.width + glyph.kerning.x;
            glyphs.push(glyph);
            char1 = char2;
            face1 = Some(face2);
        }

        if glyphs.is_empty() {
            ascender = faces[0].ascender();
            descender = faces[0].descender();
        }
        Self {
            glyphs,
            width,
            ascender,
            descender,
            last_face: face1,
            last_char: char1,
        }
    }
}

/// Glyph runs resolved against concrete typefaces, ready to lay out.
#[derive(Clone, Default)]
pub struct ResolvedText {
    pub runs: Vec<TextRun>,
    /// Points-to-pixels scale of the target surface.
    pub scale_factor: f32,
    /// Draw placeholder boxes for characters with no glyph.
    pub draw_missing_glyphs: bool,
}

impl ResolvedText {
    pub fn new(runs: Vec<TextRun>, scale_factor: f32) -> Self {
        Self {
            runs,
            scale_factor: scale_factor.max(1.0),
            draw_missing_glyphs: false,
        }
    }

    fn pixel_limit(&self, points: Option<f32>) -> u32 {
        match points {
            Some(v) => {
                let px = (v.max(0.0) * self.scale_factor).round();
                if px >= u32::MAX as f32 {
                    u32::MAX
                } else {
                    px as u32
                }
            }
            None => u32::MAX,
        }
    }

    /// Laid-out size in points, constrained to the given limits.
    pub fn measure(&self, max_width: Option<f32>, max_height: Option<f32>) -> Size {
        let lines = self.make_glyphs(self.pixel_limit(max_width), self.pixel_limit(max_height));
        let pixels = lines.iter().fold(Size::ZERO, |acc, line| {
            Size::new(acc.width.max(line.width), acc.height + line.height())
        });
        pixels / self.scale_factor
    }

    pub fn measure_in(&self, size: Size) -> Size {
        self.measure(Some(size.width), Some(size.height))
    }

    /// Baseline of the first line, in points from the top.
    pub fn first_baseline(&self, size: Size) -> f32 {
        let lines = self.make_glyphs(
            self.pixel_limit(Some(size.width)),
            self.pixel_limit(Some(size.height)),
        );
        lines
            .first()
            .map(|line| line.ascender / self.scale_factor)
            .unwrap_or(0.0)
    }

    /// Lays out, wraps and truncates the runs against pixel limits.
    pub fn make_glyphs(&self, max_width: u32, max_height: u32) -> Vec<LineGlyphs> {
        self.wrap(self.unwrapped_lines(), max_width, max_height)
    }

    fn unwrapped_lines(&self) -> Vec<LineGlyphs> {
        let mut lines: Vec<LineGlyphs> = Vec::new();
        let mut glyphs: Vec<Glyph> = Vec::new();
        let mut ascender = 0.0f32;
        let mut descender = 0.0f32;
        let mut width = 0.0f32;
        let mut char1 = '\0';
        let mut face1: Option<Arc<dyn TypeFace>> = None;

        for run in &self.runs {
            match run {
                TextRun::Text { faces, text } => {
                    if faces.is_empty() || text.is_empty() {
                        continue;
                    }
                    let mut components = text.split('\n').peekable();
                    while let Some(component) = components.next() {
                        let component = component.strip_suffix('\r').unwrap_or(component);
                        let run_glyphs = TextGlyphs::from_chars(
                            component.chars(),
                            faces,
                            self.draw_missing_glyphs,
                            face1.clone(),
                            char1,
                        );
                        face1 = run_glyphs.last_face.clone();
                        char1 = run_glyphs.last_char;

                        glyphs.extend(run_glyphs.glyphs);
                        ascender = ascender.max(run_glyphs.ascender);
                        descender = descender.min(run_glyphs.descender);
                        width += run_glyphs.width;

                        // The last component may combine with the next run;
                        // don't complete the line.
                        if components.peek().is_some() {
                            lines.push(LineGlyphs {
                                glyphs: std::mem::take(&mut glyphs),
                                ascender,
                                descender,
                                width,
                            });
                            width = 0.0;
                            ascender = 0.0;
                            descender = 0.0;
                        }
                    }
                }
                TextRun::Attachment { faces, attachment } => {
                    let Some(face) = faces
                        .iter()
                        .find(|f| f.has_glyph('.'))
                        .or(faces.first())
                        .cloned()
                    else {
                        tracing::error!("attachment run with no typeface; skipped");
                        continue;
                    };
                    let baseline = attachment.baseline * self.scale_factor;
                    let height = attachment.size.height * self.scale_factor;
                    let w = attachment.size.width * self.scale_factor;

                    let mut glyph = Glyph::blank('\0', face);
                    glyph.texture = attachment.texture.clone();
                    glyph.offset = Point::new(0.0, baseline);
                    if let Some(texture) = &attachment.texture {
                        glyph.frame = Rect::new(
                            0.0,
                            0.0,
                            texture.width() as f32,
                            texture.height() as f32,
                        );
                    }
                    glyph.ascender = baseline;
                    glyph.descender = (baseline - height).min(0.0);
                    glyph.advance = Size::new(w, height);

                    ascender = ascender.max(glyph.ascender);
                    width += glyph.advance.width;
                    glyphs.push(glyph);

                    face1 = None;
                    char1 = '\0';
                }
            }
        }

        if !glyphs.is_empty() {
            lines.push(LineGlyphs {
                glyphs,
                ascender,
                descender,
                width,
            });
        }
        lines
    }

    fn wrap(&self, lines: Vec<LineGlyphs>, max_width: u32, max_height: u32) -> Vec<LineGlyphs> {
        let mut result: Vec<LineGlyphs> = Vec::new();
        let mut lines: VecDeque<LineGlyphs> = lines.into();
        let mut offset_y = 0.0f32;

        while let Some(mut line) = lines.pop_front() {
            if !result.is_empty() && exceeds(offset_y + line.height(), max_height) {
                break;
            }

            if exceeds(line.width, max_width) {
                // Wrap only when there is room left for the wrapped rest.
                let next_height = lines.front().map_or(line.height(), |l| l.height());
                if !exceeds(offset_y + line.height() + next_height, max_height) {
                    let (first, second) = split_line(line.glyphs, max_width);
                    if !second.is_empty() {
                        lines.push_front(LineGlyphs::from_glyphs(second));
                    }
                    line = LineGlyphs::from_glyphs(first);
                }
            }

            // Out of vertical room, or the wrap failed: truncate with an
            // ellipsis on this, the last visible line.
            let next_height = lines.front().map_or(0.0, |l| l.height());
            if exceeds(offset_y + line.height() + next_height, max_height)
                || exceeds(line.width, max_width)
            {
                line = self.ellipsized(line, max_width);
            }

            offset_y += line.height();
            result.push(line);
        }
        result
    }

    fn ellipsized(&self, line: LineGlyphs, max_width: u32) -> LineGlyphs {
        let mut glyphs = line.glyphs;
        let Some(mut face) = glyphs.last().map(|g| g.face.clone()) else {
            return LineGlyphs::from_glyphs(glyphs);
        };

        loop {
            let prev_face = glyphs.last().map(|g| g.face.clone());
            let prev_char = glyphs.last().map(|g| g.scalar).unwrap_or('\0');
            let ellipsis = TextGlyphs::from_chars(
                "...".chars(),
                &[face.clone()],
                false,
                prev_face,
                prev_char,
            );

            let width = glyphs_width(&glyphs);
            if !exceeds(width + ellipsis.width, max_width) {
                glyphs.extend(ellipsis.glyphs);
                return LineGlyphs::from_glyphs(glyphs);
            }
            // Build the next attempt's ellipsis with the face of the glyph
            // being removed.
            match glyphs.pop() {
                Some(last) => face = last.face,
                None => return LineGlyphs::from_glyphs(glyphs),
            }
        }
    }
}

/// Walks every glyph with its baseline origin in pixel space.
pub fn for_each_glyph(lines: &[LineGlyphs], mut callback: impl FnMut(&Glyph, Point)) {
    let mut offset = Point::ZERO;
    for line in lines {
        offset.x = 0.0;
        for glyph in &line.glyphs {
            let baseline = Point::new(glyph.offset.x + offset.x, line.ascender + offset.y);
            callback(glyph, baseline);

            // No kerning for line leads.
            let kerning = if offset.x > 0.0 { glyph.kerning } else { Point::ZERO };
            offset.x += glyph.advance.width;
            offset = offset + kerning;
        }
        offset.y += line.height();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFace {
        advance: f32,
        ascender: f32,
        descender: f32,
    }

    impl FixedFace {
        fn arc() -> Arc<dyn TypeFace> {
            Arc::new(Self {
                advance: 10.0,
                ascender: 10.0,
                descender: -2.0,
            })
        }
    }

    impl TypeFace for FixedFace {
        fn has_glyph(&self, _: char) -> bool {
            true
        }

        fn glyph_data(&self, c: char) -> Option<GlyphData> {
            Some(GlyphData {
                texture: None,
                frame: Rect::new(0.0, 0.0, self.advance, self.ascender),
                offset: Point::new(0.0, self.ascender),
                advance: Size::new(self.advance, 0.0),
                ascender: self.ascender,
                descender: if c.is_whitespace() { 0.0 } else { self.descender },
            })
        }

        fn kern_advance(&self, _: char, _: char) -> Point {
            Point::ZERO
        }

        fn ascender(&self) -> f32 {
            self.ascender
        }

        fn descender(&self) -> f32 {
            self.descender
        }
    }

    fn resolved(text: &str) -> ResolvedText {
        ResolvedText::new(
            vec![TextRun::Text {
                faces: vec![FixedFace::arc()],
                text: text.into(),
            }],
            1.0,
        )
    }

    fn line_string(line: &LineGlyphs) -> String {
        line.glyphs.iter().map(|g| g.scalar).collect()
    }

    #[test]
    fn no_limits_yields_single_line() {
        let lines = resolved("hello world").make_glyphs(u32::MAX, u32::MAX);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].width, 110.0);
    }

    #[test]
    fn wraps_at_whitespace_not_mid_word() {
        // "hello world" at 10px per glyph; 80px fits 8 glyphs, so the break
        // must move back to the space.
        let lines = resolved("hello world").make_glyphs(80, u32::MAX);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_string(&lines[0]), "hello");
        assert_eq!(line_string(&lines[1]), "world");
    }

    #[test]
    fn wrapped_line_has_no_trailing_whitespace() {
        let lines = resolved("aaa bbb").make_glyphs(50, u32::MAX);
        assert!(lines.len() >= 2);
        assert!(!lines[0]
            .glyphs
            .last()
            .unwrap()
            .scalar
            .is_whitespace());
        assert!(!lines[1]
            .glyphs
            .first()
            .unwrap()
            .scalar
            .is_whitespace());
    }

    #[test]
    fn force_breaks_unbreakable_run() {
        let lines = resolved("abcdefgh").make_glyphs(40, u32::MAX);
        assert_eq!(line_string(&lines[0]), "abcd");
    }

    #[test]
    fn ellipsis_on_vertical_overflow() {
        // Three natural lines, room for one line of 12px height.
        let lines = resolved("aaaa\nbbbb\ncccc").make_glyphs(u32::MAX, 12);
        assert_eq!(lines.len(), 1);
        let s = line_string(&lines[0]);
        assert!(s.ends_with("..."), "line {s:?} must end with ellipsis");
    }

    #[test]
    fn ellipsis_fits_within_width() {
        let max_width = 60;
        let lines = resolved("abcdefghij\nmore").make_glyphs(max_width, 12);
        assert_eq!(lines.len(), 1);
        let s = line_string(&lines[0]);
        assert!(s.ends_with("..."));
        assert!(lines[0].width.ceil() as u32 <= max_width);
    }

    #[test]
    fn measure_accumulates_line_heights() {
        let text = resolved("one\ntwo");
        let size = text.measure(None, None);
        assert_eq!(size.width, 30.0);
        assert_eq!(size.height, 24.0);
    }

    #[test]
    fn no_break_inside_numeric_dash() {
        // "x 1-2" → '-' before a digit is not breakable, so the break falls
        // at the space.
        let lines = resolved("xx 1-2").make_glyphs(45, u32::MAX);
        assert_eq!(line_string(&lines[0]), "xx");
        assert_eq!(line_string(&lines[1]), "1-2");
    }
}
