//! Path filling and stroking via stencil winding accumulation
//!
//! Filling is two-pass: pass 1 flattens the path into triangle fans (one
//! per subpath, pivoted on the subpath centroid) and renders position-only
//! vertices into the stencil buffer with two-sided increment/decrement
//! wrap, so each pixel ends up with its winding count; pass 2 draws the
//! shading geometry through a `test_*` stencil mode. Stroking accumulates
//! coverage with increment-clamp instead, generating quads per segment with
//! caps, joins and dash patterns on the CPU.

use crate::context::{FillStyle, GraphicsContext, LineCap, LineJoin, RenderPass, StrokeStyle};
use crate::pipeline::{ShaderKind, StencilMode};
use crate::shading::Shading;
use lumo_core::{
    AffineTransform, CubicBezier, Path, PathElement, Point, QuadraticBezier, Vector2,
};
use lumo_gpu::{BlendState, CullMode, IndexType, RenderCommandEncoder, Winding};

impl GraphicsContext {
    /// Fills `path` with `shading` using the non-zero winding rule, or
    /// even-odd when the style requests it.
    pub fn fill(&mut self, path: &Path, shading: &Shading, style: FillStyle) {
        let Some(mut pass) = self.begin_render_pass(true) else {
            return;
        };
        if self.encode_stencil_path_fill_command(&mut pass, path) {
            let stencil = if style.is_eo_filled {
                StencilMode::TestEven
            } else {
                StencilMode::TestNonZero
            };
            self.encode_shading_box_command(&mut pass, shading, stencil, BlendState::OPAQUE);
            pass.end();
            self.draw_source();
        } else {
            pass.end();
        }
    }

    /// Strokes `path` with `shading`.
    pub fn stroke(&mut self, path: &Path, shading: &Shading, style: &StrokeStyle) {
        let Some(mut pass) = self.begin_render_pass(true) else {
            return;
        };
        if self.encode_stencil_path_stroke_command(&mut pass, path, style) {
            self.encode_shading_box_command(
                &mut pass,
                shading,
                StencilMode::TestNonZero,
                BlendState::OPAQUE,
            );
            pass.end();
            self.draw_source();
        } else {
            pass.end();
        }
    }

    pub fn stroke_with_width(&mut self, path: &Path, shading: &Shading, line_width: f32) {
        self.stroke(path, shading, &StrokeStyle::with_line_width(line_width));
    }

    /// Pass 1 of the fill protocol: winding counts into the stencil
    /// buffer. Returns false when the path produced no usable geometry.
    pub(crate) fn encode_stencil_path_fill_command(
        &self,
        render_pass: &mut RenderPass,
        path: &Path,
    ) -> bool {
        if path.is_empty() {
            return false;
        }

        let polygons = flatten_polygons(path);
        let transform = self.transform.concatenating(&self.view_transform);

        let mut vertices: Vec<[f32; 2]> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        for polygon in &polygons {
            if polygon.len() < 2 {
                continue;
            }
            let base_index = vertices.len() as u32;
            let mut center = Vector2::ZERO;
            for point in polygon {
                let v = Vector2::from(*point).applying(&transform);
                vertices.push(v.to_array());
                center += v;
            }
            center = center / polygon.len() as f32;
            let pivot_index = vertices.len() as u32;
            vertices.push(center.to_array());

            for i in base_index + 1..pivot_index {
                indices.extend_from_slice(&[i - 1, i, pivot_index]);
            }
            indices.extend_from_slice(&[pivot_index - 1, base_index, pivot_index]);
        }
        if vertices.len() < 3 || indices.len() < 3 {
            return false;
        }

        let Some(render_state) = self.pipeline.render_state(
            ShaderKind::Stencil,
            render_pass.color_format,
            render_pass.depth_format,
            BlendState::WRITE_DISABLED,
        ) else {
            tracing::error!("GraphicsContext: render_state failed");
            return false;
        };
        let Some(depth_state) = self.pipeline.depth_stencil_state(StencilMode::MakeFill) else {
            tracing::error!("GraphicsContext: depth_stencil_state failed");
            return false;
        };
        let Some(vertex_buffer) = self.pipeline.make_buffer(&vertices) else {
            tracing::error!("GraphicsContext: make_buffer failed");
            return false;
        };
        let Some(index_buffer) = self.pipeline.make_buffer(&indices) else {
            tracing::error!("GraphicsContext: make_buffer failed");
            return false;
        };

        let encoder = &mut render_pass.encoder;
        encoder.set_render_pipeline_state(&render_state);
        encoder.set_depth_stencil_state(Some(&depth_state));
        encoder.set_cull_mode(CullMode::None);
        encoder.set_front_facing(Winding::Clockwise);
        encoder.set_stencil_reference_value(0);
        encoder.set_vertex_buffer(&vertex_buffer, 0, 0);
        encoder.draw_indexed(
            indices.len() as u32,
            IndexType::U32,
            &index_buffer,
            0,
            1,
            0,
            0,
        );
        true
    }

    /// Pass 1 for stroking: coverage accumulation with increment-clamp.
    pub(crate) fn encode_stencil_path_stroke_command(
        &self,
        render_pass: &mut RenderPass,
        path: &Path,
        style: &StrokeStyle,
    ) -> bool {
        if path.is_empty() || style.line_width < f32::EPSILON {
            return false;
        }

        let transform = self.transform.concatenating(&self.view_transform);
        let min_visible_dashes = 1.0 / self.content_scale_factor;
        let mut stroker = Stroker::new(style, transform, min_visible_dashes);
        stroker.walk(path);
        let vertices = stroker.vertices;
        if vertices.len() < 3 {
            return false;
        }

        let Some(render_state) = self.pipeline.render_state(
            ShaderKind::Stencil,
            render_pass.color_format,
            render_pass.depth_format,
            BlendState::WRITE_DISABLED,
        ) else {
            tracing::error!("GraphicsContext: render_state failed");
            return false;
        };
        let Some(depth_state) = self.pipeline.depth_stencil_state(StencilMode::MakeStroke) else {
            tracing::error!("GraphicsContext: depth_stencil_state failed");
            return false;
        };
        let Some(vertex_buffer) = self.pipeline.make_buffer(&vertices) else {
            tracing::error!("GraphicsContext: make_buffer failed");
            return false;
        };

        let encoder = &mut render_pass.encoder;
        encoder.set_render_pipeline_state(&render_state);
        encoder.set_depth_stencil_state(Some(&depth_state));
        encoder.set_cull_mode(CullMode::Back);
        encoder.set_front_facing(Winding::Clockwise);
        encoder.set_stencil_reference_value(0);
        encoder.set_vertex_buffer(&vertex_buffer, 0, 0);
        encoder.draw(0, vertices.len() as u32, 1, 0);
        true
    }
}

/// Flattens curves into polylines, one polygon per subpath. Curve
/// subdivision steps are sized from the approximate arc length.
pub(crate) fn flatten_polygons(path: &Path) -> Vec<Vec<Point>> {
    let mut polygons: Vec<Vec<Point>> = Vec::new();
    let mut polygon: Vec<Point> = Vec::new();
    let mut initial_point: Option<Point> = None;
    let mut current_point: Option<Point> = None;

    let mut flatten = |polygon: &mut Vec<Point>,
                       p0: Point,
                       length: f32,
                       end: Point,
                       interpolate: &dyn Fn(f32) -> Point| {
        if polygon.is_empty() {
            polygon.push(p0);
        }
        if length > f32::EPSILON {
            let step = 1.0 / length;
            let mut t = step;
            while t < 1.0 {
                polygon.push(interpolate(t));
                t += step;
            }
            polygon.push(end);
        }
    };

    for element in path.elements() {
        match *element {
            PathElement::MoveTo(to) => {
                polygons.push(std::mem::take(&mut polygon));
                initial_point = Some(to);
                current_point = Some(to);
            }
            PathElement::LineTo(p1) => {
                if let Some(p0) = current_point {
                    if polygon.is_empty() {
                        polygon.push(p0);
                    }
                    polygon.push(p1);
                }
                current_point = Some(p1);
            }
            PathElement::QuadCurveTo { control, end } => {
                if let Some(p0) = current_point {
                    let curve = QuadraticBezier::new(p0, control, end);
                    flatten(&mut polygon, p0, curve.approximate_length(), end, &|t| {
                        curve.interpolate(t)
                    });
                }
                current_point = Some(end);
            }
            PathElement::CurveTo {
                control1,
                control2,
                end,
            } => {
                if let Some(p0) = current_point {
                    let curve = CubicBezier::new(p0, control1, control2, end);
                    flatten(&mut polygon, p0, curve.approximate_length(), end, &|t| {
                        curve.interpolate(t)
                    });
                }
                current_point = Some(end);
            }
            PathElement::Close => {
                polygons.push(std::mem::take(&mut polygon));
                current_point = initial_point;
            }
        }
    }
    polygons.push(polygon);
    polygons.retain(|p| !p.is_empty());
    polygons
}

/// Generates stroke geometry: line-segment quads, caps, joins and dashes.
struct Stroker<'a> {
    style: &'a StrokeStyle,
    transform: AffineTransform,
    vertices: Vec<[f32; 2]>,
    dash: Vec<f32>,
    dash_available: bool,
    dash_index: usize,
    dash_remain: f32,
    initial_dash_index: usize,
    initial_dash_remain: f32,
}

impl<'a> Stroker<'a> {
    fn new(style: &'a StrokeStyle, transform: AffineTransform, min_visible_dashes: f32) -> Self {
        let dash: Vec<f32> = style.dash.iter().map(|d| d.abs()).collect();
        let pattern_length: f32 = dash.iter().sum();
        let dash_available =
            !dash.is_empty() && pattern_length / dash.len() as f32 >= min_visible_dashes;

        let mut stroker = Self {
            style,
            transform,
            vertices: Vec::new(),
            dash,
            dash_available,
            dash_index: 0,
            dash_remain: 0.0,
            initial_dash_index: 0,
            initial_dash_remain: 0.0,
        };

        // Resolve the dash phase into a starting index and remainder.
        if !stroker.dash.is_empty() {
            if style.dash_phase > 0.0 {
                let mut phase = style.dash_phase;
                stroker.dash_remain = stroker.dash_length(stroker.dash_index);
                while phase > stroker.dash_remain {
                    stroker.dash_index += 1;
                    stroker.dash_remain += stroker.dash_length(stroker.dash_index);
                }
                stroker.dash_remain -= phase;
            } else {
                let mut phase = style.dash_phase;
                while phase < 0.0 {
                    if stroker.dash_index == 0 {
                        stroker.dash_index += stroker.dash.len() * 2;
                    }
                    stroker.dash_index -= 1;
                    phase += stroker.dash_length(stroker.dash_index);
                }
                stroker.dash_remain = stroker.dash_length(stroker.dash_index) - phase;
            }
            while stroker.dash_remain < f32::EPSILON {
                stroker.dash_index += 1;
                stroker.dash_remain += stroker.dash_length(stroker.dash_index);
            }
        }
        stroker.initial_dash_index = stroker.dash_index;
        stroker.initial_dash_remain = stroker.dash_remain;
        stroker
    }

    fn dash_length(&self, index: usize) -> f32 {
        self.dash[index % self.dash.len()]
    }

    fn reset_dash_phase(&mut self) {
        self.dash_index = self.initial_dash_index;
        self.dash_remain = self.initial_dash_remain;
    }

    /// Even dash indices draw, odd ones are gaps.
    fn in_dash(&self) -> bool {
        self.dash_index % 2 == 0
    }

    fn push_transformed(&mut self, points: &[Vector2]) {
        for p in points {
            self.vertices.push(p.applying(&self.transform).to_array());
        }
    }

    fn draw_line_segment(&mut self, start: Point, end: Point, dir0: Point, dir1: Point) {
        let w = self.style.line_width;
        let t0 = AffineTransform::new(dir0.x, dir0.y, -w * dir0.y, w * dir0.x, start.x, start.y);
        let t1 = AffineTransform::new(dir1.x, dir1.y, -w * dir1.y, w * dir1.x, end.x, end.y);

        let corner = |t: &AffineTransform, y: f32| Vector2::new(0.0, y).applying(t);
        let b0 = corner(&t0, -0.5);
        let b1 = corner(&t1, -0.5);
        let b2 = corner(&t0, 0.5);
        let b3 = corner(&t1, 0.5);
        self.push_transformed(&[b2, b0, b3, b3, b0, b1]);
    }

    fn add_stroke_cap(&mut self, p: Point, d: Point) {
        let w = self.style.line_width;
        let half = w * 0.5;
        match self.style.line_cap {
            LineCap::Round => {
                let trans = AffineTransform::new(d.x, d.y, -d.y, d.x, p.x, p.y)
                    .concatenating(&self.transform);
                let step = std::f32::consts::PI / w.max(1.0);
                let center = Vector2::from(p).applying(&self.transform);

                let mut pt0 = Vector2::new(0.0, -half).applying(&trans);
                let mut progress = 0.0f32;
                while progress < std::f32::consts::PI {
                    let rotated = AffineTransform::rotation(progress).concatenating(&trans);
                    let pt1 = Vector2::new(0.0, -half).applying(&rotated);
                    self.vertices
                        .extend_from_slice(&[center.to_array(), pt0.to_array(), pt1.to_array()]);
                    pt0 = pt1;
                    progress += step;
                }
                let pt1 = Vector2::new(0.0, half).applying(&trans);
                self.vertices
                    .extend_from_slice(&[center.to_array(), pt0.to_array(), pt1.to_array()]);
            }
            LineCap::Square => {
                let trans = AffineTransform::new(w * d.x, w * d.y, -w * d.y, w * d.x, p.x, p.y)
                    .concatenating(&self.transform);
                let pt = [
                    Vector2::new(0.0, 0.5),
                    Vector2::new(0.0, -0.5),
                    Vector2::new(0.5, 0.5),
                    Vector2::new(0.5, -0.5),
                ]
                .map(|v| v.applying(&trans).to_array());
                self.vertices
                    .extend_from_slice(&[pt[0], pt[1], pt[2], pt[2], pt[1], pt[3]]);
            }
            LineCap::Butt => {}
        }
    }

    fn add_stroke_line(&mut self, p0: Point, p1: Point, d0: Point, d1: Point) {
        let delta = p1 - p0;
        let length = delta.magnitude();
        if length < f32::EPSILON {
            return;
        }
        if !self.dash_available {
            self.draw_line_segment(p0, p1, d0, d1);
            return;
        }

        let mut drawn = 0.0f32;
        let mut start = p0;
        let mut dir0 = d0;
        let mut draw_line_cap = false;
        while drawn < length {
            while self.dash_remain < f32::EPSILON {
                self.dash_index += 1;
                self.dash_remain += self.dash_length(self.dash_index);
                draw_line_cap = true;
            }

            let remains = length - drawn;
            let len = remains.min(self.dash_remain);

            if len > f32::EPSILON {
                let t = (drawn + len) / length;
                let end = Point::lerp(p0, p1, t);
                let dir1 = Point::lerp(d0, d1, t);

                if self.in_dash() {
                    if draw_line_cap {
                        self.add_stroke_cap(start, -dir1);
                        draw_line_cap = false;
                    }
                    self.draw_line_segment(start, end, dir0, dir1);
                    if len == self.dash_remain {
                        self.add_stroke_cap(end, dir1);
                    }
                }
                start = end;
                dir0 = dir1;
            }
            drawn += len;
            self.dash_remain -= len;
        }
    }

    fn add_stroke_join(&mut self, p: Point, dir0: Point, dir1: Point) {
        if 1.0 - Point::dot(dir0, dir1) < f32::EPSILON {
            return;
        }
        let w = self.style.line_width;
        let half = w * 0.5;

        let mut join = self.style.line_join;
        if join == LineJoin::Miter {
            let dot = Point::dot(-dir0, dir1);
            let angle = dot.clamp(-1.0, 1.0).acos();
            let s = (angle * 0.5).sin();
            if s > f32::EPSILON {
                let miter_length = w / s;
                if miter_length > self.style.miter_limit * w {
                    join = LineJoin::Bevel;
                }
            } else {
                join = LineJoin::Bevel;
            }
        }

        let angle = |d: Point| -> f32 {
            let a = d.x.clamp(-1.0, 1.0).acos();
            if d.y < 0.0 {
                std::f32::consts::TAU - a
            } else {
                a
            }
        };
        let mut r1 = angle(dir0);
        let mut r2 = angle(dir1);
        if (r1 - r2).abs() > std::f32::consts::PI {
            if r1 > r2 {
                r2 += std::f32::consts::TAU;
            } else {
                r1 += std::f32::consts::TAU;
            }
        }

        let t0 = AffineTransform::new(dir0.x, dir0.y, -w * dir0.y, w * dir0.x, p.x, p.y);
        let t1 = AffineTransform::new(dir1.x, dir1.y, -w * dir1.y, w * dir1.x, p.x, p.y);

        match join {
            LineJoin::Bevel => {
                if r1 > r2 {
                    let points = [
                        Vector2::from(p),
                        Vector2::new(0.0, 0.5).applying(&t1),
                        Vector2::new(0.0, 0.5).applying(&t0),
                    ];
                    self.push_transformed(&points);
                } else {
                    let points = [
                        Vector2::from(p),
                        Vector2::new(0.0, -0.5).applying(&t0),
                        Vector2::new(0.0, -0.5).applying(&t1),
                    ];
                    self.push_transformed(&points);
                }
            }
            LineJoin::Round => {
                let step = 1.0 / w.max(1.0);
                let p0 = Vector2::from(p);
                let offset = if r1 > r2 { half } else { -half };
                let mut progress = step;
                let mut p1 = Vector2::new(0.0, offset).rotated(r1);
                while progress < 1.0 {
                    let r = r1 + (r2 - r1) * progress;
                    let p2 = Vector2::new(0.0, offset).rotated(r);
                    if r1 > r2 {
                        self.push_transformed(&[p0, p2 + p0, p1 + p0]);
                    } else {
                        self.push_transformed(&[p0, p1 + p0, p2 + p0]);
                    }
                    progress += step;
                    p1 = p2;
                }
                let p2 = Vector2::new(0.0, offset).rotated(r2);
                if r1 > r2 {
                    self.push_transformed(&[p0, p2 + p0, p1 + p0]);
                } else {
                    self.push_transformed(&[p0, p1 + p0, p2 + p0]);
                }
            }
            LineJoin::Miter => {
                let v0 = Vector2::from(dir0);
                let v1 = Vector2::from(dir1);
                let offset = if r1 > r2 { 0.5 } else { -0.5 };
                let e0 = Vector2::new(0.0, offset).applying(&t0);
                let e1 = Vector2::new(0.0, offset).applying(&t1);

                let s = Vector2::cross(v0, v1);
                if s.abs() < f32::EPSILON {
                    return;
                }
                let t = Vector2::cross(e1 - e0, v1) / s;
                let apex = e0 + v0 * t;

                let p0 = Vector2::from(p);
                if r1 > r2 {
                    self.push_transformed(&[p0, apex, e0, p0, e1, apex]);
                } else {
                    self.push_transformed(&[p0, e0, apex, p0, apex, e1]);
                }
            }
        }
    }

    /// Walks the path, expanding each element into stroke geometry.
    fn walk(&mut self, path: &Path) {
        let mut initial_point: Option<Point> = None;
        let mut current_point: Option<Point> = None;
        let mut initial_dir: Option<Point> = None;
        let mut current_dir: Option<Point> = None;

        for element in path.elements() {
            match *element {
                PathElement::MoveTo(to) => {
                    if let (Some(p0), Some(d0), Some(p1), Some(d1)) =
                        (initial_point, initial_dir, current_point, current_dir)
                    {
                        if self.in_dash() {
                            self.add_stroke_cap(p1, d1);
                        }
                        self.reset_dash_phase();
                        if self.in_dash() {
                            self.add_stroke_cap(p0, -d0);
                        }
                    }
                    initial_point = Some(to);
                    current_point = Some(to);
                    initial_dir = None;
                    current_dir = None;
                    self.reset_dash_phase();
                }
                PathElement::LineTo(p1) => {
                    if let Some(p0) = current_point {
                        let delta = p1 - p0;
                        let length = delta.magnitude();
                        if length > f32::EPSILON {
                            let d1 = delta / length;
                            if let Some(d0) = current_dir {
                                if self.in_dash() {
                                    self.add_stroke_join(p0, d0, d1);
                                }
                            }
                            self.add_stroke_line(p0, p1, d1, d1);
                            current_dir = Some(d1);
                            initial_dir = initial_dir.or(current_dir);
                        }
                    }
                    current_point = Some(p1);
                }
                PathElement::QuadCurveTo { control, end } => {
                    if let Some(p0) = current_point {
                        let curve = QuadraticBezier::new(p0, control, end);
                        let length = curve.approximate_length();
                        if length > f32::EPSILON {
                            let step = 1.0 / length;
                            let mut t = step;
                            let mut pt0 = p0;
                            let mut d0 =
                                current_dir.unwrap_or_else(|| (control - p0).normalized());
                            while t < 1.0 {
                                let pt1 = curve.interpolate(t);
                                let d1 = curve.tangent(t).normalized();
                                self.add_stroke_line(pt0, pt1, d0, d1);
                                pt0 = pt1;
                                d0 = d1;
                                t += step;
                            }
                            let d1 = (end - control).normalized();
                            self.add_stroke_line(pt0, end, d0, d1);
                            current_dir = Some(d1);
                            initial_dir = initial_dir.or(current_dir);
                        }
                    }
                    current_point = Some(end);
                }
                PathElement::CurveTo {
                    control1,
                    control2,
                    end,
                } => {
                    if let Some(p0) = current_point {
                        let curve = CubicBezier::new(p0, control1, control2, end);
                        let length = curve.approximate_length();
                        if length > f32::EPSILON {
                            let step = 1.0 / length;
                            let mut t = step;
                            let mut pt0 = p0;
                            let mut d0 =
                                current_dir.unwrap_or_else(|| (control1 - p0).normalized());
                            while t < 1.0 {
                                let pt1 = curve.interpolate(t);
                                let d1 = curve.tangent(t).normalized();
                                self.add_stroke_line(pt0, pt1, d0, d1);
                                pt0 = pt1;
                                d0 = d1;
                                t += step;
                            }
                            let d1 = (end - control2).normalized();
                            self.add_stroke_line(pt0, end, d0, d1);
                            current_dir = Some(d1);
                            initial_dir = initial_dir.or(current_dir);
                        }
                    }
                    current_point = Some(end);
                }
                PathElement::Close => {
                    if let (Some(p0), Some(p1)) = (current_point, initial_point) {
                        let d = (p1 - p0).normalized();
                        if let Some(d0) = current_dir {
                            if self.in_dash() {
                                self.add_stroke_join(p0, d0, d);
                            }
                        }
                        self.add_stroke_line(p0, p1, d, d);
                        if let Some(d1) = initial_dir {
                            if self.in_dash() {
                                self.reset_dash_phase();
                                if self.in_dash() {
                                    self.add_stroke_join(p1, d, d1);
                                } else {
                                    self.add_stroke_cap(p1, d);
                                }
                            } else {
                                self.reset_dash_phase();
                                if self.in_dash() {
                                    self.add_stroke_cap(p1, -d1);
                                }
                            }
                        }
                    }
                    current_point = initial_point;
                    initial_dir = None;
                    current_dir = None;
                    self.reset_dash_phase();
                }
            }
        }

        // Cap the open ends of an unclosed final subpath.
        if let (Some(p0), Some(d0), Some(p1), Some(d1)) =
            (initial_point, initial_dir, current_point, current_dir)
        {
            if self.in_dash() {
                self.add_stroke_cap(p1, d1);
            }
            self.reset_dash_phase();
            if self.in_dash() {
                self.add_stroke_cap(p0, -d0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumo_core::Rect;

    #[test]
    fn rect_flattens_to_one_polygon() {
        let polygons = flatten_polygons(&Path::rect(Rect::new(0.0, 0.0, 4.0, 4.0)));
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].len(), 4);
    }

    #[test]
    fn circle_flattening_tracks_the_curve() {
        let polygons = flatten_polygons(&Path::circle(Point::new(0.0, 0.0), 50.0));
        assert_eq!(polygons.len(), 1);
        assert!(polygons[0].len() > 16, "curves should subdivide");
        for p in &polygons[0] {
            let r = Vector2::from(*p).magnitude();
            assert!((r - 50.0).abs() < 2.0, "point {p:?} strayed from the circle");
        }
    }

    #[test]
    fn reversed_winding_flips_triangle_orientation() {
        // The stencil pass relies on signed areas: a clockwise subpath and
        // its reverse must produce fans of opposite orientation.
        let mut cw = Path::new();
        cw.move_to(Point::new(0.0, 0.0))
            .line_to(Point::new(1.0, 0.0))
            .line_to(Point::new(1.0, 1.0))
            .close();
        let mut ccw = Path::new();
        ccw.move_to(Point::new(0.0, 0.0))
            .line_to(Point::new(1.0, 1.0))
            .line_to(Point::new(1.0, 0.0))
            .close();

        let signed_area = |polygon: &[Point]| {
            let mut area = 0.0f32;
            for i in 0..polygon.len() {
                let a = polygon[i];
                let b = polygon[(i + 1) % polygon.len()];
                area += a.x * b.y - b.x * a.y;
            }
            area * 0.5
        };

        let cw_area = signed_area(&flatten_polygons(&cw)[0]);
        let ccw_area = signed_area(&flatten_polygons(&ccw)[0]);
        assert!(cw_area * ccw_area < 0.0, "windings must have opposite signs");
    }
}
