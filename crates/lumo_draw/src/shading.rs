//! Shading: solid colors and gradients
//!
//! Gradients are resolved on the CPU into vertex-colored geometry covering
//! the visible span: linear gradients emit one screen-space quad per stop
//! interval, radial gradients emit concentric arc bands (4 degrees per
//! segment), and conic gradients emit a 1-degree triangle fan. `REPEAT`
//! tiles the stop sequence across integer offsets; `MIRROR` alternates
//! forward/reversed stops per tile.

use crate::context::{GraphicsContext, RenderPass};
use crate::pipeline::{ShaderKind, StencilMode, Vertex};
use lumo_core::{AffineTransform, Angle, Color, Point, Vector2};
use lumo_gpu::BlendState;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Normalized position along the gradient axis, 0 to 1.
    pub location: f32,
    pub color: Color,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gradient {
    pub stops: Vec<GradientStop>,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct GradientOptions: u32 {
        /// Tile the stop sequence across integer offsets.
        const REPEAT = 1 << 0;
        /// Tile with alternating direction.
        const MIRROR = 1 << 1;
    }
}

impl Gradient {
    pub fn new(stops: Vec<GradientStop>) -> Self {
        Self { stops }
    }

    pub fn two(from: Color, to: Color) -> Self {
        Self::new(vec![
            GradientStop {
                location: 0.0,
                color: from,
            },
            GradientStop {
                location: 1.0,
                color: to,
            },
        ])
    }

    /// Stops sorted by location, locations clamped to [0, 1].
    pub fn normalized(&self) -> Self {
        let mut stops = self.stops.clone();
        for stop in &mut stops {
            stop.location = stop.location.clamp(0.0, 1.0);
        }
        stops.sort_by(|a, b| a.location.total_cmp(&b.location));
        Self { stops }
    }

    /// Color at a normalized location, clamping past the end stops. The
    /// stops are assumed normalized.
    pub fn color_at(&self, location: f32) -> Color {
        let stops = &self.stops;
        let Some(first) = stops.first() else {
            return Color::CLEAR;
        };
        let last = stops.last().unwrap();
        if location <= first.location {
            return first.color;
        }
        if location >= last.location {
            return last.color;
        }
        for pair in stops.windows(2) {
            let (s1, s2) = (&pair[0], &pair[1]);
            if location <= s2.location {
                let span = s2.location - s1.location;
                if span <= f32::EPSILON {
                    return s2.color;
                }
                return Color::lerp(s1.color, s2.color, (location - s1.location) / span);
            }
        }
        last.color
    }

    /// Color at an unbounded location under the given extension mode:
    /// clamp by default, periodic under `REPEAT`, reflected under `MIRROR`.
    pub fn extended_color_at(&self, location: f32, options: GradientOptions) -> Color {
        if options.contains(GradientOptions::MIRROR) {
            let period = location.rem_euclid(2.0);
            let t = if period > 1.0 { 2.0 - period } else { period };
            self.color_at(t)
        } else if options.contains(GradientOptions::REPEAT) {
            let mut t = location.rem_euclid(1.0);
            // The end of one tile is the start of the next.
            if t == 0.0 && location > 0.0 {
                t = 1.0;
            }
            self.color_at(t)
        } else {
            self.color_at(location.clamp(0.0, 1.0))
        }
    }
}

/// What a fill or stroke is painted with.
#[derive(Clone, Debug)]
pub enum Shading {
    Color(Color),
    LinearGradient {
        gradient: Gradient,
        start: Point,
        end: Point,
        options: GradientOptions,
    },
    RadialGradient {
        gradient: Gradient,
        center: Point,
        start_radius: f32,
        end_radius: f32,
        options: GradientOptions,
    },
    ConicGradient {
        gradient: Gradient,
        center: Point,
        angle: Angle,
        options: GradientOptions,
    },
}

impl Shading {
    pub fn color(color: Color) -> Self {
        Self::Color(color)
    }
}

impl GraphicsContext {
    /// Emits the geometry realizing `shading` over the whole viewport and
    /// draws it through the requested stencil test.
    pub(crate) fn encode_shading_box_command(
        &self,
        render_pass: &mut RenderPass,
        shading: &Shading,
        stencil: StencilMode,
        blend_state: BlendState,
    ) {
        let vertices = match shading {
            Shading::Color(color) => Self::viewport_quad(*color).to_vec(),
            Shading::LinearGradient {
                gradient,
                start,
                end,
                options,
            } => {
                match self.linear_gradient_vertices(gradient, *start, *end, *options) {
                    GradientGeometry::Vertices(v) => v,
                    GradientGeometry::Solid(color) => {
                        return self.encode_shading_box_command(
                            render_pass,
                            &Shading::Color(color),
                            stencil,
                            blend_state,
                        );
                    }
                    GradientGeometry::Empty => return,
                }
            }
            Shading::RadialGradient {
                gradient,
                center,
                start_radius,
                end_radius,
                options,
            } => {
                match self.radial_gradient_vertices(
                    gradient,
                    *center,
                    *start_radius,
                    *end_radius,
                    *options,
                ) {
                    GradientGeometry::Vertices(v) => v,
                    GradientGeometry::Solid(color) => {
                        return self.encode_shading_box_command(
                            render_pass,
                            &Shading::Color(color),
                            stencil,
                            blend_state,
                        );
                    }
                    GradientGeometry::Empty => return,
                }
            }
            Shading::ConicGradient {
                gradient,
                center,
                angle,
                options: _,
            } => match self.conic_gradient_vertices(gradient, *center, *angle) {
                GradientGeometry::Vertices(v) => v,
                GradientGeometry::Solid(color) => {
                    return self.encode_shading_box_command(
                        render_pass,
                        &Shading::Color(color),
                        stencil,
                        blend_state,
                    );
                }
                GradientGeometry::Empty => return,
            },
        };

        self.encode_draw_command(
            render_pass,
            ShaderKind::VertexColor,
            stencil,
            &vertices,
            None,
            None,
            blend_state,
            None,
        );
    }

    fn linear_gradient_vertices(
        &self,
        gradient: &Gradient,
        start: Point,
        end: Point,
        options: GradientOptions,
    ) -> GradientGeometry {
        let stops = gradient.normalized().stops;
        if stops.is_empty() {
            return GradientGeometry::Empty;
        }

        let gradient_vector = Vector2::from(end) - Vector2::from(start);
        let length = gradient_vector.magnitude();
        if length < f32::EPSILON {
            return GradientGeometry::Solid(stops[0].color);
        }
        let dir = gradient_vector.normalized();

        // Gradient space to content space: (0,0) -> start, (1,0) -> end.
        let gradient_transform =
            AffineTransform::new(dir.x * length, dir.y * length, -dir.y, dir.x, start.x, start.y);

        let (Some(inv_view), Some(inv_gradient)) =
            (self.view_transform.inverted(), gradient_transform.inverted())
        else {
            return GradientGeometry::Empty;
        };
        let viewport_to_gradient = inv_view.concatenating(&inv_gradient);

        // Visible span of the gradient axis.
        let corners = [
            Point::new(-1.0, -1.0),
            Point::new(-1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, -1.0),
        ]
        .map(|p| p.applying(&viewport_to_gradient));
        let min_x = corners.iter().map(|p| p.x).fold(f32::MAX, f32::min);
        let max_x = corners.iter().map(|p| p.x).fold(f32::MIN, f32::max);
        let min_y = corners.iter().map(|p| p.y).fold(f32::MAX, f32::min);
        let max_y = corners.iter().map(|p| p.y).fold(f32::MIN, f32::max);

        let to_viewport = gradient_transform.concatenating(&self.view_transform);

        let mut vertices: Vec<Vertex> = Vec::new();
        let mut add_gradient_box = |x1: f32, x2: f32, c1: Color, c2: Color| {
            let corner = |x: f32, y: f32, c: Color| {
                Vertex::new(
                    Point::new(x, y).applying(&to_viewport).into(),
                    [0.0, 0.0],
                    c.to_array(),
                )
            };
            let v0 = corner(x1, max_y, c1);
            let v1 = corner(x1, min_y, c1);
            let v2 = corner(x2, max_y, c2);
            let v3 = corner(x2, min_y, c2);
            vertices.extend_from_slice(&[v0, v1, v2, v2, v1, v3]);
        };

        if options.contains(GradientOptions::MIRROR) {
            let mut pos = min_x.floor();
            while pos < max_x.ceil() {
                let reversed = (pos.abs() % 2.0).round() == 1.0;
                for pair in stops.windows(2) {
                    let (s1, s2) = (&pair[0], &pair[1]);
                    let (x1, x2) = if reversed {
                        (1.0 - s1.location + pos, 1.0 - s2.location + pos)
                    } else {
                        (s1.location + pos, s2.location + pos)
                    };
                    if x1.min(x2) > max_x || x1.max(x2) < min_x {
                        continue;
                    }
                    add_gradient_box(x1, x2, s1.color, s2.color);
                }
                pos += 1.0;
            }
        } else if options.contains(GradientOptions::REPEAT) {
            let mut pos = min_x.floor();
            while pos < max_x.ceil() {
                for pair in stops.windows(2) {
                    let (s1, s2) = (&pair[0], &pair[1]);
                    if s1.location + pos > max_x {
                        break;
                    }
                    if s2.location + pos < min_x {
                        continue;
                    }
                    add_gradient_box(
                        s1.location + pos,
                        s2.location + pos,
                        s1.color,
                        s2.color,
                    );
                }
                pos += 1.0;
            }
        } else {
            for pair in stops.windows(2) {
                let (s1, s2) = (&pair[0], &pair[1]);
                add_gradient_box(s1.location, s2.location, s1.color, s2.color);
            }
            // Extend the end colors over the uncovered span.
            let first = stops.first().unwrap();
            if first.location > min_x {
                add_gradient_box(min_x, first.location, first.color, first.color);
            }
            let last = stops.last().unwrap();
            if last.location < max_x {
                add_gradient_box(last.location, max_x, last.color, last.color);
            }
        }

        GradientGeometry::Vertices(vertices)
    }

    fn radial_gradient_vertices(
        &self,
        gradient: &Gradient,
        center: Point,
        start_radius: f32,
        end_radius: f32,
        options: GradientOptions,
    ) -> GradientGeometry {
        let stops = gradient.normalized().stops;
        if stops.is_empty() {
            return GradientGeometry::Empty;
        }

        let length = (end_radius - start_radius).abs();
        if length < f32::EPSILON {
            let color = if options.contains(GradientOptions::REPEAT)
                && !options.contains(GradientOptions::MIRROR)
            {
                stops.last().unwrap().color
            } else {
                stops[0].color
            };
            return GradientGeometry::Solid(color);
        }

        let Some(inv_view) = self.view_transform.inverted() else {
            return GradientGeometry::Empty;
        };
        // Radius of the circle bounding the visible region.
        let scale = [
            Point::new(-1.0, -1.0),
            Point::new(-1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, -1.0),
        ]
        .map(|p| {
            let v = Vector2::from(p.applying(&inv_view)) - Vector2::from(center);
            v.magnitude_squared()
        })
        .into_iter()
        .fold(0.0f32, f32::max)
        .sqrt();

        let transform = AffineTransform::translation(center.x, center.y)
            .concatenating(&self.view_transform);

        let step = std::f32::consts::PI / 45.0;
        let mut vertices: Vec<Vertex> = Vec::new();

        // One triangle band per stop interval, clamped against the visible
        // radius range, swept through the whole circle.
        let mut add_circular_arc = |x1: f32, x2: f32, c1: Color, c2: Color| {
            if x1 >= scale && x2 >= scale {
                return;
            }
            if x1 <= 0.0 && x2 <= 0.0 {
                return;
            }
            if (x2 - x1).abs() < f32::EPSILON {
                return;
            }

            let (mut x1, mut x2, mut c1, mut c2) = if x1 > x2 {
                (x2, x1, c2, c1)
            } else {
                (x1, x2, c1, c2)
            };
            let span = x2 - x1;
            if x1 < 0.0 {
                c1 = Color::lerp(c1, c2, -x1 / span);
                x1 = 0.0;
            }
            if x2 > scale {
                c2 = Color::lerp(c1, c2, (scale - x1) / span);
                x2 = scale;
            }
            if x2 - x1 < f32::EPSILON {
                return;
            }

            let p0 = Vector2::new(x1, 0.0);
            let p1 = p0.rotated(step);
            let p2 = Vector2::new(x2, 0.0);
            let p3 = p2.rotated(step);

            // Degenerate inner radius collapses the band to a fan segment.
            let (points, colors): (Vec<Vector2>, Vec<Color>) =
                if (p1 - p0).magnitude_squared() < f32::EPSILON {
                    (vec![p0, p2, p3], vec![c1, c2, c2])
                } else {
                    (vec![p1, p0, p3, p3, p0, p2], vec![c1, c1, c2, c2, c1, c2])
                };

            let mut progress = 0.0f32;
            while progress < std::f32::consts::TAU {
                for (p, c) in points.iter().zip(&colors) {
                    vertices.push(Vertex::new(
                        p.rotated(progress).applying(&transform).to_array(),
                        [0.0, 0.0],
                        c.to_array(),
                    ));
                }
                progress += step;
            }
        };

        if options.contains(GradientOptions::MIRROR) {
            let mut radius = start_radius;
            let mut reverse = false;
            while radius > 0.0 {
                radius -= length;
                reverse = !reverse;
            }
            while radius < scale {
                for pair in stops.windows(2) {
                    let (s1, s2) = (&pair[0], &pair[1]);
                    let (loc1, loc2) = if reverse {
                        (
                            radius + length - s1.location * length,
                            radius + length - s2.location * length,
                        )
                    } else {
                        (
                            radius + s1.location * length,
                            radius + s2.location * length,
                        )
                    };
                    add_circular_arc(loc1, loc2, s1.color, s2.color);
                }
                radius += length;
                reverse = !reverse;
            }
        } else if options.contains(GradientOptions::REPEAT) {
            let reverse = end_radius < start_radius;
            let mut radius = start_radius;
            while radius > 0.0 {
                radius -= length;
            }
            while radius < scale {
                for pair in stops.windows(2) {
                    let (s1, s2) = (&pair[0], &pair[1]);
                    let (loc1, loc2) = if reverse {
                        (
                            radius + length - s1.location * length,
                            radius + length - s2.location * length,
                        )
                    } else {
                        (
                            radius + s1.location * length,
                            radius + s2.location * length,
                        )
                    };
                    add_circular_arc(loc1, loc2, s1.color, s2.color);
                }
                radius += length;
            }
        } else if end_radius > start_radius {
            let first = stops.first().unwrap();
            let last = stops.last().unwrap();
            add_circular_arc(0.0, start_radius, first.color, first.color);
            for pair in stops.windows(2) {
                let (s1, s2) = (&pair[0], &pair[1]);
                let loc1 = start_radius + s1.location * length;
                let loc2 = start_radius + s2.location * length;
                if loc1 >= scale && loc2 >= scale {
                    break;
                }
                add_circular_arc(loc1, loc2, s1.color, s2.color);
            }
            add_circular_arc(end_radius, scale, last.color, last.color);
        } else {
            let first = stops.first().unwrap();
            let last = stops.last().unwrap();
            add_circular_arc(0.0, end_radius, last.color, last.color);
            for pair in stops.windows(2) {
                let (s1, s2) = (&pair[0], &pair[1]);
                let loc1 = start_radius - s1.location * length;
                let loc2 = start_radius - s2.location * length;
                if loc1 <= 0.0 && loc2 <= 0.0 {
                    break;
                }
                add_circular_arc(loc1, loc2, s1.color, s2.color);
            }
            add_circular_arc(start_radius, scale, first.color, first.color);
        }

        GradientGeometry::Vertices(vertices)
    }

    fn conic_gradient_vertices(
        &self,
        gradient: &Gradient,
        center: Point,
        angle: Angle,
    ) -> GradientGeometry {
        let gradient = gradient.normalized();
        if gradient.stops.is_empty() {
            return GradientGeometry::Empty;
        }

        let Some(inv_view) = self.view_transform.inverted() else {
            return GradientGeometry::Empty;
        };
        let scale = [
            Point::new(-1.0, -1.0),
            Point::new(-1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, -1.0),
        ]
        .map(|p| {
            let v = Vector2::from(p.applying(&inv_view)) - Vector2::from(center);
            v.magnitude_squared()
        })
        .into_iter()
        .fold(0.0f32, f32::max)
        .sqrt();

        let transform = AffineTransform::rotation(angle.radians)
            .concatenating(&AffineTransform::scale(scale, scale))
            .concatenating(&AffineTransform::translation(center.x, center.y))
            .concatenating(&self.view_transform);

        let step = std::f32::consts::PI / 180.0;
        let center_position = Point::new(0.0, 0.0).applying(&transform);
        let mut vertices: Vec<Vertex> =
            Vec::with_capacity(((std::f32::consts::TAU / step) as usize + 1) * 3);

        let mut progress = 0.0f32;
        while progress < std::f32::consts::TAU {
            let p0 = Vector2::new(1.0, 0.0).rotated(progress).applying(&transform);
            let p1 = Vector2::new(1.0, 0.0)
                .rotated(progress + step)
                .applying(&transform);
            let c0 = gradient.color_at(progress / std::f32::consts::TAU);
            let c1 = gradient.color_at((progress + step) / std::f32::consts::TAU);

            vertices.push(Vertex::new(
                [center_position.x, center_position.y],
                [0.0, 0.0],
                c0.to_array(),
            ));
            vertices.push(Vertex::new(p0.to_array(), [0.0, 0.0], c0.to_array()));
            vertices.push(Vertex::new(p1.to_array(), [0.0, 0.0], c1.to_array()));

            progress += step;
        }

        GradientGeometry::Vertices(vertices)
    }
}

enum GradientGeometry {
    Vertices(Vec<Vertex>),
    Solid(Color),
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> Gradient {
        Gradient::new(vec![
            GradientStop {
                location: 0.0,
                color: Color::RED,
            },
            GradientStop {
                location: 0.5,
                color: Color::GREEN,
            },
            GradientStop {
                location: 1.0,
                color: Color::BLUE,
            },
        ])
    }

    fn close(a: Color, b: Color) -> bool {
        (a.r - b.r).abs() < 1e-5
            && (a.g - b.g).abs() < 1e-5
            && (a.b - b.b).abs() < 1e-5
            && (a.a - b.a).abs() < 1e-5
    }

    #[test]
    fn endpoints_are_exact() {
        let g = gradient();
        assert_eq!(g.color_at(0.0), Color::RED);
        assert_eq!(g.color_at(1.0), Color::BLUE);
    }

    #[test]
    fn midpoint_interpolates() {
        let g = gradient();
        let quarter = g.color_at(0.25);
        assert!(close(quarter, Color::lerp(Color::RED, Color::GREEN, 0.5)));
    }

    #[test]
    fn clamp_extends_end_colors() {
        let g = gradient();
        assert_eq!(g.extended_color_at(-3.0, GradientOptions::empty()), Color::RED);
        assert_eq!(g.extended_color_at(7.5, GradientOptions::empty()), Color::BLUE);
    }

    #[test]
    fn repeat_is_periodic() {
        let g = gradient();
        for t in [0.1, 0.37, 0.62, 0.99] {
            for k in [-2.0f32, -1.0, 1.0, 3.0] {
                let a = g.extended_color_at(t, GradientOptions::REPEAT);
                let b = g.extended_color_at(t + k, GradientOptions::REPEAT);
                assert!(close(a, b), "repeat at {t}+{k}");
            }
        }
    }

    #[test]
    fn mirror_reflects_odd_tiles() {
        let g = gradient();
        for t in [0.1, 0.37, 0.62, 0.99] {
            // Even shifts reproduce the sample, odd shifts mirror it.
            let base = g.extended_color_at(t, GradientOptions::MIRROR);
            let even = g.extended_color_at(t + 4.0, GradientOptions::MIRROR);
            assert!(close(base, even), "mirror even tile at {t}");

            let odd = g.extended_color_at(t + 3.0, GradientOptions::MIRROR);
            let reflected = g.extended_color_at(1.0 - t, GradientOptions::MIRROR);
            assert!(close(odd, reflected), "mirror odd tile at {t}");
        }
    }

    #[test]
    fn normalized_sorts_and_clamps() {
        let g = Gradient::new(vec![
            GradientStop {
                location: 1.5,
                color: Color::BLUE,
            },
            GradientStop {
                location: -0.5,
                color: Color::RED,
            },
        ])
        .normalized();
        assert_eq!(g.stops[0].location, 0.0);
        assert_eq!(g.stops[1].location, 1.0);
        assert_eq!(g.stops[0].color, Color::RED);
    }
}
