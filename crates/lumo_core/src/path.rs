//! Vector paths

use crate::geometry::{Point, Rect};

/// One element of a vector path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathElement {
    MoveTo(Point),
    LineTo(Point),
    QuadCurveTo { control: Point, end: Point },
    CurveTo { control1: Point, control2: Point, end: Point },
    Close,
}

/// A sequence of subpaths built from lines and Bezier curves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.elements.push(PathElement::MoveTo(p));
        self
    }

    pub fn line_to(&mut self, p: Point) -> &mut Self {
        self.elements.push(PathElement::LineTo(p));
        self
    }

    pub fn quad_curve_to(&mut self, control: Point, end: Point) -> &mut Self {
        self.elements.push(PathElement::QuadCurveTo { control, end });
        self
    }

    pub fn curve_to(&mut self, control1: Point, control2: Point, end: Point) -> &mut Self {
        self.elements.push(PathElement::CurveTo {
            control1,
            control2,
            end,
        });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.elements.push(PathElement::Close);
        self
    }

    /// A closed rectangular path, wound clockwise in a y-down coordinate
    /// space.
    pub fn rect(rect: Rect) -> Self {
        let r = rect.standardized();
        let mut path = Self::new();
        path.move_to(Point::new(r.min_x(), r.min_y()))
            .line_to(Point::new(r.max_x(), r.min_y()))
            .line_to(Point::new(r.max_x(), r.max_y()))
            .line_to(Point::new(r.min_x(), r.max_y()))
            .close();
        path
    }

    /// An ellipse inscribed in `rect`, approximated by four cubic segments.
    pub fn ellipse(rect: Rect) -> Self {
        // Magic number for a cubic approximation of a quarter arc.
        const K: f32 = 0.552_284_8;

        let r = rect.standardized();
        let (cx, cy) = ((r.min_x() + r.max_x()) * 0.5, (r.min_y() + r.max_y()) * 0.5);
        let (rx, ry) = (r.width() * 0.5, r.height() * 0.5);
        let (ox, oy) = (rx * K, ry * K);

        let mut path = Self::new();
        path.move_to(Point::new(cx + rx, cy))
            .curve_to(
                Point::new(cx + rx, cy + oy),
                Point::new(cx + ox, cy + ry),
                Point::new(cx, cy + ry),
            )
            .curve_to(
                Point::new(cx - ox, cy + ry),
                Point::new(cx - rx, cy + oy),
                Point::new(cx - rx, cy),
            )
            .curve_to(
                Point::new(cx - rx, cy - oy),
                Point::new(cx - ox, cy - ry),
                Point::new(cx, cy - ry),
            )
            .curve_to(
                Point::new(cx + ox, cy - ry),
                Point::new(cx + rx, cy - oy),
                Point::new(cx + rx, cy),
            )
            .close();
        path
    }

    pub fn circle(center: Point, radius: f32) -> Self {
        Self::ellipse(Rect::new(
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        ))
    }

    /// Bounding box of every on-curve and control point.
    pub fn bounding_box(&self) -> Rect {
        let mut min = Point::new(f32::MAX, f32::MAX);
        let mut max = Point::new(f32::MIN, f32::MIN);
        let mut any = false;

        let mut extend = |p: Point| {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
            any = true;
        };

        for element in &self.elements {
            match *element {
                PathElement::MoveTo(p) | PathElement::LineTo(p) => extend(p),
                PathElement::QuadCurveTo { control, end } => {
                    extend(control);
                    extend(end);
                }
                PathElement::CurveTo {
                    control1,
                    control2,
                    end,
                } => {
                    extend(control1);
                    extend(control2);
                    extend(end);
                }
                PathElement::Close => {}
            }
        }

        if any {
            Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
        } else {
            Rect::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_path_has_five_elements() {
        let path = Path::rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(path.elements().len(), 5);
        assert!(matches!(path.elements()[4], PathElement::Close));
    }

    #[test]
    fn bounding_box_of_rect_path() {
        let r = Rect::new(2.0, 3.0, 4.0, 5.0);
        assert_eq!(Path::rect(r).bounding_box(), r);
    }

    #[test]
    fn empty_path_has_zero_bounds() {
        assert_eq!(Path::new().bounding_box(), Rect::ZERO);
        assert!(Path::new().is_empty());
    }

    #[test]
    fn circle_bounds_cover_diameter() {
        let b = Path::circle(Point::new(0.0, 0.0), 10.0).bounding_box();
        assert!((b.width() - 20.0).abs() < 1e-4);
        assert!((b.height() - 20.0).abs() < 1e-4);
    }
}
