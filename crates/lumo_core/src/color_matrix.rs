//! 4x5 affine color transforms

use crate::color::Color;

/// A 4x5 affine color transform.
///
/// Each output channel is a weighted sum of the four input channels plus a
/// constant term: `R' = r1*R + r2*G + r3*B + r4*A + r5`, and likewise for
/// G, B and A. Matches the SVG `feColorMatrix` element layout.
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct ColorMatrix {
    pub r1: f32, pub r2: f32, pub r3: f32, pub r4: f32, pub r5: f32,
    pub g1: f32, pub g2: f32, pub g3: f32, pub g4: f32, pub g5: f32,
    pub b1: f32, pub b2: f32, pub b3: f32, pub b4: f32, pub b5: f32,
    pub a1: f32, pub a2: f32, pub a3: f32, pub a4: f32, pub a5: f32,
}

impl ColorMatrix {
    pub const IDENTITY: Self = {
        let mut m = Self::ZERO;
        m.r1 = 1.0;
        m.g2 = 1.0;
        m.b3 = 1.0;
        m.a4 = 1.0;
        m
    };

    pub const ZERO: Self = Self {
        r1: 0.0, r2: 0.0, r3: 0.0, r4: 0.0, r5: 0.0,
        g1: 0.0, g2: 0.0, g3: 0.0, g4: 0.0, g5: 0.0,
        b1: 0.0, b2: 0.0, b3: 0.0, b4: 0.0, b5: 0.0,
        a1: 0.0, a2: 0.0, a3: 0.0, a4: 0.0, a5: 0.0,
    };

    /// Row-major 20-element array: R row, G row, B row, A row.
    pub const fn to_array(self) -> [f32; 20] {
        [
            self.r1, self.r2, self.r3, self.r4, self.r5,
            self.g1, self.g2, self.g3, self.g4, self.g5,
            self.b1, self.b2, self.b3, self.b4, self.b5,
            self.a1, self.a2, self.a3, self.a4, self.a5,
        ]
    }

    pub fn apply(&self, c: Color) -> Color {
        Color::new(
            self.r1 * c.r + self.r2 * c.g + self.r3 * c.b + self.r4 * c.a + self.r5,
            self.g1 * c.r + self.g2 * c.g + self.g3 * c.b + self.g4 * c.a + self.g5,
            self.b1 * c.r + self.b2 * c.g + self.b3 * c.b + self.b4 * c.a + self.b5,
            self.a1 * c.r + self.a2 * c.g + self.a3 * c.b + self.a4 * c.a + self.a5,
        )
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_preserves_color() {
        let c = Color::new(0.25, 0.5, 0.75, 1.0);
        assert_eq!(ColorMatrix::IDENTITY.apply(c), c);
    }

    #[test]
    fn array_layout_is_80_bytes_of_rows() {
        let m = ColorMatrix::IDENTITY;
        let a = m.to_array();
        assert_eq!(std::mem::size_of_val(&a), 80);
        assert_eq!(a[0], 1.0); // r1
        assert_eq!(a[6], 1.0); // g2
        assert_eq!(a[12], 1.0); // b3
        assert_eq!(a[18], 1.0); // a4
    }
}
