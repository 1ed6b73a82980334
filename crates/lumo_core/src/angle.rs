//! Angles

/// An angle, stored in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle {
    pub radians: f32,
}

impl Angle {
    pub const ZERO: Self = Self { radians: 0.0 };

    pub const fn radians(radians: f32) -> Self {
        Self { radians }
    }

    pub fn degrees(degrees: f32) -> Self {
        Self {
            radians: degrees.to_radians(),
        }
    }

    pub fn to_degrees(self) -> f32 {
        self.radians.to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_round_trip() {
        assert!((Angle::degrees(180.0).radians - std::f32::consts::PI).abs() < 1e-6);
        assert!((Angle::radians(std::f32::consts::PI).to_degrees() - 180.0).abs() < 1e-4);
    }
}
