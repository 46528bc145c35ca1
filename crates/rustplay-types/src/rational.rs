/*!
    Rational time base arithmetic.
*/

/**
    A rational number `num/den`, used as a stream time base.

    `us = pts * num * 1_000_000 / den`, per the GLOSSARY's `time base`
    definition.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Convert a stream-domain PTS into microseconds.
    pub fn pts_to_us(self, pts: i64) -> i64 {
        // Widen through i128 so large PTS values times num * 1_000_000 don't overflow.
        ((pts as i128 * self.num as i128 * 1_000_000) / self.den as i128) as i64
    }

    /// Convert microseconds back into this time base's PTS domain.
    pub fn us_to_pts(self, us: i64) -> i64 {
        ((us as i128 * self.den as i128) / (self.num as i128 * 1_000_000)) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_within_tolerance() {
        let tb = Rational::new(1, 90_000);
        let us = 1_234_567i64;
        let pts = tb.us_to_pts(us);
        let back = tb.pts_to_us(pts);
        let tolerance = 1_000_000 * tb.num as i64 / tb.den as i64;
        assert!((back - us).abs() <= tolerance.max(1));
    }

    #[test]
    fn pts_to_us_common_time_base() {
        let tb = Rational::new(1, 1000);
        assert_eq!(tb.pts_to_us(500), 500_000);
    }
}
