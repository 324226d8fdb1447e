pub trait FloatExt: Sized {
    /// Equality within the crate-wide [`EPSILON`](crate::EPSILON).
    fn approximately_eq(self, other: Self) -> bool;

    /// Equality within an explicit absolute tolerance.
    fn approx_eq_within(self, other: Self, tolerance: Self) -> bool;

    /// Replace NaN with `fallback`, pass every other value through.
    fn or_if_nan(self, fallback: Self) -> Self;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON as f32
    }

    fn approx_eq_within(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance
    }

    fn or_if_nan(self, fallback: Self) -> Self {
        if self.is_nan() {
            fallback
        } else {
            self
        }
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }

    fn approx_eq_within(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance
    }

    fn or_if_nan(self, fallback: Self) -> Self {
        if self.is_nan() {
            fallback
        } else {
            self
        }
    }
}
