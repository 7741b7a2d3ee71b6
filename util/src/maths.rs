//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Return the Chebyshev (chessboard) distance between two 2D points.
///
/// This is a cheap lower bound on the euclidian distance, useful as a
/// prefilter before computing the exact distance.
pub fn chebyshev_dist<T>(point_0: (T, T), point_1: (T, T)) -> T
where
    T: Float,
{
    (point_0.0 - point_1.0)
        .abs()
        .max((point_0.1 - point_1.1).abs())
}

/// Divide `num` by `den`, returning a saturated value if the denominator is
/// too close to zero.
///
/// The fallback carries the sign of the numerator (and of the denominator
/// when it isn't exactly zero) so the direction of the result is preserved.
/// A zero numerator always gives zero.
pub fn safe_div<T>(num: T, den: T, fallback_mag: T) -> T
where
    T: Float,
{
    if den.abs() > T::epsilon() {
        return num / den;
    }

    if num == T::zero() {
        return T::zero();
    }

    let sign = if den < T::zero() {
        -num.signum()
    } else {
        num.signum()
    };

    sign * fallback_mag.abs()
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Normalise an angle into the range (-pi, pi].
pub fn norm_angle<T>(angle: T) -> T
where
    T: Float,
{
    let pi = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau = pi + pi;

    let mut a = rem_euclid(angle + pi, tau) - pi;

    // Round-off can land exactly on either bound, fold both onto +pi
    if a <= -pi {
        a = a + tau;
    }
    if a > pi {
        a = pi;
    }

    a
}

/// Get the signed shortest angular distance going from `from` to `to`.
///
/// The result lies in (-pi, pi], positive meaning a counter-clockwise
/// rotation.
pub fn ang_dist<T>(from: T, to: T) -> T
where
    T: Float,
{
    norm_angle(to - from)
}
