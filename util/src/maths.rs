//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Piecewise linear interpolation of `value` over a breakpoint table.
///
/// Values outside of the breakpoints are clamped to the first or last value in
/// the table. Breakpoints must be increasing.
///
/// If the tables are empty or have different lengths `None` is returned.
pub fn interp<T>(value: T, bp: &[T], v: &[T]) -> Option<T>
where
    T: Float,
{
    if bp.is_empty() || bp.len() != v.len() {
        return None;
    }

    let last = bp.len() - 1;

    if value <= bp[0] {
        return Some(v[0]);
    }
    if value >= bp[last] {
        return Some(v[last]);
    }

    // Find the segment containing the value, the clamps above guarantee there
    // is one.
    for i in 1..bp.len() {
        if value <= bp[i] {
            return Some(lin_map((bp[i - 1], bp[i]), (v[i - 1], v[i]), value));
        }
    }

    Some(v[last])
}

/// Clamp a value between `min` and `max`.
///
/// Unlike `f64::clamp` this does not panic if `min > max`, in which case
/// `max` takes precedence.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    value.max(min).min(max)
}

/// Apply a symmetric dead-band to a value.
///
/// Values within `[-deadzone, deadzone]` become zero, values outside of it are
/// moved towards zero by `deadzone`.
pub fn apply_deadzone<T>(value: T, deadzone: T) -> T
where
    T: Float,
{
    if value > deadzone {
        value - deadzone
    } else if value < -deadzone {
        value + deadzone
    } else {
        T::zero()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_interp() {
        let bp = [0.0, 10.0, 20.0];
        let v = [1.0, 2.0, 4.0];

        assert_eq!(interp(-5.0, &bp, &v), Some(1.0));
        assert_eq!(interp(0.0, &bp, &v), Some(1.0));
        assert_eq!(interp(5.0, &bp, &v), Some(1.5));
        assert_eq!(interp(15.0, &bp, &v), Some(3.0));
        assert_eq!(interp(20.0, &bp, &v), Some(4.0));
        assert_eq!(interp(100.0, &bp, &v), Some(4.0));

        // Single point tables are constant
        assert_eq!(interp(7.0, &[3.0], &[0.5]), Some(0.5));

        assert_eq!(interp(1.0, &[], &[]), None::<f64>);
        assert_eq!(interp(1.0, &[0.0, 1.0], &[1.0]), None);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(2.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-2.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.5, -1.0, 1.0), 0.5);

        // Inverted limits don't panic
        assert_eq!(clamp(0.0, 1.0, -1.0), -1.0);
    }

    #[test]
    fn test_apply_deadzone() {
        assert_eq!(apply_deadzone(0.5, 1.0), 0.0);
        assert_eq!(apply_deadzone(-0.5, 1.0), 0.0);
        assert_eq!(apply_deadzone(3.0, 1.0), 2.0);
        assert_eq!(apply_deadzone(-3.0, 1.0), -2.0);
        assert_eq!(apply_deadzone(3.0, 0.0), 3.0);
    }
}
