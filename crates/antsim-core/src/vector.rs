use std::f64::consts::{PI, TAU};

/// Magnitudes below this are treated as the zero vector.
pub const EPSILON: f64 = 1e-12;

#[inline]
pub fn add(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] + b[0], a[1] + b[1]]
}

#[inline]
pub fn sub(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

#[inline]
pub fn scale(v: [f64; 2], s: f64) -> [f64; 2] {
    [v[0] * s, v[1] * s]
}

#[inline]
pub fn length(v: [f64; 2]) -> f64 {
    v[0].hypot(v[1])
}

#[inline]
pub fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    length(sub(a, b))
}

/// Unit vector in the direction of `v`, or `None` for a (near) zero vector.
pub fn try_normalize(v: [f64; 2]) -> Option<[f64; 2]> {
    let len = length(v);
    if len > EPSILON && len.is_finite() {
        Some([v[0] / len, v[1] / len])
    } else {
        None
    }
}

/// Unit vector in the direction of `v`; zero stays zero.
pub fn normalize_or_zero(v: [f64; 2]) -> [f64; 2] {
    try_normalize(v).unwrap_or([0.0, 0.0])
}

#[inline]
pub fn from_angle(angle: f64) -> [f64; 2] {
    [angle.cos(), angle.sin()]
}

#[inline]
pub fn angle_of(v: [f64; 2]) -> f64 {
    v[1].atan2(v[0])
}

/// Signed difference `a - b` wrapped into `[-π, π]`.
pub fn wrapped_angle_diff(a: f64, b: f64) -> f64 {
    let d = (a - b + PI).rem_euclid(TAU) - PI;
    // rem_euclid can land exactly on TAU through rounding
    if d < -PI {
        d + TAU
    } else {
        d
    }
}

/// Clamp a point into the rectangle `[0, width] × [0, height]`.
#[inline]
pub fn clamp_to_plane(p: [f64; 2], width: f64, height: f64) -> [f64; 2] {
    [p[0].clamp(0.0, width), p[1].clamp(0.0, height)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_diff_crosses_the_seam() {
        let d = wrapped_angle_diff(PI - 0.1, -PI + 0.1);
        assert!((d + 0.2).abs() < 1e-12, "got {d}");
        let d = wrapped_angle_diff(-PI + 0.1, PI - 0.1);
        assert!((d - 0.2).abs() < 1e-12, "got {d}");
    }

    #[test]
    fn wrapped_diff_stays_in_range() {
        for i in -50..50 {
            let a = i as f64 * 0.37;
            for j in -50..50 {
                let b = j as f64 * 0.53;
                let d = wrapped_angle_diff(a, b);
                assert!((-PI..=PI).contains(&d), "{a} - {b} -> {d}");
            }
        }
    }

    #[test]
    fn normalize_rejects_zero() {
        assert_eq!(try_normalize([0.0, 0.0]), None);
        assert_eq!(normalize_or_zero([0.0, 0.0]), [0.0, 0.0]);
        let n = try_normalize([3.0, 4.0]).unwrap();
        assert!((n[0] - 0.6).abs() < 1e-12 && (n[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn clamp_keeps_points_inside() {
        assert_eq!(clamp_to_plane([-3.0, 250.0], 200.0, 200.0), [0.0, 200.0]);
        assert_eq!(clamp_to_plane([10.0, 20.0], 200.0, 200.0), [10.0, 20.0]);
    }
}
