use nalgebra::{Affine2, Affine3, Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

use crate::GeometryError;

/// Build a 3-D affine transform from 16 row-major values.
pub fn affine_from_rows(rows: [f64; 16]) -> Result<Affine3<f64>, GeometryError> {
    if rows.iter().any(|v| !v.is_finite()) {
        return Err(GeometryError::NonFinite { what: "transform" });
    }
    if rows[12] != 0.0 || rows[13] != 0.0 || rows[14] != 0.0 || rows[15] != 1.0 {
        return Err(GeometryError::NotAffine);
    }
    Ok(Affine3::from_matrix_unchecked(Matrix4::from_row_slice(
        &rows,
    )))
}

/// True when the transform reverses orientation (mirrors).
#[must_use]
pub fn is_flipped(t: &Affine3<f64>) -> bool {
    t.matrix().fixed_view::<3, 3>(0, 0).into_owned().determinant() < 0.0
}

#[must_use]
pub fn is_flipped_2d(t: &Affine2<f64>) -> bool {
    t.matrix().fixed_view::<2, 2>(0, 0).into_owned().determinant() < 0.0
}

/// Drop the Z coordinate.
#[must_use]
pub fn project(p: Point3<f64>) -> Point2<f64> {
    Point2::new(p.x, p.y)
}

#[must_use]
pub fn project_vector(v: Vector3<f64>) -> Vector2<f64> {
    Vector2::new(v.x, v.y)
}

#[must_use]
pub fn translation(offset: Vector2<f64>) -> Affine2<f64> {
    Affine2::from_matrix_unchecked(Matrix3::new(
        1.0, 0.0, offset.x, //
        0.0, 1.0, offset.y, //
        0.0, 0.0, 1.0,
    ))
}

/// Exact quarter turn `(u, v) -> (-v, u)` around `pivot`.
#[must_use]
pub fn quarter_turn_about(pivot: Point2<f64>) -> Affine2<f64> {
    // p' = pivot + R (p - pivot)
    Affine2::from_matrix_unchecked(Matrix3::new(
        0.0, -1.0, pivot.x + pivot.y, //
        1.0, 0.0, pivot.y - pivot.x, //
        0.0, 0.0, 1.0,
    ))
}

/// Uniform scale, optionally mirrored about the horizontal line `y = height`
/// so that `y' = (height - y) * scale`.
#[must_use]
pub fn scale_with_flip(scale: f64, flip_height: Option<f64>) -> Affine2<f64> {
    let m = match flip_height {
        Some(h) => Matrix3::new(
            scale, 0.0, 0.0, //
            0.0, -scale, h * scale, //
            0.0, 0.0, 1.0,
        ),
        None => Matrix3::new(
            scale, 0.0, 0.0, //
            0.0, scale, 0.0, //
            0.0, 0.0, 1.0,
        ),
    };
    Affine2::from_matrix_unchecked(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn mirror_is_detected() {
        let mut rows = [0.0; 16];
        rows[0] = -1.0;
        rows[5] = 1.0;
        rows[10] = 1.0;
        rows[15] = 1.0;
        let t = affine_from_rows(rows).unwrap();
        assert!(is_flipped(&t));
        assert!(!is_flipped(&Affine3::identity()));
    }

    #[test]
    fn projective_rows_are_rejected() {
        let mut rows = [0.0; 16];
        rows[0] = 1.0;
        rows[5] = 1.0;
        rows[10] = 1.0;
        rows[14] = 0.5;
        rows[15] = 1.0;
        assert!(matches!(
            affine_from_rows(rows),
            Err(GeometryError::NotAffine)
        ));
    }

    #[test]
    fn quarter_turn_rotates_about_pivot() {
        let t = quarter_turn_about(Point2::new(10.0, 5.0));
        let p = t.transform_point(&Point2::new(12.0, 5.0));
        assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 7.0, epsilon = 1e-12);
        let pivot = t.transform_point(&Point2::new(10.0, 5.0));
        assert_eq!(pivot, Point2::new(10.0, 5.0));
    }

    #[test]
    fn flip_scale_maps_top_edge_to_height() {
        let t = scale_with_flip(0.5, Some(100.0));
        let p = t.transform_point(&Point2::new(20.0, 0.0));
        assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 50.0, epsilon = 1e-12);
        assert!(is_flipped_2d(&t));
    }
}
