#![no_std]

use float_ord::FloatOrd;
use num_traits::Float;
use stitch_core::{
    nalgebra::{self, Matrix3, OMatrix, OVector, Vector2, U9},
    sample_consensus::Estimator,
    FeatureMatch, Homography, ImagePoint, KeyPoint,
};

/// Computes a Hartley normalization for a point cloud: a scale and centroid
/// such that the translated points have zero mean and an average distance
/// from the origin of `sqrt(2)`.
///
/// Returns `None` when there are fewer than four points or the points have
/// no spread, in which case no homography can be estimated.
fn normalization(
    points: impl Iterator<Item = Vector2<f64>> + Clone,
) -> Option<(f64, Vector2<f64>)> {
    let mut count = 0usize;
    let mut centroid = Vector2::zeros();
    for point in points.clone() {
        centroid += point;
        count += 1;
    }
    if count < 4 {
        return None;
    }
    let centroid = centroid / count as f64;
    let mut mean_distance = 0.0;
    for point in points {
        mean_distance += Float::sqrt((point - centroid).norm_squared());
    }
    mean_distance /= count as f64;
    if mean_distance <= f64::EPSILON {
        return None;
    }
    Some((core::f64::consts::SQRT_2 / mean_distance, centroid))
}

/// The similarity transform performing a normalization as a 3x3 matrix.
fn similarity(scale: f64, centroid: Vector2<f64>) -> Matrix3<f64> {
    Matrix3::new(
        scale,
        0.0,
        -scale * centroid.x,
        0.0,
        scale,
        -scale * centroid.y,
        0.0,
        0.0,
        1.0,
    )
}

/// Encodes the direct linear transform constraint `x' ~ H * x` over all of
/// the normalized correspondences as the 9x9 normal matrix `A^T * A`, where
/// each correspondence contributes two rows to the design matrix `A`. The
/// homography coefficients are ordered row-major in the solution vector.
fn encode_dlt_equation(
    matches: impl Iterator<Item = (Vector2<f64>, Vector2<f64>)>,
) -> OMatrix<f64, U9, U9> {
    let mut out: OMatrix<f64, U9, U9> = nalgebra::zero();
    for (a, b) in matches {
        let u = OVector::<f64, U9>::from_column_slice(&[
            -a.x,
            -a.y,
            -1.0,
            0.0,
            0.0,
            0.0,
            b.x * a.x,
            b.x * a.y,
            b.x,
        ]);
        let v = OVector::<f64, U9>::from_column_slice(&[
            0.0,
            0.0,
            0.0,
            -a.x,
            -a.y,
            -1.0,
            b.y * a.x,
            b.y * a.y,
            b.y,
        ]);
        out += &u * u.transpose() + &v * v.transpose();
    }
    out
}

/// Performs the four-point
/// [direct linear transformation](https://en.wikipedia.org/wiki/Direct_linear_transformation)
/// by Richard Hartley and Andrew Zisserman to estimate the homography
/// relating a set of correspondences.
///
/// Point sets are Hartley-normalized before the solve and the result is
/// de-normalized, which keeps the linear system well conditioned for pixel
/// coordinates. The returned homography is scaled so its bottom-right entry
/// is `1.0` and is guaranteed to be invertible.
#[derive(Copy, Clone, Debug)]
pub struct FourPoint {
    pub epsilon: f64,
    pub iterations: usize,
}

impl FourPoint {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_matches<I>(&self, data: I) -> Option<Homography>
    where
        I: Iterator<Item = FeatureMatch<KeyPoint>> + Clone,
    {
        let (scale_a, centroid_a) =
            normalization(data.clone().map(|FeatureMatch(a, _)| a.image_point().coords))?;
        let (scale_b, centroid_b) =
            normalization(data.clone().map(|FeatureMatch(_, b)| b.image_point().coords))?;
        let normalized = data.map(|FeatureMatch(a, b)| {
            (
                scale_a * (a.image_point().coords - centroid_a),
                scale_b * (b.image_point().coords - centroid_b),
            )
        });
        let design = encode_dlt_equation(normalized);
        let eigens = design.try_symmetric_eigen(self.epsilon, self.iterations)?;
        let h = eigens
            .eigenvalues
            .iter()
            .enumerate()
            .min_by_key(|&(_, &n)| FloatOrd(n))
            .map(|(ix, _)| eigens.eigenvectors.column(ix).into_owned())?;
        let normalized_homography =
            Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);
        let from_b = similarity(scale_b, centroid_b).try_inverse()?;
        let to_a = similarity(scale_a, centroid_a);
        let homography = Homography(from_b * normalized_homography * to_a).normalize();
        Some(homography).filter(Homography::is_invertible)
    }
}

impl Default for FourPoint {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            iterations: 1000,
        }
    }
}

impl Estimator<FeatureMatch<KeyPoint>> for FourPoint {
    type Model = Homography;
    type ModelIter = Option<Homography>;
    const MIN_SAMPLES: usize = 4;

    fn estimate<I>(&self, data: I) -> Self::ModelIter
    where
        I: Iterator<Item = FeatureMatch<KeyPoint>> + Clone,
    {
        self.from_matches(data)
    }
}
