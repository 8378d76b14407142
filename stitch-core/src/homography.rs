use crate::{FeatureMatch, ImagePoint, KeyPoint};
use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Matrix3, Point2, Vector3};
use num_traits::Float;
use sample_consensus::Model;

/// This stores a homography, a 3x3 projective transform between two views of
/// an approximately planar scene, which is satisfied by the following
/// constraint:
///
/// x' ~ H * x
///
/// Where `x` is a homogeneous pixel coordinate in the moving image, `x'` is
/// the homogeneous pixel coordinate of the same scene point in the reference
/// image plane, and `~` denotes equality up to scale. A homogeneous pixel
/// coordinate is obtained by appending `1.0` to a [`KeyPoint`].
///
/// Unlike the essential matrix, which only constrains a match to a line, the
/// homography predicts exactly where a point in one image lands in the other.
/// That makes its reprojection error a natural residual for robust fitting:
/// project the moving-image point through `H` and measure the Euclidean pixel
/// distance to the observed reference-image point.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, Deref, DerefMut, From, Into)]
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    /// Determinants smaller than this in absolute value are considered
    /// degenerate.
    pub const DEGENERACY_EPSILON: f64 = 1e-12;

    /// Projects a pixel coordinate from the moving image onto the reference
    /// image plane.
    ///
    /// Returns `None` if the point projects to infinity, which happens when
    /// the homogeneous scale factor vanishes.
    pub fn transform(&self, point: Point2<f64>) -> Option<Point2<f64>> {
        let projected = self.0 * Vector3::new(point.x, point.y, 1.0);
        if Float::abs(projected.z) <= Self::DEGENERACY_EPSILON {
            return None;
        }
        Some(Point2::new(
            projected.x / projected.z,
            projected.y / projected.z,
        ))
    }

    /// `true` when the matrix has a determinant meaningfully different from
    /// zero and therefore describes an invertible transform.
    pub fn is_invertible(&self) -> bool {
        Float::abs(self.0.determinant()) > Self::DEGENERACY_EPSILON
    }

    /// The homography mapping reference image coordinates back onto the
    /// moving image, if this homography is invertible.
    pub fn inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// Rescales the matrix so that the bottom-right entry is `1.0`.
    ///
    /// A homography is only defined up to scale, so this canonical form makes
    /// matrices comparable. If the bottom-right entry is nearly zero the
    /// matrix is returned unchanged.
    pub fn normalize(self) -> Self {
        let scale = self.0[(2, 2)];
        if Float::abs(scale) <= Self::DEGENERACY_EPSILON {
            self
        } else {
            Self(self.0 / scale)
        }
    }
}

impl Model<FeatureMatch<KeyPoint>> for Homography {
    fn residual(&self, data: &FeatureMatch<KeyPoint>) -> f64 {
        let &FeatureMatch(a, b) = data;

        match self.transform(a.image_point()) {
            Some(projected) => {
                let delta = b.image_point() - projected;
                Float::sqrt(delta.norm_squared())
            }
            // A point that projects to infinity can never be an inlier.
            None => f64::INFINITY,
        }
    }
}
