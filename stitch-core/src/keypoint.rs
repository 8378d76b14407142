use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::Point2;

/// Allows the retrieval of the point on the image the feature came from.
pub trait ImagePoint {
    /// Retrieves the point on the image
    fn image_point(&self) -> Point2<f64>;
}

/// A point on an image frame where a salient feature was detected, in pixel
/// coordinates. `+x` faces right and `+y` faces toward the bottom of the
/// image, with the origin in the top-left corner.
///
/// Detector state such as orientation, scale, and response is discarded when
/// a detector's native keypoint is converted to this type; the stitching
/// pipeline only ever needs the location.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
pub struct KeyPoint(pub Point2<f64>);

impl ImagePoint for KeyPoint {
    fn image_point(&self) -> Point2<f64> {
        self.0
    }
}
