use crate::StitchError;
pub use akaze::Akaze;
use bitarray::BitArray;
use image::DynamicImage;
use stitch_core::{nalgebra::Point2, KeyPoint};

/// The capability surface the stitching pipeline needs from a feature
/// detector/descriptor backend.
///
/// A backend takes one image and produces keypoint locations along with
/// binary descriptors, aligned by index. The ordering of the returned
/// vectors is backend-defined and may change between backend versions;
/// callers must only rely on the index alignment between the two.
///
/// The backend is selected when the [`Stitcher`](crate::Stitcher) is
/// constructed, never per call.
pub trait DetectAndDescribe {
    /// Detects keypoints in `image` and computes a descriptor for each.
    ///
    /// Any needed grayscale conversion happens inside the backend. A backend
    /// that cannot process the image fails with
    /// [`StitchError::UnsupportedBackend`].
    fn detect_and_describe(
        &self,
        image: &DynamicImage,
    ) -> Result<(Vec<KeyPoint>, Vec<BitArray<64>>), StitchError>;
}

impl DetectAndDescribe for Akaze {
    fn detect_and_describe(
        &self,
        image: &DynamicImage,
    ) -> Result<(Vec<KeyPoint>, Vec<BitArray<64>>), StitchError> {
        let (keypoints, descriptors) = self.extract(image);
        // Only the locations are retained; akaze's scale, orientation, and
        // response are of no further use to registration.
        let keypoints = keypoints
            .iter()
            .map(|keypoint| KeyPoint(Point2::new(keypoint.point.0 as f64, keypoint.point.1 as f64)))
            .collect::<Vec<_>>();
        debug_assert_eq!(keypoints.len(), descriptors.len());
        Ok((keypoints, descriptors))
    }
}
