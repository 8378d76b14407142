/// A candidate correspondence between two images.
///
/// `.0` is the keypoint in the moving image and `.1` is the keypoint it was
/// matched to in the reference image. A correspondence is produced by
/// descriptor matching and is not guaranteed to be correct; robust fitting
/// decides which correspondences are inliers.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FeatureMatch<P>(pub P, pub P);
