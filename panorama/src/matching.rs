use arrsac::Arrsac;
use bitarray::{BitArray, Hamming};
use four_point::FourPoint;
use log::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use space::{Knn, LinearKnn};
use stitch_core::{sample_consensus::Consensus, FeatureMatch, Homography, KeyPoint};

/// A projective transform needs at least this many correspondences.
const MIN_MATCHES: usize = 4;

/// Registration is seeded so that repeated runs on the same input produce
/// the same homography.
const CONSENSUS_SEED: u64 = 0;

/// The outcome of registering the moving image onto the reference image.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Every correspondence that passed the ratio test, in moving-then-
    /// reference order.
    pub matches: Vec<FeatureMatch<KeyPoint>>,
    /// The homography fitted over the inlier correspondences. Always
    /// invertible.
    pub homography: Homography,
    /// Inlier/outlier classification for each entry of `matches`, aligned by
    /// index.
    pub inlier_mask: Vec<bool>,
}

impl Registration {
    /// The number of correspondences consistent with the homography.
    pub fn inlier_count(&self) -> usize {
        self.inlier_mask.iter().filter(|&&inlier| inlier).count()
    }
}

/// This function performs non-symmetric matching from `a` to `b` with a
/// ratio test.
///
/// For every descriptor in `a`, the two nearest descriptors in `b` are
/// found, and the pairing is kept only when the best distance beats `ratio`
/// times the second-best distance. When two candidates are nearly
/// equidistant, the pairing is ambiguous and discarding it is much cheaper
/// than letting robust fitting sort it out later. Smaller ratios are
/// stricter; `0.75` works well for AKAZE's binary descriptors.
pub(crate) fn ratio_matches(
    a_descriptors: &[BitArray<64>],
    b_descriptors: &[BitArray<64>],
    ratio: f32,
) -> Vec<[usize; 2]> {
    // The ratio test needs a best and a second-best candidate.
    if b_descriptors.len() < 2 {
        return Vec::new();
    }
    let knn_b = LinearKnn {
        metric: Hamming,
        iter: b_descriptors.iter(),
    };
    (0..a_descriptors.len())
        .filter_map(|a_feature| {
            let knn = knn_b.knn(&a_descriptors[a_feature], 2);
            if (knn[0].distance as f32) < ratio * knn[1].distance as f32 {
                Some([a_feature, knn[0].index])
            } else {
                None
            }
        })
        .collect()
}

/// Matches the two feature sets and robustly fits the homography taking
/// moving-image pixel coordinates onto the reference image plane.
///
/// `ratio` is the ratio-test strictness in `(0, 1)` and `reproj_threshold`
/// is the maximum reprojection error in pixels for a correspondence to count
/// as an inlier.
///
/// Returns `None` when fewer than four correspondences survive the ratio
/// test, or when consensus fails to produce an invertible homography. The
/// two cases are deliberately indistinguishable: either way the images
/// cannot be registered.
pub fn register(
    moving_keypoints: &[KeyPoint],
    moving_descriptors: &[BitArray<64>],
    reference_keypoints: &[KeyPoint],
    reference_descriptors: &[BitArray<64>],
    ratio: f32,
    reproj_threshold: f64,
) -> Option<Registration> {
    debug_assert_eq!(moving_keypoints.len(), moving_descriptors.len());
    debug_assert_eq!(reference_keypoints.len(), reference_descriptors.len());

    let indices = ratio_matches(moving_descriptors, reference_descriptors, ratio);
    info!(
        "{} of {} descriptors passed the ratio test",
        indices.len(),
        moving_descriptors.len()
    );
    if indices.len() < MIN_MATCHES {
        return None;
    }
    let matches = indices
        .iter()
        .map(|&[a, b]| FeatureMatch(moving_keypoints[a], reference_keypoints[b]))
        .collect::<Vec<_>>();

    let mut consensus = Arrsac::new(
        reproj_threshold,
        Xoshiro256PlusPlus::seed_from_u64(CONSENSUS_SEED),
    );
    let (homography, inliers) =
        consensus.model_inliers(&FourPoint::new(), matches.iter().copied())?;
    if !homography.is_invertible() {
        return None;
    }
    let mut inlier_mask = vec![false; matches.len()];
    for inlier in inliers {
        inlier_mask[inlier] = true;
    }
    let registration = Registration {
        matches,
        homography,
        inlier_mask,
    };
    info!(
        "registration kept {} of {} matches as inliers",
        registration.inlier_count(),
        registration.matches.len()
    );
    Some(registration)
}
