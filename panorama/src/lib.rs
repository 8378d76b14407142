//! Two-image panorama stitching.
//!
//! The pipeline registers a *moving* image onto a *reference* image by
//! detecting AKAZE features in both, matching their binary descriptors with
//! a ratio test, robustly fitting a [`Homography`] with ARRSAC over the
//! [`four_point`] estimator, and finally warping the moving image onto a
//! shared canvas where the reference occupies the top-left corner.
//!
//! Registration is by far the most expensive step, so the [`Stitcher`] keeps
//! the homography of its first successful registration and reuses it for
//! every later call. That is the right trade for a fixed camera pair (a
//! static rig): geometry does not change between frames, so features only
//! need to be matched once. See [`CachePolicy`] for the alternatives and
//! [`Stitcher::invalidate`] to drop the cached transform explicitly.
//!
//! ```no_run
//! use panorama::{StitchSettings, Stitcher};
//!
//! let left = image::open("left.jpg").unwrap();
//! let right = image::open("right.jpg").unwrap();
//! let mut stitcher = Stitcher::new();
//! match stitcher.stitch(&left, &right, &StitchSettings::default()).unwrap() {
//!     Some(pano) => pano.save("panorama.png").unwrap(),
//!     None => eprintln!("images do not overlap enough to register"),
//! }
//! ```

mod backend;
mod compose;
mod matching;

pub use backend::{Akaze, DetectAndDescribe};
pub use bitarray::BitArray;
pub use matching::{register, Registration};
pub use stitch_core::{FeatureMatch, Homography, ImagePoint, KeyPoint};

use image::{DynamicImage, GenericImageView, RgbaImage};
use log::*;
use thiserror::Error;

/// Hard failures of the stitching pipeline.
///
/// Failing to register two images is *not* an error: it is the `Ok(None)`
/// outcome of [`Stitcher::stitch`], which a caller can respond to by trying
/// different settings. Errors are reserved for calls that could never
/// succeed regardless of image content.
#[derive(Debug, Error)]
pub enum StitchError {
    #[error("image has degenerate dimensions {width}x{height}")]
    InvalidImageDimensions { width: u32, height: u32 },
    #[error("ratio must lie strictly between 0 and 1, got {0}")]
    InvalidRatio(f32),
    #[error("reprojection threshold must be a non-negative number of pixels, got {0}")]
    InvalidReprojectionThreshold(f64),
    #[error("feature backend cannot process the image: {0}")]
    UnsupportedBackend(String),
}

/// Tunable parameters of one stitch call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StitchSettings {
    /// Lowe's ratio test strictness, in `(0, 1)`. Smaller is stricter.
    pub ratio: f32,
    /// Maximum reprojection error in pixels for a correspondence to count as
    /// an inlier during robust fitting. Must be non-negative.
    pub reproj_threshold: f64,
}

impl Default for StitchSettings {
    fn default() -> Self {
        Self {
            ratio: 0.75,
            reproj_threshold: 4.0,
        }
    }
}

impl StitchSettings {
    fn validate(&self) -> Result<(), StitchError> {
        if !(self.ratio > 0.0 && self.ratio < 1.0) {
            return Err(StitchError::InvalidRatio(self.ratio));
        }
        if !(self.reproj_threshold >= 0.0) {
            return Err(StitchError::InvalidReprojectionThreshold(
                self.reproj_threshold,
            ));
        }
        Ok(())
    }
}

/// Governs when a [`Stitcher`] re-registers its input images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Register once and reuse the homography forever. Correct for a fixed
    /// camera pair; a camera that moves after the first call will produce
    /// increasingly wrong panoramas until [`Stitcher::invalidate`] is
    /// called.
    StaticScene,
    /// Register on every call. Nothing is ever reused, so every call pays
    /// the full feature extraction and matching cost.
    EveryFrame,
}

/// Stitches two overlapping photographs into a single panorama.
///
/// The stitcher owns the feature backend and the cached homography, so
/// `stitch` takes `&mut self`: exclusive access is what makes the
/// check-then-store of the cache slot safe. To share a stitcher between
/// threads, wrap it in a `Mutex`.
pub struct Stitcher<B = Akaze> {
    /// The feature detector/descriptor backend, chosen at construction.
    pub backend: B,
    /// When the stitcher re-registers. Defaults to [`CachePolicy::StaticScene`].
    pub policy: CachePolicy,
    cached: Option<Homography>,
}

impl Stitcher<Akaze> {
    /// A stitcher using AKAZE with default thresholds.
    pub fn new() -> Self {
        Self::with_backend(Akaze::default())
    }
}

impl Default for Stitcher<Akaze> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Stitcher<B> {
    /// A stitcher using a custom feature backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            policy: CachePolicy::StaticScene,
            cached: None,
        }
    }

    /// The homography from the most recent successful registration, if any.
    pub fn cached_homography(&self) -> Option<Homography> {
        self.cached
    }

    /// Drops the cached homography so the next call re-registers.
    ///
    /// This is the only way a [`CachePolicy::StaticScene`] stitcher ever
    /// recomputes its transform; call it after the camera geometry changes.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

impl<B: DetectAndDescribe> Stitcher<B> {
    /// Stitches `moving` onto `reference` and returns the composited
    /// panorama.
    ///
    /// `reference` is the left frame and is copied verbatim into the
    /// top-left of the output; `moving` is the right frame and is warped
    /// onto the reference plane. The output canvas is
    /// `(moving.width + reference.width) x moving.height`.
    ///
    /// Returns `Ok(None)` when the images cannot be registered, either
    /// because fewer than four candidate correspondences survived the ratio
    /// test or because robust fitting found no acceptable homography. The
    /// caller can retry with different [`StitchSettings`].
    ///
    /// # Errors
    ///
    /// Fails fast on out-of-range settings or zero-sized images, and
    /// propagates any backend failure.
    pub fn stitch(
        &mut self,
        reference: &DynamicImage,
        moving: &DynamicImage,
        settings: &StitchSettings,
    ) -> Result<Option<RgbaImage>, StitchError> {
        settings.validate()?;
        for image in [reference, moving] {
            let (width, height) = image.dimensions();
            if width == 0 || height == 0 {
                return Err(StitchError::InvalidImageDimensions { width, height });
            }
        }

        if self.policy == CachePolicy::EveryFrame || self.cached.is_none() {
            let (moving_keypoints, moving_descriptors) =
                self.backend.detect_and_describe(moving)?;
            let (reference_keypoints, reference_descriptors) =
                self.backend.detect_and_describe(reference)?;
            info!(
                "extracted {} moving and {} reference features",
                moving_keypoints.len(),
                reference_keypoints.len()
            );
            let registration = match matching::register(
                &moving_keypoints,
                &moving_descriptors,
                &reference_keypoints,
                &reference_descriptors,
                settings.ratio,
                settings.reproj_threshold,
            ) {
                Some(registration) => registration,
                None => return Ok(None),
            };
            self.cached = Some(registration.homography);
        } else {
            debug!("reusing cached homography");
        }

        let homography = match self.cached {
            Some(homography) => homography,
            // Unreachable: the branch above either filled the slot or
            // returned early.
            None => return Ok(None),
        };
        Ok(compose::composite(
            &reference.to_rgba8(),
            &moving.to_rgba8(),
            &homography,
        ))
    }
}
