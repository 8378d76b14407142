use image::{imageops, DynamicImage, Rgba, RgbaImage};
use imageproc::drawing;
use panorama::{
    register, Akaze, CachePolicy, DetectAndDescribe, StitchError, StitchSettings, Stitcher,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::cell::Cell;

/// A strip of blobby texture that gives AKAZE plenty to respond to.
fn textured_strip(width: u32, height: u32, seed: u64) -> RgbaImage {
    let mut strip = RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255]));
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    for _ in 0..(width * height / 700) {
        let center = (
            rng.gen_range(0..width) as i32,
            rng.gen_range(0..height) as i32,
        );
        let radius = rng.gen_range(3..10);
        let shade = rng.gen::<u8>();
        drawing::draw_filled_circle_mut(&mut strip, center, radius, Rgba([shade, shade, shade, 255]));
    }
    strip
}

/// Two equally sized frames of a horizontal panorama: the same textured
/// strip sits at the right edge of the left frame and the left edge of the
/// right frame, with featureless solid color elsewhere.
fn overlapping_pair(width: u32, height: u32, overlap: u32) -> (DynamicImage, DynamicImage) {
    let strip = textured_strip(overlap, height, 5);
    let mut left = RgbaImage::from_pixel(width, height, Rgba([60, 70, 90, 255]));
    let mut right = RgbaImage::from_pixel(width, height, Rgba([170, 150, 120, 255]));
    imageops::replace(&mut left, &strip, (width - overlap) as i64, 0);
    imageops::replace(&mut right, &strip, 0, 0);
    (
        DynamicImage::ImageRgba8(left),
        DynamicImage::ImageRgba8(right),
    )
}

#[test]
fn stitches_a_synthetic_panorama() {
    pretty_env_logger::try_init().ok();
    let (left, right) = overlapping_pair(1024, 768, 200);

    // Registration on its own must find the known translation between the
    // frames: a right-frame strip point sits 824 pixels to the left of the
    // same point in the left frame.
    let akaze = Akaze::default();
    let (moving_keypoints, moving_descriptors) = akaze.detect_and_describe(&right).unwrap();
    let (reference_keypoints, reference_descriptors) = akaze.detect_and_describe(&left).unwrap();
    let registration = register(
        &moving_keypoints,
        &moving_descriptors,
        &reference_keypoints,
        &reference_descriptors,
        0.75,
        4.0,
    )
    .expect("failed to register overlapping frames");
    assert!(registration.inlier_count() >= 4);
    let homography = registration.homography.normalize();
    assert!((homography.0[(0, 2)] - 824.0).abs() < 5.0);
    assert!(homography.0[(1, 2)].abs() < 5.0);

    let mut stitcher = Stitcher::new();
    let pano = stitcher
        .stitch(&left, &right, &StitchSettings::default())
        .unwrap()
        .expect("failed to stitch overlapping frames");
    assert_eq!(pano.dimensions(), (2048, 768));

    // The reference frame is copied into the top-left corner bit-for-bit.
    let left = left.to_rgba8();
    for y in 0..left.height() {
        for x in 0..left.width() {
            assert_eq!(pano.get_pixel(x, y), left.get_pixel(x, y));
        }
    }
}

struct CountingBackend<B> {
    inner: B,
    calls: Cell<usize>,
}

impl<B: DetectAndDescribe> DetectAndDescribe for CountingBackend<B> {
    fn detect_and_describe(
        &self,
        image: &DynamicImage,
    ) -> Result<(Vec<panorama::KeyPoint>, Vec<panorama::BitArray<64>>), StitchError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.detect_and_describe(image)
    }
}

#[test]
fn cached_homography_skips_re_registration() {
    let (left, right) = overlapping_pair(512, 384, 160);
    let settings = StitchSettings::default();
    let mut stitcher = Stitcher::with_backend(CountingBackend {
        inner: Akaze::default(),
        calls: Cell::new(0),
    });

    let first = stitcher
        .stitch(&left, &right, &settings)
        .unwrap()
        .expect("failed to stitch");
    assert_eq!(stitcher.backend.calls.get(), 2);
    assert!(stitcher.cached_homography().is_some());

    // The second call must reuse the cached homography: same output, no new
    // backend calls.
    let second = stitcher
        .stitch(&left, &right, &settings)
        .unwrap()
        .expect("failed to stitch");
    assert_eq!(stitcher.backend.calls.get(), 2);
    assert_eq!(first.as_raw(), second.as_raw());

    // Invalidation forces one more registration.
    stitcher.invalidate();
    assert!(stitcher.cached_homography().is_none());
    let third = stitcher
        .stitch(&left, &right, &settings)
        .unwrap()
        .expect("failed to stitch");
    assert_eq!(stitcher.backend.calls.get(), 4);
    assert_eq!(first.as_raw(), third.as_raw());
}

#[test]
fn every_frame_policy_always_registers() {
    let (left, right) = overlapping_pair(512, 384, 160);
    let settings = StitchSettings::default();
    let mut stitcher = Stitcher::with_backend(CountingBackend {
        inner: Akaze::default(),
        calls: Cell::new(0),
    });
    stitcher.policy = CachePolicy::EveryFrame;

    stitcher.stitch(&left, &right, &settings).unwrap().unwrap();
    stitcher.stitch(&left, &right, &settings).unwrap().unwrap();
    assert_eq!(stitcher.backend.calls.get(), 4);
}

#[test]
fn images_without_shared_content_do_not_stitch() {
    let left = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        256,
        192,
        Rgba([90, 90, 90, 255]),
    ));
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
    let right = DynamicImage::ImageRgba8(RgbaImage::from_fn(256, 192, |_, _| {
        let shade = rng.gen::<u8>();
        Rgba([shade, shade, shade, 255])
    }));

    let mut stitcher = Stitcher::new();
    let result = stitcher
        .stitch(&left, &right, &StitchSettings::default())
        .unwrap();
    assert!(result.is_none());
    assert!(stitcher.cached_homography().is_none());
}

#[test]
fn out_of_range_settings_are_rejected() {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])));
    let mut stitcher = Stitcher::new();

    for ratio in [0.0, 1.0, -0.5, 1.5] {
        let settings = StitchSettings {
            ratio,
            ..Default::default()
        };
        assert!(matches!(
            stitcher.stitch(&image, &image, &settings),
            Err(StitchError::InvalidRatio(_))
        ));
    }

    let settings = StitchSettings {
        reproj_threshold: -1.0,
        ..Default::default()
    };
    assert!(matches!(
        stitcher.stitch(&image, &image, &settings),
        Err(StitchError::InvalidReprojectionThreshold(_))
    ));
}

#[test]
fn zero_sized_images_are_rejected() {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])));
    let empty = DynamicImage::new_rgba8(0, 0);
    let mut stitcher = Stitcher::new();
    assert!(matches!(
        stitcher.stitch(&image, &empty, &StitchSettings::default()),
        Err(StitchError::InvalidImageDimensions { .. })
    ));
    assert!(matches!(
        stitcher.stitch(&empty, &image, &StitchSettings::default()),
        Err(StitchError::InvalidImageDimensions { .. })
    ));
}
