use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use itertools::Itertools;
use log::*;
use stitch_core::Homography;

/// Warps the moving image onto the panorama canvas and lays the reference
/// image over the top-left corner.
///
/// The canvas is sized `(moving.width + reference.width, moving.height)`, a
/// heuristic that assumes a roughly horizontal panorama; it is not a general
/// canvas computation. Reference pixels always win in the overlap region, so
/// the seam is visible where the exposure of the two photographs differs.
/// Reference rows below the canvas height are cropped.
///
/// Returns `None` if the homography cannot be inverted for resampling, which
/// registration normally rules out.
pub(crate) fn composite(
    reference: &RgbaImage,
    moving: &RgbaImage,
    homography: &Homography,
) -> Option<RgbaImage> {
    let h = &homography.0;
    #[rustfmt::skip]
    let projection = Projection::from_matrix([
        h[(0, 0)] as f32, h[(0, 1)] as f32, h[(0, 2)] as f32,
        h[(1, 0)] as f32, h[(1, 1)] as f32, h[(1, 2)] as f32,
        h[(2, 0)] as f32, h[(2, 1)] as f32, h[(2, 2)] as f32,
    ])?;

    let canvas_width = moving.width() + reference.width();
    let canvas_height = moving.height();
    trace!("compositing onto a {}x{} canvas", canvas_width, canvas_height);
    let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, Rgba([0, 0, 0, 255]));
    warp_into(
        moving,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 255]),
        &mut canvas,
    );

    // Hard overwrite, no blending: the reference frame is taken as-is.
    let overlay_height = reference.height().min(canvas_height);
    for (x, y) in (0..reference.width()).cartesian_product(0..overlay_height) {
        canvas.put_pixel(x, y, *reference.get_pixel(x, y));
    }
    Some(canvas)
}
