//! # stitch-core
//!
//! This library provides the common types shared by the panorama stitching
//! crates: pixel-space keypoints, feature correspondences, and the planar
//! [`Homography`] that registers one image onto another. Estimation crates
//! (such as `four-point`) and the pipeline crate (`panorama`) all speak in
//! terms of these types so they can work together.
//!
//! The crate is designed to work with `#![no_std]` so that solvers built on
//! top of it can run without an allocator. `libm` is used (indirectly through
//! [`num-traits`]) for all math algorithms that aren't present in `std`.

#![no_std]

mod homography;
mod keypoint;
mod matches;

pub use homography::*;
pub use keypoint::*;
pub use matches::*;
pub use nalgebra;
pub use sample_consensus;
