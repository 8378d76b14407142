use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageOutputFormat};
use log::*;
use panorama::{StitchSettings, Stitcher};
use std::path::PathBuf;
use structopt::StructOpt;

fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let (width, height) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", s))?;
    let width = width.parse().map_err(|e| format!("bad width: {}", e))?;
    let height = height.parse().map_err(|e| format!("bad height: {}", e))?;
    Ok((width, height))
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "panostitch",
    about = "A tool to stitch two overlapping photographs into a panorama"
)]
struct Opt {
    /// Lowe's ratio test strictness in (0, 1).
    ///
    /// Smaller values discard more ambiguous matches.
    #[structopt(long, default_value = "0.75")]
    ratio: f32,
    /// Maximum reprojection error in pixels for an inlier correspondence.
    #[structopt(long, default_value = "4.0")]
    reproj_threshold: f64,
    /// Resize both inputs to WIDTHxHEIGHT (e.g. 1024x768) before stitching.
    #[structopt(long, parse(try_from_str = parse_dimensions))]
    resize: Option<(u32, u32)>,
    /// The output path to write to (autodetects image type from extension).
    ///
    /// If this is not provided, then the output goes to stdout as a PNG.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
    /// Open the panorama with the system's default image viewer.
    #[structopt(long)]
    show: bool,
    /// The left image; it becomes the reference frame of the panorama.
    #[structopt(parse(from_os_str))]
    left: PathBuf,
    /// The right image; it is warped onto the reference frame.
    #[structopt(parse(from_os_str))]
    right: PathBuf,
}

fn load(path: &PathBuf, resize: Option<(u32, u32)>) -> DynamicImage {
    let image = image::open(path).expect("failed to open image file");
    match resize {
        Some((width, height)) => image.resize_exact(width, height, FilterType::Triangle),
        None => image,
    }
}

fn main() {
    pretty_env_logger::init();
    let opt = Opt::from_args();
    let left = load(&opt.left, opt.resize);
    let right = load(&opt.right, opt.resize);
    info!(
        "stitching {}x{} and {}x{}",
        left.width(),
        left.height(),
        right.width(),
        right.height()
    );

    let settings = StitchSettings {
        ratio: opt.ratio,
        reproj_threshold: opt.reproj_threshold,
    };
    let mut stitcher = Stitcher::new();
    let pano = match stitcher.stitch(&left, &right, &settings) {
        Ok(Some(pano)) => DynamicImage::ImageRgba8(pano),
        Ok(None) => {
            error!("not enough matched keypoints to create a panorama");
            std::process::exit(1);
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &opt.output {
        pano.save(path).expect("failed to write output image");
    }
    if opt.show {
        // Applications may spawn in the background and take a while to open
        // the image, so the temporary file has to outlive this process by a
        // grace period.
        let path = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("failed to create temporary file")
            .into_temp_path();
        pano.save(&path).expect("failed to write temporary image");
        open::that(&path).expect("failed to open image viewer");
        std::thread::sleep(std::time::Duration::from_secs(5));
    }
    if opt.output.is_none() && !opt.show {
        // `write_to` needs a seekable writer, which stdout is not.
        let mut encoded = std::io::Cursor::new(Vec::new());
        pano.write_to(&mut encoded, ImageOutputFormat::Png)
            .expect("failed to encode panorama");
        std::io::Write::write_all(&mut std::io::stdout().lock(), encoded.get_ref())
            .expect("failed to write image to stdout");
    }
}
