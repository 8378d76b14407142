use panorama::{StitchSettings, Stitcher};

fn main() {
    let args: Vec<_> = std::env::args().collect();
    let [left, right] = &args[1..] else {
        eprintln!("usage: stitch <left-image> <right-image>");
        std::process::exit(2);
    };
    let left = image::open(left).expect("failed to open left image");
    let right = image::open(right).expect("failed to open right image");
    let mut stitcher = Stitcher::new();
    match stitcher
        .stitch(&left, &right, &StitchSettings::default())
        .expect("stitching failed")
    {
        Some(pano) => pano.save("panorama.png").expect("failed to save panorama"),
        None => eprintln!("not enough matched keypoints to create a panorama"),
    }
}
