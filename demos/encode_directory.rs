//! Encode a directory of images into a video.
//!
//! Usage:
//!   cargo run --example encode_directory -- <frame_directory> [output.mp4]

use std::error::Error;

use stillreel::{EncodeJob, FrameSourceOptions, SequenceEncoder};

fn main() -> Result<(), Box<dyn Error>> {
    let directory = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "frames".to_string());
    let output = std::env::args()
        .nth(2)
        .unwrap_or_else(|| "output.mp4".to_string());

    let frames = stillreel::list_frames(&directory, &FrameSourceOptions::new())?;
    let first = frames.get(0).ok_or("no frames found")?;
    let (width, height) = stillreel::probe_dimensions(first)?;
    println!("Found {} frames at {width}x{height} in {directory}", frames.len());

    let job = EncodeJob::new(&output, width, height)
        .fps(10)
        .bitrate(4_000_000);
    let submitted = SequenceEncoder::new(job).encode_all(&frames)?;

    println!("Wrote {submitted} frames to {output}");
    Ok(())
}
