//! Parallel frame preparation example (feature = "rayon").
//!
//! Usage:
//!   cargo run --features=rayon --example rayon -- <frame_directory> [output.mp4]

use std::error::Error;
use std::time::Instant;

use stillreel::{EncodeJob, EncodeOptions, FfmpegSink, FrameSourceOptions, SequenceEncoder};

fn main() -> Result<(), Box<dyn Error>> {
    let directory = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "frames".to_string());
    let output = std::env::args()
        .nth(2)
        .unwrap_or_else(|| "parallel.mp4".to_string());

    let frames = stillreel::list_frames(&directory, &FrameSourceOptions::new())?;
    let first = frames.get(0).ok_or("no frames found")?;
    let (width, height) = stillreel::probe_dimensions(first)?;

    println!("Encoding {} frames on {} threads...", frames.len(), rayon::current_num_threads());
    let start = Instant::now();
    let mut sink = FfmpegSink::new();
    let submitted = SequenceEncoder::new(EncodeJob::new(&output, width, height))
        .encode_into_parallel(frames.as_slice(), &mut sink, &EncodeOptions::new())?;
    let elapsed = start.elapsed();

    println!(
        "Encoded {submitted} frames in {elapsed:.2?} ({:.1} fps)",
        submitted as f64 / elapsed.as_secs_f64(),
    );
    Ok(())
}
