//! Check every frame of a directory before encoding.
//!
//! Usage:
//!   cargo run --example validate -- <frame_directory>

use std::error::Error;

use stillreel::FrameSourceOptions;

fn main() -> Result<(), Box<dyn Error>> {
    let directory = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "frames".to_string());

    let frames = stillreel::list_frames(&directory, &FrameSourceOptions::new())?;
    let report = stillreel::validate_frames(&frames, None);

    println!("Validation report for {directory}:");
    print!("{report}");
    println!("Valid: {}", report.is_valid());
    println!("Total issues: {}", report.issue_count());
    Ok(())
}
