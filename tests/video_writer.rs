//! End-to-end encoding through FFmpeg.
//!
//! Tests skip themselves when the codec is not built into the local FFmpeg.

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use stillreel::{
    EncodeJob, FfmpegLogLevel, FfmpegSink, FrameSink, FrameSourceOptions, SequenceEncoder,
    StillreelError, VideoCodec, YuvFrame,
};

fn write_frames(directory: &Path, count: u32, size: u32) {
    for index in 0..count {
        RgbImage::from_fn(size, size, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, (index * 60) as u8])
        })
        .save(directory.join(format!("frame_{index:03}.png")))
        .expect("write fixture");
    }
}

fn encoder_unavailable<T>(result: &Result<T, StillreelError>) -> bool {
    if let Err(StillreelError::EncoderSetupFailed(message)) = result {
        eprintln!("Skipping: encoder not available ({message})");
        return true;
    }
    false
}

#[test]
fn encode_three_frames_to_mp4() {
    stillreel::set_ffmpeg_log_level(FfmpegLogLevel::Error);
    let input = tempfile::tempdir().expect("temp dir");
    let output_dir = tempfile::tempdir().expect("temp dir");
    write_frames(input.path(), 3, 64);
    let output = output_dir.path().join("out.mp4");

    let frames = stillreel::list_frames(input.path(), &FrameSourceOptions::new()).unwrap();
    let job = EncodeJob::new(&output, 64, 64)
        .fps(10)
        .bitrate(4_000_000)
        .codec(VideoCodec::Mpeg4);
    let result = SequenceEncoder::new(job).encode_all(&frames);
    if encoder_unavailable(&result) {
        return;
    }

    assert_eq!(result.expect("encode"), 3);
    let size = fs::metadata(&output).expect("output exists").len();
    assert!(size > 0, "output file should be non-empty");
}

#[test]
fn failed_job_removes_partial_output() {
    stillreel::set_ffmpeg_log_level(FfmpegLogLevel::Quiet);
    let input = tempfile::tempdir().expect("temp dir");
    let output_dir = tempfile::tempdir().expect("temp dir");
    write_frames(input.path(), 2, 64);
    fs::write(input.path().join("frame_001.png"), b"not a png").unwrap();
    let output = output_dir.path().join("broken.mp4");

    let frames = stillreel::list_frames(input.path(), &FrameSourceOptions::new()).unwrap();
    let result = SequenceEncoder::new(EncodeJob::new(&output, 64, 64)).encode_all(&frames);
    if encoder_unavailable(&result) {
        return;
    }

    let error = result.unwrap_err();
    assert!(matches!(
        error,
        StillreelError::FrameFailed {
            frame_index: 1,
            frames_submitted: 1,
            ..
        }
    ));
    assert!(!output.exists(), "partial output should be removed");
}

#[test]
fn sink_rejects_frames_of_the_wrong_size() {
    stillreel::set_ffmpeg_log_level(FfmpegLogLevel::Quiet);
    let output_dir = tempfile::tempdir().expect("temp dir");
    let output = output_dir.path().join("size.mp4");

    let mut sink = FfmpegSink::new();
    let begin = sink.begin(&EncodeJob::new(&output, 64, 64), 1);
    if encoder_unavailable(&begin) {
        return;
    }
    begin.expect("begin");

    let frame = YuvFrame::from_planes(32, 32, vec![128; 32 * 32 * 3 / 2]).unwrap();
    let result = sink.submit(frame, 0);
    assert!(matches!(
        result,
        Err(StillreelError::EncoderSubmissionFailed(_))
    ));
    sink.abort();
    assert!(!output.exists());
}

#[test]
fn second_begin_keeps_the_open_output() {
    stillreel::set_ffmpeg_log_level(FfmpegLogLevel::Quiet);
    let output_dir = tempfile::tempdir().expect("temp dir");
    let first = output_dir.path().join("first.mp4");
    let second = output_dir.path().join("second.mp4");

    let mut sink = FfmpegSink::new();
    let begin = sink.begin(&EncodeJob::new(&first, 64, 64), 1);
    if encoder_unavailable(&begin) {
        return;
    }
    begin.expect("begin");

    let refused = sink.begin(&EncodeJob::new(&second, 64, 64), 1);
    assert!(matches!(refused, Err(StillreelError::EncoderSetupFailed(_))));
    assert!(first.exists(), "open output must survive a refused begin");
    assert!(!second.exists());

    let frame = YuvFrame::from_planes(64, 64, vec![128; 64 * 64 * 3 / 2]).unwrap();
    sink.submit(frame, 0).expect("submit");
    sink.finish().expect("finish");
    assert!(fs::metadata(&first).expect("output exists").len() > 0);
}

#[test]
fn submit_without_begin_fails() {
    let mut sink = FfmpegSink::new();
    let frame = YuvFrame::from_planes(2, 2, vec![0; 6]).unwrap();
    assert!(matches!(
        sink.submit(frame, 0),
        Err(StillreelError::EncoderSubmissionFailed(_))
    ));
    assert!(sink.finish().is_err());
    sink.abort();
}
