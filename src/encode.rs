//! Encoder sinks: where converted frames go.
//!
//! [`FrameSink`] is the seam between the frame pipeline and a bitstream
//! encoder. The pipeline calls [`begin`](FrameSink::begin) once, then
//! [`submit`](FrameSink::submit) for every frame in order, then either
//! [`finish`](FrameSink::finish) or, on any failure,
//! [`abort`](FrameSink::abort).
//!
//! [`FfmpegSink`] is the production sink. It encodes planar YUV 4:2:0
//! frames with FFmpeg into a container chosen by the output extension
//! (`.mp4`, `.mkv`, `.mpeg`, `.avi`, ...).

use std::fs;
use std::path::PathBuf;

use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::encoder::video::Encoder as VideoEncoder;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::{Packet, Rational};

use crate::conversion::YuvFrame;
use crate::error::StillreelError;
use crate::job::EncodeJob;

/// A consumer of planar YUV 4:2:0 frames.
pub trait FrameSink {
    /// Prepare to receive `frame_count` frames for `job`.
    ///
    /// On failure the sink cleans up whatever it created itself; the caller
    /// does not call [`abort`](FrameSink::abort). A refusal must leave any
    /// output that is already open untouched.
    fn begin(&mut self, job: &EncodeJob, frame_count: u64) -> Result<(), StillreelError>;

    /// Take ownership of frame `frame_index`. Indices arrive in order
    /// starting at zero.
    fn submit(&mut self, frame: YuvFrame, frame_index: u64) -> Result<(), StillreelError>;

    /// Flush and finalise the output.
    fn finish(&mut self) -> Result<(), StillreelError>;

    /// Abandon the output. Any partial file must not survive as if it were
    /// complete. Must be safe to call in any state.
    fn abort(&mut self);
}

/// Encodes frames into a video file with FFmpeg.
#[derive(Default)]
pub struct FfmpegSink {
    state: Option<OpenOutput>,
    output_path: Option<PathBuf>,
}

struct OpenOutput {
    output: Output,
    encoder: VideoEncoder,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    width: u32,
    height: u32,
}

impl FfmpegSink {
    /// A sink with no open output.
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&mut self, job: &EncodeJob) -> Result<OpenOutput, StillreelError> {
        ffmpeg_next::init()
            .map_err(|e| StillreelError::EncoderSetupFailed(format!("cannot initialise FFmpeg: {e}")))?;

        let codec_id = job.codec.to_codec_id();
        let encoder_codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            StillreelError::EncoderSetupFailed(format!("codec {codec_id:?} not available"))
        })?;

        let mut output = ffmpeg_next::format::output(&job.output).map_err(|e| {
            StillreelError::EncoderSetupFailed(format!(
                "cannot open output {}: {e}",
                job.output.display()
            ))
        })?;
        self.output_path = Some(job.output.clone());

        // Read before add_stream borrows the context.
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let mut stream = output
            .add_stream(encoder_codec)
            .map_err(|e| StillreelError::EncoderSetupFailed(format!("cannot add stream: {e}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.encoder().video())
            .map_err(|e| {
                StillreelError::EncoderSetupFailed(format!("cannot create video encoder: {e}"))
            })?;

        let time_base = Rational::new(1, job.fps as i32);
        encoder.set_width(job.width);
        encoder.set_height(job.height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(Rational::new(job.fps as i32, 1)));
        encoder.set_bit_rate(job.bitrate);

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = encoder
            .open_as(encoder_codec)
            .map_err(|e| StillreelError::EncoderSetupFailed(format!("cannot open encoder: {e}")))?;
        stream.set_parameters(&encoder);
        stream.set_time_base(time_base);

        output
            .write_header()
            .map_err(|e| StillreelError::EncoderSetupFailed(format!("cannot write header: {e}")))?;

        // The muxer may pick its own time base while writing the header.
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| StillreelError::EncoderSetupFailed("output stream vanished".to_string()))?;

        Ok(OpenOutput {
            output,
            encoder,
            stream_index,
            encoder_time_base: time_base,
            stream_time_base,
            width: job.width,
            height: job.height,
        })
    }
}

impl OpenOutput {
    fn write_frame(&mut self, frame: &YuvFrame, frame_index: u64) -> Result<(), StillreelError> {
        let mut video_frame = VideoFrame::new(Pixel::YUV420P, self.width, self.height);
        copy_plane(
            &mut video_frame,
            0,
            frame.y_plane(),
            frame.width() as usize,
            frame.height() as usize,
        );
        copy_plane(
            &mut video_frame,
            1,
            frame.u_plane(),
            frame.chroma_width() as usize,
            frame.chroma_height() as usize,
        );
        copy_plane(
            &mut video_frame,
            2,
            frame.v_plane(),
            frame.chroma_width() as usize,
            frame.chroma_height() as usize,
        );
        video_frame.set_pts(Some(frame_index as i64));

        self.encoder.send_frame(&video_frame).map_err(|e| {
            StillreelError::EncoderSubmissionFailed(format!("send_frame {frame_index} failed: {e}"))
        })?;
        self.drain_packets()
    }

    fn drain_packets(&mut self) -> Result<(), StillreelError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet.write_interleaved(&mut self.output).map_err(|e| {
                StillreelError::EncoderSubmissionFailed(format!("write packet failed: {e}"))
            })?;
        }
        Ok(())
    }

    fn close(mut self) -> Result<(), StillreelError> {
        self.encoder.send_eof().map_err(|e| {
            StillreelError::EncoderSubmissionFailed(format!("send_eof failed: {e}"))
        })?;
        self.drain_packets()?;
        self.output.write_trailer().map_err(|e| {
            StillreelError::EncoderSubmissionFailed(format!("cannot write trailer: {e}"))
        })?;
        Ok(())
    }
}

/// Copy `rows` rows of `row_len` bytes into `plane`, honouring its stride.
fn copy_plane(frame: &mut VideoFrame, plane: usize, src: &[u8], row_len: usize, rows: usize) {
    let stride = frame.stride(plane);
    let dst = frame.data_mut(plane);
    for (row, src_row) in src.chunks_exact(row_len).take(rows).enumerate() {
        let start = row * stride;
        dst[start..start + row_len].copy_from_slice(src_row);
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, job: &EncodeJob, frame_count: u64) -> Result<(), StillreelError> {
        if self.state.is_some() {
            return Err(StillreelError::EncoderSetupFailed(
                "sink already has an open output".to_string(),
            ));
        }
        log::info!(
            "Encoding {frame_count} frame(s) to {} ({}x{}, codec={}, fps={}, bitrate={})",
            job.output.display(),
            job.width,
            job.height,
            job.codec,
            job.fps,
            job.bitrate,
        );
        match self.open(job) {
            Ok(state) => {
                self.state = Some(state);
                Ok(())
            }
            Err(error) => {
                self.abort();
                Err(error)
            }
        }
    }

    fn submit(&mut self, frame: YuvFrame, frame_index: u64) -> Result<(), StillreelError> {
        let state = self.state.as_mut().ok_or_else(|| {
            StillreelError::EncoderSubmissionFailed("no open output".to_string())
        })?;
        if (frame.width(), frame.height()) != (state.width, state.height) {
            return Err(StillreelError::EncoderSubmissionFailed(format!(
                "frame {frame_index} is {}x{}, encoder is {}x{}",
                frame.width(),
                frame.height(),
                state.width,
                state.height,
            )));
        }
        state.write_frame(&frame, frame_index)
    }

    fn finish(&mut self) -> Result<(), StillreelError> {
        let state = self.state.take().ok_or_else(|| {
            StillreelError::EncoderSubmissionFailed("no open output".to_string())
        })?;
        state.close()?;
        self.output_path = None;
        Ok(())
    }

    fn abort(&mut self) {
        // Closes the muxer before the file is removed.
        drop(self.state.take());
        if let Some(path) = self.output_path.take() {
            match fs::remove_file(&path) {
                Ok(()) => log::warn!("Removed incomplete output {}", path.display()),
                Err(error) => log::warn!(
                    "Could not remove incomplete output {}: {error}",
                    path.display()
                ),
            }
        }
    }
}
