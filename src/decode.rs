//! Still image decoding.
//!
//! [`decode`] reads one image file into a [`DecodedImage`]: a tightly packed,
//! row-major, interleaved RGB buffer at the image's native resolution. The
//! format is sniffed from the file content first and the extension second,
//! so anything the `image` crate can read (JPEG, PNG, BMP, TIFF, ...) works.
//!
//! Decoding is all-or-nothing. A truncated or corrupt file yields an error
//! and never a partially filled buffer.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

use image::error::ImageError;
use image::{ColorType, DynamicImage, ImageDecoder, ImageReader, Limits, RgbImage};

use crate::error::StillreelError;

/// An owned, interleaved RGB image.
///
/// Invariant: `as_bytes().len() == width * height * 3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl DecodedImage {
    /// Wrap a raw RGB buffer.
    ///
    /// # Errors
    ///
    /// [`StillreelError::InvalidBuffer`] if `data.len() != width * height * 3`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, StillreelError> {
        let expected = rgb_len(width, height)?;
        if data.len() != expected {
            return Err(StillreelError::InvalidBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The RGB bytes, row-major, 3 bytes per pixel.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The `[r, g, b]` triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[index], self.data[index + 1], self.data[index + 2]])
    }

    /// Release the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Convert into an `image` buffer, e.g. for resampling.
    pub fn into_rgb_image(self) -> Result<RgbImage, StillreelError> {
        let expected = self.data.len();
        RgbImage::from_raw(self.width, self.height, self.data).ok_or(
            StillreelError::InvalidBuffer {
                expected,
                actual: expected,
            },
        )
    }
}

impl From<RgbImage> for DecodedImage {
    fn from(image: RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.into_raw(),
        }
    }
}

/// Decode `path` with the `image` crate's default allocation limits.
///
/// # Errors
///
/// - [`StillreelError::FileNotFound`] if the file does not exist.
/// - [`StillreelError::FileUnreadable`] for other I/O failures.
/// - [`StillreelError::MalformedImageHeader`] if the format is unknown or
///   the data is truncated or corrupt.
/// - [`StillreelError::OutOfMemory`] if the image exceeds the allocation
///   limit or the output buffer cannot be reserved.
pub fn decode<P: AsRef<Path>>(path: P) -> Result<DecodedImage, StillreelError> {
    decode_with_limit(path, None)
}

/// Decode `path`, capping decoder allocations at `max_alloc` bytes.
///
/// `None` keeps the `image` crate's default limit. Both the decoder's own
/// buffer and, for non-RGB sources, the converted RGB buffer count against
/// the limit.
pub fn decode_with_limit<P: AsRef<Path>>(
    path: P,
    max_alloc: Option<u64>,
) -> Result<DecodedImage, StillreelError> {
    let path = path.as_ref();
    let mut limits = Limits::default();
    if let Some(max_alloc) = max_alloc {
        limits.max_alloc = Some(max_alloc);
    }
    let mut reader = open_reader(path)?;
    reader.limits(limits.clone());

    let decoder = reader
        .into_decoder()
        .map_err(|error| classify(path, error))?;
    let (width, height) = decoder.dimensions();
    let color_type = decoder.color_type();
    log::trace!(
        "Decoding {} ({width}x{height}, {color_type:?})",
        path.display()
    );

    let len = rgb_len(width, height)?;
    limits
        .reserve(decoder.total_bytes())
        .map_err(|error| classify(path, error))?;
    if color_type != ColorType::Rgb8 {
        limits
            .reserve(len as u64)
            .map_err(|error| classify(path, error))?;
    }
    let data = if color_type == ColorType::Rgb8 {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|_| StillreelError::OutOfMemory {
                bytes: len as u64,
                context: format!("RGB buffer for {}", path.display()),
            })?;
        buffer.resize(len, 0);
        decoder
            .read_image(&mut buffer)
            .map_err(|error| classify(path, error))?;
        buffer
    } else {
        DynamicImage::from_decoder(decoder)
            .map_err(|error| classify(path, error))?
            .into_rgb8()
            .into_raw()
    };

    DecodedImage::new(width, height, data)
}

/// Read only the header of `path` and return `(width, height)`.
pub fn probe_dimensions<P: AsRef<Path>>(path: P) -> Result<(u32, u32), StillreelError> {
    let path = path.as_ref();
    open_reader(path)?
        .into_dimensions()
        .map_err(|error| classify(path, error))
}

fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, StillreelError> {
    let reader = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|error| open_error(path, error))?;

    if reader.format().is_none() {
        return Err(StillreelError::MalformedImageHeader {
            path: path.to_path_buf(),
            reason: "unrecognised image format".to_string(),
        });
    }
    Ok(reader)
}

fn open_error(path: &Path, error: std::io::Error) -> StillreelError {
    match error.kind() {
        ErrorKind::NotFound => StillreelError::FileNotFound(path.to_path_buf()),
        _ => StillreelError::FileUnreadable {
            path: path.to_path_buf(),
            reason: error.to_string(),
        },
    }
}

/// Map an `image` error onto the decode error taxonomy.
fn classify(path: &Path, error: ImageError) -> StillreelError {
    match error {
        ImageError::Limits(limit) => StillreelError::OutOfMemory {
            bytes: 0,
            context: format!("decoding {}: {limit}", path.display()),
        },
        ImageError::IoError(io) if io.kind() == ErrorKind::UnexpectedEof => {
            StillreelError::MalformedImageHeader {
                path: path.to_path_buf(),
                reason: format!("truncated image data: {io}"),
            }
        }
        ImageError::IoError(io) => open_error(path, io),
        other => StillreelError::MalformedImageHeader {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

fn rgb_len(width: u32, height: u32) -> Result<usize, StillreelError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or(StillreelError::OutOfMemory {
            bytes: u64::MAX,
            context: format!("{width}x{height} RGB buffer"),
        })
}
