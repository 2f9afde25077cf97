//! RGB to planar YUV 4:2:0 conversion.
//!
//! Luma is computed for every pixel; chroma is taken from the top-left pixel
//! of each 2x2 block and stored once per block in quarter-size U and V
//! planes. The output buffer is laid out Y, then U, then V, each plane
//! contiguous with no padding.
//!
//! ```text
//! Y = 0.299 R + 0.587 G + 0.114 B
//! U = -0.147 R - 0.289 G + 0.436 B + 128
//! V = 0.615 R - 0.515 G - 0.100 B + 128
//! ```
//!
//! Each component is rounded to nearest and clamped to `0..=255`.

use crate::decode::DecodedImage;
use crate::error::StillreelError;

/// An owned planar YUV 4:2:0 frame.
///
/// Invariant: width and height are even and the buffer holds exactly
/// `width * height * 3 / 2` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YuvFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl YuvFrame {
    /// Wrap an existing planar buffer.
    ///
    /// # Errors
    ///
    /// - [`StillreelError::OddDimensions`] if either dimension is odd.
    /// - [`StillreelError::InvalidBuffer`] if the length is not
    ///   `width * height * 3 / 2`.
    pub fn from_planes(width: u32, height: u32, data: Vec<u8>) -> Result<Self, StillreelError> {
        let expected = yuv420_len(width, height)?;
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

    /// Width of the U and V planes.
    pub fn chroma_width(&self) -> u32 {
        self.width / 2
    }

    /// Height of the U and V planes.
    pub fn chroma_height(&self) -> u32 {
        self.height / 2
    }

    /// The luma plane, `width * height` bytes.
    pub fn y_plane(&self) -> &[u8] {
        &self.data[..self.luma_len()]
    }

    /// The U plane, `width * height / 4` bytes.
    pub fn u_plane(&self) -> &[u8] {
        let start = self.luma_len();
        &self.data[start..start + self.chroma_len()]
    }

    /// The V plane, `width * height / 4` bytes.
    pub fn v_plane(&self) -> &[u8] {
        &self.data[self.luma_len() + self.chroma_len()..]
    }

    /// The whole buffer in Y, U, V order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Total size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false` for a valid frame of non-zero size.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Release the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn luma_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn chroma_len(&self) -> usize {
        self.luma_len() / 4
    }
}

/// Convert an RGB image to planar YUV 4:2:0.
///
/// # Errors
///
/// - [`StillreelError::OddDimensions`] if width or height is odd; nothing
///   is allocated in that case.
/// - [`StillreelError::OutOfMemory`] if the output buffer cannot be
///   reserved.
pub fn to_yuv420(image: &DecodedImage) -> Result<YuvFrame, StillreelError> {
    let (width, height) = image.dimensions();
    let total = yuv420_len(width, height)?;

    let mut data = Vec::new();
    data.try_reserve_exact(total)
        .map_err(|_| StillreelError::OutOfMemory {
            bytes: total as u64,
            context: format!("{width}x{height} YUV 4:2:0 frame"),
        })?;
    data.resize(total, 0);
    if total == 0 {
        return YuvFrame::from_planes(width, height, data);
    }

    let width = width as usize;
    let luma_len = width * height as usize;
    let chroma_width = width / 2;
    let (luma, chroma) = data.split_at_mut(luma_len);
    let (u_plane, v_plane) = chroma.split_at_mut(luma_len / 4);

    for (y, row) in image.as_bytes().chunks_exact(width * 3).enumerate() {
        let luma_row = &mut luma[y * width..(y + 1) * width];
        for (x, rgb) in row.chunks_exact(3).enumerate() {
            let (r, g, b) = (rgb[0] as f64, rgb[1] as f64, rgb[2] as f64);
            luma_row[x] = quantize(0.299 * r + 0.587 * g + 0.114 * b);

            if y % 2 == 0 && x % 2 == 0 {
                let block = (y / 2) * chroma_width + x / 2;
                u_plane[block] = quantize(-0.147 * r - 0.289 * g + 0.436 * b + 128.0);
                v_plane[block] = quantize(0.615 * r - 0.515 * g - 0.100 * b + 128.0);
            }
        }
    }

    YuvFrame::from_planes(image.width(), image.height(), data)
}

/// Size in bytes of a 4:2:0 frame, rejecting odd dimensions.
pub fn yuv420_len(width: u32, height: u32) -> Result<usize, StillreelError> {
    if width % 2 != 0 || height % 2 != 0 {
        return Err(StillreelError::OddDimensions { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .map(|bytes| bytes / 2)
        .ok_or(StillreelError::OutOfMemory {
            bytes: u64::MAX,
            context: format!("{width}x{height} YUV 4:2:0 frame"),
        })
}

#[inline]
fn quantize(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
