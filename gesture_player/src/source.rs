//! Frame sources: where each tick's image comes from.
//!
//! A source either hands back a frame or `None`.  `None` means "nothing
//! this tick" and the driver simply tries again on the next one; it is never
//! fatal.

// ════════════════════════════════════════════════════════════════════════════
// Frame
// ════════════════════════════════════════════════════════════════════════════

/// One RGB8 image, row-major, 3 bytes per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width:  usize,
    pub height: usize,
    pub rgb:    Vec<u8>,
}

impl Frame {
    /// A frame filled with a single colour.
    pub fn solid(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let rgb = rgb.iter().copied().cycle().take(width * height * 3).collect();
        Frame { width, height, rgb }
    }

    /// Pixel at (x, y) as `[r, g, b]`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]]
    }

    /// Flip left↔right so the preview behaves like a mirror.
    pub fn mirror(&mut self) {
        if self.width == 0 {
            return;
        }
        let row_len = self.width * 3;
        for row in self.rgb.chunks_exact_mut(row_len) {
            let (mut l, mut r) = (0, self.width.saturating_sub(1));
            while l < r {
                for c in 0..3 {
                    row.swap(l * 3 + c, r * 3 + c);
                }
                l += 1;
                r -= 1;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameSource
// ════════════════════════════════════════════════════════════════════════════

pub trait FrameSource {
    /// Next frame, or `None` if capture failed this tick.
    fn next_frame(&mut self) -> Option<Frame>;
}

// ════════════════════════════════════════════════════════════════════════════
// CameraSource (real webcam, feature = "camera")
// ════════════════════════════════════════════════════════════════════════════

/// Webcam opened for the lifetime of the value.
///
/// The stream is started in [`CameraSource::open`] and stopped in `Drop`,
/// so the device is released on every exit path, including the window
/// being closed mid-run.
#[cfg(feature = "camera")]
pub struct CameraSource {
    camera: nokhwa::Camera,
}

#[cfg(feature = "camera")]
impl CameraSource {
    pub fn open(index: u32) -> Result<Self, crate::error::SourceError> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = nokhwa::Camera::new(CameraIndex::Index(index), requested)?;
        camera.open_stream()?;

        let res = camera.resolution();
        tracing::info!(
            index,
            name = %camera.info().human_name(),
            width = res.width(),
            height = res.height(),
            "camera opened"
        );
        Ok(CameraSource { camera })
    }
}

#[cfg(feature = "camera")]
impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Option<Frame> {
        use nokhwa::pixel_format::RgbFormat;

        let buffer = match self.camera.frame() {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "failed to grab frame");
                return None;
            }
        };
        match buffer.decode_image::<RgbFormat>() {
            Ok(img) => Some(Frame {
                width:  img.width() as usize,
                height: img.height() as usize,
                rgb:    img.into_raw(),
            }),
            Err(e) => {
                tracing::debug!(error = %e, "failed to decode frame");
                None
            }
        }
    }
}

#[cfg(feature = "camera")]
impl Drop for CameraSource {
    fn drop(&mut self) {
        match self.camera.stop_stream() {
            Ok(()) => tracing::info!("camera released"),
            Err(e) => tracing::warn!(error = %e, "camera did not stop cleanly"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> Frame {
        let mut rgb = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                rgb.extend_from_slice(&[x as u8, y as u8, 7]);
            }
        }
        Frame { width, height, rgb }
    }

    #[test]
    fn solid_fills_every_pixel() {
        let f = Frame::solid(4, 3, [1, 2, 3]);
        assert_eq!(f.rgb.len(), 4 * 3 * 3);
        assert_eq!(f.pixel(3, 2), [1, 2, 3]);
    }

    #[test]
    fn mirror_swaps_columns() {
        let mut f = gradient(5, 2);
        f.mirror();
        assert_eq!(f.pixel(0, 0), [4, 0, 7]);
        assert_eq!(f.pixel(2, 1), [2, 1, 7]);
        assert_eq!(f.pixel(4, 1), [0, 1, 7]);
    }

    #[test]
    fn mirror_of_empty_frame_is_noop() {
        let mut f = Frame::solid(0, 4, [9, 9, 9]);
        f.mirror();
        assert_eq!(f, Frame::solid(0, 4, [9, 9, 9]));
    }

    #[test]
    fn mirror_twice_is_identity() {
        let original = gradient(6, 3);
        let mut f = original.clone();
        f.mirror();
        f.mirror();
        assert_eq!(f, original);
    }
}
