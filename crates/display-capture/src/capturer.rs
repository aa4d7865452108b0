//! The duplication session and per-tick capture cycle for one display.

use core::{fmt, time::Duration};

use bytemuck::Pod;
use tracing::instrument;

use crate::{
    driver::DisplayDriver,
    error::Error,
    properties::WindowHandle,
};

/// Pixel geometry of the frames a prepared capturer delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Bytes per row in the staging texture, including any padding.
    pub stride_bytes: u32,
}

impl FrameGeometry {
    /// Bytes a caller's buffer must hold for one full frame.
    pub const fn required_buffer_size_bytes(&self) -> usize {
        self.stride_bytes as usize * self.height as usize
    }
}

/// The native objects behind a prepared capturer.
///
/// The device itself is released once preparation completes; the context and
/// duplication keep it alive for as long as they need it.
struct CaptureSession<D: DisplayDriver> {
    context: D::Context,
    duplication: D::Duplication,
    staging: D::Texture,
    geometry: FrameGeometry,
}

/// Captures frames of one display output into caller-supplied buffers.
///
/// The expensive part, creating the device, duplication session and staging
/// texture, runs once in [`Self::prepare`]; each [`Self::capture_into`] then
/// only acquires, blits and maps. Successive captures observe monotonically
/// newer frames; skipped frames are not queued.
pub struct DisplayCapturer<D: DisplayDriver> {
    driver: D,
    adapter: D::Adapter,
    output: D::Output,
    session: Option<CaptureSession<D>>,
}

impl<D: DisplayDriver> fmt::Debug for DisplayCapturer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayCapturer").finish_non_exhaustive()
    }
}

impl<D: DisplayDriver> DisplayCapturer<D> {
    /// Wraps an already-retained adapter and output pair. The capturer's
    /// references are its own, independent of the
    /// [`Display`](crate::Display) they may have come from.
    pub fn new(driver: D, adapter: D::Adapter, output: D::Output) -> Self {
        Self {
            driver,
            adapter,
            output,
            session: None,
        }
    }

    /// Creates the device, duplication session and CPU-readable staging
    /// texture needed to capture. A no-op once the session exists.
    ///
    /// `timeout` bounds the wait for the first frame, whose geometry sizes
    /// the staging texture. On any failure every native object acquired so
    /// far is released and the capturer stays unprepared, so the call may be
    /// retried.
    #[instrument("DisplayCapturer::prepare", skip_all, err)]
    pub fn prepare(&mut self, timeout: Duration) -> Result<(), Error> {
        if self.session.is_some() {
            return Ok(());
        }

        let (device, context) = self.driver.create_device(&self.adapter)?;
        let duplication = self.driver.duplicate_output(&self.output, &device)?;

        // The first captured frame determines the staging geometry.
        let frame = self
            .driver
            .acquire_next_frame(&duplication, timeout)?
            .ok_or(Error::Timeout { timeout })?;
        let (staging, width, height) = self.driver.create_staging_texture(&device, &frame)?;
        drop(frame);

        // Map and immediately unmap once to learn the row stride.
        let mapped = self.driver.map_for_read(&context, &staging)?;
        let stride_bytes = mapped.row_pitch;
        self.driver.unmap(&context, &staging);

        self.session = Some(CaptureSession {
            context,
            duplication,
            staging,
            geometry: FrameGeometry {
                width,
                height,
                stride_bytes,
            },
        });

        Ok(())
    }

    /// Captures the next frame into `buffer`, preparing the session first if
    /// needed.
    ///
    /// The buffer must hold [`FrameGeometry::required_buffer_size_bytes`]
    /// expressed in whole elements of `T`. Pixels are written in the raw
    /// layout the duplication reports, `stride_bytes` per row. Nothing is
    /// written unless the buffer validates.
    pub fn capture_into<T: Pod>(&mut self, buffer: &mut [T], timeout: Duration) -> Result<(), Error> {
        self.prepare(timeout)?;
        let Some(session) = self.session.as_ref() else {
            return Err(Error::NotPrepared);
        };

        let required = session.geometry.required_buffer_size_bytes();
        let element_size = size_of::<T>();
        if element_size == 0 || required % element_size != 0 {
            return Err(Error::Misaligned {
                element_size,
                frame_size: required,
            });
        }

        let bytes: &mut [u8] = bytemuck::cast_slice_mut(buffer);
        if bytes.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                provided: bytes.len(),
            });
        }

        // The duplication holds each frame until it is explicitly released;
        // releasing right before the next acquisition keeps the protocol
        // valid whether or not a frame is currently held.
        self.driver.release_frame(&session.duplication)?;
        let frame = self
            .driver
            .acquire_next_frame(&session.duplication, timeout)?
            .ok_or(Error::Timeout { timeout })?;

        self.driver
            .copy_texture(&session.context, &session.staging, &frame);
        drop(frame);

        let mapped = self.driver.map_for_read(&session.context, &session.staging)?;
        // SAFETY: the staging texture stays mapped until the unmap below and
        // holds at least `required` bytes; the destination was validated to
        // hold as many.
        unsafe {
            core::ptr::copy_nonoverlapping(mapped.data, bytes.as_mut_ptr(), required);
        }
        self.driver.unmap(&session.context, &session.staging);

        Ok(())
    }

    /// Geometry of the frames this capturer delivers. Only known once the
    /// session is prepared.
    pub fn geometry(&self) -> Result<FrameGeometry, Error> {
        match &self.session {
            Some(session) => Ok(session.geometry),
            None => Err(Error::NotPrepared),
        }
    }

    /// Whether the capture session has been prepared.
    pub fn is_prepared(&self) -> bool {
        self.session.is_some()
    }

    /// Hides `window` from this and every other duplication-based capture
    /// system-wide. Returns whether the platform accepted the change.
    pub fn exclude_window_from_capture(driver: &D, window: WindowHandle) -> bool {
        driver.set_window_capture_exclusion(window, true)
    }

    /// Reverses [`Self::exclude_window_from_capture`].
    pub fn include_window_in_capture(driver: &D, window: WindowHandle) -> bool {
        driver.set_window_capture_exclusion(window, false)
    }
}
