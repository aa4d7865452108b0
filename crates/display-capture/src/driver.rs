//! The seam between the capture protocol and the native graphics stack.

use core::time::Duration;

use thiserror::Error;

use crate::properties::{DisplayRotation, GpuProperties, MonitorHandle, Rect, WindowHandle};

/// A native driver call that failed, labelled with the call that triggered it.
#[derive(Debug, Clone, Error)]
#[error("{call} failed: {message} ({code:#010x})")]
pub struct DriverError {
    /// Name of the native call.
    pub call: &'static str,

    /// Status code reported by the platform.
    pub code: i32,

    /// Human-readable message reported by the platform.
    pub message: String,
}

impl DriverError {
    /// Create a new error for `call`.
    pub fn new(call: &'static str, code: i32, message: impl Into<String>) -> Self {
        Self {
            call,
            code,
            message: message.into(),
        }
    }
}

/// Fresh snapshot of an output's descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    /// Whether the output is attached to the desktop.
    pub attached_to_desktop: bool,

    /// Bounds of the output in desktop coordinates.
    pub desktop_bounds: Rect,

    /// Name of the output device.
    pub device_name: String,

    /// The monitor connected to this output.
    pub monitor: MonitorHandle,

    /// How the output rotates the image.
    pub rotation: DisplayRotation,
}

/// A staging texture mapped for CPU reads.
#[derive(Debug, Clone, Copy)]
pub struct MappedTexture {
    /// First byte of the pixel data. Valid until the texture is unmapped.
    pub data: *const u8,

    /// Bytes per row, including any padding the driver added.
    pub row_pitch: u32,
}

/// Operations the capture protocol needs from the native graphics stack.
///
/// Every handle type is a reference to a platform object whose lifetime is
/// reference counted by the platform itself: `Clone` retains a new reference
/// and `Drop` releases the one held, so a component that stores a handle
/// stores its own clone and contributes exactly one reference for as long as
/// it lives. Failure paths release whatever was acquired so far by letting
/// the locals drop before the error propagates.
///
/// The platform's reference counter is assumed thread-safe for
/// increment/decrement, but concurrent use of one handle's session is not;
/// callers serialize access per capturer.
pub trait DisplayDriver: Clone {
    /// The factory adapters are enumerated from.
    type Factory;
    /// A GPU adapter.
    type Adapter: Clone;
    /// A display output of an adapter.
    type Output: Clone;
    /// A rendering device bound to an adapter.
    type Device;
    /// The device's immediate context, used for copy and map operations.
    type Context;
    /// A duplication session on one output.
    type Duplication;
    /// A 2D texture.
    type Texture;

    /// Creates the enumeration factory.
    fn create_factory(&self) -> Result<Self::Factory, DriverError>;

    /// Returns the adapter at `index`, or `None` once the index is exhausted.
    fn enum_adapter(
        &self,
        factory: &Self::Factory,
        index: u32,
    ) -> Result<Option<Self::Adapter>, DriverError>;

    /// Returns the adapter's output at `index`, or `None` once the index is
    /// exhausted.
    fn enum_output(
        &self,
        adapter: &Self::Adapter,
        index: u32,
    ) -> Result<Option<Self::Output>, DriverError>;

    /// Snapshots the adapter's descriptor.
    fn describe_adapter(&self, adapter: &Self::Adapter) -> Result<GpuProperties, DriverError>;

    /// Snapshots the output's descriptor.
    fn describe_output(&self, output: &Self::Output) -> Result<OutputDescriptor, DriverError>;

    /// Creates a rendering device and its immediate context on `adapter`.
    fn create_device(
        &self,
        adapter: &Self::Adapter,
    ) -> Result<(Self::Device, Self::Context), DriverError>;

    /// Starts a duplication session on `output` against `device`.
    ///
    /// Drivers typically reject a second live duplication of the same
    /// output; that contention surfaces here as an error.
    fn duplicate_output(
        &self,
        output: &Self::Output,
        device: &Self::Device,
    ) -> Result<Self::Duplication, DriverError>;

    /// Blocks until the duplication produces the next frame, returning its
    /// texture, or `None` when no frame arrived within `timeout`.
    ///
    /// The frame stays held by the duplication until [`Self::release_frame`].
    fn acquire_next_frame(
        &self,
        duplication: &Self::Duplication,
        timeout: Duration,
    ) -> Result<Option<Self::Texture>, DriverError>;

    /// Releases the frame currently held by the duplication. A no-op when no
    /// frame is held, so releasing before every acquisition is always safe.
    fn release_frame(&self, duplication: &Self::Duplication) -> Result<(), DriverError>;

    /// Creates a CPU-readable staging texture with `frame`'s geometry and
    /// format, returning it together with its width and height.
    fn create_staging_texture(
        &self,
        device: &Self::Device,
        frame: &Self::Texture,
    ) -> Result<(Self::Texture, u32, u32), DriverError>;

    /// GPU-side copy of the full contents of `src` into `dest`.
    fn copy_texture(&self, context: &Self::Context, dest: &Self::Texture, src: &Self::Texture);

    /// Maps `texture` into CPU-readable memory until [`Self::unmap`].
    fn map_for_read(
        &self,
        context: &Self::Context,
        texture: &Self::Texture,
    ) -> Result<MappedTexture, DriverError>;

    /// Unmaps a texture mapped by [`Self::map_for_read`].
    fn unmap(&self, context: &Self::Context, texture: &Self::Texture);

    /// Blocks the calling thread until the output's next vertical blank.
    fn wait_for_vblank(&self, output: &Self::Output) -> Result<(), DriverError>;

    /// Handle of the primary monitor.
    fn primary_monitor(&self) -> MonitorHandle;

    /// Handle of the monitor containing `window`, or `None` when the window
    /// does not currently overlap any monitor.
    fn monitor_containing_window(&self, window: WindowHandle) -> Option<MonitorHandle>;

    /// Toggles the system-wide flag hiding `window` from duplication-based
    /// capture. Returns whether the platform accepted the change.
    fn set_window_capture_exclusion(&self, window: WindowHandle, excluded: bool) -> bool;
}
