//! Enumerates the display outputs attached to each GPU adapter and captures
//! their framebuffer contents into CPU-readable memory through the platform's
//! desktop-duplication mechanism.
//!
//! [`DisplayEnumerator`] walks (adapter, output) pairs into [`Display`]s, each
//! of which can spawn a [`DisplayCapturer`] owning a duplication session and a
//! CPU-readable staging texture, driving the acquire → copy → map → read cycle
//! per tick.
//!
//! All native access goes through the [`driver::DisplayDriver`] seam;
//! [`DxgiDriver`] is the production implementation on Windows. Native handles
//! are reference counted by the platform, so every component stores its own
//! cloned references and releases exactly those when dropped.

pub mod capturer;
pub mod display;
pub mod driver;
pub mod enumerator;
mod error;
pub mod properties;

#[cfg(windows)]
pub mod dxgi;

pub use capturer::{DisplayCapturer, FrameGeometry};
pub use display::Display;
pub use driver::{DisplayDriver, DriverError, MappedTexture, OutputDescriptor};
pub use enumerator::DisplayEnumerator;
pub use error::Error;
pub use properties::{
    DisplayProperties, DisplayRotation, GpuProperties, MonitorHandle, Rect, WindowHandle,
};

#[cfg(windows)]
pub use dxgi::DxgiDriver;
