use core::time::Duration;

use thiserror::Error;

use crate::{driver::DriverError, properties::MonitorHandle};

/// Failures surfaced by display enumeration and capture.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A native driver call failed.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// No frame became available within the requested window.
    ///
    /// Expected under low-activity displays; retry on the next tick.
    #[error("no frame became available within {timeout:?}")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// Frame geometry was queried before a capture session was prepared.
    #[error("the capture session has not been prepared")]
    NotPrepared,

    /// The caller's buffer cannot hold a full frame.
    #[error("buffer of {provided} bytes cannot hold a {required} byte frame")]
    BufferTooSmall {
        /// Bytes needed for one full frame.
        required: usize,
        /// Bytes the caller provided.
        provided: usize,
    },

    /// The caller's element type does not evenly divide the frame byte count.
    #[error("element size {element_size} does not evenly divide the {frame_size} byte frame")]
    Misaligned {
        /// Size of the caller's element type.
        element_size: usize,
        /// Bytes in one full frame.
        frame_size: usize,
    },

    /// No enumerated output matches the requested monitor handle.
    #[error("no display is connected to monitor {0:?}")]
    NoSuchDisplay(MonitorHandle),
}
