//! One enumerated (adapter, output) pair.

use core::{cell::OnceCell, fmt, time::Duration};

use crate::{
    capturer::DisplayCapturer,
    driver::DisplayDriver,
    error::Error,
    properties::{DisplayProperties, GpuProperties},
};

/// A display output together with the adapter driving it.
///
/// Holds its own adapter and output references, taken at construction and
/// released when dropped, independent of any references the enumerator or
/// other components hold.
pub struct Display<D: DisplayDriver> {
    driver: D,
    adapter: D::Adapter,
    output: D::Output,
    gpu: OnceCell<GpuProperties>,
}

impl<D: DisplayDriver> fmt::Debug for Display<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display").finish_non_exhaustive()
    }
}

impl<D: DisplayDriver> Display<D> {
    /// Wraps an already-retained adapter and output pair.
    pub fn new(driver: D, adapter: D::Adapter, output: D::Output) -> Self {
        Self {
            driver,
            adapter,
            output,
            gpu: OnceCell::new(),
        }
    }

    /// Properties of this display.
    ///
    /// The gpu half is snapshotted once, lazily, and cached for the life of
    /// this display. The output half is queried fresh from the driver on
    /// every call, as output configuration can change while the handle is
    /// held.
    pub fn properties(&self) -> Result<DisplayProperties, Error> {
        let gpu = match self.gpu.get() {
            Some(gpu) => gpu,
            None => {
                let gpu = self.driver.describe_adapter(&self.adapter)?;
                self.gpu.get_or_init(|| gpu)
            }
        };

        let output = self.driver.describe_output(&self.output)?;

        Ok(DisplayProperties {
            gpu: gpu.clone(),
            attached_to_desktop: output.attached_to_desktop,
            desktop_bounds: output.desktop_bounds,
            device_name: output.device_name,
            monitor: output.monitor,
            rotation: output.rotation,
        })
    }

    /// Creates a capturer for this display, prepared and ready to capture.
    ///
    /// `timeout` bounds the wait for the warm-up frame. The capturer takes
    /// its own adapter and output references and may outlive this display.
    /// If session preparation fails, the partially constructed capturer is
    /// torn down before the error propagates.
    pub fn create_capturer(&self, timeout: Duration) -> Result<DisplayCapturer<D>, Error> {
        let mut capturer = DisplayCapturer::new(
            self.driver.clone(),
            self.adapter.clone(),
            self.output.clone(),
        );
        capturer.prepare(timeout)?;

        Ok(capturer)
    }

    /// Blocks the calling thread until this output's next vertical blank.
    pub fn wait_for_vblank(&self) -> Result<(), Error> {
        self.driver.wait_for_vblank(&self.output)?;
        Ok(())
    }
}
