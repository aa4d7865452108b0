//! Walks the platform's adapters and their outputs.

use tracing::{debug, instrument};

use crate::{
    display::Display,
    driver::DisplayDriver,
    error::Error,
    properties::{DisplayProperties, MonitorHandle, WindowHandle},
};

/// Discovers the (adapter, output) pairs the platform currently exposes.
///
/// Owns one factory reference, released when dropped. Displays it produces
/// are owned by the caller.
pub struct DisplayEnumerator<D: DisplayDriver> {
    driver: D,
    factory: D::Factory,
}

impl<D: DisplayDriver> DisplayEnumerator<D> {
    /// Creates the factory this enumerator walks.
    #[instrument("DisplayEnumerator::new", skip_all, err)]
    pub fn new(driver: D) -> Result<Self, Error> {
        let factory = driver.create_factory()?;

        Ok(Self { driver, factory })
    }

    /// Live [`Display`]s for every (adapter, output) pair, adapter-major in
    /// platform enumeration order.
    ///
    /// Each display holds its own adapter and output references; the walk's
    /// temporary references are released as it advances. The order is not
    /// guaranteed stable across driver reconfiguration. Zero adapters yields
    /// an empty list.
    pub fn displays(&self) -> Result<Vec<Display<D>>, Error> {
        let mut displays = Vec::new();

        let mut adapter_index = 0;
        while let Some(adapter) = self.driver.enum_adapter(&self.factory, adapter_index)? {
            let mut output_index = 0;
            while let Some(output) = self.driver.enum_output(&adapter, output_index)? {
                displays.push(Display::new(self.driver.clone(), adapter.clone(), output));
                output_index += 1;
            }

            debug!("adapter {adapter_index}: {output_index} outputs");
            adapter_index += 1;
        }

        Ok(displays)
    }

    /// Properties of every (adapter, output) pair, in the same order as
    /// [`Self::displays`]. Every handle the walk touches is released again
    /// before this returns.
    pub fn display_properties(&self) -> Result<Vec<DisplayProperties>, Error> {
        self.displays()?
            .into_iter()
            .map(|display| display.properties())
            .collect()
    }

    /// The display whose output is connected to `monitor`, or `None` when no
    /// output matches.
    ///
    /// Stops at the first match; should reconfiguration ever leave two
    /// outputs reporting the same monitor, the first in enumeration order
    /// wins. Everything else enumerated is released again by the time this
    /// returns.
    pub fn try_display_with_monitor_handle(
        &self,
        monitor: MonitorHandle,
    ) -> Result<Option<Display<D>>, Error> {
        for display in self.displays()? {
            if display.properties()?.monitor == monitor {
                return Ok(Some(display));
            }

            // Non-matching displays drop here, releasing their references.
        }

        Ok(None)
    }

    /// Like [`Self::try_display_with_monitor_handle`], but failing with
    /// [`Error::NoSuchDisplay`] when no output matches.
    pub fn display_with_monitor_handle(&self, monitor: MonitorHandle) -> Result<Display<D>, Error> {
        self.try_display_with_monitor_handle(monitor)?
            .ok_or(Error::NoSuchDisplay(monitor))
    }

    /// Handle of the primary monitor.
    pub fn primary_monitor(&self) -> MonitorHandle {
        self.driver.primary_monitor()
    }

    /// Handle of the monitor containing `window`, or `None` when the window
    /// does not currently overlap any monitor.
    pub fn monitor_containing_window(&self, window: WindowHandle) -> Option<MonitorHandle> {
        self.driver.monitor_containing_window(window)
    }
}
