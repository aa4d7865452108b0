#![allow(dead_code)]

//! Test double for the display driver.
//!
//! Counts retains, releases and native calls so tests can assert the
//! resource-ownership protocol: every stored handle is one retain, every
//! drop is one release, and expensive session setup runs exactly once.

use core::{
    cell::{Cell, RefCell},
    time::Duration,
};
use std::rc::Rc;

use display_capture::{
    DisplayDriver, DisplayRotation, DriverError, GpuProperties, MappedTexture, MonitorHandle,
    OutputDescriptor, Rect, WindowHandle,
};

/// Mock frames are tightly packed 32-bit pixels plus configured row padding.
pub const BYTES_PER_PIXEL: u32 = 4;

/// One fake adapter and the outputs behind it.
pub struct AdapterFixture {
    /// Descriptor returned for the adapter.
    pub gpu: GpuProperties,
    /// Descriptors returned for the adapter's outputs, in enumeration order.
    pub outputs: Vec<OutputDescriptor>,
}

/// State shared by a [`MockDriver`] and every handle it creates.
#[derive(Default)]
pub struct MockState {
    adapters: RefCell<Vec<AdapterFixture>>,

    retains: Cell<u64>,
    releases: Cell<u64>,

    /// Device creations performed.
    pub create_device_calls: Cell<u32>,
    /// Duplication sessions started.
    pub duplicate_output_calls: Cell<u32>,
    /// Adapter descriptor snapshots taken.
    pub describe_adapter_calls: Cell<u32>,
    /// Output descriptor snapshots taken.
    pub describe_output_calls: Cell<u32>,
    /// Textures mapped.
    pub map_calls: Cell<u32>,
    /// Textures unmapped.
    pub unmap_calls: Cell<u32>,

    /// Number of upcoming acquisitions that will time out.
    pub pending_timeouts: Cell<u32>,
    /// Makes every device creation fail while set.
    pub fail_device_creation: Cell<bool>,
    /// Extra bytes of padding appended to every frame row.
    pub row_padding: Cell<u32>,

    /// Result of every window-containment lookup.
    pub window_monitor: Cell<Option<MonitorHandle>>,
    /// Record of capture-exclusion toggles, in call order.
    pub exclusion_calls: RefCell<Vec<(WindowHandle, bool)>>,

    frame_counter: Cell<u8>,
    frame_held: Cell<bool>,
}

fn bump(cell: &Cell<u32>) {
    cell.set(cell.get() + 1);
}

/// A reference-counted mock handle: clone retains, drop releases.
pub struct Handle {
    state: Rc<MockState>,
}

impl Handle {
    fn new(state: &Rc<MockState>) -> Self {
        state.retains.set(state.retains.get() + 1);
        Self {
            state: Rc::clone(state),
        }
    }
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        Self::new(&self.state)
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.state.releases.set(self.state.releases.get() + 1);
    }
}

/// Mock enumeration factory.
pub struct MockFactory {
    handle: Handle,
}

/// Mock GPU adapter.
#[derive(Clone)]
pub struct MockAdapter {
    handle: Handle,
    index: usize,
}

/// Mock display output.
#[derive(Clone)]
pub struct MockOutput {
    handle: Handle,
    adapter: usize,
    index: usize,
}

/// Mock rendering device.
pub struct MockDevice {
    handle: Handle,
}

/// Mock device context.
pub struct MockContext {
    handle: Handle,
}

/// Mock duplication session bound to one output.
pub struct MockDuplication {
    handle: Handle,
    adapter: usize,
    output: usize,
}

/// Mock 2D texture with CPU-visible pixel storage.
#[derive(Clone)]
pub struct MockTexture {
    handle: Handle,
    width: u32,
    height: u32,
    row_pitch: u32,
    pixels: Rc<RefCell<Vec<u8>>>,
}

/// A [`DisplayDriver`] whose handles and frames are plain test data.
#[derive(Clone)]
pub struct MockDriver {
    state: Rc<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// A driver exposing no adapters at all.
    pub fn new() -> Self {
        Self {
            state: Rc::new(MockState::default()),
        }
    }

    /// A driver exposing the given adapter topology.
    pub fn with_adapters(adapters: Vec<AdapterFixture>) -> Self {
        let driver = Self::new();
        driver.state.adapters.replace(adapters);
        driver
    }

    /// The shared state, for configuring behavior and reading counters.
    pub fn state(&self) -> &MockState {
        &self.state
    }

    /// Retains performed so far.
    pub fn retains(&self) -> u64 {
        self.state.retains.get()
    }

    /// Releases performed so far.
    pub fn releases(&self) -> u64 {
        self.state.releases.get()
    }

    /// Retains minus releases; zero once every handle has been dropped.
    pub fn live_handles(&self) -> i64 {
        self.state.retains.get() as i64 - self.state.releases.get() as i64
    }

    /// Replaces one output's desktop bounds, as a display reconfiguration
    /// would.
    pub fn set_desktop_bounds(&self, adapter: usize, output: usize, bounds: Rect) {
        self.state.adapters.borrow_mut()[adapter].outputs[output].desktop_bounds = bounds;
    }

    fn output_descriptor(&self, adapter: usize, output: usize) -> OutputDescriptor {
        self.state.adapters.borrow()[adapter].outputs[output].clone()
    }

    fn frame_size(&self, adapter: usize, output: usize) -> (u32, u32) {
        let bounds = self.output_descriptor(adapter, output).desktop_bounds;
        (
            bounds.width().unsigned_abs(),
            bounds.height().unsigned_abs(),
        )
    }
}

impl DisplayDriver for MockDriver {
    type Factory = MockFactory;
    type Adapter = MockAdapter;
    type Output = MockOutput;
    type Device = MockDevice;
    type Context = MockContext;
    type Duplication = MockDuplication;
    type Texture = MockTexture;

    fn create_factory(&self) -> Result<MockFactory, DriverError> {
        Ok(MockFactory {
            handle: Handle::new(&self.state),
        })
    }

    fn enum_adapter(
        &self,
        _factory: &MockFactory,
        index: u32,
    ) -> Result<Option<MockAdapter>, DriverError> {
        let index = index as usize;
        if index >= self.state.adapters.borrow().len() {
            return Ok(None);
        }

        Ok(Some(MockAdapter {
            handle: Handle::new(&self.state),
            index,
        }))
    }

    fn enum_output(
        &self,
        adapter: &MockAdapter,
        index: u32,
    ) -> Result<Option<MockOutput>, DriverError> {
        let index = index as usize;
        if index >= self.state.adapters.borrow()[adapter.index].outputs.len() {
            return Ok(None);
        }

        Ok(Some(MockOutput {
            handle: Handle::new(&self.state),
            adapter: adapter.index,
            index,
        }))
    }

    fn describe_adapter(&self, adapter: &MockAdapter) -> Result<GpuProperties, DriverError> {
        bump(&self.state.describe_adapter_calls);
        Ok(self.state.adapters.borrow()[adapter.index].gpu.clone())
    }

    fn describe_output(&self, output: &MockOutput) -> Result<OutputDescriptor, DriverError> {
        bump(&self.state.describe_output_calls);
        Ok(self.output_descriptor(output.adapter, output.index))
    }

    fn create_device(
        &self,
        _adapter: &MockAdapter,
    ) -> Result<(MockDevice, MockContext), DriverError> {
        bump(&self.state.create_device_calls);

        if self.state.fail_device_creation.get() {
            return Err(DriverError::new("create_device", -1, "injected failure"));
        }

        Ok((
            MockDevice {
                handle: Handle::new(&self.state),
            },
            MockContext {
                handle: Handle::new(&self.state),
            },
        ))
    }

    fn duplicate_output(
        &self,
        output: &MockOutput,
        _device: &MockDevice,
    ) -> Result<MockDuplication, DriverError> {
        bump(&self.state.duplicate_output_calls);

        Ok(MockDuplication {
            handle: Handle::new(&self.state),
            adapter: output.adapter,
            output: output.index,
        })
    }

    fn acquire_next_frame(
        &self,
        duplication: &MockDuplication,
        _timeout: Duration,
    ) -> Result<Option<MockTexture>, DriverError> {
        if self.state.pending_timeouts.get() > 0 {
            self.state
                .pending_timeouts
                .set(self.state.pending_timeouts.get() - 1);
            return Ok(None);
        }

        // The protocol requires the previous frame to have been released.
        if self.state.frame_held.get() {
            return Err(DriverError::new(
                "acquire_next_frame",
                -2,
                "previous frame still held",
            ));
        }
        self.state.frame_held.set(true);

        let (width, height) = self.frame_size(duplication.adapter, duplication.output);
        let row_pitch = width * BYTES_PER_PIXEL + self.state.row_padding.get();

        let counter = self.state.frame_counter.get().wrapping_add(1);
        self.state.frame_counter.set(counter);

        Ok(Some(MockTexture {
            handle: Handle::new(&self.state),
            width,
            height,
            row_pitch,
            pixels: Rc::new(RefCell::new(vec![counter; (row_pitch * height) as usize])),
        }))
    }

    fn release_frame(&self, _duplication: &MockDuplication) -> Result<(), DriverError> {
        self.state.frame_held.set(false);
        Ok(())
    }

    fn create_staging_texture(
        &self,
        _device: &MockDevice,
        frame: &MockTexture,
    ) -> Result<(MockTexture, u32, u32), DriverError> {
        let pixels = vec![0u8; (frame.row_pitch * frame.height) as usize];

        Ok((
            MockTexture {
                handle: Handle::new(&self.state),
                width: frame.width,
                height: frame.height,
                row_pitch: frame.row_pitch,
                pixels: Rc::new(RefCell::new(pixels)),
            },
            frame.width,
            frame.height,
        ))
    }

    fn copy_texture(&self, _context: &MockContext, dest: &MockTexture, src: &MockTexture) {
        dest.pixels.borrow_mut().copy_from_slice(&src.pixels.borrow());
    }

    fn map_for_read(
        &self,
        _context: &MockContext,
        texture: &MockTexture,
    ) -> Result<MappedTexture, DriverError> {
        bump(&self.state.map_calls);

        // The pointer stays valid while mapped: pixel storage is never
        // resized after creation.
        let data = texture.pixels.borrow().as_ptr();
        Ok(MappedTexture {
            data,
            row_pitch: texture.row_pitch,
        })
    }

    fn unmap(&self, _context: &MockContext, _texture: &MockTexture) {
        bump(&self.state.unmap_calls);
    }

    fn wait_for_vblank(&self, _output: &MockOutput) -> Result<(), DriverError> {
        Ok(())
    }

    fn primary_monitor(&self) -> MonitorHandle {
        self.state
            .adapters
            .borrow()
            .first()
            .and_then(|adapter| adapter.outputs.first())
            .map(|output| output.monitor)
            .unwrap_or(MonitorHandle(0))
    }

    fn monitor_containing_window(&self, _window: WindowHandle) -> Option<MonitorHandle> {
        self.state.window_monitor.get()
    }

    fn set_window_capture_exclusion(&self, window: WindowHandle, excluded: bool) -> bool {
        self.state.exclusion_calls.borrow_mut().push((window, excluded));
        true
    }
}

/// A plausible adapter descriptor.
pub fn gpu_fixture(description: &str) -> GpuProperties {
    GpuProperties {
        luid: 0x1_0000 + description.len() as i64,
        description: description.to_string(),
        dedicated_video_memory: 8 << 30,
        dedicated_system_memory: 0,
        shared_system_memory: 16 << 30,
        vendor_id: 0x10DE,
        device_id: 0x2684,
        sub_sys_id: 0x1,
        revision: 0xA1,
        flags: 0,
    }
}

/// An attached output descriptor.
pub fn output_fixture(name: &str, monitor: isize, bounds: Rect) -> OutputDescriptor {
    OutputDescriptor {
        attached_to_desktop: true,
        desktop_bounds: bounds,
        device_name: name.to_string(),
        monitor: MonitorHandle(monitor),
        rotation: DisplayRotation::Identity,
    }
}

/// One adapter with two outputs (monitors 11 and 22), the common topology.
pub fn dual_output_driver() -> MockDriver {
    MockDriver::with_adapters(vec![AdapterFixture {
        gpu: gpu_fixture("Mock GPU"),
        outputs: vec![
            output_fixture("\\\\.\\DISPLAY1", 11, Rect::new(0, 0, 1920, 1080)),
            output_fixture("\\\\.\\DISPLAY2", 22, Rect::new(1920, 0, 3840, 1080)),
        ],
    }])
}

/// One adapter with one tiny output, for byte-exact capture assertions.
pub fn tiny_output_driver(width: i32, height: i32) -> MockDriver {
    MockDriver::with_adapters(vec![AdapterFixture {
        gpu: gpu_fixture("Mock GPU"),
        outputs: vec![output_fixture(
            "\\\\.\\DISPLAY1",
            11,
            Rect::new(0, 0, width, height),
        )],
    }])
}

/// Installs a subscriber printing to the test writer.
pub fn init_logger() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
