//! Value snapshots describing GPU adapters and display outputs.

/// Opaque identity of a monitor, stable while the monitor stays connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorHandle(pub isize);

/// Opaque identity of a window owned by some process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// A rectangle in desktop coordinates, relative to the top-left corner of the
/// primary display.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge.
    pub right: i32,
    /// Bottom edge.
    pub bottom: i32,
}

impl Rect {
    /// Creates a rect from its four edges.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Horizontal position of the top-left corner.
    pub const fn x(&self) -> i32 {
        self.left
    }

    /// Vertical position of the top-left corner.
    pub const fn y(&self) -> i32 {
        self.top
    }

    /// Width of the rect. Negative when the driver reports an inverted rect.
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height of the rect. Negative when the driver reports an inverted rect.
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// How an image is rotated by an output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DisplayRotation {
    /// The rotation is not reported by the driver.
    #[default]
    Unspecified,
    /// No rotation.
    Identity,
    /// Rotated 90 degrees.
    Rotate90,
    /// Rotated 180 degrees.
    Rotate180,
    /// Rotated 270 degrees.
    Rotate270,
}

/// Snapshot of a GPU adapter's descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuProperties {
    /// Locally unique identifier of the adapter.
    pub luid: i64,

    /// Human-readable adapter description.
    pub description: String,

    /// Bytes of video memory not shared with the CPU.
    pub dedicated_video_memory: u64,

    /// Bytes of system memory dedicated to the adapter.
    pub dedicated_system_memory: u64,

    /// Bytes of system memory shared with the CPU.
    pub shared_system_memory: u64,

    /// PCI ID of the hardware vendor.
    pub vendor_id: u32,

    /// PCI ID of the hardware device.
    pub device_id: u32,

    /// PCI ID of the sub system.
    pub sub_sys_id: u32,

    /// PCI ID of the revision number.
    pub revision: u32,

    /// Adapter capability flags.
    pub flags: u32,
}

/// Properties of one display output and the adapter driving it.
///
/// The `gpu` half is a cached snapshot; the output half is re-derived from
/// the driver on every query, as output configuration can change while the
/// handles are held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayProperties {
    /// The adapter driving this output.
    pub gpu: GpuProperties,

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
