//! [`DisplayDriver`] backed by the DXGI and Direct3D 11 stack.

mod device;

use core::time::Duration;

use windows::Win32::{
    Foundation::{HWND, POINT},
    Graphics::{
        Direct3D11::{
            D3D11_CPU_ACCESS_READ, D3D11_MAP_READ, D3D11_MAPPED_SUBRESOURCE, D3D11_TEXTURE2D_DESC,
            D3D11_USAGE_STAGING, ID3D11Device, ID3D11DeviceContext, ID3D11Texture2D,
        },
        Dxgi::{
            Common::{
                DXGI_MODE_ROTATION, DXGI_MODE_ROTATION_IDENTITY, DXGI_MODE_ROTATION_ROTATE90,
                DXGI_MODE_ROTATION_ROTATE180, DXGI_MODE_ROTATION_ROTATE270,
            },
            CreateDXGIFactory1, DXGI_ADAPTER_DESC1, DXGI_ERROR_INVALID_CALL, DXGI_ERROR_NOT_FOUND,
            DXGI_ERROR_WAIT_TIMEOUT, DXGI_OUTDUPL_FRAME_INFO, DXGI_OUTPUT_DESC, IDXGIAdapter1,
            IDXGIFactory1, IDXGIOutput1, IDXGIOutputDuplication, IDXGIResource,
        },
        Gdi::{MONITOR_DEFAULTTONULL, MONITOR_DEFAULTTOPRIMARY, MonitorFromPoint, MonitorFromWindow},
    },
    UI::WindowsAndMessaging::{SetWindowDisplayAffinity, WDA_EXCLUDEFROMCAPTURE, WDA_NONE},
};
use windows_core::Interface;
use windows_result::Error as WindowsError;

use crate::{
    driver::{DisplayDriver, DriverError, MappedTexture, OutputDescriptor},
    properties::{DisplayRotation, GpuProperties, MonitorHandle, Rect, WindowHandle},
};

/// The production driver: DXGI for enumeration and duplication, Direct3D 11
/// for the staging surface, GDI for monitor lookups.
#[derive(Debug, Default, Clone, Copy)]
pub struct DxgiDriver;

pub(crate) fn win_err(call: &'static str, error: WindowsError) -> DriverError {
    DriverError::new(call, error.code().0, error.message())
}

fn rotation_from_mode(rotation: DXGI_MODE_ROTATION) -> DisplayRotation {
    match rotation {
        DXGI_MODE_ROTATION_IDENTITY => DisplayRotation::Identity,
        DXGI_MODE_ROTATION_ROTATE90 => DisplayRotation::Rotate90,
        DXGI_MODE_ROTATION_ROTATE180 => DisplayRotation::Rotate180,
        DXGI_MODE_ROTATION_ROTATE270 => DisplayRotation::Rotate270,
        _ => DisplayRotation::Unspecified,
    }
}

/// Descriptor strings are fixed-size, null-padded UTF-16.
fn utf16_to_string(raw: &[u16]) -> String {
    let len = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
    String::from_utf16_lossy(&raw[..len])
}

impl DisplayDriver for DxgiDriver {
    type Factory = IDXGIFactory1;
    type Adapter = IDXGIAdapter1;
    type Output = IDXGIOutput1;
    type Device = ID3D11Device;
    type Context = ID3D11DeviceContext;
    type Duplication = IDXGIOutputDuplication;
    type Texture = ID3D11Texture2D;

    fn create_factory(&self) -> Result<IDXGIFactory1, DriverError> {
        unsafe { CreateDXGIFactory1() }.map_err(|e| win_err("CreateDXGIFactory1", e))
    }

    fn enum_adapter(
        &self,
        factory: &IDXGIFactory1,
        index: u32,
    ) -> Result<Option<IDXGIAdapter1>, DriverError> {
        match unsafe { factory.EnumAdapters1(index) } {
            Ok(adapter) => Ok(Some(adapter)),
            Err(error) if error.code() == DXGI_ERROR_NOT_FOUND => Ok(None),
            Err(error) => Err(win_err("IDXGIFactory1::EnumAdapters1", error)),
        }
    }

    fn enum_output(
        &self,
        adapter: &IDXGIAdapter1,
        index: u32,
    ) -> Result<Option<IDXGIOutput1>, DriverError> {
        let output = match unsafe { adapter.EnumOutputs(index) } {
            Ok(output) => output,
            Err(error) if error.code() == DXGI_ERROR_NOT_FOUND => return Ok(None),
            Err(error) => return Err(win_err("IDXGIAdapter1::EnumOutputs", error)),
        };

        let output = output.cast().map_err(|e| win_err("IDXGIOutput::cast", e))?;
        Ok(Some(output))
    }

    fn describe_adapter(&self, adapter: &IDXGIAdapter1) -> Result<GpuProperties, DriverError> {
        let mut desc = DXGI_ADAPTER_DESC1::default();
        unsafe { adapter.GetDesc1(&mut desc) }
            .map_err(|e| win_err("IDXGIAdapter1::GetDesc1", e))?;

        Ok(GpuProperties {
            luid: (i64::from(desc.AdapterLuid.HighPart) << 32) | i64::from(desc.AdapterLuid.LowPart),
            description: utf16_to_string(&desc.Description),
            dedicated_video_memory: desc.DedicatedVideoMemory as u64,
            dedicated_system_memory: desc.DedicatedSystemMemory as u64,
            shared_system_memory: desc.SharedSystemMemory as u64,
            vendor_id: desc.VendorId,
            device_id: desc.DeviceId,
            sub_sys_id: desc.SubSysId,
            revision: desc.Revision,
            flags: desc.Flags,
        })
    }

    fn describe_output(&self, output: &IDXGIOutput1) -> Result<OutputDescriptor, DriverError> {
        let mut desc = DXGI_OUTPUT_DESC::default();
        unsafe { output.GetDesc(&mut desc) }.map_err(|e| win_err("IDXGIOutput1::GetDesc", e))?;

        let bounds = desc.DesktopCoordinates;

        Ok(OutputDescriptor {
            attached_to_desktop: desc.AttachedToDesktop.as_bool(),
            desktop_bounds: Rect::new(bounds.left, bounds.top, bounds.right, bounds.bottom),
            device_name: utf16_to_string(&desc.DeviceName),
            monitor: MonitorHandle(desc.Monitor.0 as isize),
            rotation: rotation_from_mode(desc.Rotation),
        })
    }

    fn create_device(
        &self,
        adapter: &IDXGIAdapter1,
    ) -> Result<(ID3D11Device, ID3D11DeviceContext), DriverError> {
        device::create_device(adapter)
    }

    fn duplicate_output(
        &self,
        output: &IDXGIOutput1,
        device: &ID3D11Device,
    ) -> Result<IDXGIOutputDuplication, DriverError> {
        unsafe { output.DuplicateOutput(device) }
            .map_err(|e| win_err("IDXGIOutput1::DuplicateOutput", e))
    }

    fn acquire_next_frame(
        &self,
        duplication: &IDXGIOutputDuplication,
        timeout: Duration,
    ) -> Result<Option<ID3D11Texture2D>, DriverError> {
        let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);

        let mut info = DXGI_OUTDUPL_FRAME_INFO::default();
        let mut resource: Option<IDXGIResource> = None;
        let result =
            unsafe { duplication.AcquireNextFrame(timeout_ms, &mut info, &mut resource) };

        // The temporary IDXGIResource reference is released when `resource`
        // drops; only the texture interface is handed out.
        let resource = match result {
            Ok(()) => resource.ok_or_else(|| {
                DriverError::new(
                    "IDXGIOutputDuplication::AcquireNextFrame",
                    0,
                    "no resource returned",
                )
            })?,
            Err(error) if error.code() == DXGI_ERROR_WAIT_TIMEOUT => return Ok(None),
            Err(error) => return Err(win_err("IDXGIOutputDuplication::AcquireNextFrame", error)),
        };

        let texture = resource.cast().map_err(|e| win_err("IDXGIResource::cast", e))?;
        Ok(Some(texture))
    }

    fn release_frame(&self, duplication: &IDXGIOutputDuplication) -> Result<(), DriverError> {
        match unsafe { duplication.ReleaseFrame() } {
            Ok(()) => Ok(()),
            // No frame currently held.
            Err(error) if error.code() == DXGI_ERROR_INVALID_CALL => Ok(()),
            Err(error) => Err(win_err("IDXGIOutputDuplication::ReleaseFrame", error)),
        }
    }

    fn create_staging_texture(
        &self,
        device: &ID3D11Device,
        frame: &ID3D11Texture2D,
    ) -> Result<(ID3D11Texture2D, u32, u32), DriverError> {
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { frame.GetDesc(&mut desc) };

        // Same geometry and format as the frame, but readable from the CPU.
        desc.BindFlags = 0;
        desc.MiscFlags = 0;
        desc.CPUAccessFlags = D3D11_CPU_ACCESS_READ.0 as u32;
        desc.Usage = D3D11_USAGE_STAGING;

        let mut staging = None;
        unsafe { device.CreateTexture2D(&desc, None, Some(&mut staging)) }
            .map_err(|e| win_err("ID3D11Device::CreateTexture2D", e))?;

        match staging {
            Some(staging) => Ok((staging, desc.Width, desc.Height)),
            None => Err(DriverError::new(
                "ID3D11Device::CreateTexture2D",
                0,
                "no texture returned",
            )),
        }
    }

    fn copy_texture(
        &self,
        context: &ID3D11DeviceContext,
        dest: &ID3D11Texture2D,
        src: &ID3D11Texture2D,
    ) {
        unsafe { context.CopyResource(dest, src) };
    }

    fn map_for_read(
        &self,
        context: &ID3D11DeviceContext,
        texture: &ID3D11Texture2D,
    ) -> Result<MappedTexture, DriverError> {
        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe { context.Map(texture, 0, D3D11_MAP_READ, 0, Some(&mut mapped)) }
            .map_err(|e| win_err("ID3D11DeviceContext::Map", e))?;

        Ok(MappedTexture {
            data: mapped.pData.cast_const().cast(),
            row_pitch: mapped.RowPitch,
        })
    }

    fn unmap(&self, context: &ID3D11DeviceContext, texture: &ID3D11Texture2D) {
        unsafe { context.Unmap(texture, 0) };
    }

    fn wait_for_vblank(&self, output: &IDXGIOutput1) -> Result<(), DriverError> {
        unsafe { output.WaitForVBlank() }.map_err(|e| win_err("IDXGIOutput1::WaitForVBlank", e))
    }

    fn primary_monitor(&self) -> MonitorHandle {
        let handle = unsafe { MonitorFromPoint(POINT::default(), MONITOR_DEFAULTTOPRIMARY) };
        MonitorHandle(handle.0 as isize)
    }

    fn monitor_containing_window(&self, window: WindowHandle) -> Option<MonitorHandle> {
        let hwnd = HWND(window.0 as *mut core::ffi::c_void);
        let handle = unsafe { MonitorFromWindow(hwnd, MONITOR_DEFAULTTONULL) };

        if handle.is_invalid() {
            return None;
        }

        Some(MonitorHandle(handle.0 as isize))
    }

    fn set_window_capture_exclusion(&self, window: WindowHandle, excluded: bool) -> bool {
        let hwnd = HWND(window.0 as *mut core::ffi::c_void);
        let affinity = if excluded { WDA_EXCLUDEFROMCAPTURE } else { WDA_NONE };

        unsafe { SetWindowDisplayAffinity(hwnd, affinity) }.is_ok()
    }
}
