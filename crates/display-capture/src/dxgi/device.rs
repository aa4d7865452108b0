use windows::Win32::Graphics::{
    Direct3D::D3D_DRIVER_TYPE_UNKNOWN,
    Direct3D11::{
        D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_CREATE_DEVICE_DEBUG,
        D3D11_CREATE_DEVICE_SINGLETHREADED, D3D11_SDK_VERSION, D3D11CreateDevice, ID3D11Device,
        ID3D11DeviceContext,
    },
    Dxgi::IDXGIAdapter1,
};

use crate::driver::DriverError;

use super::win_err;

/// Creates a single-threaded, BGRA-capable device on `adapter`, with the
/// debug layer attached in debug builds only.
pub fn create_device(
    adapter: &IDXGIAdapter1,
) -> Result<(ID3D11Device, ID3D11DeviceContext), DriverError> {
    let mut flags = D3D11_CREATE_DEVICE_SINGLETHREADED | D3D11_CREATE_DEVICE_BGRA_SUPPORT;
    if cfg!(debug_assertions) {
        flags |= D3D11_CREATE_DEVICE_DEBUG;
    }

    let mut device = None;
    let mut context = None;
    unsafe {
        D3D11CreateDevice(
            adapter,
            D3D_DRIVER_TYPE_UNKNOWN,
            None,
            flags,
            None,
            D3D11_SDK_VERSION,
            Some(&mut device),
            None,
            Some(&mut context),
        )
    }
    .map_err(|error| win_err("D3D11CreateDevice", error))?;

    match (device, context) {
        (Some(device), Some(context)) => Ok((device, context)),
        _ => Err(DriverError::new(
            "D3D11CreateDevice",
            0,
            "device or context was none",
        )),
    }
}
