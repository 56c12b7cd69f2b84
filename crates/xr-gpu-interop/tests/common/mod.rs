//! Shared setup for the native integration tests. Everything runs on the
//! WARP software adapter so the tests work on headless CI machines.

#![allow(dead_code)]

use std::ffi::c_void;

use windows::core::Interface;
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT, DXGI_FORMAT_R32_TYPELESS, DXGI_SAMPLE_DESC};
use windows::Win32::Graphics::Dxgi::{CreateDXGIFactory1, IDXGIAdapter1, IDXGIFactory4};

use xr_gpu_interop::d3d11::{D3D11Device, D3D11Texture};
use xr_gpu_interop::d3d12::{D3D12Device, D3D12Texture};
use xr_gpu_interop::{
    create_composition_device, AdapterLuid, Api, DeviceOptions, GenericFormat, GraphicsDevice,
    GraphicsTexture, TextureDescriptor, UsageFlags,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn warp_luid() -> anyhow::Result<AdapterLuid> {
    let factory: IDXGIFactory4 = unsafe { CreateDXGIFactory1() }?;
    let adapter: IDXGIAdapter1 = unsafe { factory.EnumWarpAdapter() }?;
    let desc = unsafe { adapter.GetDesc1() }?;
    Ok(desc.AdapterLuid.into())
}

/// Legacy D3D11 handles, no debug layer.
pub fn options() -> DeviceOptions {
    DeviceOptions {
        prefer_nt_handles: false,
        debug_layer: false,
    }
}

pub fn warp_device(api: Api) -> anyhow::Result<Box<dyn GraphicsDevice>> {
    init_tracing();
    Ok(create_composition_device(api, warp_luid()?, &options())?)
}

pub fn color_descriptor(width: u32, height: u32) -> TextureDescriptor {
    TextureDescriptor::new_2d(
        i64::from(GenericFormat::R8G8B8A8_UNORM.0),
        width,
        height,
        UsageFlags::COLOR_ATTACHMENT | UsageFlags::SAMPLED,
    )
}

/// Every combination of the named usage flags a texture can be created with.
/// Depth never combines with color or unordered access.
pub fn creatable_usages() -> impl Iterator<Item = UsageFlags> {
    (0..16u64)
        .map(|i| {
            let mut usage = UsageFlags::empty();
            usage.set(UsageFlags::COLOR_ATTACHMENT, i & 1 != 0);
            usage.set(UsageFlags::DEPTH_STENCIL_ATTACHMENT, i & 2 != 0);
            usage.set(UsageFlags::SAMPLED, i & 4 != 0);
            usage.set(UsageFlags::UNORDERED_ACCESS, i & 8 != 0);
            usage
        })
        .filter(|usage| {
            !usage.contains(UsageFlags::DEPTH_STENCIL_ATTACHMENT)
                || !usage.intersects(UsageFlags::COLOR_ATTACHMENT | UsageFlags::UNORDERED_ACCESS)
        })
}

/// A 2D descriptor in a format that accepts `usage`. Depth uses a typeless
/// format so it can also be sampled.
pub fn descriptor_for_usage(usage: UsageFlags) -> TextureDescriptor {
    let format = if usage.contains(UsageFlags::DEPTH_STENCIL_ATTACHMENT) {
        i64::from(DXGI_FORMAT_R32_TYPELESS.0)
    } else {
        i64::from(GenericFormat::R8G8B8A8_UNORM.0)
    };
    TextureDescriptor::new_2d(format, 64, 64, usage)
}

pub fn as_d3d11(device: &dyn GraphicsDevice) -> &D3D11Device {
    device
        .as_any()
        .downcast_ref::<D3D11Device>()
        .expect("not a D3D11 device")
}

pub fn as_d3d11_texture(texture: &dyn GraphicsTexture) -> &D3D11Texture {
    texture
        .as_any()
        .downcast_ref::<D3D11Texture>()
        .expect("not a D3D11 texture")
}

pub fn as_d3d12(device: &dyn GraphicsDevice) -> &D3D12Device {
    device
        .as_any()
        .downcast_ref::<D3D12Device>()
        .expect("not a D3D12 device")
}

pub fn as_d3d12_texture(texture: &dyn GraphicsTexture) -> &D3D12Texture {
    texture
        .as_any()
        .downcast_ref::<D3D12Texture>()
        .expect("not a D3D12 texture")
}

/// Submit everything recorded on the immediate context so far.
pub fn flush(device: &D3D11Device) {
    unsafe { device.context().Flush() };
}

/// The normalized color an RGBA8 texel packs, red in the low byte.
fn unpack_rgba8(texel: u32) -> [f32; 4] {
    texel.to_le_bytes().map(|channel| f32::from(channel) / 255.0)
}

/// Clear a render-target texture to `texel` on the device's queue and wait
/// for the clear to finish.
pub fn clear_rgba8_d3d12(
    device: &D3D12Device,
    texture: &D3D12Texture,
    texel: u32,
) -> anyhow::Result<()> {
    let native = device.device();
    let heap_desc = D3D12_DESCRIPTOR_HEAP_DESC {
        Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
        NumDescriptors: 1,
        ..Default::default()
    };
    let heap: ID3D12DescriptorHeap = unsafe { native.CreateDescriptorHeap(&heap_desc) }?;
    let target = unsafe { heap.GetCPUDescriptorHandleForHeapStart() };
    unsafe { native.CreateRenderTargetView(texture.resource(), None, target) };

    let allocator: ID3D12CommandAllocator =
        unsafe { native.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }?;
    let list: ID3D12GraphicsCommandList =
        unsafe { native.CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &allocator, None) }?;
    unsafe {
        list.ClearRenderTargetView(target, &unpack_rgba8(texel), None);
        list.Close()?;
        device
            .queue()
            .ExecuteCommandLists(&[Some(list.cast::<ID3D12CommandList>()?)]);
    }

    device.create_fence(false)?.wait_on_cpu(1)?;
    Ok(())
}

/// Fill every texel of a single-mip RGBA8 texture with `texel`.
pub fn fill_rgba8(device: &D3D11Device, texture: &D3D11Texture, width: u32, height: u32, texel: u32) {
    let data = vec![texel; (width * height) as usize];
    unsafe {
        device.context().UpdateSubresource(
            texture.texture(),
            0,
            None,
            data.as_ptr() as *const c_void,
            width * 4,
            0,
        );
    }
}

/// Copy a single-mip RGBA8 texture to a staging texture and read its first texel.
pub fn read_first_texel(
    device: &D3D11Device,
    texture: &D3D11Texture,
    width: u32,
    height: u32,
) -> anyhow::Result<u32> {
    let desc = D3D11_TEXTURE2D_DESC {
        Width: width,
        Height: height,
        MipLevels: 1,
        ArraySize: 1,
        Format: DXGI_FORMAT(GenericFormat::R8G8B8A8_UNORM.0 as i32),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Usage: D3D11_USAGE_STAGING,
        BindFlags: 0,
        CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
        MiscFlags: 0,
    };
    let mut staging = None;
    unsafe {
        device
            .device()
            .CreateTexture2D(&desc, None, Some(&mut staging as *mut _))
    }?;
    let staging = staging.ok_or_else(|| anyhow::anyhow!("CreateTexture2D returned no texture"))?;

    let context = device.context();
    unsafe { context.CopyResource(&staging, texture.texture()) };

    let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
    unsafe { context.Map(&staging, 0, D3D11_MAP_READ, 0, Some(&mut mapped)) }?;
    let texel = unsafe { (mapped.pData as *const u32).read() };
    unsafe { context.Unmap(&staging, 0) };
    Ok(texel)
}
