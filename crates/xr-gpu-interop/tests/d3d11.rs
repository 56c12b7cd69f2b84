#![cfg(target_os = "windows")]

mod common;

use std::time::Duration;

use common::*;
use xr_gpu_interop::{Api, InteropError};
use xr_interop_core::usage::d3d11 as d3d11_usage;

#[test]
fn created_texture_reports_requested_usage() -> anyhow::Result<()> {
    let device = warp_device(Api::D3D11)?;

    let mut created = 0;
    for usage in creatable_usages() {
        let descriptor = descriptor_for_usage(usage);
        let texture = device.create_texture(&descriptor, false)?;
        assert_eq!(
            texture.descriptor().usage,
            d3d11_usage::representable(usage),
            "usage {usage:?}"
        );
        assert_eq!(texture.descriptor().format, descriptor.format);
        created += 1;
    }
    // 16 combinations less the 6 that pair depth with color or UAV.
    assert_eq!(created, 10);
    Ok(())
}

#[test]
fn unshared_resources_refuse_export() -> anyhow::Result<()> {
    let device = warp_device(Api::D3D11)?;

    let texture = device.create_texture(&color_descriptor(16, 16), false)?;
    assert!(!texture.is_shareable());
    assert!(matches!(
        texture.export_handle(),
        Err(InteropError::NotShareable)
    ));

    let fence = device.create_fence(false)?;
    assert!(!fence.is_shareable());
    assert!(matches!(fence.export_handle(), Err(InteropError::NotShareable)));
    Ok(())
}

#[test]
fn shared_texture_exports_legacy_handle_by_default() -> anyhow::Result<()> {
    let device = warp_device(Api::D3D11)?;
    let texture = device.create_texture(&color_descriptor(16, 16), true)?;
    assert!(texture.is_shareable());

    let handle = texture.export_handle()?;
    assert!(!handle.is_nt_handle());
    assert_eq!(handle.origin(), Api::D3D11);
    Ok(())
}

#[test]
fn timer_query_is_consumed() -> anyhow::Result<()> {
    let device = warp_device(Api::D3D11)?;
    let mut timer = device.create_timer()?;

    timer.start()?;
    let texture = device.create_texture(&color_descriptor(256, 256), false)?;
    let copy = device.create_texture(&color_descriptor(256, 256), false)?;
    device.copy_texture(texture.as_ref(), copy.as_ref())?;
    timer.stop()?;

    // The first query may be 0 on a very fast adapter; the second must be.
    let _ = timer.query();
    assert_eq!(timer.query(), 0);
    Ok(())
}

#[test]
fn wrapped_texture_keeps_caller_descriptor() -> anyhow::Result<()> {
    let device = warp_device(Api::D3D11)?;
    let texture = device.create_texture(&color_descriptor(32, 32), false)?;

    let claimed = color_descriptor(8, 8).with_array_size(2);
    let wrapped = unsafe { device.open_texture_ptr(texture.native_texture_ptr(), &claimed) }?;
    assert_eq!(*wrapped.descriptor(), claimed);
    assert_eq!(wrapped.native_texture_ptr(), texture.native_texture_ptr());

    // Neither writing the native texture nor wrapping it again under another
    // descriptor changes what the first wrapper reports.
    fill_rgba8(
        as_d3d11(device.as_ref()),
        as_d3d11_texture(texture.as_ref()),
        32,
        32,
        0xff80_4020,
    );
    let rewrapped =
        unsafe { device.open_texture_ptr(texture.native_texture_ptr(), &color_descriptor(4, 4)) }?;
    assert_eq!(rewrapped.descriptor().width, 4);
    assert_eq!(*wrapped.descriptor(), claimed);
    Ok(())
}

#[test]
fn created_descriptor_survives_writes() -> anyhow::Result<()> {
    let device = warp_device(Api::D3D11)?;
    let texture = device.create_texture(&color_descriptor(16, 16), false)?;
    let before = *texture.descriptor();

    let source = device.create_texture(&color_descriptor(16, 16), false)?;
    fill_rgba8(
        as_d3d11(device.as_ref()),
        as_d3d11_texture(source.as_ref()),
        16,
        16,
        0xff00_00ff,
    );
    device.copy_texture(source.as_ref(), texture.as_ref())?;

    assert_eq!(*texture.descriptor(), before);
    let texel = read_first_texel(
        as_d3d11(device.as_ref()),
        as_d3d11_texture(texture.as_ref()),
        16,
        16,
    )?;
    assert_eq!(texel, 0xff00_00ff);
    Ok(())
}

#[test]
fn null_pointer_wrap_fails() -> anyhow::Result<()> {
    let device = warp_device(Api::D3D11)?;
    let result = unsafe { device.open_texture_ptr(std::ptr::null_mut(), &color_descriptor(4, 4)) };
    assert!(matches!(result, Err(InteropError::NullNativePointer)));
    Ok(())
}

#[test]
fn copy_rejects_texture_of_another_device() -> anyhow::Result<()> {
    let first = warp_device(Api::D3D11)?;
    let second = warp_device(Api::D3D11)?;

    let ours = first.create_texture(&color_descriptor(16, 16), false)?;
    let theirs = second.create_texture(&color_descriptor(16, 16), false)?;
    assert!(matches!(
        first.copy_texture(ours.as_ref(), theirs.as_ref()),
        Err(InteropError::DeviceMismatch(Api::D3D11))
    ));
    Ok(())
}

#[test]
fn copy_rejects_mismatched_extents() -> anyhow::Result<()> {
    let device = warp_device(Api::D3D11)?;
    let small = device.create_texture(&color_descriptor(16, 16), false)?;
    let large = device.create_texture(&color_descriptor(32, 32), false)?;

    assert!(matches!(
        device.copy_texture(small.as_ref(), large.as_ref()),
        Err(InteropError::IncompatibleCopy {
            source_width: 16,
            destination_width: 32,
            ..
        })
    ));
    Ok(())
}

#[test]
fn legacy_handle_cannot_open_fence() -> anyhow::Result<()> {
    let device = warp_device(Api::D3D11)?;
    let texture = device.create_texture(&color_descriptor(16, 16), true)?;
    let handle = texture.export_handle()?;

    assert!(matches!(
        device.open_fence(&handle),
        Err(InteropError::InvalidHandleKind { api: Api::D3D11, .. })
    ));
    Ok(())
}

#[test]
fn fence_orders_work_between_devices() -> anyhow::Result<()> {
    const WIDTH: u32 = 16;
    const HEIGHT: u32 = 16;
    const INITIAL: u32 = 0xffff_0000;
    const PRODUCED: u32 = 0xff00_00ff;

    let producer = warp_device(Api::D3D11)?;
    let consumer = warp_device(Api::D3D11)?;

    let source = producer.create_texture(&color_descriptor(WIDTH, HEIGHT), true)?;
    let opened = consumer.open_texture(&source.export_handle()?, source.descriptor())?;
    let snapshot = consumer.create_texture(&color_descriptor(WIDTH, HEIGHT), false)?;

    let fence = producer.create_fence(true)?;
    let imported = consumer.open_fence(&fence.export_handle()?)?;

    fill_rgba8(
        as_d3d11(producer.as_ref()),
        as_d3d11_texture(source.as_ref()),
        WIDTH,
        HEIGHT,
        INITIAL,
    );
    fence.wait_on_cpu(1)?;

    // Queue the consumer's copy behind value 5 before the producer writes.
    imported.wait_on_device(5)?;
    consumer.copy_texture(opened.as_ref(), snapshot.as_ref())?;
    flush(as_d3d11(consumer.as_ref()));
    std::thread::sleep(Duration::from_millis(50));
    assert!(imported.completed_value() < 5);

    fill_rgba8(
        as_d3d11(producer.as_ref()),
        as_d3d11_texture(source.as_ref()),
        WIDTH,
        HEIGHT,
        PRODUCED,
    );
    fence.signal(5)?;
    imported.wait_on_cpu(6)?;

    let texel = read_first_texel(
        as_d3d11(consumer.as_ref()),
        as_d3d11_texture(snapshot.as_ref()),
        WIDTH,
        HEIGHT,
    )?;
    assert_eq!(texel, PRODUCED);
    Ok(())
}
