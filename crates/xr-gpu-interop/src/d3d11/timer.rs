use std::ffi::c_void;

use windows::core::Interface;
use windows::Win32::Foundation::{S_FALSE, S_OK};
use windows::Win32::Graphics::Direct3D11::{
    ID3D11Device, ID3D11DeviceContext, ID3D11Query, D3D11_QUERY, D3D11_QUERY_DATA_TIMESTAMP_DISJOINT,
    D3D11_QUERY_DESC, D3D11_QUERY_TIMESTAMP, D3D11_QUERY_TIMESTAMP_DISJOINT,
};

use xr_interop_core::{InteropError, NativeResultExt, Result};

use crate::timer::{TimestampQueries, TimestampReadback};

/// A disjoint query bracketing two timestamp queries on the immediate context.
pub struct D3D11TimestampQueries {
    context: ID3D11DeviceContext,
    disjoint: ID3D11Query,
    start: ID3D11Query,
    end: ID3D11Query,
}

// SAFETY: queries are only issued on the immediate context, which callers use
// from one thread at a time.
unsafe impl Send for D3D11TimestampQueries {}

impl D3D11TimestampQueries {
    pub(crate) fn new(device: &ID3D11Device, context: ID3D11DeviceContext) -> Result<Self> {
        Ok(Self {
            context,
            disjoint: create_query(device, D3D11_QUERY_TIMESTAMP_DISJOINT)?,
            start: create_query(device, D3D11_QUERY_TIMESTAMP)?,
            end: create_query(device, D3D11_QUERY_TIMESTAMP)?,
        })
    }
}

fn create_query(device: &ID3D11Device, kind: D3D11_QUERY) -> Result<ID3D11Query> {
    let desc = D3D11_QUERY_DESC {
        Query: kind,
        ..Default::default()
    };
    let mut query = None;
    unsafe { device.CreateQuery(&desc, Some(&mut query as *mut _)) }.native("CreateQuery")?;
    query.ok_or(InteropError::NullNativePointer)
}

/// Non-blocking `GetData`: `Ok(None)` while the query is still in flight.
///
/// The wrapped `GetData` folds `S_FALSE` into success, so the vtable is
/// called directly to tell "not ready" apart from "done".
fn get_data<T: Default>(context: &ID3D11DeviceContext, query: &ID3D11Query) -> Result<Option<T>> {
    let mut data = T::default();
    let hr = unsafe {
        (Interface::vtable(context).GetData)(
            Interface::as_raw(context),
            Interface::as_raw(query),
            &mut data as *mut T as *mut c_void,
            std::mem::size_of::<T>() as u32,
            0,
        )
    };
    if hr == S_OK {
        Ok(Some(data))
    } else if hr == S_FALSE {
        Ok(None)
    } else {
        Err(InteropError::native("ID3D11DeviceContext::GetData", hr.0))
    }
}

impl TimestampQueries for D3D11TimestampQueries {
    fn begin(&mut self) -> Result<()> {
        unsafe {
            self.context.Begin(&self.disjoint);
            self.context.End(&self.start);
        }
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        unsafe {
            self.context.End(&self.end);
            self.context.End(&self.disjoint);
        }
        Ok(())
    }

    fn read(&mut self) -> Result<Option<TimestampReadback>> {
        let Some(start) = get_data::<u64>(&self.context, &self.start)? else {
            return Ok(None);
        };
        let Some(end) = get_data::<u64>(&self.context, &self.end)? else {
            return Ok(None);
        };
        let Some(disjoint) =
            get_data::<D3D11_QUERY_DATA_TIMESTAMP_DISJOINT>(&self.context, &self.disjoint)?
        else {
            return Ok(None);
        };
        Ok(Some(TimestampReadback {
            start,
            end,
            frequency: disjoint.Frequency,
            disjoint: disjoint.Disjoint.as_bool(),
        }))
    }
}
