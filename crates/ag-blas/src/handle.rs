use std::sync::Arc;

use log::{debug, warn};

use crate::backend::{BlasBackend, RawHandle, StreamId};
use crate::context::DeviceContext;
use crate::error::Result;

/// An owned backend handle bound to one execution stream.
///
/// Released when dropped. Not `Clone`: exactly one engine owns it.
#[derive(Debug)]
pub struct BlasHandle {
    backend: Arc<dyn BlasBackend>,
    raw: RawHandle,
    stream: StreamId,
}

impl BlasHandle {
    /// Creates a handle and binds it to the context's execution stream.
    ///
    /// If binding fails the new handle is released before the error is
    /// returned.
    pub fn create(ctx: &DeviceContext) -> Result<Self> {
        let backend = Arc::clone(ctx.backend());
        let raw = backend.create_handle()?;
        let handle = BlasHandle {
            backend,
            raw,
            stream: ctx.exec_stream(),
        };
        handle.backend.set_stream(handle.raw(), handle.stream())?;
        debug!(
            "created {} blas handle {:?} on stream {:?}",
            handle.backend().name(),
            handle.raw(),
            handle.stream()
        );
        Ok(handle)
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    pub fn stream(&self) -> StreamId {
        self.stream
    }

    pub fn backend(&self) -> &dyn BlasBackend {
        self.backend.as_ref()
    }
}

impl Drop for BlasHandle {
    fn drop(&mut self) {
        if let Err(e) = self.backend.destroy_handle(self.raw) {
            warn!("failed to destroy blas handle {:?}: {}", self.raw, e);
        }
    }
}
