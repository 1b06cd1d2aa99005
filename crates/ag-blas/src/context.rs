use std::sync::{Arc, OnceLock};

use log::debug;

use crate::backend::{BlasBackend, StreamId};
use crate::capability::ComputeCapability;
use crate::dispatch::DispatchTable;
use crate::error::Result;

/// Per-device execution context handed to kernels.
///
/// Carries the backend, the device id, the execution stream new handles are
/// bound to, and the int8 dispatch table. The device's compute capability is
/// queried from the backend on first use and cached for the context's
/// lifetime.
#[derive(Debug)]
pub struct DeviceContext {
    backend: Arc<dyn BlasBackend>,
    device_id: usize,
    exec_stream: StreamId,
    dispatch: DispatchTable,
    capability: OnceLock<ComputeCapability>,
}

impl DeviceContext {
    /// Creates a context with a fresh execution stream on `device_id`.
    pub fn new(backend: Arc<dyn BlasBackend>, device_id: usize) -> Result<Self> {
        let exec_stream = backend.create_stream(device_id)?;
        Ok(Self::with_stream(backend, device_id, exec_stream))
    }

    /// Creates a context around an existing execution stream.
    pub fn with_stream(
        backend: Arc<dyn BlasBackend>,
        device_id: usize,
        exec_stream: StreamId,
    ) -> Self {
        DeviceContext {
            backend,
            device_id,
            exec_stream,
            dispatch: DispatchTable::default(),
            capability: OnceLock::new(),
        }
    }

    /// Replaces the int8 dispatch table.
    pub fn with_dispatch(mut self, dispatch: DispatchTable) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn backend(&self) -> &Arc<dyn BlasBackend> {
        &self.backend
    }

    pub fn device_id(&self) -> usize {
        self.device_id
    }

    pub fn exec_stream(&self) -> StreamId {
        self.exec_stream
    }

    pub fn dispatch(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// Compute capability of this context's device.
    pub fn capability(&self) -> Result<ComputeCapability> {
        if let Some(cap) = self.capability.get() {
            return Ok(*cap);
        }
        let cap = self.backend.device_capability(self.device_id)?;
        debug!(
            "device {} on {} backend reports compute capability {} (arch {})",
            self.device_id,
            self.backend.name(),
            cap,
            cap.arch()
        );
        Ok(*self.capability.get_or_init(|| cap))
    }

    /// Waits for all work enqueued on the execution stream.
    pub fn synchronize(&self) -> Result<()> {
        self.backend.synchronize(self.exec_stream)
    }
}
