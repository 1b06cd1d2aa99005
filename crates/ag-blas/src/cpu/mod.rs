pub mod gemm;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::backend::{
    BlasBackend, ColumnMajorCall, DataType, EntryPoint, GemmAlgo, MixedTypes, RawHandle,
    StreamId, ToolchainVersion,
};
use crate::capability::ComputeCapability;
use crate::error::{BlasError, BlasStatus, Result};

/// Capability reported for devices without an explicit `with_device` entry.
const DEFAULT_CAPABILITY: ComputeCapability = ComputeCapability::new(8, 0);

#[derive(Debug, Default)]
struct HostState {
    next_id: u64,
    streams: HashSet<StreamId>,
    handles: HashMap<RawHandle, Option<StreamId>>,
    calls: Vec<EntryPoint>,
    failures: HashMap<EntryPoint, BlasStatus>,
}

/// Pure-Rust BLAS backend executing on the host.
///
/// Implements the column-major contract of the vendor library with plain
/// loops. Work runs eagerly when enqueued, so stream order is trivially kept
/// and `synchronize` only validates the stream. Every call is appended to a
/// call log, and a failure status can be injected per entry point.
#[derive(Debug)]
pub struct CpuBlas {
    capabilities: HashMap<usize, ComputeCapability>,
    toolchain: ToolchainVersion,
    state: Mutex<HostState>,
}

impl CpuBlas {
    pub fn new() -> Self {
        CpuBlas {
            capabilities: HashMap::new(),
            toolchain: ToolchainVersion::new(12, 0),
            state: Mutex::new(HostState::default()),
        }
    }

    /// Sets the compute capability reported for `device_id`.
    pub fn with_device(mut self, device_id: usize, capability: ComputeCapability) -> Self {
        self.capabilities.insert(device_id, capability);
        self
    }

    /// Sets the toolchain version reported by `toolchain()`.
    pub fn with_toolchain(mut self, toolchain: ToolchainVersion) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Makes every later call to `entry` fail with `status`.
    pub fn fail_on(&self, entry: EntryPoint, status: BlasStatus) {
        self.state().failures.insert(entry, status);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Entry points called so far, in call order.
    pub fn calls(&self) -> Vec<EntryPoint> {
        self.state().calls.clone()
    }

    /// Number of GEMM calls issued so far, across all entry points.
    pub fn gemm_calls(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    EntryPoint::Sgemm | EntryPoint::GemmEx | EntryPoint::SgemmEx
                )
            })
            .count()
    }

    /// Number of handles created and not yet destroyed.
    pub fn live_handles(&self) -> usize {
        self.state().handles.len()
    }

    /// Stream a live handle is bound to.
    pub fn handle_stream(&self, handle: RawHandle) -> Option<StreamId> {
        self.state().handles.get(&handle).copied().flatten()
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call and returns the locked state, or the injected failure.
    fn enter(&self, entry: EntryPoint) -> Result<MutexGuard<'_, HostState>> {
        let mut state = self.state();
        state.calls.push(entry);
        match state.failures.get(&entry) {
            Some(status) => Err(BlasError::status(entry, *status)),
            None => Ok(state),
        }
    }

    fn check_handle(state: &HostState, entry: EntryPoint, handle: RawHandle) -> Result<()> {
        if state.handles.contains_key(&handle) {
            Ok(())
        } else {
            Err(BlasError::status(entry, BlasStatus::NotInitialized))
        }
    }

    fn check_call<T>(entry: EntryPoint, call: &ColumnMajorCall<'_, T>, c_len: usize) -> Result<()> {
        gemm::validate(call, c_len).map_err(|status| BlasError::status(entry, status))
    }

    fn check_types(entry: EntryPoint, types: MixedTypes) -> Result<()> {
        if types == MixedTypes::I8_I8_F32 {
            Ok(())
        } else {
            Err(BlasError::status(entry, BlasStatus::NotSupported))
        }
    }
}

impl Default for CpuBlas {
    fn default() -> Self {
        Self::new()
    }
}

impl BlasBackend for CpuBlas {
    fn name(&self) -> &str {
        "cpu"
    }

    fn toolchain(&self) -> ToolchainVersion {
        self.toolchain
    }

    fn device_capability(&self, device_id: usize) -> Result<ComputeCapability> {
        self.enter(EntryPoint::DeviceQuery)?;
        Ok(self
            .capabilities
            .get(&device_id)
            .copied()
            .unwrap_or(DEFAULT_CAPABILITY))
    }

    fn create_stream(&self, device_id: usize) -> Result<StreamId> {
        let mut state = self.enter(EntryPoint::CreateStream)?;
        state.next_id += 1;
        let stream = StreamId(state.next_id);
        state.streams.insert(stream);
        debug!("cpu blas: stream {:?} on device {}", stream, device_id);
        Ok(stream)
    }

    fn synchronize(&self, stream: StreamId) -> Result<()> {
        let state = self.enter(EntryPoint::Synchronize)?;
        if state.streams.contains(&stream) {
            Ok(())
        } else {
            Err(BlasError::status(
                EntryPoint::Synchronize,
                BlasStatus::InvalidValue,
            ))
        }
    }

    fn create_handle(&self) -> Result<RawHandle> {
        let mut state = self.enter(EntryPoint::CreateHandle)?;
        state.next_id += 1;
        let handle = RawHandle(state.next_id);
        state.handles.insert(handle, None);
        Ok(handle)
    }

    fn destroy_handle(&self, handle: RawHandle) -> Result<()> {
        let mut state = self.enter(EntryPoint::DestroyHandle)?;
        match state.handles.remove(&handle) {
            Some(_) => Ok(()),
            None => Err(BlasError::status(
                EntryPoint::DestroyHandle,
                BlasStatus::NotInitialized,
            )),
        }
    }

    fn set_stream(&self, handle: RawHandle, stream: StreamId) -> Result<()> {
        let mut state = self.enter(EntryPoint::SetStream)?;
        Self::check_handle(&state, EntryPoint::SetStream, handle)?;
        if !state.streams.contains(&stream) {
            return Err(BlasError::status(
                EntryPoint::SetStream,
                BlasStatus::InvalidValue,
            ));
        }
        state.handles.insert(handle, Some(stream));
        Ok(())
    }

    fn sgemm(
        &self,
        handle: RawHandle,
        call: &ColumnMajorCall<'_, f32>,
        c: &mut [f32],
    ) -> Result<()> {
        let state = self.enter(EntryPoint::Sgemm)?;
        Self::check_handle(&state, EntryPoint::Sgemm, handle)?;
        drop(state);
        Self::check_call(EntryPoint::Sgemm, call, c.len())?;
        gemm::sgemm(call, c);
        Ok(())
    }

    fn gemm_ex(
        &self,
        handle: RawHandle,
        call: &ColumnMajorCall<'_, i8>,
        types: MixedTypes,
        compute: DataType,
        _algo: GemmAlgo,
        c: &mut [f32],
    ) -> Result<()> {
        let state = self.enter(EntryPoint::GemmEx)?;
        Self::check_handle(&state, EntryPoint::GemmEx, handle)?;
        drop(state);
        Self::check_types(EntryPoint::GemmEx, types)?;
        if compute != DataType::R32F {
            return Err(BlasError::status(
                EntryPoint::GemmEx,
                BlasStatus::NotSupported,
            ));
        }
        Self::check_call(EntryPoint::GemmEx, call, c.len())?;
        gemm::i8_gemm(call, c);
        Ok(())
    }

    fn sgemm_ex(
        &self,
        handle: RawHandle,
        call: &ColumnMajorCall<'_, i8>,
        types: MixedTypes,
        c: &mut [f32],
    ) -> Result<()> {
        let state = self.enter(EntryPoint::SgemmEx)?;
        Self::check_handle(&state, EntryPoint::SgemmEx, handle)?;
        drop(state);
        Self::check_types(EntryPoint::SgemmEx, types)?;
        Self::check_call(EntryPoint::SgemmEx, call, c.len())?;
        gemm::i8_gemm(call, c);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Operation;

    fn blas() -> CpuBlas {
        CpuBlas::new()
    }

    fn unit_call<'a, T>(a: &'a [T], b: &'a [T]) -> ColumnMajorCall<'a, T> {
        ColumnMajorCall {
            op_a: Operation::NoTranspose,
            op_b: Operation::NoTranspose,
            m: 1,
            n: 1,
            k: 1,
            alpha: 1.0,
            a,
            lda: 1,
            b,
            ldb: 1,
            beta: 0.0,
            ldc: 1,
        }
    }

    #[test]
    fn test_handle_lifecycle() {
        let b = blas();
        let stream = b.create_stream(0).unwrap();
        let h = b.create_handle().unwrap();
        assert_eq!(b.handle_stream(h), None);
        b.set_stream(h, stream).unwrap();
        assert_eq!(b.handle_stream(h), Some(stream));
        assert_eq!(b.live_handles(), 1);
        b.destroy_handle(h).unwrap();
        assert_eq!(b.live_handles(), 0);
        assert!(b.destroy_handle(h).is_err());
    }

    #[test]
    fn test_set_stream_unknown_stream() {
        let b = blas();
        let h = b.create_handle().unwrap();
        let err = b.set_stream(h, StreamId(999)).unwrap_err();
        assert_eq!(
            err,
            BlasError::status(EntryPoint::SetStream, BlasStatus::InvalidValue)
        );
    }

    #[test]
    fn test_gemm_with_unknown_handle() {
        let b = blas();
        let mut c = [0.0f32];
        let err = b
            .sgemm(RawHandle(42), &unit_call(&[1.0], &[1.0]), &mut c)
            .unwrap_err();
        assert_eq!(
            err,
            BlasError::status(EntryPoint::Sgemm, BlasStatus::NotInitialized)
        );
    }

    #[test]
    fn test_unsupported_types() {
        let b = blas();
        let h = b.create_handle().unwrap();
        let types = MixedTypes {
            a: DataType::R8I,
            b: DataType::R8I,
            c: DataType::R8I,
        };
        let mut c = [0.0f32];
        let err = b
            .sgemm_ex(h, &unit_call(&[1i8], &[1i8]), types, &mut c)
            .unwrap_err();
        assert_eq!(
            err,
            BlasError::status(EntryPoint::SgemmEx, BlasStatus::NotSupported)
        );
    }

    #[test]
    fn test_injected_failure_and_clear() {
        let b = blas();
        b.fail_on(EntryPoint::CreateHandle, BlasStatus::AllocFailed);
        assert_eq!(
            b.create_handle().unwrap_err(),
            BlasError::status(EntryPoint::CreateHandle, BlasStatus::AllocFailed)
        );
        b.clear_failures();
        assert!(b.create_handle().is_ok());
        assert_eq!(
            b.calls(),
            vec![EntryPoint::CreateHandle, EntryPoint::CreateHandle]
        );
    }

    #[test]
    fn test_device_capability_defaults() {
        let b = blas().with_device(1, ComputeCapability::SM_61);
        assert_eq!(b.device_capability(1).unwrap(), ComputeCapability::SM_61);
        assert_eq!(b.device_capability(0).unwrap(), DEFAULT_CAPABILITY);
    }

    #[test]
    fn test_gemm_ex_and_sgemm_ex_agree() {
        let b = blas();
        let h = b.create_handle().unwrap();
        let a = [3i8, -4];
        let x = [5i8, 6];
        let call = ColumnMajorCall {
            k: 2,
            lda: 1,
            ldb: 2,
            alpha: 0.25,
            ..unit_call(&a, &x)
        };
        let mut c1 = [0.0f32];
        let mut c2 = [0.0f32];
        b.gemm_ex(
            h,
            &call,
            MixedTypes::I8_I8_F32,
            DataType::R32F,
            GemmAlgo::Default,
            &mut c1,
        )
        .unwrap();
        b.sgemm_ex(h, &call, MixedTypes::I8_I8_F32, &mut c2).unwrap();
        assert_eq!(c1, [-2.25]);
        assert_eq!(c1, c2);
        assert_eq!(b.gemm_calls(), 2);
    }

    #[test]
    fn test_synchronize() {
        let b = blas();
        let s = b.create_stream(0).unwrap();
        assert!(b.synchronize(s).is_ok());
        assert!(b.synchronize(StreamId(1234)).is_err());
    }
}
