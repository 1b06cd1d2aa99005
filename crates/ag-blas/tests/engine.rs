use std::sync::Arc;

use ag_blas::{
    BlasBackend, ComputeCapability, CpuBlas, DeviceContext, DispatchTable, EntryPoint,
    Int8GemmEngine, Int8Route, Int8Rule, SgemmEngine, ToolchainVersion,
};
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn naive_f32(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut c = vec![0.0f32; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0f32;
            for p in 0..k {
                sum += a[i * k + p] * b[p * n + j];
            }
            c[i * n + j] = sum;
        }
    }
    c
}

#[test]
fn random_sgemm_matches_reference() {
    let blas = Arc::new(CpuBlas::new());
    let ctx = DeviceContext::new(blas, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let (m, k, n) = (17, 33, 9);
    let a: Vec<f32> = (0..m * k).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let b: Vec<f32> = (0..k * n).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let mut gemm = SgemmEngine::new();
    gemm.init(false, false, m, n, k, &ctx).unwrap();
    let mut c = vec![0.0f32; m * n];
    gemm.run(1.0, 0.0, &a, &b, &mut c, &ctx).unwrap();
    ctx.synchronize().unwrap();

    let expected = naive_f32(&a, &b, m, k, n);
    for (got, want) in c.iter().zip(expected.iter()) {
        assert_relative_eq!(got, want, epsilon = 1e-4);
    }
}

#[test]
fn random_int8_gemm_is_exact_before_scaling() {
    let blas = Arc::new(CpuBlas::new().with_device(0, ComputeCapability::SM_61));
    let ctx = DeviceContext::new(blas.clone(), 0).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let (m, k, n) = (5, 64, 6);
    let a: Vec<i8> = (0..m * k).map(|_| rng.gen_range(-127..=127)).collect();
    let b: Vec<i8> = (0..k * n).map(|_| rng.gen_range(-127..=127)).collect();

    let mut gemm = Int8GemmEngine::new();
    gemm.init(false, false, m, n, k, &ctx).unwrap();
    let mut c = vec![0.0f32; m * n];
    gemm.run(1.0, 0.0, &a, &b, &mut c, &ctx).unwrap();
    assert_eq!(blas.calls().last(), Some(&EntryPoint::GemmEx));

    for i in 0..m {
        for j in 0..n {
            let exact: i32 = (0..k)
                .map(|p| a[i * k + p] as i32 * b[p * n + j] as i32)
                .sum();
            assert_eq!(c[i * n + j], exact as f32);
        }
    }
}

#[test]
fn custom_dispatch_table_is_honoured() {
    let blas = Arc::new(
        CpuBlas::new()
            .with_device(0, ComputeCapability::new(7, 0))
            .with_toolchain(ToolchainVersion::new(10, 2)),
    );
    let table = DispatchTable::new(Int8Route::SgemmEx).with_rule(
        ComputeCapability::new(7, 0),
        Int8Rule::ToolchainGated {
            min_major: 10,
            preferred: Int8Route::GemmEx,
            fallback: Int8Route::SgemmEx,
        },
    );
    let ctx = DeviceContext::new(blas.clone(), 0)
        .unwrap()
        .with_dispatch(table);

    let mut gemm = Int8GemmEngine::new();
    gemm.init(false, false, 1, 1, 2, &ctx).unwrap();
    let mut c = [0.0f32];
    gemm.run(2.0, 0.0, &[1, 2], &[3, 4], &mut c, &ctx).unwrap();
    assert_eq!(c, [22.0]);
    assert_eq!(blas.calls().last(), Some(&EntryPoint::GemmEx));
}

#[test]
fn engines_on_one_context_own_separate_handles() {
    let blas = Arc::new(CpuBlas::new());
    let ctx = DeviceContext::new(blas.clone(), 0).unwrap();
    let mut first = SgemmEngine::new();
    let mut second = Int8GemmEngine::new();
    first.init(false, false, 1, 1, 1, &ctx).unwrap();
    second.init(false, false, 1, 1, 1, &ctx).unwrap();
    assert_eq!(blas.live_handles(), 2);
    assert_ne!(
        first.handle().unwrap().raw(),
        second.handle().unwrap().raw()
    );
    drop(first);
    assert_eq!(blas.live_handles(), 1);
    assert_eq!(blas.name(), "cpu");
}
