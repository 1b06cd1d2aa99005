// Column-major GEMM kernels for the host reference backend.

use crate::backend::{ColumnMajorCall, Operation};
use crate::error::BlasStatus;

fn op_dims(op: Operation, rows: usize, cols: usize) -> (usize, usize) {
    match op {
        Operation::NoTranspose => (rows, cols),
        Operation::Transpose => (cols, rows),
    }
}

/// Elements a column-major `rows x cols` matrix with leading dimension `ld`
/// spans.
fn span(rows: usize, cols: usize, ld: usize) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        (cols - 1) * ld + rows
    }
}

/// Checks leading dimensions and buffer lengths the way the vendor library
/// checks its arguments.
pub(crate) fn validate<T>(call: &ColumnMajorCall<'_, T>, c_len: usize) -> Result<(), BlasStatus> {
    let (a_rows, a_cols) = op_dims(call.op_a, call.m, call.k);
    let (b_rows, b_cols) = op_dims(call.op_b, call.k, call.n);

    if call.lda < a_rows.max(1) || call.ldb < b_rows.max(1) || call.ldc < call.m.max(1) {
        return Err(BlasStatus::InvalidValue);
    }
    if call.a.len() < span(a_rows, a_cols, call.lda)
        || call.b.len() < span(b_rows, b_cols, call.ldb)
        || c_len < span(call.m, call.n, call.ldc)
    {
        return Err(BlasStatus::InvalidValue);
    }
    Ok(())
}

#[inline]
fn at<T: Copy>(buf: &[T], op: Operation, ld: usize, row: usize, col: usize) -> T {
    match op {
        Operation::NoTranspose => buf[row + col * ld],
        Operation::Transpose => buf[col + row * ld],
    }
}

/// Writes `alpha * acc + beta * c`, never reading `c` when `beta == 0`.
#[inline]
fn store(c: &mut f32, alpha: f32, acc: f32, beta: f32) {
    *c = if beta == 0.0 {
        alpha * acc
    } else {
        alpha * acc + beta * *c
    };
}

/// f32 x f32 -> f32, f32 accumulation.
pub(crate) fn sgemm(call: &ColumnMajorCall<'_, f32>, c: &mut [f32]) {
    for j in 0..call.n {
        for i in 0..call.m {
            let mut acc = 0.0f32;
            for p in 0..call.k {
                let a = at(call.a, call.op_a, call.lda, i, p);
                let b = at(call.b, call.op_b, call.ldb, p, j);
                acc += a * b;
            }
            store(&mut c[i + j * call.ldc], call.alpha, acc, call.beta);
        }
    }
}

/// i8 x i8 -> f32. Products accumulate exactly in i64 and are scaled once.
///
/// An i32 accumulator overflows once `k * 127^2` passes `i32::MAX`.
pub(crate) fn i8_gemm(call: &ColumnMajorCall<'_, i8>, c: &mut [f32]) {
    for j in 0..call.n {
        for i in 0..call.m {
            let mut acc = 0i64;
            for p in 0..call.k {
                let a = i64::from(at(call.a, call.op_a, call.lda, i, p));
                let b = i64::from(at(call.b, call.op_b, call.ldb, p, j));
                acc += a * b;
            }
            store(&mut c[i + j * call.ldc], call.alpha, acc as f32, call.beta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NN: (Operation, Operation) = (Operation::NoTranspose, Operation::NoTranspose);

    fn call<'a, T>(
        op_a: Operation,
        op_b: Operation,
        (m, n, k): (usize, usize, usize),
        a: &'a [T],
        lda: usize,
        b: &'a [T],
        ldb: usize,
        ldc: usize,
    ) -> ColumnMajorCall<'a, T> {
        ColumnMajorCall {
            op_a,
            op_b,
            m,
            n,
            k,
            alpha: 1.0,
            a,
            lda,
            b,
            ldb,
            beta: 0.0,
            ldc,
        }
    }

    #[test]
    fn test_column_major_sgemm() {
        // A = [1 3; 2 4] and B = [5 7; 6 8] stored column-major.
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let args = call(NN.0, NN.1, (2, 2, 2), &a, 2, &b, 2, 2);
        let mut c = [0.0f32; 4];
        validate(&args, c.len()).unwrap();
        sgemm(&args, &mut c);
        // A*B = [23 31; 34 46], column-major.
        assert_eq!(c, [23.0, 34.0, 31.0, 46.0]);
    }

    #[test]
    fn test_transposed_sgemm() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let args = call(Operation::Transpose, NN.1, (2, 2, 2), &a, 2, &b, 2, 2);
        let mut c = [0.0f32; 4];
        sgemm(&args, &mut c);
        // A^T*B = [1 2; 3 4]*[5 7; 6 8] = [17 23; 39 53].
        assert_eq!(c, [17.0, 39.0, 23.0, 53.0]);
    }

    #[test]
    fn test_i8_gemm_exact_accumulation() {
        let a = [127i8, 127, 127];
        let b = [127i8, 127, 127];
        let args = call(NN.0, NN.1, (1, 1, 3), &a, 1, &b, 3, 1);
        let mut c = [0.0f32];
        validate(&args, c.len()).unwrap();
        i8_gemm(&args, &mut c);
        assert_eq!(c, [48387.0]);
    }

    #[test]
    fn test_i8_gemm_long_inner_dim_does_not_overflow() {
        let k = 140_000;
        let a = vec![127i8; k];
        let b = vec![127i8; k];
        let args = call(NN.0, NN.1, (1, 1, k), &a, 1, &b, k, 1);
        let mut c = [0.0f32];
        validate(&args, c.len()).unwrap();
        i8_gemm(&args, &mut c);
        let exact = k as i64 * 127 * 127;
        assert!(exact > i64::from(i32::MAX));
        assert_eq!(c, [exact as f32]);
    }

    #[test]
    fn test_beta_zero_ignores_nan() {
        let a = [1.0f32];
        let b = [2.0f32];
        let args = call(NN.0, NN.1, (1, 1, 1), &a, 1, &b, 1, 1);
        let mut c = [f32::NAN];
        sgemm(&args, &mut c);
        assert_eq!(c, [2.0]);
    }

    #[test]
    fn test_validate_rejects_bad_leading_dims() {
        let a = [0.0f32; 6];
        let b = [0.0f32; 6];
        let bad_lda = call(NN.0, NN.1, (3, 2, 2), &a, 2, &b, 2, 3);
        assert_eq!(validate(&bad_lda, 6), Err(BlasStatus::InvalidValue));
        let short_c = call(NN.0, NN.1, (3, 2, 2), &a, 3, &b, 2, 3);
        assert_eq!(validate(&short_c, 5), Err(BlasStatus::InvalidValue));
        assert_eq!(validate(&short_c, 6), Ok(()));
    }

    #[test]
    fn test_empty_problem_is_valid() {
        let args = call::<f32>(NN.0, NN.1, (0, 0, 0), &[], 1, &[], 1, 1);
        assert_eq!(validate(&args, 0), Ok(()));
        sgemm(&args, &mut []);
    }
}
