//! Small slice kernels shared by the traversal hot loops.
//!
//! Per-action data is stored flat as `num_actions` consecutive rows of
//! `num_hands` entries; these helpers operate on that layout.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[inline]
pub(crate) fn is_zero(value: f32) -> bool {
    value == 0.0
}

/// Runs `op` over every `row_size`-sized row of `slice`, in parallel when
/// the `rayon` feature is enabled. The call returns only after every row has
/// been processed, which is the join barrier the DCFR updates rely on.
#[cfg(feature = "rayon")]
#[inline]
pub(crate) fn for_each_row(
    slice: &mut [f32],
    row_size: usize,
    op: impl Fn(usize, &mut [f32]) + Sync + Send,
) {
    slice
        .par_chunks_exact_mut(row_size)
        .enumerate()
        .for_each(|(index, row)| op(index, row));
}

/// Serial fallback of [`for_each_row`].
#[cfg(not(feature = "rayon"))]
#[inline]
pub(crate) fn for_each_row(
    slice: &mut [f32],
    row_size: usize,
    op: impl Fn(usize, &mut [f32]) + Sync + Send,
) {
    slice
        .chunks_exact_mut(row_size)
        .enumerate()
        .for_each(|(index, row)| op(index, row));
}

#[inline]
pub(crate) fn mul_slice(lhs: &mut [f32], rhs: &[f32]) {
    lhs.iter_mut().zip(rhs).for_each(|(l, r)| *l *= *r);
}

/// Strided element-wise maximum over every `dst.len()`-sized row of `src`.
#[inline]
pub(crate) fn max_slices(dst: &mut [f32], src: &[f32]) {
    let len = dst.len();
    let mut rows = src.chunks_exact(len);
    if let Some(first) = rows.next() {
        dst.copy_from_slice(first);
    }
    rows.for_each(|row| {
        dst.iter_mut().zip(row).for_each(|(d, s)| *d = d.max(*s));
    });
}

#[inline]
pub(crate) fn mul_slice_scalar(slice: &mut [f32], scalar: f32) {
    slice.iter_mut().for_each(|v| *v *= scalar);
}

#[inline]
pub(crate) fn add_slice(lhs: &mut [f32], rhs: &[f32]) {
    lhs.iter_mut().zip(rhs).for_each(|(l, r)| *l += *r);
}

/// `lhs[i] = lhs[i] / rhs[i]`, falling back to `default` where the
/// denominator is zero.
#[inline]
pub(crate) fn div_slice(lhs: &mut [f32], rhs: &[f32], default: f32) {
    lhs.iter_mut()
        .zip(rhs)
        .for_each(|(l, r)| *l = if is_zero(*r) { default } else { *l / *r });
}

/// Strided summation: adds every `dst.len()`-sized row of `src` into `dst`.
#[inline]
pub(crate) fn sum_slices(dst: &mut [f32], src: &[f32]) {
    let len = dst.len();
    src.chunks_exact(len).for_each(|row| add_slice(dst, row));
}

/// Strided fused multiply-add: `dst[h] += sum over rows of s1 * s2`.
#[inline]
pub(crate) fn fma_slices(dst: &mut [f32], src1: &[f32], src2: &[f32]) {
    let len = dst.len();
    src1.chunks_exact(len)
        .zip(src2.chunks_exact(len))
        .for_each(|(row1, row2)| {
            dst.iter_mut()
                .zip(row1.iter().zip(row2))
                .for_each(|(d, (s1, s2))| *d += *s1 * *s2);
        });
}

/// Extract a reference to a specific "row" from a one-dimensional slice,
/// where the data is conceptually arranged as a two-dimensional array.
#[inline]
pub(crate) fn row<T>(slice: &[T], index: usize, row_size: usize) -> &[T] {
    &slice[index * row_size..(index + 1) * row_size]
}

/// Mutable variant of [`row`].
#[inline]
pub(crate) fn row_mut<T>(slice: &mut [T], index: usize, row_size: usize) -> &mut [T] {
    &mut slice[index * row_size..(index + 1) * row_size]
}
