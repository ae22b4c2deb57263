//! 按 z 方向水平切片调度的数据并行原语.
//!
//! 打开 `rayon` feature 时借助 `rayon` 并行执行, 否则串行执行.
//! 每个任务只写入自己独占的切片, 因此两种模式的结果完全一致.

use ndarray::{Array3, ArrayView2, ArrayViewMut2, Axis};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

        /// 对每个水平切片执行 `op`, 按 z 升序收集结果.
        pub(crate) fn map_z_slices<T, R, F>(data: &Array3<T>, op: F) -> Vec<R>
        where
            T: Sync,
            R: Send,
            F: Fn(usize, ArrayView2<'_, T>) -> R + Sync + Send,
        {
            data.axis_iter(Axis(0))
                .into_par_iter()
                .enumerate()
                .map(|(z, s)| op(z, s))
                .collect()
        }

        /// 对每个可变水平切片执行 `op`.
        pub(crate) fn for_each_z_slice_mut<T, F>(data: &mut Array3<T>, op: F)
        where
            T: Send + Sync,
            F: Fn(usize, ArrayViewMut2<'_, T>) + Sync + Send,
        {
            data.axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(z, s)| op(z, s));
        }

        /// 对 `items` 的每个元素执行 `op`, 保持原顺序收集结果.
        pub(crate) fn map_vec<I, R, F>(items: Vec<I>, op: F) -> Vec<R>
        where
            I: Send,
            R: Send,
            F: Fn(I) -> R + Sync + Send,
        {
            items.into_par_iter().map(op).collect()
        }
    } else {
        /// 对每个水平切片执行 `op`, 按 z 升序收集结果.
        pub(crate) fn map_z_slices<T, R, F>(data: &Array3<T>, op: F) -> Vec<R>
        where
            F: Fn(usize, ArrayView2<'_, T>) -> R,
        {
            data.axis_iter(Axis(0))
                .enumerate()
                .map(|(z, s)| op(z, s))
                .collect()
        }

        /// 对每个可变水平切片执行 `op`.
        pub(crate) fn for_each_z_slice_mut<T, F>(data: &mut Array3<T>, op: F)
        where
            F: Fn(usize, ArrayViewMut2<'_, T>),
        {
            data.axis_iter_mut(Axis(0))
                .enumerate()
                .for_each(|(z, s)| op(z, s));
        }

        /// 对 `items` 的每个元素执行 `op`, 保持原顺序收集结果.
        pub(crate) fn map_vec<I, R, F>(items: Vec<I>, op: F) -> Vec<R>
        where
            F: Fn(I) -> R,
        {
            items.into_iter().map(op).collect()
        }
    }
}
