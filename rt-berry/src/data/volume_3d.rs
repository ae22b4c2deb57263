use std::ops::{Index, IndexMut};

use ndarray::{Array3, ArrayView2, ArrayView3, ArrayViewMut3, Axis};

use super::{Region3D, Volume, Volume2D};
use crate::error::GeometryError;
use crate::geometry::{Matrix2, Matrix3, Point2D, Point3D, VolumeTransform};

/// 判断几何信息是否一致时使用的浮点容差.
const GEOMETRY_TOLERANCE: f64 = 1e-6;

/// 三维体素网格的几何信息: 维度、体素间距、原点与方向.
///
/// 构造后不可修改. 体素/物理坐标变换在构造时计算一次.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VolumeGeometry {
    dim: [usize; 3],
    spacing: [f64; 3],
    origin: Point3D,
    direction: Matrix3,
    transform: VolumeTransform,
}

impl VolumeGeometry {
    /// 构建几何信息.
    ///
    /// `dim` 与 `spacing` 均按 `[x, y, z]` 排列, `origin` 为体素 `(0, 0, 0)`
    /// 的物理坐标, `direction` 的三列分别是 x, y, z 体素轴的物理方向.
    ///
    /// # 返回值
    ///
    /// - 体素间距不是有限正数时返回 `Err(GeometryError::InvalidSpacing)`;
    /// - 方向矩阵奇异时返回 `Err(GeometryError::SingularTransform)`.
    pub fn new(
        dim: [usize; 3],
        spacing: [f64; 3],
        origin: Point3D,
        direction: Matrix3,
    ) -> Result<Self, GeometryError> {
        if spacing.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(GeometryError::InvalidSpacing(spacing));
        }
        let transform = VolumeTransform::new(spacing, origin, &direction)?;
        Ok(Self {
            dim,
            spacing,
            origin,
            direction,
            transform,
        })
    }

    /// 原点为 0, 方向为单位阵的几何信息.
    #[inline]
    pub fn with_spacing(dim: [usize; 3], spacing: [f64; 3]) -> Result<Self, GeometryError> {
        Self::new(dim, spacing, Point3D::ZERO, Matrix3::IDENTITY)
    }

    /// 保留原点与方向, 替换维度与体素间距.
    #[inline]
    pub fn with_dim_and_spacing(
        &self,
        dim: [usize; 3],
        spacing: [f64; 3],
    ) -> Result<Self, GeometryError> {
        Self::new(dim, spacing, self.origin, self.direction)
    }

    /// 维度 `[x, y, z]`.
    #[inline]
    pub fn dim(&self) -> [usize; 3] {
        self.dim
    }

    /// 体素间距 `[x, y, z]`, 单位为毫米.
    #[inline]
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// 体素 `(0, 0, 0)` 的物理坐标.
    #[inline]
    pub fn origin(&self) -> Point3D {
        self.origin
    }

    /// 方向矩阵.
    #[inline]
    pub fn direction(&self) -> &Matrix3 {
        &self.direction
    }

    /// 体素/物理坐标变换.
    #[inline]
    pub fn transform(&self) -> &VolumeTransform {
        &self.transform
    }

    /// 体素总数.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.dim.iter().product()
    }

    /// 单个体素的体积, 单位为立方毫米.
    #[inline]
    pub fn voxel_volume(&self) -> f64 {
        self.spacing.iter().product()
    }

    /// ndarray 中使用的形状 `(z, y, x)`.
    #[inline]
    pub(crate) fn shape_zyx(&self) -> (usize, usize, usize) {
        let [x, y, z] = self.dim;
        (z, y, x)
    }

    /// 两个几何信息是否描述同一个体素网格.
    ///
    /// 维度必须完全相同, 间距、原点与方向允许 `1e-6` 的误差.
    pub fn same_grid(&self, other: &Self) -> bool {
        self.dim == other.dim
            && self
                .spacing
                .iter()
                .zip(other.spacing.iter())
                .all(|(a, b)| (a - b).abs() <= GEOMETRY_TOLERANCE)
            && self.origin.approx_eq(&other.origin, GEOMETRY_TOLERANCE)
            && self.direction.approx_eq(&other.direction, GEOMETRY_TOLERANCE)
    }
}

/// 三维稠密体素网格.
///
/// 体素按 x 最快、y 次之、z 最慢的顺序存储,
/// 线性索引为 `x + y * dim_x + z * dim_x * dim_y`.
/// 底层是形状为 `(z, y, x)` 的标准布局 `Array3`.
#[derive(Debug, Clone)]
pub struct Volume3D<T> {
    geometry: VolumeGeometry,
    data: Array3<T>,
}

impl<T> Volume<T> for Volume3D<T> {
    #[inline]
    fn as_slice(&self) -> &[T] {
        // 构造时保证了标准布局, 可直接 unwrap.
        self.data.as_slice().unwrap()
    }

    #[inline]
    fn as_slice_mut(&mut self) -> &mut [T] {
        // 同上.
        self.data.as_slice_mut().unwrap()
    }
}

impl<T> Index<usize> for Volume3D<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<T> IndexMut<usize> for Volume3D<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.as_slice_mut()[index]
    }
}

impl<T: Clone + Default> Volume3D<T> {
    /// 创建所有体素为 `T::default()` 的体积.
    pub fn new(geometry: VolumeGeometry) -> Self {
        Self {
            data: Array3::default(geometry.shape_zyx()),
            geometry,
        }
    }

    /// 创建与 `self` 几何信息相同、体素类型可能不同的新体积.
    /// 所有体素初始化为 `U::default()`.
    #[inline]
    pub fn create_same_size<U: Clone + Default>(&self) -> Volume3D<U> {
        Volume3D::new(self.geometry)
    }
}

impl<T> Volume3D<T> {
    /// 从按 x 最快顺序排列的数据直接创建体积.
    ///
    /// 数据长度与 `geometry` 的体素总数不符时返回
    /// `Err(GeometryError::ArrayLengthMismatch)`.
    pub fn from_vec(geometry: VolumeGeometry, data: Vec<T>) -> Result<Self, GeometryError> {
        let len = data.len();
        let data = Array3::from_shape_vec(geometry.shape_zyx(), data)
            .map_err(|_| GeometryError::ArrayLengthMismatch(geometry.dim(), len))?;
        Ok(Self { geometry, data })
    }

    /// 从形状为 `(z, y, x)` 的数组创建体积. 非标准布局的数组会被复制为标准布局.
    pub fn from_array(geometry: VolumeGeometry, data: Array3<T>) -> Result<Self, GeometryError>
    where
        T: Clone,
    {
        let (z, y, x) = data.dim();
        if (z, y, x) != geometry.shape_zyx() {
            return Err(GeometryError::ArrayLengthMismatch(
                geometry.dim(),
                x * y * z,
            ));
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().to_owned()
        };
        Ok(Self { geometry, data })
    }

    /// 对每个体素执行 `f`, 得到几何信息相同的新体积.
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Volume3D<U> {
        Volume3D {
            geometry: self.geometry,
            data: self.data.map(f),
        }
    }

    /// 几何信息.
    #[inline]
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// x 方向体素个数.
    #[inline]
    pub fn dim_x(&self) -> usize {
        self.geometry.dim[0]
    }

    /// y 方向体素个数.
    #[inline]
    pub fn dim_y(&self) -> usize {
        self.geometry.dim[1]
    }

    /// z 方向体素个数 (水平切片个数).
    #[inline]
    pub fn dim_z(&self) -> usize {
        self.geometry.dim[2]
    }

    /// 体素间距 `[x, y, z]`, 单位为毫米.
    #[inline]
    pub fn spacing(&self) -> [f64; 3] {
        self.geometry.spacing
    }

    /// 体素 `(0, 0, 0)` 的物理坐标.
    #[inline]
    pub fn origin(&self) -> Point3D {
        self.geometry.origin
    }

    /// 方向矩阵.
    #[inline]
    pub fn direction(&self) -> &Matrix3 {
        &self.geometry.direction
    }

    /// 体素/物理坐标变换.
    #[inline]
    pub fn transform(&self) -> &VolumeTransform {
        &self.geometry.transform
    }

    /// 检查 (可能为负的) 坐标是否在体积内.
    #[inline]
    pub fn is_valid(&self, x: i64, y: i64, z: i64) -> bool {
        let [dx, dy, dz] = self.geometry.dim;
        (0..dx as i64).contains(&x) && (0..dy as i64).contains(&y) && (0..dz as i64).contains(&z)
    }

    /// 获取坐标 `(x, y, z)` 对应的线性索引. 越界时返回 `None`.
    #[inline]
    pub fn try_get_index(&self, x: i64, y: i64, z: i64) -> Option<usize> {
        self.is_valid(x, y, z)
            .then(|| self.index_of(x as usize, y as usize, z as usize))
    }

    /// 坐标 `(x, y, z)` 对应的线性索引. 不做越界检查.
    #[inline]
    pub fn index_of(&self, x: usize, y: usize, z: usize) -> usize {
        let [dx, dy, _] = self.geometry.dim;
        x + y * dx + z * dx * dy
    }

    /// 线性索引对应的坐标 `(x, y, z)`. 不做越界检查.
    #[inline]
    pub fn coordinates_of(&self, index: usize) -> (usize, usize, usize) {
        let [dx, dy, _] = self.geometry.dim;
        (index % dx, (index / dx) % dy, index / (dx * dy))
    }

    /// 获取给定位置的体素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&T> {
        self.data.get((z, y, x))
    }

    /// 获取给定位置的体素值, 并可就地修改. 越界时返回 `None`.
    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut T> {
        self.data.get_mut((z, y, x))
    }

    /// 设置给定位置的体素值. 越界时返回 `false` 且不做任何修改.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) -> bool {
        match self.get_mut(x, y, z) {
            Some(p) => {
                *p = value;
                true
            }
            None => false,
        }
    }

    /// 体素是否位于体积的六个表面之一.
    #[inline]
    pub fn is_edge_voxel(&self, x: usize, y: usize, z: usize) -> bool {
        let [dx, dy, dz] = self.geometry.dim;
        x == 0 || y == 0 || z == 0 || x + 1 == dx || y + 1 == dy || z + 1 == dz
    }

    /// 将 (连续) 体素坐标转换为物理坐标.
    #[inline]
    pub fn pixel_to_physical(&self, p: Point3D) -> Point3D {
        self.geometry.transform.pixel_to_physical(p)
    }

    /// 将物理坐标转换为 (连续) 体素坐标.
    #[inline]
    pub fn physical_to_pixel(&self, p: Point3D) -> Point3D {
        self.geometry.transform.physical_to_pixel(p)
    }

    /// 体素区域 `region` 八个角点在物理空间中的包围盒.
    ///
    /// 空区域返回空区域.
    pub fn physical_region(&self, region: &Region3D<i32>) -> Region3D<f64> {
        if region.is_empty() {
            return Region3D::empty();
        }
        let xs = [region.min_x, region.max_x];
        let ys = [region.min_y, region.max_y];
        let zs = [region.min_z, region.max_z];
        let mut ans = Region3D::empty();
        for p in itertools::iproduct!(xs, ys, zs).map(|(x, y, z)| {
            self.pixel_to_physical(Point3D::new(x as f64, y as f64, z as f64))
        }) {
            ans = ans.include(p.x, p.y, p.z);
        }
        ans
    }

    /// 获得底层数据 (形状 `(z, y, x)`) 的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    /// 获得底层数据 (形状 `(z, y, x)`) 的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, T> {
        self.data.view_mut()
    }

    /// 第 `z` 层水平切片的视图 (形状 `(y, x)`). 越界时 panic.
    #[inline]
    pub fn slice_view(&self, z: usize) -> ArrayView2<'_, T> {
        self.data.index_axis(Axis(0), z)
    }

    /// 底层数组.
    #[inline]
    pub(crate) fn array(&self) -> &Array3<T> {
        &self.data
    }

    /// 底层可变数组.
    #[inline]
    pub(crate) fn array_mut(&mut self) -> &mut Array3<T> {
        &mut self.data
    }

    /// 消耗自身, 取出底层数组.
    #[inline]
    pub fn into_array(self) -> Array3<T> {
        self.data
    }
}

impl<T: Clone> Volume3D<T> {
    /// 复制第 `z` 层水平切片为二维体积, 并携带对应的二维几何信息.
    ///
    /// 当 `z` 越界时返回 `None`.
    pub fn axial_slice(&self, z: usize) -> Option<Volume2D<T>> {
        if z >= self.dim_z() {
            return None;
        }
        let origin = self.pixel_to_physical(Point3D::new(0.0, 0.0, z as f64));
        let [sx, sy, _] = self.spacing();
        Some(Volume2D::from_parts(
            self.slice_view(z).to_owned(),
            [sx, sy],
            Point2D::new(origin.x, origin.y),
            Matrix2::upper_left(self.direction()),
        ))
    }
}
