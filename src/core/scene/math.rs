/// A 4x4 transformation matrix stored row by row. Points are column vectors, so a
/// matrix `m` maps `p` to `m * p` and `parent * local` applies `local` first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4d {
    pub data: [[f64; 4]; 4],
}

impl Matrix4d {
    pub fn new(data: [[f64; 4]; 4]) -> Self {
        Self { data }
    }

    pub fn identity() -> Self {
        Self {
            data: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Builds a matrix from 16 values in column-major order, the layout used by glTF.
    pub fn from_column_major(values: &[f64; 16]) -> Self {
        let mut data = [[0.0; 4]; 4];
        for (c, column) in values.chunks_exact(4).enumerate() {
            for (r, v) in column.iter().enumerate() {
                data[r][c] = *v;
            }
        }
        Self { data }
    }

    pub fn translation(t: Vector3d) -> Self {
        let mut m = Self::identity();
        m.data[0][3] = t.x;
        m.data[1][3] = t.y;
        m.data[2][3] = t.z;
        m
    }

    pub fn scaling(s: Vector3d) -> Self {
        let mut m = Self::identity();
        m.data[0][0] = s.x;
        m.data[1][1] = s.y;
        m.data[2][2] = s.z;
        m
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Determinant of the upper-left 3x3 block. Negative values mean the transform
    /// contains a reflection.
    pub fn determinant3(&self) -> f64 {
        let m = &self.data;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse-transpose of the upper-left 3x3 block with an identity fourth row and column.
    /// For singular blocks the cofactor matrix is returned, which keeps directions for
    /// normals that are renormalized afterwards.
    pub fn normal_matrix(&self) -> Matrix4d {
        let m = &self.data;
        // Cofactor matrix of the 3x3 block.
        let mut c = [[0.0; 3]; 3];
        for r in 0..3 {
            for k in 0..3 {
                let (r0, r1) = ((r + 1) % 3, (r + 2) % 3);
                let (k0, k1) = ((k + 1) % 3, (k + 2) % 3);
                c[r][k] = m[r0][k0] * m[r1][k1] - m[r0][k1] * m[r1][k0];
            }
        }
        let det = self.determinant3();
        let scale = if det != 0.0 { 1.0 / det } else { 1.0 };

        let mut out = Self::identity();
        for r in 0..3 {
            for k in 0..3 {
                out.data[r][k] = c[r][k] * scale;
            }
        }
        out
    }

    /// Applies the matrix to a point with w = 1.
    pub fn transform_point(&self, p: [f64; 3]) -> [f64; 3] {
        let m = &self.data;
        let mut out = [0.0; 3];
        for (r, o) in out.iter_mut().enumerate() {
            *o = m[r][0] * p[0] + m[r][1] * p[1] + m[r][2] * p[2] + m[r][3];
        }
        out
    }

    /// Applies the upper-left 3x3 block to a direction.
    pub fn transform_vector(&self, v: [f64; 3]) -> [f64; 3] {
        let m = &self.data;
        let mut out = [0.0; 3];
        for (r, o) in out.iter_mut().enumerate() {
            *o = m[r][0] * v[0] + m[r][1] * v[1] + m[r][2] * v[2];
        }
        out
    }

    /// Euclidean norm of the given column.
    pub fn column_norm(&self, column: usize) -> f64 {
        self.data.iter()
            .map(|row| row[column] * row[column])
            .sum::<f64>()
            .sqrt()
    }
}

impl Default for Matrix4d {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Matrix4d {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        let mut result = Self::new([[0.0; 4]; 4]);
        for i in 0..4 {
            for j in 0..4 {
                result.data[i][j] = self.data[i][0] * other.data[0][j]
                    + self.data[i][1] * other.data[1][j]
                    + self.data[i][2] * other.data[2][j]
                    + self.data[i][3] * other.data[3][j];
            }
        }
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3d {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaterniond {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaterniond {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    pub fn to_matrix4(&self) -> Matrix4d {
        let w = self.w;
        let x = self.x;
        let y = self.y;
        let z = self.z;

        let xx = x * x;
        let yy = y * y;
        let zz = z * z;
        let xy = x * y;
        let xz = x * z;
        let xw = x * w;
        let yz = y * z;
        let yw = y * w;
        let zw = z * w;

        Matrix4d {
            data: [
                [1.0 - 2.0 * (yy + zz), 2.0 * (xy - zw), 2.0 * (xz + yw), 0.0],
                [2.0 * (xy + zw), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - xw), 0.0],
                [2.0 * (xz - yw), 2.0 * (yz + xw), 1.0 - 2.0 * (xx + yy), 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

impl Default for Quaterniond {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TrsError {
    #[error("Matrix is not set")]
    MatrixNotSet,
    #[error("Rotation is not set")]
    RotationNotSet,
    #[error("Scale is not set")]
    ScaleNotSet,
    #[error("Translation is not set")]
    TranslationNotSet,
}

// This struct is used to store one or more of a translation, rotation, scale
// vectors or a transformation matrix.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrsMatrix {
    matrix: Option<Matrix4d>,
    translation: Option<Vector3d>,
    rotation: Option<Quaterniond>,
    scale: Option<Vector3d>,
}

impl TrsMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_matrix(&mut self, matrix: Matrix4d) -> &mut Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn matrix_set(&self) -> bool {
        self.matrix.is_some()
    }

    pub fn matrix(&self) -> Result<&Matrix4d, TrsError> {
        self.matrix.as_ref().ok_or(TrsError::MatrixNotSet)
    }

    pub fn set_translation(&mut self, translation: Vector3d) -> &mut Self {
        self.translation = Some(translation);
        self
    }

    pub fn translation_set(&self) -> bool {
        self.translation.is_some()
    }

    pub fn translation(&self) -> Result<&Vector3d, TrsError> {
        self.translation.as_ref().ok_or(TrsError::TranslationNotSet)
    }

    pub fn set_rotation(&mut self, rotation: Quaterniond) -> &mut Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn rotation_set(&self) -> bool {
        self.rotation.is_some()
    }

    pub fn rotation(&self) -> Result<&Quaterniond, TrsError> {
        self.rotation.as_ref().ok_or(TrsError::RotationNotSet)
    }

    pub fn set_scale(&mut self, scale: Vector3d) -> &mut Self {
        self.scale = Some(scale);
        self
    }

    pub fn scale_set(&self) -> bool {
        self.scale.is_some()
    }

    pub fn scale(&self) -> Result<&Vector3d, TrsError> {
        self.scale.as_ref().ok_or(TrsError::ScaleNotSet)
    }

    // Returns transformation matrix if it has been set. Otherwise, computes
    // it as translation * rotation * scale from whichever vectors are set.
    pub fn compute_transformation_matrix(&self) -> Matrix4d {
        if let Some(matrix) = &self.matrix {
            return *matrix;
        }

        let mut result = Matrix4d::identity();
        if let Some(translation) = &self.translation {
            result = result * Matrix4d::translation(*translation);
        }
        if let Some(rotation) = &self.rotation {
            result = result * rotation.to_matrix4();
        }
        if let Some(scale) = &self.scale {
            result = result * Matrix4d::scaling(*scale);
        }
        result
    }

    // Returns a boolean indicating whether any of the transforms have been set.
    // Can be used to check whether this object represents a default transform.
    pub fn transform_set(&self) -> bool {
        self.matrix.is_some() || self.translation.is_some() || self.rotation.is_some() || self.scale.is_some()
    }
}
