#![allow(unsafe_code)]

/// A value that can be written to a uniform with [`crate::ShaderProgram::set_uniform`].
///
/// Matrices are column-major, the same layout GLSL uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    /// Written with `glUniform1i` (GLSL `bool` has no dedicated setter).
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3([[f32; 3]; 3]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    /// The GLSL type name, for log messages.
    pub fn glsl_type(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat3(_) => "mat3",
            Self::Mat4(_) => "mat4",
        }
    }

    /// Write `self` to `location` of the currently bound program.
    pub(crate) fn upload(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        use glow::HasContext as _;

        let location = Some(location);
        unsafe {
            match self {
                Self::Bool(v) => gl.uniform_1_i32(location, i32::from(*v)),
                Self::Int(v) => gl.uniform_1_i32(location, *v),
                Self::UInt(v) => gl.uniform_1_u32(location, *v),
                Self::Float(v) => gl.uniform_1_f32(location, *v),
                Self::Vec2([x, y]) => gl.uniform_2_f32(location, *x, *y),
                Self::Vec3([x, y, z]) => gl.uniform_3_f32(location, *x, *y, *z),
                Self::Vec4([x, y, z, w]) => gl.uniform_4_f32(location, *x, *y, *z, *w),
                Self::Mat3(m) => {
                    gl.uniform_matrix_3_f32_slice(location, false, bytemuck::cast_slice(m.as_slice()));
                }
                Self::Mat4(m) => {
                    gl.uniform_matrix_4_f32_slice(location, false, bytemuck::cast_slice(m.as_slice()));
                }
            }
        }
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        Self::UInt(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4(v)
    }
}

impl From<[[f32; 3]; 3]> for UniformValue {
    fn from(v: [[f32; 3]; 3]) -> Self {
        Self::Mat3(v)
    }
}

impl From<[[f32; 4]; 4]> for UniformValue {
    fn from(v: [[f32; 4]; 4]) -> Self {
        Self::Mat4(v)
    }
}

#[test]
fn test_conversions() {
    assert_eq!(UniformValue::from(true), UniformValue::Bool(true));
    assert_eq!(UniformValue::from(3_u32).glsl_type(), "uint");
    assert_eq!(UniformValue::from([0.0_f32; 4]).glsl_type(), "vec4");
    let identity = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    assert_eq!(UniformValue::from(identity).glsl_type(), "mat4");
}

#[test]
fn test_matrix_flattening_is_column_major() {
    let m = [[1.0_f32, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
    let flat: &[f32] = bytemuck::cast_slice(m.as_slice());
    assert_eq!(flat, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
}
