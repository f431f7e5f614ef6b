#![allow(unsafe_code)]

use glow::HasContext;

use crate::{ShaderStage, UniformValue};

/// One active uniform, as reported by the driver after linking.
///
/// Uniforms that are declared but never read may be optimized out by the
/// compiler and will then be missing from this list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveUniform {
    pub name: String,

    /// Number of array elements (1 for non-arrays).
    pub size: i32,

    /// GL type enum, e.g. `glow::FLOAT_VEC4`.
    pub gl_type: u32,
}

/// The driver calls a [`crate::ShaderProgram`] needs.
///
/// Implemented for [`glow::Context`]. Every method talks to whatever context
/// is current on the calling thread.
pub trait ShaderBackend {
    type Shader: Copy + std::fmt::Debug;
    type Program: Copy + std::fmt::Debug;
    type UniformLocation: Clone + std::fmt::Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;

    /// Upload `source` and compile it. Returns the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;

    fn shader_info_log(&self, shader: Self::Shader) -> String;

    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Link the attached shaders. Returns the link status.
    fn link_program(&self, program: Self::Program) -> bool;

    fn program_info_log(&self, program: Self::Program) -> String;

    fn delete_program(&self, program: Self::Program);

    fn use_program(&self, program: Option<Self::Program>);

    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;

    /// Write to a uniform of the currently bound program.
    fn write_uniform(&self, location: &Self::UniformLocation, value: &UniformValue);

    fn active_uniforms(&self, program: Self::Program) -> Vec<ActiveUniform>;

    /// The raw `GL_SHADING_LANGUAGE_VERSION` string.
    fn shading_language_version(&self) -> String;
}

impl ShaderBackend for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, stage.gl_enum()) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        unsafe {
            HasContext::shader_source(self, shader, source);
            HasContext::compile_shader(self, shader);
            HasContext::get_shader_compile_status(self, shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { HasContext::get_shader_info_log(self, shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe {
            HasContext::delete_shader(self, shader);
        }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe {
            HasContext::attach_shader(self, program, shader);
        }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe {
            HasContext::detach_shader(self, program, shader);
        }
    }

    fn link_program(&self, program: Self::Program) -> bool {
        unsafe {
            HasContext::link_program(self, program);
            HasContext::get_program_link_status(self, program)
        }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { HasContext::get_program_info_log(self, program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe {
            HasContext::delete_program(self, program);
        }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe {
            HasContext::use_program(self, program);
        }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    fn write_uniform(&self, location: &Self::UniformLocation, value: &UniformValue) {
        value.upload(self, location);
    }

    fn active_uniforms(&self, program: Self::Program) -> Vec<ActiveUniform> {
        unsafe {
            let count = HasContext::get_active_uniforms(self, program);
            (0..count)
                .filter_map(|index| HasContext::get_active_uniform(self, program, index))
                .map(|uniform| ActiveUniform {
                    name: uniform.name,
                    size: uniform.size,
                    gl_type: uniform.utype,
                })
                .collect()
        }
    }

    fn shading_language_version(&self) -> String {
        unsafe { HasContext::get_parameter_string(self, glow::SHADING_LANGUAGE_VERSION) }
    }
}
