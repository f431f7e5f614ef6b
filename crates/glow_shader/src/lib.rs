//! Scoped shader programs for [`glow`](https://github.com/grovesNL/glow).
//!
//! The main type you want to look at is [`ShaderProgram`].
//!
//! ```no_run
//! # fn demo(gl: std::sync::Arc<glow::Context>) -> Result<(), glow_shader::ShaderError> {
//! let program = glow_shader::ShaderProgram::from_files(gl, "triangle.vert", "orange.frag")?;
//! program.activate();
//! program.set_uniform("u_x_offset", 0.25_f32);
//! // The GL program is deleted when `program` is dropped.
//! # Ok(()) }
//! ```
//!
//! Everything in this crate assumes a GL context is current on the calling thread.

#![expect(clippy::undocumented_unsafe_blocks)]

mod backend;
mod error;
mod info_log;
mod misc_util;
mod program;
mod shader_version;
mod stage;
mod uniform;

pub use glow;

pub use backend::{ActiveUniform, ShaderBackend};
pub use error::{ObjectKind, ShaderError};
pub use info_log::{INFO_LOG_CAPACITY, InfoLog};
pub use program::{ProgramOptions, ShaderProgram};
pub use shader_version::ShaderVersion;
pub use stage::{ShaderSource, ShaderStage};
pub use uniform::UniformValue;

/// Check for OpenGL error and report it using `log::error`.
///
/// Only active in debug builds!
///
/// ``` no_run
/// # let glow_context = todo!();
/// use glow_shader::check_for_gl_error;
/// check_for_gl_error!(glow_context);
/// check_for_gl_error!(glow_context, "after draw");
/// ```
#[macro_export]
macro_rules! check_for_gl_error {
    ($gl: expr) => {{
        if cfg!(debug_assertions) {
            $crate::check_for_gl_error_impl($gl, file!(), line!(), "")
        }
    }};
    ($gl: expr, $context: literal) => {{
        if cfg!(debug_assertions) {
            $crate::check_for_gl_error_impl($gl, file!(), line!(), $context)
        }
    }};
}

/// Check for OpenGL error and report it using `log::error`.
///
/// WARNING: slow! Only use during setup!
///
/// ``` no_run
/// # let glow_context = todo!();
/// use glow_shader::check_for_gl_error_even_in_release;
/// check_for_gl_error_even_in_release!(glow_context);
/// check_for_gl_error_even_in_release!(glow_context, "after linking");
/// ```
#[macro_export]
macro_rules! check_for_gl_error_even_in_release {
    ($gl: expr) => {{ $crate::check_for_gl_error_impl($gl, file!(), line!(), "") }};
    ($gl: expr, $context: literal) => {{ $crate::check_for_gl_error_impl($gl, file!(), line!(), $context) }};
}

#[doc(hidden)]
pub fn check_for_gl_error_impl(gl: &glow::Context, file: &str, line: u32, context: &str) {
    use glow::HasContext as _;
    #[expect(unsafe_code)]
    let error_code = unsafe { gl.get_error() };
    if error_code != glow::NO_ERROR {
        let error_str = gl_error_name(error_code);

        if context.is_empty() {
            log::error!("GL error, at {file}:{line}: {error_str} (0x{error_code:X})");
        } else {
            log::error!("GL error, at {file}:{line} ({context}): {error_str} (0x{error_code:X})");
        }
    }
}

fn gl_error_name(error_code: u32) -> &'static str {
    match error_code {
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::CONTEXT_LOST => "GL_CONTEXT_LOST",
        _ => "<unknown>",
    }
}

#[test]
fn test_gl_error_name() {
    assert_eq!(gl_error_name(glow::INVALID_OPERATION), "GL_INVALID_OPERATION");
    assert_eq!(gl_error_name(glow::OUT_OF_MEMORY), "GL_OUT_OF_MEMORY");
    assert_eq!(gl_error_name(0x1234), "<unknown>");
}
