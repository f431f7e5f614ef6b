use crate::{InfoLog, ObjectKind, ShaderBackend, ShaderError, ShaderSource};

/// Compile one stage. On failure the shader object is deleted again.
pub(crate) fn compile_shader<B: ShaderBackend>(
    gl: &B,
    source: &ShaderSource,
    info_log_capacity: usize,
) -> Result<B::Shader, ShaderError> {
    let stage = source.stage;
    let shader = gl
        .create_shader(stage)
        .map_err(|message| ShaderError::CreateObject {
            kind: ObjectKind::Shader(stage),
            message,
        })?;

    if gl.compile_shader(shader, &source.text) {
        Ok(shader)
    } else {
        let log = InfoLog::capture(&gl.shader_info_log(shader), info_log_capacity);
        gl.delete_shader(shader);
        log::error!("Failed to compile {stage} shader {}: {log}", source.origin());
        Err(ShaderError::StageCompile { stage, log })
    }
}

/// Link `shaders` into a new program.
///
/// The shaders are always detached again, but not deleted: they belong to the caller.
/// On failure the program object is deleted.
pub(crate) fn link_program<B: ShaderBackend>(
    gl: &B,
    shaders: &[B::Shader],
    info_log_capacity: usize,
) -> Result<B::Program, ShaderError> {
    let program = gl
        .create_program()
        .map_err(|message| ShaderError::CreateObject {
            kind: ObjectKind::Program,
            message,
        })?;

    for &shader in shaders {
        gl.attach_shader(program, shader);
    }

    let linked = gl.link_program(program);

    for &shader in shaders {
        gl.detach_shader(program, shader);
    }

    if linked {
        Ok(program)
    } else {
        let log = InfoLog::capture(&gl.program_info_log(program), info_log_capacity);
        gl.delete_program(program);
        log::error!("Failed to link shader program: {log}");
        Err(ShaderError::Link { log })
    }
}
