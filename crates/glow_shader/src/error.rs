use std::path::PathBuf;

use crate::{InfoLog, ShaderStage};

/// Which kind of GL object the driver refused to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Shader(ShaderStage),
    Program,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shader(stage) => write!(f, "{stage} shader"),
            Self::Program => f.write_str("program"),
        }
    }
}

/// Why a [`crate::ShaderProgram`] could not be constructed.
///
/// All of these are authoring mistakes (bad paths, bad GLSL, mismatched stage
/// interfaces), so nothing here is worth retrying.
#[derive(thiserror::Error, Debug)]
pub enum ShaderError {
    /// The source file for a stage could not be opened or read.
    ///
    /// Raised before any GL call is made.
    #[error("failed to read {stage} shader source from {path:?}: {source}")]
    SourceRead {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The driver rejected the source of one stage.
    #[error("failed to compile {stage} shader: {log}")]
    StageCompile { stage: ShaderStage, log: InfoLog },

    /// Both stages compiled, but the driver could not link them together.
    #[error("failed to link shader program: {log}")]
    Link { log: InfoLog },

    /// The driver could not allocate a shader or program object.
    #[error("failed to create {kind}: {message}")]
    CreateObject { kind: ObjectKind, message: String },
}

impl ShaderError {
    /// The driver diagnostics, if this error came from the compiler or linker.
    pub fn info_log(&self) -> Option<&InfoLog> {
        match self {
            Self::StageCompile { log, .. } | Self::Link { log } => Some(log),
            Self::SourceRead { .. } | Self::CreateObject { .. } => None,
        }
    }

    /// The stage this error is attributed to, if any.
    pub fn stage(&self) -> Option<ShaderStage> {
        match self {
            Self::SourceRead { stage, .. } | Self::StageCompile { stage, .. } => Some(*stage),
            Self::CreateObject {
                kind: ObjectKind::Shader(stage),
                ..
            } => Some(*stage),
            Self::Link { .. }
            | Self::CreateObject {
                kind: ObjectKind::Program,
                ..
            } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_stage_and_log() {
        let err = ShaderError::StageCompile {
            stage: ShaderStage::Vertex,
            log: InfoLog::capture("0:3(1): error: syntax error", 512),
        };
        assert_eq!(
            err.to_string(),
            "failed to compile vertex shader: 0:3(1): error: syntax error"
        );
        assert_eq!(err.stage(), Some(ShaderStage::Vertex));
        assert!(err.info_log().is_some());
    }

    #[test]
    fn source_read_keeps_io_error_as_source() {
        use std::error::Error as _;

        let err = ShaderError::SourceRead {
            stage: ShaderStage::Fragment,
            path: PathBuf::from("missing.frag"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().starts_with("failed to read fragment shader source"));
        assert!(err.source().is_some());
        assert!(err.info_log().is_none());
    }

    #[test]
    fn create_object_names_the_object() {
        let err = ShaderError::CreateObject {
            kind: ObjectKind::Program,
            message: "out of handles".to_owned(),
        };
        assert_eq!(err.to_string(), "failed to create program: out of handles");
        assert_eq!(err.stage(), None);
    }
}
