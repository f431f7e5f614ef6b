use std::path::{Path, PathBuf};

use crate::{ShaderError, ShaderVersion};

/// One programmable pipeline phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// The `GL_*_SHADER` enum passed to `glCreateShader`.
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// GLSL text for one stage, plus where it came from (for diagnostics).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub text: String,

    /// `None` for sources that were never on disk.
    pub path: Option<PathBuf>,
}

impl ShaderSource {
    pub fn new(stage: ShaderStage, text: impl Into<String>) -> Self {
        Self {
            stage,
            text: text.into(),
            path: None,
        }
    }

    /// Read the whole file at `path`.
    pub fn load(stage: ShaderStage, path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ShaderError::SourceRead {
            stage,
            path: path.to_owned(),
            source,
        })?;
        log::trace!("Loaded {stage} shader from {path:?} ({} bytes)", text.len());
        Ok(Self {
            stage,
            text,
            path: Some(path.to_owned()),
        })
    }

    /// Does the text already carry a `#version` directive?
    ///
    /// GLSL only allows comments and whitespace before it.
    pub fn has_version_directive(&self) -> bool {
        skip_leading_comments(&self.text).starts_with("#version")
    }

    /// Prepend the declaration for `version`, unless the text already has one.
    pub fn with_header(mut self, version: Option<ShaderVersion>) -> Self {
        if let Some(version) = version
            && !self.has_version_directive()
        {
            self.text.insert_str(0, version.version_declaration());
        }
        self
    }

    /// Short human-readable origin, used in log messages.
    pub fn origin(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => format!("<inline {} source>", self.stage),
        }
    }
}

/// Strip leading whitespace and `//` / `/* */` comments.
fn skip_leading_comments(mut text: &str) -> &str {
    loop {
        text = text.trim_start();
        if let Some(rest) = text.strip_prefix("//") {
            text = rest.split_once('\n').map_or("", |(_, after)| after);
        } else if let Some(rest) = text.strip_prefix("/*") {
            // An unterminated block comment swallows the rest.
            text = rest.split_once("*/").map_or("", |(_, after)| after);
        } else {
            return text;
        }
    }
}
