use crate::ShaderBackend;

/// The GLSL dialect understood by the current context.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderVersion {
    Gl120,

    /// OpenGL 3.1 up to (not including) 3.3
    Gl140,

    /// OpenGL 3.3 core profile or later
    Gl330,

    /// e.g. WebGL1
    Es100,

    /// e.g. WebGL2
    Es300,
}

impl ShaderVersion {
    /// Ask the driver which dialect it speaks.
    pub fn detect<B: ShaderBackend>(gl: &B) -> Self {
        let shading_lang_string = gl.shading_language_version();
        let shader_version = Self::parse(&shading_lang_string);
        log::debug!("Shader version: {shader_version:?} ({shading_lang_string:?}).");
        shader_version
    }

    /// Parse a `GL_SHADING_LANGUAGE_VERSION` string.
    ///
    /// Unparseable strings fall back to the oldest dialect of their family.
    pub fn parse(glsl_ver: &str) -> Self {
        let Some(start) = glsl_ver.find(|c: char| c.is_ascii_digit()) else {
            return Self::Gl120;
        };
        let es = glsl_ver[..start].contains(" ES ");
        let ver = glsl_ver[start..]
            .split_once(' ')
            .map_or(&glsl_ver[start..], |x| x.0);
        let mut parts = ver.splitn(3, '.').map(|x| x.parse::<u16>().unwrap_or_default());
        let maj = parts.next().unwrap_or_default();
        let min = parts.next().unwrap_or_default();

        if es {
            if maj >= 3 { Self::Es300 } else { Self::Es100 }
        } else if maj > 3 || (maj == 3 && min >= 30) {
            Self::Gl330
        } else if maj > 1 || (maj == 1 && min >= 40) {
            Self::Gl140
        } else {
            Self::Gl120
        }
    }

    /// Goes on top of the shader.
    pub fn version_declaration(&self) -> &'static str {
        match self {
            Self::Gl120 => "#version 120\n",
            Self::Gl140 => "#version 140\n",
            Self::Gl330 => "#version 330 core\n",
            Self::Es100 => "#version 100\n",
            Self::Es300 => "#version 300 es\n",
        }
    }

    /// Supports `layout (location = N)` on vertex inputs.
    pub fn has_explicit_attrib_location(&self) -> bool {
        matches!(self, Self::Gl330 | Self::Es300)
    }

    /// OpenGL ES (or WebGL), which rejects desktop `#version` lines.
    pub fn is_embedded(&self) -> bool {
        match self {
            Self::Gl120 | Self::Gl140 | Self::Gl330 => false,
            Self::Es100 | Self::Es300 => true,
        }
    }
}

#[test]
fn test_shader_version() {
    use ShaderVersion::{Es100, Es300, Gl120, Gl140, Gl330};
    for (s, v) in [
        ("1.2 OpenGL foo bar", Gl120),
        ("1.40 NVIDIA via Cg compiler", Gl140),
        ("3.0", Gl140),
        ("3.30", Gl330),
        ("4.60 NVIDIA", Gl330),
        ("0.0", Gl120),
        ("no digits here", Gl120),
        ("OpenGL ES GLSL 3.00 (WebGL2)", Es300),
        ("OpenGL ES GLSL 1.00 (WebGL)", Es100),
        ("OpenGL ES GLSL ES 1.00 foo bar", Es100),
        ("WebGL GLSL ES 3.00 foo bar", Es300),
        ("WebGL GLSL ES 1.0 foo bar", Es100),
    ] {
        assert_eq!(ShaderVersion::parse(s), v, "{s:?}");
    }
}

#[test]
fn test_shader_version_capabilities() {
    use ShaderVersion::{Es100, Es300, Gl120, Gl140, Gl330};
    for (v, embedded, explicit_location) in [
        (Gl120, false, false),
        (Gl140, false, false),
        (Gl330, false, true),
        (Es100, true, false),
        (Es300, true, true),
    ] {
        assert_eq!(v.is_embedded(), embedded, "{v:?}");
        assert_eq!(v.has_explicit_attrib_location(), explicit_location, "{v:?}");
    }
}
