use std::path::PathBuf;

/// Which exercise to draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scene {
    /// Two triangles, each with its own shader program (orange and dark grey).
    #[default]
    TwoPrograms,

    /// One triangle with a per-vertex color attribute, animated through uniforms.
    VertexColors,
}

impl std::str::FromStr for Scene {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "two-programs" | "two_programs" => Ok(Self::TwoPrograms),
            "vertex-colors" | "vertex_colors" => Ok(Self::VertexColors),
            other => Err(format!(
                "unknown scene {other:?}, expected `two-programs` or `vertex-colors`"
            )),
        }
    }
}

/// Options controlling the demo window and what is drawn in it.
#[derive(Clone, Debug, PartialEq)]
pub struct AppOptions {
    pub title: String,

    /// Logical window size.
    pub inner_size: [f32; 2],

    pub clear_color: [f32; 4],

    pub scene: Scene,

    /// Directory holding the `.vert` / `.frag` files.
    pub shader_dir: PathBuf,

    pub vsync: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            title: "LearnOpenGL".to_owned(),
            inner_size: [800.0, 600.0],
            clear_color: [0.2, 0.3, 0.3, 1.0],
            scene: Scene::default(),
            shader_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders")),
            vsync: true,
        }
    }
}

pub const SCENE_ENV_VAR: &str = "HELLO_TRIANGLE_SCENE";
pub const SHADER_DIR_ENV_VAR: &str = "HELLO_TRIANGLE_SHADER_DIR";

impl AppOptions {
    /// Read overrides from the command line and environment.
    ///
    /// The first CLI argument, if any, picks the scene and wins over [`SCENE_ENV_VAR`].
    pub fn from_env() -> Result<Self, String> {
        Self::from_args_and_vars(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    fn from_args_and_vars(
        mut args: impl Iterator<Item = String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let mut options = Self::default();

        if let Some(scene) = args.next().or_else(|| var(SCENE_ENV_VAR)) {
            options.scene = scene.parse()?;
        }
        if let Some(dir) = var(SHADER_DIR_ENV_VAR) {
            options.shader_dir = PathBuf::from(dir);
        }

        log::debug!("Options: {options:?}");
        Ok(options)
    }

    pub fn shader_path(&self, file_name: &str) -> PathBuf {
        self.shader_dir.join(file_name)
    }
}
