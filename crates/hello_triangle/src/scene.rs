use std::sync::Arc;

use glow_shader::ShaderProgram;

use crate::{
    mesh::{Mesh, VertexAttribute},
    options::{AppOptions, Scene},
};

const POSITION: VertexAttribute = VertexAttribute::new(0, 3);
const COLOR: VertexAttribute = VertexAttribute::new(1, 3);

#[rustfmt::skip]
const LEFT_TRIANGLE: [f32; 9] = [
    -0.6,  0.0, 0.0,
    -0.1,  0.5, 0.0,
    -0.1, -0.5, 0.0,
];

#[rustfmt::skip]
const RIGHT_TRIANGLE: [f32; 9] = [
    0.1, -0.5, 0.0,
    0.6,  0.0, 0.0,
    0.1,  0.5, 0.0,
];

/// Position followed by color.
#[rustfmt::skip]
const COLORED_TRIANGLE: [f32; 18] = [
     0.5, -0.5, 0.0,  1.0, 0.0, 0.0,
    -0.5, -0.5, 0.0,  0.0, 1.0, 0.0,
     0.0,  0.5, 0.0,  0.0, 0.0, 1.0,
];

/// The GL objects for one [`Scene`], and how to draw them.
pub enum SceneRenderer {
    TwoPrograms {
        orange: ShaderProgram,
        grey: ShaderProgram,
        left: Mesh,
        right: Mesh,
    },
    VertexColors {
        program: ShaderProgram,
        triangle: Mesh,
    },
}

impl SceneRenderer {
    pub fn new(
        gl: &Arc<glow::Context>,
        options: &AppOptions,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let program = |vertex: &str, fragment: &str| {
            ShaderProgram::from_files(
                Arc::clone(gl),
                options.shader_path(vertex),
                options.shader_path(fragment),
            )
        };

        let renderer = match options.scene {
            Scene::TwoPrograms => Self::TwoPrograms {
                orange: program("triangle.vert", "orange.frag")?,
                grey: program("triangle.vert", "grey.frag")?,
                left: Mesh::new(Arc::clone(gl), &LEFT_TRIANGLE, &[POSITION])?,
                right: Mesh::new(Arc::clone(gl), &RIGHT_TRIANGLE, &[POSITION])?,
            },
            Scene::VertexColors => {
                let program = program("vertex_color.vert", "vertex_color.frag")?;
                for uniform in program.active_uniforms() {
                    log::debug!("Active uniform: {uniform:?}");
                }
                Self::VertexColors {
                    program,
                    triangle: Mesh::new(Arc::clone(gl), &COLORED_TRIANGLE, &[POSITION, COLOR])?,
                }
            }
        };
        log::info!("Prepared scene {:?}", options.scene);
        Ok(renderer)
    }

    /// `time` is seconds since start.
    pub fn paint(&self, time: f32) {
        match self {
            Self::TwoPrograms {
                orange,
                grey,
                left,
                right,
            } => {
                orange.activate();
                left.draw();

                grey.activate();
                right.draw();
            }
            Self::VertexColors { program, triangle } => {
                program.activate();
                program.set_uniform("u_x_offset", 0.4 * time.sin());
                program.set_uniform("u_brightness", brightness(time));
                triangle.draw();
            }
        }
    }
}

/// Pulses between 0.5 and 1.0.
fn brightness(time: f32) -> f32 {
    0.75 + 0.25 * (2.0 * time).cos()
}

#[test]
fn test_brightness_range() {
    for i in 0..1000 {
        let b = brightness(i as f32 * 0.01);
        assert!((0.5..=1.0).contains(&b), "{b}");
    }
}
