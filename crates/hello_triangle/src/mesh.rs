#![allow(unsafe_code)]

use std::sync::Arc;

use glow::HasContext as _;
use glow_shader::check_for_gl_error;

// ----------------------------------------------------------------------------

/// One `f32` vertex attribute, read from an interleaved buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Matches `layout (location = N)` in the vertex shader.
    pub location: u32,

    /// Number of floats, 1 to 4.
    pub components: i32,
}

impl VertexAttribute {
    pub const fn new(location: u32, components: i32) -> Self {
        Self {
            location,
            components,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct AttributePointer {
    location: u32,
    components: i32,
    stride: i32,
    offset: i32,
}

/// Byte stride and offsets for tightly interleaved `f32` attributes.
fn attribute_pointers(layout: &[VertexAttribute]) -> (i32, Vec<AttributePointer>) {
    const FLOAT_SIZE: i32 = size_of::<f32>() as i32;

    let floats_per_vertex: i32 = layout.iter().map(|a| a.components).sum();
    let stride = floats_per_vertex * FLOAT_SIZE;

    let mut offset = 0;
    let pointers = layout
        .iter()
        .map(|attribute| {
            let pointer = AttributePointer {
                location: attribute.location,
                components: attribute.components,
                stride,
                offset,
            };
            offset += attribute.components * FLOAT_SIZE;
            pointer
        })
        .collect();
    (floats_per_vertex, pointers)
}

// ----------------------------------------------------------------------------

/// A static vertex buffer and the vertex array object describing it.
///
/// The GL objects are deleted on drop.
pub struct Mesh {
    gl: Arc<glow::Context>,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    vertex_count: i32,
}

impl Mesh {
    /// Upload `vertices` (interleaved according to `layout`) with `GL_STATIC_DRAW`.
    pub fn new(
        gl: Arc<glow::Context>,
        vertices: &[f32],
        layout: &[VertexAttribute],
    ) -> Result<Self, String> {
        let (floats_per_vertex, pointers) = attribute_pointers(layout);
        if floats_per_vertex == 0 || vertices.len() % floats_per_vertex as usize != 0 {
            return Err(format!(
                "{} floats do not divide into vertices of {floats_per_vertex} floats",
                vertices.len()
            ));
        }
        let vertex_count = i32::try_from(vertices.len() / floats_per_vertex as usize)
            .map_err(|err| err.to_string())?;

        unsafe {
            let vao = gl.create_vertex_array()?;
            let vbo = match gl.create_buffer() {
                Ok(vbo) => vbo,
                Err(err) => {
                    gl.delete_vertex_array(vao);
                    return Err(err);
                }
            };

            // Store state in the VAO:
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STATIC_DRAW,
            );
            check_for_gl_error!(&gl, "buffer_data_u8_slice");

            for pointer in &pointers {
                gl.vertex_attrib_pointer_f32(
                    pointer.location,
                    pointer.components,
                    glow::FLOAT,
                    false,
                    pointer.stride,
                    pointer.offset,
                );
                check_for_gl_error!(&gl, "vertex_attrib_pointer_f32");
                gl.enable_vertex_attrib_array(pointer.location);
            }

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            Ok(Self {
                gl,
                vao,
                vbo,
                vertex_count,
            })
        }
    }

    /// Draw all vertices as a triangle list with the currently active program.
    pub fn draw(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.draw_arrays(glow::TRIANGLES, 0, self.vertex_count);
            self.gl.bind_vertex_array(None);
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.vao);
            self.gl.delete_buffer(self.vbo);
        }
    }
}

#[test]
fn test_attribute_pointers() {
    let (floats, pointers) =
        attribute_pointers(&[VertexAttribute::new(0, 3), VertexAttribute::new(1, 3)]);
    assert_eq!(floats, 6);
    assert_eq!(
        pointers,
        vec![
            AttributePointer {
                location: 0,
                components: 3,
                stride: 24,
                offset: 0,
            },
            AttributePointer {
                location: 1,
                components: 3,
                stride: 24,
                offset: 12,
            },
        ]
    );
}
