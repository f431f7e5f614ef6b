use std::{sync::Arc, time::Instant};

use glow::HasContext as _;
use glow_shader::{ShaderVersion, check_for_gl_error, check_for_gl_error_even_in_release};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::WindowId,
};

use crate::{gl_window::GlutinWindowContext, options::AppOptions, scene::SceneRenderer};

/// Everything that only exists while we have a window.
struct Running {
    // Field order is drop order: GL objects must go before the context.
    scene: SceneRenderer,
    gl: Arc<glow::Context>,
    gl_window: GlutinWindowContext,
    clear_color: [f32; 4],
    start_time: Instant,
}

impl Running {
    #[expect(unsafe_code)]
    fn new(
        event_loop: &ActiveEventLoop,
        options: &AppOptions,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let gl_window = GlutinWindowContext::new(event_loop, options)?;

        let gl = unsafe {
            Arc::new(glow::Context::from_loader_function(|s| {
                let s = std::ffi::CString::new(s)
                    .expect("failed to construct C string from string for gl proc address");

                gl_window.get_proc_address(&s)
            }))
        };

        let shader_version = ShaderVersion::detect(&*gl);
        if shader_version.is_embedded() || !shader_version.has_explicit_attrib_location() {
            log::warn!(
                "The context reports {shader_version:?}; the bundled `#version 330 core` shaders may not compile"
            );
        }

        let scene = SceneRenderer::new(&gl, options)?;
        check_for_gl_error_even_in_release!(&gl, "scene setup");

        let running = Self {
            scene,
            gl,
            gl_window,
            clear_color: options.clear_color,
            start_time: Instant::now(),
        };
        running.resize(running.gl_window.window().inner_size());
        running.gl_window.window().set_visible(true);
        Ok(running)
    }

    /// Keep the surface and viewport matched to the framebuffer.
    #[expect(unsafe_code)]
    fn resize(&self, physical_size: PhysicalSize<u32>) {
        self.gl_window.resize(physical_size);
        let width = i32::try_from(physical_size.width).unwrap_or(i32::MAX);
        let height = i32::try_from(physical_size.height).unwrap_or(i32::MAX);
        unsafe { self.gl.viewport(0, 0, width, height) };
    }

    #[expect(unsafe_code)]
    fn paint(&self) -> glutin::error::Result<()> {
        let [r, g, b, a] = self.clear_color;
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }

        self.scene.paint(self.start_time.elapsed().as_secs_f32());
        check_for_gl_error!(&self.gl, "paint");

        self.gl_window.swap_buffers()
    }
}

/// Opens the window on resume, draws on every redraw, closes on Escape.
pub struct HelloTriangleApp {
    options: AppOptions,
    running: Option<Running>,

    /// Set if we had to bail out of the event loop.
    exit_error: Option<Box<dyn std::error::Error>>,
}

impl HelloTriangleApp {
    pub fn new(options: AppOptions) -> Self {
        Self {
            options,
            running: None,
            exit_error: None,
        }
    }

    /// The error that stopped the event loop, if any.
    pub fn take_error(&mut self) -> Option<Box<dyn std::error::Error>> {
        self.exit_error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Box<dyn std::error::Error>) {
        log::error!("{err}");
        self.exit_error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for HelloTriangleApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match Running::new(event_loop, &self.options) {
            Ok(running) => {
                running.gl_window.window().request_redraw();
                self.running = Some(running);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = &self.running else {
            return;
        };

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                log::debug!("Escape pressed, closing");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                running.resize(physical_size);
                running.gl_window.window().request_redraw();
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = running.paint() {
                    self.fail(event_loop, err.into());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.gl_window.window().request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Delete GL objects while the context is still alive and current.
        self.running = None;
    }
}
