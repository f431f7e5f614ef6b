use std::num::NonZeroU32;

use glutin::display::GetGlDisplay as _;
use glutin::prelude::*;
use raw_window_handle::HasWindowHandle as _;
use winit::{
    dpi::PhysicalSize,
    event_loop::ActiveEventLoop,
    window::Window,
};

use crate::options::AppOptions;

/// A window with a current OpenGL 3.3 core context.
pub struct GlutinWindowContext {
    gl_context: glutin::context::PossiblyCurrentContext,
    gl_display: glutin::display::Display,
    gl_surface: glutin::surface::Surface<glutin::surface::WindowSurface>,

    // Dropped last: the surface refers to it.
    window: Window,
}

impl GlutinWindowContext {
    /// Create the window (hidden) and make a context current on it.
    #[expect(unsafe_code)]
    pub fn new(
        event_loop: &ActiveEventLoop,
        options: &AppOptions,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let [width, height] = options.inner_size;
        let window_attributes = Window::default_attributes()
            .with_title(options.title.clone())
            .with_inner_size(winit::dpi::LogicalSize { width, height })
            .with_resizable(true)
            .with_visible(false); // Keep hidden until we've painted something.

        let config_template_builder = glutin::config::ConfigTemplateBuilder::new()
            .prefer_hardware_accelerated(None)
            .with_depth_size(0)
            .with_stencil_size(0)
            .with_transparency(false);

        log::debug!("trying to create glutin Display with config: {config_template_builder:?}");

        let (window, gl_config) = glutin_winit::DisplayBuilder::new()
            .with_preference(glutin_winit::ApiPreference::FallbackEgl)
            .with_window_attributes(Some(window_attributes.clone()))
            .build(event_loop, config_template_builder, |mut config_iterator| {
                // The picker must return a config. Without one there is no GL to draw with.
                let config = config_iterator
                    .next()
                    .expect("failed to find a matching configuration for creating glutin config");
                log::debug!("using the first config from config picker closure. config: {config:?}");
                config
            })?;

        let window = match window {
            Some(window) => window,
            None => glutin_winit::finalize_window(event_loop, window_attributes, &gl_config)?,
        };

        let gl_display = gl_config.display();
        log::debug!(
            "successfully created GL Display with version: {} and supported features: {:?}",
            gl_display.version_string(),
            gl_display.supported_features()
        );

        let raw_window_handle = window.window_handle()?.as_raw();

        let context_attributes = glutin::context::ContextAttributesBuilder::new()
            .with_profile(glutin::context::GlProfile::Core)
            .with_context_api(glutin::context::ContextApi::OpenGl(Some(
                glutin::context::Version::new(3, 3),
            )))
            .build(Some(raw_window_handle));
        let not_current_gl_context =
            unsafe { gl_display.create_context(&gl_config, &context_attributes)? };

        let (width_px, height_px): (u32, u32) = window.inner_size().into();
        let surface_attributes =
            glutin::surface::SurfaceAttributesBuilder::<glutin::surface::WindowSurface>::new()
                .build(
                    raw_window_handle,
                    NonZeroU32::new(width_px).unwrap_or(NonZeroU32::MIN),
                    NonZeroU32::new(height_px).unwrap_or(NonZeroU32::MIN),
                );
        log::trace!("creating surface with attributes: {surface_attributes:?}");
        let gl_surface =
            unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes)? };

        let gl_context = not_current_gl_context.make_current(&gl_surface)?;

        let swap_interval = if options.vsync {
            glutin::surface::SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            glutin::surface::SwapInterval::DontWait
        };
        if let Err(err) = gl_surface.set_swap_interval(&gl_context, swap_interval) {
            log::warn!("Failed to set swap interval {swap_interval:?}: {err}");
        }

        Ok(Self {
            gl_context,
            gl_display,
            gl_surface,
            window,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Resize the surface. Zero-sized (minimized) windows are ignored.
    pub fn resize(&self, physical_size: PhysicalSize<u32>) {
        if let (Some(width), Some(height)) = (
            NonZeroU32::new(physical_size.width),
            NonZeroU32::new(physical_size.height),
        ) {
            self.gl_surface.resize(&self.gl_context, width, height);
        }
    }

    pub fn swap_buffers(&self) -> glutin::error::Result<()> {
        self.gl_surface.swap_buffers(&self.gl_context)
    }

    pub fn get_proc_address(&self, addr: &std::ffi::CStr) -> *const std::ffi::c_void {
        self.gl_display.get_proc_address(addr)
    }
}
