//! The "Hello Triangle" exercises, drawn with [`glow`] and [`glow_shader`].
//!
//! Run with `RUST_LOG=debug` to see what the driver reports.
//! Pick a scene with the first argument (`two-programs` or `vertex-colors`)
//! or the `HELLO_TRIANGLE_SCENE` environment variable.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release
#![expect(clippy::undocumented_unsafe_blocks)]

mod app;
mod gl_window;
mod mesh;
mod options;
mod scene;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let options = options::AppOptions::from_env()?;

    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut app = app::HelloTriangleApp::new(options);
    event_loop.run_app(&mut app)?;

    app.take_error().map_or(Ok(()), Err)
}
