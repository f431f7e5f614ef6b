use std::{cell::RefCell, marker::PhantomData, path::Path, sync::Arc};

use ahash::HashMap;

use crate::{
    ActiveUniform, INFO_LOG_CAPACITY, ShaderBackend, ShaderError, ShaderSource, ShaderStage,
    ShaderVersion, UniformValue,
    misc_util::{compile_shader, link_program},
};

/// Options for building a [`ShaderProgram`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramOptions {
    /// How many bytes of compiler/linker output to keep in errors.
    ///
    /// Default: [`INFO_LOG_CAPACITY`].
    pub info_log_capacity: usize,

    /// If set, sources without a `#version` directive get this version's declaration prepended.
    ///
    /// Default: `None` (sources are compiled verbatim).
    pub shader_version: Option<ShaderVersion>,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            info_log_capacity: INFO_LOG_CAPACITY,
            shader_version: None,
        }
    }
}

/// A linked vertex + fragment shader program.
///
/// The GL program object is deleted when this is dropped (or earlier, with
/// [`Self::release`]). Using the program after release is a bug and panics.
///
/// This is neither `Send` nor `Sync`: GL state belongs to the thread the
/// context is current on.
pub struct ShaderProgram<B: ShaderBackend = glow::Context> {
    gl: Arc<B>,

    /// `None` once released.
    program: Option<B::Program>,

    /// Uniform locations by name, looked up lazily.
    /// `None` means the driver does not know the name (misspelled or optimized out).
    uniforms: RefCell<HashMap<String, Option<B::UniformLocation>>>,

    _not_send: PhantomData<*const ()>,
}

impl<B: ShaderBackend> ShaderProgram<B> {
    /// Read, compile and link the two given GLSL files.
    ///
    /// Both files are read before the driver is touched.
    pub fn from_files(
        gl: Arc<B>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        Self::from_files_with_options(gl, vertex_path, fragment_path, &ProgramOptions::default())
    }

    pub fn from_files_with_options(
        gl: Arc<B>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        options: &ProgramOptions,
    ) -> Result<Self, ShaderError> {
        let vertex = ShaderSource::load(ShaderStage::Vertex, vertex_path)?;
        let fragment = ShaderSource::load(ShaderStage::Fragment, fragment_path)?;
        Self::new(gl, vertex, fragment, options)
    }

    /// Compile and link GLSL held in memory.
    pub fn from_sources(
        gl: Arc<B>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        Self::new(
            gl,
            ShaderSource::new(ShaderStage::Vertex, vertex_source),
            ShaderSource::new(ShaderStage::Fragment, fragment_source),
            &ProgramOptions::default(),
        )
    }

    /// Compile both stages and link them.
    ///
    /// The intermediate shader objects are deleted before this returns,
    /// whether or not linking succeeded.
    pub fn new(
        gl: Arc<B>,
        vertex: ShaderSource,
        fragment: ShaderSource,
        options: &ProgramOptions,
    ) -> Result<Self, ShaderError> {
        debug_assert_eq!(vertex.stage, ShaderStage::Vertex, "expected a vertex source");
        debug_assert_eq!(fragment.stage, ShaderStage::Fragment, "expected a fragment source");

        let capacity = options.info_log_capacity;
        let vertex = vertex.with_header(options.shader_version);
        let fragment = fragment.with_header(options.shader_version);

        let vertex_shader = compile_shader(&*gl, &vertex, capacity)?;
        let fragment_shader = match compile_shader(&*gl, &fragment, capacity) {
            Ok(shader) => shader,
            Err(err) => {
                gl.delete_shader(vertex_shader);
                return Err(err);
            }
        };

        let linked = link_program(&*gl, &[vertex_shader, fragment_shader], capacity);
        gl.delete_shader(vertex_shader);
        gl.delete_shader(fragment_shader);
        let program = linked?;

        log::debug!(
            "Linked shader program {program:?} from {} and {}",
            vertex.origin(),
            fragment.origin()
        );

        Ok(Self {
            gl,
            program: Some(program),
            uniforms: Default::default(),
            _not_send: PhantomData,
        })
    }

    /// The raw program handle, or `None` after [`Self::release`].
    #[inline]
    pub fn handle(&self) -> Option<B::Program> {
        self.program
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.program.is_none()
    }

    fn assert_not_released(&self) -> B::Program {
        match self.program {
            Some(program) => program,
            None => panic!("shader program used after it was released"),
        }
    }

    /// Make this the program used by subsequent draw calls.
    pub fn activate(&self) {
        let program = self.assert_not_released();
        self.gl.use_program(Some(program));
    }

    /// Look up (and cache) the location of a uniform.
    ///
    /// The first failed lookup of a name logs a warning.
    pub fn uniform_location(&self, name: &str) -> Option<B::UniformLocation> {
        let program = self.assert_not_released();
        let mut uniforms = self.uniforms.borrow_mut();
        if let Some(location) = uniforms.get(name) {
            return location.clone();
        }

        let location = self.gl.uniform_location(program, name);
        if location.is_none() {
            log::warn!(
                "Shader program {program:?} has no active uniform {name:?}. \
                 It may be misspelled, or unused and optimized out. Writes to it are skipped."
            );
        }
        uniforms.insert(name.to_owned(), location.clone());
        location
    }

    /// Write a uniform of this program.
    ///
    /// The program must be active (see [`Self::activate`]) for the write to land.
    ///
    /// Returns `false` if `name` is not an active uniform. That is not an error:
    /// the write is skipped and a warning is logged the first time.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> bool {
        let value = value.into();
        if let Some(location) = self.uniform_location(name) {
            self.gl.write_uniform(&location, &value);
            true
        } else {
            log::trace!("Skipped write of {} to {name:?}", value.glsl_type());
            false
        }
    }

    /// Every uniform the driver kept after linking.
    pub fn active_uniforms(&self) -> Vec<ActiveUniform> {
        let program = self.assert_not_released();
        self.gl.active_uniforms(program)
    }

    /// Delete the GL program object. Calling this more than once is fine.
    ///
    /// Called automatically on drop.
    pub fn release(&mut self) {
        if let Some(program) = self.program.take() {
            log::trace!("Deleting shader program {program:?}");
            self.gl.delete_program(program);
            self.uniforms.get_mut().clear();
        }
    }
}

impl<B: ShaderBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: ShaderBackend> std::fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    // A real context is single-threaded too.
    #![allow(clippy::arc_with_non_send_sync)]

    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::ObjectKind;

    thread_local! {
        static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    /// Collects `warn!` messages per thread, so parallel tests don't see each other's.
    struct WarningCapture;

    impl log::Log for WarningCapture {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() == log::Level::Warn
        }

        fn log(&self, record: &log::Record<'_>) {
            if self.enabled(record.metadata()) {
                WARNINGS.with_borrow_mut(|warnings| warnings.push(record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    /// Install the capturing logger (once per process) and clear this thread's warnings.
    fn capture_warnings() {
        static LOGGER: WarningCapture = WarningCapture;
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Warn);
        }
        WARNINGS.with_borrow_mut(Vec::clear);
    }

    fn captured_warnings() -> Vec<String> {
        WARNINGS.with_borrow(Clone::clone)
    }

    /// Records driver calls instead of making them.
    ///
    /// Sources containing `#error` fail to compile.
    #[derive(Default)]
    struct FakeGl {
        next_id: Cell<u32>,
        calls: RefCell<Vec<String>>,
        live_shaders: RefCell<Vec<u32>>,
        live_programs: RefCell<Vec<u32>>,
        compiled_sources: RefCell<Vec<String>>,
        bound_program: Cell<Option<u32>>,
        writes: RefCell<Vec<(usize, UniformValue)>>,

        /// If set, linking fails with this log.
        link_error: Option<&'static str>,

        /// If set, creating this kind of object fails.
        create_error: Option<ObjectKind>,

        /// Names the "driver" reports as active uniforms.
        active: Vec<&'static str>,
    }

    impl FakeGl {
        fn with_uniforms(active: &[&'static str]) -> Self {
            Self {
                active: active.to_vec(),
                ..Default::default()
            }
        }

        fn failing_link(log: &'static str) -> Self {
            Self {
                link_error: Some(log),
                ..Default::default()
            }
        }

        fn failing_create(kind: ObjectKind) -> Self {
            Self {
                create_error: Some(kind),
                ..Default::default()
            }
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.borrow_mut().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn count(&self, prefix: &str) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|call| call.starts_with(prefix))
                .count()
        }

        fn alloc(&self) -> u32 {
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            id
        }
    }

    impl ShaderBackend for FakeGl {
        type Shader = u32;
        type Program = u32;
        type UniformLocation = usize;

        fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
            self.record(format!("create_shader {stage}"));
            if self.create_error == Some(ObjectKind::Shader(stage)) {
                return Err("GL_OUT_OF_MEMORY".to_owned());
            }
            let id = self.alloc();
            self.live_shaders.borrow_mut().push(id);
            Ok(id)
        }

        fn compile_shader(&self, _shader: u32, source: &str) -> bool {
            self.record("compile_shader");
            self.compiled_sources.borrow_mut().push(source.to_owned());
            !source.contains("#error")
        }

        fn shader_info_log(&self, _shader: u32) -> String {
            "0:1(1): error: #error directive\n\0".to_owned()
        }

        fn delete_shader(&self, shader: u32) {
            self.record("delete_shader");
            self.live_shaders.borrow_mut().retain(|&s| s != shader);
        }

        fn create_program(&self) -> Result<u32, String> {
            self.record("create_program");
            if self.create_error == Some(ObjectKind::Program) {
                return Err("GL_OUT_OF_MEMORY".to_owned());
            }
            let id = self.alloc();
            self.live_programs.borrow_mut().push(id);
            Ok(id)
        }

        fn attach_shader(&self, _program: u32, _shader: u32) {
            self.record("attach_shader");
        }

        fn detach_shader(&self, _program: u32, _shader: u32) {
            self.record("detach_shader");
        }

        fn link_program(&self, _program: u32) -> bool {
            self.record("link_program");
            self.link_error.is_none()
        }

        fn program_info_log(&self, _program: u32) -> String {
            self.link_error.unwrap_or_default().to_owned()
        }

        fn delete_program(&self, program: u32) {
            self.record("delete_program");
            self.live_programs.borrow_mut().retain(|&p| p != program);
        }

        fn use_program(&self, program: Option<u32>) {
            self.record("use_program");
            self.bound_program.set(program);
        }

        fn uniform_location(&self, _program: u32, name: &str) -> Option<usize> {
            self.record(format!("uniform_location {name}"));
            self.active.iter().position(|&active| active == name)
        }

        fn write_uniform(&self, location: &usize, value: &UniformValue) {
            self.writes.borrow_mut().push((*location, *value));
        }

        fn active_uniforms(&self, _program: u32) -> Vec<ActiveUniform> {
            self.active
                .iter()
                .map(|&name| ActiveUniform {
                    name: name.to_owned(),
                    size: 1,
                    gl_type: glow::FLOAT,
                })
                .collect()
        }

        fn shading_language_version(&self) -> String {
            "3.30 fake".to_owned()
        }
    }

    const VERTEX: &str = "#version 330 core\nlayout (location = 0) in vec3 aPos;\nvoid main() { gl_Position = vec4(aPos, 1.0); }\n";
    const FRAGMENT: &str = "#version 330 core\nout vec4 FragColor;\nvoid main() { FragColor = vec4(1.0, 0.5, 0.2, 1.0); }\n";

    #[test]
    fn valid_sources_link_and_stages_are_deleted() {
        let gl = Arc::new(FakeGl::default());
        let program = ShaderProgram::from_sources(Arc::clone(&gl), VERTEX, FRAGMENT).unwrap();

        assert!(!program.is_released());
        assert_eq!(gl.live_shaders.borrow().len(), 0);
        assert_eq!(gl.live_programs.borrow().as_slice(), &[program.handle().unwrap()]);
        assert_eq!(gl.count("attach_shader"), 2);
        assert_eq!(gl.count("detach_shader"), 2);

        program.activate();
        assert_eq!(gl.bound_program.get(), program.handle());
    }

    #[test]
    fn vertex_compile_error_reports_stage_and_leaks_nothing() {
        let gl = Arc::new(FakeGl::default());
        let err = ShaderProgram::from_sources(Arc::clone(&gl), "#error broken", FRAGMENT)
            .unwrap_err();

        match &err {
            ShaderError::StageCompile { stage, log } => {
                assert_eq!(*stage, ShaderStage::Vertex);
                assert_eq!(log.as_str(), "0:1(1): error: #error directive");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gl.count("create_program"), 0);
        assert_eq!(gl.count("create_shader fragment"), 0);
        assert!(gl.live_shaders.borrow().is_empty());
    }

    #[test]
    fn fragment_compile_error_deletes_vertex_stage() {
        let gl = Arc::new(FakeGl::default());
        let err = ShaderProgram::from_sources(Arc::clone(&gl), VERTEX, "#error broken")
            .unwrap_err();

        assert_eq!(err.stage(), Some(ShaderStage::Fragment));
        assert_eq!(gl.count("delete_shader"), 2);
        assert!(gl.live_shaders.borrow().is_empty());
        assert_eq!(gl.count("create_program"), 0);
    }

    #[test]
    fn link_error_deletes_program_and_stages() {
        let gl = Arc::new(FakeGl::failing_link(
            "error: fragment shader input `vertexColor` has no matching vertex output",
        ));
        let err = ShaderProgram::from_sources(Arc::clone(&gl), VERTEX, FRAGMENT).unwrap_err();

        match &err {
            ShaderError::Link { log } => assert!(log.as_str().contains("vertexColor")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(gl.live_programs.borrow().is_empty());
        assert!(gl.live_shaders.borrow().is_empty());
    }

    #[test]
    fn fragment_create_error_deletes_vertex_stage() {
        let gl = Arc::new(FakeGl::failing_create(ObjectKind::Shader(
            ShaderStage::Fragment,
        )));
        let err = ShaderProgram::from_sources(Arc::clone(&gl), VERTEX, FRAGMENT).unwrap_err();

        match &err {
            ShaderError::CreateObject { kind, message } => {
                assert_eq!(*kind, ObjectKind::Shader(ShaderStage::Fragment));
                assert_eq!(message, "GL_OUT_OF_MEMORY");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gl.count("delete_shader"), 1);
        assert!(gl.live_shaders.borrow().is_empty());
        assert_eq!(gl.count("create_program"), 0);
    }

    #[test]
    fn program_create_error_deletes_both_stages() {
        let gl = Arc::new(FakeGl::failing_create(ObjectKind::Program));
        let err = ShaderProgram::from_sources(Arc::clone(&gl), VERTEX, FRAGMENT).unwrap_err();

        assert!(matches!(
            err,
            ShaderError::CreateObject {
                kind: ObjectKind::Program,
                ..
            }
        ));
        assert_eq!(gl.count("delete_shader"), 2);
        assert!(gl.live_shaders.borrow().is_empty());
        assert!(gl.live_programs.borrow().is_empty());
    }

    #[test]
    fn link_log_is_bounded() {
        let gl = Arc::new(FakeGl::failing_link(
            "a very long and repetitive linker complaint that goes on and on",
        ));
        let options = ProgramOptions {
            info_log_capacity: 16,
            ..Default::default()
        };
        let err = ShaderProgram::new(
            gl,
            ShaderSource::new(ShaderStage::Vertex, VERTEX),
            ShaderSource::new(ShaderStage::Fragment, FRAGMENT),
            &options,
        )
        .unwrap_err();

        let log = err.info_log().unwrap();
        assert_eq!(log.as_str(), "a very long and ");
        assert!(log.is_truncated());
    }

    #[test]
    fn missing_file_fails_before_any_driver_call() {
        let dir = tempfile::tempdir().unwrap();
        let vertex_path = dir.path().join("triangle.vert");
        std::fs::write(&vertex_path, VERTEX).unwrap();

        let gl = Arc::new(FakeGl::default());
        let err = ShaderProgram::from_files(
            Arc::clone(&gl),
            &vertex_path,
            dir.path().join("missing.frag"),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ShaderError::SourceRead {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn from_files_compiles_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let vertex_path = dir.path().join("triangle.vert");
        let fragment_path = dir.path().join("orange.frag");
        std::fs::write(&vertex_path, VERTEX).unwrap();
        std::fs::write(&fragment_path, FRAGMENT).unwrap();

        let gl = Arc::new(FakeGl::default());
        let _program =
            ShaderProgram::from_files(Arc::clone(&gl), &vertex_path, &fragment_path).unwrap();

        assert_eq!(gl.compiled_sources.borrow().as_slice(), &[VERTEX, FRAGMENT]);
    }

    #[test]
    fn version_header_is_prepended_when_configured() {
        let gl = Arc::new(FakeGl::default());
        let options = ProgramOptions {
            shader_version: Some(ShaderVersion::detect(&*gl)),
            ..Default::default()
        };
        let _program = ShaderProgram::new(
            Arc::clone(&gl),
            ShaderSource::new(ShaderStage::Vertex, "void main() {}"),
            ShaderSource::new(ShaderStage::Fragment, FRAGMENT),
            &options,
        )
        .unwrap();

        let sources = gl.compiled_sources.borrow();
        assert_eq!(sources[0], "#version 330 core\nvoid main() {}");
        assert_eq!(sources[1], FRAGMENT);
    }

    #[test]
    fn set_uniform_writes_known_names() {
        let gl = Arc::new(FakeGl::with_uniforms(&["u_x_offset", "u_color"]));
        let program = ShaderProgram::from_sources(Arc::clone(&gl), VERTEX, FRAGMENT).unwrap();
        program.activate();

        assert!(program.set_uniform("u_color", [1.0, 0.5, 0.2, 1.0]));
        assert!(program.set_uniform("u_x_offset", 0.25_f32));
        assert!(program.set_uniform("u_x_offset", 0.5_f32));

        assert_eq!(
            gl.writes.borrow().as_slice(),
            &[
                (1, UniformValue::Vec4([1.0, 0.5, 0.2, 1.0])),
                (0, UniformValue::Float(0.25)),
                (0, UniformValue::Float(0.5)),
            ]
        );
        assert_eq!(gl.count("uniform_location u_x_offset"), 1, "location is cached");
    }

    #[test]
    fn set_uniform_on_unknown_name_is_skipped_with_one_warning() {
        capture_warnings();
        let gl = Arc::new(FakeGl::with_uniforms(&["u_color"]));
        let program = ShaderProgram::from_sources(Arc::clone(&gl), VERTEX, FRAGMENT).unwrap();

        assert!(!program.set_uniform("u_colour", true));
        assert!(!program.set_uniform("u_colour", false));
        assert!(program.set_uniform("u_color", [1.0, 1.0, 1.0, 1.0]));

        let warnings = captured_warnings();
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("\"u_colour\""), "{warnings:?}");

        assert_eq!(gl.writes.borrow().len(), 1);
        assert_eq!(gl.count("uniform_location u_colour"), 1);
        assert_eq!(program.uniform_location("u_colour"), None);
    }

    #[test]
    fn active_uniforms_come_from_the_driver() {
        let gl = Arc::new(FakeGl::with_uniforms(&["u_x_offset", "u_brightness"]));
        let program = ShaderProgram::from_sources(Arc::clone(&gl), VERTEX, FRAGMENT).unwrap();

        let names: Vec<String> = program
            .active_uniforms()
            .into_iter()
            .map(|uniform| uniform.name)
            .collect();
        assert_eq!(names, ["u_x_offset", "u_brightness"]);
    }

    #[test]
    fn release_is_idempotent_and_drop_does_not_double_delete() {
        let gl = Arc::new(FakeGl::default());
        let mut program = ShaderProgram::from_sources(Arc::clone(&gl), VERTEX, FRAGMENT).unwrap();

        program.release();
        program.release();
        assert!(program.is_released());
        assert_eq!(program.handle(), None);
        drop(program);

        assert_eq!(gl.count("delete_program"), 1);
        assert!(gl.live_programs.borrow().is_empty());
    }

    #[test]
    fn drop_releases_program() {
        let gl = Arc::new(FakeGl::default());
        {
            let _program =
                ShaderProgram::from_sources(Arc::clone(&gl), VERTEX, FRAGMENT).unwrap();
            assert_eq!(gl.live_programs.borrow().len(), 1);
        }
        assert!(gl.live_programs.borrow().is_empty());
    }

    #[test]
    #[should_panic(expected = "used after it was released")]
    fn activate_after_release_panics() {
        let gl = Arc::new(FakeGl::default());
        let mut program = ShaderProgram::from_sources(gl, VERTEX, FRAGMENT).unwrap();
        program.release();
        program.activate();
    }
}
