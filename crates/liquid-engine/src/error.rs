/// Construction-time failures of the glass renderer.
///
/// Per-frame problems (failed captures, clipped patches, lost worker results)
/// never surface here; they are logged and the frame continues.
#[derive(Debug, thiserror::Error)]
pub enum LensError {
    #[error("no GPU context available: {0}")]
    NoGpuContext(String),

    #[error("shader `{label}` failed to compile: {message}")]
    ShaderCompile { label: &'static str, message: String },
}
