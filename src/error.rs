use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures while creating the window and rendering context.
///
/// None of these are retried: the binaries log them and exit with status -1.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to create event loop: {0}")]
    EventLoop(String),
    #[error("failed to create window: {0}")]
    Window(String),
    #[error("failed to create rendering surface: {0}")]
    Surface(String),
    #[error("failed to acquire GPU adapter: {0}")]
    Adapter(String),
    #[error("failed to create GPU device: {0}")]
    Device(String),
}

/// Errors produced while decoding texture images.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Texture failed to load at path: {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u8),
}

/// Errors raised when a named uniform cannot be written into a block.
#[derive(Debug, Error, PartialEq)]
pub enum UniformError {
    #[error("malformed uniform name `{0}`")]
    MalformedName(String),
    #[error("unknown uniform `{0}`")]
    Unknown(String),
    #[error("uniform `{name}` index {index} is out of range")]
    IndexOutOfRange { name: String, index: usize },
    #[error("uniform `{name}` expects a {expected} value")]
    KindMismatch { name: String, expected: &'static str },
}

/// Unrecoverable failures while presenting a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("GPU is out of memory")]
    OutOfMemory,
    #[error("surface error: {0}")]
    Surface(String),
}
