use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures before the first tick. Each maps to its own exit code.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("renderer init failed: {0}")]
    Renderer(String),

    #[error("failed to load sprite sheet {}: {source}", .path.display())]
    AssetLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to create texture: {0}")]
    Texture(String),
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::EventLoop(_) => 1,
            StartupError::Window(_) => 2,
            StartupError::Renderer(_) => 3,
            StartupError::AssetLoad { .. } => 4,
            StartupError::Texture(_) => 5,
        }
    }
}
