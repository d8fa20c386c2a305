use thiserror::Error;

/// Main error type for the vhs-glitch library
#[derive(Error, Debug)]
pub enum GlitchError {
    #[error("Render backend error: {0}")]
    Render(#[from] RenderError),

    #[error("Shader program error: {0}")]
    Shader(#[from] ShaderError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Parameter error: {0}")]
    Param(#[from] ParamError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rendering backend errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Rendering backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("Invalid surface size: {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },

    #[error("Failed to write frame {index}: {reason}")]
    FrameWriteFailed { index: u64, reason: String },
}

/// Shader program build errors
#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("{stage} stage failed to compile:\n{log}")]
    CompileFailed { stage: String, log: String },

    #[error("Program failed to link:\n{log}")]
    LinkFailed { log: String },
}

/// Source image loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to load image: {path}")]
    LoadFailed { path: String },

    #[error("Failed to decode image {path}: {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("Image has no pixels: {path}")]
    EmptyImage { path: String },
}

/// Parameter store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("Unknown parameter: {name}")]
    Unknown { name: String },

    #[error("Parameter {name} expects a {expected} value")]
    KindMismatch { name: String, expected: String },

    #[error("Parameter {name} must be finite, got {value}")]
    NotFinite { name: String, value: f32 },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid control script line {line}: {reason}")]
    ScriptParse { line: usize, reason: String },
}

/// Convenience type alias for Results using GlitchError
pub type Result<T> = std::result::Result<T, GlitchError>;

impl GlitchError {
    /// Whether the effect as a whole cannot run after this error.
    ///
    /// Asset failures only disable drawing; the scheduler and frame driver keep
    /// running and the surface keeps being cleared.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Asset(_) => false,
            Self::Param(_) => false,
            _ => true,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Render(RenderError::BackendUnavailable { reason }) => {
                format!("Rendering is not available on this system ({}). The effect cannot start.", reason)
            }
            Self::Shader(ShaderError::CompileFailed { stage, .. }) => {
                format!("The {} shader stage failed to compile. See the log for diagnostics.", stage)
            }
            Self::Shader(ShaderError::LinkFailed { .. }) => {
                "The shader program failed to link. See the log for diagnostics.".to_string()
            }
            Self::Asset(AssetError::LoadFailed { path }) => {
                format!("Could not load image '{}'. Please check the file exists and is a PNG or JPEG.", path)
            }
            Self::Param(ParamError::Unknown { name }) => {
                format!("Parameter '{}' does not exist. Run with --list-params to see all parameters.", name)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
