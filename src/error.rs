use miette::Diagnostic;
use thiserror::Error;

/// Main error type for tilecomp operations
#[derive(Error, Diagnostic, Debug)]
pub enum ComposeError {
    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(tilecomp::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(tilecomp::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Parse error in {path}: {message}")]
    #[diagnostic(code(tilecomp::parse))]
    Parse {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Image error with {path}: {message}")]
    #[diagnostic(code(tilecomp::image))]
    Image {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Build error: {message}")]
    #[diagnostic(code(tilecomp::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("aborted after first error")]
    #[diagnostic(
        code(tilecomp::aborted),
        help("rerun without --fail-fast to see all diagnostics")
    )]
    Aborted,

    #[error("composition finished with {errors} error(s)")]
    #[diagnostic(code(tilecomp::failed))]
    CompletedWithErrors { errors: usize },
}

pub type Result<T> = std::result::Result<T, ComposeError>;
