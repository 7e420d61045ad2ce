//! Errors

use thiserror::Error;

/// Errors surfaced by construction and output routines. Rendering itself
/// degrades locally and never returns these.
#[derive(Debug, Error)]
pub enum Error {
    /// A cached path light was created while another one still owns the
    /// irradiance cache.
    #[error("several cached path lights at the same time: the irradiance cache is already claimed")]
    CacheAlreadyActive,

    /// A parameter value can not be used.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Writing the output image failed.
    #[error("error saving output image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Result alias using `Error`.
pub type Result<T> = std::result::Result<T, Error>;
