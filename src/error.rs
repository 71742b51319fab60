//! Error taxonomy for catchment-to-mesh conversion.
//!
//! Kinds mirror the propagation policy: everything here reaches the
//! top-level job and terminates it, except [`Error::NoInteriors`] which is
//! always caught inside the interior splitter.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("input error: {0}")]
    Input(String),

    #[error("geometry for uid {uid} is invalid and could not be repaired: {detail}")]
    GeometryInvalid { uid: i64, detail: String },

    #[error("uid {uid} is a multipart geometry but allow_multipart is false")]
    MultipartNotAllowed { uid: i64 },

    /// Raised by the interior splitter when called on a hole-free polygon.
    /// Always recovered locally by the caller; never escapes the crate.
    #[error("polygon has no interior rings")]
    NoInteriors,

    #[error("{records} geometries is fewer than {workers} workers")]
    TooFewGeometries { records: usize, workers: usize },

    #[error("neighbor connectivity is not supported with {workers} workers")]
    ConnectivityParallelUnsupported { workers: usize },

    #[error("writer error: {0}")]
    Writer(String),
}

pub type Result<T> = std::result::Result<T, Error>;
