pub mod cors;

use http::header::InvalidHeaderValue;
use thiserror::Error;

pub type MiddlewareResult<T> = core::result::Result<T, MiddlewareErr>;

#[derive(Debug, Error)]
pub enum MiddlewareErr {
    #[error("invalid CORS origin: {0}")]
    InvalidOrigin(#[from] InvalidHeaderValue),
}
