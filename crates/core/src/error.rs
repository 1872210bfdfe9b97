//! Error types for chess-scout-core

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("malformed engine score: {0}")]
    MalformedScore(String),

    #[error("evaluation superseded by a newer request")]
    Superseded,

    #[error("engine produced no result within {0:?}")]
    Timeout(Duration),

    #[error("illegal continuation: {0}")]
    IllegalContinuation(String),

    #[error("invalid FEN: {0}")]
    Fen(String),

    #[error("explorer API error: {0}")]
    Explorer(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
