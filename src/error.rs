use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid input in row {row} of column '{column}': {message}")]
    InputType {
        row: usize,
        column: String,
        message: String,
    },

    #[error("Invalid parameter: {name} = {value}, {message}")]
    InvalidParameter {
        name: String,
        value: String,
        message: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Column '{0}' not found in input table")]
    MissingColumn(String),

    #[error("Style configuration error: {0}")]
    Config(String),

    #[error("Glyph asset {}: {message}", path.display())]
    Asset { path: PathBuf, message: String },

    #[error("Rendering error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, LogoError>;

impl LogoError {
    /// Create a new InputType error
    pub fn input_type(row: usize, column: impl Into<String>, message: impl Into<String>) -> Self {
        LogoError::InputType {
            row,
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a new InvalidParameter error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        LogoError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// Create a new Asset error
    pub fn asset(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        LogoError::Asset {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        LogoError::Config(message.into())
    }
}

impl From<polars::prelude::PolarsError> for LogoError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        LogoError::DataError(e.to_string())
    }
}
