use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("Unknown file extension: {message}")]
    UnknownExtension { message: String },

    #[error("Post is missing an essential field {field}")]
    MissingField { field: String },
}
