use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid sampled algorithm family: {what:?}")]
    InvalidFamily { what: String },
}
