use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("no element with id {0:?}")]
    UnknownElement(String),
    #[error("element {id:?} is a <{tag}>, not a form control")]
    NotAControl { id: String, tag: String },
}
