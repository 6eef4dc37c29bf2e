use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Invalid sort: {0}")]
    InvalidSort(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}
