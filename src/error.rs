use thiserror::Error as ThisError;

///
/// Error
///

#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum Error {
    #[error("there is no element with this key")]
    KeyNotFound,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
