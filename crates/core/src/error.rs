use thiserror::Error;

use crate::model::{ContentError, RecordError, SettingsError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Record(#[from] RecordError),
}
