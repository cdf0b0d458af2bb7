use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use kausal_core::{ExternalEvent, InternalStateEvent};

/// State values in a journal are arbitrary JSON.
pub type StateValue = serde_json::Value;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A consumer's prior state log plus the external event streams it consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    #[serde(default)]
    pub state_events: Vec<InternalStateEvent<StateValue>>,
    /// One stream per producer, each in emission order.
    #[serde(default)]
    pub streams: Vec<Vec<ExternalEvent<StateValue>>>,
}

impl Journal {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        read_json(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), JournalError> {
        write_json(path.as_ref(), self)
    }

    /// Total number of events held.
    pub fn len(&self) -> usize {
        self.state_events.len() + self.streams.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, JournalError> {
    let file = File::open(path).map_err(|source| JournalError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| JournalError::Json {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), JournalError> {
    let io_error = |source| JournalError::Io {
        path: path.display().to_string(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| JournalError::Json {
        path: path.display().to_string(),
        source,
    })?;
    writer.flush().map_err(io_error)
}
