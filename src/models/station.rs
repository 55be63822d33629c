use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural key of a station: the (name, state) pair encoded in a data filename
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationKey {
    pub name: String,
    pub state: String,
}

impl StationKey {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
        }
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.state)
    }
}

/// A station row as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub state: String,
}

impl Station {
    pub fn new(id: i64, name: String, state: String) -> Self {
        Self { id, name, state }
    }
}
