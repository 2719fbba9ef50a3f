use serde::{Deserialize, Serialize};

use super::ids::TeacherId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
}

impl Teacher {
    pub fn new(id: TeacherId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
