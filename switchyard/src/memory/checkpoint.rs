//! Saved suspension of one thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::Suspension;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub suspension: Suspension,
}

impl Checkpoint {
    pub fn new(suspension: Suspension) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            suspension,
        }
    }
}
