//! Access decisions and the attempt log
//!
//! JSON field names are the ones the dashboard reads.

use serde::Serialize;

use crate::registry::Registry;

pub const UNKNOWN_NAME: &str = "Desconhecido";
pub const NO_DEPARTMENT: &str = "N/A";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time as stamped on each attempt.
pub fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    #[serde(rename = "LIBERADO")]
    Granted,
    #[serde(rename = "NEGADO")]
    Denied,
}

impl AccessStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "LIBERADO",
            Self::Denied => "NEGADO",
        }
    }
}

/// Verdict for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub id: String,
    pub status: AccessStatus,
    pub name: String,
    pub department: String,
    pub timestamp: String,
}

/// One line of the history.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub timestamp: String,
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    pub status: AccessStatus,
}

/// The most recent attempt. All fields are empty until the first one.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LastAccess {
    pub id: String,
    pub status: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "departamento")]
    pub department: String,
    pub timestamp: String,
}

impl From<&Decision> for LastAccess {
    fn from(decision: &Decision) -> Self {
        Self {
            id: decision.id.clone(),
            status: decision.status.as_str().to_owned(),
            name: decision.name.clone(),
            department: decision.department.clone(),
            timestamp: decision.timestamp.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    #[serde(rename = "liberados")]
    pub granted: usize,
    #[serde(rename = "negados")]
    pub denied: usize,
}

#[derive(Debug, Default)]
pub struct AccessLog {
    history: Vec<AccessRecord>,
    last: LastAccess,
}

impl AccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide on `id` and record the attempt.
    pub fn decide(&mut self, id: &str, registry: &Registry, timestamp: String) -> Decision {
        let decision = match registry.lookup(id) {
            Some(person) => Decision {
                id: id.to_owned(),
                status: AccessStatus::Granted,
                name: person.name.clone(),
                department: person.department.clone(),
                timestamp,
            },
            None => Decision {
                id: id.to_owned(),
                status: AccessStatus::Denied,
                name: UNKNOWN_NAME.to_owned(),
                department: NO_DEPARTMENT.to_owned(),
                timestamp,
            },
        };

        self.history.push(AccessRecord {
            timestamp: decision.timestamp.clone(),
            id: decision.id.clone(),
            name: decision.name.clone(),
            status: decision.status,
        });
        self.last = LastAccess::from(&decision);
        decision
    }

    pub fn last(&self) -> &LastAccess {
        &self.last
    }

    /// Oldest first.
    pub fn history(&self) -> &[AccessRecord] {
        &self.history
    }

    /// Up to `limit` attempts, newest first.
    pub fn recent(&self, limit: usize) -> Vec<AccessRecord> {
        self.history.iter().rev().take(limit).cloned().collect()
    }

    pub fn stats(&self) -> Stats {
        let granted = self
            .history
            .iter()
            .filter(|record| record.status == AccessStatus::Granted)
            .count();
        Stats {
            total: self.history.len(),
            granted,
            denied: self.history.len() - granted,
        }
    }
}
