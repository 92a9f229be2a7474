//! Data model shared by the directory, mutator and tracker
//!
//! All of these are plain values. Nothing here is cached between calls; every
//! instance is a snapshot of what the backend reported at the time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record type used for alias records
pub const ALIAS_RECORD_TYPE: &str = "A";

/// A hosted zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Opaque zone identifier (e.g. "/hostedzone/Z1")
    pub id: String,
    /// Fully-qualified, dot-terminated zone name
    pub name: String,
}

impl Zone {
    /// Create a zone, dot-terminating the name if needed
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: crate::name::fqdn(&name.into()),
        }
    }
}

/// A load balancer an alias can point at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerTarget {
    /// Public DNS name of the load balancer
    pub dns_name: String,
    /// Id of the zone hosting the load balancer's own name
    pub hosted_zone_id: String,
}

impl LoadBalancerTarget {
    /// Create a load balancer target
    pub fn new(dns_name: impl Into<String>, hosted_zone_id: impl Into<String>) -> Self {
        Self {
            dns_name: dns_name.into(),
            hosted_zone_id: hosted_zone_id.into(),
        }
    }
}

/// An alias record as persisted in a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    /// Fully-qualified, dot-terminated alias name
    pub name: String,
    /// DNS name of the alias target
    pub target_dns_name: String,
    /// Hosted zone id of the alias target
    pub target_hosted_zone_id: String,
    /// Whether the provider evaluates target health
    pub evaluate_target_health: bool,
}

/// Propagation state of a submitted change
///
/// `Pending` is the only non-terminal state; a change never goes back from
/// `InSync` to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeState {
    /// Not yet applied on every authoritative server
    Pending,
    /// Applied on every authoritative server
    #[serde(rename = "INSYNC")]
    InSync,
}

impl ChangeState {
    /// Provider spelling of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeState::Pending => "PENDING",
            ChangeState::InSync => "INSYNC",
        }
    }

    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChangeState::InSync)
    }
}

impl std::fmt::Display for ChangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time status of a submitted change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    /// Opaque change identifier
    pub id: String,
    /// Propagation state
    pub state: ChangeState,
    /// When the change was submitted
    pub submitted_at: DateTime<Utc>,
    /// Optional comment attached at submission
    #[serde(default)]
    pub comment: Option<String>,
}

impl ChangeStatus {
    /// Whether the change reached every authoritative server
    pub fn is_in_sync(&self) -> bool {
        self.state == ChangeState::InSync
    }
}

/// Kind of record mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    /// Create the record or replace the one with the same name
    Upsert,
    /// Delete the record whose content matches exactly
    Delete,
}

/// A single record mutation submitted to a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChange {
    /// What to do with the record
    pub action: ChangeAction,
    /// DNS record type (always [`ALIAS_RECORD_TYPE`] for alias records)
    pub record_type: String,
    /// Full record content
    pub record: AliasRecord,
    /// Optional comment for the change
    #[serde(default)]
    pub comment: Option<String>,
}

impl RecordChange {
    /// Build an upsert for an alias record
    pub fn upsert(record: AliasRecord) -> Self {
        Self {
            action: ChangeAction::Upsert,
            record_type: ALIAS_RECORD_TYPE.to_string(),
            record,
            comment: None,
        }
    }

    /// Build a delete mirroring an existing alias record
    pub fn delete(record: AliasRecord) -> Self {
        Self {
            action: ChangeAction::Delete,
            record_type: ALIAS_RECORD_TYPE.to_string(),
            record,
            comment: None,
        }
    }

    /// Attach a comment
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }
}

/// Request for one page of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Continuation marker from the previous page, `None` for the first page
    pub marker: Option<String>,
    /// Upper bound on items per page
    pub max_items: usize,
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Marker for the next page; `None` on the last page
    pub next_marker: Option<String>,
}

impl<T> Page<T> {
    /// A page followed by more pages
    pub fn more(items: Vec<T>, next_marker: impl Into<String>) -> Self {
        Self {
            items,
            next_marker: Some(next_marker.into()),
        }
    }

    /// The final page
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_marker: None,
        }
    }

    /// Whether this is the final page
    pub fn is_last(&self) -> bool {
        self.next_marker.is_none()
    }
}
