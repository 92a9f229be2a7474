//! Collaborator traits
//!
//! The core never talks to a provider directly. Everything it needs from the
//! outside world goes through these interfaces:
//!
//! - [`ZoneDirectory`]: page through hosted zones
//! - [`RecordDirectory`]: page through a zone's alias records
//! - [`LoadBalancerDirectory`]: page through load balancers
//! - [`RecordMutator`]: submit one upsert or delete
//! - [`ChangeStatusSource`]: read the status of a submitted change
//!
//! [`BackendFactory`] builds a full set of them from configuration.

pub mod backend;
pub mod change_source;
pub mod directory;
pub mod mutator;

pub use backend::{Backend, BackendFactory, BackendProvider};
pub use change_source::ChangeStatusSource;
pub use directory::{LoadBalancerDirectory, RecordDirectory, ZoneDirectory};
pub use mutator::RecordMutator;
