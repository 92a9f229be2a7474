// # alias-core
//
// Core library for pointing DNS alias records at load balancers and
// tracking the propagation of each change.
//
// ## Architecture Overview
//
// - **DirectoryClient**: Resolves zone, load balancer and alias names by
//   paging through the backend listings
// - **AliasMutator**: Submits the single upsert or delete per operation
// - **ChangeTracker**: Point-in-time status reads for submitted changes
// - **ConvergenceWaiter**: Polls a change until INSYNC or a deadline
// - **AliasEngine**: Runs the create/remove workflows end to end
// - **BackendRegistry**: Builds backends from configuration by type name
//
// ## Design Principles
//
// 1. **Stateless Episodes**: Nothing is cached between calls; every lookup
//    re-reads the backend
// 2. **One Error Boundary**: Raw backend errors are classified in exactly
//    one place (`From<BackendError> for Error`)
// 3. **Trait Seams**: The core only talks to the outside world through the
//    collaborator traits in [`traits`]
// 4. **Owned Background Work**: The waiter's poll task never outlives the
//    wait that spawned it

pub mod backend;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod mutator;
pub mod name;
pub mod registry;
pub mod tracker;
pub mod traits;
pub mod types;
pub mod waiter;

// Re-export core types for convenience
pub use backend::{FileBackend, MemoryBackend};
pub use config::{AliasConfig, BackendConfig, DirectoryConfig, WaitConfig};
pub use directory::DirectoryClient;
pub use engine::{
    AliasEngine, CreateAliasReport, CreateAliasRequest, EngineEvent, RemoveAliasReport,
    RemoveAliasRequest,
};
pub use error::{BackendError, Error, Result};
pub use mutator::AliasMutator;
pub use registry::BackendRegistry;
pub use tracker::ChangeTracker;
pub use traits::Backend;
pub use types::{AliasRecord, ChangeState, ChangeStatus, LoadBalancerTarget, Zone};
pub use waiter::{ConvergenceWaiter, WaitOutcome};
