// # File Backend
//
// JSON sandbox implementation of every collaborator trait.
//
// ## Purpose
//
// Lets the create/remove/status flow run end to end against a file on disk.
// Every mutation is persisted immediately, so separate invocations of the
// CLI see each other's changes.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Automatic backup: Keeps .backup of last known good sandbox
// - Recovery: Falls back to backup if the main file does not parse
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "zones": [
//     {
//       "id": "/hostedzone/Z1",
//       "name": "example.com.",
//       "records": [
//         {
//           "name": "www.example.com.",
//           "target_dns_name": "lb-1.elb.amazonaws.com",
//           "target_hosted_zone_id": "ZLB",
//           "evaluate_target_health": true
//         }
//       ]
//     }
//   ],
//   "load_balancers": [
//     { "dns_name": "lb-1.elb.amazonaws.com", "hosted_zone_id": "ZLB" }
//   ],
//   "changes": {},
//   "next_change": 0
// }
// ```

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::{apply_change, page_of};
use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult, Error};
use crate::traits::{
    Backend, BackendFactory, BackendProvider, ChangeStatusSource, LoadBalancerDirectory,
    RecordDirectory, RecordMutator, ZoneDirectory,
};
use crate::types::{
    AliasRecord, ChangeState, ChangeStatus, LoadBalancerTarget, Page, PageRequest, RecordChange,
    Zone,
};

/// Sandbox file format version
const SANDBOX_FILE_VERSION: &str = "1.0";

/// Error code for local sandbox I/O failures
const SANDBOX_IO_ERROR: &str = "SandboxIoError";

/// Items per page served from the sandbox
const SANDBOX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SandboxFile {
    version: String,
    #[serde(default)]
    zones: Vec<SandboxZone>,
    #[serde(default)]
    load_balancers: Vec<LoadBalancerTarget>,
    #[serde(default)]
    changes: HashMap<String, ChangeStatus>,
    #[serde(default)]
    next_change: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SandboxZone {
    id: String,
    name: String,
    #[serde(default)]
    records: Vec<AliasRecord>,
}

impl SandboxZone {
    fn zone(&self) -> Zone {
        Zone::new(self.id.clone(), self.name.clone())
    }
}

/// File-backed sandbox provider
///
/// # Example
///
/// ```rust,no_run
/// use alias_core::backend::FileBackend;
/// use alias_core::{LoadBalancerTarget, Zone};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sandbox = FileBackend::open("/tmp/alias-sandbox.json", Duration::from_secs(5)).await?;
///     sandbox.add_zone(Zone::new("/hostedzone/Z1", "example.com")).await?;
///     sandbox
///         .add_load_balancer(LoadBalancerTarget::new("lb-1.elb.amazonaws.com", "ZLB"))
///         .await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    propagation_delay: Duration,
    state: Arc<RwLock<SandboxFile>>,
}

impl FileBackend {
    /// Open or create a sandbox file
    ///
    /// Creates parent directories if needed. A missing file starts an empty
    /// sandbox; a corrupted one is recovered from its `.backup`.
    pub async fn open<P: AsRef<Path>>(path: P, propagation_delay: Duration) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create sandbox directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let sandbox = Self::load_with_recovery(&path).await?;
        tracing::debug!(
            path = %path.display(),
            zones = sandbox.zones.len(),
            load_balancers = sandbox.load_balancers.len(),
            "opened sandbox"
        );

        Ok(Self {
            path,
            propagation_delay,
            state: Arc::new(RwLock::new(sandbox)),
        })
    }

    /// Add a hosted zone and persist the sandbox
    pub async fn add_zone(&self, zone: Zone) -> crate::Result<()> {
        let mut state = self.state.write().await;
        if state.zones.iter().any(|z| z.id == zone.id) {
            return Err(Error::invalid_input(format!(
                "Zone id already exists in sandbox: {}",
                zone.id
            )));
        }

        let mut next = state.clone();
        next.zones.push(SandboxZone {
            id: zone.id,
            name: zone.name,
            records: Vec::new(),
        });
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    /// Add a load balancer and persist the sandbox
    pub async fn add_load_balancer(&self, lb: LoadBalancerTarget) -> crate::Result<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.load_balancers.push(lb);
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    /// Path of the sandbox file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_with_recovery(path: &Path) -> crate::Result<SandboxFile> {
        match Self::load(path).await {
            Ok(sandbox) => Ok(sandbox),
            Err(Error::Json(e)) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "sandbox file appears corrupted, attempting recovery from backup"
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty sandbox.");
                    return Ok(Self::empty());
                }

                match Self::load(&backup_path).await {
                    Ok(sandbox) => {
                        tracing::info!(zones = sandbox.zones.len(), "recovered sandbox from backup");
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore sandbox file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(sandbox)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also corrupted: {}. Starting with empty sandbox.",
                            backup_err
                        );
                        Ok(Self::empty())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn load(path: &Path) -> crate::Result<SandboxFile> {
        if !path.exists() {
            tracing::debug!("Sandbox file does not exist: {}", path.display());
            return Ok(Self::empty());
        }

        let content = fs::read_to_string(path).await?;
        let sandbox: SandboxFile = serde_json::from_str(&content)?;

        if sandbox.version != SANDBOX_FILE_VERSION {
            tracing::warn!(
                "Sandbox file version mismatch: expected {}, got {}. Attempting to load anyway.",
                SANDBOX_FILE_VERSION,
                sandbox.version
            );
        }
        Ok(sandbox)
    }

    fn empty() -> SandboxFile {
        SandboxFile {
            version: SANDBOX_FILE_VERSION.to_string(),
            ..SandboxFile::default()
        }
    }

    /// Write `sandbox` atomically
    ///
    /// Callers hold the state write lock and swap `sandbox` in only after
    /// this succeeds, so a failed write leaves the in-memory state untouched.
    async fn persist(&self, sandbox: &SandboxFile) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(sandbox)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        if self.path.exists() {
            if let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await?;
        tracing::trace!("Sandbox written to file: {}", self.path.display());
        Ok(())
    }

    async fn persist_for_backend(&self, sandbox: &SandboxFile) -> BackendResult<()> {
        self.persist(sandbox)
            .await
            .map_err(|e| BackendError::new(SANDBOX_IO_ERROR, e.to_string()))
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    fn propagated(&self, status: &ChangeStatus) -> bool {
        let delay = ChronoDuration::from_std(self.propagation_delay)
            .unwrap_or_else(|_| ChronoDuration::zero());
        Utc::now() - status.submitted_at >= delay
    }
}

fn no_such_zone(zone_id: &str) -> BackendError {
    BackendError::new(
        BackendError::NO_SUCH_HOSTED_ZONE,
        format!("No hosted zone found with ID: {}", zone_id),
    )
}

#[async_trait]
impl ZoneDirectory for FileBackend {
    async fn list_zones_page(&self, request: PageRequest) -> BackendResult<Page<Zone>> {
        let zones: Vec<Zone> = self
            .state
            .read()
            .await
            .zones
            .iter()
            .map(SandboxZone::zone)
            .collect();
        page_of(&zones, &request, SANDBOX_PAGE_SIZE)
    }
}

#[async_trait]
impl RecordDirectory for FileBackend {
    async fn list_records_page(
        &self,
        zone_id: &str,
        request: PageRequest,
    ) -> BackendResult<Page<AliasRecord>> {
        let state = self.state.read().await;
        let zone = state
            .zones
            .iter()
            .find(|z| z.id == zone_id)
            .ok_or_else(|| no_such_zone(zone_id))?;
        page_of(&zone.records, &request, SANDBOX_PAGE_SIZE)
    }
}

#[async_trait]
impl LoadBalancerDirectory for FileBackend {
    async fn list_load_balancers_page(
        &self,
        request: PageRequest,
    ) -> BackendResult<Page<LoadBalancerTarget>> {
        page_of(
            &self.state.read().await.load_balancers,
            &request,
            SANDBOX_PAGE_SIZE,
        )
    }
}

#[async_trait]
impl RecordMutator for FileBackend {
    async fn submit_change(
        &self,
        zone_id: &str,
        change: &RecordChange,
    ) -> BackendResult<ChangeStatus> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let zone = next
            .zones
            .iter_mut()
            .find(|z| z.id == zone_id)
            .ok_or_else(|| no_such_zone(zone_id))?;
        apply_change(&mut zone.records, change)?;

        next.next_change += 1;
        let status = ChangeStatus {
            id: format!("/change/C{:010}", next.next_change),
            state: ChangeState::Pending,
            submitted_at: Utc::now(),
            comment: change.comment.clone(),
        };
        next.changes.insert(status.id.clone(), status.clone());

        self.persist_for_backend(&next).await?;
        *state = next;
        Ok(status)
    }
}

#[async_trait]
impl ChangeStatusSource for FileBackend {
    async fn get_change(&self, id: &str) -> BackendResult<ChangeStatus> {
        let mut state = self.state.write().await;
        let mut status = state
            .changes
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::no_such_change(id))?;

        if status.state == ChangeState::Pending && self.propagated(&status) {
            status.state = ChangeState::InSync;
            let mut next = state.clone();
            next.changes.insert(status.id.clone(), status.clone());
            self.persist_for_backend(&next).await?;
            *state = next;
        }
        Ok(status)
    }
}

impl BackendProvider for FileBackend {
    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for creating file backends
pub struct FileBackendFactory;

#[async_trait]
impl BackendFactory for FileBackendFactory {
    async fn create(&self, config: &BackendConfig) -> crate::Result<Backend> {
        match config {
            BackendConfig::File {
                path,
                propagation_delay_secs,
            } => {
                let backend =
                    FileBackend::open(path, Duration::from_secs(*propagation_delay_secs)).await?;
                Ok(Backend::from_provider(Arc::new(backend)))
            }
            _ => Err(Error::config("Invalid config for file backend")),
        }
    }
}
