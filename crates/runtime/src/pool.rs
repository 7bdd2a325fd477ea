// SPDX-License-Identifier: MIT

//! Per-signature worker pool (spec.md §4.G): one idle-eviction-managed set of pooled processes
//! per `Signature`, keyed exactly as spec.md's data model prescribes.
//!
//! Process spawning and transport are abstracted behind [`Provisioner`]/[`JobTransport`] the same
//! way the teacher abstracts wall-clock time behind `Clock`/`SystemClock`/`FakeClock` and this
//! workspace abstracts core counts behind `HardwareInfo` — so the pool's bookkeeping (selection,
//! busy flags, idle eviction, the oversubscription warning) can be exercised against an in-memory
//! fake instead of a real child process.

use async_trait::async_trait;
use ispawn_core::{Config, HardwareInfo, JobMessage, JobResponse, Signature, SystemHardware};
use ispawn_transport::TransportError;
use std::collections::HashMap;
use std::os::fd::OwnedFd;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

/// One worker's send/receive half, abstracted so tests don't have to spawn a real process.
#[async_trait]
pub trait JobTransport: Send + 'static {
    /// Sends `message` over the worker's stdio frame, then hands `fds` (collected by
    /// `ispawn-runtime::transfer::encode_with_transferables` from the job's props) to the worker
    /// over its control channel (spec.md §4.F steps 6/8). `fds` is empty on the common path where
    /// the props contain no transferable resources.
    async fn send_job(&mut self, message: &JobMessage, fds: Vec<OwnedFd>) -> Result<(), TransportError>;
    async fn recv_response(&mut self) -> Result<JobResponse, TransportError>;
    async fn terminate(&mut self, timeout: Duration) -> Result<(), TransportError>;
}

/// Produces a new, ready-to-use transport for a given [`Signature`] — the pool's analogue of
/// `ispawn-transport::spawn_worker`, made swappable for tests.
pub trait Provisioner: Send + Sync + 'static {
    type Transport: JobTransport;
    fn provision(&self, signature: &Signature) -> Result<Self::Transport, TransportError>;
}

fn terminated() -> TransportError {
    TransportError::Io(std::io::Error::other("worker transport already terminated"))
}

/// Wraps a real child process, framing `JobMessage`/`JobResponse` as JSON over its stdio.
///
/// Holds the underlying `WorkerProcess` as an `Option` solely so [`JobTransport::terminate`] can
/// `take()` it and hand it to `WorkerProcess::terminate`, which needs to consume `stdin` by value
/// to close it and signal EOF to the child.
pub struct RealTransport(Option<ispawn_transport::WorkerProcess>);

#[async_trait]
impl JobTransport for RealTransport {
    async fn send_job(&mut self, message: &JobMessage, fds: Vec<OwnedFd>) -> Result<(), TransportError> {
        let process = self.0.as_mut().ok_or_else(terminated)?;
        let bytes = serde_json::to_vec(message)
            .map_err(|e| TransportError::FdPassing(format!("encoding job message: {e}")))?;
        ispawn_transport::write_message(&mut process.stdin, &bytes).await?;

        if !fds.is_empty() {
            let control = process.control.try_clone().map_err(TransportError::Io)?;
            tokio::task::spawn_blocking(move || ispawn_transport::send_fds(&control, &fds))
                .await
                .map_err(|e| TransportError::FdPassing(e.to_string()))??;
        }
        Ok(())
    }

    async fn recv_response(&mut self) -> Result<JobResponse, TransportError> {
        let process = self.0.as_mut().ok_or_else(terminated)?;
        let bytes = ispawn_transport::read_message(&mut process.stdout).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::FdPassing(format!("decoding job response: {e}")))
    }

    async fn terminate(&mut self, timeout: Duration) -> Result<(), TransportError> {
        match self.0.take() {
            Some(process) => process.terminate(timeout).await,
            None => Ok(()),
        }
    }
}

/// Spawns real re-exec'd worker processes via `ispawn-transport`.
#[derive(Clone, Default)]
pub struct RealProvisioner;

impl Provisioner for RealProvisioner {
    type Transport = RealTransport;

    fn provision(&self, signature: &Signature) -> Result<Self::Transport, TransportError> {
        ispawn_transport::spawn_worker(signature).map(|process| RealTransport(Some(process)))
    }
}

struct PoolEntry<T: JobTransport> {
    transport: AsyncMutex<T>,
    busy: AtomicBool,
    idle_timer: parking_lot::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl<T: JobTransport> PoolEntry<T> {
    fn new(transport: T) -> Self {
        Self {
            transport: AsyncMutex::new(transport),
            busy: AtomicBool::new(true),
            idle_timer: parking_lot::Mutex::new(None),
        }
    }

    fn cancel_idle_timer(&self) {
        if let Some(handle) = self.idle_timer.lock().take() {
            handle.abort();
        }
    }
}

/// A signature-keyed pool of pooled worker processes (spec.md §4.G).
pub struct WorkerPool<H: HardwareInfo = SystemHardware, P: Provisioner = RealProvisioner> {
    config: Config,
    hardware: H,
    provisioner: P,
    entries: AsyncMutex<HashMap<Signature, Vec<Arc<PoolEntry<P::Transport>>>>>,
    active_count: AtomicUsize,
}

impl<H: HardwareInfo, P: Provisioner> WorkerPool<H, P> {
    pub fn new(config: Config, hardware: H, provisioner: P) -> Self {
        Self {
            config,
            hardware,
            provisioner,
            entries: AsyncMutex::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Runs `signature`'s job through an idle pooled entry, or a freshly provisioned one.
    /// `fds` are any transferable descriptors drained from `props` before encoding; they ride to
    /// the worker over its control channel rather than through the JSON job frame.
    pub async fn run(
        self: &Arc<Self>,
        signature: Signature,
        props: Vec<u8>,
        fds: Vec<OwnedFd>,
    ) -> Result<JobResponse, TransportError> {
        let entry = self.acquire(&signature).await?;
        entry.cancel_idle_timer();

        {
            let mut transport = entry.transport.lock().await;
            transport
                .send_job(
                    &JobMessage::Run {
                        signature: signature.call_site.digest(),
                        props,
                        transferable_count: fds.len(),
                    },
                    fds,
                )
                .await?;
        }
        let response = {
            let mut transport = entry.transport.lock().await;
            transport.recv_response().await
        };

        entry.busy.store(false, Ordering::Release);
        self.arm_idle_timer(signature, entry);

        response
    }

    async fn acquire(&self, signature: &Signature) -> Result<Arc<PoolEntry<P::Transport>>, TransportError> {
        let mut entries = self.entries.lock().await;
        let pool = entries.entry(signature.clone()).or_default();

        if let Some(idle) = pool
            .iter()
            .find(|entry| !entry.busy.swap(true, Ordering::AcqRel))
        {
            return Ok(Arc::clone(idle));
        }

        let transport = self.provisioner.provision(signature)?;
        let entry = Arc::new(PoolEntry::new(transport));
        pool.push(Arc::clone(&entry));

        let active = self.active_count.fetch_add(1, Ordering::AcqRel) + 1;
        let threshold = self.config.warning_threshold(self.hardware.available_parallelism().get());
        if active > threshold {
            tracing::warn!(
                active,
                threshold,
                call_site = %signature.call_site,
                "ispawn worker pool exceeds the recommended active-worker threshold"
            );
        }

        Ok(entry)
    }

    fn arm_idle_timer(self: &Arc<Self>, signature: Signature, entry: Arc<PoolEntry<P::Transport>>) {
        let pool = Arc::clone(self);
        let idle_timeout = self.config.idle_timeout;
        let weak_entry = Arc::downgrade(&entry);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(idle_timeout).await;
            pool.evict_if_still_idle(&signature, weak_entry).await;
        });
        *entry.idle_timer.lock() = Some(handle);
    }

    async fn evict_if_still_idle(&self, signature: &Signature, entry: Weak<PoolEntry<P::Transport>>) {
        let Some(entry) = entry.upgrade() else {
            return;
        };
        if entry.busy.load(Ordering::Acquire) {
            return;
        }

        let mut entries = self.entries.lock().await;
        if let Some(pool) = entries.get_mut(signature) {
            pool.retain(|candidate| !Arc::ptr_eq(candidate, &entry));
        }
        drop(entries);

        self.active_count.fetch_sub(1, Ordering::AcqRel);
        let mut transport = entry.transport.lock().await;
        if let Err(error) = transport.terminate(Duration::from_secs(5)).await {
            tracing::warn!(%error, call_site = %signature.call_site, "error terminating idle ispawn worker");
        }
    }

    /// Terminates every pooled process and clears all bookkeeping (spec.md §6 `shutdown()`).
    pub async fn shutdown(&self) {
        let mut entries = self.entries.lock().await;
        for pool in entries.values() {
            for entry in pool {
                entry.cancel_idle_timer();
                let mut transport = entry.transport.lock().await;
                let _ = transport.terminate(Duration::from_secs(5)).await;
            }
        }
        entries.clear();
        self.active_count.store(0, Ordering::Release);
    }

    pub fn active_count(&self) -> usize {
        self.active_count.load(Ordering::Acquire)
    }
}

static GLOBAL_POOL: OnceLock<Arc<WorkerPool<SystemHardware, RealProvisioner>>> = OnceLock::new();

/// The process-wide pool every `spawn!` call site dispatches through.
pub fn global() -> &'static Arc<WorkerPool<SystemHardware, RealProvisioner>> {
    GLOBAL_POOL.get_or_init(|| {
        Arc::new(WorkerPool::new(Config::from_env(), SystemHardware, RealProvisioner))
    })
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
