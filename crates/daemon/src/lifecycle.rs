// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: paths, startup, shutdown.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use ck_adapters::{BotApiChannel, Channel, NoOpChannel, SendError, TracedChannel};
use ck_core::{Catalog, DispatchConfig, Payload, SystemClock, UserId, UuidIdGen};
use ck_engine::{Driver, EnrollmentFlow};
use ck_storage::Store;
use fs2::FileExt;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// Channel implementation selected by configuration
#[derive(Clone)]
pub enum AnyChannel {
    Noop(NoOpChannel),
    BotApi(BotApiChannel),
}

#[async_trait]
impl Channel for AnyChannel {
    async fn send(&self, user: UserId, payload: &Payload) -> Result<(), SendError> {
        match self {
            AnyChannel::Noop(channel) => channel.send(user, payload).await,
            AnyChannel::BotApi(channel) => channel.send(user, payload).await,
        }
    }
}

/// Concrete adapter types the daemon runs with
pub type DaemonChannel = TracedChannel<AnyChannel>;
pub type DaemonFlow = EnrollmentFlow<Store, Store, DaemonChannel, SystemClock, UuidIdGen>;
pub type DaemonDriver = Driver<Store, Store, DaemonChannel, SystemClock>;

/// Daemon configuration paths
#[derive(Debug, Clone)]
pub struct Config {
    /// Instance root directory (holds catalog.toml and ck.toml)
    pub root: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the operation WAL
    pub wal_path: PathBuf,
    /// Path to the question catalog
    pub catalog_path: PathBuf,
    /// Path to the daemon settings file
    pub config_path: PathBuf,
}

impl Config {
    /// Create config for an instance root
    pub fn for_root(root: &Path) -> Result<Self, LifecycleError> {
        let canonical = root
            .canonicalize()
            .map_err(|e| LifecycleError::RootNotFound(root.to_path_buf(), e))?;

        let hash = instance_hash(&canonical);
        let state_dir = state_dir()?.join("instances").join(&hash);
        let socket_dir = socket_dir()?;

        Ok(Self {
            root: canonical.clone(),
            socket_path: socket_dir.join(format!("{}.sock", hash)),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            wal_path: state_dir.join("wal").join("ops.wal"),
            catalog_path: canonical.join("catalog.toml"),
            config_path: canonical.join("ck.toml"),
        })
    }
}

/// File-level daemon settings: dispatch timings plus channel selection
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub dispatch: DispatchConfig,
    pub channel: ChannelConfig,
}

impl DaemonConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Which channel implementation to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Noop,
    BotApi,
}

/// Channel selection and credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelConfig {
    pub kind: ChannelKind,
    pub api_url: String,
    pub token: Option<String>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            kind: ChannelKind::Noop,
            api_url: "https://api.telegram.org".to_string(),
            token: None,
        }
    }
}

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    /// Shared store (also owned by the dispatch driver)
    pub store: Arc<Store>,
    /// Enrollment and answer flow for inbound messages
    pub flow: DaemonFlow,
    /// When daemon started
    pub start_time: Instant,
    /// Shutdown requested flag
    pub shutdown_requested: bool,
}

impl DaemonState {
    /// Shutdown the daemon gracefully
    pub fn shutdown(&mut self) {
        info!("Shutting down daemon...");

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Instance root not found at {0}: {1}")]
    RootNotFound(PathBuf, std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("WAL error: {0}")]
    Wal(#[from] ck_storage::WalError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] ck_core::CatalogError),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Channel kind bot_api requires a token")]
    MissingToken,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<(DaemonState, DaemonDriver), LifecycleError> {
    // 1. Create state directories (needed for socket, lock, WAL)
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = config.lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire the lock FIRST. Failing here must not disturb the files
    // of the daemon that holds it, so cleanup only guards what follows.
    let lock_file = acquire_lock(&config.lock_path)?;

    match startup_inner(config, lock_file).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    let lock_file = File::create(path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    use std::io::Write;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(
    config: &Config,
    lock_file: File,
) -> Result<(DaemonState, DaemonDriver), LifecycleError> {
    // 3. Load catalog and settings BEFORE binding the socket (fail fast)
    let catalog = load_catalog(&config.catalog_path)?;
    let daemon_config = DaemonConfig::load(&config.config_path)?;

    // 4. Open the store, replaying committed operations
    let store = Arc::new(Store::open(&catalog, &config.wal_path)?);
    let counts = store.counts();
    info!(
        "Loaded state: {} users, {} enrollments, {} instances, {} answers",
        counts.users, counts.enrollments, counts.instances, counts.answers
    );

    // 5. Build the delivery channel (wrapped with tracing for observability)
    let channel = TracedChannel::new(build_channel(&daemon_config.channel)?);

    // 6. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    // 7. One clock instance shared by the flow and both dispatchers
    let clock = SystemClock;

    let flow = EnrollmentFlow::new(
        Arc::clone(&store),
        Arc::clone(&store),
        channel.clone(),
        clock.clone(),
        UuidIdGen,
    );
    let driver = Driver::new(
        Arc::clone(&store),
        Arc::clone(&store),
        channel,
        clock,
        &daemon_config.dispatch,
    );

    info!("Daemon started for instance root: {}", config.root.display());

    Ok((
        DaemonState {
            config: config.clone(),
            lock_file,
            listener,
            store,
            flow,
            start_time: Instant::now(),
            shutdown_requested: false,
        },
        driver,
    ))
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    // Remove socket if we created it
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }

    // Remove PID/lock file
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Load the question catalog; a missing file means an empty catalog
fn load_catalog(path: &Path) -> Result<Catalog, LifecycleError> {
    if !path.exists() {
        warn!("No catalog at {}, starting empty", path.display());
        return Ok(Catalog::default());
    }
    Ok(Catalog::load(path)?)
}

fn build_channel(config: &ChannelConfig) -> Result<AnyChannel, LifecycleError> {
    match config.kind {
        ChannelKind::Noop => Ok(AnyChannel::Noop(NoOpChannel::new())),
        ChannelKind::BotApi => {
            let token = config.token.as_ref().ok_or(LifecycleError::MissingToken)?;
            Ok(AnyChannel::BotApi(BotApiChannel::new(
                config.api_url.clone(),
                token.clone(),
            )))
        }
    }
}

/// Get the state directory for ck
fn state_dir() -> Result<PathBuf, LifecycleError> {
    // Use XDG_STATE_HOME or default to ~/.local/state
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("ck"));
    }

    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/ck"))
}

/// Get the socket directory for ck
///
/// Uses /tmp/ck by default to keep paths short (macOS SUN_LEN = 104).
/// Can be overridden with CK_SOCKET_DIR for testing.
fn socket_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("CK_SOCKET_DIR") {
        return Ok(PathBuf::from(dir));
    }
    Ok(PathBuf::from("/tmp/ck"))
}

/// Compute instance hash for unique daemon directory
fn instance_hash(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let result = hasher.finalize();
    // Take first 16 chars of hex digest
    hex_encode(&result[..8])
}

// Hex encoding helper
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
