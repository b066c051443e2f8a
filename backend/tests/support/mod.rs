//! Embedded PostgreSQL helpers shared by the Diesel adapter suites.
//!
//! Each suite boots its own `TestCluster`, creates a named database and runs
//! the crate's migrations against it. Set `SKIP_TEST_CLUSTER=1` to skip the
//! suites where the cluster cannot start.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use lead_sync::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};
use tokio::runtime::Runtime;

static BOOTSTRAP_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
static BOOTSTRAP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Attempts made when the PostgreSQL download fails transiently.
const MAX_RETRIES: u32 = 3;

/// Base delay between bootstrap attempts (doubles with each retry).
const RETRY_DELAY_MS: u64 = 500;

/// Render a `postgres` error with its SQLSTATE and detail.
fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}

/// Returns true when `SKIP_TEST_CLUSTER` is `1`, `true` or `yes`.
fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip when the cluster is opted out, otherwise fail loudly.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

fn pg_embed_dirs() -> Result<(PathBuf, PathBuf), std::io::Error> {
    let target = std::env::var_os("CARGO_TARGET_DIR").map_or_else(
        || PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("target"),
        PathBuf::from,
    );
    let unique = format!(
        "bootstrap-{}-{}",
        std::process::id(),
        BOOTSTRAP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let base = target.join("pg-embed").join(unique);
    let runtime_dir = base.join("install");
    let data_dir = base.join("data");
    std::fs::create_dir_all(&runtime_dir)?;
    std::fs::create_dir_all(&data_dir)?;
    Ok((runtime_dir, data_dir))
}

fn is_transient_error(error: &str) -> bool {
    let error = error.to_lowercase();
    [
        "error decoding response body",
        "connection reset",
        "timed out",
        "temporarily unavailable",
        "dns error",
    ]
    .iter()
    .any(|pattern| error.contains(pattern))
}

/// Boot a cluster under the target directory unless `PG_RUNTIME_DIR` and
/// `PG_DATA_DIR` are already set.
fn test_cluster() -> Result<TestCluster, String> {
    let _bootstrap_guard = BOOTSTRAP_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let needs_override =
        std::env::var_os("PG_RUNTIME_DIR").is_none() || std::env::var_os("PG_DATA_DIR").is_none();
    let _env_guard = if needs_override {
        let (runtime_dir, data_dir) = pg_embed_dirs().map_err(|err| err.to_string())?;
        Some(env_lock::lock_env([
            (
                "PG_RUNTIME_DIR",
                Some(runtime_dir.to_string_lossy().into_owned()),
            ),
            ("PG_DATA_DIR", Some(data_dir.to_string_lossy().into_owned())),
        ]))
    } else {
        None
    };

    let mut last_error = String::new();
    for attempt in 0..=MAX_RETRIES {
        match TestCluster::new() {
            Ok(cluster) => return Ok(cluster),
            Err(err) => {
                last_error = format!("{err:?}");
                if attempt == MAX_RETRIES || !is_transient_error(&last_error) {
                    break;
                }
                std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * (1 << attempt)));
            }
        }
    }
    Err(last_error)
}

/// Create `name` on the cluster and return its connection URL.
fn create_database(cluster: &TestCluster, name: &str) -> Result<String, String> {
    let admin_url = cluster.connection().database_url("postgres");
    let mut client =
        Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    // Database DDL cannot share an implicit transaction block.
    for statement in [
        format!("DROP DATABASE IF EXISTS \"{name}\""),
        format!("CREATE DATABASE \"{name}\""),
    ] {
        client
            .batch_execute(&statement)
            .map_err(|err| format_postgres_error(&err))?;
    }
    Ok(cluster.connection().database_url(name))
}

/// Cluster holding a database with the crate's migrations applied.
pub struct MigratedDatabase {
    pub runtime: Runtime,
    pub database_url: String,
    /// Versions applied while provisioning.
    pub applied: Vec<String>,
    _cluster: TestCluster,
}

impl MigratedDatabase {
    /// Small pool against the migrated database.
    pub fn pool(&self) -> Result<DbPool, String> {
        let config = PoolConfig::new(self.database_url.as_str())
            .with_max_size(2)
            .with_min_idle(Some(1));
        self.runtime
            .block_on(DbPool::new(config))
            .map_err(|err| err.to_string())
    }
}

/// Boot a cluster, create `name` and apply the embedded migrations to it.
pub fn migrated_database(name: &str) -> Result<MigratedDatabase, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let database_url = create_database(&cluster, name)?;
    let applied = runtime
        .block_on(run_pending_migrations(&database_url))
        .map_err(|err| err.to_string())?;
    Ok(MigratedDatabase {
        runtime,
        database_url,
        applied,
        _cluster: cluster,
    })
}
