//! `snaphash hash`: fingerprint every location under the given roots.
//!
//! 1. Load config and resolve the hashing policy
//! 2. Snapshot each root, skipping the cache directory
//! 3. Hash every location in parallel, through the persisted cache unless
//!    `--no-cache` is given
//! 4. Print one line per location, then one `root` line per root

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use snaphash_cache::{
    CacheError, CachingSnapshotHasher, ContentSnapshotHasher, FileSystemLocationSnapshot,
    SnapshotHasher,
};
use snaphash_common::Fingerprint;
use tracing::debug;

use crate::session::{snapshot_roots, Session};
use crate::{GlobalArgs, HashArgs, ReportFormat};

/// Fingerprint of a single location; `None` when it is not hashable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedLocation {
    /// Location on disk.
    pub path: PathBuf,
    /// Content fingerprint under the active policy.
    pub fingerprint: Option<Fingerprint>,
}

/// Hashed locations, in pre-order, and the roots they were found under.
pub type HashRun = (Vec<HashedLocation>, Vec<FileSystemLocationSnapshot>);

/// Runs the `snaphash hash` command.
pub fn run(args: &HashArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let start = Instant::now();

    // Step 1: Load config
    let session = Session::load(global)?;

    // Steps 2-3: Snapshot and hash
    let (locations, roots) = hash_paths(&session, args)?;

    // Step 4: Report
    print!("{}", render(&locations, &roots, args.format));

    if !global.quiet {
        eprintln!(
            "     Hashed {} location(s) in {:.2}s",
            locations.len(),
            start.elapsed().as_secs_f64()
        );
    }

    Ok(0)
}

/// Snapshots `args.paths` and hashes every location under them.
///
/// The store is opened before snapshotting so that a cache directory created
/// inside a root is already there to be excluded.
pub fn hash_paths(
    session: &Session,
    args: &HashArgs,
) -> Result<HashRun, Box<dyn std::error::Error>> {
    let cache_dir = session.cache_dir(args.store.cache_dir.as_deref());
    let delegate = ContentSnapshotHasher::new(session.policy.clone());

    if args.no_cache {
        let roots = snapshot_roots(&args.paths, &cache_dir)?;
        let locations = hash_all(&delegate, &roots)?;
        return Ok((locations, roots));
    }

    let store = Arc::new(session.open_store(Some(cache_dir.as_path()))?);
    let roots = snapshot_roots(&args.paths, &cache_dir)?;
    let hasher = CachingSnapshotHasher::new(delegate, Arc::clone(&store));
    let locations = hash_all(&hasher, &roots)?;
    let stats = store.stats();
    debug!(
        hits = stats.hits,
        misses = stats.misses,
        waits = stats.waits,
        disk_hits = store.disk_hits(),
        "cache lookups"
    );
    Ok((locations, roots))
}

/// Hashes every location under `roots`, in pre-order, in parallel.
pub fn hash_all<H: SnapshotHasher>(
    hasher: &H,
    roots: &[FileSystemLocationSnapshot],
) -> Result<Vec<HashedLocation>, CacheError> {
    let nodes: Vec<&FileSystemLocationSnapshot> =
        roots.iter().flat_map(|root| root.descendants()).collect();
    nodes
        .par_iter()
        .map(|snapshot| -> Result<HashedLocation, CacheError> {
            Ok(HashedLocation {
                path: snapshot.path().to_path_buf(),
                fingerprint: hasher.hash(snapshot)?,
            })
        })
        .collect()
}

/// Formats hashed locations for stdout.
pub fn render(
    locations: &[HashedLocation],
    roots: &[FileSystemLocationSnapshot],
    format: ReportFormat,
) -> String {
    match format {
        ReportFormat::Text => {
            let mut out = String::new();
            for loc in locations {
                let fp = loc
                    .fingerprint
                    .map_or_else(|| "-".to_string(), |fp| fp.to_string());
                out.push_str(&format!("{fp} {}\n", loc.path.display()));
            }
            for root in roots {
                out.push_str(&format!("root {} {}\n", root.identity(), root.path().display()));
            }
            out
        }
        ReportFormat::Json => {
            let entries: Vec<serde_json::Value> = locations
                .iter()
                .map(|loc| {
                    serde_json::json!({
                        "path": loc.path.display().to_string(),
                        "fingerprint": loc.fingerprint.map(|fp| fp.to_string()),
                    })
                })
                .collect();
            let mut out = serde_json::Value::Array(entries).to_string();
            out.push('\n');
            out
        }
    }
}
