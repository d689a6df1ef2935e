//! `snaphash gc`: drop cache entries not reachable from the given roots.
//!
//! An entry is live when some location under a root, hashed under the
//! current policy, would look it up. Entries written under other policies
//! are therefore collected too.

use std::sync::Arc;

use snaphash_cache::{
    CacheKey, CacheStore, CachingSnapshotHasher, ContentSnapshotHasher,
    FileSystemLocationSnapshot, SnapshotHasher,
};

use crate::session::{snapshot_roots, Session};
use crate::{GcArgs, GlobalArgs};

/// Runs the `snaphash gc` command.
pub fn run(args: &GcArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let session = Session::load(global)?;
    let cache_dir = session.cache_dir(args.store.cache_dir.as_deref());
    let store = Arc::new(session.open_store(Some(cache_dir.as_path()))?);
    let roots = snapshot_roots(&args.paths, &cache_dir)?;
    let hasher = CachingSnapshotHasher::new(
        ContentSnapshotHasher::new(session.policy.clone()),
        Arc::clone(&store),
    );

    let live = live_keys(&hasher, &roots);
    let removed = store.gc(&live)?;

    if !global.quiet {
        eprintln!(
            "  Collected {removed} entr{} ({} live)",
            if removed == 1 { "y" } else { "ies" },
            live.len()
        );
    }
    Ok(0)
}

/// Cache keys `hasher` would use for every location under `roots`.
pub fn live_keys<H, S>(
    hasher: &CachingSnapshotHasher<H, S>,
    roots: &[FileSystemLocationSnapshot],
) -> Vec<CacheKey>
where
    H: SnapshotHasher,
    S: CacheStore,
{
    roots
        .iter()
        .flat_map(|root| root.descendants())
        .map(|snapshot| hasher.cache_key(snapshot))
        .collect()
}
