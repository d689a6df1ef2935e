//! `snaphash stats`: show what the persisted cache holds.

use crate::session::Session;
use crate::{GlobalArgs, StoreArgs};

/// Runs the `snaphash stats` command.
pub fn run(args: &StoreArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let session = Session::load(global)?;
    let store = session.open_store(args.cache_dir.as_deref())?;

    println!("cache:   {}", store.cache_dir().display());
    println!("entries: {}", store.entry_count()?);
    Ok(0)
}
