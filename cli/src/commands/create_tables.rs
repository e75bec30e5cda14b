use std::path::Path;

use anyhow::Result;
use sparkify_shared::{schema::TABLE_NAMES, WarehouseStore};

pub fn run(db_path: &Path) -> Result<()> {
    let store = WarehouseStore::open(db_path)?;
    store.reset()?;
    tracing::info!("Recreated tables {:?} in {}", TABLE_NAMES, db_path.display());
    Ok(())
}
