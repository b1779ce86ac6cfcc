use std::io;
use std::path::PathBuf;

use openmw_mod_utils::{AppSettings, ModCollection, listing, logging};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging("openmw_mod_utils=info");

    let mut settings = match std::env::args().nth(2) {
        Some(path) => AppSettings::from_file(PathBuf::from(path))?,
        None => AppSettings::load_or_default()?,
    };
    // An explicit mods root replaces the configured ones.
    if let Some(root) = std::env::args().nth(1) {
        settings.core.mods_path = vec![root];
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for collection in ModCollection::build_all(&settings)? {
        listing::write_collection(&mut out, &collection)?;
    }
    Ok(())
}
