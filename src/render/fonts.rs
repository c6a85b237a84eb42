//! Shared font database.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use usvg::fontdb::Database;

static SYSTEM_FONTS: OnceLock<Arc<Database>> = OnceLock::new();

/// Process-wide database of system fonts, loaded on first use.
pub fn system_fonts() -> Arc<Database> {
    SYSTEM_FONTS
        .get_or_init(|| {
            let mut db = Database::new();
            db.load_system_fonts();
            log::debug!("loaded {} system font faces", db.len());
            Arc::new(db)
        })
        .clone()
}

/// System fonts plus every font found under `dirs`.
///
/// Returns the shared database unchanged when `dirs` is empty.
pub fn load_fonts(dirs: &[PathBuf]) -> Arc<Database> {
    if dirs.is_empty() {
        return system_fonts();
    }
    let mut db = (*system_fonts()).clone();
    for dir in dirs {
        if dir.is_dir() {
            db.load_fonts_dir(dir);
        } else {
            log::warn!("font directory {} does not exist", dir.display());
        }
    }
    log::debug!("font database holds {} faces", db.len());
    Arc::new(db)
}

/// Empty database, for deterministic tests.
pub fn empty_fonts() -> Arc<Database> {
    Arc::new(Database::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_fonts_shared() {
        let a = system_fonts();
        let b = system_fonts();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&load_fonts(&[]), &a));
    }
}
