use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{categories_path, load_settings, save_settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    let conn = get_connection(&resolved.join("rupi.db"))?;
    init_db(&conn)?;

    // Seed the catalog file so users have something to edit
    let catalog_file = categories_path();
    if !catalog_file.exists() {
        Catalog::default_catalog().save(&catalog_file)?;
        println!("Wrote default categories to {}", catalog_file.display());
    }

    println!("Initialized rupi at {}", resolved.display());
    Ok(())
}

fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
