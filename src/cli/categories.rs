use comfy_table::{Cell, Table};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::settings::categories_path;

pub fn run() -> Result<()> {
    let catalog = Catalog::load(&categories_path());
    let mut table = Table::new();
    table.set_header(vec!["Category", "Description"]);
    for category in catalog.categories() {
        table.add_row(vec![
            Cell::new(&category.name),
            Cell::new(&category.description),
        ]);
    }
    println!("{table}");
    println!("Catch-all: {}", catalog.catch_all());
    println!("Edit {} to customize.", categories_path().display());
    Ok(())
}
