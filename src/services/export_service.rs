use crate::{
    error::{AppError, Result},
    models::{analytics::InventoryRow, money::format_cents},
};

pub const INVENTORY_HEADER: [&str; 9] = [
    "ID",
    "Title",
    "Author",
    "Genre",
    "Price",
    "Stock",
    "Stock Threshold",
    "Total Sold",
    "Total Revenue",
];

/// Render the inventory snapshot as CSV, header first
pub fn inventory_csv(rows: &[InventoryRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(INVENTORY_HEADER)?;

    for row in rows {
        writer.write_record([
            row.id.to_string(),
            row.title.clone(),
            row.author.clone(),
            row.genre.clone().unwrap_or_default(),
            format_cents(row.price_cents),
            row.stock.to_string(),
            row.stock_threshold.to_string(),
            row.total_sold.to_string(),
            format_cents(row.total_revenue_cents),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush failed: {}", e)))
}
