use chrono::NaiveDate;

use super::items::low_stock;
use super::orders::query_orders;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Alerts, DaySummary, ItemSales, StatusCount};

pub const TOP_ITEMS: i64 = 5;
pub const DELAY_MINUTES: i64 = 15;

/// Sales for one local calendar day. Revenue only counts orders the kitchen
/// has accepted (neither Pending nor Cancelled).
pub fn day_summary(db: &Database, date: Option<String>) -> AppResult<DaySummary> {
    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::Validation(format!("Invalid date {raw}, expected YYYY-MM-DD")))?,
        None => chrono::Local::now().date_naive(),
    }
    .format("%Y-%m-%d")
    .to_string();

    let conn = db.lock()?;

    // Orders store UTC timestamps; compare on the local calendar day
    let (total_revenue, total_orders): (f64, i64) = conn.query_row(
        "SELECT COALESCE(SUM(CASE WHEN status NOT IN ('Pending', 'Cancelled') THEN total ELSE 0 END), 0), COUNT(*)
         FROM orders
         WHERE date(created_at, 'localtime') = ?1",
        [&date],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM orders
         WHERE date(created_at, 'localtime') = ?1
         GROUP BY status
         ORDER BY status",
    )?;
    let by_status = stmt
        .query_map([&date], |row| {
            Ok(StatusCount {
                status: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT oi.item_id, oi.name, SUM(oi.qty), SUM(oi.qty * oi.price)
         FROM order_items oi
         JOIN orders o ON oi.order_id = o.id
         WHERE date(o.created_at, 'localtime') = ?1 AND o.status != 'Cancelled'
         GROUP BY oi.item_id, oi.name
         ORDER BY SUM(oi.qty) DESC, oi.item_id ASC
         LIMIT ?2",
    )?;
    let top_items = stmt
        .query_map(rusqlite::params![date, TOP_ITEMS], |row| {
            Ok(ItemSales {
                item_id: row.get(0)?,
                name: row.get(1)?,
                quantity: row.get(2)?,
                revenue: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DaySummary {
        date,
        total_revenue,
        total_orders,
        by_status,
        top_items,
    })
}

/// Items running out and orders the kitchen has sat on for too long.
pub fn alerts(db: &Database, low_stock_threshold: i64, delay_minutes: i64) -> AppResult<Alerts> {
    let low_stock = low_stock(db, low_stock_threshold)?;

    let conn = db.lock()?;
    let delayed_orders = query_orders(
        &conn,
        "status IN ('Pending', 'Cooking') AND created_at <= datetime('now', ?1)",
        format!("-{} minutes", delay_minutes.max(0)),
    )?;

    Ok(Alerts {
        low_stock,
        delayed_orders,
    })
}
