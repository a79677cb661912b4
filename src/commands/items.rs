use rusqlite::{Connection, OptionalExtension, Row};
use tracing::info;

use super::json_list;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Item, ItemFilter, ItemPatch, NewItem};

pub const DEFAULT_STOCK: i64 = 50;
pub const LOW_STOCK_THRESHOLD: i64 = 10;

const ITEM_COLUMNS: &str =
    "id, name, price, category, dietary, image, description, calories, protein, allergens, tags, stock";

fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        category: row.get(3)?,
        dietary: row.get(4)?,
        image: row.get(5)?,
        description: row.get(6)?,
        calories: row.get(7)?,
        protein: row.get(8)?,
        allergens: json_list(row, 9)?,
        tags: json_list(row, 10)?,
        stock: row.get(11)?,
    })
}

fn find_item(conn: &Connection, id: i64) -> AppResult<Item> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
        [id],
        item_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("Item {id}")))
}

fn validate(name: &str, price: f64, stock: i64) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Item name is required".to_string()));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(format!("Invalid price {price}")));
    }
    if stock < 0 {
        return Err(AppError::Validation(format!("Invalid stock {stock}")));
    }
    Ok(())
}

fn insert_item(conn: &Connection, item: &NewItem, keep_id: bool) -> AppResult<i64> {
    let stock = item.stock.unwrap_or(DEFAULT_STOCK);
    validate(&item.name, item.price, stock)?;

    let id = if keep_id { item.id } else { None };

    conn.execute(
        "INSERT INTO items (id, name, price, category, dietary, image, description, calories, protein, allergens, tags, stock)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            id,
            item.name.trim(),
            item.price,
            item.category,
            item.dietary,
            item.image,
            item.description,
            item.calories,
            item.protein,
            serde_json::to_string(&item.allergens)?,
            serde_json::to_string(&item.tags)?,
            stock,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn list_items(db: &Database, filter: &ItemFilter) -> AppResult<Vec<Item>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM items
         WHERE (?1 IS NULL OR category = ?1)
           AND (?2 IS NULL OR dietary = ?2)
           AND (?3 IS NULL OR lower(name) LIKE '%' || lower(?3) || '%')
         ORDER BY id"
    ))?;

    let items = stmt
        .query_map(
            rusqlite::params![filter.category, filter.dietary, filter.q],
            item_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

pub fn get_item(db: &Database, id: i64) -> AppResult<Item> {
    let conn = db.lock()?;
    find_item(&conn, id)
}

pub fn create_item(db: &Database, item: NewItem) -> AppResult<Item> {
    let conn = db.lock()?;

    let id = insert_item(&conn, &item, false)?;
    info!("Added menu item {} ({id})", item.name);

    find_item(&conn, id)
}

pub fn update_item(db: &Database, id: i64, patch: ItemPatch) -> AppResult<Item> {
    let conn = db.lock()?;

    let mut item = find_item(&conn, id)?;

    if let Some(name) = patch.name {
        item.name = name.trim().to_string();
    }
    if let Some(price) = patch.price {
        item.price = price;
    }
    if let Some(category) = patch.category {
        item.category = category;
    }
    if let Some(dietary) = patch.dietary {
        item.dietary = dietary;
    }
    if let Some(image) = patch.image {
        item.image = image;
    }
    if patch.description.is_some() {
        item.description = patch.description;
    }
    if patch.calories.is_some() {
        item.calories = patch.calories;
    }
    if patch.protein.is_some() {
        item.protein = patch.protein;
    }
    if let Some(allergens) = patch.allergens {
        item.allergens = allergens;
    }
    if let Some(tags) = patch.tags {
        item.tags = tags;
    }
    if let Some(stock) = patch.stock {
        item.stock = stock;
    }

    validate(&item.name, item.price, item.stock)?;

    conn.execute(
        "UPDATE items SET name = ?1, price = ?2, category = ?3, dietary = ?4, image = ?5, description = ?6,
                calories = ?7, protein = ?8, allergens = ?9, tags = ?10, stock = ?11
         WHERE id = ?12",
        rusqlite::params![
            item.name,
            item.price,
            item.category,
            item.dietary,
            item.image,
            item.description,
            item.calories,
            item.protein,
            serde_json::to_string(&item.allergens)?,
            serde_json::to_string(&item.tags)?,
            item.stock,
            id,
        ],
    )?;

    find_item(&conn, id)
}

/// Orders keep their own snapshot of the item, so deletion is always allowed.
pub fn delete_item(db: &Database, id: i64) -> AppResult<()> {
    let conn = db.lock()?;

    conn.execute("DELETE FROM items WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::NotFound(format!("Item {id}")));
    }

    info!("Removed menu item {id}");
    Ok(())
}

/// Replaces the whole menu. Ids given in the payload are kept.
pub fn seed_items(db: &Database, items: Vec<NewItem>) -> AppResult<Vec<Item>> {
    let mut conn = db.lock()?;
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM items", [])?;
    for item in &items {
        insert_item(&tx, item, true)?;
    }
    tx.commit()?;

    info!("Seeded menu with {} items", items.len());
    drop(conn);

    list_items(db, &ItemFilter::default())
}

pub fn list_categories(db: &Database) -> AppResult<Vec<String>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare("SELECT DISTINCT category FROM items ORDER BY category")?;
    let categories = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(categories)
}

pub fn low_stock(db: &Database, threshold: i64) -> AppResult<Vec<Item>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE stock < ?1 ORDER BY stock ASC, id ASC"
    ))?;
    let items = stmt
        .query_map([threshold], item_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}
