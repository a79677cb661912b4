use rusqlite::Row;
use tracing::info;

use super::orders::load_order;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{NewReview, OrderStatus, Review};

const REVIEW_QUERY: &str = "SELECT r.id, r.order_id, r.user_id, u.name, r.rating, r.suggestion, r.created_at
     FROM reviews r
     LEFT JOIN users u ON r.user_id = u.id";

fn review_from_row(row: &Row) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        order_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        rating: row.get(4)?,
        suggestion: row.get(5)?,
        date: row.get(6)?,
    })
}

pub fn add_review(db: &Database, order_id: i64, review: NewReview) -> AppResult<Review> {
    if !(1..=5).contains(&review.rating) {
        return Err(AppError::Validation(format!(
            "Rating must be between 1 and 5, got {}",
            review.rating
        )));
    }

    let mut conn = db.lock()?;
    let tx = conn.transaction()?;

    let order = load_order(&tx, order_id)?;
    if order.user_id != review.user_id {
        return Err(AppError::Forbidden("Unauthorized".to_string()));
    }
    if order.status != OrderStatus::Completed {
        return Err(AppError::Validation(
            "Only completed orders can be rated".to_string(),
        ));
    }

    tx.execute(
        "UPDATE orders SET is_rated = 1 WHERE id = ?1 AND is_rated = 0",
        [order_id],
    )?;
    if tx.changes() == 0 {
        return Err(AppError::Validation("Order has already been rated".to_string()));
    }

    let suggestion = review
        .suggestion
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    tx.execute(
        "INSERT INTO reviews (order_id, user_id, rating, suggestion) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![order_id, review.user_id, review.rating, suggestion],
    )?;

    let id = tx.last_insert_rowid();
    let created = tx.query_row(
        &format!("{REVIEW_QUERY} WHERE r.id = ?1"),
        [id],
        review_from_row,
    )?;

    tx.commit()?;

    info!("Order #{order_id} rated {} by {}", created.rating, created.user_id);
    Ok(created)
}

pub fn list_reviews(db: &Database) -> AppResult<Vec<Review>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!("{REVIEW_QUERY} ORDER BY r.created_at DESC, r.id DESC"))?;
    let reviews = stmt
        .query_map([], review_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(reviews)
}
