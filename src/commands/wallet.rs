use rusqlite::{Connection, Row};
use tracing::info;

use super::auth::find_user;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Transaction, TransactionKind, User};

const TRANSACTION_COLUMNS: &str = "id, user_id, kind, amount, description, created_at";

fn transaction_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        date: row.get(5)?,
    })
}

/// Appends a ledger entry. The caller moves the balance itself.
pub(crate) fn record_transaction(
    conn: &Connection,
    user_id: &str,
    kind: TransactionKind,
    amount: f64,
    description: &str,
) -> AppResult<Transaction> {
    conn.execute(
        "INSERT INTO transactions (user_id, kind, amount, description) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![user_id, kind, amount, description],
    )?;

    let id = conn.last_insert_rowid();
    let transaction = conn.query_row(
        &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
        [id],
        transaction_from_row,
    )?;

    Ok(transaction)
}

/// Adds `delta` to the wallet. Negative balances are allowed (Pay Later).
pub(crate) fn adjust_wallet(conn: &Connection, user_id: &str, delta: f64) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET wallet = wallet + ?1 WHERE id = ?2",
        rusqlite::params![delta, user_id],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::NotFound("User".to_string()));
    }
    Ok(())
}

pub fn top_up(db: &Database, user_id: &str, amount: f64) -> AppResult<(User, Transaction)> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::Validation(format!("Invalid top-up amount {amount}")));
    }

    let mut conn = db.lock()?;
    let tx = conn.transaction()?;

    adjust_wallet(&tx, user_id, amount)?;
    let transaction = record_transaction(
        &tx,
        user_id,
        TransactionKind::Credit,
        amount,
        "Wallet Top-up",
    )?;
    let user = find_user(&tx, user_id)?;

    tx.commit()?;

    info!("Wallet top-up of {amount} for {user_id}, balance now {}", user.wallet);
    Ok((user, transaction))
}

pub fn list_transactions(db: &Database, user_id: Option<&str>) -> AppResult<Vec<Transaction>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions
         WHERE (?1 IS NULL OR user_id = ?1)
         ORDER BY created_at DESC, id DESC"
    ))?;
    let transactions = stmt
        .query_map([user_id], transaction_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}
