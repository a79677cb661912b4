use chrono::NaiveDate;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, warn};

use super::auth::find_user;
use super::wallet::{adjust_wallet, record_transaction};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    CartLine, Order, OrderLine, OrderStatus, PaymentMethod, PlaceOrder, Requester,
    TransactionKind,
};
use crate::pricing;

const ORDER_COLUMNS: &str = "id, user_id, subtotal, discount, total, status, otp, payment_method, payment_collected, pickup_time, is_rated, created_at";

pub const DEFAULT_PICKUP: &str = "ASAP";

fn order_from_row(row: &Row) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        user_id: row.get(1)?,
        items: Vec::new(),
        subtotal: row.get(2)?,
        discount: row.get(3)?,
        total: row.get(4)?,
        status: row.get(5)?,
        otp: row.get(6)?,
        payment_method: row.get(7)?,
        payment_collected: row.get(8)?,
        pickup_time: row.get(9)?,
        is_rated: row.get(10)?,
        date: row.get(11)?,
    })
}

fn load_lines(conn: &Connection, order_id: i64) -> AppResult<Vec<OrderLine>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, name, price, qty FROM order_items WHERE order_id = ?1 ORDER BY id",
    )?;

    let lines = stmt
        .query_map([order_id], |row| {
            Ok(OrderLine {
                id: row.get(0)?,
                name: row.get(1)?,
                price: row.get(2)?,
                qty: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(lines)
}

pub(crate) fn load_order(conn: &Connection, id: i64) -> AppResult<Order> {
    let mut order = conn
        .query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
            [id],
            order_from_row,
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;

    order.items = load_lines(conn, id)?;
    Ok(order)
}

/// Loads every order matching `filter` (a SQL condition over the orders
/// table with at most one parameter), newest first.
pub(crate) fn query_orders(
    conn: &Connection,
    filter: &str,
    param: impl rusqlite::ToSql,
) -> AppResult<Vec<Order>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE {filter} ORDER BY created_at DESC, id DESC"
    ))?;

    let mut orders = stmt
        .query_map([param], order_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for order in &mut orders {
        order.items = load_lines(conn, order.id)?;
    }

    Ok(orders)
}

fn generate_otp() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

/// Folds repeated cart lines for the same item into one.
fn merge_cart(lines: &[CartLine]) -> AppResult<Vec<CartLine>> {
    if lines.is_empty() {
        return Err(AppError::Validation("Cart is empty".to_string()));
    }

    let mut cart: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.qty <= 0 {
            return Err(AppError::Validation(format!(
                "Invalid quantity {} for item {}",
                line.qty, line.id
            )));
        }
        match cart.iter_mut().find(|c| c.id == line.id) {
            Some(existing) => {
                existing.qty = existing.qty.checked_add(line.qty).ok_or_else(|| {
                    AppError::Validation(format!("Quantity too large for item {}", line.id))
                })?;
            }
            None => cart.push(line.clone()),
        }
    }

    Ok(cart)
}

fn adjust_loyalty(conn: &Connection, user_id: &str, points: i64, spent: f64) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET points = MAX(0, points + ?1), total_spent = MAX(0, total_spent + ?2) WHERE id = ?3",
        rusqlite::params![points, spent, user_id],
    )?;
    Ok(())
}

/// Compare-and-set on the order status. Fails if someone else moved it first.
pub(crate) fn transition(
    conn: &Connection,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> AppResult<()> {
    conn.execute(
        "UPDATE orders SET status = ?1 WHERE id = ?2 AND status = ?3",
        rusqlite::params![to, id, from],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::InvalidTransition { from, to });
    }
    Ok(())
}

/// Prices the cart from the menu, debits the wallet, accrues loyalty and
/// decrements stock as one unit of work.
pub fn place_order(db: &Database, order: PlaceOrder, today: NaiveDate) -> AppResult<Order> {
    let cart = merge_cart(&order.items)?;

    let mut conn = db.lock()?;
    let tx = conn.transaction()?;

    let user = find_user(&tx, &order.user_id)?;

    let mut lines = Vec::with_capacity(cart.len());
    let mut subtotal = 0.0;

    for line in &cart {
        let (name, price, stock): (String, f64, i64) = tx
            .query_row(
                "SELECT name, price, stock FROM items WHERE id = ?1",
                [line.id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("Item {}", line.id)))?;

        if stock < line.qty {
            return Err(AppError::InsufficientStock {
                name,
                requested: line.qty,
                available: stock,
            });
        }

        subtotal += price * line.qty as f64;
        lines.push(OrderLine {
            id: line.id,
            name,
            price,
            qty: line.qty,
        });
    }

    let quote = pricing::quote(
        subtotal,
        user.loyalty.points,
        user.loyalty.birthday.as_deref(),
        today,
    );

    if let Some(client_total) = order.total {
        if (client_total - quote.total).abs() > f64::EPSILON {
            warn!(
                "Client total {client_total} for {} differs from settled total {}",
                user.id, quote.total
            );
        }
    }

    let method = order.payment_method;
    if method == PaymentMethod::Wallet && user.wallet < quote.total {
        return Err(AppError::InsufficientBalance);
    }

    let pickup_time = order
        .pickup_time
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PICKUP.to_string());

    tx.execute(
        "INSERT INTO orders (user_id, subtotal, discount, total, status, otp, payment_method, payment_collected, pickup_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            user.id,
            quote.subtotal,
            quote.discount(),
            quote.total,
            OrderStatus::Pending,
            generate_otp(),
            method,
            method == PaymentMethod::Wallet,
            pickup_time,
        ],
    )?;

    let order_id = tx.last_insert_rowid();

    for line in &lines {
        tx.execute(
            "INSERT INTO order_items (order_id, item_id, name, price, qty) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![order_id, line.id, line.name, line.price, line.qty],
        )?;

        tx.execute(
            "UPDATE items SET stock = stock - ?1 WHERE id = ?2",
            rusqlite::params![line.qty, line.id],
        )?;
    }

    if method.debits_wallet() {
        adjust_wallet(&tx, &user.id, -quote.total)?;
        let kind = if method == PaymentMethod::Wallet {
            TransactionKind::Debit
        } else {
            TransactionKind::DebitOnCredit
        };
        record_transaction(
            &tx,
            &user.id,
            kind,
            quote.total,
            &format!("Order Payment #{order_id}"),
        )?;
    }

    adjust_loyalty(
        &tx,
        &user.id,
        pricing::points_earned(quote.total),
        quote.total,
    )?;

    let placed = load_order(&tx, order_id)?;
    tx.commit()?;

    info!(
        "Order #{order_id} placed by {} via {method}: subtotal {}, discount {}, total {}",
        user.id,
        quote.subtotal,
        quote.discount(),
        quote.total
    );

    Ok(placed)
}

pub fn list_orders(db: &Database, user_id: Option<&str>) -> AppResult<Vec<Order>> {
    let conn = db.lock()?;
    query_orders(&conn, "(?1 IS NULL OR user_id = ?1)", user_id)
}

pub fn get_order(db: &Database, id: i64) -> AppResult<Order> {
    let conn = db.lock()?;
    load_order(&conn, id)
}

/// Kitchen-side status change. Only single forward steps are accepted;
/// `Cancelled` goes through the admin cancellation path so refunds happen.
pub fn update_status(db: &Database, id: i64, status: OrderStatus) -> AppResult<Order> {
    if status == OrderStatus::Cancelled {
        return cancel_order(db, id, &Requester::Admin);
    }

    let conn = db.lock()?;

    let current = load_order(&conn, id)?.status;
    if current.next() != Some(status) {
        return Err(AppError::InvalidTransition {
            from: current,
            to: status,
        });
    }

    transition(&conn, id, current, status)?;
    info!("Order #{id}: {current} -> {status}");

    load_order(&conn, id)
}

/// Pickup check: a Ready order with the matching code is completed.
pub fn verify_otp(db: &Database, id: i64, otp: &str) -> AppResult<Order> {
    let conn = db.lock()?;

    let order = load_order(&conn, id)?;
    if order.status != OrderStatus::Ready {
        return Err(AppError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Completed,
        });
    }
    if order.otp != otp.trim() {
        return Err(AppError::Validation("Incorrect OTP".to_string()));
    }

    transition(&conn, id, OrderStatus::Ready, OrderStatus::Completed)?;
    info!("Order #{id} picked up");

    load_order(&conn, id)
}

pub fn cancel_order(db: &Database, id: i64, requester: &Requester) -> AppResult<Order> {
    let mut conn = db.lock()?;
    let tx = conn.transaction()?;

    let order = load_order(&tx, id)?;

    if order.status.is_terminal() {
        return Err(AppError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Cancelled,
        });
    }

    if let Requester::User(user_id) = requester {
        if *user_id != order.user_id {
            return Err(AppError::Forbidden("Unauthorized".to_string()));
        }
        if order.status != OrderStatus::Pending {
            return Err(AppError::Forbidden(
                "Order cannot be cancelled now.".to_string(),
            ));
        }
    }

    transition(&tx, id, order.status, OrderStatus::Cancelled)?;

    if order.payment_method.debits_wallet() || order.payment_collected {
        adjust_wallet(&tx, &order.user_id, order.total)?;
        record_transaction(
            &tx,
            &order.user_id,
            TransactionKind::Credit,
            order.total,
            &format!("Refund for Order #{id}"),
        )?;
    }

    for line in &order.items {
        tx.execute(
            "UPDATE items SET stock = stock + ?1 WHERE id = ?2",
            rusqlite::params![line.qty, line.id],
        )?;
    }

    adjust_loyalty(
        &tx,
        &order.user_id,
        -pricing::points_earned(order.total),
        -order.total,
    )?;

    let cancelled = load_order(&tx, id)?;
    tx.commit()?;

    info!("Order #{id} cancelled by {requester:?}");
    Ok(cancelled)
}

/// Settles a Pay Later debt: the money was collected at the counter, so the
/// wallet debit taken at placement is credited back.
pub fn settle_order(db: &Database, id: i64) -> AppResult<Order> {
    let mut conn = db.lock()?;
    let tx = conn.transaction()?;

    let order = load_order(&tx, id)?;

    if order.payment_method != PaymentMethod::PayLater {
        return Err(AppError::Validation(
            "Only Pay Later orders can be settled".to_string(),
        ));
    }
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::Validation(
            "Cancelled orders cannot be settled".to_string(),
        ));
    }

    tx.execute(
        "UPDATE orders SET payment_collected = 1 WHERE id = ?1 AND payment_collected = 0",
        [id],
    )?;
    if tx.changes() == 0 {
        return Err(AppError::Validation("Order is already settled".to_string()));
    }

    adjust_wallet(&tx, &order.user_id, order.total)?;
    record_transaction(
        &tx,
        &order.user_id,
        TransactionKind::Credit,
        order.total,
        &format!("Debt settled for Order #{id}"),
    )?;

    let settled = load_order(&tx, id)?;
    tx.commit()?;

    info!("Order #{id} settled for {}", order.total);
    Ok(settled)
}

/// Marks a PayAtCounter order as paid or unpaid.
pub fn set_payment_collected(db: &Database, id: i64, collected: bool) -> AppResult<Order> {
    let conn = db.lock()?;

    let order = load_order(&conn, id)?;
    if order.payment_method != PaymentMethod::PayAtCounter {
        return Err(AppError::Validation(
            "Payment status can only be changed for PayAtCounter orders".to_string(),
        ));
    }
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::Validation(
            "Cannot change payment on a cancelled order".to_string(),
        ));
    }

    conn.execute(
        "UPDATE orders SET payment_collected = ?1 WHERE id = ?2",
        rusqlite::params![collected, id],
    )?;

    load_order(&conn, id)
}
