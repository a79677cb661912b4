use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::json_list;
use crate::config::AdminAccount;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    Badge, BirthdayUpdate, LoginRequest, Loyalty, Preferences, RegisterUser, Role, User,
};
use crate::pricing;

const USER_COLUMNS: &str =
    "id, name, role, wallet, diet, allergies, points, total_spent, birthday, created_at";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    let points: i64 = row.get(6)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        wallet: row.get(3)?,
        preferences: Preferences {
            diet: row.get(4)?,
            allergies: json_list(row, 5)?,
        },
        loyalty: Loyalty {
            points,
            total_spent: row.get(7)?,
            badge: pricing::badge_for(points),
            birthday: row.get(8)?,
        },
        created_at: row.get(9)?,
    })
}

/// Loads a user inside an open connection or transaction.
pub(crate) fn find_user(conn: &Connection, id: &str) -> AppResult<User> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [id],
        user_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("User".to_string()))
}

fn admin_user(admin: &AdminAccount) -> User {
    User {
        id: admin.id.clone(),
        name: "Canteen Admin".to_string(),
        role: Role::Admin,
        wallet: 0.0,
        preferences: Preferences::default(),
        loyalty: Loyalty {
            points: 0,
            total_spent: 0.0,
            badge: Badge::Bronze,
            birthday: None,
        },
        created_at: None,
    }
}

pub fn login(db: &Database, admin: &AdminAccount, request: LoginRequest) -> AppResult<User> {
    let id = request.id.trim();
    debug!("Login attempt for {id}");

    if id.eq_ignore_ascii_case(&admin.id) && request.pass == admin.password {
        info!("Admin logged in");
        return Ok(admin_user(admin));
    }

    let conn = db.lock()?;

    let stored: Option<String> = conn
        .query_row("SELECT password FROM users WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?;

    match stored {
        None => Err(AppError::NotFound("User".to_string())),
        Some(password) if password != request.pass => Err(AppError::InvalidCredentials),
        Some(_) => find_user(&conn, id),
    }
}

pub fn register(db: &Database, user: RegisterUser) -> AppResult<User> {
    let id = user.id.trim();
    let name = user.name.trim();
    if id.is_empty() || name.is_empty() || user.pass.is_empty() {
        return Err(AppError::Validation(
            "User ID, name and password are required".to_string(),
        ));
    }

    let conn = db.lock()?;

    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    if exists {
        return Err(AppError::UserExists);
    }

    conn.execute(
        "INSERT INTO users (id, name, password, role) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![id, name, user.pass, Role::User],
    )?;

    info!("Registered user {id}");
    find_user(&conn, id)
}

pub fn get_user(db: &Database, id: &str) -> AppResult<User> {
    let conn = db.lock()?;
    find_user(&conn, id)
}

pub fn list_users(db: &Database) -> AppResult<Vec<User>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
    let users = stmt
        .query_map([], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(users)
}

pub fn update_preferences(db: &Database, id: &str, preferences: Preferences) -> AppResult<User> {
    let conn = db.lock()?;

    let allergies = serde_json::to_string(&preferences.allergies)?;
    conn.execute(
        "UPDATE users SET diet = ?1, allergies = ?2 WHERE id = ?3",
        rusqlite::params![preferences.diet, allergies, id],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::NotFound("User".to_string()));
    }

    find_user(&conn, id)
}

/// Sets or clears the birthday used for the birthday discount.
pub fn update_birthday(db: &Database, id: &str, update: BirthdayUpdate) -> AppResult<User> {
    let birthday = match update.birthday.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                AppError::Validation(format!("Invalid birthday {raw}, expected YYYY-MM-DD"))
            })?;
            Some(date.format("%Y-%m-%d").to_string())
        }
    };

    let conn = db.lock()?;

    conn.execute(
        "UPDATE users SET birthday = ?1 WHERE id = ?2",
        rusqlite::params![birthday, id],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::NotFound("User".to_string()));
    }

    find_user(&conn, id)
}
