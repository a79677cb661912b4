use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Announcement, NewAnnouncement};

pub fn list_announcements(db: &Database) -> AppResult<Vec<Announcement>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(
        "SELECT id, message, kind, created_at FROM announcements ORDER BY created_at DESC, id DESC",
    )?;

    let announcements = stmt
        .query_map([], |row| {
            Ok(Announcement {
                id: row.get(0)?,
                message: row.get(1)?,
                kind: row.get(2)?,
                date: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(announcements)
}

pub fn create_announcement(db: &Database, announcement: NewAnnouncement) -> AppResult<Announcement> {
    let message = announcement.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation(
            "Announcement message is required".to_string(),
        ));
    }

    let conn = db.lock()?;

    conn.execute(
        "INSERT INTO announcements (message, kind) VALUES (?1, ?2)",
        rusqlite::params![message, announcement.kind],
    )?;

    let id = conn.last_insert_rowid();

    let date: String = conn.query_row(
        "SELECT created_at FROM announcements WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;

    Ok(Announcement {
        id,
        message: message.to_string(),
        kind: announcement.kind,
        date,
    })
}

pub fn delete_announcement(db: &Database, id: i64) -> AppResult<()> {
    let conn = db.lock()?;

    conn.execute("DELETE FROM announcements WHERE id = ?1", [id])?;

    if conn.changes() == 0 {
        return Err(AppError::NotFound(format!("Announcement {id}")));
    }

    Ok(())
}
