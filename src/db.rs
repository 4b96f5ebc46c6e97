use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::checklist::{Checklist, ChecklistItem, Summary};
use crate::parser::{CourseRecord, PLACEHOLDER_URL};

/// Prefix of ids minted for courses typed in by hand.
pub const MANUAL_ID_PREFIX: &str = "manual_";

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS courses (
            id         TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            code       TEXT NOT NULL,
            url        TEXT NOT NULL,
            position   INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_courses_position ON courses(position);

        -- No foreign key: rows outlive a refresh that drops the course.
        CREATE TABLE IF NOT EXISTS checklist (
            course_id  TEXT PRIMARY KEY,
            attendance BOOLEAN NOT NULL DEFAULT 0,
            task       BOOLEAN NOT NULL DEFAULT 0,
            discussion BOOLEAN NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

pub struct StoredCourse {
    pub course: CourseRecord,
    pub checklist: Checklist,
}

fn manual_glob() -> String {
    format!("{}*", MANUAL_ID_PREFIX)
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ── Courses ──

/// Replace the scraped course list, keeping manual entries after it.
/// Checklist rows are left alone so state follows the course id.
pub fn refresh_courses(conn: &Connection, courses: &[CourseRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM courses WHERE id NOT GLOB ?1",
        params![manual_glob()],
    )?;
    let stamp = now();
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO courses (id, name, code, url, position, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name, code = excluded.code, url = excluded.url,
                position = excluded.position, updated_at = excluded.updated_at",
        )?;
        for (i, c) in courses.iter().enumerate() {
            count += stmt.execute(params![c.id, c.name, c.code, c.url, i as i64, stamp])?;
        }
    }
    tx.execute(
        "UPDATE courses SET position = position + ?1 WHERE id GLOB ?2",
        params![courses.len() as i64, manual_glob()],
    )?;
    tx.commit()?;
    info!("Saved {} courses", count);
    Ok(count)
}

pub fn fetch_courses(conn: &Connection) -> Result<Vec<StoredCourse>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.code, c.url,
                COALESCE(k.attendance, 0), COALESCE(k.task, 0), COALESCE(k.discussion, 0)
         FROM courses c
         LEFT JOIN checklist k ON k.course_id = c.id
         ORDER BY c.position, c.id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredCourse {
                course: CourseRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    code: row.get(2)?,
                    url: row.get(3)?,
                },
                checklist: Checklist {
                    attendance: row.get(4)?,
                    task: row.get(5)?,
                    discussion: row.get(6)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Append a course the scraper could not find. Both fields are required.
pub fn add_manual(conn: &Connection, name: &str, code: &str) -> Result<CourseRecord> {
    let (name, code) = (name.trim(), code.trim());
    if name.is_empty() || code.is_empty() {
        bail!("Course name and code are both required");
    }

    let millis = chrono::Utc::now().timestamp_millis();
    let mut id = format!("{}{}", MANUAL_ID_PREFIX, millis);
    let mut bump = 0;
    while course_exists(conn, &id)? {
        bump += 1;
        id = format!("{}{}", MANUAL_ID_PREFIX, millis + bump);
    }

    let position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM courses",
        [],
        |row| row.get(0),
    )?;
    let course = CourseRecord {
        id,
        name: name.to_string(),
        code: code.to_string(),
        url: PLACEHOLDER_URL.to_string(),
    };
    conn.execute(
        "INSERT INTO courses (id, name, code, url, position, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![course.id, course.name, course.code, course.url, position, now()],
    )?;
    Ok(course)
}

/// User correction of a scraped name.
pub fn rename(conn: &Connection, id: &str, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("New name must not be empty");
    }
    let changed = conn.execute(
        "UPDATE courses SET name = ?1, updated_at = ?2 WHERE id = ?3",
        params![name, now(), id],
    )?;
    if changed == 0 {
        bail!("No course with id {:?}", id);
    }
    Ok(())
}

pub fn set_check(conn: &Connection, id: &str, item: ChecklistItem, value: bool) -> Result<()> {
    if !course_exists(conn, id)? {
        bail!("No course with id {:?}", id);
    }
    // Column name comes from a closed enum, never from user input.
    let sql = format!(
        "INSERT INTO checklist (course_id, {col}, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(course_id) DO UPDATE SET {col} = excluded.{col}, updated_at = excluded.updated_at",
        col = item.column()
    );
    conn.execute(&sql, params![id, value, now()])?;
    Ok(())
}

/// Counts over every checklist row, including rows of courses no longer listed.
pub fn summary(conn: &Connection) -> Result<Summary> {
    let mut stmt = conn.prepare("SELECT attendance, task, discussion FROM checklist")?;
    let lists = stmt
        .query_map([], |row| {
            Ok(Checklist {
                attendance: row.get(0)?,
                task: row.get(1)?,
                discussion: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Summary::tally(&lists))
}

fn course_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM courses WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}
