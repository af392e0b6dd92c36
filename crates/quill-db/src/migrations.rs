use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            avatar      TEXT UNIQUE
        );

        CREATE TABLE IF NOT EXISTS articles (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            description     TEXT,
            body            TEXT NOT NULL,
            tag_list        TEXT NOT NULL DEFAULT '[]',
            favorite_list   TEXT NOT NULL DEFAULT '[]',
            update_time     TEXT NOT NULL,
            user_id         INTEGER REFERENCES users(id)
        );

        CREATE INDEX IF NOT EXISTS idx_articles_user
            ON articles(user_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
