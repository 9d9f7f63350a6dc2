use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::connection::DatabaseConnection;
use crate::db::models::{ScrollSpeed, Song, SongForm, StartingNote, User};

/// Database operations for the songbook
pub struct DbOperations;

impl DbOperations {
    // ===== Users =====

    pub fn insert_user(db: &DatabaseConnection, email: &str, password_hash: &str) -> Result<User> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO users (email, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![email, password_hash, now],
        )?;

        Ok(User {
            id: conn.last_insert_rowid(),
            email: email.to_string(),
            created_at: now,
        })
    }

    /// Returns the user's id and stored password hash, if the email is known.
    pub fn get_user_credentials(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<(i64, String)>> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let row = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row)
    }

    // ===== Songs =====

    pub fn insert_song(db: &DatabaseConnection, user_id: i64, form: &SongForm) -> Result<Song> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO songs (user_id, title, lyrics, starting_note, scroll_speed, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                form.title,
                form.lyrics,
                form.starting_note.as_str(),
                form.scroll_speed.as_str(),
                now,
                now
            ],
        )?;

        Ok(Song {
            id: conn.last_insert_rowid(),
            user_id,
            title: form.title.clone(),
            lyrics: form.lyrics.clone(),
            starting_note: form.starting_note,
            scroll_speed: form.scroll_speed,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetch songs, newest first. `search` matches title or lyrics
    /// case-insensitively; `note` filters on the exact starting note.
    pub fn list_songs(
        db: &DatabaseConnection,
        search: Option<&str>,
        note: Option<StartingNote>,
    ) -> Result<Vec<Song>> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, lyrics, starting_note, scroll_speed, created_at, updated_at
             FROM songs
             WHERE (?1 IS NULL OR lower(title) LIKE ?1 OR lower(lyrics) LIKE ?1)
               AND (?2 IS NULL OR starting_note = ?2)
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map(
            params![pattern, note.map(|n| n.as_str())],
            Self::row_to_song,
        )?;

        let mut songs = Vec::new();
        for song in rows {
            songs.push(song?);
        }
        Ok(songs)
    }

    pub fn get_song(db: &DatabaseConnection, song_id: i64) -> Result<Option<Song>> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let song = conn
            .query_row(
                "SELECT id, user_id, title, lyrics, starting_note, scroll_speed, created_at, updated_at
                 FROM songs WHERE id = ?1",
                params![song_id],
                Self::row_to_song,
            )
            .optional()?;

        Ok(song)
    }

    /// Single-statement row update; either the whole row changes or nothing does.
    pub fn update_song(db: &DatabaseConnection, song_id: i64, form: &SongForm) -> Result<()> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let now = Utc::now().timestamp();
        let changed = conn.execute(
            "UPDATE songs
             SET title = ?1, lyrics = ?2, starting_note = ?3, scroll_speed = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                form.title,
                form.lyrics,
                form.starting_note.as_str(),
                form.scroll_speed.as_str(),
                now,
                song_id
            ],
        )?;

        if changed == 0 {
            return Err(anyhow!("song {} no longer exists", song_id));
        }
        Ok(())
    }

    pub fn delete_song(db: &DatabaseConnection, song_id: i64) -> Result<()> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let changed = conn.execute("DELETE FROM songs WHERE id = ?1", params![song_id])?;
        if changed == 0 {
            return Err(anyhow!("song {} no longer exists", song_id));
        }
        Ok(())
    }

    fn row_to_song(row: &Row) -> rusqlite::Result<Song> {
        let note: String = row.get(4)?;
        let speed: String = row.get(5)?;
        // A row holding a value outside the closed enums is corrupt;
        // surface it rather than coercing to a default
        let starting_note = StartingNote::parse(&note).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown starting note: {}", note).into(),
            )
        })?;
        let scroll_speed = ScrollSpeed::parse(&speed).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("unknown scroll speed: {}", speed).into(),
            )
        })?;
        Ok(Song {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            lyrics: row.get(3)?,
            starting_note,
            scroll_speed,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}
