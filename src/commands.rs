// Tauri command handlers
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tauri::{AppHandle, Emitter, State};

use crate::auth::Session;
use crate::db::connection::DatabaseConnection;
use crate::db::models::{Song, SongForm, StartingNote};
use crate::db::operations::DbOperations;
use crate::player::{speed, ScrollPlayer};
use crate::settings::AppSettings;
use crate::state::{AppState, PlayerSlot};

/// Snapshot of the open player for the frontend.
#[derive(serde::Serialize)]
pub struct PlayerView {
    pub song: Song,
    pub mode: &'static str,
    pub is_scrolling: bool,
    pub speed_percent: u8,
}

impl PlayerView {
    fn of(player: &ScrollPlayer) -> Self {
        Self {
            song: player.song().clone(),
            mode: player.mode_label(),
            is_scrolling: player.is_scrolling(),
            speed_percent: player.speed_percent(),
        }
    }
}

// ===== Auth Commands =====

#[tauri::command]
pub fn register(email: String, password: String, state: State<'_, AppState>) -> Result<Session, String> {
    state
        .auth
        .register(&state.db, &email, &password)
        .map_err(|e| format!("Failed to register: {}", e))
}

#[tauri::command]
pub fn sign_in(email: String, password: String, state: State<'_, AppState>) -> Result<Session, String> {
    state
        .auth
        .sign_in(&state.db, &email, &password)
        .map_err(|e| format!("Failed to sign in: {}", e))
}

#[tauri::command]
pub fn sign_out(state: State<'_, AppState>) -> Result<(), String> {
    state.auth.sign_out();
    Ok(())
}

#[tauri::command]
pub fn current_session(state: State<'_, AppState>) -> Result<Option<Session>, String> {
    Ok(state.auth.current_session())
}

// ===== Catalog Commands =====

#[tauri::command]
pub fn list_songs(
    search: Option<String>,
    starting_note: Option<String>,
    state: State<'_, AppState>,
) -> Result<Vec<Song>, String> {
    state.auth.require_user().map_err(|e| e.to_string())?;

    let note = match starting_note.as_deref() {
        None | Some("All") => None,
        Some(value) => Some(StartingNote::parse(value).ok_or_else(|| format!("Unknown note: {}", value))?),
    };

    DbOperations::list_songs(&state.db, search.as_deref(), note)
        .map_err(|e| format!("Failed to get songs: {}", e))
}

#[tauri::command]
pub fn add_song(form: SongForm, state: State<'_, AppState>, app: AppHandle) -> Result<Song, String> {
    let user_id = state.auth.require_user().map_err(|e| e.to_string())?;

    // Required-field validation happens before the store is touched
    if form.title.trim().is_empty() {
        return Err("title is required".to_string());
    }
    if form.lyrics.trim().is_empty() {
        return Err("lyrics is required".to_string());
    }

    let song = DbOperations::insert_song(&state.db, user_id, &form).map_err(|e| {
        eprintln!("[Db] Insert failed: {}", e);
        format!("Failed to add song: {}", e)
    })?;

    let _ = app.emit("songs-changed", ());
    Ok(song)
}

// ===== Settings Commands =====

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> Result<AppSettings, String> {
    Ok(state.settings.lock().clone())
}

#[tauri::command]
pub fn update_settings(settings: AppSettings, state: State<'_, AppState>) -> Result<(), String> {
    settings.save(&state.app_dir)?;
    *state.settings.lock() = settings;
    Ok(())
}

// ===== Player Commands =====

#[tauri::command]
pub fn open_player(song_id: i64, state: State<'_, AppState>) -> Result<PlayerView, String> {
    let song = DbOperations::get_song(&state.db, song_id)
        .map_err(|e| format!("Failed to get song: {}", e))?
        .ok_or_else(|| format!("Song {} not found", song_id))?;

    let mut slot = state.player.lock();
    slot.open(ScrollPlayer::open(song));
    Ok(PlayerView::of(slot.player.as_ref().unwrap()))
}

#[tauri::command]
pub fn get_player_state(state: State<'_, AppState>) -> Result<Option<PlayerView>, String> {
    Ok(state.player.lock().player.as_ref().map(PlayerView::of))
}

#[tauri::command]
pub fn close_player(state: State<'_, AppState>, app: AppHandle) -> Result<(), String> {
    let mut slot = state.player.lock();
    release_player(&mut slot, |event| {
        let _ = app.emit(event, ());
    });
    Ok(())
}

/// Start or stop auto-scroll. The frontend passes the measured lyric
/// content and viewport heights; when a pass actually starts, a ticker
/// task emits `scroll-frame` events until the pass ends or the player
/// stops or closes.
#[tauri::command]
pub fn toggle_scroll(
    content_height: f64,
    viewport_height: f64,
    state: State<'_, AppState>,
    app: AppHandle,
) -> Result<bool, String> {
    let mut slot = state.player.lock();
    let generation = slot.generation;
    let player = slot.player.as_mut().ok_or("No open player")?;

    let scrolling = player.toggle_scroll(content_height, viewport_height, Instant::now());
    if scrolling && player.is_animating() {
        slot.scroll_pass += 1;
        spawn_ticker(app, Arc::clone(&state.player), generation, slot.scroll_pass);
    }
    Ok(scrolling)
}

/// Nudge the speed control by whole steps (negative slows down).
#[tauri::command]
pub fn adjust_scroll_speed(steps: i32, state: State<'_, AppState>) -> Result<u8, String> {
    let mut slot = state.player.lock();
    let player = slot.player.as_mut().ok_or("No open player")?;
    Ok(player.adjust_speed(steps.saturating_mul(speed::SPEED_STEP)))
}

#[tauri::command]
pub fn enter_edit(state: State<'_, AppState>) -> Result<PlayerView, String> {
    let mut slot = state.player.lock();
    let player = slot.player.as_mut().ok_or("No open player")?;
    player.enter_edit();
    Ok(PlayerView::of(player))
}

#[tauri::command]
pub fn update_draft(draft: SongForm, state: State<'_, AppState>) -> Result<(), String> {
    let mut slot = state.player.lock();
    let player = slot.player.as_mut().ok_or("No open player")?;
    player.update_draft(&draft).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn cancel_edit(state: State<'_, AppState>) -> Result<PlayerView, String> {
    let mut slot = state.player.lock();
    let player = slot.player.as_mut().ok_or("No open player")?;
    player.cancel_edit();
    Ok(PlayerView::of(player))
}

/// Persist the edit draft. The slot stays locked across the row update,
/// so at most one save or delete is ever in flight. A store failure
/// leaves the player in edit mode with nothing half-written.
#[tauri::command]
pub fn save_edit(state: State<'_, AppState>, app: AppHandle) -> Result<Song, String> {
    let mut slot = state.player.lock();
    let player = slot.player.as_mut().ok_or("No open player")?;

    let form = player.begin_save().map_err(|e| e.to_string())?;
    DbOperations::update_song(&state.db, player.song_id(), &form).map_err(|e| {
        eprintln!("[Player] Save failed: {}", e);
        format!("Failed to save song: {}", e)
    })?;

    player.mark_saved();
    let song = player.song().clone();
    let _ = app.emit("songs-changed", ());
    Ok(song)
}

/// Delete the open song. Confirmation happens in the frontend dialog
/// before this command is invoked; a decline never reaches us. On
/// success the player closes and the catalog refreshes exactly once;
/// on failure the player stays open in viewing mode.
#[tauri::command]
pub fn delete_song(state: State<'_, AppState>, app: AppHandle) -> Result<(), String> {
    let mut slot = state.player.lock();
    delete_open_song(&mut slot, &state.db, |event| {
        let _ = app.emit(event, ());
    })
}

/// Delete flow for the open song. On success the slot is closed and
/// `notify` fires `songs-changed` then `player-closed`, once each; on
/// any failure nothing is emitted and the player stays open.
fn delete_open_song(
    slot: &mut PlayerSlot,
    db: &DatabaseConnection,
    mut notify: impl FnMut(&str),
) -> Result<(), String> {
    let player = slot.player.as_ref().ok_or("No open player")?;
    player.ensure_can_delete().map_err(|e| e.to_string())?;

    DbOperations::delete_song(db, player.song_id()).map_err(|e| {
        eprintln!("[Player] Delete failed: {}", e);
        format!("Failed to delete song: {}", e)
    })?;

    slot.close();
    notify("songs-changed");
    notify("player-closed");
    Ok(())
}

/// Close the slot if a player is open, firing `player-closed` exactly
/// once. Closing an already-empty slot is a no-op.
fn release_player(slot: &mut PlayerSlot, mut notify: impl FnMut(&str)) {
    if slot.player.is_some() {
        slot.close();
        notify("player-closed");
    }
}

/// Frame loop for one scroll pass. Cooperative cancellation: before
/// every step it re-checks that the same player and the same pass are
/// still live, so close/stop during a sleep ends the loop without
/// another frame.
fn spawn_ticker(app: AppHandle, slot: Arc<Mutex<PlayerSlot>>, generation: u64, pass: u64) {
    tauri::async_runtime::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(16));
        loop {
            interval.tick().await;

            let frame = {
                let mut guard = slot.lock();
                if guard.generation != generation || guard.scroll_pass != pass {
                    break;
                }
                let Some(player) = guard.player.as_mut() else {
                    break;
                };
                if !player.is_scrolling() {
                    break;
                }
                match player.frame(Instant::now()) {
                    Some(frame) => frame,
                    None => break,
                }
            };

            if app.emit("scroll-frame", frame).is_err() {
                break;
            }
            if frame.done {
                break;
            }
        }
    });
}
