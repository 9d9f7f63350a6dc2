// Application state management
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::auth::AuthManager;
use crate::db::connection::DatabaseConnection;
use crate::player::ScrollPlayer;
use crate::settings::AppSettings;

/// The single open player. The generation counter bumps on every open
/// and close so the frame ticker and any in-flight work can detect that
/// the player they were started for is gone; the pass counter bumps on
/// every scroll start so a stale ticker never drives a newer pass.
pub struct PlayerSlot {
    pub player: Option<ScrollPlayer>,
    pub generation: u64,
    pub scroll_pass: u64,
}

impl PlayerSlot {
    pub fn new() -> Self {
        Self {
            player: None,
            generation: 0,
            scroll_pass: 0,
        }
    }

    pub fn open(&mut self, player: ScrollPlayer) {
        self.generation += 1;
        self.player = Some(player);
    }

    pub fn close(&mut self) {
        self.generation += 1;
        self.player = None;
    }
}

pub struct AppState {
    pub db: DatabaseConnection,
    pub auth: AuthManager,
    pub player: Arc<Mutex<PlayerSlot>>,
    pub settings: Mutex<AppSettings>,
    pub app_dir: PathBuf,
}

impl AppState {
    pub fn new(db: DatabaseConnection, settings: AppSettings, app_dir: PathBuf) -> Self {
        Self {
            db,
            auth: AuthManager::new(),
            player: Arc::new(Mutex::new(PlayerSlot::new())),
            settings: Mutex::new(settings),
            app_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ScrollSpeed, Song, StartingNote};

    fn song() -> Song {
        Song {
            id: 1,
            user_id: 1,
            title: "Test".to_string(),
            lyrics: "Test".to_string(),
            starting_note: StartingNote::Do,
            scroll_speed: ScrollSpeed::Medium,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_generation_bumps_on_open_and_close() {
        let mut slot = PlayerSlot::new();
        let g0 = slot.generation;

        slot.open(ScrollPlayer::open(song()));
        assert!(slot.generation > g0);
        assert!(slot.player.is_some());

        let g1 = slot.generation;
        slot.close();
        assert!(slot.generation > g1);
        assert!(slot.player.is_none());
    }
}
