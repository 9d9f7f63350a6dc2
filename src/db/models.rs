// Data models
use serde::{Deserialize, Serialize};

/// The fixed solfège set a singer can start a song on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartingNote {
    Do,
    #[serde(rename = "Ré")]
    Re,
    Mi,
    Fa,
    Sol,
    La,
    Si,
}

impl StartingNote {
    pub const ALL: [StartingNote; 7] = [
        StartingNote::Do,
        StartingNote::Re,
        StartingNote::Mi,
        StartingNote::Fa,
        StartingNote::Sol,
        StartingNote::La,
        StartingNote::Si,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StartingNote::Do => "Do",
            StartingNote::Re => "Ré",
            StartingNote::Mi => "Mi",
            StartingNote::Fa => "Fa",
            StartingNote::Sol => "Sol",
            StartingNote::La => "La",
            StartingNote::Si => "Si",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|n| n.as_str() == value)
    }
}

/// Coarse scroll speed label persisted with each song. The player maps it
/// to a continuous percent for the speed control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollSpeed {
    Slow,
    Medium,
    Fast,
}

impl ScrollSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollSpeed::Slow => "slow",
            ScrollSpeed::Medium => "medium",
            ScrollSpeed::Fast => "fast",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "slow" => Some(ScrollSpeed::Slow),
            "medium" => Some(ScrollSpeed::Medium),
            "fast" => Some(ScrollSpeed::Fast),
            _ => None,
        }
    }
}

impl Default for ScrollSpeed {
    fn default() -> Self {
        ScrollSpeed::Medium
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub lyrics: String,
    pub starting_note: StartingNote,
    pub scroll_speed: ScrollSpeed,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert/update payload for a song. `user_id` and the timestamps are
/// stamped by the store layer, never by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongForm {
    pub title: String,
    pub lyrics: String,
    pub starting_note: StartingNote,
    pub scroll_speed: ScrollSpeed,
}

impl SongForm {
    pub fn from_song(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            lyrics: song.lyrics.clone(),
            starting_note: song.starting_note,
            scroll_speed: song.scroll_speed,
        }
    }

    pub fn apply_to(&self, song: &mut Song) {
        song.title = self.title.clone();
        song.lyrics = self.lyrics.clone();
        song.starting_note = self.starting_note;
        song.scroll_speed = self.scroll_speed;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub created_at: i64,
}
