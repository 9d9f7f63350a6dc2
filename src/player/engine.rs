// Scroll player state machine
//
// Drives the auto-scrolling lyrics view for one open song. The engine is
// pure state + clock arithmetic: the command layer owns scheduling and
// passes `Instant`s in, which keeps every transition testable without a
// frame loop.

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::db::models::{Song, SongForm};
use crate::player::speed;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("{0} is required")]
    Validation(&'static str),
    #[error("not editing")]
    NotEditing,
    #[error("finish editing first")]
    EditingInProgress,
}

/// One tagged record per mode; `Editing` carries the snapshot taken when
/// the edit started so cancel can restore it exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerMode {
    Viewing,
    Editing { snapshot: SongForm },
}

/// A running scroll pass. Captured once when scrolling starts; a speed
/// change while running does not retime it, only the next start does.
#[derive(Debug, Clone)]
struct ScrollAnimation {
    scroll_range: f64,
    duration_ms: f64,
    started_at: Instant,
}

/// One animation step: the scroll offset to apply and whether the pass
/// has reached the end.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Frame {
    pub offset: f64,
    pub done: bool,
}

pub struct ScrollPlayer {
    working_copy: Song,
    mode: PlayerMode,
    is_scrolling: bool,
    speed_percent: u8,
    animation: Option<ScrollAnimation>,
}

impl ScrollPlayer {
    pub fn open(song: Song) -> Self {
        let speed_percent = speed::percent_for_class(song.scroll_speed);
        Self {
            working_copy: song,
            mode: PlayerMode::Viewing,
            is_scrolling: false,
            speed_percent,
            animation: None,
        }
    }

    pub fn song(&self) -> &Song {
        &self.working_copy
    }

    pub fn song_id(&self) -> i64 {
        self.working_copy.id
    }

    pub fn speed_percent(&self) -> u8 {
        self.speed_percent
    }

    pub fn is_scrolling(&self) -> bool {
        self.is_scrolling
    }

    /// True while a pass has frames left to produce. False covers both
    /// the stopped state and the inert "nothing to scroll" state.
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, PlayerMode::Editing { .. })
    }

    pub fn mode_label(&self) -> &'static str {
        match self.mode {
            PlayerMode::Viewing => "viewing",
            PlayerMode::Editing { .. } => "editing",
        }
    }

    /// Start or stop the scroll pass. No-op while editing (the text view
    /// is replaced by the edit form). Returns the resulting scroll flag.
    ///
    /// On start, the caller supplies the measured content and viewport
    /// heights; a non-positive scroll range means there is nothing to
    /// scroll, so no animation is created and no frames will follow.
    pub fn toggle_scroll(&mut self, content_height: f64, viewport_height: f64, now: Instant) -> bool {
        if self.is_editing() {
            return self.is_scrolling;
        }

        if self.is_scrolling {
            self.is_scrolling = false;
            self.animation = None;
            return false;
        }

        self.is_scrolling = true;
        let scroll_range = content_height - viewport_height;
        if scroll_range > 0.0 {
            let ticks = speed::ticks_for_percent(self.speed_percent);
            self.animation = Some(ScrollAnimation {
                scroll_range,
                duration_ms: scroll_range * ticks as f64,
                started_at: now,
            });
        }
        true
    }

    /// Advance the animation to `now`. Returns `None` once no further
    /// frames should be scheduled. Reaching the end drops the animation
    /// but leaves `is_scrolling` set; the pass completes passively and
    /// the user stops or restarts it explicitly.
    pub fn frame(&mut self, now: Instant) -> Option<Frame> {
        if !self.is_scrolling {
            return None;
        }
        let animation = self.animation.as_ref()?;

        let elapsed_ms = now.duration_since(animation.started_at).as_secs_f64() * 1000.0;
        let progress = (elapsed_ms / animation.duration_ms).min(1.0);
        let frame = Frame {
            offset: animation.scroll_range * progress,
            done: progress >= 1.0,
        };
        if frame.done {
            self.animation = None;
        }
        Some(frame)
    }

    /// Clamp-adjust the speed percent. Does not retime a running
    /// animation; the new rate applies on the next scroll start.
    pub fn adjust_speed(&mut self, delta_percent: i32) -> u8 {
        self.speed_percent =
            speed::clamp_percent(i32::from(self.speed_percent).saturating_add(delta_percent));
        self.speed_percent
    }

    /// Switch to edit mode, stopping any scroll in progress. Idempotent
    /// when already editing.
    pub fn enter_edit(&mut self) {
        if self.is_editing() {
            return;
        }
        self.is_scrolling = false;
        self.animation = None;
        self.mode = PlayerMode::Editing {
            snapshot: SongForm::from_song(&self.working_copy),
        };
    }

    /// Apply in-progress edits to the working copy.
    pub fn update_draft(&mut self, draft: &SongForm) -> Result<(), PlayerError> {
        if !self.is_editing() {
            return Err(PlayerError::NotEditing);
        }
        draft.apply_to(&mut self.working_copy);
        Ok(())
    }

    /// Discard edits, restoring the snapshot taken at `enter_edit`.
    pub fn cancel_edit(&mut self) {
        if let PlayerMode::Editing { snapshot } = std::mem::replace(&mut self.mode, PlayerMode::Viewing) {
            snapshot.apply_to(&mut self.working_copy);
        }
    }

    /// Validate the draft and produce the form to persist. The current
    /// speed percent is quantized back to a class (thresholds on the
    /// tick value) and folded into the working copy. The player stays
    /// in edit mode until the store write succeeds and the caller calls
    /// `mark_saved`.
    pub fn begin_save(&mut self) -> Result<SongForm, PlayerError> {
        if !self.is_editing() {
            return Err(PlayerError::NotEditing);
        }
        if self.working_copy.title.trim().is_empty() {
            return Err(PlayerError::Validation("title"));
        }
        if self.working_copy.lyrics.trim().is_empty() {
            return Err(PlayerError::Validation("lyrics"));
        }

        let ticks = speed::ticks_for_percent(self.speed_percent);
        self.working_copy.scroll_speed = speed::class_for_ticks(ticks);
        Ok(SongForm::from_song(&self.working_copy))
    }

    pub fn mark_saved(&mut self) {
        self.mode = PlayerMode::Viewing;
    }

    /// Deletion is only offered from the viewing mode.
    pub fn ensure_can_delete(&self) -> Result<(), PlayerError> {
        if self.is_editing() {
            return Err(PlayerError::EditingInProgress);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ScrollSpeed, StartingNote};
    use std::time::Duration;

    fn song(speed: ScrollSpeed) -> Song {
        Song {
            id: 7,
            user_id: 1,
            title: "À la claire fontaine".to_string(),
            lyrics: "À la claire fontaine\nM'en allant promener".to_string(),
            starting_note: StartingNote::Do,
            scroll_speed: speed,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_open_derives_percent_from_class() {
        assert_eq!(ScrollPlayer::open(song(ScrollSpeed::Medium)).speed_percent(), 14);
        assert_eq!(ScrollPlayer::open(song(ScrollSpeed::Slow)).speed_percent(), 10);
        assert_eq!(ScrollPlayer::open(song(ScrollSpeed::Fast)).speed_percent(), 17);
    }

    #[test]
    fn test_adjust_speed_clamps() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Medium));
        assert_eq!(player.adjust_speed(1_000), 100);
        assert_eq!(player.adjust_speed(5), 100);
        assert_eq!(player.adjust_speed(i32::MAX), 100);
        assert_eq!(player.adjust_speed(-1_000), 0);
        assert_eq!(player.adjust_speed(-5), 0);
        assert_eq!(player.adjust_speed(i32::MIN), 0);
        assert_eq!(player.adjust_speed(5), 5);
    }

    #[test]
    fn test_toggle_scroll_flips_once_per_call() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Medium));
        let now = Instant::now();

        assert!(player.toggle_scroll(600.0, 100.0, now));
        assert!(player.is_scrolling());
        assert!(!player.toggle_scroll(600.0, 100.0, now));
        assert!(!player.is_scrolling());
        // A stopped pass schedules nothing
        assert!(player.frame(now).is_none());
    }

    #[test]
    fn test_short_lyrics_scroll_is_a_no_op() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Medium));
        let now = Instant::now();

        // Content fits in the viewport: scrolling is "on" but inert
        assert!(player.toggle_scroll(80.0, 100.0, now));
        assert!(player.is_scrolling());
        assert!(player.frame(now + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_frame_progression_and_passive_completion() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Medium));
        let start = Instant::now();

        // range 500px at 30 ticks (medium, 14%) -> 15 000 ms
        player.toggle_scroll(600.0, 100.0, start);

        let mid = player.frame(start + Duration::from_millis(7_500)).unwrap();
        assert!((mid.offset - 250.0).abs() < 1e-6);
        assert!(!mid.done);

        let end = player.frame(start + Duration::from_millis(15_000)).unwrap();
        assert!((end.offset - 500.0).abs() < 1e-6);
        assert!(end.done);

        // Passive completion: no more frames, but still "scrolling"
        assert!(player.frame(start + Duration::from_millis(16_000)).is_none());
        assert!(player.is_scrolling());
    }

    #[test]
    fn test_overshoot_is_clamped_to_the_end() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Fast));
        let start = Instant::now();
        player.toggle_scroll(300.0, 100.0, start);

        let frame = player.frame(start + Duration::from_secs(3_600)).unwrap();
        assert!((frame.offset - 200.0).abs() < 1e-6);
        assert!(frame.done);
    }

    #[test]
    fn test_speed_change_does_not_retime_running_pass() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Medium));
        let start = Instant::now();
        player.toggle_scroll(600.0, 100.0, start);

        player.adjust_speed(50);

        // Same timeline as before the adjustment
        let mid = player.frame(start + Duration::from_millis(7_500)).unwrap();
        assert!((mid.offset - 250.0).abs() < 1e-6);

        // The new rate kicks in after a stop/start cycle
        player.toggle_scroll(600.0, 100.0, start);
        player.toggle_scroll(600.0, 100.0, start);
        let ticks = speed::ticks_for_percent(player.speed_percent());
        let frame = player
            .frame(start + Duration::from_millis((500.0 * ticks as f64) as u64))
            .unwrap();
        assert!(frame.done);
    }

    #[test]
    fn test_enter_edit_stops_scrolling_and_toggle_is_inert() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Medium));
        let now = Instant::now();
        player.toggle_scroll(600.0, 100.0, now);

        player.enter_edit();
        assert!(!player.is_scrolling());
        assert!(player.is_editing());

        // Toggling while editing changes nothing
        assert!(!player.toggle_scroll(600.0, 100.0, now));
        assert!(!player.is_scrolling());
    }

    #[test]
    fn test_cancel_edit_restores_snapshot() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Medium));
        let original = player.song().clone();

        player.enter_edit();
        let draft = SongForm {
            title: "Autre titre".to_string(),
            lyrics: "Autres paroles".to_string(),
            starting_note: StartingNote::Si,
            scroll_speed: ScrollSpeed::Fast,
        };
        player.update_draft(&draft).unwrap();
        assert_eq!(player.song().title, "Autre titre");

        player.cancel_edit();
        assert!(!player.is_editing());
        assert_eq!(*player.song(), original);
    }

    #[test]
    fn test_save_requires_title_and_lyrics() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Medium));
        player.enter_edit();

        let mut draft = SongForm::from_song(player.song());
        draft.title = "   ".to_string();
        player.update_draft(&draft).unwrap();

        assert!(matches!(player.begin_save(), Err(PlayerError::Validation("title"))));
        // A failed save leaves the edit session open
        assert!(player.is_editing());
    }

    #[test]
    fn test_save_quantizes_percent_to_class() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Slow));
        player.enter_edit();

        // 16% -> 20 ticks -> fast (the <= 20 rule)
        player.adjust_speed(6);
        assert_eq!(player.speed_percent(), 16);
        let form = player.begin_save().unwrap();
        assert_eq!(form.scroll_speed, ScrollSpeed::Fast);

        player.mark_saved();
        assert!(!player.is_editing());
        assert_eq!(player.song().scroll_speed, ScrollSpeed::Fast);
    }

    #[test]
    fn test_save_outside_edit_mode_is_rejected() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Medium));
        assert!(matches!(player.begin_save(), Err(PlayerError::NotEditing)));
    }

    #[test]
    fn test_delete_guard() {
        let mut player = ScrollPlayer::open(song(ScrollSpeed::Medium));
        assert!(player.ensure_can_delete().is_ok());
        player.enter_edit();
        assert!(player.ensure_can_delete().is_err());
    }
}
