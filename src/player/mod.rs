// Lyric playback module
// Owns the scroll player state machine and the speed mapping

pub mod engine;
pub mod speed;

pub use engine::ScrollPlayer;
