//! Audio feedback cues
//!
//! Short confirmation sounds played at interaction points (button presses,
//! capture completion, errors). Playback goes through the [`CuePlayer`]
//! trait so the embedding front end supplies the actual audio backend;
//! whether anything is played at all is gated by the `play_sounds` config
//! flag.

use crate::config;

/// The distinct feedback cues the application can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// A button was pressed and the command was accepted
    ButtonClick,
    /// A capture or training run finished successfully
    Complete,
    /// A command was rejected or a background task failed
    Error,
}

/// Playback backend supplied by the embedding front end.
///
/// Implementations must be cheap to call from the UI tick; long-running
/// audio work belongs on the implementation's own thread.
pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: Cue);
}

/// A [`CuePlayer`] that discards every cue. Used in headless runs and tests.
#[derive(Debug, Default)]
pub struct NullCuePlayer;

impl CuePlayer for NullCuePlayer {
    fn play(&self, _cue: Cue) {}
}

/// Play a feedback cue if sounds are enabled in the config.
pub fn play_cue(player: &dyn CuePlayer, cue: Cue) {
    let enabled = config::get_config()
        .map(|c| c.capture.play_sounds)
        .unwrap_or(true);

    if !enabled {
        tracing::debug!("Cue {:?} suppressed (sounds disabled)", cue);
        return;
    }

    tracing::debug!("Playing cue: {:?}", cue);
    player.play(cue);
}
