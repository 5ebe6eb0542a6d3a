use deadmint_shared::{apply_action, PlayerIndex, RuleError, Snapshot};

use crate::input::input_frame::InputFrame;

/// Predicted view produced by replaying pending inputs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replay {
    pub view: Snapshot,
    /// Frames that applied cleanly, from the front of the input list
    pub applied: usize,
    /// The first frame that no longer applies, and why. Replay stopped there.
    pub failed: Option<(u64, RuleError)>,
}

/// Replays `frames` in order for `player` on a copy of `base`. Pure: the same
/// base and frames always give the same view.
pub fn replay<'a, I>(base: &Snapshot, player: PlayerIndex, frames: I, fuse_ticks: u8) -> Replay
where
    I: IntoIterator<Item = &'a InputFrame>,
{
    let mut view = base.clone();
    let mut applied = 0;
    for frame in frames {
        if let Err(error) = apply_action(&mut view, player, frame.action, fuse_ticks) {
            return Replay {
                view,
                applied,
                failed: Some((frame.seq, error)),
            };
        }
        applied += 1;
    }
    Replay {
        view,
        applied,
        failed: None,
    }
}
