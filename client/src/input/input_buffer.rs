use std::collections::{vec_deque, VecDeque};

use deadmint_shared::{Nonce, PlayerAction};

use crate::input::input_frame::InputFrame;

/// Unacknowledged inputs in submission order.
///
/// Frames leave only through [`InputBuffer::acknowledge`] (the authoritative
/// nonce caught up) or [`InputBuffer::remove`] (the submission is known to
/// have failed).
#[derive(Debug, Default)]
pub struct InputBuffer {
    frames: VecDeque<InputFrame>,
    next_seq: u64,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: PlayerAction, expected_nonce: Nonce) -> InputFrame {
        let frame = InputFrame::new(self.next_seq, action, expected_nonce);
        self.next_seq = self.next_seq.wrapping_add(1);
        self.frames.push_back(frame);
        frame
    }

    /// Drops every frame the authoritative `nonce` has reached. Returns how many.
    pub fn acknowledge(&mut self, nonce: Nonce) -> usize {
        let before = self.frames.len();
        self.frames.retain(|frame| !frame.is_acknowledged_by(nonce));
        before - self.frames.len()
    }

    /// Drops the frame with `seq`. A failed input never advances the nonce,
    /// so every later frame now expects one less.
    pub fn remove(&mut self, seq: u64) -> Option<InputFrame> {
        let position = self.frames.iter().position(|frame| frame.seq == seq)?;
        let removed = self.frames.remove(position)?;
        for frame in self.frames.range_mut(position..) {
            frame.expected_nonce = frame.expected_nonce.saturating_sub(1);
        }
        Some(removed)
    }

    /// Most recently pushed frame still waiting.
    pub fn last(&self) -> Option<&InputFrame> {
        self.frames.back()
    }

    pub fn get(&self, seq: u64) -> Option<&InputFrame> {
        self.frames.iter().find(|frame| frame.seq == seq)
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, InputFrame> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
