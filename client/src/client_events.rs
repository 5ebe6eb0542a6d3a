use std::vec::IntoIter;

use deadmint_shared::{CrankAction, LedgerError};

use crate::{input::input_frame::InputFrame, reconciliation::engine::ReconcileOutcome};

/// A buffered input whose submission failed outright. Best-effort notice;
/// the next snapshot is the truth about what happened.
#[derive(Clone, Debug, PartialEq)]
pub struct InputRejection {
    pub frame: InputFrame,
    pub error: LedgerError,
}

pub struct ClientEvents {
    states: Vec<ReconcileOutcome>,
    rejections: Vec<InputRejection>,
    cranks: Vec<(CrankAction, Option<String>)>,
    errors: Vec<String>,
    empty: bool,
}

impl Default for ClientEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientEvents {
    pub(crate) fn new() -> Self {
        Self {
            states: Vec::new(),
            rejections: Vec::new(),
            cranks: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: ClientEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: ClientEvent>(&self) -> bool {
        V::has(self)
    }

    pub(crate) fn push_state(&mut self, outcome: ReconcileOutcome) {
        self.states.push(outcome);
        self.empty = false;
    }

    pub(crate) fn push_rejection(&mut self, rejection: InputRejection) {
        self.rejections.push(rejection);
        self.empty = false;
    }

    pub(crate) fn push_crank(&mut self, action: CrankAction, tx: Option<String>) {
        self.cranks.push((action, tx));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, message: String) {
        self.errors.push(message);
        self.empty = false;
    }
}

// Event Trait
pub trait ClientEvent {
    type Iter;

    fn iter(events: &mut ClientEvents) -> Self::Iter;

    fn has(events: &ClientEvents) -> bool;
}

// State Event
pub struct StateEvent;
impl ClientEvent for StateEvent {
    type Iter = IntoIter<ReconcileOutcome>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.states);
        IntoIterator::into_iter(list)
    }

    fn has(events: &ClientEvents) -> bool {
        !events.states.is_empty()
    }
}

// Input Rejected Event
pub struct InputRejectedEvent;
impl ClientEvent for InputRejectedEvent {
    type Iter = IntoIter<InputRejection>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.rejections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &ClientEvents) -> bool {
        !events.rejections.is_empty()
    }
}

// Crank Event
pub struct CrankEvent;
impl ClientEvent for CrankEvent {
    type Iter = IntoIter<(CrankAction, Option<String>)>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.cranks);
        IntoIterator::into_iter(list)
    }

    fn has(events: &ClientEvents) -> bool {
        !events.cranks.is_empty()
    }
}

// Error Event
pub struct ErrorEvent;
impl ClientEvent for ErrorEvent {
    type Iter = IntoIter<String>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        let list = std::mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &ClientEvents) -> bool {
        !events.errors.is_empty()
    }
}
