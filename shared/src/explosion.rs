use std::collections::HashMap;

use crate::{grid::CellKind, grid::Grid, types::Tick};

/// Ages explosion cells out locally.
///
/// The authoritative program only clears an explosion when a later
/// instruction touches the cell, so a cell may stay explosion-tagged long
/// after the blast. The tracker remembers the tick each explosion cell was
/// first observed and reports it as empty once `lifetime` ticks have passed.
#[derive(Clone, Debug)]
pub struct ExplosionTracker {
    lifetime: Tick,
    first_seen: HashMap<usize, Tick>,
}

impl ExplosionTracker {
    pub fn new(lifetime: Tick) -> Self {
        Self {
            lifetime,
            first_seen: HashMap::new(),
        }
    }

    pub fn lifetime(&self) -> Tick {
        self.lifetime
    }

    /// Records the explosion cells of `grid` observed at `tick`, and rewrites
    /// any that have outlived the lifetime to empty.
    ///
    /// Returns the number of cells cleared.
    pub fn age(&mut self, grid: &mut Grid, tick: Tick) -> usize {
        let mut cleared = 0;
        for idx in 0..grid.len() {
            if grid.cell_at(idx) != Some(CellKind::Explosion) {
                self.first_seen.remove(&idx);
                continue;
            }
            let first = *self.first_seen.entry(idx).or_insert(tick);
            if tick.saturating_sub(first) >= self.lifetime {
                grid.set_cell_at(idx, CellKind::Empty);
                cleared += 1;
            }
        }
        if cleared > 0 {
            log::trace!("aged out {} explosion cells at tick {}", cleared, tick);
        }
        cleared
    }

    pub fn first_seen(&self, idx: usize) -> Option<Tick> {
        self.first_seen.get(&idx).copied()
    }

    pub fn clear(&mut self) {
        self.first_seen.clear();
    }
}
