use thiserror::Error;

/// Errors that can occur when decoding or indexing a grid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Cell code outside 0..=6
    #[error("Unknown cell kind code {code}")]
    UnknownCellKind { code: u8 },

    /// Cell and powerup arrays do not match the declared dimensions
    #[error("Grid of {width}x{height} expects {expected} cells, got {cells} cells and {powerups} powerup entries")]
    DimensionMismatch {
        width: u8,
        height: u8,
        expected: usize,
        cells: usize,
        powerups: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    Empty,
    Wall,
    Block,
    Bomb,
    Explosion,
    Loot,
    Powerup,
}

impl CellKind {
    pub fn code(self) -> u8 {
        match self {
            CellKind::Empty => 0,
            CellKind::Wall => 1,
            CellKind::Block => 2,
            CellKind::Bomb => 3,
            CellKind::Explosion => 4,
            CellKind::Loot => 5,
            CellKind::Powerup => 6,
        }
    }

    /// Whether a player may step onto (or place a bomb on) this cell.
    pub fn is_walkable(self) -> bool {
        matches!(self, CellKind::Empty | CellKind::Loot | CellKind::Powerup)
    }
}

impl TryFrom<u8> for CellKind {
    type Error = GridError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(CellKind::Empty),
            1 => Ok(CellKind::Wall),
            2 => Ok(CellKind::Block),
            3 => Ok(CellKind::Bomb),
            4 => Ok(CellKind::Explosion),
            5 => Ok(CellKind::Loot),
            6 => Ok(CellKind::Powerup),
            code => Err(GridError::UnknownCellKind { code }),
        }
    }
}

/// Powerup carried by a powerup cell. Unknown codes are kept as `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerupKind {
    None,
    BombRange,
    ExtraBomb,
    Speed,
}

impl PowerupKind {
    pub fn code(self) -> u8 {
        match self {
            PowerupKind::None => 0,
            PowerupKind::BombRange => 1,
            PowerupKind::ExtraBomb => 2,
            PowerupKind::Speed => 3,
        }
    }
}

impl From<u8> for PowerupKind {
    fn from(code: u8) -> Self {
        match code {
            1 => PowerupKind::BombRange,
            2 => PowerupKind::ExtraBomb,
            3 => PowerupKind::Speed,
            _ => PowerupKind::None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u8,
    height: u8,
    cells: Vec<CellKind>,
    powerups: Vec<PowerupKind>,
}

impl Grid {
    /// A grid with every cell empty.
    pub fn empty(width: u8, height: u8) -> Self {
        let total = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![CellKind::Empty; total],
            powerups: vec![PowerupKind::None; total],
        }
    }

    pub fn from_parts(
        width: u8,
        height: u8,
        cells: Vec<CellKind>,
        powerups: Vec<PowerupKind>,
    ) -> Result<Self, GridError> {
        let expected = (width as usize) * (height as usize);
        if cells.len() != expected || powerups.len() != expected {
            return Err(GridError::DimensionMismatch {
                width,
                height,
                expected,
                cells: cells.len(),
                powerups: powerups.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
            powerups,
        })
    }

    pub fn from_codes(
        width: u8,
        height: u8,
        cell_codes: &[u8],
        powerup_codes: &[u8],
    ) -> Result<Self, GridError> {
        let cells = cell_codes
            .iter()
            .map(|code| CellKind::try_from(*code))
            .collect::<Result<Vec<_>, _>>()?;
        let powerups = powerup_codes.iter().map(|code| PowerupKind::from(*code)).collect();
        Self::from_parts(width, height, cells, powerups)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn index(&self, x: u8, y: u8) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    pub fn cell(&self, x: u8, y: u8) -> Option<CellKind> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    pub fn cell_at(&self, idx: usize) -> Option<CellKind> {
        self.cells.get(idx).copied()
    }

    pub fn powerup_at(&self, idx: usize) -> Option<PowerupKind> {
        self.powerups.get(idx).copied()
    }

    pub fn set_cell_at(&mut self, idx: usize, kind: CellKind) {
        if let Some(cell) = self.cells.get_mut(idx) {
            *cell = kind;
        }
    }

    pub fn clear_powerup_at(&mut self, idx: usize) {
        if let Some(powerup) = self.powerups.get_mut(idx) {
            *powerup = PowerupKind::None;
        }
    }

    pub fn cells(&self) -> &[CellKind] {
        &self.cells
    }

    pub fn powerups(&self) -> &[PowerupKind] {
        &self.powerups
    }

    pub fn cell_codes(&self) -> Vec<u8> {
        self.cells.iter().map(|cell| cell.code()).collect()
    }

    pub fn powerup_codes(&self) -> Vec<u8> {
        self.powerups.iter().map(|powerup| powerup.code()).collect()
    }
}
