//! 2D occupancy grid: spatial index and collision authority.

use crate::animal::{Animal, AnimalKind};
use lv_core::{Cell, Direction, Error, GridConfig, Position, Result, Species, Topology};
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;

new_key_type! {
    /// Stable handle to an animal owned by a [`Grid`].
    ///
    /// Handles go stale once the animal is removed; a reused slot never
    /// resolves an old handle to a newcomer.
    pub struct AnimalId;
}

/// Result of [`Grid::move_animal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Source and target were the same cell, or the source was empty
    Stayed,
    Moved,
    /// A predator ate the prey on the target cell and took its place
    Consumed,
    /// Target was occupied; the incumbent keeps the cell
    Blocked,
}

/// A 2D grid holding at most one animal per cell
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    topology: Topology,
    animals: SlotMap<AnimalId, Animal>,
    occupancy: HashMap<Position, AnimalId>,
    /// Row-major species tags, always derived from `occupancy`
    cells: Vec<Cell>,
    prey_count: usize,
    predator_count: usize,
}

impl Grid {
    pub fn new(width: i32, height: i32, topology: Topology) -> Self {
        let size = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width,
            height,
            topology,
            animals: SlotMap::with_key(),
            occupancy: HashMap::new(),
            cells: vec![Cell::Empty; size],
            prey_count: 0,
            predator_count: 0,
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(config.width, config.height, config.topology)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Fold a position onto the grid using the configured topology
    pub fn resolve(&self, pos: Position) -> Position {
        self.topology.resolve(pos, self.width, self.height)
    }

    /// The four orthogonal neighbors, in `Direction::all()` order.
    ///
    /// Under `Clamp` an edge cell lists itself for the off-grid side.
    pub fn neighbors(&self, pos: Position) -> [Position; 4] {
        Direction::all().map(|dir| {
            let (dx, dy) = dir.to_delta();
            self.resolve(pos.add(dx, dy))
        })
    }

    pub fn empty_neighbors(&self, pos: Position) -> Vec<Position> {
        self.neighbors(pos)
            .into_iter()
            .filter(|&p| self.is_empty(p))
            .collect()
    }

    pub fn occupant_neighbors(&self, pos: Position, species: Species) -> Vec<Position> {
        self.neighbors(pos)
            .into_iter()
            .filter(|&p| self.occupant_kind(p) == Some(species))
            .collect()
    }

    pub fn is_empty(&self, pos: Position) -> bool {
        self.cell(pos) == Cell::Empty
    }

    pub fn occupant_kind(&self, pos: Position) -> Option<Species> {
        self.cell(pos).species()
    }

    /// Species tag at a position (wrapped or clamped into range)
    pub fn cell(&self, pos: Position) -> Cell {
        let pos = self.resolve(pos);
        self.cells
            .get(self.pos_to_index(pos))
            .copied()
            .unwrap_or(Cell::Empty)
    }

    /// Dense row-major tag matrix, `width * height` entries
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), *cell))
    }

    pub fn id_at(&self, pos: Position) -> Option<AnimalId> {
        self.occupancy.get(&pos).copied()
    }

    pub fn animal_at(&self, pos: Position) -> Option<&Animal> {
        self.id_at(pos).and_then(|id| self.get(id))
    }

    pub fn get(&self, id: AnimalId) -> Option<&Animal> {
        self.animals.get(id)
    }

    /// Callers must not change `position`; relocation goes through `move_animal`.
    pub(crate) fn get_mut(&mut self, id: AnimalId) -> Option<&mut Animal> {
        self.animals.get_mut(id)
    }

    /// Handles of every animal on the grid, in slot order
    pub fn animal_ids(&self) -> Vec<AnimalId> {
        self.animals.keys().collect()
    }

    pub fn animals(&self) -> impl Iterator<Item = &Animal> + '_ {
        self.animals.values()
    }

    /// Number of occupied cells
    pub fn len(&self) -> usize {
        self.occupancy.len()
    }

    pub fn is_vacant(&self) -> bool {
        self.occupancy.is_empty()
    }

    /// `(prey, predators)` currently on the grid
    pub fn population_counts(&self) -> (usize, usize) {
        (self.prey_count, self.predator_count)
    }

    /// Insert an animal at its own position.
    pub fn place(&mut self, animal: Animal) -> Result<AnimalId> {
        let pos = animal.position;
        if !self.contains(pos) {
            return Err(Error::Configuration(format!(
                "position {} is outside the {}x{} grid",
                pos, self.width, self.height
            )));
        }
        if self.occupancy.contains_key(&pos) {
            return Err(Error::OccupiedCell { x: pos.x, y: pos.y });
        }

        let species = animal.species();
        let id = self.animals.insert(animal);
        self.occupancy.insert(pos, id);
        self.set_cell(pos, Cell::from(species));
        match species {
            Species::Prey => self.prey_count += 1,
            Species::Predator => self.predator_count += 1,
        }
        Ok(id)
    }

    /// Detach and return the animal at `pos`, if any.
    pub fn remove(&mut self, pos: Position) -> Option<Animal> {
        let id = self.occupancy.remove(&pos)?;
        self.set_cell(pos, Cell::Empty);
        let animal = self.animals.remove(id)?;
        match animal.species() {
            Species::Prey => self.prey_count -= 1,
            Species::Predator => self.predator_count -= 1,
        }
        Some(animal)
    }

    /// Relocate the animal at `from` to `to`, resolving collisions.
    ///
    /// An empty target is simply entered. A predator stepping onto prey eats
    /// it (gaining energy) and takes the cell. Anything else is rejected and
    /// the mover stays put.
    pub fn move_animal(&mut self, from: Position, to: Position) -> MoveOutcome {
        let Some(mover_id) = self.id_at(from) else {
            return MoveOutcome::Stayed;
        };
        if from == to {
            return MoveOutcome::Stayed;
        }
        if !self.contains(to) {
            return MoveOutcome::Blocked;
        }

        let mut outcome = MoveOutcome::Moved;
        if let Some(target) = self.occupant_kind(to) {
            let mover_is_predator = matches!(
                self.get(mover_id).map(|a| a.kind),
                Some(AnimalKind::Predator(_))
            );
            if !(mover_is_predator && target == Species::Prey) {
                return MoveOutcome::Blocked;
            }

            self.remove(to);
            if let Some(predator) = self.get_mut(mover_id) {
                predator.eat();
            }
            outcome = MoveOutcome::Consumed;
        }

        let Some(animal) = self.get_mut(mover_id) else {
            return MoveOutcome::Stayed;
        };
        animal.position = to;
        let species = animal.species();

        self.occupancy.remove(&from);
        self.set_cell(from, Cell::Empty);
        self.occupancy.insert(to, mover_id);
        self.set_cell(to, Cell::from(species));
        outcome
    }

    /// Empty the grid completely
    pub fn clear(&mut self) {
        // Fresh map so slot order after a reset matches a new grid
        self.animals = SlotMap::with_key();
        self.occupancy.clear();
        self.cells.fill(Cell::Empty);
        self.prey_count = 0;
        self.predator_count = 0;
    }

    /// Check that the occupancy map, animal arena, tag matrix and species
    /// counters all describe the same population.
    pub fn verify(&self) -> Result<()> {
        let stored = self.animals.len();
        if stored != self.occupancy.len() || stored != self.prey_count + self.predator_count {
            return Err(Error::InvalidState(format!(
                "{} animals stored, {} cells indexed, {} counted",
                stored,
                self.occupancy.len(),
                self.prey_count + self.predator_count
            )));
        }

        for (&pos, &id) in &self.occupancy {
            let animal = self.get(id).ok_or_else(|| {
                Error::InvalidState(format!("cell {} indexes a removed animal", pos))
            })?;
            if animal.position != pos {
                return Err(Error::InvalidState(format!(
                    "animal indexed at {} believes it is at {}",
                    pos, animal.position
                )));
            }
        }

        for (pos, cell) in self.iter() {
            let expected = self
                .animal_at(pos)
                .map(|a| Cell::from(a.species()))
                .unwrap_or(Cell::Empty);
            if cell != expected {
                return Err(Error::InvalidState(format!(
                    "tag at {} is {:?}, occupant says {:?}",
                    pos, cell, expected
                )));
            }
        }

        Ok(())
    }

    fn set_cell(&mut self, pos: Position, cell: Cell) {
        let index = self.pos_to_index(pos);
        if let Some(slot) = self.cells.get_mut(index) {
            *slot = cell;
        }
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }
}
