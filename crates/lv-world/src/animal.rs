//! Animal state and per-species behavior.

use crate::grid::Grid;
use lv_core::{Position, Species};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Predator energy bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metabolism {
    pub energy: i32,
    pub energy_gain: i32,
    pub energy_loss: i32,
}

/// Species variant with its variant-only state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalKind {
    Prey,
    Predator(Metabolism),
}

/// An animal on the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    pub position: Position,
    /// Ticks since the last reproduction
    pub age_counter: u32,
    pub reproduction_threshold: u32,
    pub alive: bool,
    pub kind: AnimalKind,
}

impl Animal {
    pub fn prey(position: Position, reproduction_threshold: u32) -> Self {
        Self {
            position,
            age_counter: 0,
            reproduction_threshold,
            alive: true,
            kind: AnimalKind::Prey,
        }
    }

    pub fn predator(
        position: Position,
        reproduction_threshold: u32,
        energy: i32,
        energy_gain: i32,
        energy_loss: i32,
    ) -> Self {
        Self {
            position,
            age_counter: 0,
            reproduction_threshold,
            alive: true,
            kind: AnimalKind::Predator(Metabolism {
                energy,
                energy_gain,
                energy_loss,
            }),
        }
    }

    pub fn species(&self) -> Species {
        match self.kind {
            AnimalKind::Prey => Species::Prey,
            AnimalKind::Predator(_) => Species::Predator,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn energy(&self) -> Option<i32> {
        match self.kind {
            AnimalKind::Prey => None,
            AnimalKind::Predator(m) => Some(m.energy),
        }
    }

    pub fn age(&mut self) {
        self.age_counter += 1;
    }

    /// Pick the cell this animal wants to step into.
    ///
    /// Prey wander to a random empty neighbor. Predators prefer a random
    /// neighboring prey and otherwise wander like prey. Returns the current
    /// position when nothing is available.
    pub fn choose_move<R: Rng + ?Sized>(&self, grid: &Grid, rng: &mut R) -> Position {
        if let AnimalKind::Predator(_) = self.kind {
            let prey = grid.occupant_neighbors(self.position, Species::Prey);
            if let Some(&target) = prey.choose(rng) {
                return target;
            }
        }

        grid.empty_neighbors(self.position)
            .choose(rng)
            .copied()
            .unwrap_or(self.position)
    }

    /// Apply the gain from a meal. No effect on prey.
    pub fn eat(&mut self) {
        if let AnimalKind::Predator(m) = &mut self.kind {
            m.energy = m.energy.saturating_add(m.energy_gain);
        }
    }

    /// Deduct the per-tick energy cost. Returns true if this starved the animal.
    pub fn metabolize(&mut self) -> bool {
        let AnimalKind::Predator(m) = &mut self.kind else {
            return false;
        };

        m.energy = m.energy.saturating_sub(m.energy_loss);
        if m.energy <= 0 && self.alive {
            self.alive = false;
            return true;
        }
        false
    }

    pub fn can_reproduce(&self) -> bool {
        if self.age_counter < self.reproduction_threshold {
            return false;
        }
        match self.kind {
            AnimalKind::Prey => true,
            AnimalKind::Predator(m) => m.energy > m.energy_gain.saturating_mul(2),
        }
    }

    /// Produce an offspring at this animal's cell if eligible.
    ///
    /// Predators split their energy with the child (floor division).
    pub fn reproduce(&mut self) -> Option<Animal> {
        if !self.can_reproduce() {
            return None;
        }

        self.age_counter = 0;
        match &mut self.kind {
            AnimalKind::Prey => Some(Animal::prey(self.position, self.reproduction_threshold)),
            AnimalKind::Predator(m) => {
                m.energy /= 2;
                Some(Animal::predator(
                    self.position,
                    self.reproduction_threshold,
                    m.energy,
                    m.energy_gain,
                    m.energy_loss,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lv_core::Topology;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_animal_creation() {
        let prey = Animal::prey(Position::new(1, 2), 3);
        assert_eq!(prey.species(), Species::Prey);
        assert_eq!(prey.age_counter, 0);
        assert!(prey.is_alive());
        assert_eq!(prey.energy(), None);

        let predator = Animal::predator(Position::new(0, 0), 8, 10, 4, 1);
        assert_eq!(predator.species(), Species::Predator);
        assert_eq!(predator.energy(), Some(10));
    }

    #[test]
    fn test_metabolism() {
        let mut predator = Animal::predator(Position::new(0, 0), 8, 2, 4, 1);

        assert!(!predator.metabolize());
        assert_eq!(predator.energy(), Some(1));
        assert!(predator.is_alive());

        assert!(predator.metabolize());
        assert_eq!(predator.energy(), Some(0));
        assert!(!predator.is_alive());

        let mut prey = Animal::prey(Position::new(0, 0), 3);
        assert!(!prey.metabolize());
        assert!(prey.is_alive());
    }

    #[test]
    fn test_eat_adds_gain() {
        let mut predator = Animal::predator(Position::new(0, 0), 8, 5, 4, 1);
        predator.eat();
        assert_eq!(predator.energy(), Some(9));
    }

    #[test]
    fn test_extreme_energy_saturates() {
        let mut predator = Animal::predator(Position::new(0, 0), 1, i32::MAX - 1, i32::MAX, 0);
        predator.eat();
        assert_eq!(predator.energy(), Some(i32::MAX));

        predator.age();
        assert!(!predator.can_reproduce());
        assert!(!predator.metabolize());
        assert_eq!(predator.energy(), Some(i32::MAX));
    }

    #[test]
    fn test_prey_reproduction() {
        let mut prey = Animal::prey(Position::new(2, 2), 2);
        prey.age();
        assert!(prey.reproduce().is_none());

        prey.age();
        let child = prey.reproduce().unwrap();
        assert_eq!(prey.age_counter, 0);
        assert_eq!(child.position, Position::new(2, 2));
        assert_eq!(child.reproduction_threshold, 2);
        assert_eq!(child.age_counter, 0);
    }

    #[test]
    fn test_predator_needs_energy_to_reproduce() {
        // energy must exceed 2 * gain
        let mut predator = Animal::predator(Position::new(0, 0), 1, 8, 4, 1);
        predator.age();
        assert!(!predator.can_reproduce());

        let mut predator = Animal::predator(Position::new(0, 0), 1, 9, 4, 1);
        predator.age();
        assert!(predator.can_reproduce());
    }

    #[test]
    fn test_predator_energy_split() {
        let mut predator = Animal::predator(Position::new(3, 3), 1, 11, 4, 2);
        predator.age();

        let child = predator.reproduce().unwrap();
        assert_eq!(predator.energy(), Some(5));
        assert_eq!(child.energy(), Some(5));
        assert_eq!(
            child.kind,
            AnimalKind::Predator(Metabolism {
                energy: 5,
                energy_gain: 4,
                energy_loss: 2,
            })
        );
        assert_eq!(predator.age_counter, 0);
    }

    #[test]
    fn test_predator_prefers_prey() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut grid = Grid::new(5, 5, Topology::Wrap);
        grid.place(Animal::prey(Position::new(2, 1), 3)).unwrap();
        let predator = Animal::predator(Position::new(2, 2), 8, 10, 4, 1);
        grid.place(predator.clone()).unwrap();

        for _ in 0..20 {
            assert_eq!(predator.choose_move(&grid, &mut rng), Position::new(2, 1));
        }
    }

    #[test]
    fn test_boxed_in_animal_stays() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut grid = Grid::new(3, 3, Topology::Wrap);
        let center = Position::new(1, 1);
        grid.place(Animal::prey(center, 3)).unwrap();
        for pos in grid.neighbors(center) {
            grid.place(Animal::predator(pos, 8, 10, 4, 1)).unwrap();
        }

        let prey = grid.animal_at(center).unwrap();
        assert_eq!(prey.choose_move(&grid, &mut rng), center);
    }
}
