//! Determinism verification utilities.
//!
//! A seeded game must play out the same way every time: same map, same
//! production, same moves, same dice. These helpers run a simulation
//! several times and compare state hashes round by round.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use empire_core::game::Game;

/// Result of a determinism check.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Number of rounds simulated per run.
    pub rounds: u32,
}

impl DeterminismResult {
    /// Number of distinct final hashes.
    #[must_use]
    pub fn unique_hashes(&self) -> usize {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique.len()
    }

    /// Panic with details unless every run matched.
    ///
    /// # Panics
    ///
    /// Panics if the runs diverged.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Simulation is non-deterministic!\n\
             Runs: {}\n\
             Rounds: {}\n\
             Unique hashes: {}\n\
             Hashes: {:?}",
            self.hashes.len(),
            self.rounds,
            self.unique_hashes(),
            self.hashes
        );
    }
}

/// Run a simulation `runs` times and compare the final hashes.
///
/// # Arguments
///
/// * `runs` - Number of independent runs (at least 2)
/// * `rounds` - Rounds to simulate per run
/// * `setup` - Builds a fresh initial state
/// * `step` - Advances the state by one round
/// * `hash` - Hashes the final state
///
/// # Example
///
/// ```ignore
/// let result = verify_determinism(
///     3,
///     20,
///     || Game::new(small_config(), 7).unwrap(),
///     |game| { game.play_round().unwrap(); },
///     Game::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    rounds: u32,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    assert!(runs >= 2, "Need at least 2 runs to verify determinism");

    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let mut state = setup();
            for _ in 0..rounds {
                step(&mut state);
            }
            hash(&state)
        })
        .collect();

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        rounds,
    }
}

/// Play two copies of a game side by side and report the first round
/// after which their states differ, if any.
///
/// Stops early once either copy has a winner.
///
/// # Panics
///
/// Panics if a round fails.
pub fn find_first_divergence<Setup>(setup: Setup, rounds: u32) -> Option<u32>
where
    Setup: Fn() -> Game,
{
    let mut a = setup();
    let mut b = setup();
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }
    for round in 1..=rounds {
        let outcome_a = play(&mut a);
        let outcome_b = play(&mut b);
        if a.state_hash() != b.state_hash() {
            return Some(round);
        }
        if outcome_a || outcome_b {
            break;
        }
    }
    None
}

/// Check that saving mid-game and restoring continues identically.
///
/// Plays `before` rounds, saves, then plays `after` more rounds on both
/// the original and the restored copy and compares the hashes.
///
/// # Panics
///
/// Panics if a round fails or the save does not load.
pub fn verify_save_determinism(mut game: Game, before: u32, after: u32) -> bool {
    for _ in 0..before {
        if play(&mut game) {
            break;
        }
    }
    let bytes = match game.to_save_bytes() {
        Ok(bytes) => bytes,
        Err(e) => panic!("save failed: {e}"),
    };
    let mut restored = match Game::from_save_bytes(&bytes) {
        Ok(game) => game,
        Err(e) => panic!("load failed: {e}"),
    };
    if restored.state_hash() != game.state_hash() {
        return false;
    }
    for _ in 0..after {
        let over = play(&mut game);
        play(&mut restored);
        if over {
            break;
        }
    }
    game.state_hash() == restored.state_hash()
}

/// Plays a round, returning whether the game is over.
fn play(game: &mut Game) -> bool {
    match game.play_round() {
        Ok(summary) => summary.outcome.is_over(),
        Err(e) => panic!("round {} failed: {e}", game.date()),
    }
}

/// Compute a hash of any hashable value.
#[must_use]
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for engine inputs.
pub mod strategies {
    use empire_core::geometry::{Direction, MapDims};
    use empire_core::pieces::PieceType;
    use proptest::prelude::*;

    /// Any game seed.
    pub fn seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Map dimensions from 8x6 to 40x24.
    pub fn dims() -> impl Strategy<Value = MapDims> {
        (8usize..=40, 6usize..=24).prop_map(|(w, h)| MapDims::new(w, h))
    }

    /// Dimensions together with an on-board location inside them.
    pub fn dims_and_location() -> impl Strategy<Value = (MapDims, usize)> {
        dims().prop_flat_map(|d| {
            (1..d.height - 1, 1..d.width - 1).prop_map(move |(r, c)| (d, d.loc(r, c)))
        })
    }

    /// Any of the eight directions.
    pub fn direction() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    /// Any piece type.
    pub fn piece() -> impl Strategy<Value = PieceType> {
        prop::sample::select(PieceType::ALL.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_counter() {
        let result = verify_determinism(3, 100, || 0u64, |s| *s += 1, |s| *s);
        assert!(result.is_deterministic);
        assert_eq!(result.unique_hashes(), 1);
        result.assert_deterministic();
    }

    #[test]
    fn test_detects_divergence() {
        use std::cell::Cell;
        let run = Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                run.set(run.get() + 1);
                run.get()
            },
            |_| {},
            |s| *s,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes(), 2);
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&(1, "a")), compute_hash(&(1, "a")));
        assert_ne!(compute_hash(&1u32), compute_hash(&2u32));
    }
}
