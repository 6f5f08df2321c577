//! Game metrics collection for strategy analysis.
//!
//! A [`MetricsCollector`] watches the events of every turn and the board
//! at the end of each round; [`BatchSummary`] aggregates finished games.

use std::collections::HashMap;

use empire_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Random seed used.
    pub seed: u64,
    /// Rounds played.
    pub rounds: u32,
    /// Winning side (None = undecided when the round limit hit).
    pub winner: Option<String>,
    /// How the game ended: `conquest`, `resignation` or `round_limit`.
    pub end_condition: String,
    /// Per-side metrics.
    pub sides: HashMap<String, SideMetrics>,
    /// Final game state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new game metrics instance.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: u64) -> Self {
        Self {
            game_id: game_id.into(),
            seed,
            ..Default::default()
        }
    }

    /// Get or create a side's metrics.
    pub fn side_mut(&mut self, owner: Owner) -> &mut SideMetrics {
        self.sides.entry(owner.to_string()).or_default()
    }

    /// Finalize the game with its outcome.
    pub fn finalize(&mut self, rounds: u32, outcome: Outcome, state_hash: u64) {
        self.rounds = rounds;
        self.final_state_hash = state_hash;
        match outcome {
            Outcome::Won { winner, resigned } => {
                self.winner = Some(winner.to_string());
                self.end_condition = if resigned { "resignation" } else { "conquest" }.to_string();
            }
            Outcome::Ongoing => {
                self.winner = None;
                self.end_condition = "round_limit".to_string();
            }
        }
    }
}

/// Metrics for one side in a game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideMetrics {
    /// Units built by piece type.
    pub units_built: HashMap<String, u32>,
    /// Units lost by piece type.
    pub units_lost: HashMap<String, u32>,
    /// Cities taken from the opponent or from neutral ground.
    pub cities_captured: u32,
    /// Failed city assaults.
    pub assaults_failed: u32,
    /// Fights won as attacker or defender.
    pub battles_won: u32,
    /// Times a finished unit could not be placed.
    pub production_stalls: u32,
    /// Cities held after the last round.
    pub final_cities: u32,
    /// Most cities held at any round end.
    pub peak_cities: u32,
    /// Round the first city was captured.
    pub first_capture_round: Option<u32>,
}

impl SideMetrics {
    /// Total units built.
    #[must_use]
    pub fn total_built(&self) -> u32 {
        self.units_built.values().sum()
    }

    /// Total units lost.
    #[must_use]
    pub fn total_lost(&self) -> u32 {
        self.units_lost.values().sum()
    }
}

/// Summary statistics across multiple games.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Games won by each side.
    pub wins_by_side: HashMap<String, u32>,
    /// Win rates by side.
    pub win_rates: HashMap<String, f64>,
    /// Games that hit the round limit.
    pub undecided: u32,
    /// Games decided by resignation.
    pub resignations: u32,
    /// Average game length in rounds.
    pub avg_rounds: f64,
    /// Shortest game.
    pub min_rounds: u32,
    /// Longest game.
    pub max_rounds: u32,
    /// Average units built per game by side.
    pub avg_units_built: HashMap<String, f64>,
    /// Average final city count by side.
    pub avg_final_cities: HashMap<String, f64>,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: games.len() as u32,
            min_rounds: u32::MAX,
            ..Default::default()
        };

        let mut round_sum = 0u64;
        let mut built: HashMap<String, Vec<u32>> = HashMap::new();
        let mut cities: HashMap<String, Vec<u32>> = HashMap::new();

        for game in games {
            round_sum += u64::from(game.rounds);
            summary.min_rounds = summary.min_rounds.min(game.rounds);
            summary.max_rounds = summary.max_rounds.max(game.rounds);

            match &game.winner {
                Some(winner) => *summary.wins_by_side.entry(winner.clone()).or_default() += 1,
                None => summary.undecided += 1,
            }
            if game.end_condition == "resignation" {
                summary.resignations += 1;
            }

            for (side, metrics) in &game.sides {
                built.entry(side.clone()).or_default().push(metrics.total_built());
                cities
                    .entry(side.clone())
                    .or_default()
                    .push(metrics.final_cities);
            }
        }

        summary.avg_rounds = round_sum as f64 / games.len() as f64;
        for (side, wins) in &summary.wins_by_side {
            summary
                .win_rates
                .insert(side.clone(), f64::from(*wins) / f64::from(summary.total_games));
        }
        summary.avg_units_built = averages(built);
        summary.avg_final_cities = averages(cities);
        summary
    }

    /// Win rate of one side, zero if it never won.
    #[must_use]
    pub fn win_rate(&self, owner: Owner) -> f64 {
        self.win_rates
            .get(&owner.to_string())
            .copied()
            .unwrap_or(0.0)
    }
}

fn averages(samples: HashMap<String, Vec<u32>>) -> HashMap<String, f64> {
    samples
        .into_iter()
        .map(|(side, values)| {
            let avg = values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len().max(1) as f64;
            (side, avg)
        })
        .collect()
}

/// Metrics collector that tracks events during a game.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: GameMetrics,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new(game_id: &str, seed: u64) -> Self {
        let mut metrics = GameMetrics::new(game_id, seed);
        for owner in Owner::BOTH {
            metrics.side_mut(owner);
        }
        Self { metrics }
    }

    /// Record one side's turn events.
    pub fn record_turn(&mut self, events: &TurnEvents) {
        for event in &events.events {
            self.record_event(events.date, event);
        }
    }

    /// Record everything from a round plus end-of-round city counts.
    pub fn record_round(&mut self, summary: &RoundSummary, world: &World) {
        self.record_turn(&summary.player);
        self.record_turn(&summary.computer);
        for owner in Owner::BOTH {
            let held = world.city_count(owner) as u32;
            let side = self.metrics.side_mut(owner);
            side.final_cities = held;
            side.peak_cities = side.peak_cities.max(held);
        }
    }

    fn record_event(&mut self, date: u32, event: &GameEvent) {
        match *event {
            GameEvent::UnitBuilt { owner, kind, .. } => {
                *self
                    .metrics
                    .side_mut(owner)
                    .units_built
                    .entry(kind.to_string())
                    .or_default() += 1;
            }
            GameEvent::UnitLost { owner, kind, .. } => {
                *self
                    .metrics
                    .side_mut(owner)
                    .units_lost
                    .entry(kind.to_string())
                    .or_default() += 1;
            }
            GameEvent::CityCaptured { to, .. } => {
                let side = self.metrics.side_mut(to);
                side.cities_captured += 1;
                side.first_capture_round.get_or_insert(date);
            }
            GameEvent::CityHeld { attacker, .. } => {
                self.metrics.side_mut(attacker).assaults_failed += 1;
            }
            GameEvent::Battle { winner, .. } => {
                self.metrics.side_mut(winner).battles_won += 1;
            }
            GameEvent::ProductionStalled { owner, .. } => {
                self.metrics.side_mut(owner).production_stalls += 1;
            }
            GameEvent::ProductionChanged { .. } => {}
        }
    }

    /// Finish collection.
    #[must_use]
    pub fn finish(mut self, rounds: u32, outcome: Outcome, state_hash: u64) -> GameMetrics {
        self.metrics.finalize(rounds, outcome, state_hash);
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(winner: Option<Owner>, rounds: u32, resigned: bool) -> GameMetrics {
        let mut metrics = GameMetrics::new("g", 0);
        let outcome = winner.map_or(Outcome::Ongoing, |winner| Outcome::Won { winner, resigned });
        metrics.side_mut(Owner::Player).final_cities = 4;
        metrics.finalize(rounds, outcome, 0);
        metrics
    }

    #[test]
    fn test_finalize_end_conditions() {
        assert_eq!(game(Some(Owner::Player), 10, true).end_condition, "resignation");
        assert_eq!(game(Some(Owner::Computer), 10, false).end_condition, "conquest");
        let undecided = game(None, 10, false);
        assert_eq!(undecided.end_condition, "round_limit");
        assert!(undecided.winner.is_none());
    }

    #[test]
    fn test_batch_summary() {
        let games = vec![
            game(Some(Owner::Computer), 50, false),
            game(Some(Owner::Computer), 70, true),
            game(Some(Owner::Player), 30, false),
            game(None, 100, false),
        ];
        let summary = BatchSummary::from_games(&games);
        assert_eq!(summary.total_games, 4);
        assert_eq!(summary.undecided, 1);
        assert_eq!(summary.resignations, 1);
        assert_eq!(summary.min_rounds, 30);
        assert_eq!(summary.max_rounds, 100);
        assert!((summary.avg_rounds - 62.5).abs() < 1e-9);
        assert!((summary.win_rate(Owner::Computer) - 0.5).abs() < 1e-9);
        assert!((summary.avg_final_cities["player"] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_games(&[]);
        assert_eq!(summary.total_games, 0);
        assert_eq!(summary.win_rate(Owner::Player), 0.0);
    }

    #[test]
    fn test_collector_counts_events() {
        let mut collector = MetricsCollector::new("g", 1);
        collector.record_turn(&TurnEvents {
            date: 3,
            events: vec![
                GameEvent::CityCaptured {
                    loc: 5,
                    from: None,
                    to: Owner::Computer,
                },
                GameEvent::CityHeld {
                    loc: 6,
                    attacker: Owner::Player,
                },
            ],
        });
        let metrics = collector.finish(3, Outcome::Ongoing, 9);
        let computer = &metrics.sides["computer"];
        assert_eq!(computer.cities_captured, 1);
        assert_eq!(computer.first_capture_round, Some(3));
        assert_eq!(metrics.sides["player"].assaults_failed, 1);
        assert_eq!(metrics.final_state_hash, 9);
    }
}
