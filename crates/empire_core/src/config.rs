//! Engine configuration.
//!
//! Every tunable of the decision engine lives in one [`EngineConfig`],
//! loadable from RON. Missing fields fall back to the classic values, so a
//! config file only needs to name what it changes:
//!
//! ```ron
//! (
//!     map: (width: 60, height: 40, city_count: 30),
//!     path: (objective_entry_cost: 3),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::function::Function;
use crate::geometry::isqrt;
use crate::pieces::{PieceType, NUM_PIECES};

/// Map generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Columns, including the off-board border.
    pub width: usize,
    /// Rows, including the off-board border.
    pub height: usize,
    /// Percentage of cells that are water.
    pub water_ratio: u32,
    /// Number of height-map smoothing passes.
    pub smooth: u32,
    /// Number of cities to place.
    pub city_count: usize,
    /// Minimum distance between cities; derived from land area when unset.
    pub min_city_dist: Option<u32>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 60,
            water_ratio: 70,
            smooth: 5,
            city_count: 70,
            min_city_dist: None,
        }
    }
}

impl MapConfig {
    /// Minimum city spacing for a map with `land_cells` land cells.
    #[must_use]
    pub fn city_spacing(&self, land_cells: usize) -> u32 {
        self.min_city_dist.unwrap_or_else(|| {
            let per_city = land_cells / self.city_count.max(1);
            isqrt(per_city as u64) as u32
        })
    }
}

/// Cost-field search tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathTuning {
    /// Cost of stepping into an objective that cannot itself be entered,
    /// such as an unexplored cell or an enemy city.
    pub objective_entry_cost: u32,
    /// Cost of leaving land for water in a land-then-water search.
    pub lw_water_cost: u32,
    /// Cost of leaving water for land in a water-then-land search.
    pub wl_land_cost: u32,
    /// Abandon a search once the ring cost exceeds this.
    pub max_path_cost: Option<u32>,
}

impl Default for PathTuning {
    fn default() -> Self {
        Self {
            objective_entry_cost: 2,
            lw_water_cost: 2,
            wl_land_cost: 2,
            max_path_cost: None,
        }
    }
}

/// Movement policy tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTuning {
    /// Crossing allowance for an army whose land objective is an enemy.
    pub cross_cost_enemy: u32,
    /// Crossing allowance when the land objective is an unowned city.
    pub cross_cost_unowned: u32,
    /// Crossing allowance when the land objective is unexplored.
    pub cross_cost_explore: u32,
    /// Extra range a fighter keeps in reserve for the flight home.
    pub fighter_fuel_margin: u32,
    /// Radius in which waiting armies keep a transport city building.
    pub load_radius: u32,
    /// Armies on a continent below which transport cities keep building.
    pub load_army_threshold: u32,
    /// Damaged ships head for port instead of fighting.
    pub ships_seek_repair: bool,
    /// Function changes allowed per unit in one turn before it gives up.
    pub max_transitions: u32,
}

impl Default for PolicyTuning {
    fn default() -> Self {
        Self {
            cross_cost_enemy: 60,
            cross_cost_unowned: 30,
            cross_cost_explore: 14,
            fighter_fuel_margin: 2,
            load_radius: 2,
            load_army_threshold: 6,
            ships_seek_repair: true,
            max_transitions: 4,
        }
    }
}

/// City production tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionTuning {
    /// Switching production forfeits `build_time / divisor` work.
    pub change_penalty_divisor: u32,
    /// Size of the unit pool.
    pub unit_capacity: usize,
    /// Maximum units on one cell, unlimited when unset.
    pub stack_limit: Option<usize>,
    /// What a city captured by the player starts building.
    pub captured_city_production: PieceType,
}

impl Default for ProductionTuning {
    fn default() -> Self {
        Self {
            change_penalty_divisor: 5,
            unit_capacity: 5000,
            stack_limit: None,
            captured_city_production: PieceType::Army,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Map generation.
    pub map: MapConfig,
    /// Pathfinder tuning.
    pub path: PathTuning,
    /// Policy tuning.
    pub policy: PolicyTuning,
    /// Production tuning.
    pub production: ProductionTuning,
    /// Functions new player cities hand to the units they build.
    pub player_city_functions: [Function; NUM_PIECES],
    /// Let the computer strategy also play the player's side.
    pub computer_plays_player: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut player_city_functions = [Function::Idle; NUM_PIECES];
        player_city_functions[PieceType::Army.index()] = Function::Attack;
        player_city_functions[PieceType::Fighter.index()] = Function::Explore;
        player_city_functions[PieceType::Transport.index()] = Function::Fill;
        for kind in [
            PieceType::Patrol,
            PieceType::Destroyer,
            PieceType::Submarine,
            PieceType::Carrier,
            PieceType::Battleship,
        ] {
            player_city_functions[kind.index()] = Function::Explore;
        }
        Self {
            map: MapConfig::default(),
            path: PathTuning::default(),
            policy: PolicyTuning::default(),
            production: ProductionTuning::default(),
            player_city_functions,
            computer_plays_player: false,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a RON string.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigParse`] if the text is not valid RON for
    /// this structure.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Self::parse(ron, "<string>")
    }

    /// Load a configuration from a RON file.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigParse`] if the file cannot be read or
    /// parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| GameError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Render the configuration as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidState(format!("Config serialization failed: {e}")))
    }

    fn parse(contents: &str, path: &str) -> Result<Self> {
        let config: Self = ron::from_str(contents).map_err(|e| GameError::ConfigParse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &str) -> Result<()> {
        let invalid = |message: &str| GameError::ConfigParse {
            path: path.to_string(),
            message: message.to_string(),
        };
        if self.map.width < 3 || self.map.height < 3 {
            return Err(invalid("map must be at least 3x3"));
        }
        if self.map.water_ratio > 100 {
            return Err(invalid("water_ratio is a percentage"));
        }
        if self.production.change_penalty_divisor == 0 {
            return Err(invalid("change_penalty_divisor must be positive"));
        }
        if self.production.unit_capacity == 0 {
            return Err(invalid("unit_capacity must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_game() {
        let config = EngineConfig::default();
        assert_eq!(config.map.width, 100);
        assert_eq!(config.map.height, 60);
        assert_eq!(config.path.objective_entry_cost, 2);
        assert_eq!(config.policy.cross_cost_enemy, 60);
        assert_eq!(config.production.unit_capacity, 5000);
        assert_eq!(
            config.player_city_functions[PieceType::Transport.index()],
            Function::Fill
        );
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config =
            EngineConfig::from_ron_str("(map: (width: 40, height: 30), path: (lw_water_cost: 5))")
                .unwrap();
        assert_eq!(config.map.width, 40);
        assert_eq!(config.map.city_count, 70);
        assert_eq!(config.path.lw_water_cost, 5);
        assert_eq!(config.path.wl_land_cost, 2);
    }

    #[test]
    fn test_ron_roundtrip() {
        let mut config = EngineConfig::default();
        config.production.stack_limit = Some(12);
        config.player_city_functions[0] = Function::MoveTo(250);
        let text = config.to_ron_string().unwrap();
        assert_eq!(EngineConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = EngineConfig::from_ron_str("(map: (width: 2))").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse { .. }));
        let err = EngineConfig::from_ron_str("(map: 12)").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse { .. }));
    }

    #[test]
    fn test_city_spacing() {
        let map = MapConfig::default();
        assert_eq!(map.city_spacing(1800), 5);
        let fixed = MapConfig {
            min_city_dist: Some(3),
            ..MapConfig::default()
        };
        assert_eq!(fixed.city_spacing(1800), 3);
    }
}
