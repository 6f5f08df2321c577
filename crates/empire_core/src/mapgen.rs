//! Map generation and ASCII map loading.
//!
//! Generated maps come from a smoothed random height field: the lowest
//! `water_ratio` percent of cells become water, the rest land, and cities
//! are scattered over the land at a minimum spacing. The off-board ring is
//! always water. Everything is drawn from the caller's RNG so a game seed
//! fixes the map.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MapConfig;
use crate::error::{GameError, Result};
use crate::geometry::{Location, MapDims};
use crate::pieces::Owner;
use crate::world::{Terrain, World};

const MAX_HEIGHT: u32 = 999;

/// Terrain and city sites of a fresh map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMap {
    /// Grid size.
    pub dims: MapDims,
    /// Terrain per cell.
    pub terrain: Vec<Terrain>,
    /// City sites, in placement order.
    pub cities: Vec<Location>,
}

impl GeneratedMap {
    /// Number of land cells.
    #[must_use]
    pub fn land_cells(&self) -> usize {
        self.terrain.iter().filter(|&&t| t == Terrain::Land).count()
    }

    /// Build an unowned world on this map.
    ///
    /// # Errors
    ///
    /// Propagates [`World::new`] errors.
    pub fn into_world(self, unit_capacity: usize) -> Result<World> {
        World::new(self.dims, self.terrain, &self.cities, unit_capacity)
    }
}

/// Generate a map.
///
/// # Errors
///
/// Returns [`GameError::InvalidState`] if fewer than two cities fit.
pub fn generate_map(config: &MapConfig, rng: &mut ChaCha8Rng) -> Result<GeneratedMap> {
    let dims = MapDims::new(config.width, config.height);
    let heights = smooth_heights(dims, config.smooth, rng);
    let terrain = flood(dims, &heights, config.water_ratio);
    let land: Vec<Location> = (0..dims.size())
        .filter(|&loc| terrain[loc] == Terrain::Land)
        .collect();
    let spacing = config.city_spacing(land.len());
    let cities = place_cities(dims, land, config.city_count, spacing, rng);
    if cities.len() < 2 {
        return Err(GameError::InvalidState(format!(
            "map {}x{} has room for {} cities, need at least 2",
            dims.width,
            dims.height,
            cities.len()
        )));
    }
    debug!(
        width = dims.width,
        height = dims.height,
        cities = cities.len(),
        spacing,
        "map generated"
    );
    Ok(GeneratedMap {
        dims,
        terrain,
        cities,
    })
}

fn smooth_heights(dims: MapDims, passes: u32, rng: &mut ChaCha8Rng) -> Vec<u32> {
    let mut heights: Vec<u32> = (0..dims.size()).map(|_| rng.gen_range(0..=MAX_HEIGHT)).collect();
    for _ in 0..passes {
        let mut next = vec![0; dims.size()];
        for (loc, cell) in next.iter_mut().enumerate() {
            let (row, col) = (dims.row(loc), dims.col(loc));
            let (mut sum, mut count) = (0, 0);
            for r in row.saturating_sub(1)..=(row + 1).min(dims.height - 1) {
                for c in col.saturating_sub(1)..=(col + 1).min(dims.width - 1) {
                    sum += heights[dims.loc(r, c)];
                    count += 1;
                }
            }
            *cell = sum / count;
        }
        heights = next;
    }
    heights
}

/// Water below the level that puts `water_ratio` percent of the board
/// under water; the border is water regardless.
fn flood(dims: MapDims, heights: &[u32], water_ratio: u32) -> Vec<Terrain> {
    let mut board: Vec<u32> = (0..dims.size())
        .filter(|&loc| dims.on_board(loc))
        .map(|loc| heights[loc])
        .collect();
    board.sort_unstable();
    let cut = board.len() * water_ratio as usize / 100;
    let level = board.get(cut).copied().unwrap_or(u32::MAX);
    (0..dims.size())
        .map(|loc| {
            if dims.on_board(loc) && heights[loc] >= level {
                Terrain::Land
            } else {
                Terrain::Water
            }
        })
        .collect()
}

/// Scatter cities over shuffled land, keeping them `spacing` apart and
/// tightening the spacing until enough fit or none is left.
fn place_cities(
    dims: MapDims,
    mut land: Vec<Location>,
    count: usize,
    mut spacing: u32,
    rng: &mut ChaCha8Rng,
) -> Vec<Location> {
    land.shuffle(rng);
    let mut cities: Vec<Location> = Vec::with_capacity(count);
    loop {
        for &loc in &land {
            if cities.len() >= count {
                return cities;
            }
            if !cities.contains(&loc) && cities.iter().all(|&c| dims.dist(c, loc) >= spacing) {
                cities.push(loc);
            }
        }
        if cities.len() >= count || spacing == 0 {
            return cities;
        }
        spacing -= 1;
    }
}

/// Choose starting cities: a random one for the player and the one
/// farthest from it for the computer.
///
/// # Errors
///
/// Returns [`GameError::InvalidState`] if the world has fewer than two
/// cities.
pub fn pick_home_cities(world: &World, rng: &mut ChaCha8Rng) -> Result<(Location, Location)> {
    let sites: Vec<Location> = world.cities().iter().map(|c| c.loc).collect();
    let Some(&player) = sites.choose(rng) else {
        return Err(GameError::InvalidState("world has no cities".to_string()));
    };
    let dims = world.dims();
    let computer = sites
        .iter()
        .copied()
        .filter(|&loc| loc != player)
        .max_by_key(|&loc| (dims.dist(player, loc), std::cmp::Reverse(loc)))
        .ok_or_else(|| GameError::InvalidState("world has only one city".to_string()))?;
    Ok((player, computer))
}

/// Build a world from an ASCII picture.
///
/// One line per row, all the same width. `.` is water, `+` land, `*` an
/// unowned city, `O` a player city and `X` a computer city. Owned cities
/// are assigned, which also scans around them. Cities on the border ring
/// are rejected.
///
/// # Errors
///
/// Returns [`GameError::InvalidState`] for ragged rows or unknown
/// symbols, and [`GameError::InvalidLocation`] for a city on the border.
pub fn parse_ascii(text: &str, unit_capacity: usize) -> Result<World> {
    let rows: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .collect();
    let width = rows.first().map_or(0, |r| r.chars().count());
    if rows.len() < 3 || width < 3 {
        return Err(GameError::InvalidState(
            "map must be at least 3x3".to_string(),
        ));
    }
    let dims = MapDims::new(width, rows.len());
    let mut terrain = Vec::with_capacity(dims.size());
    let mut cities = Vec::new();
    let mut owned = Vec::new();
    for (row, line) in rows.iter().enumerate() {
        if line.chars().count() != width {
            return Err(GameError::InvalidState(format!(
                "row {row} has {} columns, expected {width}",
                line.chars().count()
            )));
        }
        for (col, symbol) in line.chars().enumerate() {
            let loc = dims.loc(row, col);
            let (cell, city) = match symbol {
                '.' => (Terrain::Water, None),
                '+' => (Terrain::Land, None),
                '*' => (Terrain::Land, Some(None)),
                'O' => (Terrain::Land, Some(Some(Owner::Player))),
                'X' => (Terrain::Land, Some(Some(Owner::Computer))),
                other => {
                    return Err(GameError::InvalidState(format!(
                        "unknown map symbol {other:?} at row {row}, column {col}"
                    )))
                }
            };
            terrain.push(cell);
            if let Some(owner) = city {
                cities.push(loc);
                if let Some(owner) = owner {
                    owned.push((loc, owner));
                }
            }
        }
    }
    let mut world = World::new(dims, terrain, &cities, unit_capacity)?;
    for (loc, owner) in owned {
        world.assign_city(loc, Some(owner))?;
    }
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn small() -> MapConfig {
        MapConfig {
            width: 40,
            height: 24,
            city_count: 12,
            ..MapConfig::default()
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        let a = generate_map(&small(), &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        let b = generate_map(&small(), &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        let c = generate_map(&small(), &mut ChaCha8Rng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_border_is_water_and_cities_on_land() {
        let map = generate_map(&small(), &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let dims = map.dims;
        for loc in 0..dims.size() {
            if !dims.on_board(loc) {
                assert_eq!(map.terrain[loc], Terrain::Water);
            }
        }
        assert_eq!(map.cities.len(), 12);
        for &city in &map.cities {
            assert_eq!(map.terrain[city], Terrain::Land);
        }
    }

    #[test]
    fn test_water_ratio_is_respected() {
        let config = small();
        let map = generate_map(&config, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        let on_board = (0..map.dims.size()).filter(|&l| map.dims.on_board(l)).count();
        let water_pct = (on_board - map.land_cells()) * 100 / on_board;
        assert!((60..=75).contains(&water_pct), "water {water_pct}%");
    }

    #[test]
    fn test_all_water_has_no_room() {
        let config = MapConfig {
            water_ratio: 100,
            ..small()
        };
        assert!(generate_map(&config, &mut ChaCha8Rng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn test_home_cities_are_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let world = generate_map(&small(), &mut rng)
            .unwrap()
            .into_world(100)
            .unwrap();
        let (player, computer) = pick_home_cities(&world, &mut rng).unwrap();
        assert_ne!(player, computer);
        assert!(world.city_at(player).is_some());
        assert!(world.city_at(computer).is_some());
    }

    #[test]
    fn test_parse_ascii() {
        let world = parse_ascii(
            "......\n\
             .+O+..\n\
             .+*.X.\n\
             ......\n",
            10,
        );
        let world = world.unwrap();
        let dims = world.dims();
        assert_eq!(dims, MapDims::new(6, 4));
        assert_eq!(world.terrain(dims.loc(1, 1)), Terrain::Land);
        assert_eq!(world.terrain(dims.loc(2, 3)), Terrain::Water);
        assert_eq!(world.city_count(Owner::Player), 1);
        assert_eq!(world.city_count(Owner::Computer), 1);
        assert!(world.city_at(dims.loc(2, 2)).unwrap().owner.is_none());
        assert_eq!(world.view(Owner::Player).contents(dims.loc(1, 2)), 'O');
    }

    #[test]
    fn test_parse_rejects_bad_maps() {
        assert!(parse_ascii("...\n..\n...\n", 4).is_err());
        assert!(parse_ascii("...\n.?.\n...\n", 4).is_err());
        assert!(parse_ascii("*..\n...\n...\n", 4).is_err());
    }
}
