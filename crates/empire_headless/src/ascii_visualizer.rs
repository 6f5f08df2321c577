//! ASCII map renderer for saved games.
//!
//! Draws the real map or one side's view map in the symbols the engine
//! itself uses, optionally colored and with a legend underneath.

use std::path::Path;

use empire_core::prelude::*;
use empire_core::world::UNEXPLORED;

/// Which map to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapLayer {
    /// Ground truth.
    Real,
    /// What one side believes.
    View(Owner),
}

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show the legend with city and unit counts.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
    /// Draw the off-board ring too.
    pub show_border: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            use_color: true,
            show_border: false,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
}

fn symbol_color(symbol: char) -> Option<&'static str> {
    match symbol {
        '.' => Some(colors::CYAN),
        '+' => Some(colors::GREEN),
        '*' => Some(colors::YELLOW),
        'O' => Some(colors::BLUE),
        'X' => Some(colors::RED),
        c if c.is_ascii_uppercase() => Some(colors::BLUE),
        c if c.is_ascii_lowercase() => Some(colors::RED),
        _ => None,
    }
}

/// Symbol drawn at one cell of a layer.
fn symbol_at(world: &World, layer: MapLayer, loc: Location) -> char {
    match layer {
        MapLayer::Real => world.real_symbol(loc),
        MapLayer::View(owner) => world.view(owner).contents(loc),
    }
}

/// Render one layer of a world as ASCII art.
#[must_use]
pub fn render_map(world: &World, layer: MapLayer, config: &AsciiConfig) -> String {
    let dims = world.dims();
    let (rows, cols) = if config.show_border {
        (0..dims.height, 0..dims.width)
    } else {
        (1..dims.height.saturating_sub(1), 1..dims.width.saturating_sub(1))
    };

    let mut output = String::with_capacity(dims.size() * 2);
    let title = match layer {
        MapLayer::Real => "real map".to_string(),
        MapLayer::View(owner) => format!("{owner} view"),
    };
    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };
    output.push_str(&format!("{bold}== {title} | turn {} =={reset}\n", world.date()));

    for row in rows {
        for col in cols.clone() {
            let symbol = symbol_at(world, layer, dims.loc(row, col));
            match symbol_color(symbol).filter(|_| config.use_color) {
                Some(color) => {
                    output.push_str(color);
                    output.push(symbol);
                    output.push_str(colors::RESET);
                }
                None => output.push(symbol),
            }
        }
        output.push('\n');
    }

    if config.show_legend {
        output.push_str(&legend(world, layer));
    }
    output
}

fn legend(world: &World, layer: MapLayer) -> String {
    let mut text = String::from("+ land  . water  * unowned city  O/X player/computer city\n");
    for owner in Owner::BOTH {
        let units: usize = PieceType::ALL
            .iter()
            .map(|&kind| world.unit_count(owner, kind))
            .sum();
        text.push_str(&format!(
            "{owner}: {} cities, {units} units\n",
            world.city_count(owner)
        ));
    }
    if let MapLayer::View(owner) = layer {
        let view = world.view(owner);
        let dims = view.dims();
        let unseen = (0..dims.size())
            .filter(|&loc| dims.on_board(loc) && view.contents(loc) == UNEXPLORED)
            .count();
        text.push_str(&format!("unexplored: {unseen} cells\n"));
    }
    text
}

/// Load a saved game and render one of its maps.
///
/// # Errors
///
/// Returns an error if the save cannot be loaded.
pub fn render_saved_game(path: &Path, layer: MapLayer, config: &AsciiConfig) -> Result<String> {
    let game = Game::load(path)?;
    Ok(render_map(game.world(), layer, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use empire_test_utils::fixtures::{world_from_ascii, COAST};

    fn plain() -> AsciiConfig {
        AsciiConfig {
            show_legend: false,
            use_color: false,
            show_border: true,
        }
    }

    #[test]
    fn test_real_map_matches_source() {
        let world = world_from_ascii(COAST);
        let out = render_map(&world, MapLayer::Real, &plain());
        let body: Vec<&str> = out.lines().skip(1).collect();
        let source: Vec<&str> = COAST.lines().collect();
        assert_eq!(body, source);
    }

    #[test]
    fn test_view_starts_mostly_unexplored() {
        let world = world_from_ascii(COAST);
        let config = AsciiConfig {
            show_legend: true,
            ..plain()
        };
        let out = render_map(&world, MapLayer::View(Owner::Player), &config);
        let map: String = out.lines().skip(1).take(8).collect();
        assert!(out.contains("player view"));
        assert!(map.contains('O'));
        assert!(!map.contains('X'));
        assert!(map.contains(UNEXPLORED));
        assert!(out.contains("unexplored:"));
    }

    #[test]
    fn test_border_hidden_by_default_layout() {
        let world = world_from_ascii(COAST);
        let config = AsciiConfig {
            show_border: false,
            ..plain()
        };
        let out = render_map(&world, MapLayer::Real, &config);
        let first = out.lines().nth(1).unwrap();
        assert_eq!(first, "+++++.....");
    }

    #[test]
    fn test_colors_only_when_enabled() {
        let world = world_from_ascii(COAST);
        assert!(!render_map(&world, MapLayer::Real, &plain()).contains('\x1b'));
        let colored = AsciiConfig {
            use_color: true,
            ..plain()
        };
        assert!(render_map(&world, MapLayer::Real, &colored).contains("\x1b[34mO"));
    }

    #[test]
    fn test_render_saved_game() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.sav");
        let game = Game::from_world(world_from_ascii(COAST), EngineConfig::default(), 1);
        game.save(&path).unwrap();
        let out = render_saved_game(&path, MapLayer::View(Owner::Computer), &plain()).unwrap();
        assert!(out.contains("computer view"));
        assert!(render_saved_game(&dir.path().join("none.sav"), MapLayer::Real, &plain()).is_err());
    }
}
