use crate::error::{BuildError, Result};

use ilattice3::Point;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct MazeConfig {
    /// Placement attempts per room before the maze stops growing.
    pub max_placement_attempts: usize,
    /// Chance that a freshly placed room tries for one extra connection.
    pub extra_link_chance: f64,
    /// Directions tried for that extra connection.
    pub extra_link_tries: usize,
}

impl Default for MazeConfig {
    fn default() -> Self {
        MazeConfig {
            max_placement_attempts: 10,
            extra_link_chance: 0.3,
            extra_link_tries: 3,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Where `initcoords` puts the first room.
    pub origin: [i32; 3],
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
    pub maze: MazeConfig,
    /// Deleting more rooms than this needs `/force`.
    pub delete_confirm_threshold: usize,
    pub block_tag_category: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            origin: [1000, 1000, 1000],
            seed: None,
            maze: MazeConfig::default(),
            delete_confirm_threshold: 10,
            block_tag_category: "room_block".to_string(),
        }
    }
}

impl BuilderConfig {
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: Self =
            ron::de::from_str(text).map_err(|e| BuildError::Config(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let chance = self.maze.extra_link_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(BuildError::Config(format!(
                "extra_link_chance {} is outside [0, 1]",
                chance
            )));
        }
        if self.block_tag_category.is_empty() {
            return Err(BuildError::Config(
                "block_tag_category must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn origin_point(&self) -> Point {
        self.origin.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults() {
        let config = BuilderConfig::from_ron("(seed: Some(42), maze: (extra_link_tries: 5))").unwrap();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.maze.extra_link_tries, 5);
        assert_eq!(config.maze.max_placement_attempts, 10);
        assert_eq!(config.origin, [1000, 1000, 1000]);
        assert_eq!(config.delete_confirm_threshold, 10);
    }

    #[test]
    fn out_of_range_chance_is_rejected() {
        assert!(matches!(
            BuilderConfig::from_ron("(maze: (extra_link_chance: 1.5))"),
            Err(BuildError::Config(_))
        ));
    }
}
