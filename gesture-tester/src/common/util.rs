use anyhow::{Context, Result};
use gesture_game::GameConfig;
use std::{fs, path::Path};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Load and validate a JSON tuning override, or fall back to defaults.
pub fn read_game_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    GameConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}
