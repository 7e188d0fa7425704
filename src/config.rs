use crate::engine::{Color, Rect};
use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// TABLE
/// ┌──────────────────── GameConfig Layout ─────────────────────┐
/// │ canvas    │ drawing surface size                           │
/// │ player    │ body size, jump impulse, gravity, hitbox       │
/// │ rope      │ sinusoid the player balances on                │
/// │ timing    │ obstacle speed, spawn + era clocks             │
/// │ scoring   │ points per obstacle avoided / era survived     │
/// │ controls  │ KeyboardEvent.code bindings                    │
/// │ eras      │ palette, scenery and obstacle pool per era     │
/// └────────────────────────────────────────────────────────────┘
/// Built once at startup and shared read-only (`Rc<GameConfig>`).
/// Any JSON subset deserializes, missing fields fall back to `Default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub canvas: CanvasConfig,
    pub player: PlayerConfig,
    pub rope: RopeConfig,
    pub timing: TimingConfig,
    pub scoring: ScoringConfig,
    pub controls: Controls,
    pub eras: Vec<EraDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    pub width: f64,
    pub height: f64,
    /// fixed horizontal position, also the "passed" line for obstacles
    pub start_x: f64,
    pub jump_force: f64,
    pub gravity: f64,
    /// hitbox inset on every side of the visual body
    pub collision_margin: f64,
    /// |y - rope| under which a falling jump lands
    pub landing_tolerance: f64,
    /// how far from the rope baseline the player may stray before dying
    pub fall_limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RopeConfig {
    pub amplitude: f64,
    pub frequency: f64,
    /// horizontal spacing of rope samples when drawn
    pub sample_step: f64,
    pub line_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingConfig {
    /// obstacle travel per update call (px)
    pub obstacle_speed: f64,
    pub spawn_interval_ms: f64,
    pub era_min_ms: f64,
    pub era_max_ms: f64,
    /// transition progress added per update call
    pub transition_step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    pub obstacle_avoided: u32,
    pub era_survived: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Controls {
    pub jump: Vec<String>,
    pub duck: Vec<String>,
    pub restart: Vec<String>,
}

impl Controls {
    pub fn is_jump(&self, code: &str) -> bool {
        self.jump.iter().any(|key| key == code)
    }

    pub fn is_duck(&self, code: &str) -> bool {
        self.duck.iter().any(|key| key == code)
    }

    pub fn is_restart(&self, code: &str) -> bool {
        self.restart.iter().any(|key| key == code)
    }
}

// ==================== Era Data ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EraDefinition {
    pub name: String,
    pub background_color: Color,
    pub rope_color: Color,
    #[serde(default)]
    pub scenery: Scenery,
    pub obstacles: Vec<ObstacleTemplate>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleTemplate {
    #[serde(rename = "type")]
    pub kind: ObstacleKind,
    #[serde(rename = "position")]
    pub band: Band,
    pub width: f64,
    pub height: f64,
    pub color: Color,
}

/// Silhouette drawn for an obstacle, collision always uses the plain box
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    Pterodactyl,
    Vine,
    Arrow,
    Turret,
    Drone,
    Barrier,
    /// any tag we have no artwork for, drawn as a filled box
    #[serde(other)]
    Block,
}

/// Vertical placement relative to the rope baseline
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    High,
    Middle,
    Low,
}

/// Decorative backdrop shape repeated by the parallax layer
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenery {
    Trees,
    Castles,
    Skyline,
    #[default]
    None,
}

// ==================== Defaults ====================
impl Default for CanvasConfig {
    fn default() -> Self {
        CanvasConfig {
            width: 800.0,
            height: 400.0,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            width: 30.0,
            height: 50.0,
            start_x: 100.0,
            jump_force: 12.0,
            gravity: 0.6,
            collision_margin: 5.0,
            landing_tolerance: 5.0,
            fall_limit: 150.0,
        }
    }
}

impl Default for RopeConfig {
    fn default() -> Self {
        RopeConfig {
            amplitude: 15.0,
            frequency: 0.005,
            sample_step: 10.0,
            line_width: 3.0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            obstacle_speed: 5.0,
            spawn_interval_ms: 1500.0,
            era_min_ms: 5000.0,
            era_max_ms: 10000.0,
            transition_step: 0.02,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            obstacle_avoided: 1,
            era_survived: 5,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        fn keys(codes: &[&str]) -> Vec<String> {
            codes.iter().map(|code| code.to_string()).collect()
        }
        Controls {
            jump: keys(&["ArrowUp", "Space"]),
            duck: keys(&["ArrowDown"]),
            restart: keys(&["Enter", "NumpadEnter", "Space"]),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            canvas: CanvasConfig::default(),
            player: PlayerConfig::default(),
            rope: RopeConfig::default(),
            timing: TimingConfig::default(),
            scoring: ScoringConfig::default(),
            controls: Controls::default(),
            eras: default_eras(),
        }
    }
}

fn template(kind: ObstacleKind, band: Band, width: f64, height: f64, color: Color) -> ObstacleTemplate {
    ObstacleTemplate {
        kind,
        band,
        width,
        height,
        color,
    }
}

fn default_eras() -> Vec<EraDefinition> {
    use Band::*;
    use ObstacleKind::*;
    vec![
        EraDefinition {
            name: "Jurassic".to_string(),
            background_color: Color::rgb(0x1a, 0x47, 0x2a),
            rope_color: Color::rgb(0x8b, 0x45, 0x13),
            scenery: Scenery::Trees,
            obstacles: vec![
                template(Pterodactyl, High, 60.0, 40.0, Color::rgb(0x5d, 0x8a, 0xa8)),
                template(Vine, Low, 40.0, 60.0, Color::rgb(0x22, 0x8b, 0x22)),
            ],
        },
        EraDefinition {
            name: "Medieval".to_string(),
            background_color: Color::rgb(0x4a, 0x4a, 0x4a),
            rope_color: Color::rgb(0x8b, 0x45, 0x13),
            scenery: Scenery::Castles,
            obstacles: vec![
                template(Arrow, Middle, 70.0, 10.0, Color::rgb(0xcd, 0x7f, 0x32)),
                template(Turret, High, 50.0, 70.0, Color::rgb(0x80, 0x80, 0x80)),
            ],
        },
        EraDefinition {
            name: "Cyberpunk".to_string(),
            background_color: Color::rgb(0x1a, 0x1a, 0x2e),
            rope_color: Color::rgb(0x00, 0xff, 0xaa),
            scenery: Scenery::Skyline,
            obstacles: vec![
                template(Drone, High, 50.0, 30.0, Color::rgb(0xff, 0x33, 0x66)),
                template(Barrier, Low, 40.0, 50.0, Color::rgb(0x00, 0xff, 0xaa)),
            ],
        },
    ]
}

// ==================== Validation ====================
impl GameConfig {
    /// Rejects any config the simulation cannot run safely with.
    /// Called once at startup, every error here is fatal.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.canvas.width > 0.0 && self.canvas.height > 0.0,
            "canvas must have a positive size, got {}x{}",
            self.canvas.width,
            self.canvas.height
        );
        self.validate_player().context("invalid player config")?;
        self.validate_timing().context("invalid timing config")?;
        ensure!(
            self.rope.sample_step > 0.0,
            "rope sample step must be positive"
        );

        // a transition needs somewhere else to go
        ensure!(
            self.eras.len() >= 2,
            "at least two eras are required, found {}",
            self.eras.len()
        );
        for era in &self.eras {
            if era.obstacles.is_empty() {
                bail!("era '{}' has no obstacle templates", era.name);
            }
            for obstacle in &era.obstacles {
                ensure!(
                    obstacle.width > 0.0 && obstacle.height > 0.0,
                    "era '{}' has a {:?} obstacle without a positive size",
                    era.name,
                    obstacle.kind
                );
            }
        }
        Ok(())
    }

    fn validate_player(&self) -> Result<()> {
        let player = &self.player;
        ensure!(player.collision_margin > 0.0, "collision margin must be positive");
        // smallest pose is ducking (half height), its hitbox must stay non-empty
        let ducked = Rect::new_from_x_y(0.0, 0.0, player.width, player.height / 2.0);
        let hitbox = ducked.inset(player.collision_margin);
        ensure!(
            hitbox.width() > 0.0 && hitbox.height() > 0.0,
            "collision margin {} leaves no hitbox inside a {}x{} ducked body",
            player.collision_margin,
            ducked.width(),
            ducked.height()
        );
        ensure!(player.fall_limit > 0.0, "fall limit must be positive");
        Ok(())
    }

    fn validate_timing(&self) -> Result<()> {
        let timing = &self.timing;
        ensure!(timing.obstacle_speed > 0.0, "obstacle speed must be positive");
        ensure!(timing.spawn_interval_ms > 0.0, "spawn interval must be positive");
        ensure!(
            timing.era_min_ms >= 0.0 && timing.era_min_ms < timing.era_max_ms,
            "era change window [{}, {}) is empty",
            timing.era_min_ms,
            timing.era_max_ms
        );
        ensure!(
            timing.transition_step > 0.0 && timing.transition_step <= 1.0,
            "transition step must be in (0, 1], got {}",
            timing.transition_step
        );
        Ok(())
    }

    /// Vertical centre of the rope, where the player starts
    pub fn rope_base_y(&self) -> f64 {
        self.canvas.height / 2.0
    }
}
