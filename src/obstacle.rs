use crate::config::{Band, GameConfig, ObstacleKind, ObstacleTemplate};
use crate::engine::{Canvas, Color, Rect};
use crate::sprite;

// gaps between the rope baseline and high / low obstacles (px)
const HIGH_CLEARANCE: f64 = 20.0;
const LOW_DROP: f64 = 10.0;

/// Outcome of one obstacle step
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ObstacleStatus {
    /// right edge just moved behind the player, reported once
    Passed,
    /// right edge is past the left edge of the canvas, remove it
    Expired,
    Active,
}

/// A live obstacle, copied from its era template at spawn time.
/// Only `bounding_box` matters for collisions, the silhouette is cosmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    kind: ObstacleKind,
    band: Band,
    bounding_box: Rect,
    color: Color,
    speed: f64,
    player_x: f64,
    passed: bool,
}

impl Obstacle {
    /// Spawns at the right edge of the canvas, y fixed by the band
    pub fn new(template: &ObstacleTemplate, config: &GameConfig) -> Self {
        let base_y = config.rope_base_y();
        let y = match template.band {
            Band::High => base_y - template.height - HIGH_CLEARANCE,
            Band::Middle => base_y - template.height / 2.0,
            Band::Low => base_y + LOW_DROP,
        };
        Obstacle {
            kind: template.kind,
            band: template.band,
            bounding_box: Rect::new_from_x_y(config.canvas.width, y, template.width, template.height),
            color: template.color,
            speed: config.timing.obstacle_speed,
            player_x: config.player.start_x,
            passed: false,
        }
    }

    /// Moves one step left. `Passed` is checked before `Expired`, so an
    /// obstacle crossing both lines in one step is credited first and
    /// removed on the following step.
    pub fn update(&mut self) -> ObstacleStatus {
        self.bounding_box.position.x -= self.speed;
        let right = self.bounding_box.right();

        if !self.passed && right < self.player_x {
            self.passed = true;
            return ObstacleStatus::Passed;
        }
        if right < 0.0 {
            return ObstacleStatus::Expired;
        }
        ObstacleStatus::Active
    }

    pub fn draw(&self, canvas: &dyn Canvas) {
        sprite::obstacle_painter(self.kind)(canvas, &self.bounding_box, self.color);
    }

    pub fn bounding_box(&self) -> Rect {
        self.bounding_box
    }

    pub fn kind(&self) -> ObstacleKind {
        self.kind
    }

    pub fn band(&self) -> Band {
        self.band
    }

    pub fn has_passed(&self) -> bool {
        self.passed
    }
}
