// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      Directory Structure                                 │
// ├───────────────────┬──────────────────────────────────────────────────────┤
// │ Code Directory    │          Draws                                       │
// ├───────────────────┼──────────────────────────────────────────────────────┤
// │ sprite/           │ Pure painters, no game state is touched              │
// │ ├── mod.rs        │ kind -> painter lookup tables                        │
// │ ├── figure.rs     │ rope polyline + tightrope walker                     │
// │ ├── obstacles.rs  │ one silhouette per ObstacleKind                      │
// │ └── scenery.rs    │ parallax backdrop shape per era                      │
// └───────────────────┴──────────────────────────────────────────────────────┘
// Painters only ever see a Canvas and plain geometry : the collision code
// never looks at what was drawn.
pub mod figure;
pub mod obstacles;
pub mod scenery;

use crate::config::{ObstacleKind, Scenery};
use crate::engine::{Canvas, Color, Point, Rect};

/// Draws an obstacle silhouette inside (roughly) its collision box
pub type ObstaclePainter = fn(&dyn Canvas, &Rect, Color);

/// Draws one backdrop element anchored at its top left
pub type SceneryPainter = fn(&dyn Canvas, Point, f64);

pub fn obstacle_painter(kind: ObstacleKind) -> ObstaclePainter {
    match kind {
        ObstacleKind::Pterodactyl => obstacles::pterodactyl,
        ObstacleKind::Vine => obstacles::vine,
        ObstacleKind::Arrow => obstacles::arrow,
        ObstacleKind::Turret => obstacles::turret,
        ObstacleKind::Drone => obstacles::drone,
        ObstacleKind::Barrier => obstacles::barrier,
        ObstacleKind::Block => obstacles::block,
    }
}

pub fn scenery_painter(scenery: Scenery) -> SceneryPainter {
    match scenery {
        Scenery::Trees => scenery::tree,
        Scenery::Castles => scenery::castle,
        Scenery::Skyline => scenery::building,
        Scenery::None => scenery::nothing,
    }
}
