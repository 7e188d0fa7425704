use crate::config::{EraDefinition, GameConfig};
use crate::engine::{Canvas, Point, Rect, Size};
use crate::obstacle::Obstacle;
use crate::sprite::figure;
use std::rc::Rc;

/// ELI5:
/// ┌──────────────── Pose Transition Flow ───────────────────┐
/// │  From Pose   →  Event     →  To Pose                    │
/// ├─────────────────────────────────────────────────────────┤
/// │  Balancing   →  Jump      →  Jumping                    │
/// │  Balancing   →  Duck      →  Ducking   (half height)    │
/// │  Ducking     →  Jump      →  Jumping   (full height)    │
/// │  Ducking     →  StandUp   →  Balancing                  │
/// │  -------        ------                                  │
/// │  Jumping     →  Update    →  Balancing (when landed)    │
/// │  anything else            →  unchanged (no-op)          │
/// └─────────────────────────────────────────────────────────┘
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Event {
    Jump,
    Duck,
    StandUp,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Pose {
    Balancing,
    Jumping,
    Ducking,
}

pub struct Player {
    config: Rc<GameConfig>,
    /// top left of the body, x never changes
    position: Point,
    velocity_y: f64,
    height: f64,
    pose: Pose,
    /// rope clock, +1 per update
    phase: u64,
    collision_box: Rect,
}

impl Player {
    pub fn new(config: Rc<GameConfig>) -> Self {
        let position = Point {
            x: config.player.start_x,
            y: config.rope_base_y(),
        };
        let height = config.player.height;
        let mut player = Player {
            config,
            position,
            velocity_y: 0.0,
            height,
            pose: Pose::Balancing,
            phase: 0,
            collision_box: Rect::default(),
        };
        player.refresh_collision_box();
        player
    }

    /// One physics step. Fixed increments per call on purpose : physics
    /// runs at frame rate while spawn/era clocks use elapsed milliseconds.
    /// Returns false once the player has strayed too far from the rope.
    pub fn update(&mut self) -> bool {
        let gravity = self.config.player.gravity;
        self.velocity_y += gravity;
        self.position.y += self.velocity_y;

        self.phase += 1;
        let rope = self.rope_height();

        match self.pose {
            Pose::Balancing => self.settle(rope),
            Pose::Ducking => self.settle(rope + self.duck_offset()),
            Pose::Jumping => {
                let tolerance = self.config.player.landing_tolerance;
                if self.velocity_y > 0.0 && (self.position.y - rope).abs() < tolerance {
                    self.pose = Pose::Balancing;
                    self.settle(rope);
                }
            }
        }
        self.refresh_collision_box();

        let base = self.base_y();
        let limit = self.config.player.fall_limit;
        self.position.y >= base - limit && self.position.y <= base + limit
    }

    pub fn jump(&mut self) {
        self.transition(Event::Jump);
    }

    pub fn duck(&mut self) {
        self.transition(Event::Duck);
    }

    pub fn stop_ducking(&mut self) {
        self.transition(Event::StandUp);
    }

    /// Guards against out of order input (e.g. duck mid-jump) by ignoring
    /// any event the current pose has no arm for
    fn transition(&mut self, event: Event) {
        let rope = self.rope_height();
        match (self.pose, event) {
            (Pose::Balancing, Event::Jump) => self.launch(),
            // jumps from where it crouched, only the height comes back
            (Pose::Ducking, Event::Jump) => {
                self.height = self.config.player.height;
                self.launch();
            }
            (Pose::Balancing, Event::Duck) => {
                self.pose = Pose::Ducking;
                self.height = self.config.player.height / 2.0;
                self.position.y = rope + self.duck_offset();
            }
            (Pose::Ducking, Event::StandUp) => self.stand(rope),
            _ => return,
        }
        self.refresh_collision_box();
    }

    pub fn check_collision(&self, obstacle: &Obstacle) -> bool {
        self.collision_box.intersects(&obstacle.bounding_box())
    }

    /// Rope first, then the walker on top of it. Pure : no state changes.
    pub fn draw(&self, canvas: &dyn Canvas, era: &EraDefinition) {
        let rope = &self.config.rope;
        figure::rope(canvas, &self.rope_samples(), era.rope_color, rope.line_width);
        figure::walker(canvas, &self.visual_box(), !self.is_ducking());
    }

    /// Sample points for the drawn rope : anchored at the left edge on the
    /// baseline, then the physics sinusoid shifted by each sample's x for
    /// every x < canvas width
    pub fn rope_samples(&self) -> Vec<Point> {
        let width = self.config.canvas.width;
        let step = self.config.rope.sample_step;
        let anchor = Point {
            x: 0.0,
            y: self.base_y(),
        };
        let wave = (0u64..)
            .map(|i| i as f64 * step)
            .take_while(|x| *x < width)
            .map(|x| Point {
                x,
                y: self.rope_height_at(self.phase as f64 + x),
            });
        std::iter::once(anchor).chain(wave).collect()
    }

    /// Rope height under the player right now
    pub fn rope_height(&self) -> f64 {
        self.rope_height_at(self.phase as f64)
    }

    fn rope_height_at(&self, phase: f64) -> f64 {
        let rope = &self.config.rope;
        self.base_y() + rope.amplitude * (phase * rope.frequency).sin()
    }

    pub fn base_y(&self) -> f64 {
        self.config.rope_base_y()
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn velocity_y(&self) -> f64 {
        self.velocity_y
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn phase(&self) -> u64 {
        self.phase
    }

    pub fn is_jumping(&self) -> bool {
        self.pose == Pose::Jumping
    }

    pub fn is_ducking(&self) -> bool {
        self.pose == Pose::Ducking
    }

    pub fn visual_box(&self) -> Rect {
        Rect::new(
            self.position,
            Size {
                width: self.config.player.width,
                height: self.height,
            },
        )
    }

    pub fn collision_box(&self) -> Rect {
        self.collision_box
    }

    fn duck_offset(&self) -> f64 {
        self.config.player.height / 4.0
    }

    fn settle(&mut self, y: f64) {
        self.position.y = y;
        self.velocity_y = 0.0;
    }

    fn stand(&mut self, rope: f64) {
        self.pose = Pose::Balancing;
        self.height = self.config.player.height;
        self.position.y = rope;
    }

    fn launch(&mut self) {
        self.pose = Pose::Jumping;
        self.velocity_y = -self.config.player.jump_force;
    }

    fn refresh_collision_box(&mut self) {
        self.collision_box = self.visual_box().inset(self.config.player.collision_margin);
    }
}
