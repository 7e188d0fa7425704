use crate::config::{EraDefinition, GameConfig, ObstacleTemplate};
use crate::engine::{Canvas, Color, Point, Rect};
use crate::sprite;
use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::rc::Rc;

// backdrop element ranges, px and px per update
const BACKDROP_ELEMENTS: usize = 5;
const BACKDROP_EDGE: f64 = 50.0;
const BACKDROP_MIN_SIZE: f64 = 20.0;
const BACKDROP_MAX_SIZE: f64 = 50.0;
const BACKDROP_MIN_SPEED: f64 = 0.5;
const BACKDROP_MAX_SPEED: f64 = 1.0;

/// ELI5:
/// ┌──────────────────── Era Lifecycle ─────────────────────┐
/// │                                                        │
/// │   Steady(current)                                      │
/// │     │  countdown -= delta_ms                           │
/// │     ▼  countdown <= 0                                  │
/// │   Transition { next != current, progress 0.0 }         │
/// │     │  progress += step   (per update, not per ms)     │
/// │     ▼  progress >= 1.0                                 │
/// │   Steady(next) + new backdrop + new countdown          │
/// │     └─► update() returns true exactly on this call     │
/// └────────────────────────────────────────────────────────┘
pub struct EraManager {
    config: Rc<GameConfig>,
    rng: StdRng,
    current: usize,
    transition: Option<Transition>,
    time_until_next_era: f64,
    backdrop: Vec<BackdropElement>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transition {
    pub next: usize,
    /// fraction in [0, 1)
    pub progress: f64,
}

/// One decorative shape of the parallax layer
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BackdropElement {
    pub position: Point,
    pub size: f64,
    pub speed: f64,
}

/// `rng.gen_range` panics on an empty range, tiny canvases collapse to `low`
fn sample(rng: &mut StdRng, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

impl EraManager {
    /// Starts in a random era. `config` must already be validated
    /// (at least two eras, none without obstacles).
    pub fn new(config: Rc<GameConfig>, mut rng: StdRng) -> Self {
        let current = rng.gen_range(0..config.eras.len());
        let mut era = EraManager {
            config,
            rng,
            current,
            transition: None,
            time_until_next_era: 0.0,
            backdrop: Vec::with_capacity(BACKDROP_ELEMENTS),
        };
        era.time_until_next_era = era.random_era_time();
        era.backdrop = era.generate_backdrop();
        era
    }

    pub fn current_era(&self) -> &EraDefinition {
        &self.config.eras[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// 0.0 whenever no transition is running
    pub fn transition_progress(&self) -> f64 {
        self.transition.map_or(0.0, |transition| transition.progress)
    }

    pub fn time_until_next_era(&self) -> f64 {
        self.time_until_next_era
    }

    pub fn backdrop(&self) -> &[BackdropElement] {
        &self.backdrop
    }

    /// Advances the backdrop and the era clock.
    /// Returns true only on the update that commits a new era.
    pub fn update(&mut self, delta_ms: f64) -> bool {
        self.drift_backdrop();

        if let Some(transition) = self.transition.as_mut() {
            transition.progress += self.config.timing.transition_step;
            if transition.progress >= 1.0 {
                let next = transition.next;
                self.commit(next);
                return true;
            }
        } else {
            self.time_until_next_era -= delta_ms;
            if self.time_until_next_era <= 0.0 {
                self.begin_transition();
            }
        }
        false
    }

    /// Uniform pick from the current era's pool
    pub fn random_obstacle_template(&mut self) -> Result<ObstacleTemplate> {
        let era = &self.config.eras[self.current];
        era.obstacles
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| anyhow!("era '{}' has no obstacle templates", era.name))
    }

    pub fn draw(&self, canvas: &dyn Canvas) {
        let era = self.current_era();
        let background = match self.transition {
            Some(transition) => self.background_color().lerp(
                self.config.eras[transition.next].background_color,
                transition.progress,
            ),
            None => self.background_color(),
        };
        canvas.fill_rect(
            &Rect::new_from_x_y(0.0, 0.0, self.config.canvas.width, self.config.canvas.height),
            background,
        );

        let paint = sprite::scenery_painter(era.scenery);
        for element in &self.backdrop {
            paint(canvas, element.position, element.size);
        }
    }

    fn background_color(&self) -> Color {
        self.current_era().background_color
    }

    fn begin_transition(&mut self) {
        // pick among the other eras only, no retry loop
        let others = self.config.eras.len() - 1;
        let mut next = self.rng.gen_range(0..others);
        if next >= self.current {
            next += 1;
        }
        log::debug!(
            "Era transition : {} -> {}",
            self.current_era().name,
            self.config.eras[next].name
        );
        self.transition = Some(Transition {
            next,
            progress: 0.0,
        });
    }

    fn commit(&mut self, next: usize) {
        log::info!(
            "Era changed : {} -> {}",
            self.current_era().name,
            self.config.eras[next].name
        );
        self.current = next;
        self.transition = None;
        self.time_until_next_era = self.random_era_time();
        self.backdrop = self.generate_backdrop();
    }

    fn random_era_time(&mut self) -> f64 {
        let timing = &self.config.timing;
        sample(&mut self.rng, timing.era_min_ms, timing.era_max_ms)
    }

    fn generate_backdrop(&mut self) -> Vec<BackdropElement> {
        (0..BACKDROP_ELEMENTS)
            .map(|_| {
                let x = sample(&mut self.rng, 0.0, self.config.canvas.width);
                let mut element = self.respawned_element(x);
                element.speed = sample(&mut self.rng, BACKDROP_MIN_SPEED, BACKDROP_MAX_SPEED);
                element
            })
            .collect()
    }

    /// New height and size, speed left for the caller
    fn respawned_element(&mut self, x: f64) -> BackdropElement {
        let height = self.config.canvas.height;
        BackdropElement {
            position: Point {
                x,
                y: sample(&mut self.rng, BACKDROP_EDGE, height - BACKDROP_EDGE),
            },
            size: sample(&mut self.rng, BACKDROP_MIN_SIZE, BACKDROP_MAX_SIZE),
            speed: BACKDROP_MIN_SPEED,
        }
    }

    fn drift_backdrop(&mut self) {
        let width = self.config.canvas.width;
        for index in 0..self.backdrop.len() {
            let element = &mut self.backdrop[index];
            element.position.x -= element.speed;
            if element.position.x + element.size < 0.0 {
                // loop back in from the right edge, keep drift speed
                let speed = element.speed;
                let mut respawned = self.respawned_element(width);
                respawned.speed = speed;
                self.backdrop[index] = respawned;
            }
        }
    }
}
