use crate::browser;
use crate::config::GameConfig;
use crate::engine::input::InputEvent;
use crate::engine::{Canvas, Game, LoopControl};
use crate::era::EraManager;
use crate::hud::{DomHud, Hud, HudPresenter, HudSnapshot, Panel};
use crate::obstacle::{Obstacle, ObstacleStatus};
use crate::player::Player;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

/// TABLE
/// ┌───────────────────── Game Architecture Overview ────────────────────────┐
/// │                                                                         │
/// │    ┌─────────────┐          ┌─────────────┐          ┌─────────────┐    │
/// │    │  engine.rs  │  input   │   game.rs   │  step    │    Run      │    │
/// │    │  GameLoop   ├─────────►│  Tightrope  ├─────────►│ era, player │    │
/// │    │  (rAF)      │  tick    │             │          │ obstacles   │    │
/// │    └─────────────┘          └──────┬──────┘          └─────────────┘    │
/// │                                    │ present                            │
/// │                              ┌─────┴──────┐                             │
/// │                              │ HudPresent │──► Hud (DOM)                │
/// │                              └────────────┘                             │
/// │                                                                         │
/// ├──────────────────────── Tick Order ─────────────────────────────────────┤
/// │                                                                         │
/// │  1. queued input  ─► Command (jump / duck / stop ducking / restart)     │
/// │  2. Running only  ─► era.update      (era bonus on change)              │
/// │                   ─► player.update   (fell off => GameOver)             │
/// │                   ─► spawn timer     (at most one spawn per tick)       │
/// │                   ─► obstacles       (back to front, credit / expire)   │
/// │                   ─► collisions      (first hit => GameOver)            │
/// │  3. draw            era backdrop → rope + player → obstacles            │
/// │  4. present         HudSnapshot → Hud                                   │
/// └─────────────────────────────────────────────────────────────────────────┘
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameState {
    NotStarted,
    Running,
    GameOver,
}

/// Player intent, decoded from raw input against the current state
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Jump,
    Duck,
    StopDucking,
    Restart,
}

/// Why a run ended
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Outcome {
    Alive,
    FellOff,
    Hit,
}

/// Everything that belongs to a single attempt, rebuilt on restart
pub struct Run {
    player: Player,
    era: EraManager,
    obstacles: Vec<Obstacle>,
    score: u32,
    spawn_timer: f64,
}

impl Run {
    fn new(config: &Rc<GameConfig>, rng: StdRng) -> Self {
        Run {
            player: Player::new(config.clone()),
            era: EraManager::new(config.clone(), rng),
            obstacles: Vec::new(),
            score: 0,
            spawn_timer: 0.0,
        }
    }

    fn step(&mut self, delta_ms: f64, config: &GameConfig) -> Result<Outcome> {
        if self.era.update(delta_ms) {
            self.score += config.scoring.era_survived;
        }

        if !self.player.update() {
            return Ok(Outcome::FellOff);
        }

        // reset, not subtract : a long frame still spawns only once
        self.spawn_timer += delta_ms;
        if self.spawn_timer >= config.timing.spawn_interval_ms {
            self.spawn_timer = 0.0;
            self.spawn(config)?;
        }

        for index in (0..self.obstacles.len()).rev() {
            match self.obstacles[index].update() {
                ObstacleStatus::Passed => self.score += config.scoring.obstacle_avoided,
                ObstacleStatus::Expired => {
                    self.obstacles.remove(index);
                }
                ObstacleStatus::Active => {}
            }
        }

        if self
            .obstacles
            .iter()
            .any(|obstacle| self.player.check_collision(obstacle))
        {
            return Ok(Outcome::Hit);
        }
        Ok(Outcome::Alive)
    }

    fn spawn(&mut self, config: &GameConfig) -> Result<()> {
        let template = self
            .era
            .random_obstacle_template()
            .context("cannot spawn obstacle")?;
        log::debug!("Spawning {:?} ({:?})", template.kind, template.band);
        self.obstacles.push(Obstacle::new(&template, config));
        Ok(())
    }

    fn draw(&self, canvas: &dyn Canvas) {
        self.era.draw(canvas);
        self.player.draw(canvas, self.era.current_era());
        for obstacle in &self.obstacles {
            obstacle.draw(canvas);
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn era(&self) -> &EraManager {
        &self.era
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn score(&self) -> u32 {
        self.score
    }
}

/// The orchestrator : owns the run, the score and the terminal state
pub struct Tightrope {
    config: Rc<GameConfig>,
    rng: StdRng,
    state: GameState,
    run: Option<Run>,
    presenter: HudPresenter,
}

impl Tightrope {
    /// Fails fast on a config the simulation cannot run with
    pub fn new(config: GameConfig, rng: StdRng, hud: Box<dyn Hud>) -> Result<Self> {
        config.validate().context("invalid game configuration")?;
        let mut game = Tightrope {
            config: Rc::new(config),
            rng,
            state: GameState::NotStarted,
            run: None,
            presenter: HudPresenter::new(hud),
        };
        game.present();
        Ok(game)
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn run(&self) -> Option<&Run> {
        self.run.as_ref()
    }

    /// 0 before the first run
    pub fn score(&self) -> u32 {
        self.run.as_ref().map_or(0, Run::score)
    }

    /// (Re)creates player and eras, clears obstacles, score and spawn timer
    pub fn restart(&mut self) {
        let era_rng = StdRng::seed_from_u64(self.rng.gen());
        self.run = Some(Run::new(&self.config, era_rng));
        self.state = GameState::Running;
        log::info!("Run started in the {} era", self.era_name().unwrap_or("?"));
    }

    /// One frame. Physics only advances while running.
    pub fn tick(&mut self, delta_ms: f64) -> LoopControl {
        if self.state == GameState::Running {
            self.step(delta_ms);
        }
        self.present();

        match self.state {
            GameState::Running => LoopControl::Continue,
            GameState::NotStarted | GameState::GameOver => LoopControl::Halt,
        }
    }

    fn step(&mut self, delta_ms: f64) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        match run.step(delta_ms, &self.config) {
            Ok(Outcome::Alive) => {}
            Ok(outcome) => {
                log::info!("Game over ({:?}) with score {}", outcome, run.score);
                self.state = GameState::GameOver;
            }
            Err(err) => {
                log::error!("Run aborted : {:#}", err);
                self.state = GameState::GameOver;
            }
        }
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        if let Some(command) = self.command_for(event) {
            self.apply(command);
        }
    }

    /// Same key means different things before / during / after a run
    pub fn command_for(&self, event: &InputEvent) -> Option<Command> {
        let controls = &self.config.controls;
        if self.state != GameState::Running {
            return match event {
                InputEvent::KeyDown(code) if controls.is_restart(code) => Some(Command::Restart),
                InputEvent::TouchStart { .. } | InputEvent::Button => Some(Command::Restart),
                _ => None,
            };
        }
        match event {
            InputEvent::KeyDown(code) if controls.is_jump(code) => Some(Command::Jump),
            InputEvent::KeyDown(code) if controls.is_duck(code) => Some(Command::Duck),
            InputEvent::KeyUp(code) if controls.is_duck(code) => Some(Command::StopDucking),
            InputEvent::TouchStart { y } if *y > self.config.canvas.height / 2.0 => {
                Some(Command::Duck)
            }
            InputEvent::TouchStart { .. } => Some(Command::Jump),
            InputEvent::TouchEnd => Some(Command::StopDucking),
            _ => None,
        }
    }

    pub fn apply(&mut self, command: Command) {
        if command == Command::Restart {
            self.restart();
            return;
        }
        let Some(run) = self.run.as_mut() else {
            return;
        };
        match command {
            Command::Jump => run.player.jump(),
            Command::Duck => run.player.duck(),
            Command::StopDucking => run.player.stop_ducking(),
            Command::Restart => {}
        }
    }

    pub fn draw(&self, canvas: &dyn Canvas) {
        if let Some(run) = &self.run {
            run.draw(canvas);
        }
    }

    pub fn snapshot(&self) -> HudSnapshot {
        let score = self.score();
        HudSnapshot {
            score,
            era: self.era_name().map(str::to_string),
            panel: match self.state {
                GameState::NotStarted => Panel::Welcome,
                GameState::Running => Panel::Hidden,
                GameState::GameOver => Panel::GameOver { score },
            },
        }
    }

    fn present(&mut self) {
        let snapshot = self.snapshot();
        self.presenter.present(snapshot);
    }

    fn era_name(&self) -> Option<&str> {
        self.run
            .as_ref()
            .map(|run| run.era.current_era().name.as_str())
    }
}

// ==================== Browser Entry ====================
/// Engine facing wrapper : loads config + HUD, then hands ticks to `Tightrope`
pub enum TimeTraveler {
    /// Waiting for `initialize`, optionally with a JSON config to fetch
    Loading { config_url: Option<String> },
    Loaded(Tightrope),
}

impl TimeTraveler {
    pub fn new(config_url: Option<String>) -> Self {
        TimeTraveler::Loading { config_url }
    }

    /// Unreachable or malformed files fall back to the built-in tuning,
    /// a file that parses but fails validation is still fatal later on
    async fn load_config(config_url: Option<&str>) -> GameConfig {
        let Some(url) = config_url else {
            log::info!("Using built-in configuration");
            return GameConfig::default();
        };
        match browser::fetch_json::<GameConfig>(url).await {
            Ok(config) => {
                log::info!("Loaded configuration from {}", url);
                config
            }
            Err(err) => {
                log::warn!("Could not load {}, using built-in configuration : {:#}", url, err);
                GameConfig::default()
            }
        }
    }
}

#[async_trait(?Send)]
impl Game for TimeTraveler {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            TimeTraveler::Loading { config_url } => {
                let config = Self::load_config(config_url.as_deref()).await;

                let canvas = browser::canvas()?;
                canvas.set_width(config.canvas.width as u32);
                canvas.set_height(config.canvas.height as u32);

                let hud = DomHud::new().context("HUD elements missing from page")?;
                let game = Tightrope::new(config, StdRng::from_entropy(), Box::new(hud))?;
                Ok(Box::new(TimeTraveler::Loaded(game)))
            }
            TimeTraveler::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn handle_input(&mut self, event: &InputEvent) {
        if let TimeTraveler::Loaded(game) = self {
            game.handle_input(event);
        }
    }

    fn update(&mut self, delta_ms: f64) -> LoopControl {
        match self {
            TimeTraveler::Loaded(game) => game.tick(delta_ms),
            TimeTraveler::Loading { .. } => LoopControl::Halt,
        }
    }

    fn draw(&self, canvas: &dyn Canvas) {
        if let TimeTraveler::Loaded(game) = self {
            game.draw(canvas);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Band, ObstacleKind, ObstacleTemplate};
    use crate::engine::recording::{DrawCall, RecordingCanvas};
    use crate::engine::Color;
    use crate::hud::recording::{HudCall, RecordingHud};

    const FRAME: f64 = 1000.0 / 60.0;

    fn game_with(config: GameConfig) -> (Tightrope, RecordingHud) {
        let hud = RecordingHud::default();
        let game = Tightrope::new(config, StdRng::seed_from_u64(1), Box::new(hud.clone())).unwrap();
        (game, hud)
    }

    fn game() -> (Tightrope, RecordingHud) {
        game_with(GameConfig::default())
    }

    fn key_down(code: &str) -> InputEvent {
        InputEvent::KeyDown(code.to_string())
    }

    /// A middle band box parked right on top of the player
    fn obstacle_on_player(game: &Tightrope) -> Obstacle {
        let template = ObstacleTemplate {
            kind: ObstacleKind::Block,
            band: Band::Middle,
            width: 40.0,
            height: 40.0,
            color: Color::WHITE,
        };
        let mut obstacle = Obstacle::new(&template, game.config());
        while obstacle.bounding_box().x() > 100.0 {
            obstacle.update();
        }
        obstacle
    }

    #[test]
    fn starts_on_the_welcome_panel_and_halts() {
        let (mut game, hud) = game();
        assert_eq!(game.state(), GameState::NotStarted);
        assert_eq!(
            hud.take(),
            vec![HudCall::Score(0), HudCall::Panel(Panel::Welcome)]
        );
        assert_eq!(game.tick(FRAME), LoopControl::Halt);
        assert!(game.run().is_none());
    }

    #[test]
    fn invalid_config_is_fatal() {
        let mut config = GameConfig::default();
        config.eras[0].obstacles.clear();
        let result = Tightrope::new(config, StdRng::seed_from_u64(1), Box::new(RecordingHud::default()));
        assert!(result.is_err());
    }

    #[test]
    fn restart_key_starts_a_run() {
        let (mut game, hud) = game();
        hud.take();

        game.handle_input(&key_down("ArrowUp"));
        assert_eq!(game.state(), GameState::NotStarted);

        game.handle_input(&key_down("Enter"));
        assert_eq!(game.state(), GameState::Running);
        assert_eq!(game.tick(FRAME), LoopControl::Continue);

        let calls = hud.take();
        assert!(calls.contains(&HudCall::Panel(Panel::Hidden)));
        assert!(calls
            .iter()
            .any(|call| matches!(call, HudCall::Era(name) if !name.is_empty())));
    }

    #[test]
    fn running_input_maps_to_player_commands() {
        let (mut game, _hud) = game();
        game.restart();

        assert_eq!(game.command_for(&key_down("ArrowUp")), Some(Command::Jump));
        assert_eq!(game.command_for(&key_down("Space")), Some(Command::Jump));
        assert_eq!(game.command_for(&key_down("ArrowDown")), Some(Command::Duck));
        assert_eq!(
            game.command_for(&InputEvent::KeyUp("ArrowDown".into())),
            Some(Command::StopDucking)
        );
        assert_eq!(
            game.command_for(&InputEvent::TouchStart { y: 300.0 }),
            Some(Command::Duck)
        );
        assert_eq!(
            game.command_for(&InputEvent::TouchStart { y: 50.0 }),
            Some(Command::Jump)
        );
        assert_eq!(game.command_for(&InputEvent::TouchEnd), Some(Command::StopDucking));
        assert_eq!(game.command_for(&key_down("Enter")), None);
        assert_eq!(game.command_for(&InputEvent::Button), None);
    }

    #[test]
    fn idle_input_only_restarts() {
        let (game, _hud) = game();
        assert_eq!(game.command_for(&key_down("Space")), Some(Command::Restart));
        assert_eq!(
            game.command_for(&InputEvent::TouchStart { y: 300.0 }),
            Some(Command::Restart)
        );
        assert_eq!(game.command_for(&InputEvent::Button), Some(Command::Restart));
        assert_eq!(game.command_for(&key_down("ArrowDown")), None);
        assert_eq!(game.command_for(&InputEvent::TouchEnd), None);
    }

    #[test]
    fn jump_command_reaches_the_player() {
        let (mut game, _hud) = game();
        game.restart();
        game.handle_input(&key_down("ArrowUp"));
        let player = game.run().unwrap().player();
        assert!(player.is_jumping());
        assert_eq!(player.velocity_y(), -12.0);
    }

    #[test]
    fn spawns_at_most_once_per_tick() {
        let (mut game, _hud) = game();
        game.restart();

        game.tick(1000.0);
        assert!(game.run().unwrap().obstacles().is_empty());
        game.tick(499.0);
        assert!(game.run().unwrap().obstacles().is_empty());
        game.tick(1.0);
        assert_eq!(game.run().unwrap().obstacles().len(), 1);
        assert_eq!(game.run().unwrap().spawn_timer, 0.0);

        // three intervals in one frame still yields one spawn
        game.tick(4500.0);
        assert_eq!(game.run().unwrap().obstacles().len(), 2);
    }

    #[test]
    fn spawned_obstacles_come_from_the_current_era() {
        let (mut game, _hud) = game();
        game.restart();
        game.tick(1500.0);
        let run = game.run().unwrap();
        let kind = run.obstacles()[0].kind();
        assert!(run
            .era()
            .current_era()
            .obstacles
            .iter()
            .any(|template| template.kind == kind));
    }

    #[test]
    fn collision_ends_the_game_and_halts() {
        let (mut game, hud) = game();
        game.restart();
        let obstacle = obstacle_on_player(&game);
        game.run.as_mut().unwrap().obstacles.push(obstacle);
        hud.take();

        assert_eq!(game.tick(FRAME), LoopControl::Halt);
        assert_eq!(game.state(), GameState::GameOver);
        assert!(hud
            .take()
            .contains(&HudCall::Panel(Panel::GameOver { score: 0 })));

        // further ticks leave the final state untouched
        let phase = game.run().unwrap().player().phase();
        assert_eq!(game.tick(FRAME), LoopControl::Halt);
        assert_eq!(game.run().unwrap().player().phase(), phase);
    }

    #[test]
    fn falling_off_the_rope_ends_the_game() {
        let mut config = GameConfig::default();
        // a jump this strong leaves the 150px band
        config.player.jump_force = 40.0;
        let (mut game, _hud) = game_with(config);
        game.restart();
        game.handle_input(&key_down("ArrowUp"));
        for _ in 0..10 {
            if game.tick(FRAME) == LoopControl::Halt {
                break;
            }
        }
        assert_eq!(game.state(), GameState::GameOver);
    }

    #[test]
    fn passed_obstacles_score_and_expired_ones_leave() {
        let (mut game, _hud) = game();
        game.restart();
        let template = ObstacleTemplate {
            kind: ObstacleKind::Pterodactyl,
            band: Band::High,
            width: 60.0,
            height: 40.0,
            color: Color::WHITE,
        };
        let obstacle = Obstacle::new(&template, game.config());
        game.run.as_mut().unwrap().obstacles.push(obstacle);

        // right edge 860 - 5n : passes the player at n = 153, gone at n = 173
        for _ in 0..153 {
            game.tick(1.0);
        }
        assert_eq!(game.score(), 1);
        assert_eq!(game.run().unwrap().obstacles().len(), 1);
        for _ in 0..20 {
            game.tick(1.0);
        }
        assert_eq!(game.score(), 1);
        assert!(game.run().unwrap().obstacles().is_empty());
    }

    #[test]
    fn era_change_awards_the_bonus() {
        let mut config = GameConfig::default();
        config.timing.era_min_ms = 10.0;
        config.timing.era_max_ms = 20.0;
        config.timing.spawn_interval_ms = 1.0e9;
        let (mut game, hud) = game_with(config);
        game.restart();
        let first = game.run().unwrap().era().current_index();
        hud.take();

        // countdown of 10-20ms runs out within two ticks, then ~50 steps of 0.02
        let mut ticks = 0;
        while game.run().unwrap().era().current_index() == first {
            game.tick(FRAME);
            ticks += 1;
            assert!(ticks < 100, "era never changed");
        }
        assert_eq!(game.score(), 5);
        let calls = hud.take();
        assert!(calls.contains(&HudCall::Score(5)));
        assert!(calls.iter().any(|call| matches!(call, HudCall::Era(_))));
    }

    #[test]
    fn restart_after_game_over_resets_everything() {
        let (mut game, _hud) = game();
        game.restart();
        game.run.as_mut().unwrap().score = 42;
        let obstacle = obstacle_on_player(&game);
        game.run.as_mut().unwrap().obstacles.push(obstacle);
        game.tick(FRAME);
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.snapshot().panel, Panel::GameOver { score: 42 });

        game.handle_input(&key_down("Space"));
        assert_eq!(game.state(), GameState::Running);
        assert_eq!(game.score(), 0);
        assert!(game.run().unwrap().obstacles().is_empty());
        assert_eq!(game.run().unwrap().spawn_timer, 0.0);
        assert_eq!(game.tick(FRAME), LoopControl::Continue);
    }

    #[test]
    fn score_never_decreases_during_a_run() {
        let mut config = GameConfig::default();
        config.timing.era_min_ms = 500.0;
        config.timing.era_max_ms = 1000.0;
        let (mut game, _hud) = game_with(config);
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..3 {
            game.restart();
            assert_eq!(game.score(), 0);
            let mut last = 0;
            for _ in 0..3000 {
                match rng.gen_range(0..40) {
                    0 => game.apply(Command::Jump),
                    1 => game.apply(Command::Duck),
                    2 => game.apply(Command::StopDucking),
                    _ => {}
                }
                game.tick(FRAME);
                assert!(game.score() >= last);
                last = game.score();
                if game.state() == GameState::GameOver {
                    break;
                }
            }
        }
    }

    #[test]
    fn draw_paints_backdrop_then_rope_then_obstacles() {
        let (mut game, _hud) = game();
        let canvas = RecordingCanvas::default();
        game.draw(&canvas);
        assert!(canvas.calls().is_empty());

        game.restart();
        game.tick(1500.0);
        game.draw(&canvas);
        let calls = canvas.calls();
        assert!(matches!(calls[0], DrawCall::Rect(rect, _) if rect.width() == 800.0));
        assert!(calls.iter().any(|call| matches!(call, DrawCall::Polyline(points, _, _) if points.len() == 81)));
    }
}
