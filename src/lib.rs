// ==================== Imports ====================
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

pub mod browser;
pub mod config;
pub mod engine;
pub mod era;
pub mod game;
pub mod hud;
pub mod obstacle;
pub mod player;
pub mod sprite;

pub use config::GameConfig;
pub use engine::{Canvas, Color, LoopControl, Point, Rect, Size};
pub use game::{Command, GameState, Tightrope, TimeTraveler};
pub use hud::{Hud, HudSnapshot, Panel};

use engine::GameLoop;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs panic hook + console logger
/// - loads config (built-in, or JSON at `config_url`)
/// - starts the game loop
#[wasm_bindgen]
pub fn main_js(config_url: Option<String>) -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info)
        .map_err(|err| JsValue::from_str(&format!("Could not start logger : {}", err)))?;

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        if let Err(err) = GameLoop::start(TimeTraveler::new(config_url)).await {
            log::error!("Could not start game : {:#}", err);
        }
    });

    Ok(())
}
