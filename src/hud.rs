use crate::browser::{self, html};
use anyhow::{anyhow, Result};
use web_sys::{Element, HtmlElement};

pub const TITLE: &str = "Time-Traveler's Tightrope";
const WELCOME_MESSAGE: &str = "Balance on the rope through time!<br>\
    Use ↑ to jump and ↓ to duck.<br>\
    Press Space or Enter to start/restart.<br>\
    Survive as long as possible!";

/// Overlay shown on top of the canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel {
    Welcome,
    GameOver { score: u32 },
    Hidden,
}

impl Panel {
    pub fn title(&self) -> &'static str {
        match self {
            Panel::Welcome => TITLE,
            Panel::GameOver { .. } => "Game Over!",
            Panel::Hidden => "",
        }
    }

    pub fn button_label(&self) -> &'static str {
        match self {
            Panel::Welcome => "Start Game",
            _ => "Play Again",
        }
    }
}

/// Everything the page shows outside the canvas, read from final tick state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudSnapshot {
    pub score: u32,
    /// None until the first run picks an era
    pub era: Option<String>,
    pub panel: Panel,
}

/// UI sink. The simulation never calls this directly, only
/// `HudPresenter::present` at the end of a tick does.
pub trait Hud {
    fn set_score(&self, score: u32) -> Result<()>;
    fn set_era(&self, name: &str) -> Result<()>;
    fn show_panel(&self, panel: &Panel) -> Result<()>;
}

/// Pushes only what changed since the last tick
pub struct HudPresenter {
    hud: Box<dyn Hud>,
    shown: Option<HudSnapshot>,
}

impl HudPresenter {
    pub fn new(hud: Box<dyn Hud>) -> Self {
        HudPresenter { hud, shown: None }
    }

    pub fn present(&mut self, snapshot: HudSnapshot) {
        let previous = self.shown.as_ref();
        if previous.map(|shown| shown.score) != Some(snapshot.score) {
            if let Err(err) = self.hud.set_score(snapshot.score) {
                log::warn!("HUD: could not show score : {:#}", err);
            }
        }
        if let Some(era) = snapshot.era.as_deref() {
            if previous.and_then(|shown| shown.era.as_deref()) != Some(era) {
                if let Err(err) = self.hud.set_era(era) {
                    log::warn!("HUD: could not show era : {:#}", err);
                }
            }
        }
        if previous.map(|shown| &shown.panel) != Some(&snapshot.panel) {
            if let Err(err) = self.hud.show_panel(&snapshot.panel) {
                log::warn!("HUD: could not update panel : {:#}", err);
            }
        }
        self.shown = Some(snapshot);
    }
}

// ==================== DOM ====================
/// HUD backed by the page's score / era / panel elements.
/// All elements are looked up once, a missing one fails construction.
pub struct DomHud {
    score: Element,
    era: Element,
    panel: HtmlElement,
    title: Element,
    message: Element,
    button: Element,
}

impl DomHud {
    pub fn new() -> Result<Self> {
        Ok(DomHud {
            score: browser::element_by_id(html::SCORE_ID)?,
            era: browser::element_by_id(html::ERA_ID)?,
            panel: browser::html_element_by_id(html::PANEL_ID)?,
            title: browser::query_selector(html::PANEL_TITLE_SELECTOR)?,
            message: browser::query_selector(html::PANEL_MESSAGE_SELECTOR)?,
            button: browser::element_by_id(html::RESTART_BUTTON_ID)?,
        })
    }
}

impl Hud for DomHud {
    fn set_score(&self, score: u32) -> Result<()> {
        self.score.set_text_content(Some(&score.to_string()));
        Ok(())
    }

    fn set_era(&self, name: &str) -> Result<()> {
        self.era.set_text_content(Some(name));
        Ok(())
    }

    fn show_panel(&self, panel: &Panel) -> Result<()> {
        let classes = self.panel.class_list();
        let message = match panel {
            Panel::Hidden => {
                return classes
                    .add_1(html::HIDDEN_CLASS)
                    .map_err(|err| anyhow!("Could not hide panel : {:#?}", err));
            }
            Panel::Welcome => WELCOME_MESSAGE.to_string(),
            Panel::GameOver { score } => {
                format!("Your score: <span id=\"final-score\">{}</span>", score)
            }
        };
        self.title.set_text_content(Some(panel.title()));
        self.message.set_inner_html(&message);
        self.button.set_text_content(Some(panel.button_label()));
        classes
            .remove_1(html::HIDDEN_CLASS)
            .map_err(|err| anyhow!("Could not show panel : {:#?}", err))
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::{Hud, Panel};
    use anyhow::Result;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HudCall {
        Score(u32),
        Era(String),
        Panel(Panel),
    }

    /// Records HUD writes, the log is shared so tests keep a handle
    #[derive(Default, Clone)]
    pub struct RecordingHud {
        pub calls: Rc<RefCell<Vec<HudCall>>>,
    }

    impl RecordingHud {
        pub fn take(&self) -> Vec<HudCall> {
            self.calls.borrow_mut().drain(..).collect()
        }
    }

    impl Hud for RecordingHud {
        fn set_score(&self, score: u32) -> Result<()> {
            self.calls.borrow_mut().push(HudCall::Score(score));
            Ok(())
        }

        fn set_era(&self, name: &str) -> Result<()> {
            self.calls.borrow_mut().push(HudCall::Era(name.to_string()));
            Ok(())
        }

        fn show_panel(&self, panel: &Panel) -> Result<()> {
            self.calls.borrow_mut().push(HudCall::Panel(panel.clone()));
            Ok(())
        }
    }
}
