//! Hop Lab entry point
//!
//! Native builds run the classic level headless with the autopilot and write
//! the cycle logs to `log_dir`. The web build is driven by the keyboard and
//! hands its payloads to the page.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use hop_lab::Settings;
    use hop_lab::consts::*;
    use hop_lab::persistence::FileSummarySink;
    use hop_lab::platform::default_message_sink;
    use hop_lab::session::Session;
    use hop_lab::sim::{Direction, GamePhase, LevelLayout, TickInput, World, tick};

    /// Game instance holding all state
    struct Game {
        world: World,
        session: Session,
        accumulator: f32,
        last_time: f64,
        held: Option<Direction>,
    }

    impl Game {
        fn new(settings: &Settings) -> Self {
            let world = World::new(LevelLayout::classic(), settings);
            let session = Session::new(
                world.level.id().to_string(),
                settings,
                world.completion_points(),
                Box::new(FileSummarySink::new(&settings.log_dir)),
                default_message_sink(),
            );
            Self {
                world,
                session,
                accumulator: 0.0,
                last_time: 0.0,
                held: None,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = TickInput {
                    direction: self.held,
                };
                tick(&mut self.world, &mut self.session, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            let fields = [
                ("#hud-score .hud-value", self.session.score().to_string()),
                ("#hud-high .hud-value", self.session.high_score().to_string()),
                ("#hud-lives .hud-value", self.session.lives().to_string()),
                ("#hud-cycle .hud-value", (self.session.reset_index() + 1).to_string()),
            ];
            for (selector, text) in fields {
                if let Some(el) = document.query_selector(selector).ok().flatten() {
                    el.set_text_content(Some(&text));
                }
            }

            if let Some(el) = document.get_element_by_id("finish-marker") {
                let class = if self.world.phase == GamePhase::Complete {
                    "visible"
                } else {
                    "hidden"
                };
                let _ = el.set_attribute("class", class);
            }
        }
    }

    fn key_direction(key: &str) -> Option<Direction> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Direction::Forward),
            "ArrowDown" | "s" | "S" => Some(Direction::Back),
            "ArrowLeft" | "a" | "A" => Some(Direction::Left),
            "ArrowRight" | "d" | "D" => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Hop Lab starting...");

        let Some(window) = web_sys::window() else {
            return;
        };

        // Persist defaults on first run
        let settings = Settings::load();
        settings.save();
        log::info!(
            "Juicy: {}, difficulty: {}",
            settings.juicy,
            settings.effective_difficulty()
        );
        let game = Rc::new(RefCell::new(Game::new(&settings)));

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if let Some(dir) = key_direction(&event.key()) {
                    event.prevent_default();
                    game.borrow_mut().held = Some(dir);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let released = key_direction(&event.key());
                let mut g = game.borrow_mut();
                if released.is_some() && g.held == released {
                    g.held = None;
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        request_animation_frame(game);
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.update_hud();

            if g.world.phase == GamePhase::Complete {
                log::info!("Session complete, stopping frame loop");
                return;
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

/// Simulated seconds after which a headless run gives up
#[cfg(not(target_arch = "wasm32"))]
const TIME_LIMIT: f32 = 900.0;

/// Frame length fed to the accumulator in headless runs (30 Hz)
#[cfg(not(target_arch = "wasm32"))]
const FRAME_DT: f32 = 1.0 / 30.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use hop_lab::Settings;
    use hop_lab::autopilot::Autopilot;
    use hop_lab::consts::{MAX_SUBSTEPS, SIM_DT};
    use hop_lab::persistence::FileSummarySink;
    use hop_lab::platform::default_message_sink;
    use hop_lab::session::Session;
    use hop_lab::sim::{GamePhase, LevelLayout, World, tick};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Hop Lab (headless) starting...");

    let settings = Settings::load();
    log::info!(
        "Juicy: {}, difficulty: {}, resets: {}, logs: {}",
        settings.juicy,
        settings.effective_difficulty(),
        settings.total_level_resets,
        settings.log_dir
    );

    let mut world = World::new(LevelLayout::classic(), &settings);
    let mut session = Session::new(
        world.level.id().to_string(),
        &settings,
        world.completion_points(),
        Box::new(FileSummarySink::new(&settings.log_dir)),
        default_message_sink(),
    );
    let mut pilot = Autopilot::new(&settings);

    let mut accumulator = 0.0;
    let mut elapsed = 0.0;
    while world.phase != GamePhase::Complete && elapsed < TIME_LIMIT {
        accumulator += FRAME_DT;
        elapsed += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = pilot.next_input(&world);
            tick(&mut world, &mut session, &input, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    if world.phase == GamePhase::Complete {
        log::info!("Finished after {elapsed:.1}s of simulated play");
    } else {
        log::warn!(
            "Time limit reached in cycle {} with {} lives left",
            session.reset_index(),
            session.lives()
        );
    }
    match serde_json::to_string_pretty(session.totals()) {
        Ok(totals) => log::info!("Totals: {totals}"),
        Err(e) => log::warn!("Could not serialize totals: {e}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
