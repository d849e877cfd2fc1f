//! Session demo application
//!
//! Drives a match through its phases with an FSM owned by the session,
//! while a scoreboard module ticks alongside the FSM manager.

use std::cell::Cell;
use std::rc::Rc;

use game_runtime::prelude::*;

const CONFIG_PATH: &str = "session_app/config/runtime.toml";
const FRAME_SECONDS: f32 = 1.0 / 30.0;
const MAX_FRAMES: u32 = 600;

/// Match owning the phase FSM
struct Session {
    round_seconds: f32,
    finished: Cell<bool>,
}

/// Scores the current match
trait Scoreboard {
    fn add_points(&mut self, points: u32);
    fn total(&self) -> u32;
}

#[derive(Default)]
struct ScoreboardModule {
    total: u32,
    frames: u64,
}

impl Module for ScoreboardModule {
    fn priority(&self) -> i32 {
        5
    }

    fn update(&mut self, _: &mut ReferencePool, _: f32, _: f32) -> RuntimeResult<()> {
        self.frames += 1;
        Ok(())
    }

    fn shutdown(&mut self, _: &mut ReferencePool) {
        log::info!("Final score {} after {} frames", self.total, self.frames);
    }
}

impl Scoreboard for ScoreboardModule {
    fn add_points(&mut self, points: u32) {
        self.total += points;
    }

    fn total(&self) -> u32 {
        self.total
    }
}

#[derive(Default)]
struct Countdown;

impl FsmState<Session> for Countdown {
    fn on_enter(&mut self, fsm: &mut FsmController<'_, Session>) -> RuntimeResult<()> {
        log::info!("Get ready...");
        fsm.set_var("round", 1_i64)?;
        Ok(())
    }

    fn on_update(&mut self, fsm: &mut FsmController<'_, Session>, _: f32, _: f32) -> RuntimeResult<()> {
        if fsm.current_state_time() >= 1.0 {
            fsm.change_state::<Playing>()?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Playing {
    hits: u32,
}

impl FsmState<Session> for Playing {
    fn on_enter(&mut self, fsm: &mut FsmController<'_, Session>) -> RuntimeResult<()> {
        let round = fsm.get_var::<i64>("round")?.copied().unwrap_or(1);
        log::info!("Round {} started", round);
        Ok(())
    }

    fn on_update(&mut self, fsm: &mut FsmController<'_, Session>, _: f32, _: f32) -> RuntimeResult<()> {
        self.hits += 1;
        let round_seconds = fsm.owner().map_or(0.0, |s| s.round_seconds);
        if fsm.current_state_time() >= round_seconds {
            fsm.set_var("hits", i64::from(self.hits))?;
            fsm.change_state::<GameOver>()?;
        }
        Ok(())
    }

    fn on_leave(&mut self, _: &mut FsmController<'_, Session>, is_shutdown: bool) -> RuntimeResult<()> {
        if !is_shutdown {
            log::info!("Round over with {} hits", self.hits);
        }
        Ok(())
    }
}

#[derive(Default)]
struct GameOver;

impl FsmState<Session> for GameOver {
    fn on_enter(&mut self, fsm: &mut FsmController<'_, Session>) -> RuntimeResult<()> {
        if let Some(session) = fsm.owner() {
            session.finished.set(true);
        }
        Ok(())
    }
}

fn load_config() -> RuntimeConfig {
    match RuntimeConfig::load_from_file(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Using default runtime config ({}): {}", CONFIG_PATH, e);
            RuntimeConfig::default()
        }
    }
}

fn run(runtime: &mut Runtime, session: &Rc<Session>) -> RuntimeResult<()> {
    runtime.bind_module::<FsmManager>()?;
    runtime.bind::<dyn Scoreboard, ScoreboardModule, _>(|| Ok(ScoreboardModule::default()), |m| m)?;
    runtime.get_module::<dyn Scoreboard>()?;

    let (fsms, pool) = runtime.get_module_with_pool::<FsmManager>()?;
    let states: Vec<Box<dyn FsmState<Session>>> = vec![
        Box::new(Countdown),
        Box::new(Playing::default()),
        Box::new(GameOver),
    ];
    let handle = fsms.create_fsm(pool, "match", Rc::downgrade(session), states)?;
    if let Some(fsm) = fsms.get_fsm_mut(handle) {
        fsm.start::<Countdown>(pool)?;
    }

    let mut frames = 0;
    while !session.finished.get() && frames < MAX_FRAMES {
        runtime.advance(FRAME_SECONDS)?;
        frames += 1;
    }

    let (fsms, pool) = runtime.get_module_with_pool::<FsmManager>()?;
    let pool: &ReferencePool = pool;
    let hits = fsms
        .get_fsm(handle)
        .map(|fsm| fsm.get_var::<i64>(pool, "hits"))
        .transpose()?
        .flatten()
        .copied()
        .unwrap_or_default();
    for observer in fsms.observers() {
        log::info!(
            "FSM '{}' finished in {:?}",
            observer.name(),
            observer.current_state_type()
        );
    }

    let scoreboard = runtime.get_module::<dyn Scoreboard>()?;
    scoreboard.add_points(u32::try_from(hits).unwrap_or(0) * 10);
    log::info!("Match finished after {} frames, score {}", frames, scoreboard.total());

    for info in runtime.pool().infos() {
        log::debug!("{}", info);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config();

    let mut runtime = Runtime::new(config)?;
    runtime.init_logging();
    log::info!("Starting session demo");

    let session = Rc::new(Session {
        round_seconds: 3.0,
        finished: Cell::new(false),
    });

    let result = run(&mut runtime, &session);
    runtime.shutdown();

    match result {
        Ok(()) => {
            log::info!("Session demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Session demo failed: {}", e);
            Err(e.into())
        }
    }
}
