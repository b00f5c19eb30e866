//! Tokio driver that serializes countdown ticks and gesture input onto one task.
use std::time::Duration;

use log::debug;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::clock::Clock;
use crate::controller::ControllerPhase;
use crate::gesture::GestureType;
use crate::store::StoreError;
use crate::{GameEngine, GestureStorage, SessionReport};

const FALLBACK_TICK: Duration = Duration::from_millis(100);

/// Input delivered to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Gesture(GestureType),
    Pause,
    Resume,
    /// Abandon the session without recording it.
    Quit,
}

/// Play one session at `level` to completion.
///
/// Ticks fire every `tick_interval` seconds and commands are applied as they
/// arrive; both are handled inside one `select!` loop so they never race.
/// When every sender is dropped the countdown keeps running until the
/// session times out. Returns `None` if the session was quit.
///
/// # Errors
///
/// Returns an error if the finished session could not be persisted. The
/// session is still recorded in memory.
pub async fn run_session<S, C>(
    engine: &mut GameEngine<S, C>,
    level: u32,
    mut commands: mpsc::Receiver<SessionCommand>,
) -> Result<Option<SessionReport>, StoreError>
where
    S: GestureStorage,
    C: Clock,
{
    let dt = engine.config().tick_interval;
    let period = Duration::try_from_secs_f64(dt).unwrap_or(FALLBACK_TICK);
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    engine.start_game(level);
    let mut listening = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.tick(dt)?;
            }
            command = commands.recv(), if listening => match command {
                Some(SessionCommand::Gesture(gesture)) => {
                    engine.handle_gesture(gesture)?;
                }
                Some(SessionCommand::Pause) => {
                    engine.pause();
                }
                Some(SessionCommand::Resume) => {
                    engine.resume();
                }
                Some(SessionCommand::Quit) => {
                    engine.return_to_menu();
                    return Ok(None);
                }
                None => {
                    debug!("command channel closed; running out the clock");
                    listening = false;
                }
            },
        }

        if engine.controller().phase() == ControllerPhase::Finished {
            return Ok(engine.last_report().cloned());
        }
    }
}
