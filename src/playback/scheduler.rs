use std::sync::{Arc, Weak};

use crate::foundation::config::{MissPolicy, Pacing};
use crate::playback::cache::lock;
use crate::playback::player::{PlayerState, Shared};
use crate::playback::session::{Session, TaskHandle};
use crate::render::renderer::DrawOutcome;

/// Who is driving a tick. A tick only runs while its driver still owns the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TickDriver {
    /// The scheduled loop identified by `token`.
    Loop { token: u64 },
    /// A manual step against the session mounted as `epoch`.
    Step { epoch: u64 },
}

impl TickDriver {
    fn owns(self, session: &Session) -> bool {
        if session.paused {
            return false;
        }
        match self {
            Self::Loop { token } => session.loop_token == Some(token),
            Self::Step { epoch } => session.epoch == epoch,
        }
    }
}

fn owned_session(state: &mut PlayerState, driver: TickDriver) -> Option<&mut Session> {
    state.session.as_mut().filter(|s| driver.owns(s))
}

/// Run one tick: draw the playhead frame, request the next window, advance.
///
/// Returns `None` when the session is gone, paused or owned by another driver; nothing is drawn
/// or requested in that case.
pub(crate) async fn tick(shared: &Shared, driver: TickDriver) -> Option<DrawOutcome> {
    let (frame, pending) = {
        let mut state = shared.lock_state();
        let session = owned_session(&mut state, driver)?;
        let frame = session.playhead.current();
        let pending = (shared.config.miss_policy == MissPolicy::LoadThenDraw
            && !lock(&session.cache).has(frame))
        .then(|| {
            session
                .prefetcher
                .is_loading(frame)
                .then(|| session.prefetcher.loaded(frame))
        });
        (frame, pending)
    };

    let mut load_first = pending.is_some();
    if let Some(Some(batch)) = pending {
        // The batch covering this frame owns its fetch; load here only if it failed there.
        batch.await;
        let mut state = shared.lock_state();
        let session = owned_session(&mut state, driver)?;
        load_first = !lock(&session.cache).has(frame);
    }

    if load_first {
        let loaded = shared.loader.load_frame(frame).await;
        shared.counters.record(loaded.is_ok());
        match loaded {
            Ok(image) => {
                let mut state = shared.lock_state();
                if let Some(session) = owned_session(&mut state, driver) {
                    lock(&session.cache).put(frame, image);
                }
            }
            Err(err) => {
                tracing::warn!(frame = frame.get(), error = %err, "draw-time frame load failed");
            }
        }
    }

    let mut state = shared.lock_state();
    let PlayerState {
        surface,
        session,
        stats,
    } = &mut *state;
    let session = session.as_mut().filter(|s| driver.owns(s))?;

    let outcome = {
        let cache = lock(&session.cache);
        shared.renderer.draw_frame(
            frame,
            &cache,
            session.overlay.as_ref(),
            surface.as_deref_mut(),
            &mut session.geometry,
        )
    };
    stats.ticks += 1;
    match outcome {
        DrawOutcome::Drawn { .. } => stats.frames_drawn += 1,
        DrawOutcome::Skipped | DrawOutcome::NoSurface => stats.frames_skipped += 1,
    }

    let batch = session
        .prefetcher
        .request_window(frame.get().saturating_add(1));
    session.track_prefetch(batch);
    session.playhead.advance();
    Some(outcome)
}

/// Spawn the scheduled loop for `session` and hand it ownership of the ticks.
pub(crate) fn spawn_loop(shared: &Arc<Shared>, session: &mut Session, token: u64) {
    let pacing = shared.config.pacing();
    let task = session
        .runtime
        .spawn(run_loop(Arc::downgrade(shared), token, pacing));
    session.loop_token = Some(token);
    session.loop_handle = Some(TaskHandle::new(task));
    tracing::debug!(epoch = session.epoch, token, "playback loop scheduled");
}

async fn run_loop(shared: Weak<Shared>, token: u64, pacing: Pacing) {
    let driver = TickDriver::Loop { token };
    loop {
        tokio::time::sleep(pacing.slot).await;
        if let Some(delay) = pacing.throttle {
            tokio::time::sleep(delay).await;
        }
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if tick(&shared, driver).await.is_none() {
            break;
        }
    }
    tracing::trace!(token, "playback loop stopped");
}
