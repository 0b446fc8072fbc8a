use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::assets::loader::FrameLoader;
use crate::foundation::config::PlayerConfig;
use crate::foundation::core::{FrameIndex, SurfaceSize, fit_surface};
use crate::foundation::error::{PlayerError, PlayerResult};
use crate::overlay::geometry::OverlayGeometry;
use crate::playback::cache::{FrameCache, lock};
use crate::playback::interaction::{PointerEvent, hit_test};
use crate::playback::prefetch::{LoadCounters, Prefetcher};
use crate::playback::scheduler::{TickDriver, spawn_loop, tick};
use crate::playback::session::{Playhead, Session, TaskHandle};
use crate::render::renderer::{DrawOutcome, Renderer};
use crate::render::surface::DrawSurface;

/// Counters accumulated over the lifetime of a [`Player`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PlaybackStats {
    pub ticks: u64,
    pub frames_drawn: u64,
    /// Ticks whose frame was not cached or had no surface to draw on.
    pub frames_skipped: u64,
    pub loads_ok: u64,
    pub loads_failed: u64,
}

pub(crate) struct PlayerState {
    pub(crate) surface: Option<Box<dyn DrawSurface>>,
    pub(crate) session: Option<Session>,
    pub(crate) stats: PlaybackStats,
}

pub(crate) struct Shared {
    pub(crate) config: PlayerConfig,
    pub(crate) loader: FrameLoader,
    pub(crate) renderer: Renderer,
    pub(crate) counters: Arc<LoadCounters>,
    state: Mutex<PlayerState>,
    next_token: AtomicU64,
}

impl Shared {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, PlayerState> {
        lock(&self.state)
    }

    fn next_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn set_paused(self: &Arc<Self>, session: &mut Session, paused: bool) -> bool {
        if session.paused == paused {
            return false;
        }
        session.paused = paused;
        if paused {
            session.cancel_loop();
            tracing::info!(epoch = session.epoch, "playback paused");
        } else {
            if !session.stepped && session.loop_handle.is_none() {
                spawn_loop(self, session, self.next_token());
            }
            tracing::info!(epoch = session.epoch, "playback resumed");
        }
        true
    }

    fn handle_click(self: &Arc<Self>, x: f64, y: f64, epoch: Option<u64>) -> bool {
        let mut state = self.lock_state();
        if state.surface.is_none() {
            return false;
        }
        let Some(session) = state
            .session
            .as_mut()
            .filter(|s| epoch.is_none_or(|e| s.epoch == e))
        else {
            return false;
        };
        if !hit_test(session.geometry.as_ref(), x, y) {
            tracing::trace!(x, y, "click missed overlay");
            return false;
        }
        let paused = !session.paused;
        self.set_paused(session, paused)
    }
}

/// Frame-sequence player: owns the surface, the mounted session and its background tasks.
///
/// Every method takes `&self`; state lives behind one lock that is never held across an await.
/// Mounting needs a tokio runtime; the loop, pointer listener, overlay load and prefetch batches
/// are spawned onto it.
pub struct Player {
    shared: Arc<Shared>,
}

impl Player {
    /// Create an unmounted player. `config` is validated.
    pub fn new(config: PlayerConfig, loader: FrameLoader) -> PlayerResult<Self> {
        config.validate()?;
        let renderer = Renderer::from_config(&config);
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                loader,
                renderer,
                counters: Arc::new(LoadCounters::default()),
                state: Mutex::new(PlayerState {
                    surface: None,
                    session: None,
                    stats: PlaybackStats::default(),
                }),
                next_token: AtomicU64::new(0),
            }),
        })
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.shared.config
    }

    pub fn attach_surface(&self, surface: Box<dyn DrawSurface>) -> Option<Box<dyn DrawSurface>> {
        self.shared.lock_state().surface.replace(surface)
    }

    /// Detach the drawing surface. Draws and clicks are no-ops until one is attached again.
    pub fn detach_surface(&self) -> Option<Box<dyn DrawSurface>> {
        self.shared.lock_state().surface.take()
    }

    /// Start a session driven by the scheduled loop.
    ///
    /// The playhead starts at frame 1 with an empty cache, the first window is requested and the
    /// overlay starts loading. An existing session is torn down first.
    pub fn mount(&self) -> PlayerResult<()> {
        self.mount_session(false)
    }

    /// Start a session that only advances through [`Player::tick_once`].
    pub fn mount_stepped(&self) -> PlayerResult<()> {
        self.mount_session(true)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn mount_session(&self, stepped: bool) -> PlayerResult<()> {
        let runtime = Handle::try_current()
            .map_err(|_| PlayerError::validation("mounting a player requires a tokio runtime"))?;
        let shared = &self.shared;
        let config = &shared.config;

        let mut state = shared.lock_state();
        if let Some(previous) = state.session.take() {
            previous.teardown();
        }

        let epoch = shared.next_token();
        let weak = Arc::downgrade(shared);
        let cache = FrameCache::shared();
        let prefetcher = Prefetcher::new(
            shared.loader.clone(),
            config.preload_window,
            config.total_frames,
            Arc::clone(&cache),
            Arc::clone(&shared.counters),
            runtime.clone(),
        );

        let (pointer_tx, pointer_rx) = mpsc::unbounded_channel();
        let listener = runtime.spawn(listen(weak.clone(), epoch, pointer_rx));
        let overlay_task = runtime.spawn(load_overlay(weak, shared.loader.clone(), epoch));
        let first_batch = prefetcher.request_window(FrameIndex::FIRST.get());

        let mut session = Session {
            epoch,
            runtime,
            stepped,
            paused: false,
            playhead: Playhead::new(config.total_frames),
            cache,
            prefetcher,
            overlay: None,
            geometry: None,
            pointer_tx,
            loop_handle: None,
            loop_token: None,
            listener: Some(TaskHandle::new(listener)),
            overlay_task: Some(TaskHandle::new(overlay_task)),
            pending_prefetch: first_batch,
        };
        if !stepped {
            spawn_loop(shared, &mut session, shared.next_token());
        }
        state.session = Some(session);

        tracing::info!(
            epoch,
            total_frames = config.total_frames,
            preload_window = config.preload_window,
            miss_policy = ?config.miss_policy,
            "player mounted"
        );
        Ok(())
    }

    /// Tear the session down: cancel the loop and listener, drop the overlay and clear the cache.
    /// No tick runs afterwards.
    pub fn unmount(&self) {
        let session = self.shared.lock_state().session.take();
        if let Some(session) = session {
            let epoch = session.epoch;
            session.teardown();
            tracing::info!(epoch, "player unmounted");
        }
    }

    /// Pause playback. Returns whether the state changed.
    pub fn pause(&self) -> bool {
        self.with_session(|shared, session| shared.set_paused(session, true))
            .unwrap_or(false)
    }

    /// Resume playback, scheduling exactly one loop. Returns whether the state changed.
    pub fn resume(&self) -> bool {
        self.with_session(|shared, session| shared.set_paused(session, false))
            .unwrap_or(false)
    }

    /// Flip between running and paused. Returns the new paused flag, or `None` when unmounted.
    pub fn toggle_paused(&self) -> Option<bool> {
        self.with_session(|shared, session| {
            let paused = !session.paused;
            shared.set_paused(session, paused);
            paused
        })
    }

    /// Handle a click at surface-local `(x, y)`: toggles pause when it lands on the overlay.
    /// Returns whether the click toggled.
    pub fn click(&self, x: f64, y: f64) -> bool {
        self.shared.handle_click(x, y, None)
    }

    /// Sender feeding the session's pointer listener. Events sent after unmount are dropped.
    pub fn pointer_sender(&self) -> Option<mpsc::UnboundedSender<PointerEvent>> {
        self.shared
            .lock_state()
            .session
            .as_ref()
            .map(|s| s.pointer_tx.clone())
    }

    /// Fit the surface into a `container_width` x `container_height` layout box, preserving the
    /// sequence aspect ratio. Returns the new size, or `None` when no surface is attached.
    pub fn resize(
        &self,
        container_width: f64,
        container_height: f64,
    ) -> PlayerResult<Option<SurfaceSize>> {
        let size = fit_surface(
            container_width,
            container_height,
            self.shared.config.base_size(),
        );
        let mut state = self.shared.lock_state();
        let Some(surface) = state.surface.as_mut() else {
            return Ok(None);
        };
        surface.resize(size)?;
        tracing::debug!(width = size.width, height = size.height, "surface resized");
        Ok(Some(size))
    }

    /// Run a single tick now. Returns `None` when unmounted or paused.
    pub async fn tick_once(&self) -> Option<DrawOutcome> {
        let epoch = self.shared.lock_state().session.as_ref()?.epoch;
        tick(&self.shared, TickDriver::Step { epoch }).await
    }

    /// Wait until the overlay load and the most recent prefetch batch have finished.
    pub async fn settle(&self) {
        loop {
            let (overlay, batch) = {
                let mut state = self.shared.lock_state();
                let Some(session) = state.session.as_mut() else {
                    return;
                };
                (session.overlay_task.take(), session.pending_prefetch.take())
            };
            if overlay.is_none() && batch.is_none() {
                return;
            }
            if let Some(overlay) = overlay {
                overlay.join().await;
            }
            if let Some(batch) = batch
                && let Err(err) = batch.await
            {
                tracing::warn!(error = %err, "prefetch batch did not complete");
            }
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.lock_state().session.is_some()
    }

    pub fn current_frame(&self) -> Option<FrameIndex> {
        self.read_session(|s| s.playhead.current())
    }

    pub fn is_paused(&self) -> bool {
        self.read_session(|s| s.paused).unwrap_or(false)
    }

    pub fn is_running(&self) -> bool {
        self.read_session(|s| !s.paused).unwrap_or(false)
    }

    pub fn overlay_loaded(&self) -> bool {
        self.read_session(|s| s.overlay.is_some()).unwrap_or(false)
    }

    /// Hit box of the overlay as last drawn.
    pub fn overlay_geometry(&self) -> Option<OverlayGeometry> {
        self.read_session(|s| s.geometry).flatten()
    }

    pub fn cached_frames(&self) -> Vec<FrameIndex> {
        self.read_session(|s| lock(&s.cache).indices())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> PlaybackStats {
        let mut stats = self.shared.lock_state().stats;
        stats.loads_ok = self.shared.counters.ok();
        stats.loads_failed = self.shared.counters.failed();
        stats
    }

    /// Current surface size and straight RGBA8 pixels, if the surface keeps them.
    pub fn snapshot_rgba8(&self) -> Option<(SurfaceSize, Vec<u8>)> {
        let state = self.shared.lock_state();
        let surface = state.surface.as_ref()?;
        Some((surface.size(), surface.read_rgba8()?))
    }

    fn read_session<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.shared.lock_state().session.as_ref().map(f)
    }

    fn with_session<R>(&self, f: impl FnOnce(&Arc<Shared>, &mut Session) -> R) -> Option<R> {
        let mut state = self.shared.lock_state();
        state.session.as_mut().map(|s| f(&self.shared, s))
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("config", &self.shared.config)
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

async fn listen(
    shared: Weak<Shared>,
    epoch: u64,
    mut events: mpsc::UnboundedReceiver<PointerEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        match event {
            PointerEvent::Click { x, y } => {
                shared.handle_click(x, y, Some(epoch));
            }
        }
    }
}

async fn load_overlay(shared: Weak<Shared>, loader: FrameLoader, epoch: u64) {
    let loaded = loader.load_overlay().await;
    let Some(shared) = shared.upgrade() else {
        return;
    };
    match loaded {
        Ok(image) => {
            let mut state = shared.lock_state();
            if let Some(session) = state.session.as_mut().filter(|s| s.epoch == epoch) {
                session.overlay = Some(image);
                tracing::debug!(path = loader.overlay_path(), "overlay loaded");
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "overlay load failed, playing without overlay");
        }
    }
}
