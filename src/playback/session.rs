use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::assets::decode::DecodedImage;
use crate::foundation::core::FrameIndex;
use crate::overlay::geometry::OverlayGeometry;
use crate::playback::cache::{SharedCache, lock};
use crate::playback::interaction::PointerEvent;
use crate::playback::prefetch::{BatchReport, Prefetcher};

/// Position of the playback loop within a `1..=total` sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Playhead {
    current: u32,
    total: u32,
}

impl Playhead {
    pub fn new(total: u32) -> Self {
        Self {
            current: 1,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> FrameIndex {
        FrameIndex(self.current)
    }

    /// Step to the next frame, wrapping from the last frame back to the first.
    pub fn advance(&mut self) -> FrameIndex {
        self.current = if self.current >= self.total {
            1
        } else {
            self.current + 1
        };
        self.current()
    }
}

/// Owns a spawned task and aborts it when dropped.
#[derive(Debug)]
pub struct TaskHandle {
    inner: JoinHandle<()>,
}

impl TaskHandle {
    pub fn new(inner: JoinHandle<()>) -> Self {
        Self { inner }
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Wait for the task to end. Consumes the handle so it is never polled twice.
    pub async fn join(mut self) {
        if let Err(err) = (&mut self.inner).await
            && err.is_panic()
        {
            tracing::error!(error = %err, "player task panicked");
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.inner.abort();
    }
}

/// Everything owned by one mount of the player. Dropping it is the teardown: scheduled and
/// listening tasks are aborted with their handles.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) epoch: u64,
    pub(crate) runtime: Handle,
    /// Driven by explicit steps only; resuming never schedules a loop.
    pub(crate) stepped: bool,
    pub(crate) paused: bool,
    pub(crate) playhead: Playhead,
    pub(crate) cache: SharedCache,
    pub(crate) prefetcher: Prefetcher,
    pub(crate) overlay: Option<DecodedImage>,
    pub(crate) geometry: Option<OverlayGeometry>,
    pub(crate) pointer_tx: mpsc::UnboundedSender<PointerEvent>,
    pub(crate) loop_handle: Option<TaskHandle>,
    /// Token of the loop allowed to tick; `None` while no loop is scheduled.
    pub(crate) loop_token: Option<u64>,
    pub(crate) listener: Option<TaskHandle>,
    pub(crate) overlay_task: Option<TaskHandle>,
    pub(crate) pending_prefetch: Option<JoinHandle<BatchReport>>,
}

impl Session {
    /// Keep the handle of the newest batch so callers can wait for it.
    pub(crate) fn track_prefetch(&mut self, batch: Option<JoinHandle<BatchReport>>) {
        if let Some(batch) = batch {
            self.pending_prefetch = Some(batch);
        }
    }

    /// Cancel the scheduled loop, if any.
    pub(crate) fn cancel_loop(&mut self) -> bool {
        self.loop_token = None;
        self.loop_handle.take().is_some()
    }

    pub(crate) fn teardown(mut self) {
        self.cancel_loop();
        self.listener.take();
        self.overlay_task.take();
        lock(&self.cache).clear();
        tracing::debug!(epoch = self.epoch, "session torn down");
    }
}
