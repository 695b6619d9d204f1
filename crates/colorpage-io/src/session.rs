//! Latest-request-wins rendering.
//!
//! Every parameter change starts a new render. Each render takes a
//! [`RenderTicket`] carrying a monotonically increasing generation; only
//! the render holding the newest ticket may publish its result. Renders
//! that finish after a newer one has started are dropped, so the visible
//! output always reflects the most recent request.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use colorpage_pipeline::{PipelineError, PixelBuffer, SketchConfig, Sketcher};
use parking_lot::Mutex;

/// Proof that a render was requested, tagged with its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderTicket {
    generation: u64,
}

impl RenderTicket {
    /// Position of this request in the session's sequence, starting at 1.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// A published render result.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Generation of the request that produced this image.
    pub generation: u64,
    /// Parameters actually applied (after clamping).
    pub config: SketchConfig,
    /// The finished line art.
    pub image: Arc<PixelBuffer>,
}

/// Shared state for a sequence of render requests.
#[derive(Debug, Default)]
pub struct RenderSession {
    latest: AtomicU64,
    display: Mutex<Option<Rendered>>,
}

impl RenderSession {
    /// Create a session with no requests and nothing published.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request. Every ticket handed out earlier becomes stale.
    pub fn begin(&self) -> RenderTicket {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        RenderTicket { generation }
    }

    /// Whether no newer request has started since `ticket` was issued.
    #[must_use]
    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.generation
    }

    /// Publish `image` if `ticket` is still the newest request.
    ///
    /// Returns `false` (and discards the image) when a newer request has
    /// started.
    pub fn commit(&self, ticket: RenderTicket, config: SketchConfig, image: PixelBuffer) -> bool {
        let mut display = self.display.lock();
        // Checked under the lock so an older result can never replace a
        // newer one.
        if !self.is_current(ticket) {
            tracing::debug!(
                generation = ticket.generation,
                latest = self.latest.load(Ordering::Acquire),
                "discarding stale render",
            );
            return false;
        }
        tracing::debug!(generation = ticket.generation, "render published");
        *display = Some(Rendered {
            generation: ticket.generation,
            config,
            image: Arc::new(image),
        });
        true
    }

    /// Most recently published result, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Rendered> {
        self.display.lock().clone()
    }

    /// Run the pipeline on a copy of `source` and publish the result.
    ///
    /// Skips the work entirely if `ticket` is already stale. Returns
    /// whether the result was published.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the pipeline rejects the parameters.
    /// Nothing is published in that case.
    pub fn render(
        &self,
        ticket: RenderTicket,
        source: &PixelBuffer,
        config: &SketchConfig,
    ) -> Result<bool, PipelineError> {
        if !self.is_current(ticket) {
            tracing::debug!(generation = ticket.generation, "skipping superseded render");
            return Ok(false);
        }
        let mut image = source.clone();
        let applied = Sketcher::new().run(&mut image, config)?;
        Ok(self.commit(ticket, applied, image))
    }

    /// Issue a ticket and render on a background thread.
    pub fn spawn_render(
        self: &Arc<Self>,
        source: Arc<PixelBuffer>,
        config: SketchConfig,
    ) -> (RenderTicket, JoinHandle<Result<bool, PipelineError>>) {
        let ticket = self.begin();
        let session = Arc::clone(self);
        let handle = std::thread::spawn(move || session.render(ticket, &source, &config));
        (ticket, handle)
    }
}
