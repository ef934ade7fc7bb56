//! Streaming calls: one spawned worker per call feeding a [`StreamHandle`].
//!
//! The worker owns the byte source and the [`EventFramer`]. The family's
//! state machine lives in a `watch` channel and each event is applied to it
//! in place, so observers see the live response without the worker copying
//! it. Fragments go out on one lane and at most one error on another. Both
//! lanes close when the worker returns, whatever the reason.

use bytes::Bytes;
use futures_util::{
    StreamExt,
    stream::{BoxStream, Stream},
};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, trace, warn};

use crate::{
    error::AnthropicRequestError,
    sse::{EventFramer, RawEvent},
};

/// Raw response body as delivered by a [`Transport`](crate::internal::Transport).
pub type ByteStream = BoxStream<'static, Result<Bytes, AnthropicRequestError>>;

const FRAGMENT_BUFFER: usize = 64;

/// An event-family interpreter.
///
/// `apply` advances the state in place and returns the fragment the event
/// produced, if any. Implementations do no I/O.
pub trait StreamMachine: Sized + Send + Sync + 'static {
    type Response: Send + 'static;
    type Fragment: Send + 'static;

    fn start() -> Self;

    fn apply(
        &mut self,
        event: &RawEvent,
    ) -> Result<Option<Self::Fragment>, AnthropicRequestError>;

    /// The family's terminal event has been applied.
    fn is_done(&self) -> bool;

    /// A copy of the response as accumulated so far.
    fn snapshot(&self) -> Self::Response;

    fn into_response(self) -> Self::Response;
}

/// Fold a complete event sequence through a machine without any I/O.
pub fn replay<M: StreamMachine>(
    events: impl IntoIterator<Item = RawEvent>,
) -> Result<(M::Response, Vec<M::Fragment>), AnthropicRequestError> {
    let mut state = M::start();
    let mut fragments = Vec::new();
    for event in events {
        if state.is_done() {
            break;
        }
        fragments.extend(state.apply(&event)?);
    }
    if !state.is_done() {
        return Err(AnthropicRequestError::IncompleteStream);
    }
    Ok((state.into_response(), fragments))
}

/// The consumer side of a streaming call.
///
/// Pull fragments with [`next`](Self::next) until it returns `None`. An error,
/// if any, is the last item. Dropping the handle cancels the worker.
pub struct StreamHandle<M: StreamMachine> {
    fragments: mpsc::Receiver<M::Fragment>,
    errors: mpsc::Receiver<AnthropicRequestError>,
    state: watch::Receiver<M>,
    cancel: CancellationToken,
    finished: bool,
    _guard: DropGuard,
}

impl<M: StreamMachine> StreamHandle<M> {
    /// Start a worker over `bytes`. Cancelling `cancel` (or any parent of it)
    /// stops the worker; dropping the handle only cancels this call.
    pub fn spawn(bytes: ByteStream, cancel: &CancellationToken) -> Self {
        let token = cancel.child_token();
        let (fragment_tx, fragment_rx) = mpsc::channel(FRAGMENT_BUFFER);
        let (error_tx, error_rx) = mpsc::channel(1);
        let (state_tx, state_rx) = watch::channel(M::start());

        tokio::spawn(run::<M>(
            bytes,
            token.clone(),
            fragment_tx,
            error_tx,
            state_tx,
        ));

        Self {
            fragments: fragment_rx,
            errors: error_rx,
            state: state_rx,
            cancel: token.clone(),
            finished: false,
            _guard: token.drop_guard(),
        }
    }

    /// The next fragment, or the call's single error, or `None` once both
    /// lanes are closed.
    ///
    /// Fragments already produced are delivered before an error. After
    /// [`cancel`](Self::cancel) no further fragments are returned.
    pub async fn next(&mut self) -> Option<Result<M::Fragment, AnthropicRequestError>> {
        if self.finished {
            return None;
        }

        if self.cancel.is_cancelled() {
            self.fragments.close();
            while self.fragments.recv().await.is_some() {}
            self.finished = true;
            return self.errors.recv().await.map(Err);
        }

        tokio::select! {
            biased;
            fragment = self.fragments.recv() => match fragment {
                Some(fragment) => Some(Ok(fragment)),
                None => {
                    self.finished = true;
                    self.errors.recv().await.map(Err)
                }
            },
            error = self.errors.recv() => {
                self.finished = true;
                error.map(Err)
            }
        }
    }

    /// Ask the worker to stop. It reports a single
    /// [`Cancelled`](AnthropicRequestError::Cancelled) error unless it had
    /// already finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// A copy of the response accumulated so far.
    pub fn response(&self) -> M::Response {
        self.state.borrow().snapshot()
    }

    /// A receiver over the live state, notified after every event.
    ///
    /// The worker waits for outstanding borrows before applying the next
    /// event, so do not hold one across an `.await`.
    pub fn watch(&self) -> watch::Receiver<M> {
        self.state.clone()
    }

    /// Drain the call and return the final response, or the first error.
    pub async fn finish(mut self) -> Result<M::Response, AnthropicRequestError> {
        while let Some(item) = self.next().await {
            item?;
        }
        Ok(self.response())
    }

    pub fn into_stream(
        mut self,
    ) -> impl Stream<Item = Result<M::Fragment, AnthropicRequestError>> + Send + 'static {
        async_stream::stream! {
            while let Some(item) = self.next().await {
                yield item;
            }
        }
    }

    pub fn boxed(self) -> BoxStream<'static, Result<M::Fragment, AnthropicRequestError>> {
        self.into_stream().boxed()
    }
}

impl<M: StreamMachine> std::fmt::Debug for StreamHandle<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("finished", &self.finished)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

async fn run<M: StreamMachine>(
    mut bytes: ByteStream,
    cancel: CancellationToken,
    fragment_tx: mpsc::Sender<M::Fragment>,
    error_tx: mpsc::Sender<AnthropicRequestError>,
    state_tx: watch::Sender<M>,
) {
    let result = drive::<M>(&mut bytes, &cancel, &fragment_tx, &state_tx).await;
    drop(bytes);
    drop(fragment_tx);

    if let Err(error) = result {
        if error.is_cancelled() {
            debug!("stream cancelled");
        } else {
            warn!(error = %error, "stream failed");
        }
        // Capacity 1 and a single send: never waits.
        let _ = error_tx.send(error).await;
    }
}

async fn drive<M: StreamMachine>(
    bytes: &mut ByteStream,
    cancel: &CancellationToken,
    fragment_tx: &mpsc::Sender<M::Fragment>,
    state_tx: &watch::Sender<M>,
) -> Result<(), AnthropicRequestError> {
    let mut framer = EventFramer::new();

    loop {
        let chunk = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AnthropicRequestError::Cancelled),
            chunk = bytes.next() => chunk,
        };

        let (events, eof) = match chunk {
            Some(chunk) => (framer.push(&chunk?)?, false),
            None => (framer.finish()?.into_iter().collect(), true),
        };

        for event in events {
            trace!(event = %event.event, "stream event");
            let mut applied = Ok(None);
            let mut done = false;
            state_tx.send_modify(|state| {
                applied = state.apply(&event);
                done = state.is_done();
            });

            if let Some(fragment) = applied? {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(AnthropicRequestError::Cancelled),
                    sent = fragment_tx.send(fragment) => {
                        if sent.is_err() {
                            return Err(AnthropicRequestError::Cancelled);
                        }
                    }
                }
            }

            if done {
                debug!(event = %event.event, "stream complete");
                return Ok(());
            }
        }

        if eof {
            return Err(AnthropicRequestError::IncompleteStream);
        }
    }
}
