//! Deliver subscriptions: one task per stream, fanned into channels.
//!
//! A subscription task opens its stream, then forwards events to a result
//! channel until the stream ends, fails, the event handler asks to stop, or
//! the cancel signal fires. Any terminal condition other than a requested
//! stop is sent once to the error channel. Many subscriptions may share the
//! same pair of channels so a caller can wait on all of them with one
//! `select!`.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::Peer;
use crate::error::{Error, Result};
use crate::lifecycle::{CancelOnDrop, CancelSignal};
use crate::protos::common::{Block, Envelope};
use crate::protos::peer::FilteredBlock;

/// Stream of decoded deliver events from one node.
pub type DeliverStream<T> = BoxStream<'static, Result<T>>;

/// Capacity of the channels created by [`Subscription`].
pub const SUBSCRIPTION_BUFFER: usize = 16;

/// Spawn a task driving one deliver stream.
///
/// `on_event` decides per event: `Continue(None)` skips it,
/// `Continue(Some(u))` forwards `u` and keeps reading, `Break(u)` forwards
/// `u` and ends the task without reporting an error.
pub fn spawn_subscription<T, U, O, F>(
    address: String,
    open: O,
    on_event: F,
    results: mpsc::Sender<U>,
    errors: mpsc::Sender<Error>,
    cancel: broadcast::Receiver<()>,
) -> JoinHandle<()>
where
    T: Send + 'static,
    U: Send + 'static,
    O: Future<Output = Result<DeliverStream<T>>> + Send + 'static,
    F: FnMut(T) -> ControlFlow<U, Option<U>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = drive(&address, open, on_event, &results, cancel).await {
            tracing::debug!(address = %address, error = %err, "subscription ended");
            let _ = errors.send(err).await;
        }
    })
}

async fn drive<T, U, O, F>(
    address: &str,
    open: O,
    mut on_event: F,
    results: &mpsc::Sender<U>,
    mut cancel: broadcast::Receiver<()>,
) -> Result<()>
where
    O: Future<Output = Result<DeliverStream<T>>>,
    F: FnMut(T) -> ControlFlow<U, Option<U>>,
{
    let cancelled = || Error::Cancelled {
        address: address.to_string(),
    };

    let mut stream = tokio::select! {
        _ = cancel.recv() => return Err(cancelled()),
        opened = open => opened?,
    };

    loop {
        let item = tokio::select! {
            _ = cancel.recv() => return Err(cancelled()),
            item = stream.next() => item,
        };
        let event = match item {
            Some(Ok(event)) => event,
            Some(Err(err)) => return Err(err),
            None => {
                return Err(Error::StreamClosed {
                    address: address.to_string(),
                })
            }
        };

        let (out, stop) = match on_event(event) {
            ControlFlow::Continue(None) => continue,
            ControlFlow::Continue(Some(out)) => (out, false),
            ControlFlow::Break(out) => (out, true),
        };
        tokio::select! {
            _ = cancel.recv() => return Err(cancelled()),
            sent = results.send(out) => {
                if sent.is_err() {
                    return Err(cancelled());
                }
            }
        }
        if stop {
            return Ok(());
        }
    }
}

/// A running subscription with its own channels.
///
/// Dropping the subscription cancels its task.
pub struct Subscription<T> {
    pub events: mpsc::Receiver<T>,
    pub errors: mpsc::Receiver<Error>,
    cancel: CancelOnDrop,
    handle: JoinHandle<()>,
}

impl<T: Send + 'static> Subscription<T> {
    fn spawn<O>(address: String, open: O) -> Self
    where
        O: Future<Output = Result<DeliverStream<T>>> + Send + 'static,
    {
        let (events_tx, events) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let (errors_tx, errors) = mpsc::channel(1);
        let signal = CancelSignal::new();
        let handle = spawn_subscription(
            address,
            open,
            |event| ControlFlow::Continue(Some(event)),
            events_tx,
            errors_tx,
            signal.subscribe(),
        );
        Self {
            events,
            errors,
            cancel: CancelOnDrop(signal),
            handle,
        }
    }

    /// Stop the task; its terminal `Cancelled` error is still delivered.
    pub fn cancel(&self) {
        self.cancel.0.trigger();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Subscribe to full blocks from `peer`.
pub fn subscribe_blocks(peer: Arc<dyn Peer>, seek: Envelope) -> Subscription<Block> {
    let address = peer.address().to_string();
    Subscription::spawn(address, async move { peer.deliver(seek).await })
}

/// Subscribe to filtered blocks from `peer`.
pub fn subscribe_filtered(peer: Arc<dyn Peer>, seek: Envelope) -> Subscription<FilteredBlock> {
    let address = peer.address().to_string();
    Subscription::spawn(address, async move { peer.deliver_filtered(seek).await })
}
