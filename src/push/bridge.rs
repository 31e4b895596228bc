//! Bridges between push streams and `futures` streams

use async_stream::stream;
use futures::channel::mpsc;
use futures_core::Stream as FuturesStream;
use futures_util::stream::{BoxStream, StreamExt};
use std::sync::Arc;

use super::timers::{activate, arm, emit, shut_down, spawn_timer, SharedTimer, TimerState};
use super::{close, sink, InputStream, Sink, Stream, Teardown};
use crate::signal::Signal;

/// Invokes the teardown when the consuming `futures` stream is dropped
struct CloseOnDrop(Option<Teardown>);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        close(&self.0);
    }
}

/// Registers on `stream` immediately and exposes its values as a `futures` stream.
///
/// Deliveries are queued in an unbounded channel until polled. The returned stream ends
/// with the termination signal; dropping it invokes the teardown.
pub fn into_stream<T>(stream: Stream<T>) -> BoxStream<'static, T>
where
    T: Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded();
    let Stream { input, output } = stream;
    input(sink(move |signal: Signal<T>| {
        // A dropped receiver means nobody is listening anymore
        let _ = tx.unbounded_send(signal);
    }));
    let guard = CloseOnDrop(output);

    stream! {
        let _guard = guard;
        while let Some(signal) = rx.next().await {
            match signal {
                Signal::Value(value) => {
                    yield value;
                }
                Signal::Done => break,
            }
        }
    }
    .boxed()
}

/// Drives a `futures` stream on a Tokio task once a consumer registers.
///
/// Every item is delivered as a value, followed by the termination signal when the source
/// ends. The teardown aborts the task and delivers the termination signal if it has not
/// been delivered yet.
pub fn from_stream<S, T>(source: S) -> Stream<T>
where
    S: FuturesStream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    let state: SharedTimer<T> = TimerState::shared();

    let input: InputStream<T> = {
        let state = state.clone();
        Box::new(move |downstream: Sink<T>| {
            if let Err(downstream) = activate(&state, downstream) {
                downstream(Signal::Done);
                return;
            }
            match spawn_timer("from_stream", drive(source, state.clone())) {
                Some(handle) => arm(&state, handle),
                None => shut_down(&state),
            }
        })
    };

    let teardown: Teardown = Arc::new(move |()| shut_down(&state));
    Stream::with_teardown(input, teardown)
}

async fn drive<S, T>(source: S, state: SharedTimer<T>)
where
    S: FuturesStream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    let mut source = Box::pin(source);
    while let Some(item) = source.next().await {
        if !emit(&state, item) {
            return;
        }
    }
    shut_down(&state);
}
