//! Asynchronous push streams
//!
//! A push stream is registered once with a [`Sink`] and then delivers values to it over
//! time, from timers, from an external source or synchronously during registration.
//! Every registration ends with exactly one [`Signal::Done`] and nothing after it.
//!
//! The consumer side of a stream is an optional [`Teardown`]: calling it asks the producer
//! to stop. Timer-driven producers guard against repeated teardown calls, so calling it
//! twice is a no-op.
//!
//! Combinators are curried (`map(f)(stream)`) so they compose with [`pipe!`](crate::pipe!),
//! and are also available as chained methods on [`Stream`].

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures_util::stream::BoxStream;

use crate::error::{lock, StreamError, StreamResult};
use crate::pull;
use crate::signal::Signal;
use crate::stream_configuration::TapConfig;

pub mod bridge;
pub mod combinators;
pub mod timers;

pub use bridge::{from_stream, into_stream};
pub use combinators::{
    blabber, log, silence, silence_async, take, take_with, tap, tap_with, tap_with_config,
};
pub use timers::{interruptable_wait, interval, interval_with_config, timeout, wait};

/// Consumer callback a push producer delivers signals to
pub type Sink<T> = Arc<dyn Fn(Signal<T>) + Send + Sync>;

/// Push producer: registering a sink starts production
pub type InputStream<T> = Box<dyn FnOnce(Sink<T>) + Send>;

/// Consumer-side hook of a pipe
pub type OutputStream<B> = Arc<dyn Fn(B) + Send + Sync>;

/// Hook that asks a producer to stop
pub type Teardown = OutputStream<()>;

/// A producer paired with a synchronous consumer-side hook
pub struct Pipe<A, B> {
    pub input: InputStream<A>,
    pub output: OutputStream<B>,
}

pub type SymmetricPipe<T> = Pipe<T, T>;

/// A pipe whose hook carries no payload, e.g. the teardown of `interval`
pub type Connection<T> = Pipe<T, ()>;

/// A producer paired with an asynchronous consumer-side producer
pub struct AsyncPipe<A, B> {
    pub input: InputStream<A>,
    pub output: InputStream<B>,
}

pub type AsyncSymmetricPipe<T> = AsyncPipe<T, T>;
pub type AsyncConnection<T> = AsyncPipe<T, ()>;

/// A push producer with its optional teardown
pub struct Stream<T> {
    pub input: InputStream<T>,
    pub output: Option<Teardown>,
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("input", &"<producer>")
            .field(
                "output",
                &if self.output.is_some() { "Some(Teardown)" } else { "None" },
            )
            .finish()
    }
}

impl<T> From<Connection<T>> for Stream<T> {
    fn from(connection: Connection<T>) -> Self {
        Stream {
            input: connection.input,
            output: Some(connection.output),
        }
    }
}

/// Wraps a closure as a [`Sink`].
pub fn sink<T, F>(f: F) -> Sink<T>
where
    F: Fn(Signal<T>) + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn close(output: &Option<Teardown>) {
    if let Some(teardown) = output {
        teardown(());
    }
}

// ================================
// Constructors
// ================================

/// Delivers `value` and then the termination signal during registration.
pub fn pure<T>(value: T) -> Stream<T>
where
    T: Send + 'static,
{
    Stream::new(Box::new(move |downstream: Sink<T>| {
        downstream(Signal::Value(value));
        downstream(Signal::Done);
    }))
}

/// A stream that never delivers anything. Its sink is dropped on registration, so a
/// terminal operation on it resolves to [`StreamError::Abandoned`].
pub fn never<T>() -> Stream<T>
where
    T: Send + 'static,
{
    Stream::new(Box::new(|_downstream: Sink<T>| {}))
}

/// Drains a pull stream during registration, forwarding every signal.
///
/// There is no yielding between values: the whole pull stream is consumed before
/// registration returns, so it must be finite.
pub fn from_sync<T>(mut stream: pull::InputStream<T>) -> Stream<T>
where
    T: Send + 'static,
{
    Stream::new(Box::new(move |downstream: Sink<T>| loop {
        let signal = stream();
        let done = signal.is_done();
        downstream(signal);
        if done {
            break;
        }
    }))
}

/// Delivers every element in order, then the termination signal, during registration.
pub fn from_array<I, T>(items: I) -> Stream<T>
where
    I: IntoIterator<Item = T> + Send + 'static,
    T: Send + 'static,
{
    Stream::new(Box::new(move |downstream: Sink<T>| {
        for item in items {
            downstream(Signal::Value(item));
        }
        downstream(Signal::Done);
    }))
}

// ================================
// Transformations
// ================================

/// Applies `f` to every value; the termination signal and the teardown pass through.
pub fn map<A, B, F>(f: F) -> impl FnOnce(Stream<A>) -> Stream<B>
where
    F: Fn(A) -> B + Send + Sync + 'static,
    A: Send + 'static,
    B: Send + 'static,
{
    move |stream: Stream<A>| -> Stream<B> {
        let Stream { input, output } = stream;
        Stream {
            input: Box::new(move |downstream: Sink<B>| {
                input(sink(move |signal: Signal<A>| downstream(signal.map(&f))))
            }),
            output,
        }
    }
}

/// Forwards values satisfying `predicate`; the termination signal always passes.
pub fn filter<T, F>(predicate: F) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
    T: Send + 'static,
{
    move |stream: Stream<T>| -> Stream<T> {
        let Stream { input, output } = stream;
        Stream {
            input: Box::new(move |downstream: Sink<T>| {
                input(sink(move |signal: Signal<T>| match signal {
                    Signal::Value(ref value) if !predicate(value) => {}
                    signal => downstream(signal),
                }))
            }),
            output,
        }
    }
}

// ================================
// Terminal operations
// ================================

/// Future resolving once with the result of a terminal operation
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Fold<A> {
    receiver: oneshot::Receiver<A>,
}

impl<A> Future for Fold<A> {
    type Output = StreamResult<A>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map_err(StreamError::from)
    }
}

struct FoldState<A, B, F> {
    acc: Option<A>,
    f: Option<F>,
    /// Values delivered while `f` runs, folded by the same caller afterwards
    pending: VecDeque<B>,
    ended: bool,
    resolve: Option<oneshot::Sender<A>>,
}

impl<A, B, F> FoldState<A, B, F> {
    /// Hands out the accumulator once the stream ended and no fold is running.
    fn settle(&mut self) -> Option<(A, oneshot::Sender<A>)> {
        if !self.ended || self.f.is_none() {
            return None;
        }
        self.acc.take().zip(self.resolve.take())
    }
}

/// Registers on the stream immediately and folds every value into `init`.
///
/// When the termination signal arrives the stream's teardown (if any) is invoked and the
/// returned future resolves with the accumulator. Later deliveries are ignored. `f` runs
/// without any lock held, so it may tear down the producer it is folding.
pub fn reduce<A, B, F>(f: F, init: A) -> impl FnOnce(Stream<B>) -> Fold<A>
where
    F: FnMut(A, B) -> A + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
{
    move |stream: Stream<B>| -> Fold<A> {
        let (resolve, receiver) = oneshot::channel();
        let state = Mutex::new(FoldState {
            acc: Some(init),
            f: Some(f),
            pending: VecDeque::new(),
            ended: false,
            resolve: Some(resolve),
        });
        let Stream { input, output } = stream;

        input(sink(move |signal: Signal<B>| {
            let settled = match signal {
                Signal::Value(value) => {
                    let taken = {
                        let mut state = lock(&state);
                        if state.ended {
                            return;
                        }
                        match state.f.take() {
                            Some(f) => state.acc.take().map(|acc| (acc, f)),
                            None => {
                                state.pending.push_back(value);
                                return;
                            }
                        }
                    };
                    let Some((mut acc, mut f)) = taken else {
                        return;
                    };
                    let mut value = value;
                    loop {
                        acc = f(acc, value);
                        let mut state = lock(&state);
                        match state.pending.pop_front() {
                            Some(next) => value = next,
                            None => {
                                state.acc = Some(acc);
                                state.f = Some(f);
                                break state.settle();
                            }
                        }
                    }
                }
                Signal::Done => {
                    let mut state = lock(&state);
                    if state.ended {
                        return;
                    }
                    state.ended = true;
                    let settled = state.settle();
                    settled
                }
            };

            if let Some((acc, resolve)) = settled {
                close(&output);
                // The caller may have dropped the future; nothing to report then.
                let _ = resolve.send(acc);
            }
        }));

        Fold { receiver }
    }
}

/// Collects every value in delivery order.
pub fn to_array<T>(stream: Stream<T>) -> Fold<Vec<T>>
where
    T: Send + 'static,
{
    reduce(
        |mut items: Vec<T>, item: T| {
            items.push(item);
            items
        },
        Vec::new(),
    )(stream)
}

// ================================
// Method-style combinators
// ================================

impl<T> Stream<T>
where
    T: Send + 'static,
{
    /// A stream without teardown
    pub fn new(input: InputStream<T>) -> Self {
        Stream {
            input,
            output: None,
        }
    }

    /// A stream whose consumer can stop the producer through `teardown`
    pub fn with_teardown(input: InputStream<T>, teardown: Teardown) -> Self {
        Stream {
            input,
            output: Some(teardown),
        }
    }

    /// Registers `f` as the consumer and hands back the teardown.
    pub fn subscribe<F>(self, f: F) -> Option<Teardown>
    where
        F: Fn(Signal<T>) + Send + Sync + 'static,
    {
        (self.input)(sink(f));
        self.output
    }

    pub fn map<U, F>(self, f: F) -> Stream<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
        U: Send + 'static,
    {
        map(f)(self)
    }

    pub fn filter<F>(self, predicate: F) -> Stream<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        filter(predicate)(self)
    }

    pub fn take(self, n: usize) -> Stream<T> {
        take(n)(self)
    }

    pub fn take_with(self, n: usize, close_on_end: bool) -> Stream<T> {
        take_with(n, close_on_end)(self)
    }

    pub fn interruptable_wait(self, ms: u64) -> Connection<T> {
        interruptable_wait(ms)(self)
    }

    pub fn wait(self, ms: u64) -> Stream<T> {
        wait(ms)(self)
    }

    pub fn timeout(self, ms: u64) -> Stream<T> {
        timeout(ms)(self)
    }

    pub fn tap_with<F>(self, observer: F) -> Stream<T>
    where
        F: Fn(&Signal<T>) + Send + Sync + 'static,
    {
        tap_with(observer)(self)
    }

    pub fn reduce<A, F>(self, f: F, init: A) -> Fold<A>
    where
        F: FnMut(A, T) -> A + Send + 'static,
        A: Send + 'static,
    {
        reduce(f, init)(self)
    }

    pub fn to_array(self) -> Fold<Vec<T>> {
        to_array(self)
    }

    pub fn into_stream(self) -> BoxStream<'static, T> {
        into_stream(self)
    }
}

impl<T> Stream<T>
where
    T: fmt::Debug + Send + 'static,
{
    pub fn tap(self) -> Stream<T> {
        tap(self)
    }

    pub fn tap_with_config(self, config: TapConfig) -> Stream<T> {
        tap_with_config(config)(self)
    }

    pub fn log(self) {
        log(self)
    }
}
