//! Counting and debugging combinators, plus pipe accessors

use std::fmt;
use std::sync::Mutex;

use super::{sink, AsyncPipe, InputStream, OutputStream, Pipe, Sink, Stream};
use crate::error::lock;
use crate::signal::Signal;
use crate::stream_configuration::TapConfig;

struct TakeState {
    seen: usize,
    done: bool,
}

/// Forwards the first `n` values, then the termination signal, and closes upstream.
///
/// Same as `take_with(n, true)`.
pub fn take<T>(n: usize) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: Send + 'static,
{
    take_with(n, true)
}

/// Forwards the first `n` values.
///
/// The termination signal is forwarded exactly once: on the `n + 1`-th delivery, or when
/// upstream finishes early. With `close_on_end` the upstream teardown is invoked at that
/// point and the returned stream carries none; otherwise the upstream teardown is handed
/// back to the caller untouched.
pub fn take_with<T>(n: usize, close_on_end: bool) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: Send + 'static,
{
    move |stream: Stream<T>| -> Stream<T> {
        let Stream { input, output } = stream;
        let (upstream, output) = if close_on_end {
            (output, None)
        } else {
            (None, output)
        };

        let input: InputStream<T> = Box::new(move |downstream: Sink<T>| {
            let state = Mutex::new(TakeState {
                seen: 0,
                done: false,
            });
            input(sink(move |signal: Signal<T>| {
                let finish = {
                    let mut state = lock(&state);
                    if state.done {
                        return;
                    }
                    match signal {
                        Signal::Value(_) if state.seen < n => {
                            state.seen += 1;
                            false
                        }
                        _ => {
                            state.done = true;
                            true
                        }
                    }
                };

                if finish {
                    log::debug!("take({}) reached its end, closing", n);
                    downstream(Signal::Done);
                    super::close(&upstream);
                } else {
                    downstream(signal);
                }
            }));
        });

        Stream { input, output }
    }
}

fn debug_observer<T>(config: TapConfig) -> impl Fn(&Signal<T>) + Send + Sync + 'static
where
    T: fmt::Debug + 'static,
{
    move |signal: &Signal<T>| match signal {
        Signal::Value(value) => {
            log::log!(target: config.target.as_str(), config.level, "{:?}", value)
        }
        Signal::Done => log::log!(target: config.target.as_str(), config.level, "\u{2404}"),
    }
}

/// Reports every signal to `observer` before forwarding it downstream.
///
/// Registration stays one-shot: the observer sees exactly the signals the downstream
/// consumer sees, in the same order.
pub fn tap_with<T, F>(observer: F) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    F: Fn(&Signal<T>) + Send + Sync + 'static,
    T: Send + 'static,
{
    move |stream: Stream<T>| -> Stream<T> {
        let Stream { input, output } = stream;
        Stream {
            input: Box::new(move |downstream: Sink<T>| {
                input(sink(move |signal: Signal<T>| {
                    observer(&signal);
                    downstream(signal);
                }))
            }),
            output,
        }
    }
}

pub fn tap_with_config<T>(config: TapConfig) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: fmt::Debug + Send + 'static,
{
    tap_with(debug_observer(config))
}

/// Logs every signal of `stream` and passes the stream on.
pub fn tap<T>(stream: Stream<T>) -> Stream<T>
where
    T: fmt::Debug + Send + 'static,
{
    tap_with_config(TapConfig::default())(stream)
}

/// Registers a logging consumer as the only consumer of `stream`.
pub fn log<T>(stream: Stream<T>)
where
    T: fmt::Debug + Send + 'static,
{
    let observer = debug_observer::<T>(TapConfig::default());
    (stream.input)(sink(move |signal: Signal<T>| observer(&signal)));
}

/// The production side of a pipe
pub fn blabber<A, B>(pipe: Pipe<A, B>) -> InputStream<A> {
    pipe.input
}

/// The consumption side of a pipe
pub fn silence<A, B>(pipe: Pipe<A, B>) -> OutputStream<B> {
    pipe.output
}

/// The consumption side of an asynchronous pipe
pub fn silence_async<A, B>(pipe: AsyncPipe<A, B>) -> InputStream<B> {
    pipe.output
}
