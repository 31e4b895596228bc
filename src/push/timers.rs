//! Timer-driven push combinators
//!
//! Every combinator here owns its timer exclusively and runs the same life cycle:
//! `Idle` until a consumer registers, `Active` while the timer is armed, `Closed` once the
//! deadline fired or the teardown was invoked. `Closed` is terminal: late timer callbacks
//! and repeated teardown calls do nothing.
//!
//! Timers are Tokio tasks. State is shared between the task, the upstream callback and the
//! teardown through an `Arc<Mutex<_>>` that is never held while a sink or teardown runs, so
//! a consumer may call back into the combinator from inside a delivery.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use super::{sink, Connection, InputStream, Pipe, Sink, Stream, Teardown};
use crate::error::{lock, StreamResult};
use crate::signal::Signal;
use crate::stream_configuration::IntervalConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Active,
    Closed,
}

/// State of a producer driven by a single timer task
///
/// Deliveries go through `queue` and are handed to the sink by one thread at a time, the
/// one that finds `draining` unset. Signals pushed meanwhile, including re-entrant ones from
/// inside the sink, are delivered by that same thread in order. The termination signal is
/// queued like any value, so nothing queued after it is ever delivered.
pub(crate) struct TimerState<T> {
    phase: Phase,
    sink: Option<Sink<T>>,
    timer: Option<JoinHandle<()>>,
    queue: VecDeque<Signal<T>>,
    draining: bool,
}

pub(crate) type SharedTimer<T> = Arc<Mutex<TimerState<T>>>;

impl<T> TimerState<T> {
    pub(crate) fn shared() -> SharedTimer<T> {
        Arc::new(Mutex::new(TimerState {
            phase: Phase::Idle,
            sink: None,
            timer: None,
            queue: VecDeque::new(),
            draining: false,
        }))
    }

    /// Queues `signal` and reports whether the caller has to drain the queue.
    fn enqueue(&mut self, signal: Signal<T>) -> bool {
        self.queue.push_back(signal);
        if self.draining {
            return false;
        }
        self.draining = true;
        true
    }
}

/// Moves `Idle -> Active`. A producer that is no longer idle hands the sink back.
pub(crate) fn activate<T>(state: &SharedTimer<T>, downstream: Sink<T>) -> Result<(), Sink<T>> {
    let mut state = lock(state);
    if state.phase != Phase::Idle {
        return Err(downstream);
    }
    state.phase = Phase::Active;
    state.sink = Some(downstream);
    Ok(())
}

/// Keeps the timer handle if the producer is still running, cancels it otherwise.
pub(crate) fn arm<T>(state: &SharedTimer<T>, handle: JoinHandle<()>) {
    let mut state = lock(state);
    if state.phase == Phase::Active {
        state.timer = Some(handle);
    } else {
        handle.abort();
    }
}

/// Delivers `value` while the producer is running.
///
/// Returns `false` once the producer is closed; the value is dropped then.
pub(crate) fn emit<T>(state: &SharedTimer<T>, value: T) -> bool {
    let drain_now = {
        let mut state = lock(state);
        if state.phase != Phase::Active {
            return false;
        }
        state.enqueue(Signal::Value(value))
    };
    if drain_now {
        drain(state);
    }
    true
}

/// Moves to `Closed`, cancels the timer and delivers the termination signal once.
pub(crate) fn shut_down<T>(state: &SharedTimer<T>) {
    let drain_now = {
        let mut state = lock(state);
        if state.phase == Phase::Closed {
            return;
        }
        state.phase = Phase::Closed;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.enqueue(Signal::Done)
    };
    if drain_now {
        drain(state);
    }
}

fn drain<T>(state: &SharedTimer<T>) {
    loop {
        let (downstream, signal) = {
            let mut state = lock(state);
            let Some(signal) = state.queue.pop_front() else {
                state.draining = false;
                return;
            };
            let downstream = if signal.is_done() {
                state.queue.clear();
                state.sink.take()
            } else {
                state.sink.clone()
            };
            (downstream, signal)
        };
        if let Some(downstream) = downstream {
            downstream(signal);
        }
    }
}

/// Spawns `task` on the current Tokio runtime.
///
/// Outside a runtime nothing is spawned and `None` is returned; callers then act as if
/// their deadline had already passed.
pub(crate) fn spawn_timer<F>(label: &'static str, task: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(task)),
        Err(err) => {
            log::error!("{} registered outside of a Tokio runtime: {}", label, err);
            None
        }
    }
}

// ================================
// interval
// ================================

/// Periodic producer of `1, 2, 3, …`, one value every `ms` milliseconds.
///
/// The teardown cancels the timer and, if a consumer is registered, delivers the
/// termination signal. It may be called before registration, in which case a later
/// registration receives the termination signal right away. A zero period is raised to
/// one millisecond.
pub fn interval(ms: u64) -> Connection<u64> {
    if ms == 0 {
        log::warn!("interval period of 0ms raised to 1ms");
    }
    interval_from(IntervalConfig::new(Duration::from_millis(ms.max(1))))
}

/// [`interval`] with a custom start value and missed-tick behavior.
pub fn interval_with_config(config: IntervalConfig) -> StreamResult<Connection<u64>> {
    config.validate()?;
    Ok(interval_from(config))
}

fn interval_from(config: IntervalConfig) -> Connection<u64> {
    let state: SharedTimer<u64> = TimerState::shared();

    let input: InputStream<u64> = {
        let state = state.clone();
        Box::new(move |downstream: Sink<u64>| {
            if let Err(downstream) = activate(&state, downstream) {
                downstream(Signal::Done);
                return;
            }
            log::debug!("interval armed with period {:?}", config.period);
            match spawn_timer("interval", ticks(state.clone(), config)) {
                Some(handle) => arm(&state, handle),
                None => shut_down(&state),
            }
        })
    };

    let output: Teardown = Arc::new(move |()| {
        log::debug!("interval torn down");
        shut_down(&state);
    });

    Pipe { input, output }
}

async fn ticks(state: SharedTimer<u64>, config: IntervalConfig) {
    let mut ticker = time::interval_at(Instant::now() + config.period, config.period);
    ticker.set_missed_tick_behavior(config.missed_tick_behavior);
    let mut next = config.start;

    loop {
        ticker.tick().await;
        log::trace!("interval tick {}", next);
        if !emit(&state, next) {
            break;
        }
        next = next.wrapping_add(1);
    }
}

// ================================
// interruptable_wait / wait
// ================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Idle,
    /// Deadline pending, upstream signals are held back
    Buffering,
    /// Buffer is being handed downstream; new signals queue behind it
    Flushing,
    /// Deadline passed, signals are forwarded as they arrive
    Open,
    Closed,
}

struct WaitState<T> {
    gate: Gate,
    buffer: VecDeque<Signal<T>>,
    sink: Option<Sink<T>>,
    timer: Option<JoinHandle<()>>,
    interrupted: bool,
    /// The termination signal has been handed downstream
    finished: bool,
}

impl<T> WaitState<T> {
    /// Drains the buffer up to and including the first termination signal.
    fn take_batch(&mut self) -> Vec<Signal<T>> {
        let mut batch = Vec::with_capacity(self.buffer.len());
        for signal in self.buffer.drain(..) {
            if self.finished {
                break;
            }
            if signal.is_done() {
                self.finished = true;
            }
            batch.push(signal);
        }
        batch
    }

    fn downstream(&mut self) -> Option<Sink<T>> {
        if self.finished {
            self.sink.take()
        } else {
            self.sink.clone()
        }
    }
}

type SharedWait<T> = Arc<Mutex<WaitState<T>>>;

/// Hands the buffer downstream in order, then opens the gate, or closes it after an
/// interruption. Signals arriving meanwhile are queued and delivered by the same loop.
fn flush<T>(state: &SharedWait<T>) {
    loop {
        let (downstream, batch) = {
            let mut state = lock(state);
            let mut batch = state.take_batch();
            if batch.is_empty() {
                if !state.interrupted && !state.finished {
                    state.gate = Gate::Open;
                    return;
                }
                state.gate = Gate::Closed;
                if state.finished {
                    return;
                }
                state.finished = true;
                batch.push(Signal::Done);
            }
            (state.downstream(), batch)
        };

        if let Some(downstream) = downstream {
            for signal in batch {
                downstream(signal);
            }
        }
    }
}

fn on_upstream<T>(state: &SharedWait<T>, signal: Signal<T>) {
    {
        let mut state = lock(state);
        let gate = state.gate;
        match gate {
            Gate::Idle | Gate::Buffering | Gate::Flushing => {
                state.buffer.push_back(signal);
                return;
            }
            Gate::Closed => return,
            // Deliveries leave through the flush loop so one thread hands them over at a time
            Gate::Open => {
                state.buffer.push_back(signal);
                state.gate = Gate::Flushing;
            }
        }
    }
    flush(state);
}

fn on_deadline<T>(state: &SharedWait<T>) {
    {
        let mut state = lock(state);
        if state.gate != Gate::Buffering {
            return;
        }
        log::debug!("wait deadline reached, flushing {} buffered signals", state.buffer.len());
        state.gate = Gate::Flushing;
        state.timer = None;
    }
    flush(state);
}

fn interrupt<T>(state: &SharedWait<T>, upstream: &Option<Teardown>) {
    let flush_now = {
        let mut state = lock(state);
        if state.interrupted {
            return;
        }
        state.interrupted = true;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        let gate = state.gate;
        match gate {
            // The running flush closes the gate once it drains
            Gate::Flushing | Gate::Closed => false,
            Gate::Idle | Gate::Buffering | Gate::Open => {
                state.gate = Gate::Flushing;
                true
            }
        }
    };
    log::debug!("wait interrupted");
    if flush_now {
        flush(state);
    }
    super::close(upstream);
}

/// Holds back upstream signals for `ms` milliseconds after registration.
///
/// When the deadline passes the buffered signals are delivered in their original order
/// and later signals pass straight through. The returned teardown ends the wait early: it
/// cancels the timer, delivers the buffer, terminates the stream and then invokes the
/// upstream teardown. The buffer is unbounded.
pub fn interruptable_wait<T>(ms: u64) -> impl FnOnce(Stream<T>) -> Connection<T>
where
    T: Send + 'static,
{
    move |stream: Stream<T>| -> Connection<T> {
        let Stream { input, output } = stream;
        let period = Duration::from_millis(ms);
        let state: SharedWait<T> = Arc::new(Mutex::new(WaitState {
            gate: Gate::Idle,
            buffer: VecDeque::new(),
            sink: None,
            timer: None,
            interrupted: false,
            finished: false,
        }));

        let registration: InputStream<T> = {
            let state = state.clone();
            Box::new(move |downstream: Sink<T>| {
                {
                    let mut guard = lock(&state);
                    if guard.gate != Gate::Idle {
                        drop(guard);
                        downstream(Signal::Done);
                        return;
                    }
                    guard.gate = Gate::Buffering;
                    guard.sink = Some(downstream);
                }

                let deadline = {
                    let state = state.clone();
                    async move {
                        time::sleep(period).await;
                        on_deadline(&state);
                    }
                };
                match spawn_timer("interruptable_wait", deadline) {
                    Some(handle) => {
                        let mut guard = lock(&state);
                        if guard.gate == Gate::Buffering {
                            guard.timer = Some(handle);
                        } else {
                            handle.abort();
                        }
                    }
                    None => on_deadline(&state),
                }

                let upstream = state.clone();
                input(sink(move |signal: Signal<T>| on_upstream(&upstream, signal)));
            })
        };

        let teardown: Teardown = Arc::new(move |()| interrupt(&state, &output));

        Pipe {
            input: registration,
            output: teardown,
        }
    }
}

/// [`interruptable_wait`] without the interruption: the returned stream keeps the
/// upstream teardown as its own.
pub fn wait<T>(ms: u64) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: Send + 'static,
{
    move |stream: Stream<T>| -> Stream<T> {
        let output = stream.output.clone();
        let Pipe { input, .. } = interruptable_wait(ms)(stream);
        Stream { input, output }
    }
}

// ================================
// timeout
// ================================

/// Ends the stream `ms` milliseconds after registration.
///
/// Until the deadline every upstream signal is forwarded. At the deadline a single
/// termination signal is delivered and later upstream signals are dropped. Upstream is not
/// cancelled and keeps producing; the returned stream carries no teardown, so keep a clone
/// of the upstream teardown to stop it.
pub fn timeout<T>(ms: u64) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: Send + 'static,
{
    move |stream: Stream<T>| -> Stream<T> {
        let period = Duration::from_millis(ms);
        let input = stream.input;

        Stream::new(Box::new(move |downstream: Sink<T>| {
            let state: SharedTimer<T> = TimerState::shared();
            if let Err(downstream) = activate(&state, downstream) {
                downstream(Signal::Done);
                return;
            }

            let deadline = {
                let state = state.clone();
                async move {
                    time::sleep(period).await;
                    log::debug!("timeout of {:?} elapsed, upstream keeps running", period);
                    shut_down(&state);
                }
            };
            match spawn_timer("timeout", deadline) {
                Some(handle) => arm(&state, handle),
                None => shut_down(&state),
            }

            input(sink(move |signal: Signal<T>| match signal {
                Signal::Value(value) => {
                    emit(&state, value);
                }
                Signal::Done => shut_down(&state),
            }));
        }))
    }
}
