//! Synchronous pull streams
//!
//! A pull stream is a stateful nullary function: the consumer calls it and gets the next
//! [`Signal`]. Once a stream has returned [`Signal::Done`] it keeps returning it.
//! Combinators are curried, so `map(f)` yields a function from stream to stream that can be
//! chained with [`pipe!`](crate::pipe!).

use crate::signal::Signal;

/// Pull producer: each call yields the next value or the termination signal
pub type InputStream<T> = Box<dyn FnMut() -> Signal<T> + Send>;

/// Pull consumer: receives one value per call and never pulls on its own
pub type OutputStream<T> = Box<dyn FnMut(T) + Send>;

/// A producer paired with the consumer-side hook it feeds
pub struct Pipe<A, B> {
    pub input: InputStream<A>,
    pub output: OutputStream<B>,
}

pub type SymmetricPipe<T> = Pipe<T, T>;
pub type Connection<T> = Pipe<T, ()>;

impl<A, B> Pipe<A, B> {
    pub fn new(input: InputStream<A>, output: OutputStream<B>) -> Self {
        Self { input, output }
    }
}

// ================================
// Constructors
// ================================

/// A producer that yields `()` forever and never terminates.
pub fn nothing() -> InputStream<()> {
    Box::new(|| Signal::Value(()))
}

/// A consumer that discards everything it receives.
pub fn blackhole<T: 'static>() -> OutputStream<T> {
    Box::new(|_| {})
}

/// The teardown-shaped consumer: discards `()`.
pub fn noop() -> OutputStream<()> {
    blackhole()
}

/// Yields `value` once, then the termination signal forever.
pub fn pure<T>(value: T) -> InputStream<T>
where
    T: Send + 'static,
{
    let mut slot = Some(value);
    Box::new(move || slot.take().into())
}

/// A stream that is already finished.
pub fn empty<T: 'static>() -> InputStream<T> {
    Box::new(|| Signal::Done)
}

/// Yields each element in order, then the termination signal forever.
pub fn from_array<I, T>(items: I) -> InputStream<T>
where
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
    T: 'static,
{
    let mut iter = items.into_iter().fuse();
    Box::new(move || iter.next().into())
}

/// Lifts a generator into a pull stream; the first `None` closes the stream for good.
pub fn from_fn<T, F>(f: F) -> InputStream<T>
where
    F: FnMut() -> Option<T> + Send + 'static,
    T: 'static,
{
    from_array(std::iter::from_fn(f))
}

/// Pairs `input` with a [`blackhole`] output.
pub fn lift<T>(input: InputStream<T>) -> Connection<T> {
    Pipe::new(input, noop())
}

// ================================
// Combinators
// ================================

/// Applies `f` to every value; the termination signal passes through.
pub fn map<A, B, F>(mut f: F) -> impl FnOnce(InputStream<A>) -> InputStream<B>
where
    F: FnMut(A) -> B + Send + 'static,
    A: 'static,
    B: 'static,
{
    move |mut stream: InputStream<A>| -> InputStream<B> {
        Box::new(move || stream().map(&mut f))
    }
}

/// Keeps values satisfying `predicate`, pulling upstream as often as needed per call.
pub fn filter<T, F>(mut predicate: F) -> impl FnOnce(InputStream<T>) -> InputStream<T>
where
    F: FnMut(&T) -> bool + Send + 'static,
    T: 'static,
{
    move |mut stream: InputStream<T>| -> InputStream<T> {
        Box::new(move || loop {
            match stream() {
                Signal::Value(value) if !predicate(&value) => continue,
                signal => return signal,
            }
        })
    }
}

// ================================
// Drains
// ================================

/// Pulls until the termination signal and collects every value. Blocks until done.
pub fn to_array<T>(mut stream: InputStream<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Signal::Value(value) = stream() {
        items.push(value);
    }
    items
}

/// Forwards every value from `input` to `output`; the termination signal is not forwarded.
pub fn connect<T>(mut input: InputStream<T>, mut output: OutputStream<T>) {
    while let Signal::Value(value) = input() {
        output(value);
    }
}

pub fn blabber<A, B>(pipe: Pipe<A, B>) -> InputStream<A> {
    pipe.input
}

pub fn silence<A, B>(pipe: Pipe<A, B>) -> OutputStream<B> {
    pipe.output
}

/// Iterator over the values of a pull stream
pub struct IntoIter<T> {
    stream: InputStream<T>,
    done: bool,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.done {
            return None;
        }
        let next = (self.stream)().into_value();
        self.done = next.is_none();
        next
    }
}

impl<T> std::iter::FusedIterator for IntoIter<T> {}

/// Adapts a pull stream into a standard iterator.
pub fn into_iter<T>(stream: InputStream<T>) -> IntoIter<T> {
    IntoIter { stream, done: false }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_then_done_forever() {
        let mut stream = pure(42);
        assert_eq!(stream(), Signal::Value(42));
        for _ in 0..3 {
            assert_eq!(stream(), Signal::Done);
        }
    }

    #[test]
    fn test_filter_pulls_until_match() {
        let mut pulls = 0;
        let source: InputStream<i32> = {
            let mut inner = from_array(vec![1, 3, 5, 6]);
            Box::new(move || {
                pulls += 1;
                let next = inner();
                assert!(pulls <= 5);
                next
            })
        };
        let mut evens = filter(|x: &i32| x % 2 == 0)(source);
        assert_eq!(evens(), Signal::Value(6));
        assert_eq!(evens(), Signal::Done);
    }
}
