//! Termination signal shared by the pull and push models
//!
//! Every delivery in either model is a [`Signal`]: a payload or the end-of-transmission
//! marker. The marker is its own variant, so no payload can ever be mistaken for it.

use std::fmt;

/// A single delivery: either a value or the end of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal<T> {
    /// A payload produced by the stream
    Value(T),
    /// End of transmission. Always the last signal of a stream.
    Done,
}

impl<T> Signal<T> {
    /// Returns `true` if this is the termination marker.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, Signal::Done)
    }

    /// Returns `true` if this carries a payload.
    #[inline]
    pub fn is_value(&self) -> bool {
        !self.is_done()
    }

    /// Converts into the payload, discarding the marker.
    #[inline]
    pub fn into_value(self) -> Option<T> {
        match self {
            Signal::Value(value) => Some(value),
            Signal::Done => None,
        }
    }

    /// Borrows the payload, if any.
    #[inline]
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Signal::Value(value) => Some(value),
            Signal::Done => None,
        }
    }

    /// Applies `f` to the payload; the marker passes through untouched.
    #[inline]
    pub fn map<U, F>(self, f: F) -> Signal<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Signal::Value(value) => Signal::Value(f(value)),
            Signal::Done => Signal::Done,
        }
    }
}

impl<T> From<Option<T>> for Signal<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Signal::Value(value),
            None => Signal::Done,
        }
    }
}

impl<T> From<Signal<T>> for Option<T> {
    fn from(signal: Signal<T>) -> Self {
        signal.into_value()
    }
}

impl<T: fmt::Display> fmt::Display for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Value(value) => write!(f, "{}", value),
            Signal::Done => write!(f, "\u{2404}"),
        }
    }
}

/// Returns `true` iff `signal` is the termination marker.
#[inline]
pub fn is_done<T>(signal: &Signal<T>) -> bool {
    signal.is_done()
}

/// The termination marker for a stream of `T`.
#[inline]
pub const fn end_of_transmission<T>() -> Signal<T> {
    Signal::Done
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_is_never_a_value() {
        // A payload that merely looks like the marker is still a value
        let lookalike = Signal::Value("\u{2404}");
        assert!(!is_done(&lookalike));
        assert!(is_done(&end_of_transmission::<&str>()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Signal::Value(7).to_string(), "7");
        assert_eq!(Signal::<i32>::Done.to_string(), "\u{2404}");
    }

    #[test]
    fn test_option_conversions() {
        assert_eq!(Signal::from(Some(1)), Signal::Value(1));
        assert_eq!(Signal::<i32>::from(None), Signal::Done);
        assert_eq!(Option::from(Signal::Value(2)), Some(2));
        assert_eq!(Signal::Value(2).map(|x| x * 3), Signal::Value(6));
    }
}
