//! Left-to-right composition of curried combinators
//!
//! Combinators in both models take their configuration first and return a function from
//! stream to stream, so a pipeline reads in the order data flows:
//!
//! ```
//! use rs2_duplex::{pipe, pull};
//!
//! let doubled_small = pipe!(
//!     pull::from_array(vec![1, 2, 3, 4, 5]),
//!     pull::map(|x: i32| x * 2),
//!     pull::filter(|x: &i32| *x < 10),
//!     pull::to_array,
//! );
//! assert_eq!(doubled_small, vec![2, 4, 6, 8]);
//! ```

/// Applies each stage to the result of the previous one: `pipe!(x, f, g)` is `g(f(x))`.
#[macro_export]
macro_rules! pipe {
    ($source:expr $(, $stage:expr)* $(,)?) => {{
        let value = $source;
        $(
            let value = ($stage)(value);
        )*
        value
    }};
}

/// Create a stage that applies `first` and then `second`
pub fn compose<A, B, C, F, G>(first: F, second: G) -> impl FnOnce(A) -> C
where
    F: FnOnce(A) -> B,
    G: FnOnce(B) -> C,
{
    move |input| second(first(input))
}

/// Identity stage that passes its input through
pub fn identity<A>() -> impl FnOnce(A) -> A {
    |input| input
}
