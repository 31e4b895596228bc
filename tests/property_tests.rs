use quickcheck::{quickcheck, TestResult};
use rs2_duplex::push::{self, Stream};
use rs2_duplex::{pull, Signal};
use std::sync::{Arc, Mutex};
use tokio_test::block_on;

fn collect_signals<T: Send + 'static>(stream: Stream<T>) -> Vec<Signal<T>> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&received);
    stream.subscribe(move |signal| log.lock().unwrap().push(signal));
    let signals = std::mem::take(&mut *received.lock().unwrap());
    signals
}

#[test]
fn prop_pull_done_is_sticky() {
    fn property(xs: Vec<i32>, extra: u8) -> bool {
        let len = xs.len();
        let mut stream = pull::from_array(xs);
        (0..len).all(|_| stream().is_value()) && (0..=extra).all(|_| stream().is_done())
    }
    quickcheck(property as fn(Vec<i32>, u8) -> bool);
}

#[test]
fn prop_map_preserves_order() {
    fn property(xs: Vec<i32>) -> bool {
        let expected: Vec<i64> = xs.iter().map(|x| *x as i64 * 3).collect();
        let pulled = pull::to_array(pull::map(|x: i32| x as i64 * 3)(pull::from_array(xs.clone())));
        let pushed = block_on(push::from_array(xs).map(|x| x as i64 * 3).to_array());
        pulled == expected && pushed == Ok(expected)
    }
    quickcheck(property as fn(Vec<i32>) -> bool);
}

#[test]
fn prop_filter_keeps_matching_subsequence() {
    fn property(xs: Vec<i16>) -> bool {
        let expected: Vec<i16> = xs.iter().copied().filter(|x| x % 3 == 0).collect();
        let pulled = pull::to_array(pull::filter(|x: &i16| x % 3 == 0)(pull::from_array(xs.clone())));
        let pushed = block_on(push::from_array(xs).filter(|x| x % 3 == 0).to_array());
        pulled == expected && pushed == Ok(expected)
    }
    quickcheck(property as fn(Vec<i16>) -> bool);
}

#[test]
fn prop_reduce_is_left_fold() {
    fn property(xs: Vec<i32>, init: i32) -> bool {
        // Non-commutative so a reordering would show
        let step = |acc: i64, x: i32| acc.wrapping_mul(31).wrapping_add(x as i64);
        let expected = xs.iter().fold(init as i64, |acc, x| step(acc, *x));
        let folded = block_on(push::reduce(step, init as i64)(push::from_array(xs)));
        folded == Ok(expected)
    }
    quickcheck(property as fn(Vec<i32>, i32) -> bool);
}

#[test]
fn prop_take_forwards_min_then_one_done() {
    fn property(xs: Vec<u8>, n: u8) -> TestResult {
        let n = n as usize % 16;
        let expected = n.min(xs.len());
        let signals = collect_signals(push::from_array(xs).take(n));

        let values = signals.iter().filter(|s| s.is_value()).count();
        let dones = signals.iter().filter(|s| s.is_done()).count();
        let last_is_done = signals.last().map(Signal::is_done).unwrap_or(false);
        TestResult::from_bool(values == expected && dones == 1 && last_is_done)
    }
    quickcheck(property as fn(Vec<u8>, u8) -> TestResult);
}
