use futures_util::stream::{self, StreamExt};
use rs2_duplex::push::{self, Stream};
use rs2_duplex::Signal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn test_into_stream_collects_values() {
    let values: Vec<i32> = push::from_array(vec![1, 2, 3])
        .map(|x| x * 10)
        .into_stream()
        .collect()
        .await;
    assert_eq!(values, vec![10, 20, 30]);
}

#[tokio::test(start_paused = true)]
async fn test_into_stream_from_interval() {
    let values: Vec<u64> = Stream::from(push::interval(50))
        .take(3)
        .into_stream()
        .collect()
        .await;
    assert_eq!(values, vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_into_stream_tears_down() {
    let ticks = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&ticks);
    let source = Stream::from(push::interval(100)).tap_with(move |signal: &Signal<u64>| {
        if signal.is_value() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    let mut values = source.into_stream();
    assert_eq!(values.next().await, Some(1));
    assert_eq!(values.next().await, Some(2));
    drop(values);

    let seen = ticks.load(Ordering::SeqCst);
    sleep(Duration::from_millis(500)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), seen);
}

#[tokio::test]
async fn test_from_stream_delivers_items_then_done() {
    let result = push::from_stream(stream::iter(vec!["a", "b", "c"]))
        .to_array()
        .await;
    assert_eq!(result, Ok(vec!["a", "b", "c"]));
}

#[tokio::test(start_paused = true)]
async fn test_from_stream_teardown_aborts_driver() {
    let slow = stream::unfold(0u32, |n| async move {
        sleep(Duration::from_millis(100)).await;
        Some((n, n + 1))
    });
    let source = push::from_stream(slow);
    let teardown = source.output.clone().expect("from_stream has a teardown");

    let received = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&received);
    source.subscribe(move |signal| log.lock().unwrap().push(signal));

    sleep(Duration::from_millis(250)).await;
    teardown(());
    teardown(());
    sleep(Duration::from_millis(500)).await;

    assert_eq!(
        *received.lock().unwrap(),
        vec![Signal::Value(0), Signal::Value(1), Signal::Done]
    );
}
