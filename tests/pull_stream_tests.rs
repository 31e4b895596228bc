use rs2_duplex::pull::{self, InputStream, Pipe};
use rs2_duplex::{pipe, Signal};
use std::sync::{Arc, Mutex};

#[test]
fn test_from_array_in_order_then_done_forever() {
    let mut stream = pull::from_array(vec!["a", "b"]);
    assert_eq!(stream(), Signal::Value("a"));
    assert_eq!(stream(), Signal::Value("b"));
    for _ in 0..5 {
        assert_eq!(stream(), Signal::Done);
    }
}

#[test]
fn test_empty_stream() {
    let mut stream = pull::empty::<i32>();
    assert!(stream().is_done());
    assert_eq!(pull::to_array(pull::empty::<i32>()), Vec::<i32>::new());
}

#[test]
fn test_map_passes_done_through() {
    let mut calls = 0;
    let mut doubled = pull::map(move |x: i32| {
        calls += 1;
        assert!(calls <= 2, "map must not be applied to the termination signal");
        x * 2
    })(pull::from_array(vec![1, 2]));

    assert_eq!(doubled(), Signal::Value(2));
    assert_eq!(doubled(), Signal::Value(4));
    assert_eq!(doubled(), Signal::Done);
    assert_eq!(doubled(), Signal::Done);
}

#[test]
fn test_filter_is_not_one_to_one() {
    let pulls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&pulls);
    let mut inner = pull::from_array(vec![1, 3, 5, 7, 8]);
    let source: InputStream<i32> = Box::new(move || {
        *counter.lock().unwrap() += 1;
        inner()
    });

    let mut evens = pull::filter(|x: &i32| x % 2 == 0)(source);
    assert_eq!(evens(), Signal::Value(8));
    assert_eq!(*pulls.lock().unwrap(), 5);
    assert_eq!(evens(), Signal::Done);
}

#[test]
fn test_to_array_after_map_and_filter() {
    let result = pipe!(
        pull::from_array(vec![1, 2, 3, 4, 5]),
        pull::map(|x: i32| x * 2),
        pull::filter(|x: &i32| *x < 10),
        pull::to_array,
    );
    assert_eq!(result, vec![2, 4, 6, 8]);
}

#[test]
fn test_connect_never_forwards_done() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    pull::connect(
        pull::from_array(vec![10, 20, 30]),
        Box::new(move |value| sink.lock().unwrap().push(value)),
    );
    assert_eq!(*received.lock().unwrap(), vec![10, 20, 30]);
}

#[test]
fn test_from_fn_stops_at_first_none() {
    let mut n = 0;
    let mut stream = pull::from_fn(move || {
        n += 1;
        // Would resume after the gap if the stream were not fused
        if n == 3 { None } else { Some(n) }
    });
    assert_eq!(stream(), Signal::Value(1));
    assert_eq!(stream(), Signal::Value(2));
    assert_eq!(stream(), Signal::Done);
    assert_eq!(stream(), Signal::Done);
}

#[test]
fn test_nothing_never_terminates() {
    let mut stream = pull::nothing();
    for _ in 0..100 {
        assert_eq!(stream(), Signal::Value(()));
    }
}

#[test]
fn test_lift_and_accessors() {
    let connection = pull::lift(pull::pure(5));
    let mut output = pull::silence(Pipe::new(pull::empty::<()>(), pull::noop()));
    output(());

    let input = pull::blabber(connection);
    assert_eq!(pull::to_array(input), vec![5]);
}

#[test]
fn test_into_iter() {
    let values: Vec<_> = pull::into_iter(pull::from_array(1..=4)).map(|x| x * x).collect();
    assert_eq!(values, vec![1, 4, 9, 16]);

    let mut iter = pull::into_iter(pull::pure('x'));
    assert_eq!(iter.next(), Some('x'));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next(), None);
}
