//! Integration tests for the sequence combinators and both bridges.

use std::sync::Arc;
use std::time::{Duration, Instant};

use task_helpers::{
    AggregateError, AnyTaskIterExt, CompletionSource, Failure, FaultObject, IntoTasks, Task,
    TaskIterExt,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("expected failure")]
struct TestError;

fn delayed<T: Send + 'static>(ms: u64, value: T) -> Task<T> {
    Task::from_future(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(value)
    })
}

async fn within<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), fut)
        .await
        .expect("combinator did not short-circuit")
}

#[tokio::test]
async fn test_aggregate() {
    let tasks = vec![delayed(30, 123), delayed(50, 456), delayed(70, 789)];
    let sum = tasks.aggregate(|a, b| a + b).await.unwrap();
    assert_eq!(sum, 1368);
}

#[tokio::test]
async fn test_aggregate_with_async_step() {
    let tasks = vec![delayed(30, 123), delayed(50, 456), delayed(70, 789)];
    let sum = tasks
        .aggregate_async(|a, b| delayed(10, a + b))
        .await
        .unwrap();
    assert_eq!(sum, 1368);
}

#[tokio::test]
async fn test_aggregate_with_seed() {
    let tasks = vec![delayed(30, 123), delayed(50, 456), delayed(70, 789)];
    let sum = tasks.aggregate_with(100, |acc, v| acc + v).await.unwrap();
    assert_eq!(sum, 1468);
}

#[tokio::test]
async fn test_aggregate_with_seed_and_async_step() {
    let tasks = vec![delayed(30, 123), delayed(50, 456), delayed(70, 789)];
    let sum = tasks
        .aggregate_with_async(100, |acc, v| delayed(10, acc + v))
        .await
        .unwrap();
    assert_eq!(sum, 1468);
}

#[tokio::test]
async fn test_aggregate_finalizer_composes_with_map() {
    let tasks = vec![delayed(30, 123), delayed(50, 456), delayed(70, 789)];
    let result = tasks
        .aggregate_with(100, |acc, v| acc + v)
        .map(|total| total as f64 + 1000.0)
        .await
        .unwrap();
    assert_eq!(result, 100.0 + 123.0 + 456.0 + 789.0 + 1000.0);
}

#[tokio::test]
async fn test_aggregate_empty_sequence_faults() {
    let tasks: Vec<Task<i32>> = Vec::new();
    let failure = tasks.aggregate(|a, b| a + b).await.unwrap_err();
    let object = failure.fault_object().expect("expected a fault");
    assert!(matches!(
        object.downcast_ref::<AggregateError>(),
        Some(AggregateError::Empty)
    ));
}

#[tokio::test]
async fn test_aggregate_propagates_element_fault() {
    let error: FaultObject = Arc::new(TestError);
    let tasks = vec![
        Task::from_result(1),
        Task::from_error(error.clone()),
        Task::from_result(3),
    ];
    let failure = tasks.aggregate(|a, b| a + b).await.unwrap_err();
    match failure {
        Failure::Faulted(actual) => assert!(Arc::ptr_eq(&actual, &error)),
        Failure::Cancelled => panic!("expected a fault"),
    }
}

#[tokio::test]
async fn test_all_matches() {
    let tasks = vec![delayed(10, 100), delayed(10, 200), delayed(10, 300)];
    assert!(tasks.all(|v| *v >= 100).await.unwrap());
}

#[tokio::test]
async fn test_all_short_circuits_on_first_mismatch() {
    // The third task never settles; a non-short-circuiting implementation
    // would hang on it.
    let (_pending, never) = CompletionSource::<i32>::new();
    let tasks = vec![Task::from_result(100), Task::from_result(200), never];

    let result = within(tasks.all(|v| *v == 100)).await.unwrap();
    assert!(!result);
}

#[tokio::test]
async fn test_all_mismatch_in_middle() {
    let tasks = vec![delayed(10, 100), delayed(10, 200), delayed(10, 300)];
    assert!(!tasks.all(|v| *v == 200).await.unwrap());
}

#[tokio::test]
async fn test_all_empty_is_true() {
    let tasks: Vec<Task<i32>> = Vec::new();
    assert!(tasks.all(|_| false).await.unwrap());
}

#[tokio::test]
async fn test_all_with_async_predicate() {
    let tasks = vec![delayed(10, 1), delayed(10, 2)];
    let result = tasks
        .all_async(|v| delayed(10, *v < 10))
        .await
        .unwrap();
    assert!(result);
}

#[tokio::test]
async fn test_any_short_circuits_on_first_match() {
    let (_pending, never) = CompletionSource::<i32>::new();
    let tasks = vec![Task::from_result(5), never];

    let result = within(tasks.any(|v| *v == 5)).await.unwrap();
    assert!(result);
}

#[tokio::test]
async fn test_any_empty_is_false() {
    let tasks: Vec<Task<i32>> = Vec::new();
    assert!(!tasks.any(|_| true).await.unwrap());
}

#[tokio::test]
async fn test_any_with_async_predicate() {
    let tasks = vec![delayed(10, 1), delayed(10, 7)];
    let result = tasks
        .any_async(|v| delayed(10, *v == 7))
        .await
        .unwrap();
    assert!(result);
}

#[tokio::test]
async fn test_exists_awaits_only_the_first_element() {
    let (_pending, never) = CompletionSource::<i32>::new();
    let tasks = vec![delayed(10, 1), never];
    assert!(within(tasks.exists()).await.unwrap());
}

#[tokio::test]
async fn test_exists_empty_is_false() {
    let tasks: Vec<Task<i32>> = Vec::new();
    assert!(!tasks.exists().await.unwrap());
}

#[tokio::test]
async fn test_exists_surfaces_first_element_failure() {
    let error: FaultObject = Arc::new(TestError);
    let tasks = vec![Task::<i32>::from_error(error.clone())];
    let failure = tasks.exists().await.unwrap_err();
    match failure {
        Failure::Faulted(actual) => assert!(Arc::ptr_eq(&actual, &error)),
        Failure::Cancelled => panic!("expected a fault"),
    }
}

#[tokio::test]
async fn test_append_task_and_value() {
    let extended = vec![1, 2]
        .into_tasks()
        .append(delayed(10, 3))
        .append_value(4);
    let values = extended.join_all().await.unwrap();
    assert_eq!(values, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_map_each() {
    let values = vec![delayed(10, 1), delayed(10, 2)]
        .map_each(|v| v * 10)
        .join_all()
        .await
        .unwrap();
    assert_eq!(values, vec![10, 20]);
}

#[tokio::test]
async fn test_then_each() {
    let values = vec![delayed(10, 1), delayed(10, 2)]
        .then_each(|v| delayed(10, v + 100))
        .join_all()
        .await
        .unwrap();
    assert_eq!(values, vec![101, 102]);
}

#[tokio::test]
async fn test_cast_each_and_downcast_each() {
    let values = vec![Task::from_result(1i32), Task::from_result(2i32)]
        .cast_each::<i32>()
        .join_all()
        .await
        .unwrap();
    assert_eq!(values, vec![1, 2]);

    let erased = vec![
        Task::from_result(3i32).into_any(),
        Task::from_result(4i32).into_any(),
    ];
    let values = erased.downcast_each::<i32>().join_all().await.unwrap();
    assert_eq!(values, vec![3, 4]);
}

#[tokio::test]
async fn test_join_all_preserves_input_order() {
    // The first task finishes last; positional order must still hold.
    let tasks = vec![delayed(150, 1), delayed(50, 2), delayed(100, 3)];
    let start = Instant::now();
    let values = tasks.join_all().await.unwrap();
    assert_eq!(values, vec![1, 2, 3]);

    // Concurrent fan-out: total time tracks the slowest task, not the sum.
    assert!(start.elapsed() < Duration::from_millis(280));
}

#[tokio::test]
async fn test_join_all_first_fault_by_index_wins() {
    let early: FaultObject = Arc::new(TestError);
    let late: FaultObject = Arc::new(TestError);

    // The later-indexed fault completes first; the earlier index still wins.
    let slow_fault = early.clone();
    let tasks = vec![
        delayed(10, 0),
        Task::from_future(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Err::<i32, _>(Failure::Faulted(slow_fault))
        }),
        Task::from_error(late.clone()),
    ];

    let failure = tasks.join_all().await.unwrap_err();
    match failure {
        Failure::Faulted(actual) => assert!(Arc::ptr_eq(&actual, &early)),
        Failure::Cancelled => panic!("expected a fault"),
    }
}

#[tokio::test]
async fn test_join_all_propagates_cancellation() {
    let tasks = vec![Task::from_result(1), Task::cancelled()];
    assert!(tasks.join_all().await.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_into_sequence_blocks_until_resolved_then_yields_in_order() {
    let collection = Task::spawn(async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        vec![1, 2, 3]
    });

    let (first_wait, values) = tokio::task::spawn_blocking(move || {
        let start = Instant::now();
        let mut sequence = collection.into_sequence();

        let first = sequence.next().expect("sequence ended early");
        let first_wait = start.elapsed();

        // Every remaining element is already resolved.
        let mut values = vec![futures::executor::block_on(first).unwrap()];
        for task in sequence {
            values.push(futures::executor::block_on(task).unwrap());
        }
        (first_wait, values)
    })
    .await
    .unwrap();

    assert!(first_wait >= Duration::from_millis(100));
    assert_eq!(values, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_into_sequence_failure_yields_single_failed_element() {
    let error: FaultObject = Arc::new(TestError);
    let collection = Task::<Vec<i32>>::from_error(error.clone());

    let mut sequence = collection.into_sequence();
    let only = sequence.next().expect("expected one failed element");
    match only.await.unwrap_err() {
        Failure::Faulted(actual) => assert!(Arc::ptr_eq(&actual, &error)),
        Failure::Cancelled => panic!("expected a fault"),
    }
    assert!(sequence.next().is_none());
}

#[tokio::test]
async fn test_round_trip_collection_to_sequence_and_back() {
    let collection = Task::from_result(vec![1, 2, 3]);
    let tasks: Vec<Task<i32>> = collection.into_sequence().collect();
    let values = tasks.join_all().await.unwrap();
    assert_eq!(values, vec![1, 2, 3]);
}
