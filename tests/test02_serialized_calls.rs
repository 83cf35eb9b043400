use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sql_typed_executor::prelude::*;
use sql_typed_executor::test_utils::{EventLog, ScriptedSession, Step, cell};

const FIRST: &str = "SELECT a FROM first WHERE a > ?";
const SECOND: &str = "SELECT a, b FROM second";

fn contended_executor(log: &EventLog) -> Result<Arc<Executor<ScriptedSession>>, ExecutorError> {
    let session = ScriptedSession::new()
        .with_log(log.clone())
        .with_delay(Duration::from_millis(2))
        .with_rows(FIRST, 1, vec![vec![cell(1_i32)], vec![cell(2_i32)]])
        .with_rows(
            SECOND,
            2,
            vec![vec![cell(3_i64), cell("three")], vec![cell(4_i64), None]],
        );
    Ok(Arc::new(Executor::new(session, ExecutorOptions::default())?))
}

#[test]
fn concurrent_calls_never_interleave() -> Result<(), ExecutorError> {
    let log = EventLog::default();
    let executor = contended_executor(&log)?;

    let first = {
        let executor = Arc::clone(&executor);
        thread::spawn(move || -> Result<(), ExecutorError> {
            for _ in 0..5 {
                let results = executor.query_all::<(i32,), _>(FIRST, (0,))?;
                assert_eq!(results.rows, vec![(1,), (2,)]);
            }
            Ok(())
        })
    };
    let second = {
        let executor = Arc::clone(&executor);
        thread::spawn(move || -> Result<(), ExecutorError> {
            for _ in 0..5 {
                let results = executor.query_all::<(i64, String), _>(SECOND, ())?;
                assert_eq!(results.rows, vec![(3, "three".into()), (4, String::new())]);
                assert_eq!(results.null_flags, vec![vec![0, 0], vec![0, 1]]);
            }
            Ok(())
        })
    };
    first.join().expect("first worker panicked")?;
    second.join().expect("second worker panicked")?;

    let events = log.events();
    assert_eq!(log.count(Step::Prepare), 10);
    assert_eq!(log.count(Step::CloseStatement), 10);

    // Between a prepare and its statement close only that statement's steps appear.
    let mut active: Option<&str> = None;
    for event in &events {
        match (event.step, active) {
            (Step::Prepare, None) => active = Some(&event.query),
            (Step::Prepare, Some(open)) => {
                panic!("{} prepared while {open} was still running", event.query)
            }
            (Step::CloseStatement, Some(open)) => {
                assert_eq!(event.query, open);
                active = None;
            }
            (_, Some(open)) => assert_eq!(event.query, open),
            (step, None) => panic!("{step:?} for {} outside of a call", event.query),
        }
    }
    assert!(active.is_none());
    Ok(())
}

#[test]
fn calls_follow_protocol_order() -> Result<(), ExecutorError> {
    let log = EventLog::default();
    let executor = contended_executor(&log)?;
    executor.query_all::<(i32,), _>(FIRST, (1,))?;

    assert_eq!(
        log.steps_for(FIRST),
        vec![
            Step::Prepare,
            Step::BindParams,
            Step::BindOutputs,
            Step::Execute,
            Step::Fetch,
            Step::Fetch,
            Step::Fetch,
            Step::CloseStatement,
        ]
    );
    Ok(())
}
