use sql_typed_executor::prelude::*;
use sql_typed_executor::test_utils::{ScriptedConnector, ScriptedSession, Step, cell};

const PEOPLE: &str = "SELECT id, name FROM people WHERE id > ?";
const INSERT: &str = "INSERT INTO people (id, name) VALUES (?, ?)";

fn people() -> Vec<Vec<Option<Vec<u8>>>> {
    vec![
        vec![cell(1_i32), cell("ada")],
        vec![cell(2_i32), cell("grace")],
        vec![cell(3_i32), None],
    ]
}

fn executor(session: ScriptedSession) -> Result<Executor<ScriptedSession>, ExecutorError> {
    Executor::new(session, ExecutorOptions::default())
}

#[test]
fn arity_mismatch_stops_before_binding() -> Result<(), ExecutorError> {
    let session = ScriptedSession::new().with_rows(PEOPLE, 2, people());
    let log = session.log();
    let executor = executor(session)?;

    let err = executor
        .query_all::<(i32, String, bool), _>(PEOPLE, (0,))
        .unwrap_err();
    assert!(matches!(err, ExecutorError::Usage(_)));
    assert_eq!(log.steps_for(PEOPLE), vec![Step::Prepare, Step::CloseStatement]);
    Ok(())
}

#[test]
fn parameter_mismatch_never_executes() -> Result<(), ExecutorError> {
    let session = ScriptedSession::new().with_affected(INSERT, 1);
    let log = session.log();
    let executor = executor(session)?;

    let err = executor.execute(INSERT, (7,)).unwrap_err();
    assert!(matches!(err, ExecutorError::Bind(_)));
    assert_eq!(log.count(Step::Execute), 0);
    assert_eq!(
        log.steps_for(INSERT),
        vec![Step::Prepare, Step::BindParams, Step::CloseStatement]
    );

    assert_eq!(executor.execute(INSERT, (7, "lin"))?, 1);
    Ok(())
}

#[test]
fn every_failing_step_closes_the_statement() -> Result<(), ExecutorError> {
    for (step, expect_kind) in [
        (Step::BindParams, "bind"),
        (Step::BindOutputs, "bind"),
        (Step::Execute, "exec"),
        (Step::Fetch, "fetch"),
    ] {
        let session = ScriptedSession::new()
            .with_rows(PEOPLE, 2, people())
            .failing(PEOPLE, step, "server went away");
        let log = session.log();
        let executor = executor(session)?;

        let err = executor
            .query_all::<(i32, String), _>(PEOPLE, (0,))
            .unwrap_err();
        let kind = match &err {
            ExecutorError::Bind(_) => "bind",
            ExecutorError::Exec(_) => "exec",
            ExecutorError::Fetch(_) => "fetch",
            other => panic!("unexpected error for {step:?}: {other}"),
        };
        assert_eq!(kind, expect_kind, "{step:?}");
        assert!(err.to_string().contains("server went away"));
        assert_eq!(log.count(Step::CloseStatement), 1, "{step:?}");
    }
    Ok(())
}

#[test]
fn prepare_failure_has_nothing_to_close() -> Result<(), ExecutorError> {
    let session = ScriptedSession::new()
        .with_rows(PEOPLE, 2, people())
        .failing(PEOPLE, Step::Prepare, "syntax error near 'FORM'");
    let log = session.log();
    let executor = executor(session)?;

    let err = executor
        .query_all::<(i32, String), _>(PEOPLE, (0,))
        .unwrap_err();
    assert!(matches!(&err, ExecutorError::Prepare(msg) if msg.contains("FORM")));
    assert_eq!(log.count(Step::CloseStatement), 0);

    let err = executor.execute("DROP TABLE unknown", ()).unwrap_err();
    assert!(matches!(err, ExecutorError::Prepare(_)));
    Ok(())
}

#[test]
fn execution_errors_are_reported_verbatim() -> Result<(), ExecutorError> {
    let message = "Duplicate entry '1' for key 'PRIMARY'";
    let session = ScriptedSession::new()
        .with_affected(INSERT, 1)
        .failing(INSERT, Step::Execute, message);
    let executor = executor(session)?;

    let mut results = Results::<ExecOnly>::new();
    let err = executor
        .execute_into(&mut results, INSERT, (1, "ada"))
        .unwrap_err();
    assert!(matches!(&err, ExecutorError::Exec(msg) if msg == message));
    assert!(results.error_message.contains(message));
    assert_eq!(results.affected_rows, 0);
    Ok(())
}

#[test]
fn fetch_failure_discards_partial_rows() -> Result<(), ExecutorError> {
    let session = ScriptedSession::new()
        .with_rows(PEOPLE, 2, people())
        .failing_fetch_after(PEOPLE, 2, "connection reset");
    let log = session.log();
    let executor = executor(session)?;

    let mut results = Results::new();
    results.rows.push((99, "stale".to_string()));
    let err = executor
        .query_all_into::<(i32, String), _>(&mut results, PEOPLE, (0,))
        .unwrap_err();
    assert!(matches!(err, ExecutorError::Fetch(_)));
    assert!(results.rows.is_empty());
    assert!(results.null_flags.is_empty());
    assert!(results.error_message.contains("connection reset"));
    assert_eq!(log.count(Step::CloseStatement), 1);
    Ok(())
}

#[test]
fn undecodable_column_is_a_fetch_error() -> Result<(), ExecutorError> {
    let session = ScriptedSession::new().with_rows(
        "SELECT flag FROM t",
        1,
        vec![vec![Some(vec![1, 2, 3])]],
    );
    let executor = executor(session)?;
    let err = executor
        .query_all::<(i32,), _>("SELECT flag FROM t", ())
        .unwrap_err();
    assert!(matches!(err, ExecutorError::Fetch(_)));
    Ok(())
}

#[test]
fn oversized_values_are_refetched_or_rejected() -> Result<(), ExecutorError> {
    let rows = vec![vec![cell(1_i32), cell("a value longer than eight bytes")]];
    let session = ScriptedSession::new().with_rows(PEOPLE, 2, rows);
    let log = session.log();

    let grown = Executor::new(
        session.clone(),
        ExecutorOptions::builder().initial_column_capacity(8).build()?,
    )?;
    let results = grown.query_all::<(i32, String), _>(PEOPLE, (0,))?;
    assert_eq!(results.rows[0].1, "a value longer than eight bytes");
    assert_eq!(log.count(Step::FetchColumn), 1);

    let capped = Executor::new(
        session,
        ExecutorOptions::builder()
            .initial_column_capacity(8)
            .max_column_bytes(16)
            .build()?,
    )?;
    let err = capped
        .query_all::<(i32, String), _>(PEOPLE, (0,))
        .unwrap_err();
    assert!(matches!(
        err,
        ExecutorError::Truncation {
            column: 1,
            limit: 16,
            ..
        }
    ));
    assert_eq!(log.count(Step::CloseStatement), 2);
    Ok(())
}

#[test]
fn session_closes_once_and_refuses_work_afterwards() -> Result<(), ExecutorError> {
    let session = ScriptedSession::new().with_rows(PEOPLE, 2, people());
    let log = session.log();
    let executor = executor(session)?;

    executor.close()?;
    executor.close()?;
    drop(executor);
    assert_eq!(log.count(Step::CloseSession), 1);

    let session = ScriptedSession::new().with_rows(PEOPLE, 2, people());
    let executor = Executor::new(session, ExecutorOptions::default())?;
    executor.close()?;
    let mut results = Results::new();
    let err = executor
        .query_all_into::<(i32, String), _>(&mut results, PEOPLE, (0,))
        .unwrap_err();
    assert!(matches!(err, ExecutorError::Connect(_)));
    assert!(!results.is_ok());
    Ok(())
}

#[test]
fn refused_connection_surfaces_connect_error() {
    let connector = ScriptedConnector::refusing("access denied for user 'app'");
    let err = Executor::connect(
        &connector,
        &ConnectOptions::new("db.internal", "app", "secret", "shop", 3306),
        ExecutorOptions::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(&err, ExecutorError::Connect(msg) if msg.contains("access denied")));
}

#[test]
fn connect_options_load_from_json() -> Result<(), ExecutorError> {
    let opts = ConnectOptions::from_json(
        r#"{"host": "localhost", "user": "app", "database": "shop"}"#,
    )?;
    let executor = Executor::connect(
        &ScriptedConnector::serving(ScriptedSession::new().with_affected("DELETE FROM carts", 4)),
        &opts,
        ExecutorOptions::default(),
    )?;
    assert_eq!(executor.execute("DELETE FROM carts", ())?, 4);
    assert!(ConnectOptions::from_json("{not json").is_err());
    Ok(())
}

#[test]
fn a_panicking_call_does_not_wedge_the_executor() -> Result<(), ExecutorError> {
    const BROKEN: &str = "SELECT id FROM broken";
    let session = ScriptedSession::new()
        .with_rows(PEOPLE, 2, people())
        .with_rows(BROKEN, 1, vec![vec![cell(1_i32)]])
        .panicking(BROKEN, Step::Execute);
    let log = session.log();
    let executor = std::sync::Arc::new(executor(session)?);

    let worker = {
        let executor = std::sync::Arc::clone(&executor);
        std::thread::spawn(move || executor.query_all::<(i32,), _>(BROKEN, ()))
    };
    assert!(worker.join().is_err());
    // the statement guard still ran while unwinding
    assert_eq!(log.steps_for(BROKEN).last(), Some(&Step::CloseStatement));

    assert!(!executor.is_closed());
    let results = executor.query_all::<(i32, String), _>(PEOPLE, (1,))?;
    assert_eq!(results.len(), 3);
    assert_eq!(results.rows[1], (2, "grace".to_string()));
    Ok(())
}
