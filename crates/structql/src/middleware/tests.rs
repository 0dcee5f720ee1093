use super::querylog::MiddlewareBuilder;
use super::*;
use crate::error::OrmError;
use crate::test_util::{test_model_rows, MockExecutor, TestModel};
use crate::{col, Db, Inserter, Query, Selector, Value};
use futures_util::FutureExt;
use std::sync::Mutex;
use std::time::Duration;

/// Middleware that appends `name` to `log` on the way in and on the way out.
fn tracer(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Middleware {
    middleware(move |next| {
        let log = Arc::clone(&log);
        handler(move |qc| {
            let log = Arc::clone(&log);
            let next = Arc::clone(&next);
            async move {
                log.lock().unwrap().push(format!("{name}:{}", qc.query_type));
                let result = next(qc).await;
                log.lock().unwrap().push(format!("{name}:done"));
                result
            }
            .boxed()
        })
    })
}

#[test]
fn test_query_type_display() {
    assert_eq!(QueryType::Select.to_string(), "SELECT");
    assert_eq!(QueryType::Insert.to_string(), "INSERT");
}

#[tokio::test]
async fn test_last_registered_runs_outermost() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let db = Db::new(MockExecutor::new().with_rows(test_model_rows(&[TestModel::tom()])))
        .with_middleware(tracer("first", Arc::clone(&log)))
        .with_middleware(tracer("second", Arc::clone(&log)));

    let got = Selector::<TestModel>::new(&db).get().await.unwrap();
    assert_eq!(got, TestModel::tom());
    assert_eq!(
        *log.lock().unwrap(),
        [
            "second:SELECT",
            "first:SELECT",
            "first:done",
            "second:done"
        ]
    );
}

#[tokio::test]
async fn test_short_circuit_skips_executor() {
    let db = Db::new(MockExecutor::new()).with_middleware(middleware(|_next| {
        handler(|_qc| async { Err(OrmError::validation("blocked")) }.boxed())
    }));

    let tom = TestModel::tom();
    let err = Inserter::new(&db).values([&tom]).exec().await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(ref m) if m == "blocked"));
}

#[tokio::test]
async fn test_querylog_sees_the_executed_query() {
    let logged = Arc::new(Mutex::new(Vec::<Query>::new()));
    let sink = Arc::clone(&logged);
    let db = Db::new(MockExecutor::new().with_rows(test_model_rows(&[TestModel::tom()])))
        .with_middleware(
            MiddlewareBuilder::new()
                .log_fn(move |sql, args| {
                    sink.lock().unwrap().push(Query::new(sql, args.to_vec()));
                })
                .build(),
        );

    Selector::<TestModel>::new(&db)
        .and_where(col("age").gt(10i8))
        .get()
        .await
        .unwrap();

    let logged = logged.lock().unwrap().clone();
    assert_eq!(
        logged,
        vec![Query::new(
            "SELECT * FROM `test_model` WHERE `age` > ?;",
            vec![Value::I8(10)]
        )]
    );
}

#[tokio::test]
async fn test_querylog_build_error_stops_the_chain() {
    let logged = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&logged);
    let db = Db::new(MockExecutor::new()).with_middleware(
        MiddlewareBuilder::new()
            .log_fn(move |_, _| *sink.lock().unwrap() += 1)
            .build(),
    );

    let err = Selector::<TestModel>::new(&db)
        .and_where(col("nope").eq(1i64))
        .get()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::UnknownColumn(_)));
    assert_eq!(*logged.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_querylog_reports_slow_queries() {
    let slow = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&slow);
    let sleepy = middleware(|next| {
        handler(move |qc| {
            let next = Arc::clone(&next);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                next(qc).await
            }
            .boxed()
        })
    });
    let db = Db::new(MockExecutor::new().with_rows_affected(1))
        .with_middleware(sleepy)
        .with_middleware(
            MiddlewareBuilder::new()
                .slow_threshold(Duration::from_millis(5))
                .log_fn(|_, _| {})
                .slow_fn(move |sql, elapsed| {
                    assert!(elapsed >= Duration::from_millis(5));
                    sink.lock().unwrap().push(sql.to_string());
                })
                .build(),
        );

    let tom = TestModel::tom();
    let res = Inserter::new(&db).values([&tom]).exec().await.unwrap();
    assert_eq!(res.rows_affected, 1);
    let slow = slow.lock().unwrap().clone();
    assert_eq!(slow.len(), 1);
    assert!(slow[0].starts_with("INSERT INTO `test_model`"));
}

#[tokio::test]
async fn test_querylog_fast_queries_are_not_reported() {
    let slow = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&slow);
    let db = Db::new(MockExecutor::new().with_rows(test_model_rows(&[TestModel::tom()])))
        .with_middleware(
            MiddlewareBuilder::new()
                .slow_threshold(Duration::from_secs(60))
                .slow_fn(move |_, _| *sink.lock().unwrap() += 1)
                .build(),
        );

    Selector::<TestModel>::new(&db).get().await.unwrap();
    assert_eq!(*slow.lock().unwrap(), 0);
}
