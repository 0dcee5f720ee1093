//! End-to-end statement flow through `Db` and `Tx` with an in-memory executor.

mod common;

use common::{rows_of, tom, ConnectionReset, MemExecutor, TestModel};
use std::sync::Arc;
use structql::{
    assign, col, desc, with_table_name, Db, Executor, Inserter, OrmError, Postgres, Query,
    Registry, Selector, Session, Value,
};

fn jerry() -> TestModel {
    TestModel {
        id: 13,
        first_name: "Jerry".to_string(),
        age: 20,
        last_name: None,
    }
}

#[tokio::test]
async fn get_decodes_first_row() {
    let db = Db::new(MemExecutor::new().rows(rows_of(&[tom(), jerry()])));
    let got = Selector::<TestModel>::new(&db)
        .and_where(col("id").eq(12i64))
        .get()
        .await
        .unwrap();
    assert_eq!(got, tom());
}

#[tokio::test]
async fn get_on_empty_result_is_no_rows() {
    let db = Db::new(MemExecutor::new());
    let err = Selector::<TestModel>::new(&db).get().await.unwrap_err();
    assert!(err.is_no_rows());
}

#[tokio::test]
async fn get_multi_decodes_every_row() {
    for db in [
        Db::new(MemExecutor::new().rows(rows_of(&[tom(), jerry()]))),
        Db::new(MemExecutor::new().rows(rows_of(&[tom(), jerry()]))).use_reflect(),
    ] {
        let got = Selector::<TestModel>::new(&db)
            .order_by(desc("id"))
            .get_multi()
            .await
            .unwrap();
        assert_eq!(got, vec![tom(), jerry()]);
    }

    let db = Db::new(MemExecutor::new());
    let got = Selector::<TestModel>::new(&db).get_multi().await.unwrap();
    assert!(got.is_empty());
}

#[tokio::test]
async fn executor_receives_built_query() {
    let exec = Arc::new(MemExecutor::new().rows(rows_of(&[tom()])));
    let db = Db::from_arc(exec.clone()).with_dialect(Postgres);

    Selector::<TestModel>::new(&db)
        .and_where(col("age").gt(10i8))
        .limit(1)
        .get()
        .await
        .unwrap();

    assert_eq!(
        exec.seen(),
        vec![Query::new(
            r#"SELECT * FROM "test_model" WHERE "age" > $1 LIMIT $2;"#,
            vec![Value::I8(10), Value::I64(1)]
        )]
    );
}

#[tokio::test]
async fn exec_reports_rows_affected() {
    let exec = Arc::new(MemExecutor::new().rows_affected(2));
    let db = Db::from_arc(exec.clone());
    let (a, b) = (tom(), jerry());

    let res = Inserter::new(&db)
        .values([&a, &b])
        .on_duplicate_key()
        .update([assign("age", 30i8).into()])
        .exec()
        .await
        .unwrap();
    assert_eq!(res.rows_affected, 2);

    let seen = exec.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].sql.ends_with("ON DUPLICATE KEY UPDATE `age`=?;"));
    assert_eq!(seen[0].args.len(), 9);
}

#[tokio::test]
async fn build_errors_never_reach_the_executor() {
    let exec = Arc::new(MemExecutor::new());
    let db = Db::from_arc(exec.clone());

    let err = Selector::<TestModel>::new(&db)
        .and_where(col("nope").eq(1i64))
        .get()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::UnknownColumn(_)));

    let err = Inserter::<TestModel>::new(&db).exec().await.unwrap_err();
    assert!(matches!(err, OrmError::NoValues));

    assert!(exec.seen().is_empty());
}

#[tokio::test]
async fn storage_errors_pass_through() {
    let db = Db::new(MemExecutor::new().fail(OrmError::storage(ConnectionReset)));
    let err = Selector::<TestModel>::new(&db).get().await.unwrap_err();
    assert!(err.is_storage());
    let OrmError::Storage(source) = err else {
        unreachable!()
    };
    assert!(source.downcast_ref::<ConnectionReset>().is_some());

    let db = Db::new(MemExecutor::new().fail(OrmError::storage(ConnectionReset)));
    let t = tom();
    let err = Inserter::new(&db).values([&t]).exec().await.unwrap_err();
    assert_eq!(err.to_string(), "storage error: connection reset by peer");
}

#[tokio::test]
async fn tx_shares_the_db_core() {
    let registry = Arc::new(Registry::new());
    registry
        .register::<TestModel>([with_table_name("people")])
        .unwrap();
    let db = Db::new(MemExecutor::new()).with_registry(Arc::clone(&registry));

    let tx_exec = MemExecutor::new().rows(rows_of(&[jerry()]));
    let tx = db.tx(&tx_exec);
    assert!(Arc::ptr_eq(tx.core().registry(), db.core().registry()));

    let got = Selector::<TestModel>::new(&tx).get().await.unwrap();
    assert_eq!(got, jerry());
    assert_eq!(tx_exec.seen()[0].sql, "SELECT * FROM `people`;");
}

#[tokio::test]
async fn sessions_are_usable_as_trait_objects() {
    let db = Db::new(MemExecutor::new().rows_affected(1));
    let sessions: Vec<&dyn Session> = vec![&db];
    let t = tom();
    for sess in sessions {
        let res = Inserter::new(sess).values([&t]).exec().await.unwrap();
        assert_eq!(res.rows_affected, 1);
        assert_eq!(sess.executor().execute("SELECT 1;", &[]).await.unwrap(), 1);
    }
}

#[tokio::test]
async fn futures_are_send() {
    let db = Arc::new(Db::new(MemExecutor::new().rows(rows_of(&[tom()]))));
    let handle = tokio::spawn({
        let db = Arc::clone(&db);
        async move { Selector::<TestModel>::new(db.as_ref()).get().await }
    });
    assert_eq!(handle.await.unwrap().unwrap(), tom());
}
