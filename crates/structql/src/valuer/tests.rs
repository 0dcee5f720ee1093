use super::*;
use crate::model::Registry;
use crate::rows::MemoryRows;
use crate::test_util::{test_model_rows, TestModel};
use crate::value::Value;
use crate::Record;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Wide {
    flag: bool,
    small: i16,
    medium: i32,
    oid: u32,
    ratio: f32,
    score: f64,
    blob: Vec<u8>,
    key: Uuid,
    at: chrono::DateTime<Utc>,
    doc: serde_json::Value,
    maybe_score: Option<f64>,
    maybe_key: Option<Uuid>,
}

const CREATORS: [(&str, ValuerCreator); 2] = [("reflect", reflect_creator), ("unsafe", unsafe_creator)];

fn fill<T: Record + Default>(creator: ValuerCreator, rows: &mut MemoryRows) -> OrmResult<T> {
    let registry = Registry::new();
    let model = registry.get::<T>()?;
    let mut record = T::default();
    let mut valuer = creator(&model, &mut record)?;
    valuer.set_columns(rows)?;
    drop(valuer);
    Ok(record)
}

#[test]
fn test_set_columns() {
    let tom = TestModel::tom();
    for (name, creator) in CREATORS {
        let mut rows = test_model_rows(std::slice::from_ref(&tom));
        let got: TestModel = fill(creator, &mut rows).unwrap();
        assert_eq!(got, tom, "{name}");
    }
}

#[test]
fn test_set_columns_null_and_partial() {
    let rows = || {
        MemoryRows::new(["last_name", "first_name"]).row([Value::Null, Value::from("Tom")])
    };
    for (name, creator) in CREATORS {
        let got: TestModel = fill(creator, &mut rows()).unwrap();
        assert_eq!(
            got,
            TestModel {
                first_name: "Tom".to_string(),
                ..Default::default()
            },
            "{name}"
        );
    }
}

#[test]
fn test_no_rows() {
    for (name, creator) in CREATORS {
        let mut rows = test_model_rows(&[]);
        let err = fill::<TestModel>(creator, &mut rows).unwrap_err();
        assert!(matches!(err, OrmError::NoRows), "{name}: {err}");
    }
}

#[test]
fn test_too_many_columns() {
    let rows = || {
        MemoryRows::new(["id", "first_name", "age", "last_name", "extra"]).row([
            Value::I64(1),
            Value::from("Tom"),
            Value::I8(18),
            Value::Null,
            Value::I64(0),
        ])
    };
    for (name, creator) in CREATORS {
        let err = fill::<TestModel>(creator, &mut rows()).unwrap_err();
        assert!(
            matches!(err, OrmError::TooManyColumns { got: 5, max: 4 }),
            "{name}: {err}"
        );
    }
}

#[test]
fn test_unknown_column() {
    let rows = || MemoryRows::new(["id", "nickname"]).row([Value::I64(1), Value::from("T")]);
    for (name, creator) in CREATORS {
        let err = fill::<TestModel>(creator, &mut rows()).unwrap_err();
        assert!(
            matches!(err, OrmError::UnknownColumn(ref c) if c == "nickname"),
            "{name}: {err}"
        );
    }
}

#[test]
fn test_decode_error() {
    let rows = || MemoryRows::new(["age"]).row([Value::I64(300)]);
    for (name, creator) in CREATORS {
        let err = fill::<TestModel>(creator, &mut rows()).unwrap_err();
        assert!(
            matches!(err, OrmError::Decode { ref column, .. } if column == "age"),
            "{name}: {err}"
        );
    }
}

#[test]
fn test_model_mismatch() {
    let registry = Registry::new();
    let model = registry.get::<TestModel>().unwrap();
    let mut wrong = Wide::default();
    for (name, creator) in CREATORS {
        let err = creator(&model, &mut wrong).err().unwrap();
        assert!(matches!(err, OrmError::ModelMismatch { .. }), "{name}");
    }
}

#[test]
fn test_valuers_agree_on_every_type() {
    let key = Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0);
    let at = Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap();
    let rows = || {
        MemoryRows::new([
            "flag",
            "small",
            "medium",
            "oid",
            "ratio",
            "score",
            "blob",
            "key",
            "at",
            "doc",
            "maybe_score",
            "maybe_key",
        ])
        .row([
            Value::Bool(true),
            Value::I16(-7),
            Value::I64(70_000),
            Value::U32(42),
            Value::F32(0.5),
            Value::F64(99.25),
            Value::Bytes(vec![1, 2, 3]),
            Value::Text(key.to_string()),
            Value::Timestamp(at),
            Value::Json(serde_json::json!({"a": [1, 2]})),
            Value::Null,
            Value::Uuid(key),
        ])
    };

    let safe: Wide = fill(reflect_creator, &mut rows()).unwrap();
    let raw: Wide = fill(unsafe_creator, &mut rows()).unwrap();
    assert_eq!(safe, raw);
    assert_eq!(
        raw,
        Wide {
            flag: true,
            small: -7,
            medium: 70_000,
            oid: 42,
            ratio: 0.5,
            score: 99.25,
            blob: vec![1, 2, 3],
            key,
            at,
            doc: serde_json::json!({"a": [1, 2]}),
            maybe_score: None,
            maybe_key: Some(key),
        }
    );
}

#[test]
fn test_overwrites_existing_heap_fields() {
    let registry = Registry::new();
    let model = registry.get::<TestModel>().unwrap();
    for (name, creator) in CREATORS {
        let mut record = TestModel {
            first_name: "old".repeat(64),
            last_name: Some("old".to_string()),
            ..Default::default()
        };
        let mut rows = MemoryRows::new(["first_name", "last_name"])
            .row([Value::from("new"), Value::Null]);
        creator(&model, &mut record)
            .unwrap()
            .set_columns(&mut rows)
            .unwrap();
        assert_eq!(record.first_name, "new", "{name}");
        assert_eq!(record.last_name, None, "{name}");
    }
}
