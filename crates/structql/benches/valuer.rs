use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use structql::valuer::{reflect_creator, unsafe_creator};
use structql::{MemoryRows, Record, Registry, Value, Valuer, ValuerCreator};

#[derive(Debug, Default, Record)]
struct User {
    id: i64,
    first_name: String,
    age: i8,
    last_name: Option<String>,
    score: f64,
    active: bool,
}

fn user_rows() -> MemoryRows {
    MemoryRows::new(["id", "first_name", "age", "last_name", "score", "active"]).row([
        Value::I64(12),
        Value::from("Tom"),
        Value::I8(18),
        Value::from("Jerry"),
        Value::F64(99.5),
        Value::Bool(true),
    ])
}

fn bench_set_columns(c: &mut Criterion) {
    let registry = Registry::new();
    let model = registry.get::<User>().unwrap();
    let mut group = c.benchmark_group("valuer/set_columns");

    let creators: [(&str, ValuerCreator); 2] =
        [("reflect", reflect_creator), ("unsafe", unsafe_creator)];
    for (name, creator) in creators {
        group.bench_with_input(BenchmarkId::from_parameter(name), &creator, |b, creator| {
            b.iter_batched(
                user_rows,
                |mut rows| {
                    let mut user = User::default();
                    creator(&model, &mut user)
                        .unwrap()
                        .set_columns(&mut rows)
                        .unwrap();
                    black_box(user)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_set_columns);
criterion_main!(benches);
