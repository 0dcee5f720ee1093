//! Registry behavior under concurrency, with a hand-written `Record` impl.

use std::mem::offset_of;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use structql::{wrong_record, FieldDescriptor, FieldValue, Record, Registry};

static PARSES: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Default)]
struct Counted {
    id: i64,
    nick_name: Option<String>,
}

impl Record for Counted {
    fn type_name() -> &'static str {
        "Counted"
    }

    fn fields() -> Vec<FieldDescriptor> {
        PARSES.fetch_add(1, Ordering::SeqCst);
        // SAFETY: each offset is taken from the field whose type is passed.
        unsafe {
            vec![
                FieldDescriptor::new::<i64>(
                    "id",
                    "",
                    offset_of!(Counted, id),
                    |r| r.downcast_ref::<Counted>().map(|r| r.id.to_value()),
                    |r, v| {
                        let r = r
                            .downcast_mut::<Counted>()
                            .ok_or_else(|| wrong_record("Counted"))?;
                        r.id = FieldValue::from_value(v)?;
                        Ok(())
                    },
                ),
                FieldDescriptor::new::<Option<String>>(
                    "nick_name",
                    "column=nick",
                    offset_of!(Counted, nick_name),
                    |r| r.downcast_ref::<Counted>().map(|r| r.nick_name.to_value()),
                    |r, v| {
                        let r = r
                            .downcast_mut::<Counted>()
                            .ok_or_else(|| wrong_record("Counted"))?;
                        r.nick_name = FieldValue::from_value(v)?;
                        Ok(())
                    },
                ),
            ]
        }
    }
}

#[test]
fn concurrent_first_lookups_parse_once() {
    const THREADS: usize = 16;
    let registry = Arc::new(Registry::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.get::<Counted>().unwrap()
            })
        })
        .collect();

    let models: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(PARSES.load(Ordering::SeqCst), 1);
    assert!(models.iter().all(|m| Arc::ptr_eq(m, &models[0])));

    let model = &models[0];
    assert_eq!(model.table_name(), "counted");
    assert_eq!(model.field("nick_name").unwrap().column(), "nick");
    assert_eq!(registry.len(), 1);
}
