use std::sync::Arc;

use arrow_array::{Int64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema, SchemaRef};

use lakescan::{DataReader, Error, MemoryEngine, PullGate};

fn test_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]))
}

fn batch(values: &[i64]) -> RecordBatch {
    RecordBatch::try_new(
        test_schema(),
        vec![Arc::new(Int64Array::from(values.to_vec()))],
    )
    .unwrap()
}

#[tokio::test]
async fn overlapping_pulls_fail_fast() {
    let gate = Arc::new(PullGate::default());
    let engine = Arc::new(
        MemoryEngine::new(vec![batch(&[1]), batch(&[2])]).with_gate(Arc::clone(&gate)),
    );
    let reader = Arc::new(
        DataReader::new(engine.clone(), test_schema(), vec![], vec![], vec![]).unwrap(),
    );
    reader.start().unwrap();

    let background = Arc::clone(&reader);
    let pull = tokio::spawn(async move { background.read_batch().await });

    // Wait until the first pull is parked inside the engine, then overlap.
    gate.entered.notified().await;
    let err = reader.read_batch().await.err().unwrap();
    assert!(matches!(err, Error::ConcurrentAccess));
    // The overlapping pull never reached the engine.
    assert_eq!(engine.pulls(), 1);

    gate.release.notify_one();
    let first = pull.await.unwrap().unwrap().unwrap();
    assert_eq!(first.num_rows(), 1);

    // With the first pull resolved, the reader accepts pulls again.
    gate.release.notify_one();
    let second = reader.read_batch().await.unwrap().unwrap();
    assert_eq!(second.num_rows(), 1);
    assert_eq!(engine.pulls(), 2);
}

#[tokio::test]
async fn finished_reader_accepts_pulls_from_any_task() {
    let engine = Arc::new(MemoryEngine::new(vec![batch(&[1])]));
    let reader = Arc::new(
        DataReader::new(engine.clone(), test_schema(), vec![], vec![], vec![]).unwrap(),
    );
    reader.start().unwrap();

    assert!(reader.read_batch().await.unwrap().is_some());
    assert!(reader.read_batch().await.unwrap().is_none());
    assert!(reader.is_finished());

    let pulls_at_finish = engine.pulls();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reader = Arc::clone(&reader);
            tokio::spawn(async move { reader.read_batch().await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_none());
    }
    assert_eq!(engine.pulls(), pulls_at_finish);
}
