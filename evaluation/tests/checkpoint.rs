use std::fs;

use evaluation::checkpoint::read;
use evaluation::{
    CheckpointError, CheckpointStore, EvaluatorParameters, LearnedWeights, PieceValues,
};

fn trained() -> EvaluatorParameters {
    let mut weights = LearnedWeights::default();
    for (i, w) in weights.0.iter_mut().enumerate() {
        *w = 0.1 * i as f32 - 0.37;
    }
    let mut params = EvaluatorParameters::default().with_learned(weights);
    params.piece_values = PieceValues {
        knight_value_mg: 312.5,
        ..PieceValues::default()
    };
    params
}

#[test]
fn save_then_load_reproduces_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::open(dir.path()).unwrap();

    let params = trained();
    let handle = store.save(&params).unwrap();
    assert_eq!(handle.version, 0);

    let loaded = store.load(&handle).unwrap();
    assert_eq!(loaded, params);

    let second = store.save(&loaded.with_learned(LearnedWeights::default())).unwrap();
    assert_eq!(second.version, 1);
    assert_eq!(store.versions().unwrap(), vec![0, 1]);
}

#[test]
fn flipped_byte_is_reported_as_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::open(dir.path()).unwrap();
    let handle = store.save(&trained()).unwrap();

    let mut bytes = fs::read(&handle.path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x5a;
    fs::write(&handle.path, bytes).unwrap();

    assert!(matches!(
        store.load(&handle),
        Err(CheckpointError::Corrupted { .. })
    ));
}

#[test]
fn truncated_or_garbage_files_are_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::open(dir.path()).unwrap();
    let handle = store.save(&trained()).unwrap();

    let bytes = fs::read(&handle.path).unwrap();
    fs::write(&handle.path, &bytes[..bytes.len() / 2]).unwrap();
    assert!(matches!(read(&handle.path), Err(CheckpointError::Corrupted { .. })));

    fs::write(&handle.path, b"not a checkpoint").unwrap();
    assert!(matches!(read(&handle.path), Err(CheckpointError::Corrupted { .. })));

    let missing = dir.path().join("nope.safetensors");
    assert!(matches!(read(&missing), Err(CheckpointError::NotFound(_))));
}

#[test]
fn load_latest_falls_back_to_last_good_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::open(dir.path()).unwrap();

    let good = trained();
    store.save(&good).unwrap();
    let bad = store.save(&good.with_learned(LearnedWeights::default())).unwrap();
    fs::write(&bad.path, b"garbage").unwrap();

    // an interrupted save leaves only a temp file behind
    fs::create_dir_all(dir.path().join("v2")).unwrap();
    fs::write(dir.path().join("v2/params.safetensors.tmp"), b"partial").unwrap();

    let (params, handle) = store.load_latest();
    assert_eq!(params, good);
    assert_eq!(handle.map(|h| h.version), Some(0));
}

#[test]
fn load_latest_defaults_when_nothing_usable() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::open(dir.path()).unwrap();
    let (params, handle) = store.load_latest();
    assert_eq!(params, EvaluatorParameters::default());
    assert!(handle.is_none());
}
