#![cfg(feature = "persistent")]

use std::fs::{self, OpenOptions};

use heatquiz::storage::persistent::LOG_FILE;
use heatquiz::storage::{open_record_store, PersistentConfig, PersistentConnector};
use heatquiz::{
    EnvironmentalInput, HazardAnswer, PersistenceError, QuizError, QuizSession, RecordGateway,
    RecordStore,
};
use tempfile::tempdir;

fn gateway_at(dir: &std::path::Path) -> RecordGateway {
    RecordGateway::new(PersistentConnector::new(dir, PersistentConfig::default()))
}

fn played_session() -> QuizSession {
    let mut session = QuizSession::new();
    session.run_simulation(EnvironmentalInput::new(40, 20, false));
    session.run_simulation(EnvironmentalInput::new(30, 60, true));
    session
}

#[test]
fn submissions_survive_reopen() {
    let dir = tempdir().unwrap();
    let session = played_session();

    let (first, second) = {
        let gateway = gateway_at(dir.path());
        let first = session.submit("Lin", HazardAnswer::HeatStroke, &gateway).unwrap();
        let second = session.submit("Ana", "Dehydration", &gateway).unwrap();
        (first, second)
    };

    let gateway = gateway_at(dir.path());
    let fetched = gateway.fetch_all().unwrap();
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].id, second);
    assert_eq!(fetched[1].id, first);
    assert_eq!(fetched[1].user_name, "Lin");
    assert_eq!(fetched[1].hazard(), Some(HazardAnswer::HeatStroke));
    assert_eq!(fetched[1].history, session.history().snapshot().into_vec());

    // New submissions still sort after the replayed ones
    let third = session.submit("Kai", HazardAnswer::NoRisk, &gateway).unwrap();
    let fetched = gateway.fetch_all().unwrap();
    assert_eq!(fetched[0].id, third);
    assert!(fetched[0].submit_time > fetched[1].submit_time);
}

#[test]
fn torn_tail_is_trimmed_on_reopen() {
    let dir = tempdir().unwrap();
    let session = played_session();

    {
        let gateway = gateway_at(dir.path());
        session.submit("Lin", HazardAnswer::HeatStroke, &gateway).unwrap();
        session.submit("Ana", HazardAnswer::Dehydration, &gateway).unwrap();
    }

    let log_path = dir.path().join(LOG_FILE);
    let len = fs::metadata(&log_path).unwrap().len();
    let file = OpenOptions::new().write(true).open(&log_path).unwrap();
    file.set_len(len - 3).unwrap();
    drop(file);

    let store = open_record_store(dir.path(), None).unwrap();
    let rows = store.select_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_name, "Lin");
    assert!(fs::metadata(&log_path).unwrap().len() < len - 3);
}

#[test]
fn corrupted_log_fails_to_connect() {
    let dir = tempdir().unwrap();
    {
        let gateway = gateway_at(dir.path());
        played_session()
            .submit("Lin", HazardAnswer::HeatStroke, &gateway)
            .unwrap();
    }

    let log_path = dir.path().join(LOG_FILE);
    let mut bytes = fs::read(&log_path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&log_path, bytes).unwrap();

    let gateway = gateway_at(dir.path());
    let err = gateway.fetch_all().unwrap_err();
    assert!(matches!(err, PersistenceError::ConnectionFailed { .. }));
    assert!(err.is_retryable());
    assert!(!gateway.is_connected());
}

#[test]
fn damaged_frame_length_fails_open_and_keeps_later_records() {
    let dir = tempdir().unwrap();
    {
        let gateway = gateway_at(dir.path());
        let session = played_session();
        for name in ["Lin", "Ana", "Kai"] {
            session.submit(name, HazardAnswer::HeatStroke, &gateway).unwrap();
        }
    }

    // Header is 5 bytes, then the first frame's version byte and 4-byte length
    let log_path = dir.path().join(LOG_FILE);
    let original = fs::read(&log_path).unwrap();
    let mut damaged = original.clone();
    damaged[8] ^= 0xFF;
    fs::write(&log_path, &damaged).unwrap();

    let err = open_record_store(dir.path(), None).unwrap_err();
    assert!(matches!(
        err,
        QuizError::Persistence(PersistenceError::ConnectionFailed { .. })
    ));
    assert_eq!(fs::read(&log_path).unwrap(), damaged);

    // Repairing the byte brings every record back
    fs::write(&log_path, &original).unwrap();
    let store = open_record_store(dir.path(), None).unwrap();
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn locked_directory_fails_until_released() {
    let dir = tempdir().unwrap();
    let holder = open_record_store(dir.path(), None).unwrap();

    let err = open_record_store(dir.path(), None).unwrap_err();
    assert!(matches!(
        err,
        QuizError::Persistence(PersistenceError::ConnectionFailed { .. })
    ));

    let gateway = gateway_at(dir.path());
    let err = gateway.count().unwrap_err();
    assert!(matches!(err, PersistenceError::ConnectionFailed { .. }));

    drop(holder);
    assert_eq!(gateway.count().unwrap(), 0);
    assert!(gateway.is_connected());
}

#[test]
fn blank_fields_are_rejected_by_the_file_store() {
    let dir = tempdir().unwrap();
    let store = open_record_store(dir.path(), None).unwrap();

    let err = store
        .insert(heatquiz::storage::NewRecordRow {
            user_name: "  ".to_string(),
            answer: "HeatStroke".to_string(),
            history_data: "[]".to_string(),
        })
        .unwrap_err();
    assert!(err.to_string().to_lowercase().contains("user_name"));
    assert_eq!(store.count().unwrap(), 0);
}
