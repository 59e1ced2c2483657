mod common;

use common::scenario_session;
use gridnav::action_log::{ActionLog, Outcome};
use gridnav::{Command, NavError, Position, SimState};

#[test]
fn test_save_load_replay() {
    let layout = "
        S.....
        ..##..
        ..#...
        .....T
    ";
    let mut session = scenario_session(layout);
    let mut log = ActionLog::new();

    log.execute(&mut session, Command::SetSensorRange { range: 4 }).unwrap();
    log.execute(&mut session, Command::ToggleObstacle { x: 4, y: 2 }).unwrap();
    log.execute(&mut session, Command::Start).unwrap();
    log.execute(&mut session, Command::Advance { elapsed_ms: 250 }).unwrap();
    assert!(log.execute(&mut session, Command::SetAgent { x: 6, y: 0 }).is_err());
    log.execute(&mut session, Command::Advance { elapsed_ms: 10_000 }).unwrap();
    assert_eq!(session.state(), SimState::Finished);

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("action_log.json");
    log.save_to_file(&file).unwrap();

    let entries = ActionLog::load_from_file(&file).unwrap();
    assert_eq!(entries, log.entries());
    assert!(matches!(entries[4].outcome, Outcome::Rejected { .. }));
    assert_eq!(entries[3].sim_clock_ms, 250);

    let mut replayed = scenario_session(layout);
    assert_eq!(ActionLog::replay(&entries, &mut replayed), 5);
    assert_eq!(replayed.state(), SimState::Finished);
    assert_eq!(replayed.agent_position(), Position::new(5, 3));
    assert_eq!(replayed.agent_position(), session.agent_position());
    assert_eq!(replayed.stats(), session.stats());
    assert_eq!(replayed.reading(), session.reading());
}

#[test]
fn test_load_missing_or_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        ActionLog::load_from_file(dir.path().join("missing.json")),
        Err(NavError::Io(_))
    ));

    let corrupt = dir.path().join("corrupt.json");
    std::fs::write(&corrupt, "[{\"timestamp_ms\": 1}]").unwrap();
    assert!(matches!(ActionLog::load_from_file(&corrupt), Err(NavError::Json(_))));
}
