use quizpoll_core::db::open_db_in_memory;
use quizpoll_core::{Aggregate, AppliedVote, Identity, PollStore, SqliteVoteStore};

fn alice() -> Identity {
    Identity::parse("Alice").unwrap()
}

fn seeds(entries: &[(&str, u64)]) -> Aggregate {
    entries
        .iter()
        .map(|(option_id, count)| (option_id.to_string(), *count))
        .collect()
}

#[test]
fn sqlite_identity_is_absent_then_overwritten() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteVoteStore::try_new(&conn).unwrap();

    assert_eq!(store.identity().unwrap(), None);
    store.set_identity(&alice()).unwrap();
    store
        .set_identity(&Identity::parse("Bob").unwrap())
        .unwrap();

    assert_eq!(store.identity().unwrap().unwrap().as_str(), "Bob");
}

#[test]
fn sqlite_seed_counts_only_inserts_missing_keys() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteVoteStore::try_new(&conn).unwrap();

    assert_eq!(store.seed_counts(&seeds(&[("a", 2), ("b", 3)])).unwrap(), 2);
    assert_eq!(store.seed_counts(&seeds(&[("a", 5), ("c", 1)])).unwrap(), 1);

    let aggregate = store.aggregate().unwrap();
    assert_eq!(aggregate.count("a"), 2);
    assert_eq!(aggregate.count("b"), 3);
    assert_eq!(aggregate.count("c"), 1);
}

#[test]
fn sqlite_apply_vote_returns_previous_choice() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteVoteStore::try_new(&conn).unwrap();
    let voter = alice();

    let first = store.apply_vote(&voter, "q1", "opt-1").unwrap();
    assert_eq!(first, AppliedVote { previous: None, count: 1 });
    let second = store.apply_vote(&voter, "q1", "opt-2").unwrap();
    assert_eq!(second.previous.as_deref(), Some("opt-1"));

    let ballots = store.ballots(&voter).unwrap();
    assert_eq!(ballots.len(), 1);
    assert_eq!(ballots.choice("q1"), Some("opt-2"));
    let aggregate = store.aggregate().unwrap();
    assert_eq!(aggregate.count("opt-1"), 0);
    assert_eq!(aggregate.count("opt-2"), 1);
}

#[test]
fn sqlite_ballots_are_scoped_per_voter() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteVoteStore::try_new(&conn).unwrap();
    let bob = Identity::parse("Bob").unwrap();

    store.apply_vote(&alice(), "q1", "opt-1").unwrap();
    let applied = store.apply_vote(&bob, "q1", "opt-1").unwrap();

    assert_eq!(applied, AppliedVote { previous: None, count: 2 });
    assert_eq!(store.ballots(&alice()).unwrap().choice("q1"), Some("opt-1"));
    assert_eq!(store.ballots(&bob).unwrap().choice("q1"), Some("opt-1"));
}

#[test]
fn sqlite_released_vote_is_floored_at_zero() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteVoteStore::try_new(&conn).unwrap();
    let voter = alice();
    store.apply_vote(&voter, "q1", "opt-1").unwrap();
    store.apply_vote(&voter, "q2", "opt-x").unwrap();
    conn.execute_batch(
        "UPDATE vote_counts SET vote_count = 0 WHERE option_id = 'opt-1';
         DELETE FROM vote_counts WHERE option_id = 'opt-x';",
    )
    .unwrap();

    store.apply_vote(&voter, "q1", "opt-2").unwrap();
    store.apply_vote(&voter, "q2", "opt-y").unwrap();

    let aggregate = store.aggregate().unwrap();
    assert_eq!(aggregate.count("opt-1"), 0);
    assert_eq!(aggregate.count("opt-2"), 1);
    assert!(!aggregate.contains("opt-x"));
    assert_eq!(aggregate.count("opt-y"), 1);
}

#[test]
fn sqlite_negative_counts_are_floored_on_read_and_write() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO vote_counts (option_id, vote_count) VALUES ('tampered', -3);",
        [],
    )
    .unwrap();
    let store = SqliteVoteStore::try_new(&conn).unwrap();

    assert_eq!(store.aggregate().unwrap().count("tampered"), 0);
    let applied = store.apply_vote(&alice(), "q1", "tampered").unwrap();
    assert_eq!(applied.count, 1);
}

#[test]
fn sqlite_failed_vote_rolls_back_ballot_and_counts() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteVoteStore::try_new(&conn).unwrap();
    let voter = alice();
    store
        .seed_counts(&seeds(&[("opt-1", 4), ("opt-2", 3), ("opt-3", 2)]))
        .unwrap();
    store.apply_vote(&voter, "q1", "opt-2").unwrap();
    let before = store.aggregate().unwrap();

    // Counting opt-3 fails after the ballot swap and the opt-2 release ran.
    conn.execute_batch(
        "CREATE TRIGGER reject_opt3 BEFORE UPDATE ON vote_counts
         WHEN NEW.option_id = 'opt-3'
         BEGIN SELECT RAISE(ABORT, 'opt-3 is locked'); END;",
    )
    .unwrap();
    assert!(store.apply_vote(&voter, "q1", "opt-3").is_err());

    assert_eq!(store.aggregate().unwrap(), before);
    assert_eq!(store.ballots(&voter).unwrap().choice("q1"), Some("opt-2"));

    conn.execute_batch("DROP TRIGGER reject_opt3;").unwrap();
    let applied = store.apply_vote(&voter, "q1", "opt-3").unwrap();

    assert_eq!(applied.previous.as_deref(), Some("opt-2"));
    let after = store.aggregate().unwrap();
    assert_eq!(after.count("opt-1"), 4);
    assert_eq!(after.count("opt-2"), 3);
    assert_eq!(after.count("opt-3"), 3);
}
