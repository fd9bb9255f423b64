use quizpoll_core::db::open_db_in_memory;
use quizpoll_core::{
    Comment, CommentError, CommentRepository, CommentService, Identity, PollStore,
    SqliteCommentRepository, SqliteVoteStore,
};
use uuid::Uuid;

#[test]
fn posting_requires_identity() {
    let conn = open_db_in_memory().unwrap();
    let service = CommentService::new(
        SqliteCommentRepository::try_new(&conn).unwrap(),
        SqliteVoteStore::try_new(&conn).unwrap(),
    );

    let err = service.post_comment("intro", "hello").unwrap_err();

    assert!(matches!(err, CommentError::IdentityRequired));
    assert!(service.list_comments("intro").unwrap().is_empty());
}

#[test]
fn posted_comment_carries_author_and_trimmed_body() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteVoteStore::try_new(&conn).unwrap();
    store.set_identity(&Identity::parse("Alice").unwrap()).unwrap();
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap(), store);

    let comment = service.post_comment(" intro ", "  first!  ").unwrap();

    assert_eq!(comment.author, "Alice");
    assert_eq!(comment.body, "first!");
    assert_eq!(service.list_comments("intro").unwrap(), vec![comment]);
}

#[test]
fn empty_body_or_page_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteVoteStore::try_new(&conn).unwrap();
    store.set_identity(&Identity::parse("Alice").unwrap()).unwrap();
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap(), store);

    assert!(matches!(
        service.post_comment("intro", "   "),
        Err(CommentError::EmptyBody)
    ));
    assert!(matches!(
        service.post_comment("", "text"),
        Err(CommentError::EmptyPageId)
    ));
}

#[test]
fn comments_list_newest_first_and_per_page() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    for (page_id, created_at) in [("intro", 10), ("intro", 30), ("other", 20), ("intro", 20)] {
        repo.append_comment(&Comment {
            id: Uuid::new_v4(),
            page_id: page_id.to_string(),
            author: "Alice".to_string(),
            body: format!("at {created_at}"),
            created_at,
        })
        .unwrap();
    }

    let listed = repo.list_comments("intro").unwrap();

    let timestamps: Vec<i64> = listed.iter().map(|comment| comment.created_at).collect();
    assert_eq!(timestamps, vec![30, 20, 10]);
}

#[test]
fn same_timestamp_comments_list_latest_insert_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    for body in ["first", "second", "third", "fourth"] {
        repo.append_comment(&Comment {
            id: Uuid::new_v4(),
            page_id: "intro".to_string(),
            author: "Alice".to_string(),
            body: body.to_string(),
            created_at: 1_000,
        })
        .unwrap();
    }

    let bodies: Vec<String> = repo
        .list_comments("intro")
        .unwrap()
        .into_iter()
        .map(|comment| comment.body)
        .collect();
    assert_eq!(bodies, vec!["fourth", "third", "second", "first"]);
}
