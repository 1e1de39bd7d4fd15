use mailindex::test_support::{TestMaildir, TestMessage};
use mailindex::{Database, SortOrder, Status};

fn indexed() -> (TestMaildir, Database) {
    let maildir = TestMaildir::new();
    let mut db = maildir.create_database();

    let messages = [
        TestMessage::new("1@test")
            .subject("Lunch plans")
            .date("Mon, 1 Jan 2024 12:00:00 +0000"),
        TestMessage::new("2@test")
            .references(&["1@test"])
            .sender("Carol <carol@example.org>")
            .subject("Re: Lunch plans")
            .body("Noon works for me.")
            .date("Tue, 2 Jan 2024 12:00:00 +0000"),
        TestMessage::new("3@test")
            .subject("Quarterly report")
            .date("Mon, 1 Apr 2024 09:30:00 +0000"),
    ];
    for (i, message) in messages.iter().enumerate() {
        let path = maildir.write(&i.to_string(), &message.render());
        db.add_message(&path).unwrap();
    }
    (maildir, db)
}

fn ids(messages: &[mailindex::Message]) -> Vec<&str> {
    messages
        .iter()
        .map(|m| m.message_id.as_deref().unwrap_or(""))
        .collect()
}

#[test]
fn empty_query_returns_everything_newest_first() {
    let (_maildir, db) = indexed();
    let all = db.search("", SortOrder::NewestFirst).unwrap();
    assert_eq!(ids(&all), vec!["3@test", "2@test", "1@test"]);

    let oldest = db.search("*", SortOrder::OldestFirst).unwrap();
    assert_eq!(ids(&oldest), vec!["1@test", "2@test", "3@test"]);
}

#[test]
fn search_by_thread() {
    let (_maildir, db) = indexed();
    let first = db.find_message("1@test").unwrap().unwrap();
    let thread = first.thread_id().unwrap();

    let hits = db.search(&format!("thread:{}", thread), SortOrder::OldestFirst).unwrap();
    assert_eq!(ids(&hits), vec!["1@test", "2@test"]);
}

#[test]
fn search_by_sender() {
    let (_maildir, db) = indexed();
    let hits = db.search("from:carol@example.org", SortOrder::NewestFirst).unwrap();
    assert_eq!(ids(&hits), vec!["2@test"]);

    let others = db.search("-from:carol@example.org", SortOrder::NewestFirst).unwrap();
    assert_eq!(ids(&others), vec!["3@test", "1@test"]);
}

#[test]
fn search_by_date_range() {
    // 2024-01-01T00:00:00Z .. 2024-01-31T00:00:00Z
    let (_maildir, db) = indexed();
    let january = db.search("date:1704067200..1706659200", SortOrder::OldestFirst).unwrap();
    assert_eq!(ids(&january), vec!["1@test", "2@test"]);

    let since_march = db.search("date:2024-03-01..", SortOrder::OldestFirst).unwrap();
    assert_eq!(ids(&since_march), vec!["3@test"]);

    let single_day = db.search("date:2024-01-02", SortOrder::OldestFirst).unwrap();
    assert_eq!(ids(&single_day), vec!["2@test"]);
}

#[test]
fn bare_words_match_subject_and_body() {
    let (_maildir, db) = indexed();
    let lunch = db.search("lunch", SortOrder::OldestFirst).unwrap();
    assert_eq!(ids(&lunch), vec!["1@test", "2@test"]);

    let noon = db.search("noon", SortOrder::OldestFirst).unwrap();
    assert_eq!(ids(&noon), vec!["2@test"]);

    let both = db.search("lunch subject:re", SortOrder::OldestFirst).unwrap();
    assert_eq!(ids(&both), vec!["2@test"]);
}

#[test]
fn threads_group_matches() {
    let (_maildir, db) = indexed();
    let threads = db.search_threads("", SortOrder::NewestFirst).unwrap();
    assert_eq!(threads.len(), 2);

    assert_eq!(threads[0].matched, 1);
    assert_eq!(threads[0].subject, "Quarterly report");

    let lunch = &threads[1];
    assert_eq!(lunch.matched, 2);
    assert_eq!(lunch.subject, "Lunch plans");
    assert_eq!(lunch.authors, vec!["carol@example.org", "ann@example.com"]);
    assert!(lunch.oldest < lunch.newest);
}

#[test]
fn invalid_query_is_rejected() {
    let (_maildir, db) = indexed();
    let err = db.search("thread:", SortOrder::NewestFirst).err().expect("rejected");
    assert_eq!(err.status(), Status::InvalidQuery);
}
