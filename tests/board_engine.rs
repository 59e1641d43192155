//! End-to-end tests of the board engine against a real data directory.

use std::fs;

use tempfile::TempDir;

use termchan::{
    all_posts_of, paginate, BoardIndex, BoardRegistry, Config, Page, Storage, TermchanError,
    ThreadIndex,
};

fn open() -> (TempDir, Storage) {
    let dir = TempDir::new().unwrap();
    let storage = Storage::open(dir.path()).unwrap();
    (dir, storage)
}

#[test]
fn test_paginate_twenty_threads() {
    let (_dir, storage) = open();
    BoardRegistry::new(&storage).add("g", "Technology").unwrap();
    let threads = ThreadIndex::new(&storage);

    let ids: Vec<u64> = (1..=20)
        .map(|i| threads.add_thread("g", &format!("thread {i}"), "body").unwrap())
        .collect();
    let index = threads.load("g").unwrap();
    let page_size = Config::default().page_size();

    let second: Vec<u64> = paginate(&index, 2, page_size)
        .iter()
        .map(|t| t.thread_id())
        .collect();
    assert_eq!(second, ids[14..]);
    assert!(paginate(&index, 3, page_size).is_empty());

    let page = Page::of(&index, 1, page_size);
    assert_eq!(page.threads.len(), 14);
    assert!(page.has_next());
}

#[test]
fn test_thread_view_lists_all_posts() {
    let (_dir, storage) = open();
    BoardRegistry::new(&storage).add("b", "Random").unwrap();
    let threads = ThreadIndex::new(&storage);

    let id = threads.add_thread("b", "hello", "op").unwrap();
    for i in 0..5 {
        threads.add_reply("b", id, &format!("reply {i}")).unwrap();
    }

    let thread = threads.get_thread("b", id).unwrap().unwrap();
    let bodies: Vec<_> = all_posts_of(&thread).iter().map(|p| p.body.as_str()).collect();
    assert_eq!(
        bodies,
        ["op", "reply 0", "reply 1", "reply 2", "reply 3", "reply 4"]
    );
    assert_eq!(thread.reply_count(), 5);
}

#[test]
fn test_boards_are_numbered_independently() {
    let (_dir, storage) = open();
    let registry = BoardRegistry::new(&storage);
    registry.add("a", "").unwrap();
    registry.add("b", "").unwrap();
    let threads = ThreadIndex::new(&storage);

    assert_eq!(threads.add_thread("a", "", "x").unwrap(), 1);
    assert_eq!(threads.add_thread("a", "", "x").unwrap(), 2);
    assert_eq!(threads.add_thread("b", "", "x").unwrap(), 1);
}

#[test]
fn test_rename_then_list_and_read() {
    let (_dir, storage) = open();
    let registry = BoardRegistry::new(&storage);
    let threads = ThreadIndex::new(&storage);
    registry.add("a", "old").unwrap();
    let id = threads.add_thread("a", "kept", "original body").unwrap();
    threads.add_reply("a", id, "a reply").unwrap();
    let before = threads.get_thread("a", id).unwrap().unwrap();

    registry.rename("a", "b", "new desc").unwrap();

    let listed: Vec<_> = registry
        .list()
        .unwrap()
        .into_iter()
        .map(|b| (b.name, b.description))
        .collect();
    assert_eq!(listed, [("b".to_string(), "new desc".to_string())]);
    assert_eq!(threads.get_thread("b", id).unwrap().unwrap(), before);
    assert!(threads.load("a").unwrap_err().is_not_found());

    // Numbering continues under the new name.
    assert_eq!(threads.add_reply("b", id, "after rename").unwrap(), 3);
}

#[test]
fn test_delete_then_post_is_not_found() {
    let (_dir, storage) = open();
    let registry = BoardRegistry::new(&storage);
    let threads = ThreadIndex::new(&storage);
    registry.add("gone", "").unwrap();
    threads.add_thread("gone", "s", "b").unwrap();

    registry.delete("gone").unwrap();

    assert!(threads.add_thread("gone", "s", "b").unwrap_err().is_not_found());
    assert!(!registry.exists("gone").unwrap());
    assert!(!storage.board_dir("gone").exists());
}

#[test]
fn test_index_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let expected: BoardIndex = {
        let storage = Storage::open(dir.path()).unwrap();
        BoardRegistry::new(&storage).add("g", "Technology").unwrap();
        let threads = ThreadIndex::new(&storage);
        let a = threads.add_thread("g", "first", "line one\nline two").unwrap();
        threads.add_thread("g", "", "ünïcödé ✓").unwrap();
        threads.add_reply("g", a, "\"quoted\" \\ backslash").unwrap();
        threads.load("g").unwrap()
    };

    let storage = Storage::open(dir.path()).unwrap();
    let threads = ThreadIndex::new(&storage);
    assert_eq!(threads.load("g").unwrap(), expected);
    assert_eq!(threads.add_thread("g", "", "next").unwrap(), 4);
}

#[test]
fn test_reads_original_data_layout() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("boardlist"), r#"{"b": "Random", "g": "Technology"}"#).unwrap();
    fs::write(dir.path().join("postnums"), r#"{"b": 0, "g": 3}"#).unwrap();
    fs::create_dir_all(dir.path().join("boards/g")).unwrap();
    fs::create_dir_all(dir.path().join("boards/b")).unwrap();
    fs::write(dir.path().join("boards/b/index"), "[]").unwrap();
    fs::write(
        dir.path().join("boards/g/index"),
        r#"[
    [1, "Rust", [1430000000, 1, "anyone here?"], [1430000100, 3, "yes"]],
    [2, "Vim", [1430000050, 2, ":wq"]]
]"#,
    )
    .unwrap();

    let storage = Storage::open(dir.path()).unwrap();
    let registry = BoardRegistry::new(&storage);
    let threads = ThreadIndex::new(&storage);

    let names: Vec<_> = registry.list().unwrap().into_iter().map(|b| b.name).collect();
    assert_eq!(names, ["b", "g"]);

    let thread = threads.get_thread("g", 1).unwrap().unwrap();
    assert_eq!(thread.subject(), "Rust");
    assert_eq!(thread.replies()[0].timestamp, 1430000100);
    assert!(threads.load("b").unwrap().is_empty());

    assert_eq!(threads.add_reply("g", 2, "thanks").unwrap(), 4);
}

#[test]
fn test_corrupt_board_list_is_fatal() {
    let (dir, storage) = open();
    fs::write(dir.path().join("boardlist"), "{broken").unwrap();

    let registry = BoardRegistry::new(&storage);
    assert!(matches!(registry.list(), Err(TermchanError::StorageCorrupt(_))));
    assert!(matches!(
        registry.add("g", ""),
        Err(TermchanError::StorageCorrupt(_))
    ));
    assert_eq!(fs::read_to_string(dir.path().join("boardlist")).unwrap(), "{broken");
}
