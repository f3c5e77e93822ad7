//! Integration tests for backfill-git
//!
//! These tests drive the real `git` binary inside temporary repositories and
//! read the results back through `git2`.

use std::fs;
use std::path::Path;

use backfill_git::{
    AuditFlag, AuditOptions, CommitRequest, GitCli, HistoryReader, Signature, WalkOptions,
};
use chrono::{DateTime, FixedOffset, TimeZone};
use tempfile::TempDir;

fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2025, 11, day, hour, minute, 13)
        .unwrap()
}

fn init_repo() -> (TempDir, GitCli) {
    let dir = tempfile::tempdir().expect("tempdir");
    let git = GitCli::new(dir.path());
    git.init().expect("git init");
    git.config("commit.gpgsign", "false").expect("config");
    (dir, git)
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write");
}

#[test]
fn test_backdated_commit_records_identity_and_date() {
    let (dir, git) = init_repo();
    let sam = Signature::new("Sam", "sam@example.com");

    write(dir.path(), "src/main.ts", "let x = 1;\nlet y = 2;\nlet z = 3;\n");
    git.add(&["src/main.ts"]).expect("add");
    assert!(git.has_staged_changes().expect("status"));

    let when = at(10, 9, 17);
    git.commit(&CommitRequest {
        message: "feat: initial scaffolding",
        signature: &sam,
        when,
    })
    .expect("commit");

    assert!(!git.has_staged_changes().expect("status"));

    let reader = HistoryReader::open(dir.path()).expect("open");
    let commits = reader.walk_commits(&WalkOptions::default()).expect("walk");
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].author, "Sam");
    assert_eq!(commits[0].author_email, "sam@example.com");
    assert_eq!(commits[0].timestamp, when);
    assert_eq!(commits[0].subject(), "feat: initial scaffolding");
    assert_eq!(git.rev_parse_head().expect("head"), commits[0].sha);
}

#[test]
fn test_commit_with_nothing_staged_fails() {
    let (dir, git) = init_repo();
    let sam = Signature::new("Sam", "sam@example.com");
    write(dir.path(), "a.txt", "one\n");
    git.add(&["a.txt"]).expect("add");
    git.commit(&CommitRequest {
        message: "first",
        signature: &sam,
        when: at(10, 10, 1),
    })
    .expect("commit");

    let result = git.commit(&CommitRequest {
        message: "second",
        signature: &sam,
        when: at(10, 11, 1),
    });
    assert!(result.is_err());

    let reader = HistoryReader::open(dir.path()).expect("open");
    assert_eq!(reader.commit_count().expect("count"), 1);
}

#[test]
fn test_author_counts_and_ordering() {
    let (dir, git) = init_repo();
    let sam = Signature::new("Sam", "sam@example.com");
    let jasper = Signature::new("Jasper", "jasper@example.com");

    for (i, (who, day)) in [(&sam, 10), (&jasper, 11), (&sam, 12)].into_iter().enumerate() {
        write(dir.path(), "log.txt", &format!("entry {i}\nsecond line {i}\nthird {i}\n"));
        git.add(&["log.txt"]).expect("add");
        git.commit(&CommitRequest {
            message: &format!("change {i}"),
            signature: who,
            when: at(day, 14, 7),
        })
        .expect("commit");
    }

    let reader = HistoryReader::open(dir.path()).expect("open");
    let authors = reader.author_counts().expect("authors");
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0].name, "Sam");
    assert_eq!(authors[0].commits, 2);
    assert_eq!(authors[1].commits, 1);

    let oldest = reader
        .walk_commits(&WalkOptions::default().oldest_first())
        .expect("walk");
    for window in oldest.windows(2) {
        assert!(window[0].timestamp <= window[1].timestamp);
    }

    let recent = reader
        .walk_commits(&WalkOptions::default().since(at(11, 0, 0)))
        .expect("walk");
    assert_eq!(recent.len(), 2);
}

#[test]
fn test_audit_flags_comment_only_and_empty_commits() {
    let (dir, git) = init_repo();
    let sam = Signature::new("Sam", "sam@example.com");

    write(dir.path(), "lib.sol", "uint a = 1;\nuint b = 2;\nuint c = 3;\n");
    git.add(&["lib.sol"]).expect("add");
    git.commit(&CommitRequest {
        message: "feat: add storage",
        signature: &sam,
        when: at(10, 9, 31),
    })
    .expect("commit");

    write(
        dir.path(),
        "lib.sol",
        "uint a = 1;\nuint b = 2;\nuint c = 3;\n// tidy\n",
    );
    git.add(&["lib.sol"]).expect("add");
    git.commit(&CommitRequest {
        message: "docs: comment",
        signature: &sam,
        when: at(10, 10, 31),
    })
    .expect("commit");

    git.commit_allow_empty(&CommitRequest {
        message: "chore: empty",
        signature: &sam,
        when: at(10, 11, 31),
    })
    .expect("commit");

    let reader = HistoryReader::open(dir.path()).expect("open");
    let audits = reader.audit(&AuditOptions::default()).expect("audit");
    assert_eq!(audits.len(), 3);
    assert_eq!(audits[0].flag, None);
    assert_eq!(audits[0].substantive_lines, 3);
    assert_eq!(audits[1].flag, Some(AuditFlag::Minimal { lines: 0 }));
    assert_eq!(audits[2].flag, Some(AuditFlag::Empty));
}

#[test]
fn test_audit_flags_placeholder_files() {
    let (dir, git) = init_repo();
    let sam = Signature::new("Sam", "sam@example.com");

    write(dir.path(), "dummy_commit_1.txt", "x\ny\nz\nw\n");
    git.add(&["dummy_commit_1.txt"]).expect("add");
    git.commit(&CommitRequest {
        message: "chore: placeholder",
        signature: &sam,
        when: at(11, 9, 2),
    })
    .expect("commit");

    let reader = HistoryReader::open(dir.path()).expect("open");
    let options = AuditOptions {
        placeholder_prefix: Some("dummy_commit_".to_string()),
        ..Default::default()
    };
    let audits = reader.audit(&options).expect("audit");
    assert_eq!(audits[0].flag, Some(AuditFlag::PlaceholderOnly));
}
