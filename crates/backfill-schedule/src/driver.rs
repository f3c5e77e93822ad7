// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit driver
//!
//! Turns one scheduled slot into at most one git commit: apply the mutation,
//! stage only the file it touched, and commit with the persona's identity and
//! the slot's timestamp forced through the environment.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use backfill_git::{CommandExecutor, CommitRequest, GitCli, ProcessCommandExecutor};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ScheduleError;
use crate::identity::Persona;
use crate::mutation::MutationRegistry;

/// Result of one commit attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// A commit was created
    Created {
        /// SHA of the new commit
        sha: String,
    },
    /// The index was empty, so no commit was made
    SkippedNoChange,
    /// Writing the file or running git failed
    Failed {
        /// Error text, including git's stderr where available
        reason: String,
    },
}

impl CommitOutcome {
    /// Whether a commit was created
    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

/// Options for [`CommitDriver::bootstrap`]
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Create an empty root commit with this message
    pub initial_message: Option<String>,
    /// Rename the current branch after the root commit
    pub branch: Option<String>,
}

/// Creates backdated commits in one working tree
#[derive(Debug, Clone)]
pub struct CommitDriver<E = ProcessCommandExecutor> {
    git: GitCli<E>,
}

impl CommitDriver<ProcessCommandExecutor> {
    /// Drive the working tree at `repo_path` with the real `git` binary
    pub fn new(repo_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            git: GitCli::new(repo_path),
        }
    }
}

impl<E: CommandExecutor> CommitDriver<E> {
    /// Wrap an existing git handle
    pub fn with_git(git: GitCli<E>) -> Self {
        Self { git }
    }

    /// The git handle
    #[must_use]
    pub fn git(&self) -> &GitCli<E> {
        &self.git
    }

    /// Prepare a working tree: `git init`, disable signing, and optionally
    /// create an empty root commit and rename the branch
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or any git step
    /// fails.
    pub fn bootstrap(
        &self,
        options: &BootstrapOptions,
        persona: &Persona,
        when: DateTime<FixedOffset>,
    ) -> Result<(), ScheduleError> {
        fs::create_dir_all(self.git.repo_path())?;
        self.git.init()?;
        self.git.config("commit.gpgsign", "false")?;

        if let Some(message) = options.initial_message.as_deref() {
            let signature = persona.signature();
            self.git.commit_allow_empty(&CommitRequest {
                message,
                signature: &signature,
                when,
            })?;
            if let Some(branch) = options.branch.as_deref() {
                self.git.rename_branch(branch)?;
            }
        }
        info!(path = %self.git.repo_path().display(), "bootstrapped repository");
        Ok(())
    }

    /// Attempt one commit
    ///
    /// With a mutation and target file, the mutation is applied to the file's
    /// current content (empty if the file is missing). A changed result is
    /// written back and staged, and only then is the mutation consumed; if
    /// writing or staging fails the file is restored. An unchanged result
    /// falls through to the status check so that already-staged work can
    /// still be committed.
    /// Nothing staged yields [`CommitOutcome::SkippedNoChange`]. Errors never
    /// propagate; they become [`CommitOutcome::Failed`].
    pub fn commit(
        &self,
        registry: &mut MutationRegistry,
        persona: &Persona,
        message: &str,
        when: DateTime<FixedOffset>,
        target_file: Option<&Path>,
        mutation_id: Option<&str>,
    ) -> CommitOutcome {
        match self.try_commit(registry, persona, message, when, target_file, mutation_id) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, subject = message, "commit failed");
                CommitOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn try_commit(
        &self,
        registry: &mut MutationRegistry,
        persona: &Persona,
        message: &str,
        when: DateTime<FixedOffset>,
        target_file: Option<&Path>,
        mutation_id: Option<&str>,
    ) -> Result<CommitOutcome, ScheduleError> {
        if let (Some(id), Some(target)) = (mutation_id, target_file) {
            let path = self.git.repo_path().join(target);
            let previous = read_existing(&path)?;
            let current = previous.as_deref().unwrap_or_default();
            let (new_content, changed) = registry.preview(id, current);
            if changed {
                if let Err(e) = self.write_and_stage(&path, target, &new_content) {
                    restore(&path, previous.as_deref());
                    return Err(e);
                }
                registry.mark_consumed(id);
            } else {
                debug!(id, "mutation left content unchanged");
            }
        }

        if !self.git.has_staged_changes()? {
            info!(subject = message, "nothing staged, skipping");
            return Ok(CommitOutcome::SkippedNoChange);
        }

        let signature = persona.signature();
        self.git.commit(&CommitRequest {
            message,
            signature: &signature,
            when,
        })?;
        let sha = self.git.rev_parse_head()?;
        let short = &sha[..7.min(sha.len())];
        info!(
            sha = short,
            author = %persona.name,
            %when,
            subject = message,
            "created commit"
        );
        Ok(CommitOutcome::Created { sha })
    }

    fn write_and_stage(&self, path: &Path, target: &Path, content: &str) -> Result<(), ScheduleError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        self.git.add(&[target.to_string_lossy()])?;
        Ok(())
    }
}

fn read_existing(path: &Path) -> Result<Option<String>, std::io::Error> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Put the target back the way the slot found it
fn restore(path: &Path, previous: Option<&str>) {
    let result = match previous {
        Some(content) => fs::write(path, content),
        None => match fs::remove_file(path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        },
    };
    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "could not restore file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{MutationSpec, Transform};
    use backfill_git::CommandResult;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct MockExecutor {
        calls: RefCell<Vec<Vec<String>>>,
        responses: RefCell<VecDeque<CommandResult>>,
    }

    impl MockExecutor {
        fn new(responses: Vec<CommandResult>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                responses: RefCell::new(VecDeque::from(responses)),
            }
        }
    }

    impl CommandExecutor for &MockExecutor {
        fn execute(
            &self,
            _program: &str,
            args: &[String],
            _cwd: &Path,
            _envs: &[(String, String)],
        ) -> Result<CommandResult, std::io::Error> {
            self.calls.borrow_mut().push(args.to_vec());
            Ok(self
                .responses
                .borrow_mut()
                .pop_front()
                .expect("missing mock response"))
        }
    }

    fn ok(stdout: &str) -> CommandResult {
        CommandResult {
            success: true,
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn when() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 11, 10, 10, 7, 31)
            .unwrap()
    }

    fn registry() -> MutationRegistry {
        MutationRegistry::new([MutationSpec {
            id: "hello".to_string(),
            message: "feat: greet".to_string(),
            path: "src/hello.txt".to_string(),
            owner: None,
            transform: Transform::Write {
                content: "hello\n".to_string(),
            },
        }])
        .expect("registry")
    }

    #[test]
    fn test_nothing_staged_is_skip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mock = MockExecutor::new(vec![ok("?? untracked.txt\n")]);
        let driver = CommitDriver::with_git(GitCli::with_executor(dir.path(), &mock));
        let mut registry = MutationRegistry::default();

        let outcome = driver.commit(
            &mut registry,
            &Persona::new("Sam", "sam@example.com"),
            "chore: tidy",
            when(),
            None,
            None,
        );

        assert_eq!(outcome, CommitOutcome::SkippedNoChange);
        assert_eq!(*mock.calls.borrow(), vec![vec!["status", "--porcelain"]]);
    }

    #[test]
    fn test_mutation_writes_stages_and_commits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mock = MockExecutor::new(vec![
            ok(""),
            ok("A  src/hello.txt\n"),
            ok("[main 1945ab9] feat: greet\n"),
            ok("1945ab9c752534e733c38ba0109dc3b741f0a6eb\n"),
        ]);
        let driver = CommitDriver::with_git(GitCli::with_executor(dir.path(), &mock));
        let mut registry = registry();

        let outcome = driver.commit(
            &mut registry,
            &Persona::new("Sam", "sam@example.com"),
            "feat: greet",
            when(),
            Some(Path::new("src/hello.txt")),
            Some("hello"),
        );

        assert_eq!(
            outcome,
            CommitOutcome::Created {
                sha: "1945ab9c752534e733c38ba0109dc3b741f0a6eb".to_string()
            }
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("src/hello.txt")).expect("read"),
            "hello\n"
        );
        let calls = mock.calls.borrow();
        assert_eq!(calls[0], vec!["add", "--", "src/hello.txt"]);
        assert_eq!(calls[1], vec!["status", "--porcelain"]);
        assert_eq!(calls[2], vec!["commit", "-m", "feat: greet"]);
        assert_eq!(calls[3], vec!["rev-parse", "HEAD"]);
    }

    #[test]
    fn test_consumed_mutation_does_not_stage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mock = MockExecutor::new(vec![ok("")]);
        let driver = CommitDriver::with_git(GitCli::with_executor(dir.path(), &mock));
        let mut registry = registry();
        registry.apply("hello", "");

        let outcome = driver.commit(
            &mut registry,
            &Persona::new("Sam", "sam@example.com"),
            "feat: greet again",
            when(),
            Some(Path::new("src/hello.txt")),
            Some("hello"),
        );

        assert_eq!(outcome, CommitOutcome::SkippedNoChange);
        assert!(!dir.path().join("src/hello.txt").exists());
        assert_eq!(*mock.calls.borrow(), vec![vec!["status", "--porcelain"]]);
    }

    #[test]
    fn test_rejected_commit_is_failed_with_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mock = MockExecutor::new(vec![
            ok("M  a.txt\n"),
            CommandResult {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: "error: pre-commit hook rejected\n".to_string(),
            },
        ]);
        let driver = CommitDriver::with_git(GitCli::with_executor(dir.path(), &mock));
        let mut registry = MutationRegistry::default();

        let outcome = driver.commit(
            &mut registry,
            &Persona::new("Sam", "sam@example.com"),
            "fix: something",
            when(),
            None,
            None,
        );

        match outcome {
            CommitOutcome::Failed { reason } => assert!(reason.contains("pre-commit hook")),
            other => panic!("Expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_add_keeps_mutation_and_restores_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("src")).expect("mkdir");
        fs::write(dir.path().join("src/hello.txt"), "draft\n").expect("write");
        let mock = MockExecutor::new(vec![CommandResult {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: "The following paths are ignored by one of your .gitignore files\n"
                .to_string(),
        }]);
        let driver = CommitDriver::with_git(GitCli::with_executor(dir.path(), &mock));
        let mut registry = registry();

        let outcome = driver.commit(
            &mut registry,
            &Persona::new("Sam", "sam@example.com"),
            "feat: greet",
            when(),
            Some(Path::new("src/hello.txt")),
            Some("hello"),
        );

        match outcome {
            CommitOutcome::Failed { reason } => assert!(reason.contains("ignored")),
            other => panic!("Expected Failed, got {other:?}"),
        }
        assert!(!registry.is_consumed("hello"));
        assert_eq!(
            fs::read_to_string(dir.path().join("src/hello.txt")).expect("read"),
            "draft\n"
        );
        assert_eq!(*mock.calls.borrow(), vec![vec!["add", "--", "src/hello.txt"]]);
    }

    #[test]
    fn test_failed_add_removes_new_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mock = MockExecutor::new(vec![CommandResult {
            success: false,
            code: Some(128),
            stdout: String::new(),
            stderr: "fatal: unable to write new index file\n".to_string(),
        }]);
        let driver = CommitDriver::with_git(GitCli::with_executor(dir.path(), &mock));
        let mut registry = registry();

        let outcome = driver.commit(
            &mut registry,
            &Persona::new("Sam", "sam@example.com"),
            "feat: greet",
            when(),
            Some(Path::new("src/hello.txt")),
            Some("hello"),
        );

        assert!(matches!(outcome, CommitOutcome::Failed { .. }));
        assert!(!registry.is_consumed("hello"));
        assert!(!dir.path().join("src/hello.txt").exists());
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_string(&CommitOutcome::SkippedNoChange).expect("serialize");
        assert_eq!(json, r#"{"outcome":"skipped_no_change"}"#);
        assert!(CommitOutcome::Created { sha: "a".into() }.is_created());
    }
}
