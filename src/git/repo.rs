use crate::error::{FleetError, Result};
use crate::model::CommitInfo;
use chrono::DateTime;
use gix::object::tree::diff::ChangeDetached;
use gix::{ObjectId, Repository, ThreadSafeRepository};
use similar::TextDiff;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Commit history of one repository, as consumed by churn analysis.
pub trait History: Sync {
    /// Every commit reachable from HEAD, ancestors before descendants.
    /// Empty for a repository without commits.
    fn commits(&self) -> Result<Vec<CommitInfo>>;

    /// Unified-diff hunk headers (`@@ -a,b +c,d @@`) for every changed
    /// text file between two revisions, `older` being the base side.
    fn hunk_headers(&self, older: &str, newer: &str) -> Result<Vec<String>>;
}

pub struct GitRepo {
    repo: ThreadSafeRepository,
    path: PathBuf,
}

impl GitRepo {
    /// Open the repository at exactly `path`, without searching parents.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(FleetError::NotARepository(path.to_path_buf()));
        }

        let repo = gix::open(path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self {
            repo: repo.into_sync(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn collect_commits(&self, repo: &Repository) -> Result<Vec<CommitInfo>> {
        let mut head = repo.head()?;
        if head.is_unborn() {
            return Ok(Vec::new());
        }
        let head_commit = head.peel_to_commit_in_place()?;

        let mut commits = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut stack: VecDeque<ObjectId> = VecDeque::from([head_commit.id]);

        while let Some(commit_id) = stack.pop_back() {
            if !seen.insert(commit_id) {
                continue;
            }

            let commit = repo.find_commit(commit_id)?;
            let secs = commit.time()?.seconds;
            let timestamp = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| FleetError::InvalidDate(format!("Invalid timestamp: {secs}")))?;

            commits.push(CommitInfo {
                id: commit_id.to_string(),
                timestamp,
            });

            for pid in commit.parent_ids() {
                stack.push_back(pid.into());
            }
        }

        // descendants were pushed first; equal timestamps must keep ancestors first
        commits.reverse();
        Ok(commits)
    }

    fn collect_hunks(
        &self,
        repo: &Repository,
        change: ChangeDetached,
        headers: &mut Vec<String>,
    ) -> Result<()> {
        match change {
            ChangeDetached::Addition { id, .. } => {
                if let Some(new_text) = self.blob_text(repo, id) {
                    push_hunk_headers("", &new_text, headers);
                }
            }
            ChangeDetached::Deletion { id, .. } => {
                if let Some(old_text) = self.blob_text(repo, id) {
                    push_hunk_headers(&old_text, "", headers);
                }
            }
            ChangeDetached::Modification { previous_id, id, .. } => {
                if let (Some(old_text), Some(new_text)) =
                    (self.blob_text(repo, previous_id), self.blob_text(repo, id))
                {
                    push_hunk_headers(&old_text, &new_text, headers);
                }
            }
            ChangeDetached::Rewrite {
                source_id, id, copy, ..
            } => {
                if let Some(new_text) = self.blob_text(repo, id) {
                    if copy {
                        push_hunk_headers("", &new_text, headers);
                    } else if let Some(old_text) = self.blob_text(repo, source_id) {
                        push_hunk_headers(&old_text, &new_text, headers);
                    }
                }
            }
        }
        Ok(())
    }

    /// Text of a blob, or `None` for binaries, submodules and trees, which
    /// produce no patch hunks.
    fn blob_text(&self, repo: &Repository, id: ObjectId) -> Option<String> {
        let object = repo.find_object(id).ok()?;
        if object.kind != gix::object::Kind::Blob || self.is_binary_object(&object) {
            return None;
        }
        Some(String::from_utf8_lossy(object.data.as_slice()).into_owned())
    }

    fn is_binary_object(&self, object: &gix::Object) -> bool {
        object.data.as_slice().iter().take(8192).any(|&b| b == 0)
    }
}

impl History for GitRepo {
    fn commits(&self) -> Result<Vec<CommitInfo>> {
        let repo = self.repo.to_thread_local();
        self.collect_commits(&repo)
    }

    fn hunk_headers(&self, older: &str, newer: &str) -> Result<Vec<String>> {
        let repo = self.repo.to_thread_local();
        let older_tree = repo.find_commit(parse_id(older)?)?.tree()?;
        let newer_tree = repo.find_commit(parse_id(newer)?)?.tree()?;

        let changes: Vec<ChangeDetached> =
            repo.diff_tree_to_tree(Some(&older_tree), Some(&newer_tree), None)?;

        let mut headers = Vec::new();
        for change in changes {
            self.collect_hunks(&repo, change, &mut headers)?;
        }
        Ok(headers)
    }
}

fn parse_id(commit_id: &str) -> Result<ObjectId> {
    ObjectId::from_hex(commit_id.as_bytes())
        .map_err(|e| FleetError::Parse(format!("Invalid commit ID: {e}")))
}

/// Appends the git-style hunk headers of a line diff with three lines of
/// context.
fn push_hunk_headers(old: &str, new: &str, headers: &mut Vec<String>) {
    let diff = TextDiff::from_lines(old, new);
    let mut unified = diff.unified_diff();
    unified.context_radius(3);
    for hunk in unified.iter_hunks() {
        headers.push(hunk.header().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(old: &str, new: &str) -> Vec<String> {
        let mut out = Vec::new();
        push_hunk_headers(old, new, &mut out);
        out
    }

    #[test]
    fn new_file_is_one_pure_addition_hunk() {
        assert_eq!(headers("", "a\nb\nc\n"), vec!["@@ -0,0 +1,3 @@"]);
    }

    #[test]
    fn deleted_file_is_one_pure_deletion_hunk() {
        assert_eq!(headers("a\nb\n", ""), vec!["@@ -1,2 +0,0 @@"]);
    }

    #[test]
    fn identical_text_has_no_hunks() {
        assert!(headers("same\n", "same\n").is_empty());
    }

    #[test]
    fn distant_edits_produce_separate_hunks() {
        let old: String = (0..40).map(|i| format!("line {i}\n")).collect();
        let new = old.replace("line 2\n", "line 2\nextra\n").replace("line 35\n", "");
        assert_eq!(headers(&old, &new).len(), 2);
    }

    #[test]
    fn opening_a_missing_path_is_not_a_repository() {
        let err = GitRepo::open("/definitely/not/here").err().unwrap();
        assert!(matches!(err, FleetError::NotARepository(_)));
    }

    #[test]
    fn opening_a_plain_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GitRepo::open(dir.path()).is_err());
    }

    #[test]
    fn repository_without_commits_has_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let initialized = std::process::Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(dir.path())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if !initialized {
            return;
        }

        let repo = GitRepo::open(dir.path()).unwrap();
        assert!(repo.commits().unwrap().is_empty());

        let window = crate::churn::churn_window(chrono::Utc::now(), 365).unwrap();
        let churn = crate::churn::compute_churn(&repo, &window, 2).unwrap();
        assert_eq!(churn, crate::model::ChurnResult::default());
    }
}
