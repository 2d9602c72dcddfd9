use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FleetError>;

/// Where in a repository's pipeline an error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The repository could not be opened or cloned.
    Resolution,
    /// Churn, line counting or quality metrics failed.
    SubAnalysis,
}

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Cannot resolve repository {target}: {reason}")]
    Resolution { target: String, reason: String },
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),
    #[error("Git clone of {url} failed: {stderr}")]
    Clone { url: String, stderr: String },
    #[error("Git error: {0}")]
    Git(#[from] Box<gix::open::Error>),
    #[error("Malformed hunk header: {0}")]
    HunkHeader(String),
    #[error("Failed to run metrics command `{program}`: {source}")]
    MetricsSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Metrics output has no `overall` object")]
    MissingOverall,
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("File walk error: {0}")]
    Walk(#[from] ignore::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Head peel error: {0}")]
    HeadPeel(#[from] Box<gix::head::peel::to_commit::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
}

impl FleetError {
    pub fn resolution(target: &str, err: impl std::fmt::Display) -> Self {
        FleetError::Resolution {
            target: target.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FleetError::Resolution { .. }
            | FleetError::NotARepository(_)
            | FleetError::Clone { .. }
            | FleetError::Git(_) => ErrorKind::Resolution,
            _ => ErrorKind::SubAnalysis,
        }
    }
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::open::Error> for FleetError {
    fn from(err: gix::open::Error) -> Self {
        FleetError::Git(Box::new(err))
    }
}

impl From<gix::object::find::existing::Error> for FleetError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        FleetError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for FleetError {
    fn from(err: gix::object::commit::Error) -> Self {
        FleetError::Commit(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for FleetError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        FleetError::RefFind(Box::new(err))
    }
}

impl From<gix::head::peel::to_commit::Error> for FleetError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        FleetError::HeadPeel(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for FleetError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        FleetError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for FleetError {
    fn from(err: gix::objs::decode::Error) -> Self {
        FleetError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for FleetError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        FleetError::DiffTreeToTree(Box::new(err))
    }
}
