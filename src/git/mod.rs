pub mod clone;
pub mod repo;

pub use clone::{clone_destination, clone_repository, Credentials};
pub use repo::{GitRepo, History};
