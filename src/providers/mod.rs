pub mod gitlab;

pub use gitlab::{DateWindow, FetchSettings, GitLabProvider};
