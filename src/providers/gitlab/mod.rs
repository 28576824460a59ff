mod client;
mod links;
mod mapper;
mod provider;
mod stages;
mod types;

#[cfg(test)]
mod tests;

pub use provider::{DateWindow, FetchSettings, GitLabProvider};
