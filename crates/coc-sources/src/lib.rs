//! Clients for the third-party APIs the dashboard reads from and reports to.
//!
//! Every client wraps `reqwest` with the same status mapping and retry
//! policy, and exposes `with_base_url` so tests can point it at a mock
//! server.

pub mod bluesky;
pub mod discord;
pub mod error;
pub mod github;
pub mod http;
pub mod pagination;
pub mod twitter;
pub mod youtube;

mod retry;

pub use bluesky::BlueskyClient;
pub use discord::DiscordNotifier;
pub use error::SourceError;
pub use github::{CommitTally, DailyCommits, GithubClient, Repository};
pub use http::HttpSettings;
pub use twitter::TwitterClient;
pub use youtube::YoutubeClient;
