//! Article discovery from news feeds.
//!
//! Each source module exposes a `search` that takes a query and returns
//! candidate [`FeedEntry`](crate::models::FeedEntry) values. Entries carry
//! aggregator redirect URLs; the resolver turns those into publisher pages.

pub mod google_news;
