pub mod api;
pub mod config;
pub mod demo_feed;
pub mod error;
pub mod feed;
pub mod http_cache;
pub mod http_client;
pub mod labels;
pub mod match_review;
pub mod models;
pub mod persist;
pub mod pitch;
pub mod replay;
pub mod report_export;
pub mod report_store;
pub mod retry;
pub mod state;
pub mod team_analysis;
pub mod video;
