pub mod config;
pub mod explain;
pub mod features;
pub mod http;
pub mod journal;
pub mod model;
pub mod placeholder;
pub mod recommend;
pub mod registry;
pub mod scoring;
pub mod tier;
