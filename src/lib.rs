pub mod api;
pub mod config;
pub mod model;
pub mod normalizer;
pub mod orchestrator;
pub mod parser;
pub mod ranker;
pub mod scraper;
pub mod storage;
