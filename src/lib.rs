pub mod app;
pub mod banlist;
pub mod config;
pub mod crawler;
pub mod detector;
pub mod domain;
pub mod html;
pub mod infrastructure;
pub mod report;
