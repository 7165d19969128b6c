pub mod achievements;
pub mod auth;
pub mod chat;
pub mod checkin;
pub mod config;
pub mod dashboard;
pub mod profile;
pub mod relax;
