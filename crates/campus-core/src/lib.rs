//! Core Campus console library (config, session subsystem, navigation, API client).

pub mod config;
pub mod dispatch;
pub mod guard;
pub mod login;
pub mod navigation;
pub mod redirect;
pub mod resources;
pub mod session;
