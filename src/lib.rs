//! Backend of the party games companion: Mölkky score keeping, turn timers with
//! spoken cues and per-user settings, served over REST and SSE.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod speech;
pub mod state;
