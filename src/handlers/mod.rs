// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod explore;
pub mod preferences;
pub mod profile;
pub mod vote;
