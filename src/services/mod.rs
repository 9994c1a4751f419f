// src/services/mod.rs

pub mod backup;
pub mod directory;
pub mod markers;
pub mod popups;
pub mod preferences;
pub mod questions;
pub mod session;
pub mod stylist;
