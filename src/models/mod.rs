// src/models/mod.rs

pub mod backup;
pub mod identity;
pub mod popup;
pub mod profile;
pub mod question;
pub mod region;
