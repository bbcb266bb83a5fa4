// src/models/mod.rs

pub mod comment;
pub mod prompt;
pub mod user;
