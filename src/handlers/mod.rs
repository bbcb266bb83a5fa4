// src/handlers/mod.rs

pub mod auth;
pub mod comments;
pub mod prompts;
