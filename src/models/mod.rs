// src/models/mod.rs

pub mod blog;
pub mod comment;
pub mod like;
pub mod page;
pub mod post;
pub mod user;
