// src/services/mod.rs
pub mod calculations;
pub mod chat;
pub mod error;
pub mod export;
pub mod fundamentals;
pub mod news;
pub mod portfolio;
pub mod yahoo;
