// src/handlers/mod.rs
pub mod chat;
pub mod error;
pub mod fundamentals;
pub mod news;
pub mod portfolio;
pub mod prices;
