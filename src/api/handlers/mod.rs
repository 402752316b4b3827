//! HTTP request handlers

pub mod error;
pub mod health;
pub mod images;
pub mod objects;
