//! PR Reviewer Server library.
//!
//! This library provides the core functionality for the reviewer assignment
//! server, including storage, transactions, services and the HTTP API.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod repository;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
