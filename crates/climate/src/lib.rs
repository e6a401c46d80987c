//! Climate - Room Comfort Service
//!
//! This crate provides the service around the climate model, including:
//! - Room and reading persistence (redb or in-memory)
//! - REST API for rooms, readings, assessments and chart statistics
//! - WebSocket pushes of assessment changes
//! - Layered configuration

// Re-export the model
pub use climate_engine;

// Service configuration
pub mod config;

// HTTP and WebSocket server
pub mod server;

// Persistence
pub mod store;
