//! # medpulse-server
//!
//! Axum HTTP + `WebSocket` server for the MedPulse notification service.
//!
//! - `/ws`: token handshake, registration with the hub, echo surface
//! - `/ws/stats`: live registry statistics
//! - `/health`, `/metrics`: liveness and Prometheus scrape
//! - [`notify`]: producer helpers for the domain services
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod health;
pub mod metrics;
pub mod notify;
pub mod server;
pub mod shutdown;
pub mod stats;
pub mod websocket;
