//! Home Energy Monitor Backend Library
//!
//! This library provides the core functionality for the home energy
//! monitoring service, including:
//! - In-memory record store for users, devices, usage, budgets and alerts
//! - Periodic IoT telemetry simulation with budget alerting
//! - Session-cookie authentication
//! - JSON API consumed by the dashboard client

pub mod api;
pub mod models;
pub mod services;
pub mod storage;
