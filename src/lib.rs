//! # gox - cross-platform Go build orchestrator
//!
//! gox compiles one Go program for many `os/arch` targets at once.
//!
//! ## Features
//!
//! - **Platform groups**: `default`, `desktop`, `server`, `mobile`, `web`,
//!   `embedded`, plus `all` discovered from `go tool dist list`
//! - **Parallel builds**: a bounded worker pool, one target per worker
//! - **Retries**: failed targets are retried with linear backoff
//! - **Skip rules**: cgo-only and host-only platforms are skipped, not failed
//!
//! ## Quick Start
//!
//! ```bash
//! gox -s main.go -p desktop,js/wasm
//! gox -s main.go -p illumos --all -c
//! ```
//!
//! ## Module Organization
//!
//! - [`platform`] - Targets, groups, catalog and the resolver
//! - [`build`] - Policy, executor, orchestrator and report
//! - [`config`] - Layered configuration (`gox.toml`)
//! - [`commands`] - CLI command handlers

/// Build engine with parallel dispatch and retries.
pub mod build;

/// CLI command handlers extracted from main.
pub mod commands;

/// Configuration file parsing (`gox.toml`).
pub mod config;

/// Errors that abort a run.
pub mod error;

/// Host detection.
pub mod host;

/// Platform model and specification resolver.
pub mod platform;

/// Terminal output, progress and prompts.
pub mod ui;
