//! # Timegrid
//!
//! Timetable versioning and grid placement engine for academic batches.
//!
//! This crate provides the scheduling backend for weekly class timetables:
//! versioned editing per batch, a period-template driven grid, atomic cell
//! placement, and a publish workflow that archives the live version, promotes
//! the draft, and seeds the next editing round in one step.
//!
//! ## Features
//!
//! - **Version Lifecycle**: `draft -> published -> archived`, at most one
//!   published version per batch
//! - **Grid Projection**: scheduled events keyed by `(day, period)` with a
//!   start-time fallback for legacy rows
//! - **Placement**: atomic cell upsert, with a delete-then-insert fallback for
//!   stores that cannot guarantee it
//! - **Selection**: rectangle drag selection with direction-independent
//!   normalization
//! - **Template Caching**: caller-owned TTL cache with explicit invalidation
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Identifier newtypes and the shared API surface
//! - [`models`]: Domain types for versions, events, templates, and offerings
//! - [`db`]: Database operations, repository pattern, and persistence layer
//! - [`services`]: High-level business logic and the editing workspace facade

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod models;

pub mod services;
