//! Testing utilities for listing pipelines.
//!
//! This module provides:
//! - Sample search, listing and target-market pages
//! - In-memory doubles for every collaborator seam

pub mod fixtures;
mod mocks;

pub use mocks::{
    InMemoryDocument, PresenterEvent, RecordingOpener, RecordingPresenter, ScriptedTransport,
    StaticComplianceGate,
};
