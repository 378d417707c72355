// aws-extension-config/src/lib.rs
// ============================================================================
// Module: AWS Extension Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for aws-extension.toml semantics.
// Dependencies: aws-extension-core, serde, toml
// ============================================================================

//! ## Overview
//! `aws-extension-config` defines the configuration model for sessions that
//! load the AWS extension: where the database lives, how credentials are
//! resolved, where structured events go, and which host extensions the
//! credential loader depends on. Validation is strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
