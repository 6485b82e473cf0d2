//! # deq-domain
//!
//! Pure domain model for the DeQ dashboard core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (configured network endpoints) and their MAC addresses
//! - Define **Device status** records produced by reachability probes
//! - Define **Action results** returned by privileged remote operations
//! - Define **Sections** (dashboard widgets) and their cached render output
//! - Define the **Settings** snapshot extensions can read
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod device;
pub mod mac;
pub mod section;
pub mod settings;
pub mod status;
