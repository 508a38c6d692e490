//! # servicedb-domain
//!
//! Pure domain model for the on-device data-access service.
//!
//! ## Responsibilities
//! - Foundational types: record identities, domain tags, error conventions, timestamps
//! - Define the **records** of every owned domain (contacts, SMS, call log, alarms, …)
//! - Define the **generic query protocol** (`Query` / `QueryResult`)
//! - Define the **message envelopes** (`Request` / `Response`) and agent requests
//! - Define **notification events** broadcast after mutations
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.

pub mod domain_id;
pub mod error;
pub mod id;
pub mod time;

pub mod agent;
pub mod alarm;
pub mod calllog;
pub mod contact;
pub mod country_code;
pub mod message;
pub mod note;
pub mod notification;
pub mod notifications;
pub mod query;
pub mod quote;
pub mod sms;
