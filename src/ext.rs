//! Outbound collaborator contracts the core calls but never implements for production.
//!
//! Delivery (SMTP, a transactional email API, a queue) belongs to the embedding service; the
//! crate only schedules calls and logs their failures.

pub mod email;

pub use email::*;
