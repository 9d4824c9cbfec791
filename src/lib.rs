//! Identity tokens, signed recovery links, throttles, and the account/password state machines
//! that tie them together behind narrow storage contracts.
//!
//! The crate is transport-agnostic: callers wire an [`AuthService`](flows::AuthService) with a
//! [`UserRepository`](store::UserRepository), a [`KeyValueCache`](store::KeyValueCache), and an
//! [`EmailDispatcher`](ext::EmailDispatcher), then map the classified [`Error`] kinds onto
//! whatever status codes their HTTP layer speaks.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod ext;
pub mod flows;
pub mod obs;
pub mod store;
pub mod tasks;
pub mod throttle;
pub mod token;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::{Hash, Hasher},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use error::{Error, ErrorKind, Result};
pub use flows::AuthService;

#[cfg(test)] use color_eyre as _;
