//! Token primitives: signed payloads, JWT claims and issuance, and hashed recovery tokens.

pub mod claims;
pub mod issuer;
pub mod recovery;
pub mod signed;

pub use claims::*;
pub use issuer::*;
pub use recovery::*;
pub use signed::*;
