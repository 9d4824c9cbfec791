//! Account-domain identifiers, permission sets, secrets, validation policy, and password hashing.

pub mod account;
pub mod id;
pub mod password;
pub mod permission;
pub mod policy;
pub mod secret;

pub use account::*;
pub use id::*;
pub use password::*;
pub use permission::*;
pub use policy::*;
pub use secret::*;
