/*!
 * Core Module
 * Shared errors, identifiers, limits and guard primitives
 */

pub mod errors;
pub mod guard;
pub mod id;
pub mod limits;

pub use errors::{GuardError, GuardResult, TimeoutError};
pub use id::GuardId;
