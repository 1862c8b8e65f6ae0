pub mod identity;
pub mod internal_key;
pub mod logging;

pub use identity::{identity_middleware, AccountIdentity};
pub use internal_key::internal_key_middleware;
pub use logging::logging_middleware;
