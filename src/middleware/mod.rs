/// Middleware module
///
/// Request-pipeline pieces: the authenticated-user extractor for protected
/// handlers and the hit counter in front of the static file server.

mod authentication;
mod hits;

pub use authentication::{authenticate, AuthenticatedUser};
pub use hits::HitCounter;
