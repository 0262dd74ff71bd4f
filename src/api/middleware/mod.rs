// Request middleware: auth extractors, input scrubbing, security headers

pub mod auth;
pub mod sanitize;
pub mod security_headers;

pub use auth::{JwtAuth, StaffAuth};
pub use sanitize::scrub_request;
pub use security_headers::set_security_headers;
