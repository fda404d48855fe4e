//! Authentication module
//!
//! OAuth2 token lifecycle management and outbound header composition.

mod headers;
mod manager;
mod token;

pub use headers::compose_headers;
pub use manager::{TokenError, TokenManager};
pub use token::{TokenState, TokenStore, REFRESH_MARGIN};
