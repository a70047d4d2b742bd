//! Authorization model for the console: the permission catalog, membership resolution,
//! permission evaluation, and the authentication layer that identifies the caller.

mod error;
mod evaluator;
mod extract_token;
mod registry;
mod request;
mod resolver;
mod session;
mod store;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use error::*;
pub use evaluator::*;
pub use registry::*;
pub use request::*;
pub use resolver::*;
pub use session::*;
pub use store::*;
