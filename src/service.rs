//! Service-definition descriptors shared by servers and clients.
//!
//! `method` exposes validated fully-qualified method names and the [`MethodKey`] handle whose
//! instance identity the registry checks. `contract` defines [`ServiceContract`], the immutable
//! list of methods a service declares.

pub mod contract;
pub mod method;

pub use contract::*;
pub use method::*;
