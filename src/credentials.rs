//! Call credentials: per-call authorization metadata for outgoing RPCs.
//!
//! `audience` derives the `https://<authority>/<service>` identifier a credential is minted
//! for. `source` and `executor` are the seams callers plug in: where metadata comes from and
//! where the (possibly network-bound) fetch runs. `encoder` turns raw metadata into wire
//! headers, and `injector` ties them together behind [`CredentialMetadataInjector`], caching
//! encoded headers per upstream metadata snapshot.

pub mod audience;
pub mod encoder;
pub mod executor;
pub mod injector;
pub mod source;

pub use audience::*;
pub use encoder::*;
pub use executor::*;
pub use injector::*;
pub use source::*;
