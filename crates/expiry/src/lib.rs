//! Expiry-proximity rules.
//!
//! Gamma and theta risk explode as an option approaches expiry, so every
//! sizing and timing decision is scaled by how many days the contract has
//! left. `derive_policy` maps days-to-expiry to an immutable [`ExpiryPolicy`]
//! that the sizing calculator and trade lifecycle consume as an argument;
//! there is no shared mutable rule state anywhere.

pub mod policy;

pub use policy::{derive_policy, ExpiryInfo, ExpiryPolicy};
