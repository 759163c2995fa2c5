//! # Keygate Testkit
//!
//! Testing utilities for Keygate.
//!
//! ## Overview
//!
//! - **Fixtures**: parties with deterministic identities and a ready-made
//!   subscription scenario over an in-memory chain
//! - **Generators**: proptest strategies, including flat policies whose
//!   per-condition outcomes (true, false, unavailable) are known up front
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use keygate_testkit::generators::{policy_from_params, PolicyParams};
//!
//! proptest! {
//!     #[test]
//!     fn digest_is_deterministic(params: PolicyParams) {
//!         let candidate = keygate_core::Address::from_bytes([1; 32]);
//!         let a = policy_from_params(&params, candidate);
//!         let b = policy_from_params(&params, candidate);
//!         prop_assert_eq!(a.digest().unwrap(), b.digest().unwrap());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use keygate_testkit::fixtures::ScenarioFixture;
//!
//! # async fn example() {
//! let fixture = ScenarioFixture::new();
//! fixture.set_subscriptions(1);
//! let artifact = fixture
//!     .vault
//!     .seal(b"data", fixture.policy(), &fixture.owner.keypair, fixture.owner.address())
//!     .await
//!     .unwrap();
//! # }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{multi_party, Party, ScenarioFixture, ScenarioVault};
pub use generators::{policy_from_params, Outcome, PolicyParams};
