//! Shared test utilities, fixtures, and helpers for the wallet test suite
//!
//! - **Fixtures**: Canonical amounts, instants, and ids
//! - **Builders**: Assemble wired-up service harnesses with defaults
//! - **Assertions**: Conservation and money comparisons
//! - **Generators**: Randomized test data via `fake`

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::{IdFixtures, MoneyFixtures, TemporalFixtures};
pub use builders::WalletHarnessBuilder;
pub use assertions::{assert_amount, assert_conserved};
