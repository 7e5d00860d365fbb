//! Custom assertions

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_ledger::ports::mock::MemoryWalletStore;

/// Asserts a money amount equals the expected decimal
pub fn assert_amount(actual: Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "expected {expected}, got {actual}"
    );
}

/// Asserts that the sum of all balances equals the expected total
///
/// Transfers must conserve money; only deposits and withdrawals may move
/// the total.
pub async fn assert_conserved(store: &MemoryWalletStore, expected_total: Decimal) {
    let total = store.total_balance().await;
    assert_eq!(
        total, expected_total,
        "balance total drifted: expected {expected_total}, got {total}"
    );
}
