//! Randomized test data generators

use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;
use rand::Rng;

use core_kernel::Money;

/// A random human-looking name for descriptions
pub fn person_name() -> String {
    Name().fake()
}

/// A short random description
pub fn description() -> String {
    Sentence(1..4).fake()
}

/// A random positive amount under the default per-transaction cap
pub fn transferable_amount() -> Money {
    let minor = rand::thread_rng().gen_range(1..=1_000_000i64);
    Money::from_minor(minor, Default::default())
}

/// A random 4-digit PIN
pub fn pin() -> String {
    format!("{:04}", rand::thread_rng().gen_range(0..10_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_shape() {
        let pin = pin();
        assert_eq!(pin.len(), 4);
        assert!(pin.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_transferable_amount_in_cap() {
        for _ in 0..100 {
            let amount = transferable_amount();
            assert!(amount.is_positive());
            assert!(amount.amount() <= rust_decimal_macros::dec!(10000));
        }
    }
}
