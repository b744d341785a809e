//! # Payment Allocator
//!
//! Splits the amount due across payment methods during checkout.
//!
//! ## Split Tender Example
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Total due: 10 000 F                                                    │
//! │                                                                         │
//! │  set_amount(Cash, 6000)       cash 6 000                                │
//! │  add_amount(Wave, 3000)       cash 6 000 · wave 3 000   remaining 1 000 │
//! │  fill_exact(Cash, 10000)      cash 7 000 · wave 3 000   remaining 0     │
//! │                                                                         │
//! │  can_checkout(10000) == true, change == 0                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Every stored amount is >= 0; an absent method counts as 0
//! - Iteration follows `PaymentMethod` order (cash, orange_money, wave, card)
//! - `remaining` and `change` are never negative and never both non-zero

use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, TenderEntry};
use crate::validation::{validate_keypad_digits, ValidationResult};
use crate::MAX_TENDER_DIGITS;

/// Derived figures for the tender panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AllocationTotals {
    pub total_allocated: Money,
    /// max(0, due − allocated)
    pub remaining: Money,
    /// max(0, allocated − due)
    pub change: Money,
}

impl AllocationTotals {
    /// Computes the totals for an allocated sum against the amount due.
    pub fn compute(total_allocated: Money, total_due: Money) -> Self {
        AllocationTotals {
            total_allocated,
            remaining: total_due.saturating_sub(total_allocated).non_negative(),
            change: total_allocated.saturating_sub(total_due).non_negative(),
        }
    }

    /// True when nothing is left to collect.
    pub fn is_covered(&self) -> bool {
        self.remaining.is_zero()
    }
}

/// Money assigned to each payment method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentAllocation {
    amounts: BTreeMap<PaymentMethod, Money>,
}

impl PaymentAllocation {
    pub fn new() -> Self {
        PaymentAllocation::default()
    }

    /// Amount currently assigned to a method (0 when absent).
    pub fn amount(&self, method: PaymentMethod) -> Money {
        self.amounts.get(&method).copied().unwrap_or_default()
    }

    /// Sets a method's amount. Negative input is stored as 0.
    pub fn set_amount(&mut self, method: PaymentMethod, amount: Money) {
        let amount = amount.non_negative();
        if amount.is_zero() {
            self.amounts.remove(&method);
        } else {
            self.amounts.insert(method, amount);
        }
    }

    /// Adds to a method's amount (quick-amount chips).
    ///
    /// Negative increments are ignored.
    pub fn add_amount(&mut self, method: PaymentMethod, increment: Money) -> Money {
        if increment.is_positive() {
            let next = self.amount(method).saturating_add(increment);
            self.set_amount(method, next);
        }
        self.amount(method)
    }

    /// Assigns to `method` whatever the other methods leave uncovered.
    ///
    /// ```rust
    /// use peelo_core::money::Money;
    /// use peelo_core::payment::PaymentAllocation;
    /// use peelo_core::types::PaymentMethod;
    ///
    /// let mut allocation = PaymentAllocation::new();
    /// allocation.set_amount(PaymentMethod::Wave, Money::from_units(3000));
    /// allocation.fill_exact(PaymentMethod::Cash, Money::from_units(10000));
    /// assert_eq!(allocation.amount(PaymentMethod::Cash).units(), 7000);
    /// ```
    pub fn fill_exact(&mut self, method: PaymentMethod, total_due: Money) -> Money {
        let others: Money = self
            .amounts
            .iter()
            .filter(|(m, _)| **m != method)
            .map(|(_, amount)| *amount)
            .sum();

        self.set_amount(method, total_due.saturating_sub(others));
        self.amount(method)
    }

    /// Resets one method to 0.
    pub fn clear_method(&mut self, method: PaymentMethod) {
        self.amounts.remove(&method);
    }

    /// Keypad entry: appends digits to the method's current amount.
    ///
    /// ## Behavior
    /// ```text
    /// current 0    + "1"  ─► 1
    /// current 12   + "3"  ─► 123
    /// current 123  + "00" ─► 12300
    /// current 123456789 + "0" ─► unchanged (would reach 10 digits)
    /// ```
    pub fn press_digits(&mut self, method: PaymentMethod, keys: &str) -> ValidationResult<Money> {
        validate_keypad_digits(keys)?;

        let current = self.amount(method);
        let mut rendered = if current.is_zero() {
            String::new()
        } else {
            current.units().to_string()
        };
        rendered.push_str(keys);

        if rendered.len() > MAX_TENDER_DIGITS {
            return Ok(current);
        }

        // At most MAX_TENDER_DIGITS decimal digits, always fits in i64.
        let value = rendered.parse::<i64>().unwrap_or_default();
        self.set_amount(method, Money::from_units(value));
        Ok(self.amount(method))
    }

    /// Keypad backspace: drops the last digit of the method's amount.
    pub fn backspace(&mut self, method: PaymentMethod) -> Money {
        let next = self.amount(method).units() / 10;
        self.set_amount(method, Money::from_units(next));
        self.amount(method)
    }

    /// Empties the whole allocation.
    pub fn reset(&mut self) {
        self.amounts.clear();
    }

    /// Non-zero allocations in method order.
    pub fn entries(&self) -> Vec<TenderEntry> {
        self.amounts
            .iter()
            .filter(|(_, amount)| amount.is_positive())
            .map(|(method, amount)| TenderEntry {
                method: *method,
                amount: *amount,
            })
            .collect()
    }

    /// Σ of every allocation.
    pub fn total_allocated(&self) -> Money {
        self.amounts.values().sum()
    }

    pub fn totals(&self, total_due: Money) -> AllocationTotals {
        AllocationTotals::compute(self.total_allocated(), total_due)
    }

    /// Checkout gate: allocations cover the amount due.
    pub fn can_checkout(&self, total_due: Money) -> bool {
        self.total_allocated() >= total_due
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(units: i64) -> Money {
        Money::from_units(units)
    }

    #[test]
    fn test_absent_method_is_zero() {
        let allocation = PaymentAllocation::new();
        assert_eq!(allocation.amount(PaymentMethod::Card), Money::zero());
        assert!(allocation.entries().is_empty());
    }

    #[test]
    fn test_set_amount_clamps_negative() {
        let mut allocation = PaymentAllocation::new();
        allocation.set_amount(PaymentMethod::Cash, m(-500));
        assert_eq!(allocation.amount(PaymentMethod::Cash), Money::zero());

        allocation.set_amount(PaymentMethod::Cash, m(500));
        allocation.set_amount(PaymentMethod::Cash, m(200));
        assert_eq!(allocation.amount(PaymentMethod::Cash).units(), 200);
    }

    #[test]
    fn test_add_amount_ignores_negative_increment() {
        let mut allocation = PaymentAllocation::new();
        allocation.add_amount(PaymentMethod::Wave, m(1000));
        allocation.add_amount(PaymentMethod::Wave, m(5000));
        allocation.add_amount(PaymentMethod::Wave, m(-2000));
        assert_eq!(allocation.amount(PaymentMethod::Wave).units(), 6000);
    }

    #[test]
    fn test_fill_exact_never_negative() {
        let mut allocation = PaymentAllocation::new();
        allocation.set_amount(PaymentMethod::Card, m(15000));
        let filled = allocation.fill_exact(PaymentMethod::Cash, m(10000));

        assert_eq!(filled, Money::zero());
        assert_eq!(allocation.amount(PaymentMethod::Card).units(), 15000);
    }

    #[test]
    fn test_split_tender_scenario() {
        let due = m(10000);
        let mut allocation = PaymentAllocation::new();

        allocation.set_amount(PaymentMethod::Cash, m(6000));
        allocation.add_amount(PaymentMethod::Wave, m(3000));
        assert!(!allocation.can_checkout(due));
        assert_eq!(allocation.totals(due).remaining.units(), 1000);

        allocation.fill_exact(PaymentMethod::Cash, due);
        assert_eq!(allocation.amount(PaymentMethod::Cash).units(), 7000);
        assert!(allocation.can_checkout(due));

        let totals = allocation.totals(due);
        assert_eq!(totals.total_allocated.units(), 10000);
        assert_eq!(totals.remaining, Money::zero());
        assert_eq!(totals.change, Money::zero());
    }

    #[test]
    fn test_overpayment_yields_change() {
        let mut allocation = PaymentAllocation::new();
        allocation.set_amount(PaymentMethod::Cash, m(10000));

        let totals = allocation.totals(m(7500));
        assert_eq!(totals.change.units(), 2500);
        assert_eq!(totals.remaining, Money::zero());
        assert!(totals.is_covered());
    }

    #[test]
    fn test_remaining_and_change_not_both_nonzero() {
        for (allocated, due) in [(0, 0), (500, 1000), (1000, 1000), (1500, 1000), (0, 1)] {
            let totals = AllocationTotals::compute(m(allocated), m(due));
            assert!(!totals.remaining.is_negative());
            assert!(!totals.change.is_negative());
            assert!(totals.remaining.is_zero() || totals.change.is_zero());
        }
    }

    #[test]
    fn test_zero_due_can_checkout_with_nothing() {
        let allocation = PaymentAllocation::new();
        assert!(allocation.can_checkout(Money::zero()));
    }

    #[test]
    fn test_press_digits_appends() {
        let mut allocation = PaymentAllocation::new();
        allocation.press_digits(PaymentMethod::Cash, "1").unwrap();
        allocation.press_digits(PaymentMethod::Cash, "2").unwrap();
        allocation.press_digits(PaymentMethod::Cash, "3").unwrap();
        assert_eq!(allocation.amount(PaymentMethod::Cash).units(), 123);

        allocation.press_digits(PaymentMethod::Cash, "00").unwrap();
        assert_eq!(allocation.amount(PaymentMethod::Cash).units(), 12300);
    }

    #[test]
    fn test_press_digits_leading_zero_stays_zero() {
        let mut allocation = PaymentAllocation::new();
        allocation.press_digits(PaymentMethod::Wave, "0").unwrap();
        allocation.press_digits(PaymentMethod::Wave, "00").unwrap();
        assert_eq!(allocation.amount(PaymentMethod::Wave), Money::zero());

        allocation.press_digits(PaymentMethod::Wave, "5").unwrap();
        assert_eq!(allocation.amount(PaymentMethod::Wave).units(), 5);
    }

    #[test]
    fn test_press_digits_ignores_tenth_digit() {
        let mut allocation = PaymentAllocation::new();
        allocation.set_amount(PaymentMethod::Cash, m(123_456_789));

        let result = allocation.press_digits(PaymentMethod::Cash, "1").unwrap();
        assert_eq!(result.units(), 123_456_789);

        allocation.set_amount(PaymentMethod::Cash, m(12_345_678));
        let result = allocation.press_digits(PaymentMethod::Cash, "00").unwrap();
        assert_eq!(result.units(), 12_345_678);
    }

    #[test]
    fn test_press_digits_rejects_non_digits() {
        let mut allocation = PaymentAllocation::new();
        assert!(allocation.press_digits(PaymentMethod::Cash, "x").is_err());
        assert!(allocation.press_digits(PaymentMethod::Cash, "-5").is_err());
        assert!(allocation.is_empty());
    }

    #[test]
    fn test_backspace() {
        let mut allocation = PaymentAllocation::new();
        allocation.set_amount(PaymentMethod::Card, m(1234));

        assert_eq!(allocation.backspace(PaymentMethod::Card).units(), 123);
        allocation.backspace(PaymentMethod::Card);
        allocation.backspace(PaymentMethod::Card);
        assert_eq!(allocation.backspace(PaymentMethod::Card), Money::zero());
        assert_eq!(allocation.backspace(PaymentMethod::Card), Money::zero());
    }

    #[test]
    fn test_entries_skip_zero_and_follow_method_order() {
        let mut allocation = PaymentAllocation::new();
        allocation.set_amount(PaymentMethod::Card, m(100));
        allocation.set_amount(PaymentMethod::Cash, m(200));
        allocation.set_amount(PaymentMethod::Wave, m(300));
        allocation.clear_method(PaymentMethod::Wave);

        let methods: Vec<PaymentMethod> = allocation.entries().iter().map(|e| e.method).collect();
        assert_eq!(methods, vec![PaymentMethod::Cash, PaymentMethod::Card]);

        allocation.reset();
        assert!(allocation.is_empty());
        assert_eq!(allocation.total_allocated(), Money::zero());
    }
}
