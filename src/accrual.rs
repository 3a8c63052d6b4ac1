use crate::ledger::{PaymentEntry, ResidentPayments, YearPayments, MONTHS_PER_YEAR};
use crate::utils::is_future_month;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What an explicit zero payment means.
///
/// The accrual rule counts a zero month as unpaid, while the owed-month
/// listing on the resident page treats zero as a discount or prepaid marker.
/// Both readings occur in the source data, so callers pick one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroPaymentPolicy {
    /// Zero accrues the full monthly due, like a missing entry.
    #[default]
    OwedInFull,
    /// Zero is a discount and accrues nothing.
    DiscountExcluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OwedAmounts {
    /// January through the current month of the current year.
    pub owed_current: f64,
    /// All twelve months of the previous year.
    pub owed_prior: f64,
}

/// Amount still due for a single month.
pub fn month_shortfall(
    entry: Option<&PaymentEntry>,
    monthly_due: f64,
    policy: ZeroPaymentPolicy,
) -> f64 {
    match entry.and_then(|e| e.amount) {
        Some(amount) if amount == 0.0 => match policy {
            ZeroPaymentPolicy::OwedInFull => monthly_due,
            ZeroPaymentPolicy::DiscountExcluded => 0.0,
        },
        Some(amount) if amount > 0.0 && amount < monthly_due => monthly_due - amount,
        Some(amount) if amount >= monthly_due => 0.0,
        _ => monthly_due,
    }
}

fn sum_shortfall(
    year: Option<&YearPayments>,
    months: usize,
    monthly_due: f64,
    policy: ZeroPaymentPolicy,
) -> f64 {
    (0..months.min(MONTHS_PER_YEAR))
        .map(|month| {
            let entry = year.and_then(|slots| slots[month].as_ref());
            month_shortfall(entry, monthly_due, policy)
        })
        .sum()
}

/// Owed amounts under the standard accrual rule, where a zero payment is
/// treated as unpaid.
pub fn compute_owed(
    payments: Option<&ResidentPayments>,
    current_year: i32,
    current_month: usize,
    monthly_due: f64,
) -> OwedAmounts {
    compute_owed_with_policy(
        payments,
        current_year,
        current_month,
        monthly_due,
        ZeroPaymentPolicy::OwedInFull,
    )
}

pub fn compute_owed_with_policy(
    payments: Option<&ResidentPayments>,
    current_year: i32,
    current_month: usize,
    monthly_due: f64,
    policy: ZeroPaymentPolicy,
) -> OwedAmounts {
    let this_year = payments.and_then(|p| p.get(&current_year));
    let last_year = payments.and_then(|p| p.get(&(current_year - 1)));

    OwedAmounts {
        owed_current: sum_shortfall(
            this_year,
            current_month.min(MONTHS_PER_YEAR - 1) + 1,
            monthly_due,
            policy,
        ),
        owed_prior: sum_shortfall(last_year, MONTHS_PER_YEAR, monthly_due, policy),
    }
}

/// Months up to and including `through_month` that still owe something.
pub fn owed_months(
    year: Option<&YearPayments>,
    through_month: usize,
    monthly_due: f64,
    policy: ZeroPaymentPolicy,
) -> Vec<usize> {
    (0..=through_month.min(MONTHS_PER_YEAR - 1))
        .filter(|&month| {
            let entry = year.and_then(|slots| slots[month].as_ref());
            month_shortfall(entry, monthly_due, policy) > 0.0
        })
        .collect()
}

/// Display status of one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "amount", rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid(f64),
    Zero,
    /// Nothing recorded yet and the month has not started.
    Future,
    Unpaid,
}

pub fn classify_month(
    entry: Option<&PaymentEntry>,
    year: i32,
    month: usize,
    today: NaiveDate,
) -> PaymentStatus {
    match entry.and_then(|e| e.amount) {
        Some(amount) if amount > 0.0 => PaymentStatus::Paid(amount),
        Some(amount) if amount == 0.0 => PaymentStatus::Zero,
        _ if is_future_month(year, month, today) => PaymentStatus::Future,
        _ => PaymentStatus::Unpaid,
    }
}

pub fn year_statuses(
    year_payments: Option<&YearPayments>,
    year: i32,
    today: NaiveDate,
) -> [PaymentStatus; MONTHS_PER_YEAR] {
    std::array::from_fn(|month| {
        let entry = year_payments.and_then(|slots| slots[month].as_ref());
        classify_month(entry, year, month, today)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::empty_year;

    fn year_of(amounts: &[(usize, Option<f64>)]) -> YearPayments {
        let mut slots = empty_year();
        for &(month, amount) in amounts {
            slots[month] = Some(PaymentEntry { month, amount });
        }
        slots
    }

    #[test]
    fn test_current_year_partial_null_and_absent() {
        let mut payments = ResidentPayments::new();
        payments.insert(2024, year_of(&[(0, Some(40.0)), (1, None)]));

        let owed = compute_owed(Some(&payments), 2024, 2, 50.0);
        assert_eq!(owed.owed_current, 110.0);
        assert_eq!(owed.owed_prior, 600.0);
    }

    #[test]
    fn test_prior_year_fully_paid_and_fully_null() {
        let paid: Vec<(usize, Option<f64>)> = (0..12).map(|m| (m, Some(50.0))).collect();
        let nulls: Vec<(usize, Option<f64>)> = (0..12).map(|m| (m, None)).collect();

        let mut payments = ResidentPayments::new();
        payments.insert(2023, year_of(&paid));
        assert_eq!(compute_owed(Some(&payments), 2024, 0, 50.0).owed_prior, 0.0);

        payments.insert(2023, year_of(&nulls));
        assert_eq!(
            compute_owed(Some(&payments), 2024, 0, 50.0).owed_prior,
            600.0
        );
    }

    #[test]
    fn test_zero_and_overpayment() {
        let mut payments = ResidentPayments::new();
        payments.insert(2024, year_of(&[(0, Some(0.0)), (1, Some(80.0))]));

        let owed = compute_owed(Some(&payments), 2024, 1, 50.0);
        assert_eq!(owed.owed_current, 50.0);

        let discounted = compute_owed_with_policy(
            Some(&payments),
            2024,
            1,
            50.0,
            ZeroPaymentPolicy::DiscountExcluded,
        );
        assert_eq!(discounted.owed_current, 0.0);
    }

    #[test]
    fn test_unknown_resident_owes_everything() {
        let owed = compute_owed(None, 2024, 5, 50.0);
        assert_eq!(owed.owed_current, 300.0);
        assert_eq!(owed.owed_prior, 600.0);
    }

    #[test]
    fn test_month_past_december_is_clamped() {
        let december = compute_owed(None, 2024, 11, 50.0);
        assert_eq!(compute_owed(None, 2024, 12, 50.0), december);
        assert_eq!(compute_owed(None, 2024, usize::MAX, 50.0), december);
        assert_eq!(december.owed_current, 600.0);
    }

    #[test]
    fn test_partial_payment_never_increases_owed() {
        for paid in [0.01, 10.0, 25.0, 49.99] {
            let mut before = ResidentPayments::new();
            before.insert(2024, year_of(&[(0, None)]));
            let mut after = ResidentPayments::new();
            after.insert(2024, year_of(&[(0, Some(paid))]));

            let owed_before = compute_owed(Some(&before), 2024, 0, 50.0).owed_current;
            let owed_after = compute_owed(Some(&after), 2024, 0, 50.0).owed_current;
            assert!(owed_after <= owed_before);
            assert!((owed_after - (50.0 - paid)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_owed_months_respects_policy() {
        let year = year_of(&[(0, Some(50.0)), (1, Some(0.0)), (2, Some(20.0))]);
        assert_eq!(
            owed_months(Some(&year), 3, 50.0, ZeroPaymentPolicy::OwedInFull),
            vec![1, 2, 3]
        );
        assert_eq!(
            owed_months(Some(&year), 3, 50.0, ZeroPaymentPolicy::DiscountExcluded),
            vec![2, 3]
        );
    }

    #[test]
    fn test_classification_relative_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let year = year_of(&[(0, Some(50.0)), (1, Some(0.0)), (7, Some(50.0))]);
        let statuses = year_statuses(Some(&year), 2024, today);

        assert_eq!(statuses[0], PaymentStatus::Paid(50.0));
        assert_eq!(statuses[1], PaymentStatus::Zero);
        assert_eq!(statuses[5], PaymentStatus::Unpaid);
        assert_eq!(statuses[6], PaymentStatus::Future);
        assert_eq!(statuses[7], PaymentStatus::Paid(50.0));

        let next_year = year_statuses(None, 2025, today);
        assert!(next_year.iter().all(|s| *s == PaymentStatus::Future));
        let last_year = year_statuses(None, 2023, today);
        assert!(last_year.iter().all(|s| *s == PaymentStatus::Unpaid));
    }
}
