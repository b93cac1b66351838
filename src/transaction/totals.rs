//! Income, expense, and net totals for a set of transactions.

use super::core::{Transaction, TransactionType};

/// The summed amounts for a set of transactions.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Totals {
    /// The sum of all income amounts.
    pub income: f64,
    /// The sum of all expense amounts.
    pub expense: f64,
}

impl Totals {
    /// Sum the amounts of `transactions` by type.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions
            .iter()
            .fold(Self::default(), |totals, transaction| {
                match transaction.kind {
                    TransactionType::Income => Self {
                        income: totals.income + transaction.amount,
                        ..totals
                    },
                    TransactionType::Expense => Self {
                        expense: totals.expense + transaction.amount,
                        ..totals
                    },
                }
            })
    }

    /// Income minus expenses. Negative when spending exceeds income.
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}
