//! Totals shown above the transactions table.

use crate::transaction::core::{Transaction, TransactionType};

/// Income, expense and balance totals for a list of transactions.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Summary {
    /// The sum of all income amounts.
    pub income: f64,
    /// The sum of all expense amounts, as a positive number.
    pub expenses: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// The number of transactions summarised.
    pub count: usize,
}

impl Summary {
    /// Total up `transactions`.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut summary = transactions
            .iter()
            .fold(Summary::default(), |mut summary, transaction| {
                match transaction.kind {
                    TransactionType::Income => summary.income += transaction.amount,
                    TransactionType::Expense => summary.expenses += transaction.amount,
                }
                summary.count += 1;
                summary
            });

        summary.balance = summary.income - summary.expenses;
        summary
    }
}
