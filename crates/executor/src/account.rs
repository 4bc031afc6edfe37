use crate::error::ExecutorError;
use rust_decimal::Decimal;
use serde::Serialize;

/// The balance ledger of one simulation run.
///
/// Money at risk is moved from `balance` into `reserved` when a trade opens,
/// and released together with the trade's signed profit when it closes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub balance: Decimal,
    pub reserved: Decimal,
}

impl Account {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            balance: initial_balance,
            reserved: Decimal::ZERO,
        }
    }

    /// Free balance plus everything currently set aside.
    pub fn equity(&self) -> Decimal {
        self.balance + self.reserved
    }

    /// Sets `amount` aside for a newly opened trade.
    pub fn reserve(&mut self, amount: Decimal) -> Result<(), ExecutorError> {
        if amount.is_sign_negative() || amount > self.balance {
            return Err(ExecutorError::InsufficientBalance {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.reserved += amount;
        Ok(())
    }

    /// Releases a closed trade's reservation and books its profit.
    pub fn settle(&mut self, reserved: Decimal, profit: Decimal) -> Result<(), ExecutorError> {
        if reserved > self.reserved {
            return Err(ExecutorError::ReservationMismatch {
                requested: reserved,
                reserved: self.reserved,
            });
        }
        self.reserved -= reserved;
        self.balance += reserved + profit;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn reserve_then_settle_books_signed_profit() {
        let mut account = Account::new(dec!(10000));
        account.reserve(dec!(100)).unwrap();
        assert_eq!(account.balance, dec!(9900));
        assert_eq!(account.equity(), dec!(10000));

        account.settle(dec!(100), dec!(-50)).unwrap();
        assert_eq!(account.balance, dec!(9950));
        assert_eq!(account.reserved, Decimal::ZERO);
    }

    #[test]
    fn cannot_reserve_more_than_the_free_balance() {
        let mut account = Account::new(dec!(50));
        assert!(matches!(
            account.reserve(dec!(51)),
            Err(ExecutorError::InsufficientBalance { .. })
        ));
        assert!(account.settle(dec!(1), dec!(0)).is_err());
    }
}
