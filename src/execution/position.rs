use rust_decimal::Decimal;

use crate::models::OrderReport;

/// Decimal places used when sizing orders
pub const QUANTITY_DECIMALS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Holding,
}

/// Cash and holdings for the single traded asset
///
/// Only mutated from a confirmed fill; a failed order never touches it.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    starting_balance: Decimal,
    cash_balance: Decimal,
    quantity_held: Decimal,
    last_buy_price: Option<Decimal>,
}

impl Position {
    pub fn new(starting_balance: Decimal) -> Self {
        Self {
            starting_balance,
            cash_balance: starting_balance,
            quantity_held: Decimal::ZERO,
            last_buy_price: None,
        }
    }

    pub fn starting_balance(&self) -> Decimal {
        self.starting_balance
    }

    pub fn cash_balance(&self) -> Decimal {
        self.cash_balance
    }

    pub fn quantity_held(&self) -> Decimal {
        self.quantity_held
    }

    pub fn last_buy_price(&self) -> Option<Decimal> {
        self.last_buy_price
    }

    pub fn state(&self) -> PositionState {
        if self.quantity_held > Decimal::ZERO {
            PositionState::Holding
        } else {
            PositionState::Flat
        }
    }

    pub fn is_flat(&self) -> bool {
        self.state() == PositionState::Flat
    }

    /// Order size for a new entry: `risk_fraction` of available cash at
    /// `last_price`, rounded to 4 decimal places.
    ///
    /// Holdings value is not part of the sizing base. Returns `None` when the
    /// price is not positive.
    pub fn order_quantity(&self, risk_fraction: Decimal, last_price: Decimal) -> Option<Decimal> {
        if last_price <= Decimal::ZERO {
            return None;
        }

        let quantity = (risk_fraction * self.cash_balance).checked_div(last_price)?;
        Some(quantity.round_dp(QUANTITY_DECIMALS))
    }

    /// Apply a confirmed buy. Returns the (quantity, price) booked.
    pub fn apply_buy(&mut self, report: &OrderReport) -> anyhow::Result<(Decimal, Decimal)> {
        if !self.is_flat() {
            anyhow::bail!("Buy while already holding {}", self.quantity_held);
        }

        let price = report
            .fill_price()
            .ok_or_else(|| anyhow::anyhow!("Buy report has no fills"))?;
        let quantity = report.filled_quantity();
        if quantity <= Decimal::ZERO {
            anyhow::bail!("Buy report filled {} units", quantity);
        }

        let cash_balance = quantity
            .checked_mul(price)
            .and_then(|cost| self.cash_balance.checked_sub(cost))
            .ok_or_else(|| anyhow::anyhow!("Buy of {} @ {} overflows cash", quantity, price))?;
        let quantity_held = self
            .quantity_held
            .checked_add(quantity)
            .ok_or_else(|| anyhow::anyhow!("Buy of {} overflows holdings", quantity))?;

        self.quantity_held = quantity_held;
        self.cash_balance = cash_balance;
        self.last_buy_price = Some(price);

        Ok((quantity, price))
    }

    /// Apply a confirmed sell of the whole holding. Returns the (quantity, price) booked.
    pub fn apply_sell(&mut self, report: &OrderReport) -> anyhow::Result<(Decimal, Decimal)> {
        if self.is_flat() {
            anyhow::bail!("Sell with nothing held");
        }

        let price = report
            .fill_price()
            .ok_or_else(|| anyhow::anyhow!("Sell report has no fills"))?;
        let quantity = self.quantity_held;
        let cash_balance = quantity
            .checked_mul(price)
            .and_then(|proceeds| self.cash_balance.checked_add(proceeds))
            .ok_or_else(|| anyhow::anyhow!("Sell of {} @ {} overflows cash", quantity, price))?;

        self.cash_balance = cash_balance;
        self.quantity_held = Decimal::ZERO;
        self.last_buy_price = None;

        Ok((quantity, price))
    }

    /// Return on the starting balance, in percent, based on cash only
    pub fn roi_pct(&self) -> Option<Decimal> {
        let gain = self.cash_balance - self.starting_balance;
        gain.checked_div(self.starting_balance)
            .map(|ratio| ratio * Decimal::ONE_HUNDRED)
    }
}
