//! Broker simulator — turns market orders into fills and keeps cash/position books.
//!
//! Single instrument, long only, whole shares. Orders fill immediately at the
//! price the driver passes in (the current bar's close); there is no slippage
//! model and no order book.
//!
//! Cash identity after every fill:
//! - Buy:  cash -= size * price * (1 + commission_rate)
//! - Sell: cash += size * price * (1 - commission_rate)

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Fill, Order, OrderSide, OrderStatus, Position};

/// Broken execution invariants. These indicate a defect in the strategy or
/// driver, never a market condition, and abort the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("sell of {requested} shares exceeds held position of {held}")]
    OversizedSell { requested: i64, held: i64 },
    #[error("buy of {size} shares costs {cost:.2} but only {cash:.2} cash is available")]
    UnaffordableBuy { size: i64, cost: f64, cash: f64 },
    #[error("fill price must be finite and non-negative (got {0})")]
    InvalidFillPrice(f64),
    #[error("an order is already outstanding for this bar")]
    OrderOutstanding,
}

/// Why the broker declined an order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    InsufficientCash { required: f64, available: f64 },
    NonPositiveSize(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Filled(Fill),
    Rejected(RejectReason),
}

impl ExecutionOutcome {
    pub fn fill(&self) -> Option<&Fill> {
        match self {
            ExecutionOutcome::Filled(fill) => Some(fill),
            ExecutionOutcome::Rejected(_) => None,
        }
    }
}

/// Virtual broker owning cash and the position.
#[derive(Debug, Clone)]
pub struct Broker {
    initial_cash: f64,
    cash: f64,
    position: Position,
    commission_rate: f64,
    commission_paid: f64,
    pending: Option<Order>,
}

impl Broker {
    pub fn new(initial_cash: f64, commission_rate: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            position: Position::flat(),
            commission_rate,
            commission_paid: 0.0,
            pending: None,
        }
    }

    /// Back to the starting cash with no position and nothing pending.
    pub fn reset(&mut self) {
        self.cash = self.initial_cash;
        self.position = Position::flat();
        self.commission_paid = 0.0;
        self.pending = None;
    }

    /// Queue an order for execution later in the same bar.
    pub fn submit(&mut self, order: Order) -> Result<(), ExecutionError> {
        if self.pending.is_some() {
            return Err(ExecutionError::OrderOutstanding);
        }
        self.pending = Some(order);
        Ok(())
    }

    /// Resolve the queued order, if any, at `fill_price`.
    pub fn process_pending(
        &mut self,
        bar_index: usize,
        date: NaiveDate,
        fill_price: f64,
    ) -> Result<Option<ExecutionOutcome>, ExecutionError> {
        match self.pending.take() {
            Some(order) => self.execute(order, bar_index, date, fill_price).map(Some),
            None => Ok(None),
        }
    }

    /// Execute a market order at `fill_price`.
    ///
    /// Unaffordable or empty buys come back as `Rejected`; the caller decides
    /// whether that is tolerable. Selling more than is held is an error.
    pub fn execute(
        &mut self,
        mut order: Order,
        bar_index: usize,
        date: NaiveDate,
        fill_price: f64,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        if !fill_price.is_finite() || fill_price < 0.0 {
            return Err(ExecutionError::InvalidFillPrice(fill_price));
        }
        if order.size <= 0 {
            order.status = OrderStatus::Rejected;
            warn!("{date}: {} order rejected, size {}", order.side, order.size);
            return Ok(ExecutionOutcome::Rejected(RejectReason::NonPositiveSize(
                order.size,
            )));
        }

        let notional = order.size as f64 * fill_price;
        let commission = notional * self.commission_rate;

        match order.side {
            OrderSide::Buy => {
                let cost = notional + commission;
                if cost > self.cash {
                    order.status = OrderStatus::Rejected;
                    warn!(
                        "{date}: BUY rejected, cost {cost:.2} exceeds cash {:.2}",
                        self.cash
                    );
                    return Ok(ExecutionOutcome::Rejected(RejectReason::InsufficientCash {
                        required: cost,
                        available: self.cash,
                    }));
                }
                self.cash -= cost;
                let new_size = self.position.size + order.size;
                self.position.average_cost = (self.position.average_cost
                    * self.position.size as f64
                    + notional)
                    / new_size as f64;
                self.position.size = new_size;
            }
            OrderSide::Sell => {
                if order.size > self.position.size {
                    return Err(ExecutionError::OversizedSell {
                        requested: order.size,
                        held: self.position.size,
                    });
                }
                self.cash += notional - commission;
                self.position.size -= order.size;
                if self.position.size == 0 {
                    self.position.average_cost = 0.0;
                }
            }
        }

        self.commission_paid += commission;
        order.status = OrderStatus::Filled;
        info!(
            "{date}: {} EXECUTED, {} shares at {fill_price:.2} (commission {commission:.2})",
            order.side, order.size
        );

        Ok(ExecutionOutcome::Filled(Fill {
            bar_index,
            date,
            side: order.side,
            size: order.size,
            price: fill_price,
            commission,
        }))
    }

    /// cash + position.size * close
    pub fn portfolio_value(&self, current_close: f64) -> f64 {
        self.cash + self.position.market_value(current_close)
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    pub fn commission_paid(&self) -> f64 {
        self.commission_paid
    }

    pub fn has_pending_order(&self) -> bool {
        self.pending.is_some()
    }

    pub fn handle(&self) -> BrokerHandle<'_> {
        BrokerHandle { broker: self }
    }
}

/// Read-only view of the broker handed to strategies.
#[derive(Debug, Clone, Copy)]
pub struct BrokerHandle<'a> {
    broker: &'a Broker,
}

impl BrokerHandle<'_> {
    pub fn cash(&self) -> f64 {
        self.broker.cash
    }

    pub fn position(&self) -> Position {
        self.broker.position
    }

    pub fn commission_rate(&self) -> f64 {
        self.broker.commission_rate
    }

    pub fn has_pending_order(&self) -> bool {
        self.broker.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn buy_then_sell_without_commission() {
        let mut broker = Broker::new(100_000.0, 0.0);
        let buy = broker.execute(Order::buy(100), 0, day(1), 50.0).unwrap();
        assert_eq!(buy.fill().unwrap().size, 100);
        assert_eq!(broker.cash(), 95_000.0);
        assert_eq!(broker.position().size, 100);
        assert_eq!(broker.position().average_cost, 50.0);
        assert_eq!(broker.portfolio_value(52.0), 100_200.0);

        broker.execute(Order::sell(100), 1, day(2), 55.0).unwrap();
        assert_eq!(broker.cash(), 100_500.0);
        assert!(broker.position().is_flat());
        assert_eq!(broker.position().average_cost, 0.0);
    }

    #[test]
    fn commission_applies_on_both_legs() {
        let mut broker = Broker::new(10_000.0, 0.001);
        broker.execute(Order::buy(10), 0, day(1), 100.0).unwrap();
        // 1000 notional + 1.0 commission
        assert!((broker.cash() - 8_999.0).abs() < 1e-9);
        let outcome = broker.execute(Order::sell(10), 1, day(2), 110.0).unwrap();
        assert!((outcome.fill().unwrap().commission - 1.1).abs() < 1e-9);
        assert!((broker.cash() - (8_999.0 + 1_100.0 - 1.1)).abs() < 1e-9);
        assert!((broker.commission_paid() - 2.1).abs() < 1e-9);
    }

    #[test]
    fn unaffordable_buy_is_rejected_and_books_untouched() {
        let mut broker = Broker::new(1_000.0, 0.0);
        let outcome = broker.execute(Order::buy(11), 0, day(1), 100.0).unwrap();
        assert!(matches!(
            outcome,
            ExecutionOutcome::Rejected(RejectReason::InsufficientCash { .. })
        ));
        assert_eq!(broker.cash(), 1_000.0);
        assert!(broker.position().is_flat());
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut broker = Broker::new(1_000.0, 0.0);
        let outcome = broker.execute(Order::buy(0), 0, day(1), 100.0).unwrap();
        assert_eq!(
            outcome,
            ExecutionOutcome::Rejected(RejectReason::NonPositiveSize(0))
        );
    }

    #[test]
    fn oversized_sell_is_an_error() {
        let mut broker = Broker::new(1_000.0, 0.0);
        broker.execute(Order::buy(5), 0, day(1), 100.0).unwrap();
        let err = broker.execute(Order::sell(6), 1, day(2), 100.0).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::OversizedSell {
                requested: 6,
                held: 5
            }
        );
        assert_eq!(broker.position().size, 5);
    }

    #[test]
    fn average_cost_is_size_weighted() {
        let mut broker = Broker::new(10_000.0, 0.0);
        broker.execute(Order::buy(10), 0, day(1), 100.0).unwrap();
        broker.execute(Order::buy(30), 1, day(2), 120.0).unwrap();
        assert_eq!(broker.position().size, 40);
        assert!((broker.position().average_cost - 115.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_fill_price_is_an_error() {
        let mut broker = Broker::new(1_000.0, 0.0);
        assert!(matches!(
            broker.execute(Order::buy(1), 0, day(1), f64::NAN),
            Err(ExecutionError::InvalidFillPrice(_))
        ));
        assert!(matches!(
            broker.execute(Order::buy(1), 0, day(1), -0.01),
            Err(ExecutionError::InvalidFillPrice(_))
        ));
    }

    #[test]
    fn sell_at_zero_price_fills_with_no_proceeds() {
        let mut broker = Broker::new(1_000.0, 0.001);
        broker.execute(Order::buy(10), 0, day(1), 50.0).unwrap();
        let cash_before = broker.cash();

        let outcome = broker.execute(Order::sell(10), 1, day(2), 0.0).unwrap();
        let fill = outcome.fill().unwrap();
        assert_eq!(fill.price, 0.0);
        assert_eq!(fill.commission, 0.0);
        assert_eq!(broker.cash(), cash_before);
        assert!(broker.position().is_flat());
        assert_eq!(broker.portfolio_value(0.0), cash_before);
    }

    #[test]
    fn pending_guard_blocks_second_order() {
        let mut broker = Broker::new(1_000.0, 0.0);
        broker.submit(Order::buy(1)).unwrap();
        assert!(broker.handle().has_pending_order());
        assert_eq!(
            broker.submit(Order::buy(1)),
            Err(ExecutionError::OrderOutstanding)
        );

        let outcome = broker.process_pending(0, day(1), 10.0).unwrap();
        assert!(outcome.unwrap().fill().is_some());
        assert!(!broker.has_pending_order());
        assert_eq!(broker.process_pending(1, day(2), 10.0).unwrap(), None);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut broker = Broker::new(1_000.0, 0.01);
        broker.execute(Order::buy(5), 0, day(1), 100.0).unwrap();
        broker.reset();
        assert_eq!(broker.cash(), 1_000.0);
        assert!(broker.position().is_flat());
        assert_eq!(broker.commission_paid(), 0.0);
    }
}
