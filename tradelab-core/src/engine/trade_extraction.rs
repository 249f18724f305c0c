//! Trade extraction — pairs entry and exit fills into round-trip trades.
//!
//! Pure post-processing over the fill log. A trade opens on the first Buy
//! from flat and closes on the Sell that brings the position back to zero.
//! A trailing entry with no exit is not a trade; the engine reports it as the
//! open position instead.

use chrono::NaiveDate;

use crate::domain::{Fill, OrderSide, Trade};

struct OpenTrade {
    entry_bar: usize,
    entry_date: NaiveDate,
    size: i64,
    entry_notional: f64,
    exit_notional: f64,
    exited: i64,
    commission: f64,
}

pub fn extract_trades(fills: &[Fill]) -> Vec<Trade> {
    let mut trades = Vec::new();
    let mut open: Option<OpenTrade> = None;

    for fill in fills {
        match fill.side {
            OrderSide::Buy => {
                let trade = open.get_or_insert_with(|| OpenTrade {
                    entry_bar: fill.bar_index,
                    entry_date: fill.date,
                    size: 0,
                    entry_notional: 0.0,
                    exit_notional: 0.0,
                    exited: 0,
                    commission: 0.0,
                });
                trade.size += fill.size;
                trade.entry_notional += fill.notional();
                trade.commission += fill.commission;
            }
            OrderSide::Sell => {
                // A sell with nothing open cannot come from the broker.
                let Some(trade) = open.as_mut() else {
                    continue;
                };
                trade.exited += fill.size;
                trade.exit_notional += fill.notional();
                trade.commission += fill.commission;
                if trade.exited >= trade.size {
                    if let Some(closed) = open.take() {
                        trades.push(close_trade(closed, fill));
                    }
                }
            }
        }
    }

    trades
}

fn close_trade(open: OpenTrade, exit: &Fill) -> Trade {
    let size = open.size as f64;
    let entry_price = open.entry_notional / size;
    let exit_price = open.exit_notional / open.exited as f64;
    Trade {
        entry_bar: open.entry_bar,
        entry_date: open.entry_date,
        entry_price,
        exit_bar: exit.bar_index,
        exit_date: exit.date,
        exit_price,
        size: open.size,
        commission: open.commission,
        pnl: open.exit_notional - open.entry_notional - open.commission,
        bars_held: exit.bar_index - open.entry_bar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(bar_index: usize, side: OrderSide, size: i64, price: f64, commission: f64) -> Fill {
        Fill {
            bar_index,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(bar_index as u64),
            side,
            size,
            price,
            commission,
        }
    }

    #[test]
    fn pairs_buy_with_next_sell() {
        let fills = vec![
            fill(2, OrderSide::Buy, 100, 50.0, 0.0),
            fill(7, OrderSide::Sell, 100, 55.0, 0.0),
        ];
        let trades = extract_trades(&fills);
        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert_eq!((t.entry_bar, t.exit_bar, t.bars_held), (2, 7, 5));
        assert_eq!(t.entry_price, 50.0);
        assert_eq!(t.exit_price, 55.0);
        assert_eq!(t.pnl, 500.0);
        assert!(t.is_winner());
    }

    #[test]
    fn pnl_is_net_of_both_commissions() {
        let fills = vec![
            fill(0, OrderSide::Buy, 10, 100.0, 1.0),
            fill(3, OrderSide::Sell, 10, 99.0, 0.99),
        ];
        let t = &extract_trades(&fills)[0];
        assert!((t.commission - 1.99).abs() < 1e-12);
        assert!((t.pnl - (-10.0 - 1.99)).abs() < 1e-12);
        assert!(t.is_loser());
    }

    #[test]
    fn trailing_entry_is_not_a_trade() {
        let fills = vec![
            fill(0, OrderSide::Buy, 10, 100.0, 0.0),
            fill(1, OrderSide::Sell, 10, 101.0, 0.0),
            fill(4, OrderSide::Buy, 9, 110.0, 0.0),
        ];
        let trades = extract_trades(&fills);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_bar, 1);
    }

    #[test]
    fn trades_do_not_overlap() {
        let fills = vec![
            fill(0, OrderSide::Buy, 1, 10.0, 0.0),
            fill(2, OrderSide::Sell, 1, 11.0, 0.0),
            fill(2, OrderSide::Buy, 1, 11.0, 0.0),
            fill(5, OrderSide::Sell, 1, 9.0, 0.0),
        ];
        let trades = extract_trades(&fills);
        assert_eq!(trades.len(), 2);
        assert!(trades[0].exit_bar <= trades[1].entry_bar);
    }

    #[test]
    fn no_fills_no_trades() {
        assert!(extract_trades(&[]).is_empty());
    }
}
