/* Copyright © 2024-2025 Adam Train <adam@trainrelay.net>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */
use crate::corporate::events::{
	CapitalReductionEvent, CashDividendRecord, DividendEvent,
};
use crate::inventory::trade::{Direction, TradeRecord};
use crate::util::money::{round_amount, round_shares};
use anyhow::{bail, Error};
use chrono::{NaiveDate, NaiveTime};
use std::collections::VecDeque;

/// The still-open slice of one instrument's trade log as of some cutoff:
/// the records (or partial records) not yet netted away, their signed net
/// quantity, and the volume-weighted average cost of what remains.
#[derive(Clone, Debug, PartialEq)]
pub struct OpenPosition {
	pub open: Vec<TradeRecord>,
	pub net_quantity: i64,
	pub average_cost: f64,
}

/// The netting and entitlement arithmetic the adjuster calls into. The
/// adjuster itself only merges, filters, and sequences; every number that
/// ends up on a synthesized record comes from an implementation of this.
pub trait LedgerMath {
	/// Nets the given chronological records for one instrument down to the
	/// still-open subset as of the cutoff date. Records dated on or after
	/// the cutoff must not be passed in.
	fn open_position_as_of(
		&self,
		records: &[TradeRecord],
		cutoff: NaiveDate,
	) -> Result<OpenPosition, Error>;

	/// Produces the reduction record (disposes the whole net position at
	/// average cost) and, unless the reduction cancels everything, the
	/// distribution record re-acquiring the surviving shares at a basis
	/// adjusted for the cash refund.
	fn capital_reduction_adjustment(
		&self,
		event: &CapitalReductionEvent,
		position: &OpenPosition,
	) -> Result<(TradeRecord, Option<TradeRecord>), Error>;

	/// Computes the cash entitlement for the net open quantity, plus the
	/// stock-dividend record when the event carries a stock component.
	fn dividend_entitlement(
		&self,
		event: &DividendEvent,
		position: &OpenPosition,
	) -> Result<(CashDividendRecord, Option<TradeRecord>), Error>;
}

/// The production arithmetic. Netting mirrors the matcher's FIFO semantics
/// so that a position snapshot always agrees with what a replay of the same
/// records would leave in the inventory.
pub struct StandardMath;

impl LedgerMath for StandardMath {
	fn open_position_as_of(
		&self,
		records: &[TradeRecord],
		cutoff: NaiveDate,
	) -> Result<OpenPosition, Error> {
		let mut open: VecDeque<TradeRecord> = VecDeque::new();

		for record in records {
			if record.date >= cutoff {
				bail!(
					"Record for {} on {} is not before cutoff {}",
					record.instrument,
					record.date,
					cutoff
				);
			}

			let mut remaining = record.quantity;
			while remaining > 0 {
				match open.front_mut() {
					Some(oldest)
						if oldest.direction != record.direction =>
					{
						if oldest.quantity > remaining {
							oldest.quantity -= remaining;
							remaining = 0;
						} else {
							remaining -= oldest.quantity;
							open.pop_front();
						}
					},
					_ => {
						open.push_back(record.with_quantity(remaining));
						remaining = 0;
					},
				}
			}
		}

		let net_quantity =
			open.iter().map(TradeRecord::signed_quantity).sum();
		let total_quantity: i64 = open.iter().map(|r| r.quantity).sum();
		let average_cost = if total_quantity == 0 {
			0.0
		} else {
			let basis: f64 = open
				.iter()
				.map(|r| r.quantity as f64 * r.unit_price)
				.sum();
			basis / total_quantity as f64
		};

		Ok(OpenPosition {
			open: open.into_iter().collect(),
			net_quantity,
			average_cost,
		})
	}

	fn capital_reduction_adjustment(
		&self,
		event: &CapitalReductionEvent,
		position: &OpenPosition,
	) -> Result<(TradeRecord, Option<TradeRecord>), Error> {
		let net = position.net_quantity;
		if net <= 0 {
			bail!(
				"Capital reduction for {} requires a long position, net is {}",
				event.instrument,
				net
			);
		}

		let cancelled = round_shares(net as f64 * event.cancel_ratio);
		let surviving = net - cancelled;
		let refund = round_amount(net as f64 * event.refund_per_share);

		// Synthesized records carry the day's earliest time so they sort
		// ahead of real trades on the effective date.
		let reduction = TradeRecord::new(
			&event.instrument,
			event.effective_date,
			NaiveTime::MIN,
			Direction::Sell,
			net,
			position.average_cost,
		)?;

		if surviving == 0 {
			return Ok((reduction, None));
		}

		// The refund comes out of the cost basis of the surviving shares
		let adjusted_price = (net as f64 * position.average_cost
			- refund as f64)
			/ surviving as f64;
		let distribution = TradeRecord::new(
			&event.instrument,
			event.effective_date,
			NaiveTime::MIN,
			Direction::Buy,
			surviving,
			adjusted_price,
		)?;

		Ok((reduction, Some(distribution)))
	}

	fn dividend_entitlement(
		&self,
		event: &DividendEvent,
		position: &OpenPosition,
	) -> Result<(CashDividendRecord, Option<TradeRecord>), Error> {
		let net = position.net_quantity;

		let cash = CashDividendRecord {
			instrument: event.instrument.clone(),
			date: event.ex_date,
			quantity: net,
			cash_per_share: event.cash_per_share,
			amount: round_amount(net as f64 * event.cash_per_share),
		};

		let granted = round_shares(net as f64 * event.stock_per_share);
		let stock = if event.stock_per_share > 0.0 && granted > 0 {
			// Stock dividends enter the inventory at zero cost
			Some(TradeRecord::new(
				&event.instrument,
				event.ex_date,
				NaiveTime::MIN,
				Direction::Buy,
				granted,
				0.0,
			)?)
		} else {
			None
		};

		Ok((cash, stock))
	}
}
