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
use crate::util::money::round_amount;
use anyhow::{bail, Error};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Brokerage commission charged on both sides of a trade, as a fraction of
/// the total amount.
const COMMISSION_RATE: f64 = 0.001425;

/// Securities transaction tax, charged on disposals only.
const TRANSACTION_TAX_RATE: f64 = 0.003;

/// Whether a trade increases or decreases the held position. Fixed at
/// creation; an existing lot never flips direction. The wire form is the
/// broker's signed type code: +1 acquisition, -1 disposal.
#[derive(
	Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Direction {
	Buy,
	Sell,
}

impl Direction {
	pub fn from_code(code: i8) -> Result<Self, Error> {
		match code {
			1 => Ok(Direction::Buy),
			-1 => Ok(Direction::Sell),
			_ => bail!("Transaction type must be 1 (buy) or -1 (sell)"),
		}
	}

	pub fn code(&self) -> i8 {
		match self {
			Direction::Buy => 1,
			Direction::Sell => -1,
		}
	}
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.code())
	}
}

/// One ledger entry as observed from the broker: either a raw record (the
/// immutable source of truth) or an adjusted record synthesized by the
/// corporate action adjuster. Both wear the same shape, and the rebuild
/// replay consumes them interchangeably.
///
/// Records order by (date, time); the time disambiguates same-day trades.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
	pub instrument: String,
	pub date: NaiveDate,
	pub time: NaiveTime,
	pub direction: Direction,

	/// Always positive; the sign lives in `direction`
	pub quantity: i64,
	pub unit_price: f64,
}

impl TradeRecord {
	pub fn new(
		instrument: &str,
		date: NaiveDate,
		time: NaiveTime,
		direction: Direction,
		quantity: i64,
		unit_price: f64,
	) -> Result<Self, Error> {
		if quantity <= 0 {
			bail!(
				"Trade for {} on {} has non-positive quantity {}",
				instrument,
				date,
				quantity
			);
		}

		Ok(Self {
			instrument: instrument.to_string(),
			date,
			time,
			direction,
			quantity,
			unit_price,
		})
	}

	/// Copy of this record carrying a different quantity. Used when a match
	/// consumes only part of an event.
	pub fn with_quantity(&self, quantity: i64) -> Self {
		Self {
			quantity,
			..self.clone()
		}
	}

	/// Quantity signed by direction; sums of these give the net position.
	pub fn signed_quantity(&self) -> i64 {
		self.quantity * self.direction.code() as i64
	}

	pub fn total_amount(&self) -> i64 {
		round_amount(self.quantity as f64 * self.unit_price)
	}

	/// Commission plus, for disposals, the transaction tax.
	pub fn fees(&self) -> i64 {
		let total = self.quantity as f64 * self.unit_price;
		let rate = match self.direction {
			Direction::Buy => COMMISSION_RATE,
			Direction::Sell => COMMISSION_RATE + TRANSACTION_TAX_RATE,
		};
		round_amount(total * rate)
	}

	/// The replay ordering of the ledger. Instrument breaks remaining ties
	/// so sorts are total and rebuilds deterministic.
	pub fn chronological(&self, other: &Self) -> Ordering {
		(self.date, self.time, &self.instrument).cmp(&(
			other.date,
			other.time,
			&other.instrument,
		))
	}
}
