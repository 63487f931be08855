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
use anyhow::{bail, Error};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A capital reduction announced by the issuer: on the effective date some
/// fraction of held shares is cancelled, usually with a cash refund per
/// share. Input to the adjuster; never mutated by the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapitalReductionEvent {
	pub instrument: String,
	pub effective_date: NaiveDate,

	/// Fraction of held shares cancelled, in (0, 1]
	pub cancel_ratio: f64,

	/// Cash returned per held share, in currency units
	pub refund_per_share: f64,
}

impl CapitalReductionEvent {
	pub fn new(
		instrument: &str,
		effective_date: NaiveDate,
		cancel_ratio: f64,
		refund_per_share: f64,
	) -> Result<Self, Error> {
		if !(cancel_ratio > 0.0 && cancel_ratio <= 1.0) {
			bail!(
				"Capital reduction ratio for {} must be in (0, 1], got {}",
				instrument,
				cancel_ratio
			);
		}
		if refund_per_share < 0.0 {
			bail!("Refund per share for {} cannot be negative", instrument);
		}

		Ok(Self {
			instrument: instrument.to_string(),
			effective_date,
			cancel_ratio,
			refund_per_share,
		})
	}
}

/// A dividend with a cash component and an optional stock component,
/// keyed by instrument and ex-dividend date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DividendEvent {
	pub instrument: String,
	pub ex_date: NaiveDate,
	pub cash_per_share: f64,

	/// New shares granted per held share; zero when purely cash
	pub stock_per_share: f64,
}

impl DividendEvent {
	pub fn new(
		instrument: &str,
		ex_date: NaiveDate,
		cash_per_share: f64,
		stock_per_share: f64,
	) -> Result<Self, Error> {
		if cash_per_share < 0.0 || stock_per_share < 0.0 {
			bail!("Dividend rates for {} cannot be negative", instrument);
		}
		if cash_per_share == 0.0 && stock_per_share == 0.0 {
			bail!("Dividend for {} distributes nothing", instrument);
		}

		Ok(Self {
			instrument: instrument.to_string(),
			ex_date,
			cash_per_share,
			stock_per_share,
		})
	}
}

/// One computed cash entitlement: what the holder receives for the net open
/// quantity as of the dividend's ex-date. The whole set is recomputed and
/// replaced on every rebuild.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashDividendRecord {
	pub instrument: String,
	pub date: NaiveDate,

	/// Net open quantity on the ex-date
	pub quantity: i64,
	pub cash_per_share: f64,

	/// quantity x cash_per_share, rounded to whole currency units
	pub amount: i64,
}
