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
use crate::inventory::lot::{HistoryRecord, OpenLot};
use crate::inventory::trade::TradeRecord;
use anyhow::Error;

pub mod journal;
pub mod memory;

/// The persistence capability the core consumes. Everything the matcher,
/// rebuild coordinator, and adjuster touch goes through this, so tests can
/// substitute in-memory or failure-injecting stores without a database.
///
/// Scopes: `begin` opens one atomic scope; every mutation until `commit`
/// either lands in full or is undone in full by `rollback`. The core is
/// single-writer, so a scope is state on the store rather than a handle
/// value, and opening a second scope before closing the first is an error.
///
/// "No open lot" is not a failure; `find_earliest_open_lot` returns
/// `Ok(None)` and leaves the interpretation to the caller.
pub trait Store {
	fn begin(&mut self) -> Result<(), Error>;
	fn commit(&mut self) -> Result<(), Error>;
	fn rollback(&mut self) -> Result<(), Error>;

	/// Oldest open lot for an instrument by (date, id), i.e. the head of
	/// its FIFO queue.
	fn find_earliest_open_lot(
		&self,
		instrument: &str,
	) -> Result<Option<OpenLot>, Error>;
	fn list_open_lots(&self) -> Result<Vec<OpenLot>, Error>;
	fn create_open_lot(&mut self, lot: &OpenLot) -> Result<i64, Error>;
	fn update_open_lot(&mut self, id: i64, lot: &OpenLot)
		-> Result<(), Error>;
	fn delete_open_lot(&mut self, id: i64) -> Result<(), Error>;
	/// Deletes every open lot and resets the id sequence, so a rebuild
	/// assigns the same ids for the same input.
	fn clear_open_lots(&mut self) -> Result<(), Error>;

	fn append_history(&mut self, record: &HistoryRecord)
		-> Result<i64, Error>;
	fn list_history(&self) -> Result<Vec<HistoryRecord>, Error>;
	fn clear_history(&mut self) -> Result<(), Error>;

	fn append_raw_record(&mut self, record: &TradeRecord)
		-> Result<(), Error>;
	/// The immutable source log, ordered by (date, time).
	fn list_raw_records(&self) -> Result<Vec<TradeRecord>, Error>;

	/// The corporate-action-adjusted log, ordered by (date, time).
	fn list_adjusted_records(&self) -> Result<Vec<TradeRecord>, Error>;
	fn replace_adjusted_records(
		&mut self,
		records: &[TradeRecord],
	) -> Result<(), Error>;

	fn list_cash_dividends(&self) -> Result<Vec<CashDividendRecord>, Error>;
	fn replace_cash_dividends(
		&mut self,
		records: &[CashDividendRecord],
	) -> Result<(), Error>;

	fn record_dividend(&mut self, event: &DividendEvent)
		-> Result<(), Error>;
	fn list_dividends(&self) -> Result<Vec<DividendEvent>, Error>;
	fn record_capital_reduction(
		&mut self,
		event: &CapitalReductionEvent,
	) -> Result<(), Error>;
	fn list_capital_reductions(
		&self,
	) -> Result<Vec<CapitalReductionEvent>, Error>;
}
