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
use crate::store::Store;
use anyhow::{bail, Error};
use serde::{Deserialize, Serialize};

/// Every table the ledger persists, in one value. Doubles as the wire
/// format of the journal file, which is why it is serde-able.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
	pub open_lots: Vec<OpenLot>,
	pub history: Vec<HistoryRecord>,
	pub raw_records: Vec<TradeRecord>,
	pub adjusted_records: Vec<TradeRecord>,
	pub cash_dividends: Vec<CashDividendRecord>,
	pub dividends: Vec<DividendEvent>,
	pub capital_reductions: Vec<CapitalReductionEvent>,

	pub next_lot_id: i64,
	pub next_history_id: i64,
}

/// In-memory store. Atomic scopes are snapshots: `begin` clones the tables,
/// `rollback` restores the clone, `commit` discards it. The tables are
/// small (a personal securities ledger), so cloning beats a write-ahead
/// scheme on simplicity by a wide margin.
#[derive(Debug, Default)]
pub struct MemoryStore {
	tables: Tables,
	snapshot: Option<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_tables(tables: Tables) -> Self {
		Self {
			tables,
			snapshot: None,
		}
	}

	pub fn tables(&self) -> &Tables {
		&self.tables
	}

	pub fn in_scope(&self) -> bool {
		self.snapshot.is_some()
	}
}

impl Store for MemoryStore {
	fn begin(&mut self) -> Result<(), Error> {
		if self.snapshot.is_some() {
			bail!("A scope is already open; scopes do not nest");
		}
		self.snapshot = Some(self.tables.clone());
		Ok(())
	}

	fn commit(&mut self) -> Result<(), Error> {
		if self.snapshot.take().is_none() {
			bail!("No open scope to commit");
		}
		Ok(())
	}

	fn rollback(&mut self) -> Result<(), Error> {
		match self.snapshot.take() {
			Some(snapshot) => {
				self.tables = snapshot;
				Ok(())
			},
			None => bail!("No open scope to roll back"),
		}
	}

	fn find_earliest_open_lot(
		&self,
		instrument: &str,
	) -> Result<Option<OpenLot>, Error> {
		Ok(self
			.tables
			.open_lots
			.iter()
			.filter(|lot| lot.instrument == instrument)
			.min_by(|a, b| a.cmp(b))
			.cloned())
	}

	fn list_open_lots(&self) -> Result<Vec<OpenLot>, Error> {
		let mut lots = self.tables.open_lots.clone();
		lots.sort();
		Ok(lots)
	}

	fn create_open_lot(&mut self, lot: &OpenLot) -> Result<i64, Error> {
		self.tables.next_lot_id += 1;
		let id = self.tables.next_lot_id;
		let mut lot = lot.clone();
		lot.id = id;
		self.tables.open_lots.push(lot);
		Ok(id)
	}

	fn update_open_lot(
		&mut self,
		id: i64,
		lot: &OpenLot,
	) -> Result<(), Error> {
		match self.tables.open_lots.iter_mut().find(|l| l.id == id) {
			Some(existing) => {
				*existing = lot.clone();
				existing.id = id;
				Ok(())
			},
			None => bail!("No open lot with id {} to update", id),
		}
	}

	fn delete_open_lot(&mut self, id: i64) -> Result<(), Error> {
		let before = self.tables.open_lots.len();
		self.tables.open_lots.retain(|l| l.id != id);
		if self.tables.open_lots.len() == before {
			bail!("No open lot with id {} to delete", id);
		}
		Ok(())
	}

	fn clear_open_lots(&mut self) -> Result<(), Error> {
		self.tables.open_lots.clear();
		self.tables.next_lot_id = 0;
		Ok(())
	}

	fn append_history(
		&mut self,
		record: &HistoryRecord,
	) -> Result<i64, Error> {
		self.tables.next_history_id += 1;
		let id = self.tables.next_history_id;
		let mut record = record.clone();
		record.id = id;
		self.tables.history.push(record);
		Ok(id)
	}

	fn list_history(&self) -> Result<Vec<HistoryRecord>, Error> {
		Ok(self.tables.history.clone())
	}

	fn clear_history(&mut self) -> Result<(), Error> {
		self.tables.history.clear();
		self.tables.next_history_id = 0;
		Ok(())
	}

	fn append_raw_record(
		&mut self,
		record: &TradeRecord,
	) -> Result<(), Error> {
		self.tables.raw_records.push(record.clone());
		Ok(())
	}

	fn list_raw_records(&self) -> Result<Vec<TradeRecord>, Error> {
		let mut records = self.tables.raw_records.clone();
		records.sort_by(TradeRecord::chronological);
		Ok(records)
	}

	fn list_adjusted_records(&self) -> Result<Vec<TradeRecord>, Error> {
		let mut records = self.tables.adjusted_records.clone();
		records.sort_by(TradeRecord::chronological);
		Ok(records)
	}

	fn replace_adjusted_records(
		&mut self,
		records: &[TradeRecord],
	) -> Result<(), Error> {
		self.tables.adjusted_records = records.to_vec();
		Ok(())
	}

	fn list_cash_dividends(
		&self,
	) -> Result<Vec<CashDividendRecord>, Error> {
		Ok(self.tables.cash_dividends.clone())
	}

	fn replace_cash_dividends(
		&mut self,
		records: &[CashDividendRecord],
	) -> Result<(), Error> {
		self.tables.cash_dividends = records.to_vec();
		Ok(())
	}

	fn record_dividend(
		&mut self,
		event: &DividendEvent,
	) -> Result<(), Error> {
		self.tables.dividends.push(event.clone());
		Ok(())
	}

	fn list_dividends(&self) -> Result<Vec<DividendEvent>, Error> {
		Ok(self.tables.dividends.clone())
	}

	fn record_capital_reduction(
		&mut self,
		event: &CapitalReductionEvent,
	) -> Result<(), Error> {
		self.tables.capital_reductions.push(event.clone());
		Ok(())
	}

	fn list_capital_reductions(
		&self,
	) -> Result<Vec<CapitalReductionEvent>, Error> {
		Ok(self.tables.capital_reductions.clone())
	}
}
