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
use crate::store::memory::{MemoryStore, Tables};
use crate::store::Store;
use anyhow::{anyhow, Error};
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed store: the whole ledger lives in one JSON document, loaded
/// at open and rewritten whenever a mutation becomes durable. Inside a
/// scope nothing touches the file until `commit`, so a crash or rollback
/// mid-operation leaves the file exactly as it was. Mutations outside any
/// scope are written through immediately.
pub struct JournalStore {
	path: PathBuf,
	mem: MemoryStore,
}

impl JournalStore {
	pub fn open(path: &Path) -> Result<Self, Error> {
		let tables = if path.exists() {
			let content = fs::read_to_string(path)?;
			serde_json::from_str::<Tables>(&content).map_err(|e| {
				anyhow!("Ledger file {} is corrupt: {}", path.display(), e)
			})?
		} else {
			Tables::default()
		};

		Ok(Self {
			path: path.to_path_buf(),
			mem: MemoryStore::from_tables(tables),
		})
	}

	fn persist(&self) -> Result<(), Error> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		let content = serde_json::to_string_pretty(self.mem.tables())?;
		fs::write(&self.path, content)?;
		Ok(())
	}

	/// Writes through unless a scope is open, in which case durability
	/// waits for the commit.
	fn persist_unscoped(&self) -> Result<(), Error> {
		if self.mem.in_scope() {
			return Ok(());
		}
		self.persist()
	}
}

impl Store for JournalStore {
	fn begin(&mut self) -> Result<(), Error> {
		self.mem.begin()
	}

	fn commit(&mut self) -> Result<(), Error> {
		self.mem.commit()?;
		self.persist()
	}

	fn rollback(&mut self) -> Result<(), Error> {
		self.mem.rollback()
	}

	fn find_earliest_open_lot(
		&self,
		instrument: &str,
	) -> Result<Option<OpenLot>, Error> {
		self.mem.find_earliest_open_lot(instrument)
	}

	fn list_open_lots(&self) -> Result<Vec<OpenLot>, Error> {
		self.mem.list_open_lots()
	}

	fn create_open_lot(&mut self, lot: &OpenLot) -> Result<i64, Error> {
		let id = self.mem.create_open_lot(lot)?;
		self.persist_unscoped()?;
		Ok(id)
	}

	fn update_open_lot(
		&mut self,
		id: i64,
		lot: &OpenLot,
	) -> Result<(), Error> {
		self.mem.update_open_lot(id, lot)?;
		self.persist_unscoped()
	}

	fn delete_open_lot(&mut self, id: i64) -> Result<(), Error> {
		self.mem.delete_open_lot(id)?;
		self.persist_unscoped()
	}

	fn clear_open_lots(&mut self) -> Result<(), Error> {
		self.mem.clear_open_lots()?;
		self.persist_unscoped()
	}

	fn append_history(
		&mut self,
		record: &HistoryRecord,
	) -> Result<i64, Error> {
		let id = self.mem.append_history(record)?;
		self.persist_unscoped()?;
		Ok(id)
	}

	fn list_history(&self) -> Result<Vec<HistoryRecord>, Error> {
		self.mem.list_history()
	}

	fn clear_history(&mut self) -> Result<(), Error> {
		self.mem.clear_history()?;
		self.persist_unscoped()
	}

	fn append_raw_record(
		&mut self,
		record: &TradeRecord,
	) -> Result<(), Error> {
		self.mem.append_raw_record(record)?;
		self.persist_unscoped()
	}

	fn list_raw_records(&self) -> Result<Vec<TradeRecord>, Error> {
		self.mem.list_raw_records()
	}

	fn list_adjusted_records(&self) -> Result<Vec<TradeRecord>, Error> {
		self.mem.list_adjusted_records()
	}

	fn replace_adjusted_records(
		&mut self,
		records: &[TradeRecord],
	) -> Result<(), Error> {
		self.mem.replace_adjusted_records(records)?;
		self.persist_unscoped()
	}

	fn list_cash_dividends(
		&self,
	) -> Result<Vec<CashDividendRecord>, Error> {
		self.mem.list_cash_dividends()
	}

	fn replace_cash_dividends(
		&mut self,
		records: &[CashDividendRecord],
	) -> Result<(), Error> {
		self.mem.replace_cash_dividends(records)?;
		self.persist_unscoped()
	}

	fn record_dividend(
		&mut self,
		event: &DividendEvent,
	) -> Result<(), Error> {
		self.mem.record_dividend(event)?;
		self.persist_unscoped()
	}

	fn list_dividends(&self) -> Result<Vec<DividendEvent>, Error> {
		self.mem.list_dividends()
	}

	fn record_capital_reduction(
		&mut self,
		event: &CapitalReductionEvent,
	) -> Result<(), Error> {
		self.mem.record_capital_reduction(event)?;
		self.persist_unscoped()
	}

	fn list_capital_reductions(
		&self,
	) -> Result<Vec<CapitalReductionEvent>, Error> {
		self.mem.list_capital_reductions()
	}
}
