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
use crate::inventory::matcher;
use crate::store::Store;
use anyhow::Error;

/// Wipes the open-lot inventory and its history, then replays the full
/// adjusted record log through the matcher in (date, time) order, all
/// inside one atomic scope. Clearing resets the id sequences, so the same
/// adjusted log always reproduces byte-for-byte identical lots and history
/// no matter what state was there before.
///
/// Returns the number of records replayed.
pub fn rebuild<S: Store>(store: &mut S) -> Result<usize, Error> {
	store.begin()?;
	match replay(store) {
		Ok(count) => {
			store.commit()?;
			Ok(count)
		},
		Err(err) => {
			store.rollback()?;
			Err(err.context("inventory rebuild failed"))
		},
	}
}

fn replay<S: Store>(store: &mut S) -> Result<usize, Error> {
	store.clear_open_lots()?;
	store.clear_history()?;

	let records = store.list_adjusted_records()?;
	for record in &records {
		matcher::apply(store, record).map_err(|err| {
			err.context(format!(
				"replaying {} record of {} {}",
				record.instrument, record.date, record.time
			))
		})?;
	}

	Ok(records.len())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::inventory::trade::{Direction, TradeRecord};
	use crate::store::memory::MemoryStore;
	use chrono::{NaiveDate, NaiveTime};

	fn record(
		day: u32,
		hour: u32,
		direction: Direction,
		quantity: i64,
		price: f64,
	) -> TradeRecord {
		TradeRecord::new(
			"0050",
			NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
			NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
			direction,
			quantity,
			price,
		)
		.unwrap()
	}

	fn seeded_store() -> MemoryStore {
		let mut store = MemoryStore::new();
		store
			.replace_adjusted_records(&[
				record(1, 9, Direction::Buy, 500, 20.0),
				record(2, 9, Direction::Buy, 1000, 23.5),
				record(3, 9, Direction::Sell, 600, 25.0),
			])
			.unwrap();
		store
	}

	#[test]
	fn test_replay_builds_expected_inventory() {
		let mut store = seeded_store();
		assert_eq!(rebuild(&mut store).unwrap(), 3);

		let lots = store.list_open_lots().unwrap();
		assert_eq!(lots.len(), 1);
		assert_eq!(lots[0].quantity, 900);
		assert_eq!(lots[0].unit_price, 23.5);
		assert_eq!(store.list_history().unwrap().len(), 3);
	}

	#[test]
	fn test_rebuild_is_idempotent() {
		let mut store = seeded_store();
		rebuild(&mut store).unwrap();
		let lots_first = store.list_open_lots().unwrap();
		let history_first = store.list_history().unwrap();

		rebuild(&mut store).unwrap();
		assert_eq!(store.list_open_lots().unwrap(), lots_first);
		assert_eq!(store.list_history().unwrap(), history_first);
	}

	#[test]
	fn test_rebuild_discards_prior_state() {
		let mut store = seeded_store();

		// junk inventory that no replay of the log would produce
		matcher::add(
			&mut store,
			&record(20, 9, Direction::Buy, 9999, 1.0),
		)
		.unwrap();

		rebuild(&mut store).unwrap();

		let mut pristine = seeded_store();
		rebuild(&mut pristine).unwrap();
		assert_eq!(
			store.list_open_lots().unwrap(),
			pristine.list_open_lots().unwrap()
		);
		assert_eq!(
			store.list_history().unwrap(),
			pristine.list_history().unwrap()
		);
	}

	#[test]
	fn test_replay_respects_intra_day_time_order() {
		let mut store = MemoryStore::new();
		// inserted out of order; the sell at 10:00 must land between
		// the two buys
		store
			.replace_adjusted_records(&[
				record(1, 13, Direction::Buy, 300, 30.0),
				record(1, 9, Direction::Buy, 300, 10.0),
				record(1, 10, Direction::Sell, 300, 12.0),
			])
			.unwrap();

		rebuild(&mut store).unwrap();

		let lots = store.list_open_lots().unwrap();
		assert_eq!(lots.len(), 1);
		assert_eq!(lots[0].unit_price, 30.0);
	}

	#[test]
	fn test_empty_log_rebuilds_to_empty() {
		let mut store = MemoryStore::new();
		matcher::add(
			&mut store,
			&record(1, 9, Direction::Buy, 100, 10.0),
		)
		.unwrap();

		assert_eq!(rebuild(&mut store).unwrap(), 0);
		assert!(store.list_open_lots().unwrap().is_empty());
		assert!(store.list_history().unwrap().is_empty());
	}
}
