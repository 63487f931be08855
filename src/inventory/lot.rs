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
use crate::inventory::trade::{Direction, TradeRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A currently-held slice of a position: the not-yet-consumed remainder of
/// one trade. Created by the matcher when an event cannot be fully matched
/// against existing lots, shrunk when partially consumed, deleted when
/// fully consumed. Quantity stays strictly positive throughout.
///
/// Lots for one instrument order by (acquisition date, id), which is the
/// FIFO queue the matcher consumes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenLot {
	pub id: i64,
	pub instrument: String,
	pub date: NaiveDate,
	pub direction: Direction,
	pub quantity: i64,
	pub unit_price: f64,
	pub total_amount: i64,
	pub fees: i64,
}

impl OpenLot {
	/// A lot holding the full quantity of the given event. The id is
	/// assigned by the store on insert; zero until then.
	pub fn from_event(event: &TradeRecord) -> Self {
		Self {
			id: 0,
			instrument: event.instrument.clone(),
			date: event.date,
			direction: event.direction,
			quantity: event.quantity,
			unit_price: event.unit_price,
			total_amount: event.total_amount(),
			fees: event.fees(),
		}
	}

	/// Corrects the unit price, recomputing the derived amount columns.
	pub fn reprice(&mut self, unit_price: f64) {
		self.unit_price = unit_price;
		self.reduce_to(self.quantity);
	}

	/// Shrinks the lot after a partial match, recomputing the derived
	/// amount columns from the unit price.
	pub fn reduce_to(&mut self, quantity: i64) {
		let as_event = TradeRecord {
			instrument: self.instrument.clone(),
			date: self.date,
			time: chrono::NaiveTime::MIN,
			direction: self.direction,
			quantity,
			unit_price: self.unit_price,
		};
		self.quantity = quantity;
		self.total_amount = as_event.total_amount();
		self.fees = as_event.fees();
	}
}

impl PartialOrd for OpenLot {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Eq for OpenLot {}

impl Ord for OpenLot {
	fn cmp(&self, other: &Self) -> Ordering {
		// (date, id): the id tiebreak keeps same-day lots in arrival order
		(self.date, self.id).cmp(&(other.date, other.id))
	}
}

/// An immutable record of one matched slice: either the consumed portion of
/// an open lot, or the consuming event itself. Append-only; one logical
/// event produces several of these when it spans multiple lots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
	pub id: i64,
	pub instrument: String,
	pub date: NaiveDate,
	pub direction: Direction,
	pub quantity: i64,
	pub unit_price: f64,
	pub total_amount: i64,
	pub fees: i64,
}

impl HistoryRecord {
	/// History entry for an event (or the portion of one that was consumed
	/// against existing inventory), at the event's own terms.
	pub fn from_event(event: &TradeRecord) -> Self {
		Self {
			id: 0,
			instrument: event.instrument.clone(),
			date: event.date,
			direction: event.direction,
			quantity: event.quantity,
			unit_price: event.unit_price,
			total_amount: event.total_amount(),
			fees: event.fees(),
		}
	}

	/// History entry for the consumed slice of an open lot, at the lot's
	/// terms. Amount columns are recomputed for the consumed quantity.
	pub fn from_lot(lot: &OpenLot, quantity: i64) -> Self {
		let mut slice = lot.clone();
		slice.reduce_to(quantity);
		Self {
			id: 0,
			instrument: slice.instrument,
			date: slice.date,
			direction: slice.direction,
			quantity: slice.quantity,
			unit_price: slice.unit_price,
			total_amount: slice.total_amount,
			fees: slice.fees,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveTime;

	fn event(quantity: i64, price: f64) -> TradeRecord {
		TradeRecord::new(
			"2330",
			NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
			NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
			Direction::Buy,
			quantity,
			price,
		)
		.unwrap()
	}

	#[test]
	fn test_lot_from_event_copies_terms() {
		let lot = OpenLot::from_event(&event(1000, 23.5));
		assert_eq!(lot.instrument, "2330");
		assert_eq!(lot.quantity, 1000);
		assert_eq!(lot.total_amount, 23500);
	}

	#[test]
	fn test_reduce_to_recomputes_amounts() {
		let mut lot = OpenLot::from_event(&event(1000, 23.5));
		lot.reduce_to(400);
		assert_eq!(lot.quantity, 400);
		assert_eq!(lot.total_amount, 9400);
	}

	#[test]
	fn test_reprice_recomputes_amounts() {
		let mut lot = OpenLot::from_event(&event(1000, 23.5));
		lot.reprice(30.0);
		assert_eq!(lot.quantity, 1000);
		assert_eq!(lot.unit_price, 30.0);
		assert_eq!(lot.total_amount, 30000);
		// 30000 * 0.001425
		assert_eq!(lot.fees, 43);
	}

	#[test]
	fn test_fifo_order_date_before_id() {
		let mut older = OpenLot::from_event(&event(100, 10.0));
		let mut newer = OpenLot::from_event(&event(100, 10.0));
		older.id = 9;
		newer.id = 2;
		newer.date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
		assert!(older < newer);

		// same date: id decides
		newer.date = older.date;
		assert!(newer < older);
	}

	#[test]
	fn test_history_slice_from_lot() {
		let lot = OpenLot::from_event(&event(1500, 23.5));
		let slice = HistoryRecord::from_lot(&lot, 600);
		assert_eq!(slice.quantity, 600);
		assert_eq!(slice.unit_price, 23.5);
		assert_eq!(slice.total_amount, 14100);
	}
}
