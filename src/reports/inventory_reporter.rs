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
use crate::corporate::events::CashDividendRecord;
use crate::inventory::lot::{HistoryRecord, OpenLot};
use crate::reports::table::Table;

/// Reports the current holdings: every open lot still carrying quantity,
/// oldest first, the order the matcher would consume them in.
pub fn open_lots(mut lots: Vec<OpenLot>) {
	if lots.is_empty() {
		println!("No data");
		return;
	}
	lots.sort();

	let mut table = Table::new(8);
	table.right_align(vec![0, 4, 5, 6, 7]);
	table.add_header(vec![
		"ID",
		"Instrument",
		"Date",
		"Type",
		"Quantity",
		"Unit Price",
		"Total",
		"Fees",
	]);

	for lot in &lots {
		table.add_row(vec![
			lot.id.to_string(),
			lot.instrument.clone(),
			lot.date.to_string(),
			lot.direction.to_string(),
			lot.quantity.to_string(),
			format!("{:.2}", lot.unit_price),
			lot.total_amount.to_string(),
			lot.fees.to_string(),
		]);
	}

	table.print();
}

/// Reports consumed quantity, i.e. the portions of past events that have
/// already been matched against one another.
pub fn history(records: Vec<HistoryRecord>) {
	if records.is_empty() {
		println!("No data");
		return;
	}

	let mut table = Table::new(8);
	table.right_align(vec![0, 4, 5, 6, 7]);
	table.add_header(vec![
		"ID",
		"Instrument",
		"Date",
		"Type",
		"Quantity",
		"Unit Price",
		"Total",
		"Fees",
	]);

	for rec in &records {
		table.add_row(vec![
			rec.id.to_string(),
			rec.instrument.clone(),
			rec.date.to_string(),
			rec.direction.to_string(),
			rec.quantity.to_string(),
			format!("{:.2}", rec.unit_price),
			rec.total_amount.to_string(),
			rec.fees.to_string(),
		]);
	}

	table.print();
}

/// Reports the cash dividend ledger produced by the last recompute.
pub fn cash_dividends(records: Vec<CashDividendRecord>) {
	if records.is_empty() {
		println!("No data");
		return;
	}

	let mut table = Table::new(5);
	table.right_align(vec![2, 3, 4]);
	table.add_header(vec![
		"Instrument",
		"Date",
		"Quantity",
		"Per Share",
		"Amount",
	]);

	for rec in &records {
		table.add_row(vec![
			rec.instrument.clone(),
			rec.date.to_string(),
			rec.quantity.to_string(),
			format!("{:.4}", rec.cash_per_share),
			rec.amount.to_string(),
		]);
	}

	table.print();
}
