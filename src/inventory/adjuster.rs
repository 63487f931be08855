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
use crate::corporate::math::LedgerMath;
use crate::inventory::trade::TradeRecord;
use crate::store::Store;
use anyhow::Error;
use chrono::NaiveDate;

/// One corporate action awaiting application, in the merged chronological
/// sequence the adjuster walks.
#[derive(Debug)]
enum Action<'a> {
	Dividend(&'a DividendEvent),
	Reduction(&'a CapitalReductionEvent),
}

impl Action<'_> {
	fn instrument(&self) -> &str {
		match self {
			Action::Dividend(d) => &d.instrument,
			Action::Reduction(r) => &r.instrument,
		}
	}

	fn date(&self) -> NaiveDate {
		match self {
			Action::Dividend(d) => d.ex_date,
			Action::Reduction(r) => r.effective_date,
		}
	}
}

/// Merges dividends and capital reductions into one sequence ordered by
/// effective date. The sort is stable, so events sharing a date keep their
/// insertion order (dividends ahead of reductions only insofar as they were
/// listed first).
fn merge_actions<'a>(
	dividends: &'a [DividendEvent],
	reductions: &'a [CapitalReductionEvent],
) -> Vec<Action<'a>> {
	let mut merged: Vec<Action<'a>> = dividends
		.iter()
		.map(Action::Dividend)
		.chain(reductions.iter().map(Action::Reduction))
		.collect();
	merged.sort_by_key(Action::date);
	merged
}

/// The pure half of the recompute: folds every corporate action into the
/// raw record log, producing the adjusted log and the cash-dividend ledger.
/// Takes and returns plain sequences so it can be tested without a store.
fn adjust<M: LedgerMath>(
	math: &M,
	raw: Vec<TradeRecord>,
	dividends: &[DividendEvent],
	reductions: &[CapitalReductionEvent],
) -> Result<(Vec<TradeRecord>, Vec<CashDividendRecord>), Error> {
	let mut working = raw;
	working.sort_by(TradeRecord::chronological);

	let mut cash_dividends = Vec::new();

	for action in merge_actions(dividends, reductions) {
		let prior: Vec<TradeRecord> = working
			.iter()
			.filter(|r| {
				r.instrument == action.instrument()
					&& r.date < action.date()
			})
			.cloned()
			.collect();

		let position =
			math.open_position_as_of(&prior, action.date()).map_err(
				|err| {
					err.context(format!(
						"snapshotting {} as of {}",
						action.instrument(),
						action.date()
					))
				},
			)?;

		match action {
			Action::Reduction(event) => {
				// Nothing held means nothing to reduce; the event is
				// simply inert for this ledger.
				if position.net_quantity <= 0 {
					continue;
				}
				let (reduction, distribution) = math
					.capital_reduction_adjustment(event, &position)?;
				working.push(reduction);
				working.extend(distribution);
			},
			Action::Dividend(event) => {
				let (cash, stock) =
					math.dividend_entitlement(event, &position)?;
				cash_dividends.push(cash);
				working.extend(stock);
			},
		}

		// Synthesized records can interleave with later events, so the
		// working log goes back into chronological order each round.
		working.sort_by(TradeRecord::chronological);
	}

	Ok((working, cash_dividends))
}

/// Recomputes the adjusted record log and the cash-dividend ledger from the
/// raw log and all recorded corporate actions, then swaps both persisted
/// sets in one atomic scope. Replaces whatever was there before; running it
/// twice over unchanged inputs produces identical output.
///
/// Returns (adjusted record count, cash dividend count).
pub fn recompute<S: Store, M: LedgerMath>(
	store: &mut S,
	math: &M,
) -> Result<(usize, usize), Error> {
	let raw = store.list_raw_records()?;
	let dividends = store.list_dividends()?;
	let reductions = store.list_capital_reductions()?;

	let (adjusted, cash_dividends) =
		adjust(math, raw, &dividends, &reductions)
			.map_err(|err| err.context("corporate action recompute failed"))?;

	store.begin()?;
	let written = store
		.replace_cash_dividends(&cash_dividends)
		.and_then(|_| store.replace_adjusted_records(&adjusted));
	match written {
		Ok(()) => {
			store.commit()?;
			Ok((adjusted.len(), cash_dividends.len()))
		},
		Err(err) => {
			store.rollback()?;
			Err(err.context("storing recomputed ledgers failed"))
		},
	}
}
