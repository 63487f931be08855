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
use crate::corporate::events::{CapitalReductionEvent, DividendEvent};
use crate::corporate::math::StandardMath;
use crate::inventory::trade::{Direction, TradeRecord};
use crate::inventory::{adjuster, matcher, rebuild};
use crate::store::journal::JournalStore;
use crate::store::Store;
use anyhow::{anyhow, bail, Error};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use regex::Regex;
use std::path::PathBuf;

mod config;
mod corporate;
mod inventory;
mod reports;
mod store;
mod util;

#[derive(Parser)]
#[command(
	name = "lotkeeper",
	version,
	about = "FIFO lot tracker for securities trades"
)]
struct Cli {
	#[command(subcommand)]
	command: Command,

	/// Specifies the ledger file (default: config, then
	/// ~/.config/lotkeeper/ledger.json)
	#[arg(short, long, global = true)]
	file: Option<String>,

	/// Custom config file location (default:
	/// ~/.config/lotkeeper/config.toml)
	#[arg(long, global = true)]
	config: Option<String>,
}

#[derive(Subcommand)]
enum Command {
	/// Records a trade and matches it against the open lots
	Add {
		/// Instrument code, e.g. 0050
		instrument: String,

		/// Transaction type: 1 buy, -1 sell
		#[arg(allow_hyphen_values = true)]
		r#type: i8,

		/// Number of shares, always positive
		quantity: i64,

		/// Price per share
		unit_price: f64,

		/// Trade date (YYYY-MM-DD, default today)
		date: Option<String>,
	},

	/// Shows the open lots
	Query {
		/// Show every lot; this is also the default with no filter
		#[arg(long)]
		all: bool,

		/// Only lots for this instrument
		#[arg(short, long)]
		instrument: Option<String>,

		/// Only lots of this type: 1 buy, -1 sell
		#[arg(short, long, allow_hyphen_values = true)]
		r#type: Option<i8>,

		/// Only lots opened on this date (YYYY-MM-DD)
		#[arg(short, long)]
		date: Option<String>,

		/// Only the lot with this inventory id
		#[arg(long)]
		id: Option<i64>,
	},

	/// Corrects the unit price of an open lot
	Update {
		/// Inventory id, as shown by query
		id: i64,

		/// New price per share
		unit_price: f64,
	},

	/// Shows the matched (consumed) portions of past trades
	History {
		/// Only records for this instrument
		#[arg(short, long)]
		instrument: Option<String>,
	},

	/// Records a dividend announcement
	Dividend {
		/// Instrument code
		instrument: String,

		/// Ex-dividend date (YYYY-MM-DD)
		ex_date: String,

		/// Cash distributed per held share
		cash_per_share: f64,

		/// New shares granted per held share
		#[arg(long, default_value_t = 0.0)]
		stock: f64,
	},

	/// Records a capital reduction announcement
	Reduction {
		/// Instrument code
		instrument: String,

		/// Effective date (YYYY-MM-DD)
		date: String,

		/// Fraction of held shares cancelled, in (0, 1]
		ratio: f64,

		/// Cash refunded per held share
		refund_per_share: f64,
	},

	/// Shows the computed cash dividend ledger
	Cash,

	/// Recomputes the adjusted log and replays it from scratch
	Rebuild,

	/// Prints the version
	Version,
}

impl Cli {
	/// Extra validations on top of what clap does
	fn validate(&self) -> Result<(), Error> {
		if let Command::Query {
			all: true,
			instrument,
			r#type,
			date,
			id,
		} = &self.command
		{
			if instrument.is_some()
				|| r#type.is_some()
				|| date.is_some()
				|| id.is_some()
			{
				bail!("--all cannot be combined with query filters");
			}
		}

		let code = Regex::new(r"^[0-9A-Za-z]{2,12}$")?;

		let instrument = match &self.command {
			Command::Add { instrument, .. } => Some(instrument),
			Command::Dividend { instrument, .. } => Some(instrument),
			Command::Reduction { instrument, .. } => Some(instrument),
			Command::Query { instrument, .. } => instrument.as_ref(),
			Command::History { instrument, .. } => instrument.as_ref(),
			_ => None,
		};

		if let Some(instrument) = instrument {
			if !code.is_match(instrument) {
				bail!("Invalid instrument code: {}", instrument);
			}
		}

		Ok(())
	}
}

fn main() -> Result<(), Error> {
	let args = Cli::parse();
	args.validate()?;

	if let Command::Version = args.command {
		println!("lotkeeper {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	let mut store = JournalStore::open(&ledger_path(&args)?)?;

	match args.command {
		Command::Add {
			instrument,
			r#type,
			quantity,
			unit_price,
			date,
		} => {
			let direction = Direction::from_code(r#type)?;
			let date = match date {
				Some(d) => parse_date(&d)?,
				None => Local::now().date_naive(),
			};
			let event = TradeRecord::new(
				&instrument,
				date,
				Local::now().time(),
				direction,
				quantity,
				unit_price,
			)?;

			match matcher::add(&mut store, &event)? {
				Some(lot) => reports::inventory_reporter::open_lots(vec![lot]),
				None => println!("Matched in full; no lot remains open"),
			}
		},
		Command::Query {
			instrument,
			r#type,
			date,
			id,
			..
		} => {
			let direction = r#type.map(Direction::from_code).transpose()?;
			let date = date.map(|d| parse_date(&d)).transpose()?;

			let lots = store
				.list_open_lots()?
				.into_iter()
				.filter(|lot| match &instrument {
					Some(i) => &lot.instrument == i,
					None => true,
				})
				.filter(|lot| direction.map_or(true, |d| lot.direction == d))
				.filter(|lot| date.map_or(true, |d| lot.date == d))
				.filter(|lot| id.map_or(true, |i| lot.id == i))
				.collect();

			reports::inventory_reporter::open_lots(lots);
		},
		Command::Update { id, unit_price } => {
			if unit_price <= 0.0 {
				bail!("Unit price must be positive, got {}", unit_price);
			}

			let mut lot = store
				.list_open_lots()?
				.into_iter()
				.find(|l| l.id == id)
				.ok_or_else(|| anyhow!("No open lot with id {}", id))?;
			lot.reprice(unit_price);
			store.update_open_lot(id, &lot)?;

			reports::inventory_reporter::open_lots(vec![lot]);
		},
		Command::History { instrument } => {
			let records = store
				.list_history()?
				.into_iter()
				.filter(|rec| match &instrument {
					Some(i) => &rec.instrument == i,
					None => true,
				})
				.collect();

			reports::inventory_reporter::history(records);
		},
		Command::Dividend {
			instrument,
			ex_date,
			cash_per_share,
			stock,
		} => {
			let event = DividendEvent::new(
				&instrument,
				parse_date(&ex_date)?,
				cash_per_share,
				stock,
			)?;
			store.record_dividend(&event)?;
			println!(
				"Recorded dividend for {} on {}; run rebuild to apply",
				event.instrument, event.ex_date
			);
		},
		Command::Reduction {
			instrument,
			date,
			ratio,
			refund_per_share,
		} => {
			let event = CapitalReductionEvent::new(
				&instrument,
				parse_date(&date)?,
				ratio,
				refund_per_share,
			)?;
			store.record_capital_reduction(&event)?;
			println!(
				"Recorded capital reduction for {} on {}; run rebuild to apply",
				event.instrument, event.effective_date
			);
		},
		Command::Cash => {
			reports::inventory_reporter::cash_dividends(
				store.list_cash_dividends()?,
			);
		},
		Command::Rebuild => {
			let (adjusted, dividends) =
				adjuster::recompute(&mut store, &StandardMath)?;
			let replayed = rebuild::rebuild(&mut store)?;
			println!(
				"Adjusted {} records ({} cash dividends); replayed {}",
				adjusted, dividends, replayed
			);
		},
		Command::Version => unreachable!(),
	}

	Ok(())
}

/// The -f flag wins, then the config file, then the default location.
fn ledger_path(args: &Cli) -> Result<PathBuf, Error> {
	if let Some(file) = &args.file {
		return Ok(PathBuf::from(file));
	}

	let config = config::config_file::get_config(args.config.as_ref())?;
	Ok(match config.ledger {
		Some(path) => PathBuf::from(path),
		None => config::config_file::default_ledger_path(),
	})
}

fn parse_date(value: &str) -> Result<NaiveDate, Error> {
	NaiveDate::parse_from_str(value, "%Y-%m-%d")
		.map_err(|_| anyhow!("Invalid date (want YYYY-MM-DD): {}", value))
}
