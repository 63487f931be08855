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

/// Standard table printer for the inventory reports, which emit a
/// potentially large number of single-line records.
pub struct Table {
	column_count: usize,
	rows: Vec<Row>,
	right_align: Vec<bool>, // indicates columns by index
}

enum Row {
	Header(Vec<String>),
	Data(Vec<String>),
	Separator,
}

impl Table {
	pub fn new(column_count: usize) -> Self {
		Self {
			column_count,
			rows: Vec::new(),
			right_align: vec![false; column_count],
		}
	}

	/// Adds a header row followed by a separator.
	pub fn add_header(&mut self, row: Vec<&str>) {
		self.rows.push(Row::Header(
			row.into_iter().map(|s| s.to_string()).collect(),
		));
		self.rows.push(Row::Separator);
	}

	/// Adds a data row.
	pub fn add_row(&mut self, row: Vec<String>) {
		self.rows.push(Row::Data(row));
	}

	/// Specifies columns that should be right-aligned by index.
	pub fn right_align(&mut self, cols: Vec<usize>) {
		for col in cols {
			self.right_align[col] = true;
		}
	}

	pub fn print(&self) {
		println!();
		let mut max_widths = vec![0; self.column_count];

		// Calculate maximum column widths for proper spacing
		for row in &self.rows {
			if let Row::Data(cells) | Row::Header(cells) = row {
				for (i, value) in cells.iter().enumerate() {
					max_widths[i] = max_widths[i].max(value.len());
				}
			}
		}

		for row in &self.rows {
			match row {
				Row::Header(cells) | Row::Data(cells) => {
					self.print_row(&max_widths, cells)
				},
				Row::Separator => Table::print_separator(&max_widths),
			}
		}
	}

	fn print_row(&self, max_widths: &[usize], cells: &[String]) {
		for (i, value) in cells.iter().enumerate() {
			if self.right_align[i] {
				print!("{:>width$}", value, width = max_widths[i]);
			} else {
				print!("{:<width$}", value, width = max_widths[i]);
			}
			if i < cells.len() - 1 {
				print!("   ");
			}
		}
		println!();
	}

	fn print_separator(max_widths: &[usize]) {
		let total_width: usize =
			max_widths.iter().sum::<usize>() + 3 * (max_widths.len() - 1);
		println!("{:-<total_width$}", "", total_width = total_width);
	}
}
