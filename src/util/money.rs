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

/// Rounds to the nearest whole currency unit, half away from zero. All
/// monetary columns in the ledger (total amounts, fees, dividend payouts)
/// are kept in whole units, so every computed amount passes through here
/// exactly once.
pub fn round_amount(value: f64) -> i64 {
	value.round() as i64
}

/// Rounds a fractional share count to whole shares, half away from zero.
/// Corporate actions deal in whole shares; sub-share remainders are settled
/// in cash by the issuer and never enter the inventory.
pub fn round_shares(value: f64) -> i64 {
	value.round() as i64
}
