// Copyright (C) Parity Technologies (UK) Ltd.
// This file is part of Parity Bridges Common.

// Parity Bridges Common is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Parity Bridges Common is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Parity Bridges Common.  If not, see <http://www.gnu.org/licenses/>.

//! Conversions between human-entered amounts and base-unit integers.

use crate::{Balance, Error, Result};

/// Characters that chain tooling inserts as digit group separators when it renders big integers.
const DIGIT_SEPARATORS: [char; 3] = [',', '_', ' '];

/// Returns `floor(base * 10^power)` where `base` is a decimal number written as text.
///
/// The computation is exact: `base` is never turned into a floating point number and digits
/// beyond `power` fractional places are dropped, so the result never exceeds what was written.
pub fn convert_with_scientific_notation(base: &str, power: u32) -> Result<Balance> {
	let invalid = || Error::InvalidAmount(base.to_string());

	let trimmed = base.trim();
	let (integer_part, fractional_part) = match trimmed.split_once('.') {
		Some((integer, fraction)) => (integer, fraction),
		None => (trimmed, ""),
	};
	if integer_part.is_empty() && fractional_part.is_empty() {
		return Err(invalid())
	}
	if !integer_part.chars().chain(fractional_part.chars()).all(|c| c.is_ascii_digit()) {
		return Err(invalid())
	}

	let multiplier = 10u128
		.checked_pow(power)
		.ok_or(Error::ArithmeticOverflow("decimal scaling factor"))?;
	let integer: Balance = if integer_part.is_empty() {
		0
	} else {
		integer_part.parse().map_err(|_| Error::ArithmeticOverflow("integer part of amount"))?
	};
	let scaled_integer = integer
		.checked_mul(multiplier)
		.ok_or(Error::ArithmeticOverflow("scaled integer part of amount"))?;

	// keep at most `power` fractional digits and right-pad the rest with zeros
	let kept: String = fractional_part
		.chars()
		.chain(std::iter::repeat('0'))
		.take(power as usize)
		.collect();
	let scaled_fraction: Balance = if kept.is_empty() {
		0
	} else {
		kept.parse().map_err(|_| Error::ArithmeticOverflow("fractional part of amount"))?
	};

	scaled_integer
		.checked_add(scaled_fraction)
		.ok_or(Error::ArithmeticOverflow("scaled amount"))
}

/// Parse an unsigned integer the way chains and contracts render it back.
///
/// Rendered amounts and timestamps may contain digit group separators (`1,000,000`). This is
/// the only place where such strings are turned into numbers.
pub fn parse_chain_integer(value: &str) -> Result<u128> {
	let digits: String = value.trim().chars().filter(|c| !DIGIT_SEPARATORS.contains(c)).collect();
	if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
		return Err(Error::InvalidInteger(value.to_string()))
	}
	digits.parse().map_err(|_| Error::InvalidInteger(value.to_string()))
}

/// Render a base-unit amount as a decimal number with `decimals` fractional digits.
///
/// Trailing fractional zeros are dropped: `planck_to_decimal(10_500, 3) == "10.5"`.
pub fn planck_to_decimal(amount: Balance, decimals: u32) -> String {
	let digits = amount.to_string();
	let decimals = decimals as usize;
	let (integer, fraction) = if digits.len() > decimals {
		let split = digits.len() - decimals;
		(digits[..split].to_string(), digits[split..].to_string())
	} else {
		("0".to_string(), format!("{digits:0>decimals$}"))
	};

	let fraction = fraction.trim_end_matches('0');
	if fraction.is_empty() {
		integer
	} else {
		format!("{integer}.{fraction}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_matches::assert_matches;

	#[test]
	fn converts_whole_amounts() {
		assert_eq!(convert_with_scientific_notation("10", 18).unwrap(), 10_000_000_000_000_000_000);
		assert_eq!(convert_with_scientific_notation("1", 15).unwrap(), 1_000_000_000_000_000);
		assert_eq!(convert_with_scientific_notation("7", 0).unwrap(), 7);
	}

	#[test]
	fn converts_fractions_exactly() {
		assert_eq!(convert_with_scientific_notation("0.1", 18).unwrap(), 100_000_000_000_000_000);
		assert_eq!(convert_with_scientific_notation("1.25", 2).unwrap(), 125);
		assert_eq!(convert_with_scientific_notation(".5", 1).unwrap(), 5);
		assert_eq!(convert_with_scientific_notation("3.", 1).unwrap(), 30);
	}

	#[test]
	fn extra_fractional_digits_are_floored() {
		assert_eq!(convert_with_scientific_notation("1.999", 2).unwrap(), 199);
		assert_eq!(convert_with_scientific_notation("0.0000001", 6).unwrap(), 0);
	}

	#[test]
	fn malformed_amounts_are_rejected() {
		for amount in ["", ".", "-1", "1e5", "1.2.3", "abc", "1,5"] {
			assert_matches!(
				convert_with_scientific_notation(amount, 10),
				Err(Error::InvalidAmount(_)),
				"{amount}"
			);
		}
	}

	#[test]
	fn overflowing_amounts_are_rejected() {
		assert_matches!(
			convert_with_scientific_notation("1000000000000000000000", 18),
			Err(Error::ArithmeticOverflow(_))
		);
		assert_matches!(convert_with_scientific_notation("1", 40), Err(Error::ArithmeticOverflow(_)));
	}

	#[test]
	fn chain_integers_may_contain_separators() {
		assert_eq!(parse_chain_integer("1,700,000,000").unwrap(), 1_700_000_000);
		assert_eq!(parse_chain_integer(" 42 ").unwrap(), 42);
		assert_eq!(parse_chain_integer("10_000").unwrap(), 10_000);
		assert_matches!(parse_chain_integer(""), Err(Error::InvalidInteger(_)));
		assert_matches!(parse_chain_integer(",,"), Err(Error::InvalidInteger(_)));
		assert_matches!(parse_chain_integer("-5"), Err(Error::InvalidInteger(_)));
		assert_matches!(parse_chain_integer("0x10"), Err(Error::InvalidInteger(_)));
	}

	#[test]
	fn planck_amounts_render_as_decimals() {
		assert_eq!(planck_to_decimal(10_500, 3), "10.5");
		assert_eq!(planck_to_decimal(10_000_000_000_000_000_000, 18), "10");
		assert_eq!(planck_to_decimal(5, 3), "0.005");
		assert_eq!(planck_to_decimal(0, 10), "0");
	}
}
