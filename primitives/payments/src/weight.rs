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

//! Two-dimensional resource weight.

use crate::{Error, Result};
use codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Resource weight of a call: computation time and proof size.
///
/// Components are kept as `u128` while fees are computed. All arithmetic is checked, so an
/// overflow is reported instead of silently wrapping or saturating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weight {
	/// Computation time, in picoseconds.
	pub ref_time: u128,
	/// Storage proof size, in bytes.
	pub proof_size: u128,
}

impl Weight {
	/// Zero weight.
	pub const fn zero() -> Self {
		Self { ref_time: 0, proof_size: 0 }
	}

	/// Construct weight from its components.
	pub const fn from_parts(ref_time: u128, proof_size: u128) -> Self {
		Self { ref_time, proof_size }
	}

	/// Multiply both components by `n`.
	pub fn scale(&self, n: u128) -> Result<Self> {
		Ok(Self {
			ref_time: self
				.ref_time
				.checked_mul(n)
				.ok_or(Error::ArithmeticOverflow("weight ref_time"))?,
			proof_size: self
				.proof_size
				.checked_mul(n)
				.ok_or(Error::ArithmeticOverflow("weight proof_size"))?,
		})
	}

	/// Componentwise sum.
	pub fn add(&self, other: &Self) -> Result<Self> {
		Ok(Self {
			ref_time: self
				.ref_time
				.checked_add(other.ref_time)
				.ok_or(Error::ArithmeticOverflow("weight ref_time"))?,
			proof_size: self
				.proof_size
				.checked_add(other.proof_size)
				.ok_or(Error::ArithmeticOverflow("weight proof_size"))?,
		})
	}

	/// Multiply both components by `numerator / denominator`, rounding down.
	///
	/// A zero `denominator` is rejected.
	pub fn scale_ratio(&self, numerator: u128, denominator: u128) -> Result<Self> {
		let scaled = self.scale(numerator)?;
		Ok(Self {
			ref_time: scaled
				.ref_time
				.checked_div(denominator)
				.ok_or(Error::ArithmeticOverflow("weight ratio"))?,
			proof_size: scaled
				.proof_size
				.checked_div(denominator)
				.ok_or(Error::ArithmeticOverflow("weight ratio"))?,
		})
	}

	/// Returns true if every component of `self` is at least the matching component of `other`.
	pub fn all_gte(&self, other: &Self) -> bool {
		self.ref_time >= other.ref_time && self.proof_size >= other.proof_size
	}
}

/// Weight as runtimes encode it: two compact 64-bit components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct WireWeight {
	/// Computation time, in picoseconds.
	#[codec(compact)]
	pub ref_time: u64,
	/// Storage proof size, in bytes.
	#[codec(compact)]
	pub proof_size: u64,
}

impl TryFrom<Weight> for WireWeight {
	type Error = Error;

	fn try_from(weight: Weight) -> Result<Self> {
		Ok(Self {
			ref_time: weight
				.ref_time
				.try_into()
				.map_err(|_| Error::ArithmeticOverflow("wire weight ref_time"))?,
			proof_size: weight
				.proof_size
				.try_into()
				.map_err(|_| Error::ArithmeticOverflow("wire weight proof_size"))?,
		})
	}
}

impl From<WireWeight> for Weight {
	fn from(weight: WireWeight) -> Self {
		Self { ref_time: weight.ref_time.into(), proof_size: weight.proof_size.into() }
	}
}
