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

//! Primitives of cross-chain scheduled payments.
//!
//! Everything in this crate is pure: no chain is queried and nothing is submitted. The
//! client crate composes these pieces into the scheduling flows.

#![warn(missing_docs)]

pub use sp_core::{crypto::AccountId32, H256};

pub mod address;
pub mod balance;
pub mod proxy;
pub mod schedule;
pub mod weight;
pub mod xcm;

pub use balance::{convert_with_scientific_notation, parse_chain_integer, planck_to_decimal};
pub use proxy::{derive_proxy_address, sibling_derivative_account, ChainIdentity, ProxyAccountPair};
pub use schedule::{
	PaymentPlan, PaymentToken, PaymentType, Recurrence, ScheduleConfiguration,
	SchedulePaymentIntent,
};
pub use weight::Weight;

/// Balance type of both chains.
pub type Balance = u128;

/// Parachain identifier.
pub type ParaId = u32;

/// Unix timestamp in seconds.
pub type UnixTime = u64;

/// Errors of the payment primitives.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	/// Checked arithmetic on a fee-bearing quantity overflowed.
	#[error("arithmetic overflow while computing {0}")]
	ArithmeticOverflow(&'static str),
	/// The given string is not a valid SS58 or hex encoded 32-byte address.
	#[error("invalid address: {0}")]
	InvalidAddress(String),
	/// The given string is not a valid decimal amount.
	#[error("invalid amount: {0}")]
	InvalidAmount(String),
	/// The given string is not a valid chain integer.
	#[error("invalid integer: {0}")]
	InvalidInteger(String),
	/// The schedule description violates one of its invariants.
	#[error("invalid schedule: {0}")]
	InvalidSchedule(String),
}

/// Result type used by the payment primitives.
pub type Result<T> = std::result::Result<T, Error>;
