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

//! Payments client error type.

use crate::chain::{AssetId, ChainSide};
use std::time::Duration;
use thiserror::Error;
use xcm_payments_primitives::xcm::MultiLocation;

/// Result type used by the payments client.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scheduling payments.
#[derive(Error, Debug)]
pub enum Error {
	/// The chain has no active connection.
	#[error("connection to the {0} chain is not available")]
	ConnectionUnavailable(ChainSide),
	/// The chain refused the transaction, or it failed while being executed.
	#[error("transaction rejected by the {chain} chain: {reason}")]
	ExtrinsicRejected {
		/// Chain that rejected the transaction.
		chain: ChainSide,
		/// Status or dispatch error reported by the chain.
		reason: String,
	},
	/// The remote confirmation did not arrive in time. The submitted transaction may still have
	/// been executed.
	#[error("no confirmation from the {chain} chain within {waited:?}")]
	ConfirmationTimeout {
		/// Chain the confirmation was expected from.
		chain: ChainSide,
		/// How long we have waited.
		waited: Duration,
	},
	/// Derivation, validation or arithmetic error.
	#[error(transparent)]
	Primitives(#[from] xcm_payments_primitives::Error),
	/// A chain query failed.
	#[error("{chain} chain query failed: {reason}")]
	Query {
		/// Queried chain.
		chain: ChainSide,
		/// Error returned by the connection.
		reason: String,
	},
	/// The asset is not known to the asset registry.
	#[error("asset {location:?} is not registered on the {chain} chain")]
	AssetNotRegistered {
		/// Chain of the asset registry.
		chain: ChainSide,
		/// Location of the asset.
		location: MultiLocation,
	},
	/// The asset has no fee rate registered.
	#[error("asset {asset_id} has no fee rate on the {chain} chain")]
	FeeRateUnavailable {
		/// Chain of the asset registry.
		chain: ChainSide,
		/// Asset without a rate.
		asset_id: AssetId,
	},
	/// A contract message could not be built.
	#[error("contract message {message} failed: {reason}")]
	ContractMessage {
		/// Label of the message.
		message: &'static str,
		/// What went wrong.
		reason: String,
	},
	/// Proxy addresses are required, but have not been derived for the session account.
	#[error("proxy accounts have not been calculated")]
	ProxiesNotCalculated,
	/// Balance of the account has not been read yet.
	#[error("balance of {0} is unknown")]
	BalanceUnknown(String),
	/// The event subscription ended before the awaited event.
	#[error("event stream of the {0} chain closed")]
	EventStreamClosed(ChainSide),
	/// The transaction status subscription ended before the transaction was finalized.
	#[error("transaction status stream of the {0} chain closed before finalization")]
	TransactionStatusStreamClosed(ChainSide),
	/// The chain configuration is invalid.
	#[error("invalid configuration: {0}")]
	Config(String),
}

impl Error {
	/// Returns true if the error is a confirmation timeout.
	///
	/// Unlike other failures, a timeout does not mean that the submitted transaction has failed.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::ConfirmationTimeout { .. })
	}

	/// Failed query of `chain`, as reported by a [`ChainConnection`](crate::chain::ChainConnection).
	pub fn query(chain: ChainSide, reason: impl std::fmt::Display) -> Self {
		Error::Query { chain, reason: reason.to_string() }
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Config(err.to_string())
	}
}
