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

//! Submission of signed transactions.

use crate::{
	calls::RuntimeCall,
	chain::{ChainContext, TransactionStatus},
	error::Error,
	Result,
};
use futures::StreamExt;
use sp_core::H256;
use xcm_payments_primitives::AccountId32;

const LOG_TARGET: &str = "xcm-payments::transaction";

/// Sign `call` with `signer`, submit it to `chain` and wait until it is finalized.
///
/// Returns the hash of the finalizing block. The transaction is rejected if it is retracted,
/// dropped or invalid, or if it fails while being dispatched.
pub async fn sign_and_send(
	chain: &ChainContext,
	signer: &AccountId32,
	call: RuntimeCall,
) -> Result<H256> {
	let side = chain.side();
	let connection = chain.connection()?;
	let call_name = call.name();

	log::info!(target: LOG_TARGET, "Submitting {call_name} to the {side} chain");
	let mut statuses = connection.sign_and_watch(signer, call).await?;

	let rejected = |reason: String| -> Result<H256> {
		log::warn!(target: LOG_TARGET, "{call_name} rejected by the {side} chain: {reason}");
		Err(Error::ExtrinsicRejected { chain: side, reason })
	};

	while let Some(status) = statuses.next().await {
		match status {
			TransactionStatus::Future | TransactionStatus::Ready | TransactionStatus::Broadcast => {
				log::trace!(target: LOG_TARGET, "{call_name} on the {side} chain: {status:?}");
			},
			TransactionStatus::InBlock { dispatch_error: Some(error), .. } |
			TransactionStatus::Finalized { dispatch_error: Some(error), .. } =>
				return rejected(format!("dispatch failed: {error}")),
			TransactionStatus::InBlock { block, dispatch_error: None } => {
				log::debug!(target: LOG_TARGET, "{call_name} included in {side} block {block:?}");
			},
			TransactionStatus::Finalized { block, dispatch_error: None } => {
				log::info!(target: LOG_TARGET, "{call_name} finalized in {side} block {block:?}");
				return Ok(block)
			},
			TransactionStatus::Retracted(block) =>
				return rejected(format!("retracted from block {block:?}")),
			TransactionStatus::Dropped => return rejected("dropped".into()),
			TransactionStatus::Invalid(reason) => return rejected(format!("invalid: {reason}")),
		}
	}

	Err(Error::TransactionStatusStreamClosed(side))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		calls::BalancesCall,
		chain::ChainSide,
		mock::{origin_chain, MockConnection},
	};
	use assert_matches::assert_matches;

	fn transfer() -> RuntimeCall {
		RuntimeCall::Balances(BalancesCall::Transfer { dest: AccountId32::from([2; 32]), value: 1 })
	}

	#[tokio::test]
	async fn finalized_transaction_resolves() {
		let connection = MockConnection::new();
		connection.push_statuses(vec![
			TransactionStatus::Ready,
			TransactionStatus::InBlock { block: H256::repeat_byte(1), dispatch_error: None },
			TransactionStatus::Finalized { block: H256::repeat_byte(1), dispatch_error: None },
		]);
		let chain = origin_chain(&connection);

		let block = sign_and_send(&chain, &AccountId32::from([1; 32]), transfer()).await.unwrap();
		assert_eq!(block, H256::repeat_byte(1));
		assert_eq!(connection.submitted(), vec![transfer()]);
	}

	#[tokio::test]
	async fn rejecting_statuses_reject() {
		for status in [
			TransactionStatus::Retracted(H256::zero()),
			TransactionStatus::Dropped,
			TransactionStatus::Invalid("bad signature".into()),
			TransactionStatus::InBlock {
				block: H256::zero(),
				dispatch_error: Some("Module error".into()),
			},
		] {
			let connection = MockConnection::new();
			connection.push_statuses(vec![TransactionStatus::Broadcast, status.clone()]);
			let chain = origin_chain(&connection);

			assert_matches!(
				sign_and_send(&chain, &AccountId32::from([1; 32]), transfer()).await,
				Err(Error::ExtrinsicRejected { chain: ChainSide::Origin, .. }),
				"{status:?}"
			);
		}
	}

	#[tokio::test]
	async fn closed_status_stream_is_an_error() {
		let connection = MockConnection::new();
		connection.push_statuses(vec![TransactionStatus::Ready]);
		let chain = origin_chain(&connection);

		assert_matches!(
			sign_and_send(&chain, &AccountId32::from([1; 32]), transfer()).await,
			Err(Error::TransactionStatusStreamClosed(ChainSide::Origin))
		);
	}

	#[tokio::test]
	async fn missing_connection_fails_fast() {
		let chain = ChainContext::new(
			ChainSide::Target,
			crate::config::Environment::Development.chains().target,
		);
		assert_matches!(
			sign_and_send(&chain, &AccountId32::from([1; 32]), transfer()).await,
			Err(Error::ConnectionUnavailable(ChainSide::Target))
		);
	}
}
