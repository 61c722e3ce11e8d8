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

//! Chains taking part in a payment and the connection interface used to talk to them.

use crate::{calls::RuntimeCall, error::Error, Result};
use async_trait::async_trait;
use futures::{stream::BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use sp_core::H256;
use std::{
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};
use xcm_payments_primitives::{
	address::encode_address,
	proxy::ChainIdentity,
	xcm::{EncodedCall, MultiLocation},
	AccountId32, Balance, ParaId, Weight,
};

/// Identifier of an asset in the asset registry of the target chain.
pub type AssetId = u32;

/// Stream of transaction status updates.
pub type TransactionStatusStream = BoxStream<'static, TransactionStatus>;

/// One of the two chains of a payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainSide {
	/// Chain of the user and of the schedules contract.
	Origin,
	/// Chain running the automation tasks.
	Target,
}

impl std::fmt::Display for ChainSide {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ChainSide::Origin => f.write_str("origin"),
			ChainSide::Target => f.write_str("target"),
		}
	}
}

/// Static description of a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEndpoint {
	/// Human readable name.
	pub name: String,
	/// Parachain id.
	pub para_id: ParaId,
	/// SS58 address prefix.
	pub ss58_prefix: u16,
	/// Decimals of the native token.
	pub decimals: u32,
	/// Weight charged for one XCM instruction executed on this chain.
	pub xcm_instruction_weight: Weight,
	/// Number of instructions this chain needs to deliver a message to, or act on, the other
	/// chain.
	pub xcm_instructions_count: u32,
	/// RPC endpoint of a node.
	pub rpc_url: String,
}

impl ChainEndpoint {
	/// Parachain id and prefix of the chain.
	pub fn identity(&self) -> ChainIdentity {
		ChainIdentity { para_id: self.para_id, ss58_prefix: self.ss58_prefix }
	}

	/// Location of the chain native asset, as seen from a sibling.
	pub fn default_asset(&self) -> MultiLocation {
		MultiLocation::parachain(self.para_id)
	}

	/// Address of `account` on this chain.
	pub fn address_of(&self, account: &AccountId32) -> String {
		encode_address(account, self.ss58_prefix)
	}
}

/// Permission scope of a proxy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProxyType {
	/// Any call.
	Any,
	/// Any call except balance transfers.
	NonTransfer,
	/// Governance calls.
	Governance,
	/// Staking calls.
	Staking,
	/// A scope this client does not use.
	Other(String),
}

/// Entry of the proxy registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyDefinition {
	/// Account allowed to act.
	pub delegate: AccountId32,
	/// Scope of the delegation.
	pub proxy_type: ProxyType,
	/// Announcement delay, in blocks.
	pub delay: u32,
}

/// Asset registry metadata that matters for fee payment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetMetadata {
	/// Decimals of the asset.
	pub decimals: u32,
	/// Fee charged for one second of execution, paid in the asset.
	pub fee_per_second: Option<Balance>,
}

/// Status of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
	/// Waiting in the future queue.
	Future,
	/// Ready to be included.
	Ready,
	/// Gossiped to peers.
	Broadcast,
	/// Included in a block. `dispatch_error` is set when the block contains `ExtrinsicFailed` for
	/// the transaction.
	InBlock {
		/// Including block.
		block: H256,
		/// Dispatch error of the transaction.
		dispatch_error: Option<String>,
	},
	/// The including block was retracted.
	Retracted(H256),
	/// The including block is finalized.
	Finalized {
		/// Including block.
		block: H256,
		/// Dispatch error of the transaction.
		dispatch_error: Option<String>,
	},
	/// Dropped from the pool.
	Dropped,
	/// Invalid.
	Invalid(String),
}

/// `automationTime.TaskScheduled` event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskScheduledEvent {
	/// Task owner.
	pub who: AccountId32,
	/// Task identifier.
	pub task_id: String,
	/// Account the task is executed for, if scheduled through a proxy.
	pub schedule_as: Option<AccountId32>,
}

/// Chain event, reduced to what the client looks at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainEvent {
	/// An automation task has been scheduled.
	TaskScheduled(TaskScheduledEvent),
	/// Any other event.
	Other {
		/// Pallet name.
		pallet: String,
		/// Event name.
		name: String,
	},
}

/// Subscription to the events of new blocks.
///
/// Dropping the subscription unsubscribes.
pub struct EventSubscription {
	events: BoxStream<'static, Vec<ChainEvent>>,
	unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl EventSubscription {
	/// Wrap a stream of per-block events and the action that ends the subscription.
	pub fn new(
		events: BoxStream<'static, Vec<ChainEvent>>,
		unsubscribe: impl FnOnce() + Send + 'static,
	) -> Self {
		Self { events, unsubscribe: Some(Box::new(unsubscribe)) }
	}
}

impl Stream for EventSubscription {
	type Item = Vec<ChainEvent>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.get_mut().events.poll_next_unpin(cx)
	}
}

impl Drop for EventSubscription {
	fn drop(&mut self) {
		if let Some(unsubscribe) = self.unsubscribe.take() {
			unsubscribe();
		}
	}
}

/// Connection to a chain node.
///
/// Storage and runtime API queries, call encoding and the signing of transactions all go
/// through this trait. Signing is done with the keys of the connected wallet. Implementations
/// report failed queries with [`Error::query`].
#[async_trait]
pub trait ChainConnection: Send + Sync {
	/// `proxy.proxies` of `delegator`.
	async fn proxies(&self, delegator: &AccountId32) -> Result<Vec<ProxyDefinition>>;

	/// Free balance of `account` in the native token (`system.account`).
	async fn account_free_balance(&self, account: &AccountId32) -> Result<Balance>;

	/// Free balance of `account` in the registered asset `asset_id` (`tokens.accounts`).
	async fn token_free_balance(&self, account: &AccountId32, asset_id: AssetId) -> Result<Balance>;

	/// `assetRegistry.locationToAssetId`.
	async fn location_to_asset_id(&self, location: &MultiLocation) -> Result<Option<AssetId>>;

	/// `assetRegistry.metadata`.
	async fn asset_metadata(&self, asset_id: AssetId) -> Result<Option<AssetMetadata>>;

	/// `TransactionPaymentApi::query_weight_to_fee`.
	async fn query_weight_to_fee(&self, weight: Weight) -> Result<Balance>;

	/// Weight of `call` when signed by `signer`.
	async fn payment_info(&self, call: &RuntimeCall, signer: &AccountId32) -> Result<Weight>;

	/// Dry-run a contract message and return the gas it requires.
	async fn contract_gas_required(
		&self,
		origin: &AccountId32,
		contract: &AccountId32,
		value: Balance,
		input: &[u8],
	) -> Result<Weight>;

	/// SCALE-encode `call` with the chain metadata.
	fn encode_call(&self, call: &RuntimeCall) -> Result<EncodedCall>;

	/// Sign `call` with `signer`, submit it and watch its status.
	async fn sign_and_watch(
		&self,
		signer: &AccountId32,
		call: RuntimeCall,
	) -> Result<TransactionStatusStream>;

	/// Subscribe to the events of new blocks.
	async fn subscribe_events(&self) -> Result<EventSubscription>;
}

/// A chain and its connection, if any.
#[derive(Clone)]
pub struct ChainContext {
	side: ChainSide,
	endpoint: ChainEndpoint,
	connection: Option<Arc<dyn ChainConnection>>,
}

impl ChainContext {
	/// Chain without a connection.
	pub fn new(side: ChainSide, endpoint: ChainEndpoint) -> Self {
		Self { side, endpoint, connection: None }
	}

	/// Chain with an established connection.
	pub fn connected(
		side: ChainSide,
		endpoint: ChainEndpoint,
		connection: Arc<dyn ChainConnection>,
	) -> Self {
		Self { side, endpoint, connection: Some(connection) }
	}

	/// Which chain this is.
	pub fn side(&self) -> ChainSide {
		self.side
	}

	/// Static description of the chain.
	pub fn endpoint(&self) -> &ChainEndpoint {
		&self.endpoint
	}

	/// Attach a connection.
	pub fn set_connection(&mut self, connection: Arc<dyn ChainConnection>) {
		self.connection = Some(connection);
	}

	/// Drop the connection.
	pub fn clear_connection(&mut self) {
		self.connection = None;
	}

	/// Active connection, or `ConnectionUnavailable`.
	pub fn connection(&self) -> Result<&dyn ChainConnection> {
		self.connection.as_deref().ok_or(Error::ConnectionUnavailable(self.side))
	}

	/// Id the asset registry of the chain knows `location` by.
	///
	/// Fails with `AssetNotRegistered` if the location is unknown.
	pub async fn asset_id_of(&self, location: &MultiLocation) -> Result<AssetId> {
		self.connection()?
			.location_to_asset_id(location)
			.await?
			.ok_or_else(|| Error::AssetNotRegistered { chain: self.side, location: location.clone() })
	}
}

impl std::fmt::Debug for ChainContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChainContext")
			.field("side", &self.side)
			.field("endpoint", &self.endpoint.name)
			.field("connected", &self.connection.is_some())
			.finish()
	}
}
