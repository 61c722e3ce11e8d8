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

//! Scripted chain connection used in tests.

use crate::{
	calls::RuntimeCall,
	chain::{
		AssetId, AssetMetadata, ChainConnection, ChainContext, ChainEvent, ChainSide,
		EventSubscription, ProxyDefinition, TaskScheduledEvent, TransactionStatus,
		TransactionStatusStream,
	},
	config::Environment,
	error::Error,
	Result,
};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use sp_core::H256;
use std::{
	collections::{HashMap, VecDeque},
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex,
	},
};
use xcm_payments_primitives::{
	xcm::{EncodedCall, MultiLocation},
	AccountId32, Balance, Weight,
};

/// Block every scripted transaction is finalized in, unless scripted otherwise.
pub const FINALIZED_BLOCK: H256 = H256::repeat_byte(0xf1);

/// Weight reported for calls without a scripted weight.
pub const DEFAULT_CALL_WEIGHT: Weight = Weight::from_parts(1_000_000, 1_000);

/// Gas reported by contract dry-runs.
pub const CONTRACT_GAS: Weight = Weight::from_parts(5_000_000, 50_000);

#[derive(Default)]
struct State {
	proxies: HashMap<AccountId32, Vec<ProxyDefinition>>,
	free_balances: HashMap<AccountId32, Balance>,
	token_balances: HashMap<(AccountId32, AssetId), Balance>,
	asset_ids: Vec<(MultiLocation, AssetId)>,
	asset_metadata: HashMap<AssetId, AssetMetadata>,
	call_weights: HashMap<&'static str, Weight>,
	fee_per_ref_time: Balance,
	failing_queries: bool,
	statuses: VecDeque<Vec<TransactionStatus>>,
	submitted: Vec<(AccountId32, RuntimeCall)>,
	events: VecDeque<Vec<Vec<ChainEvent>>>,
	close_event_stream: bool,
	subscriptions: usize,
}

/// Chain connection answering from scripted state and recording submissions.
#[derive(Clone)]
pub struct MockConnection {
	state: Arc<Mutex<State>>,
	unsubscribed: Arc<AtomicUsize>,
}

impl MockConnection {
	pub fn new() -> Self {
		let state = State { fee_per_ref_time: 1, ..Default::default() };
		Self { state: Arc::new(Mutex::new(state)), unsubscribed: Arc::new(AtomicUsize::new(0)) }
	}

	fn state(&self) -> std::sync::MutexGuard<'_, State> {
		self.state.lock().unwrap()
	}

	pub fn set_proxies(&self, delegator: AccountId32, proxies: Vec<ProxyDefinition>) {
		self.state().proxies.insert(delegator, proxies);
	}

	pub fn set_free_balance(&self, account: AccountId32, balance: Balance) {
		self.state().free_balances.insert(account, balance);
	}

	pub fn set_token_balance(&self, account: AccountId32, asset_id: AssetId, balance: Balance) {
		self.state().token_balances.insert((account, asset_id), balance);
	}

	pub fn register_asset(&self, location: MultiLocation, asset_id: AssetId, metadata: AssetMetadata) {
		let mut state = self.state();
		state.asset_ids.push((location, asset_id));
		state.asset_metadata.insert(asset_id, metadata);
	}

	pub fn set_call_weight(&self, call_name: &'static str, weight: Weight) {
		self.state().call_weights.insert(call_name, weight);
	}

	pub fn set_fee_per_ref_time(&self, fee: Balance) {
		self.state().fee_per_ref_time = fee;
	}

	pub fn fail_queries(&self) {
		self.state().failing_queries = true;
	}

	/// Statuses of the next submitted transaction.
	pub fn push_statuses(&self, statuses: Vec<TransactionStatus>) {
		self.state().statuses.push_back(statuses);
	}

	/// Per-block events of the next subscription.
	pub fn push_events(&self, blocks: Vec<Vec<ChainEvent>>) {
		self.state().events.push_back(blocks);
	}

	/// End event streams once their scripted events are delivered, instead of leaving them
	/// open.
	pub fn close_event_stream_after_script(&self) {
		self.state().close_event_stream = true;
	}

	pub fn submitted(&self) -> Vec<RuntimeCall> {
		self.state().submitted.iter().map(|(_, call)| call.clone()).collect()
	}

	pub fn signers(&self) -> Vec<AccountId32> {
		self.state().submitted.iter().map(|(signer, _)| signer.clone()).collect()
	}

	pub fn subscriptions(&self) -> usize {
		self.state().subscriptions
	}

	pub fn unsubscribed(&self) -> usize {
		self.unsubscribed.load(Ordering::SeqCst)
	}

	fn check_queries(&self) -> Result<()> {
		if self.state().failing_queries {
			return Err(Error::query(ChainSide::Origin, "scripted failure"))
		}
		Ok(())
	}
}

#[async_trait]
impl ChainConnection for MockConnection {
	async fn proxies(&self, delegator: &AccountId32) -> Result<Vec<ProxyDefinition>> {
		self.check_queries()?;
		Ok(self.state().proxies.get(delegator).cloned().unwrap_or_default())
	}

	async fn account_free_balance(&self, account: &AccountId32) -> Result<Balance> {
		self.check_queries()?;
		Ok(self.state().free_balances.get(account).copied().unwrap_or_default())
	}

	async fn token_free_balance(&self, account: &AccountId32, asset_id: AssetId) -> Result<Balance> {
		self.check_queries()?;
		Ok(self
			.state()
			.token_balances
			.get(&(account.clone(), asset_id))
			.copied()
			.unwrap_or_default())
	}

	async fn location_to_asset_id(&self, location: &MultiLocation) -> Result<Option<AssetId>> {
		self.check_queries()?;
		Ok(self
			.state()
			.asset_ids
			.iter()
			.find(|(registered, _)| registered == location)
			.map(|(_, asset_id)| *asset_id))
	}

	async fn asset_metadata(&self, asset_id: AssetId) -> Result<Option<AssetMetadata>> {
		self.check_queries()?;
		Ok(self.state().asset_metadata.get(&asset_id).cloned())
	}

	async fn query_weight_to_fee(&self, weight: Weight) -> Result<Balance> {
		self.check_queries()?;
		Ok(weight.ref_time * self.state().fee_per_ref_time)
	}

	async fn payment_info(&self, call: &RuntimeCall, _signer: &AccountId32) -> Result<Weight> {
		self.check_queries()?;
		Ok(self.state().call_weights.get(call.name()).copied().unwrap_or(DEFAULT_CALL_WEIGHT))
	}

	async fn contract_gas_required(
		&self,
		_origin: &AccountId32,
		_contract: &AccountId32,
		_value: Balance,
		_input: &[u8],
	) -> Result<Weight> {
		self.check_queries()?;
		Ok(CONTRACT_GAS)
	}

	fn encode_call(&self, call: &RuntimeCall) -> Result<EncodedCall> {
		Ok(EncodedCall(call.name().as_bytes().to_vec()))
	}

	async fn sign_and_watch(
		&self,
		signer: &AccountId32,
		call: RuntimeCall,
	) -> Result<TransactionStatusStream> {
		let mut state = self.state();
		state.submitted.push((signer.clone(), call));
		let statuses = state.statuses.pop_front().unwrap_or_else(|| {
			vec![TransactionStatus::Finalized { block: FINALIZED_BLOCK, dispatch_error: None }]
		});
		Ok(stream::iter(statuses).boxed())
	}

	async fn subscribe_events(&self) -> Result<EventSubscription> {
		let mut state = self.state();
		state.subscriptions += 1;
		let blocks = state.events.pop_front().unwrap_or_default();
		let scripted = stream::iter(blocks);
		let events = if state.close_event_stream {
			scripted.boxed()
		} else {
			scripted.chain(stream::pending()).boxed()
		};

		let unsubscribed = self.unsubscribed.clone();
		Ok(EventSubscription::new(events, move || {
			unsubscribed.fetch_add(1, Ordering::SeqCst);
		}))
	}
}

/// `TaskScheduled` event of `who`.
pub fn task_scheduled(who: [u8; 32], task_id: &str, schedule_as: Option<[u8; 32]>) -> ChainEvent {
	ChainEvent::TaskScheduled(TaskScheduledEvent {
		who: AccountId32::from(who),
		task_id: task_id.into(),
		schedule_as: schedule_as.map(AccountId32::from),
	})
}

/// Development origin chain connected through `connection`.
pub fn origin_chain(connection: &MockConnection) -> ChainContext {
	ChainContext::connected(
		ChainSide::Origin,
		Environment::Development.chains().origin,
		Arc::new(connection.clone()),
	)
}

/// Development target chain connected through `connection`.
pub fn target_chain(connection: &MockConnection) -> ChainContext {
	ChainContext::connected(
		ChainSide::Target,
		Environment::Development.chains().target,
		Arc::new(connection.clone()),
	)
}
