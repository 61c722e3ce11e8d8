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

//! Session of one user: the chain pair, the connected account and its proxies.

use crate::{
	calls::RuntimeCall,
	chain::ChainContext,
	error::Error,
	events::TaskIdentity,
	proxy::{self, ProxiesExistence, TopUpBalances},
	Result,
};
use xcm_payments_primitives::{address::decode_address, AccountId32, Balance, ProxyAccountPair};

const LOG_TARGET: &str = "xcm-payments::session";

/// State shared by all operations of one user.
///
/// Proxies are derived on demand and dropped whenever the account changes.
#[derive(Debug)]
pub struct Session {
	origin: ChainContext,
	target: ChainContext,
	account: AccountId32,
	proxies: Option<ProxyAccountPair>,
}

impl Session {
	/// Start a session of `account`.
	pub fn new(origin: ChainContext, target: ChainContext, account: AccountId32) -> Self {
		Self { origin, target, account, proxies: None }
	}

	/// Origin chain.
	pub fn origin(&self) -> &ChainContext {
		&self.origin
	}

	/// Target chain.
	pub fn target(&self) -> &ChainContext {
		&self.target
	}

	/// Origin chain, to attach or drop its connection.
	pub fn origin_mut(&mut self) -> &mut ChainContext {
		&mut self.origin
	}

	/// Target chain, to attach or drop its connection.
	pub fn target_mut(&mut self) -> &mut ChainContext {
		&mut self.target
	}

	/// Connected account.
	pub fn account(&self) -> &AccountId32 {
		&self.account
	}

	/// Address of the account on the origin chain.
	pub fn user_address(&self) -> String {
		self.origin.endpoint().address_of(&self.account)
	}

	/// Switch to another account. Proxies of the previous account are forgotten.
	pub fn switch_account(&mut self, account: AccountId32) {
		if account != self.account {
			log::info!(target: LOG_TARGET, "Switching session account to {account}");
			self.account = account;
			self.proxies = None;
		}
	}

	/// Derive the proxies of the account.
	pub fn calculate_proxies(&mut self) -> Result<&ProxyAccountPair> {
		let pair = ProxyAccountPair::derive(
			&self.user_address(),
			self.origin.endpoint().identity(),
			self.target.endpoint().identity(),
		)?;
		log::debug!(
			target: LOG_TARGET,
			"Proxies of {}: {} on the origin chain, {} on the target chain",
			self.account,
			pair.origin_address,
			pair.target_address,
		);
		Ok(&*self.proxies.insert(pair))
	}

	/// Derived proxies, or `ProxiesNotCalculated`.
	pub fn proxies(&self) -> Result<&ProxyAccountPair> {
		self.proxies.as_ref().ok_or(Error::ProxiesNotCalculated)
	}

	/// Proxy of the account on the origin chain.
	pub fn origin_proxy(&self) -> Result<AccountId32> {
		Ok(decode_address(&self.proxies()?.origin_address)?)
	}

	/// Proxy of the account on the target chain.
	pub fn target_proxy(&self) -> Result<AccountId32> {
		Ok(decode_address(&self.proxies()?.target_address)?)
	}

	/// Whether each proxy is registered as an `Any` delegate of the account on its chain.
	pub async fn proxies_exist(&self) -> Result<ProxiesExistence> {
		let origin_proxy = self.origin_proxy()?;
		let target_proxy = self.target_proxy()?;
		Ok(ProxiesExistence {
			origin_exists: proxy::proxy_exists(
				self.origin.connection()?,
				&self.account,
				&origin_proxy,
			)
			.await?,
			target_exists: proxy::proxy_exists(
				self.target.connection()?,
				&self.account,
				&target_proxy,
			)
			.await?,
		})
	}

	/// Register the proxies that do not exist yet, one chain after the other.
	pub async fn create_accounts(&self, existence: ProxiesExistence) -> Result<()> {
		if !existence.origin_exists {
			proxy::create_proxy(&self.origin, &self.account, &self.origin_proxy()?).await?;
		}
		if !existence.target_exists {
			proxy::create_proxy(&self.target, &self.account, &self.target_proxy()?).await?;
		}
		Ok(())
	}

	/// Read the balances of both proxies.
	pub async fn refresh_balances(&mut self) -> Result<&ProxyAccountPair> {
		let (origin_balance, target_balance) =
			proxy::fetch_balances(&self.origin, &self.target, self.proxies()?).await?;
		let pair = self.proxies.as_mut().ok_or(Error::ProxiesNotCalculated)?;
		pair.origin_free_balance = Some(origin_balance);
		pair.target_free_balance = Some(target_balance);
		Ok(&*pair)
	}

	/// Derive the proxies, register the missing ones and read their balances.
	///
	/// Returns which proxies existed before.
	pub async fn prepare_proxy_accounts(&mut self) -> Result<ProxiesExistence> {
		self.calculate_proxies()?;
		let existence = self.proxies_exist().await?;
		self.create_accounts(existence).await?;
		self.refresh_balances().await?;
		Ok(existence)
	}

	/// Top-ups the proxies need to pay the given fees.
	pub fn calculate_total_top_up_balances(
		&self,
		origin_required: Balance,
		target_required: Balance,
	) -> Result<TopUpBalances> {
		proxy::calculate_total_top_up_balances(self.proxies()?, origin_required, target_required)
	}

	/// Origin chain calls funding the proxies.
	pub fn top_up_calls(&self, top_up: TopUpBalances) -> Result<Vec<RuntimeCall>> {
		proxy::top_up_calls(self.proxies()?, self.target.endpoint().para_id, top_up)
	}

	/// Accounts identifying the automation tasks of the account.
	pub fn task_identity(&self) -> Result<TaskIdentity> {
		Ok(TaskIdentity { owner: self.target_proxy()?, schedule_as: self.account.clone() })
	}
}
