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

//! Lifecycle of the proxy accounts: registration, balances and top-ups.

use crate::{
	calls::{BalancesCall, ProxyCall, RuntimeCall, XTokensCall},
	chain::{ChainConnection, ChainContext, ProxyType},
	error::Error,
	Result,
};
use xcm_payments_primitives::{
	address::decode_address,
	xcm::{MultiAsset, MultiLocation, VersionedMultiAsset, VersionedMultiLocation, WeightLimit},
	AccountId32, Balance, ParaId, ProxyAccountPair,
};

const LOG_TARGET: &str = "xcm-payments::proxy";

/// Initial balance of a new origin proxy, in origin base units (`10^15`).
pub const ORIGIN_INITIAL_BALANCE: Balance = 1_000_000_000_000_000;

/// Initial balance of a new target proxy, in base units of the origin asset (`10^17`).
pub const TARGET_INITIAL_BALANCE: Balance = 100_000_000_000_000_000;

/// Smallest top-up of a funded proxy (`10^10`). Smaller transfers would be eaten by fees.
pub const PROXY_ACCOUNT_MIN_TRANSFER_BALANCE: Balance = 10_000_000_000;

/// Whether the proxies of a user are registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProxiesExistence {
	/// The origin proxy is a delegate of the user on the origin chain.
	pub origin_exists: bool,
	/// The target proxy is a delegate of the user on the target chain.
	pub target_exists: bool,
}

/// Amounts to send to the proxies. `None` means that no transfer is needed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TopUpBalances {
	/// Top-up of the origin proxy, in the origin native token.
	pub origin: Option<Balance>,
	/// Top-up of the target proxy, in the origin native token.
	pub target: Option<Balance>,
}

impl TopUpBalances {
	/// Returns true if neither proxy needs funds.
	pub fn is_empty(&self) -> bool {
		self.origin.is_none() && self.target.is_none()
	}
}

/// Returns true if `candidate` is an unrestricted (`Any`) delegate of `delegator`.
pub async fn proxy_exists(
	connection: &dyn ChainConnection,
	delegator: &AccountId32,
	candidate: &AccountId32,
) -> Result<bool> {
	let proxies = connection.proxies(delegator).await?;
	Ok(proxies
		.iter()
		.any(|proxy| proxy.proxy_type == ProxyType::Any && &proxy.delegate == candidate))
}

/// `proxy.addProxy(delegate, proxy_type, 0)`.
pub fn add_proxy_call(delegate: AccountId32, proxy_type: ProxyType) -> RuntimeCall {
	RuntimeCall::Proxy(ProxyCall::AddProxy { delegate, proxy_type, delay: 0 })
}

/// Register `proxy` as an `Any` delegate of `account` on `chain`.
///
/// Callers must have checked that the delegation does not exist yet: registering it twice adds
/// a duplicate entry.
pub async fn create_proxy(
	chain: &ChainContext,
	account: &AccountId32,
	proxy: &AccountId32,
) -> Result<()> {
	log::info!(
		target: LOG_TARGET,
		"Registering proxy {} of {} on the {} chain",
		proxy,
		account,
		chain.side(),
	);
	crate::transaction::sign_and_send(chain, account, add_proxy_call(proxy.clone(), ProxyType::Any))
		.await
		.map(drop)
}

/// Read the free balances of both proxies.
///
/// The origin proxy holds the origin native token. The target proxy holds the origin token as
/// an asset registered on the target chain, so its balance is read from the token ledger. Both
/// reads run concurrently.
pub async fn fetch_balances(
	origin: &ChainContext,
	target: &ChainContext,
	pair: &ProxyAccountPair,
) -> Result<(Balance, Balance)> {
	let origin_connection = origin.connection()?;
	let target_connection = target.connection()?;
	let origin_proxy = decode_address(&pair.origin_address)?;
	let target_proxy = decode_address(&pair.target_address)?;

	let origin_balance = origin_connection.account_free_balance(&origin_proxy);
	let target_balance = async {
		let asset_id = target.asset_id_of(&origin.endpoint().default_asset()).await?;
		target_connection.token_free_balance(&target_proxy, asset_id).await
	};

	futures::future::try_join(origin_balance, target_balance).await
}

/// Amount to send to a proxy so that it holds at least `required`.
///
/// An empty proxy gets `max(initial, required)`. A proxy holding less than `required` gets the
/// difference, but at least [`PROXY_ACCOUNT_MIN_TRANSFER_BALANCE`]. A proxy holding enough gets
/// nothing.
pub fn calculate_top_up_balance(
	required: Balance,
	current: Balance,
	initial: Balance,
) -> Option<Balance> {
	if current == 0 {
		Some(initial.max(required))
	} else if current < required {
		Some((required - current).max(PROXY_ACCOUNT_MIN_TRANSFER_BALANCE))
	} else {
		None
	}
}

/// Top-ups of both proxies of `pair`, given the fees they have to pay.
pub fn calculate_total_top_up_balances(
	pair: &ProxyAccountPair,
	origin_required: Balance,
	target_required: Balance,
) -> Result<TopUpBalances> {
	let origin_balance = pair
		.origin_free_balance
		.ok_or_else(|| Error::BalanceUnknown(pair.origin_address.clone()))?;
	let target_balance = pair
		.target_free_balance
		.ok_or_else(|| Error::BalanceUnknown(pair.target_address.clone()))?;

	Ok(TopUpBalances {
		origin: calculate_top_up_balance(origin_required, origin_balance, ORIGIN_INITIAL_BALANCE),
		target: calculate_top_up_balance(target_required, target_balance, TARGET_INITIAL_BALANCE),
	})
}

/// Origin chain calls funding the proxies of `pair`.
///
/// The origin proxy gets a plain transfer. The target proxy gets the origin native token
/// through `xTokens`, with an unlimited weight limit. Calls come in that order and absent
/// amounts are skipped.
pub fn top_up_calls(
	pair: &ProxyAccountPair,
	target_para_id: ParaId,
	top_up: TopUpBalances,
) -> Result<Vec<RuntimeCall>> {
	let mut calls = Vec::new();

	if let Some(value) = top_up.origin {
		calls.push(RuntimeCall::Balances(BalancesCall::Transfer {
			dest: decode_address(&pair.origin_address)?,
			value,
		}));
	}

	if let Some(amount) = top_up.target {
		let target_proxy = decode_address(&pair.target_address)?;
		calls.push(RuntimeCall::XTokens(XTokensCall::TransferMultiasset {
			asset: VersionedMultiAsset::V3(MultiAsset::concrete_fungible(
				MultiLocation::here(),
				amount,
			)),
			dest: VersionedMultiLocation::V3(MultiLocation::account_x2(
				target_para_id,
				&target_proxy,
			)),
			dest_weight_limit: WeightLimit::Unlimited,
		}));
	}

	Ok(calls)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		chain::{ChainSide, ProxyDefinition},
		config::Environment,
		mock::{origin_chain, target_chain, MockConnection},
	};
	use assert_matches::assert_matches;

	const USER: [u8; 32] = [1; 32];

	fn pair(origin_balance: Option<Balance>, target_balance: Option<Balance>) -> ProxyAccountPair {
		let origin = Environment::Development.chains().origin.identity();
		let target = Environment::Development.chains().target.identity();
		let user = xcm_payments_primitives::address::encode_address(&AccountId32::from(USER), 42);
		ProxyAccountPair {
			origin_free_balance: origin_balance,
			target_free_balance: target_balance,
			..ProxyAccountPair::derive(&user, origin, target).unwrap()
		}
	}

	#[test]
	fn empty_proxy_gets_the_larger_of_initial_and_required() {
		assert_eq!(calculate_top_up_balance(10, 0, 1), Some(10));
		assert_eq!(calculate_top_up_balance(1, 0, 10), Some(10));
		for (required, initial) in [(0, 0), (5, 5), (1 << 70, 3), (3, 1 << 70)] {
			assert_eq!(calculate_top_up_balance(required, 0, initial), Some(required.max(initial)));
		}
	}

	#[test]
	fn underfunded_proxy_gets_at_least_the_floor() {
		let floor = PROXY_ACCOUNT_MIN_TRANSFER_BALANCE;
		assert_eq!(calculate_top_up_balance(100, 1, 0), Some(floor));
		assert_eq!(calculate_top_up_balance(floor * 3, floor, 0), Some(floor * 2));
		assert_eq!(calculate_top_up_balance(floor + 1, 1, 0), Some(floor));
	}

	#[test]
	fn funded_proxy_gets_nothing() {
		assert_eq!(calculate_top_up_balance(100, 100, 1_000), None);
		assert_eq!(calculate_top_up_balance(100, 1_000, 1_000), None);
		assert_eq!(calculate_top_up_balance(0, 1, 1_000), None);
	}

	#[test]
	fn total_top_ups_use_chain_initial_balances() {
		let top_up = calculate_total_top_up_balances(&pair(Some(0), Some(0)), 1, 1).unwrap();
		assert_eq!(
			top_up,
			TopUpBalances { origin: Some(ORIGIN_INITIAL_BALANCE), target: Some(TARGET_INITIAL_BALANCE) }
		);

		let top_up =
			calculate_total_top_up_balances(&pair(Some(u128::MAX), Some(0)), 1, 1).unwrap();
		assert_eq!(top_up.origin, None);

		assert_matches!(
			calculate_total_top_up_balances(&pair(None, Some(0)), 1, 1),
			Err(Error::BalanceUnknown(_))
		);
	}

	#[test]
	fn top_up_calls_keep_transfer_then_cross_chain_order() {
		let pair = pair(Some(0), Some(0));
		assert!(top_up_calls(&pair, 2114, TopUpBalances::default()).unwrap().is_empty());

		let calls =
			top_up_calls(&pair, 2114, TopUpBalances { origin: Some(5), target: Some(7) }).unwrap();
		assert_eq!(calls.len(), 2);
		assert_eq!(
			calls[0],
			RuntimeCall::Balances(BalancesCall::Transfer {
				dest: decode_address(&pair.origin_address).unwrap(),
				value: 5,
			})
		);
		assert_eq!(
			calls[1],
			RuntimeCall::XTokens(XTokensCall::TransferMultiasset {
				asset: VersionedMultiAsset::V3(MultiAsset::concrete_fungible(
					MultiLocation::here(),
					7
				)),
				dest: VersionedMultiLocation::V3(MultiLocation::account_x2(
					2114,
					&decode_address(&pair.target_address).unwrap()
				)),
				dest_weight_limit: WeightLimit::Unlimited,
			})
		);

		let only_target =
			top_up_calls(&pair, 2114, TopUpBalances { origin: None, target: Some(7) }).unwrap();
		assert_eq!(only_target.iter().map(RuntimeCall::name).collect::<Vec<_>>(), vec![
			"xTokens.transferMultiasset"
		]);
	}

	#[tokio::test]
	async fn only_any_delegations_count() {
		let connection = MockConnection::new();
		let user = AccountId32::from(USER);
		let proxy = AccountId32::from([2; 32]);
		connection.set_proxies(user.clone(), vec![ProxyDefinition {
			delegate: proxy.clone(),
			proxy_type: ProxyType::NonTransfer,
			delay: 0,
		}]);
		assert!(!proxy_exists(&connection, &user, &proxy).await.unwrap());

		connection.set_proxies(user.clone(), vec![
			ProxyDefinition { delegate: AccountId32::from([3; 32]), proxy_type: ProxyType::Any, delay: 0 },
			ProxyDefinition { delegate: proxy.clone(), proxy_type: ProxyType::Any, delay: 0 },
		]);
		assert!(proxy_exists(&connection, &user, &proxy).await.unwrap());
		assert!(!proxy_exists(&connection, &AccountId32::from([4; 32]), &proxy).await.unwrap());
	}

	#[tokio::test]
	async fn balances_are_read_from_different_ledgers() {
		let origin_connection = MockConnection::new();
		let target_connection = MockConnection::new();
		let origin = origin_chain(&origin_connection);
		let target = target_chain(&target_connection);
		let pair = pair(None, None);

		origin_connection.set_free_balance(decode_address(&pair.origin_address).unwrap(), 11);
		target_connection.register_asset(origin.endpoint().default_asset(), 5, Default::default());
		target_connection.set_token_balance(decode_address(&pair.target_address).unwrap(), 5, 22);
		// native balance of the target proxy is not what pays the fees
		target_connection.set_free_balance(decode_address(&pair.target_address).unwrap(), 99);

		assert_eq!(fetch_balances(&origin, &target, &pair).await.unwrap(), (11, 22));
	}

	#[tokio::test]
	async fn unregistered_origin_asset_is_an_error() {
		let origin_connection = MockConnection::new();
		let target_connection = MockConnection::new();
		let origin = origin_chain(&origin_connection);
		let target = target_chain(&target_connection);

		assert_matches!(
			fetch_balances(&origin, &target, &pair(None, None)).await,
			Err(Error::AssetNotRegistered { chain: ChainSide::Target, .. })
		);
	}
}
