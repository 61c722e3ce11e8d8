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

//! Derivation of the proxy accounts that act for a user on the sibling chain.
//!
//! When a parachain sends an XCM on behalf of one of its accounts, the receiving chain
//! executes it as the account described by the location
//! `(1, [Parachain(sender), AccountId32 { id }])`. That location is turned into an account
//! id by hashing its description:
//!
//! ```text
//! blake2_256("SiblingChain" ++ Compact(para_id) ++ Compact(len) ++ "AccountId32" ++ id)
//! ```
//!
//! This is the `HashedDescription<DescribeFamily<DescribeAccountId32Terminal>>` converter used
//! by the relay-connected runtimes. Any deviation produces an account that nobody controls.

use crate::{
	address::{decode_address, encode_address},
	Balance, ParaId, Result,
};
use codec::{Compact, Encode};
use sp_core::crypto::AccountId32;
use sp_crypto_hashing::blake2_256;

/// Prefix describing a location that is a sibling parachain.
const SIBLING_CHAIN_TAG: &[u8; 12] = b"SiblingChain";
/// Prefix describing a 32-byte account junction.
const ACCOUNT_ID_32_TAG: &[u8; 11] = b"AccountId32";

/// Identity of a chain as required by the derivation: parachain id and SS58 prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainIdentity {
	/// Parachain id of the chain.
	pub para_id: ParaId,
	/// SS58 address prefix of the chain.
	pub ss58_prefix: u16,
}

/// Account that sibling parachain `para_id` controls on behalf of `account`.
pub fn sibling_derivative_account(account: &AccountId32, para_id: ParaId) -> AccountId32 {
	let account_bytes: &[u8; 32] = account.as_ref();
	let interior = (ACCOUNT_ID_32_TAG, account_bytes).encode();
	let description = (SIBLING_CHAIN_TAG, Compact::<u32>::from(para_id), interior).encode();
	AccountId32::from(blake2_256(&description))
}

/// Derive the proxy address of `user_address`, authorised from `destination_para_id` and
/// encoded with the prefix of the chain where the proxy lives.
pub fn derive_proxy_address(
	user_address: &str,
	destination_para_id: ParaId,
	ss58_prefix: u16,
) -> Result<String> {
	let account = decode_address(user_address)?;
	Ok(encode_address(&sibling_derivative_account(&account, destination_para_id), ss58_prefix))
}

/// Proxy accounts of one user on the origin and the target chains.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyAccountPair {
	/// Proxy on the origin chain, controlled from the target chain.
	pub origin_address: String,
	/// Proxy on the target chain, controlled from the origin chain.
	pub target_address: String,
	/// Last known free balance of the origin proxy, in the origin native asset.
	pub origin_free_balance: Option<Balance>,
	/// Last known free balance of the target proxy, in the origin asset registered on target.
	pub target_free_balance: Option<Balance>,
}

impl ProxyAccountPair {
	/// Derive both proxy addresses of `user_address`.
	///
	/// The origin proxy is authorised from the target chain and the target proxy from the
	/// origin chain, each encoded with the prefix of the chain it lives on.
	pub fn derive(user_address: &str, origin: ChainIdentity, target: ChainIdentity) -> Result<Self> {
		Ok(Self {
			origin_address: derive_proxy_address(user_address, target.para_id, origin.ss58_prefix)?,
			target_address: derive_proxy_address(user_address, origin.para_id, target.ss58_prefix)?,
			origin_free_balance: None,
			target_free_balance: None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::address::same_account;
	use sp_core::crypto::Ss58Codec;

	const ALICE: [u8; 32] = [1u8; 32];

	#[test]
	fn sibling_derivation_matches_runtime_location_converter() {
		// `(1, [Parachain(1111), AccountId32 { network: None, id: [1; 32] }])` as converted by
		// the runtimes.
		let expected =
			AccountId32::from_ss58check("5DGRXLYwWGce7wvm14vX1Ms4Vf118FSWQbJkyQigY2pfm6bg").unwrap();
		assert_eq!(sibling_derivative_account(&AccountId32::from(ALICE), 1111), expected);
	}

	#[test]
	fn description_layout_is_stable() {
		let account = AccountId32::from(ALICE);
		let account_bytes: &[u8; 32] = account.as_ref();
		let interior = (ACCOUNT_ID_32_TAG, account_bytes).encode();
		let description = (SIBLING_CHAIN_TAG, Compact::<u32>::from(2000u32), interior).encode();

		let mut expected = b"SiblingChain".to_vec();
		expected.extend_from_slice(&[0x41, 0x1f]); // Compact(2000)
		expected.push(43 << 2); // Compact(11 + 32)
		expected.extend_from_slice(b"AccountId32");
		expected.extend_from_slice(&ALICE);
		assert_eq!(description, expected);
	}

	#[test]
	fn derivation_is_deterministic() {
		let user = encode_address(&AccountId32::from(ALICE), 42);
		let first = derive_proxy_address(&user, 2114, 5).unwrap();
		let second = derive_proxy_address(&user, 2114, 5).unwrap();
		assert_eq!(first, second);

		// the prefix only changes the rendering
		let other_prefix = derive_proxy_address(&user, 2114, 51).unwrap();
		assert_ne!(first, other_prefix);
		assert!(same_account(&first, &other_prefix));

		// the destination changes the account
		let other_para = derive_proxy_address(&user, 2000, 5).unwrap();
		assert!(!same_account(&first, &other_para));
	}

	#[test]
	fn pair_uses_the_opposite_chain_as_destination() {
		let user = encode_address(&AccountId32::from(ALICE), 42);
		let origin = ChainIdentity { para_id: 2000, ss58_prefix: 5 };
		let target = ChainIdentity { para_id: 2114, ss58_prefix: 51 };

		let pair = ProxyAccountPair::derive(&user, origin, target).unwrap();
		assert_eq!(pair.origin_address, derive_proxy_address(&user, 2114, 5).unwrap());
		assert_eq!(pair.target_address, derive_proxy_address(&user, 2000, 51).unwrap());
		assert_eq!(pair, ProxyAccountPair::derive(&user, origin, target).unwrap());
		assert_eq!(pair.origin_free_balance, None);
	}

	#[test]
	fn invalid_user_address_is_rejected() {
		assert!(derive_proxy_address("nope", 2000, 5).is_err());
	}
}
