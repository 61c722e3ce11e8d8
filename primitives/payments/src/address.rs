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

//! SS58 address helpers.

use crate::{Error, Result};
use sp_core::crypto::{AccountId32, Ss58Codec};

/// Decode an SS58 address of any network prefix, or a `0x` prefixed 32-byte public key.
pub fn decode_address(address: &str) -> Result<AccountId32> {
	let invalid = || Error::InvalidAddress(address.to_string());

	if let Some(hex_key) = address.strip_prefix("0x") {
		let bytes = hex::decode(hex_key).map_err(|_| invalid())?;
		let raw: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;
		return Ok(AccountId32::from(raw))
	}

	AccountId32::from_ss58check_with_version(address)
		.map(|(account, _)| account)
		.map_err(|_| invalid())
}

/// Encode the account with the given SS58 network prefix.
pub fn encode_address(account: &AccountId32, ss58_prefix: u16) -> String {
	account.to_ss58check_with_version(ss58_prefix.into())
}

/// Returns true if `address` is a valid SS58 or hex encoded 32-byte address.
pub fn is_valid_address(address: &str) -> bool {
	decode_address(address).is_ok()
}

/// Re-encode an address with the prefix of another chain.
pub fn to_chain_address(address: &str, ss58_prefix: u16) -> Result<String> {
	decode_address(address).map(|account| encode_address(&account, ss58_prefix))
}

/// Shortened form of an address: the first and the last six characters.
///
/// Strings that are not valid addresses are returned unchanged.
pub fn format_address(address: &str) -> String {
	if !is_valid_address(address) || address.len() <= 12 {
		return address.to_string()
	}
	format!("{}...{}", &address[..6], &address[address.len() - 6..])
}

/// Returns true when both strings encode the same account, whatever their prefixes are.
pub fn same_account(a: &str, b: &str) -> bool {
	match (decode_address(a), decode_address(b)) {
		(Ok(a), Ok(b)) => a == b,
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_matches::assert_matches;

	const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
	const ALICE_HEX: &str = "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";

	#[test]
	fn hex_and_ss58_forms_decode_to_same_account() {
		assert_eq!(decode_address(ALICE).unwrap(), decode_address(ALICE_HEX).unwrap());
	}

	#[test]
	fn re_encoding_keeps_the_account() {
		let on_prefix_five = to_chain_address(ALICE, 5).unwrap();
		assert_ne!(on_prefix_five, ALICE);
		assert!(same_account(&on_prefix_five, ALICE));
		assert_eq!(to_chain_address(&on_prefix_five, 42).unwrap(), ALICE);
	}

	#[test]
	fn invalid_addresses_are_rejected() {
		assert!(!is_valid_address("not an address"));
		assert!(!is_valid_address("0x1234"));
		assert_matches!(decode_address("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQZ"), Err(_));
		assert!(!same_account("garbage", ALICE));
	}

	#[test]
	fn addresses_are_shortened_for_display() {
		assert_eq!(format_address(ALICE), "5Grwva...GKutQY");
		assert_eq!(format_address("garbage"), "garbage");
	}
}
