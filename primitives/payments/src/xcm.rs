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

//! The subset of XCM v3 used to pay for and trigger a call on the sibling chain.
//!
//! Only the variants that the payment flows send are modelled. Codec indices match the XCM v3
//! definitions, so the encoding is what `polkadotXcm.send` and `xTokens` expect, and decoding a
//! message that uses any other variant fails instead of passing it through.

use crate::{
	weight::{Weight, WireWeight},
	Balance, ParaId, Result,
};
use codec::{Decode, Encode};
use sp_core::crypto::AccountId32;

/// Network a junction belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub enum NetworkId {
	/// Network identified by its genesis hash.
	#[codec(index = 0)]
	ByGenesis([u8; 32]),
	/// The Polkadot relay network.
	#[codec(index = 2)]
	Polkadot,
	/// The Kusama relay network.
	#[codec(index = 3)]
	Kusama,
	/// The Westend test network.
	#[codec(index = 4)]
	Westend,
	/// The Rococo test network.
	#[codec(index = 5)]
	Rococo,
}

/// Single item of a location interior.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum Junction {
	/// A parachain of the relay network.
	#[codec(index = 0)]
	Parachain(#[codec(compact)] ParaId),
	/// A 32-byte account.
	#[codec(index = 1)]
	AccountId32 {
		/// Network of the account, `None` for the local one.
		network: Option<NetworkId>,
		/// Raw account id.
		id: [u8; 32],
	},
}

/// Interior of a location.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum Junctions {
	/// The location itself.
	#[codec(index = 0)]
	Here,
	/// One junction deep.
	#[codec(index = 1)]
	X1(Junction),
	/// Two junctions deep.
	#[codec(index = 2)]
	X2(Junction, Junction),
}

/// Relative location in the consensus universe.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct MultiLocation {
	/// Number of steps up towards the relay chain.
	pub parents: u8,
	/// Path down from the ancestor.
	pub interior: Junctions,
}

impl MultiLocation {
	/// The chain that interprets the location.
	pub fn here() -> Self {
		Self { parents: 0, interior: Junctions::Here }
	}

	/// Sibling parachain `para_id`; also the location of its native asset.
	pub fn parachain(para_id: ParaId) -> Self {
		Self { parents: 1, interior: Junctions::X1(Junction::Parachain(para_id)) }
	}

	/// Account on the relay-level consensus, as seen from a parachain.
	pub fn account_x1(account: &AccountId32) -> Self {
		Self { parents: 1, interior: Junctions::X1(account_junction(account)) }
	}

	/// Account on sibling parachain `para_id`.
	pub fn account_x2(para_id: ParaId, account: &AccountId32) -> Self {
		Self {
			parents: 1,
			interior: Junctions::X2(Junction::Parachain(para_id), account_junction(account)),
		}
	}
}

fn account_junction(account: &AccountId32) -> Junction {
	Junction::AccountId32 { network: None, id: *AsRef::<[u8; 32]>::as_ref(account) }
}

/// Identifier of an asset.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum AssetId {
	/// Asset identified by the location of its reserve.
	#[codec(index = 0)]
	Concrete(MultiLocation),
}

/// Amount of an asset.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum Fungibility {
	/// A fungible amount.
	#[codec(index = 0)]
	Fungible(#[codec(compact)] Balance),
}

/// Some amount of some asset.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct MultiAsset {
	/// Which asset.
	pub id: AssetId,
	/// How much of it.
	pub fun: Fungibility,
}

impl MultiAsset {
	/// `amount` of the fungible asset whose reserve is `location`.
	pub fn concrete_fungible(location: MultiLocation, amount: Balance) -> Self {
		Self { id: AssetId::Concrete(location), fun: Fungibility::Fungible(amount) }
	}
}

/// Wildcard selection of held assets.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum WildMultiAsset {
	/// All held assets, up to the given number of asset kinds.
	#[codec(index = 2)]
	AllCounted(#[codec(compact)] u32),
}

/// Selection of held assets.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum MultiAssetFilter {
	/// Exactly these assets.
	#[codec(index = 0)]
	Definite(Vec<MultiAsset>),
	/// Assets matching the wildcard.
	#[codec(index = 1)]
	Wild(WildMultiAsset),
}

/// Weight limit of a purchased execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub enum WeightLimit {
	/// No limit.
	#[codec(index = 0)]
	Unlimited,
	/// At most this weight.
	#[codec(index = 1)]
	Limited(WireWeight),
}

/// Origin a `Transact` call is dispatched with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub enum OriginKind {
	/// Native origin of the message sender.
	#[codec(index = 0)]
	Native,
	/// Account derived from the message origin.
	#[codec(index = 1)]
	SovereignAccount,
	/// Root.
	#[codec(index = 2)]
	Superuser,
	/// XCM pallet origin.
	#[codec(index = 3)]
	Xcm,
}

/// SCALE-encoded runtime call of the chain that executes the message.
#[derive(Clone, PartialEq, Eq, Encode, Decode)]
pub struct EncodedCall(pub Vec<u8>);

impl EncodedCall {
	/// `0x` prefixed hex form of the call.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(&self.0))
	}
}

impl std::fmt::Debug for EncodedCall {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.to_hex())
	}
}

/// XCM v3 instructions used by the payment flows.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum Instruction {
	/// Move assets from the origin's account into the holding register.
	#[codec(index = 0)]
	WithdrawAsset(Vec<MultiAsset>),
	/// Dispatch an encoded call.
	#[codec(index = 6)]
	Transact {
		/// Origin to dispatch the call with.
		origin_kind: OriginKind,
		/// Weight the call may consume at most.
		require_weight_at_most: WireWeight,
		/// The call itself.
		call: EncodedCall,
	},
	/// Deposit held assets into the beneficiary's account.
	#[codec(index = 13)]
	DepositAsset {
		/// Assets to deposit.
		assets: MultiAssetFilter,
		/// Receiver of the assets.
		beneficiary: MultiLocation,
	},
	/// Pay for the execution of the rest of the message.
	#[codec(index = 19)]
	BuyExecution {
		/// Asset used to pay.
		fees: MultiAsset,
		/// Maximal weight to buy.
		weight_limit: WeightLimit,
	},
	/// Return unused purchased weight to the holding register.
	#[codec(index = 20)]
	RefundSurplus,
}

impl Instruction {
	/// Name of the instruction.
	pub fn name(&self) -> &'static str {
		match self {
			Instruction::WithdrawAsset(_) => "WithdrawAsset",
			Instruction::Transact { .. } => "Transact",
			Instruction::DepositAsset { .. } => "DepositAsset",
			Instruction::BuyExecution { .. } => "BuyExecution",
			Instruction::RefundSurplus => "RefundSurplus",
		}
	}
}

/// Versioned XCM message.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum VersionedXcm {
	/// XCM v3 message.
	#[codec(index = 3)]
	V3(Vec<Instruction>),
}

impl VersionedXcm {
	/// Instructions of the message.
	pub fn instructions(&self) -> &[Instruction] {
		match self {
			VersionedXcm::V3(instructions) => instructions,
		}
	}
}

/// Versioned location.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum VersionedMultiLocation {
	/// XCM v3 location.
	#[codec(index = 3)]
	V3(MultiLocation),
}

/// Versioned asset.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum VersionedMultiAsset {
	/// XCM v3 asset.
	#[codec(index = 3)]
	V3(MultiAsset),
}

/// Weight limit requested by `BuyExecution`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionWeightLimit {
	/// Buy at most the given weight.
	Limited(Weight),
	/// Buy whatever the fee asset pays for.
	Unlimited,
}

/// Builds the `WithdrawAsset, BuyExecution, Transact, RefundSurplus, DepositAsset` message that
/// funds and dispatches a call on the sibling chain.
///
/// Instructions are emitted in that order whatever the order of the `add_*` calls, and only
/// `WithdrawAsset` is mandatory. `build` consumes the builder, so every message gets its own.
#[derive(Clone, Debug, Default)]
pub struct XcmBuilder {
	withdraw_assets: Vec<MultiAsset>,
	buy_execution: Option<(MultiAsset, ExecutionWeightLimit)>,
	transact: Option<(Weight, EncodedCall)>,
	refund_surplus: bool,
	deposit_beneficiary: Option<AccountId32>,
}

impl XcmBuilder {
	/// Create an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Withdraw `amount` of the asset at `asset_location`.
	pub fn add_withdraw_asset(mut self, asset_location: MultiLocation, amount: Balance) -> Self {
		self.withdraw_assets.push(MultiAsset::concrete_fungible(asset_location, amount));
		self
	}

	/// Pay for execution with `amount` of the asset at `asset_location`.
	pub fn add_buy_execution(
		mut self,
		asset_location: MultiLocation,
		amount: Balance,
		weight_limit: ExecutionWeightLimit,
	) -> Self {
		self.buy_execution =
			Some((MultiAsset::concrete_fungible(asset_location, amount), weight_limit));
		self
	}

	/// Dispatch `call` with the sovereign account origin, spending at most `weight`.
	pub fn add_transact(mut self, weight: Weight, call: EncodedCall) -> Self {
		self.transact = Some((weight, call));
		self
	}

	/// Reclaim unused purchased execution.
	pub fn add_refund_surplus(mut self) -> Self {
		self.refund_surplus = true;
		self
	}

	/// Return whatever is left in holding to `beneficiary`.
	pub fn add_deposit_asset(mut self, beneficiary: &AccountId32) -> Self {
		self.deposit_beneficiary = Some(beneficiary.clone());
		self
	}

	/// Assemble the versioned message.
	///
	/// Fails if a weight does not fit into the 64-bit components of the wire format.
	pub fn build(self) -> Result<VersionedXcm> {
		let mut instructions = vec![Instruction::WithdrawAsset(self.withdraw_assets)];

		if let Some((fees, weight_limit)) = self.buy_execution {
			let weight_limit = match weight_limit {
				ExecutionWeightLimit::Limited(weight) => WeightLimit::Limited(weight.try_into()?),
				ExecutionWeightLimit::Unlimited => WeightLimit::Unlimited,
			};
			instructions.push(Instruction::BuyExecution { fees, weight_limit });
		}

		if let Some((weight, call)) = self.transact {
			instructions.push(Instruction::Transact {
				origin_kind: OriginKind::SovereignAccount,
				require_weight_at_most: weight.try_into()?,
				call,
			});
		}

		if self.refund_surplus {
			instructions.push(Instruction::RefundSurplus);
		}

		if let Some(beneficiary) = self.deposit_beneficiary {
			instructions.push(Instruction::DepositAsset {
				assets: MultiAssetFilter::Wild(WildMultiAsset::AllCounted(1)),
				beneficiary: MultiLocation::account_x1(&beneficiary),
			});
		}

		Ok(VersionedXcm::V3(instructions))
	}
}
