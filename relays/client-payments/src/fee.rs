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

//! Weight and fee estimation of transactions on both chains.

use crate::{
	calls::RuntimeCall,
	chain::{ChainContext, ChainSide},
	error::Error,
	Result,
};
use sp_core::U256;
use xcm_payments_primitives::{AccountId32, Balance, Weight};

const LOG_TARGET: &str = "xcm-payments::fee";

/// Picoseconds in one second: `ref_time` is measured in picoseconds, fee rates per second.
const PICOSECONDS_PER_SECOND: u128 = 1_000_000_000_000;

/// Origin chain estimates are multiplied by `SAFETY_NUMERATOR / SAFETY_DENOMINATOR` to absorb
/// weight drift until execution.
const SAFETY_NUMERATOR: u128 = 3;
const SAFETY_DENOMINATOR: u128 = 2;

/// Weight and fee of a transaction that is executed through XCM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeEstimation {
	/// Weight of the transaction itself.
	pub extrinsic_weight: Weight,
	/// Weight of the transaction and of the XCM instructions that deliver it.
	pub total_xcm_extrinsic_weight: Weight,
	/// Fee of `total_xcm_extrinsic_weight`.
	pub total_xcm_extrinsic_fee: Balance,
}

/// Estimates fees of calls on the chains of a session.
pub struct FeeEstimator<'a> {
	origin: &'a ChainContext,
	target: &'a ChainContext,
}

impl<'a> FeeEstimator<'a> {
	/// Create an estimator for the given chain pair.
	pub fn new(origin: &'a ChainContext, target: &'a ChainContext) -> Self {
		Self { origin, target }
	}

	/// Estimate `call`, signed by `signer`, on `side`.
	pub async fn estimate(
		&self,
		side: ChainSide,
		call: &RuntimeCall,
		signer: &AccountId32,
	) -> Result<FeeEstimation> {
		match side {
			ChainSide::Origin => self.estimate_origin(call, signer).await,
			ChainSide::Target => self.estimate_target(call, signer).await,
		}
	}

	/// Origin estimate: fee from the runtime weight-to-fee function, every field scaled by 1.5.
	pub async fn estimate_origin(
		&self,
		call: &RuntimeCall,
		signer: &AccountId32,
	) -> Result<FeeEstimation> {
		let connection = self.origin.connection()?;
		let (extrinsic_weight, total_weight) =
			self.weights(self.origin, self.target, call, signer).await?;
		let fee = connection.query_weight_to_fee(total_weight).await?;

		let estimation = FeeEstimation {
			extrinsic_weight: extrinsic_weight.scale_ratio(SAFETY_NUMERATOR, SAFETY_DENOMINATOR)?,
			total_xcm_extrinsic_weight: total_weight
				.scale_ratio(SAFETY_NUMERATOR, SAFETY_DENOMINATOR)?,
			total_xcm_extrinsic_fee: fee
				.checked_mul(SAFETY_NUMERATOR)
				.ok_or(xcm_payments_primitives::Error::ArithmeticOverflow("origin fee"))? /
				SAFETY_DENOMINATOR,
		};
		log::debug!(target: LOG_TARGET, "{} on the origin chain: {estimation:?}", call.name());
		Ok(estimation)
	}

	/// Target estimate: fee from the rate the target registered for the origin asset. Unscaled.
	pub async fn estimate_target(
		&self,
		call: &RuntimeCall,
		signer: &AccountId32,
	) -> Result<FeeEstimation> {
		let connection = self.target.connection()?;
		let (extrinsic_weight, total_weight) =
			self.weights(self.target, self.origin, call, signer).await?;

		let asset_id = self.target.asset_id_of(&self.origin.endpoint().default_asset()).await?;
		let fee_per_second = connection
			.asset_metadata(asset_id)
			.await?
			.and_then(|metadata| metadata.fee_per_second)
			.ok_or(Error::FeeRateUnavailable { chain: ChainSide::Target, asset_id })?;

		let estimation = FeeEstimation {
			extrinsic_weight,
			total_xcm_extrinsic_weight: total_weight,
			total_xcm_extrinsic_fee: fee_of_ref_time(total_weight.ref_time, fee_per_second)?,
		};
		log::debug!(target: LOG_TARGET, "{} on the target chain: {estimation:?}", call.name());
		Ok(estimation)
	}

	/// Weight of `call` on `chain`, alone and with the instructions `other` needs to act on it.
	async fn weights(
		&self,
		chain: &ChainContext,
		other: &ChainContext,
		call: &RuntimeCall,
		signer: &AccountId32,
	) -> Result<(Weight, Weight)> {
		let extrinsic_weight = chain.connection()?.payment_info(call, signer).await?;
		let overhead = chain
			.endpoint()
			.xcm_instruction_weight
			.scale(other.endpoint().xcm_instructions_count.into())?;
		Ok((extrinsic_weight, extrinsic_weight.add(&overhead)?))
	}
}

/// `ref_time * fee_per_second / 10^12`, rounded down.
fn fee_of_ref_time(ref_time: u128, fee_per_second: Balance) -> Result<Balance> {
	let fee = U256::from(ref_time) * U256::from(fee_per_second) / U256::from(PICOSECONDS_PER_SECOND);
	Balance::try_from(fee)
		.map_err(|_| xcm_payments_primitives::Error::ArithmeticOverflow("target fee").into())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		calls::BalancesCall,
		chain::AssetMetadata,
		mock::{origin_chain, target_chain, MockConnection},
	};
	use assert_matches::assert_matches;

	fn call() -> RuntimeCall {
		RuntimeCall::Balances(BalancesCall::Transfer { dest: AccountId32::from([2; 32]), value: 1 })
	}

	fn signer() -> AccountId32 {
		AccountId32::from([1; 32])
	}

	#[tokio::test]
	async fn origin_estimate_adds_target_instructions_and_margin() {
		let origin_connection = MockConnection::new();
		let target_connection = MockConnection::new();
		origin_connection.set_call_weight("balances.transfer", Weight::from_parts(1_000, 100));
		origin_connection.set_fee_per_ref_time(2);
		let origin = origin_chain(&origin_connection);
		let target = target_chain(&target_connection);

		let estimation =
			FeeEstimator::new(&origin, &target).estimate(ChainSide::Origin, &call(), &signer()).await.unwrap();

		// origin instruction weight (10^9, 65_536) times the 4 target instructions
		let total = Weight::from_parts(4_000_001_000, 262_244);
		assert_eq!(
			estimation,
			FeeEstimation {
				extrinsic_weight: Weight::from_parts(1_500, 150),
				total_xcm_extrinsic_weight: total.scale_ratio(3, 2).unwrap(),
				total_xcm_extrinsic_fee: total.ref_time * 2 * 3 / 2,
			}
		);
		assert!(estimation.total_xcm_extrinsic_weight.all_gte(&estimation.extrinsic_weight));
		assert_matches!(
			total.scale_ratio(SAFETY_NUMERATOR, 0),
			Err(xcm_payments_primitives::Error::ArithmeticOverflow("weight ratio"))
		);
	}

	#[tokio::test]
	async fn target_estimate_uses_registered_rate_unscaled() {
		let origin_connection = MockConnection::new();
		let target_connection = MockConnection::new();
		target_connection.set_call_weight("balances.transfer", Weight::from_parts(500_000_000, 10));
		let origin = origin_chain(&origin_connection);
		let target = target_chain(&target_connection);
		target_connection.register_asset(origin.endpoint().default_asset(), 3, AssetMetadata {
			decimals: 18,
			fee_per_second: Some(416_000_000_000),
		});

		let estimation =
			FeeEstimator::new(&origin, &target).estimate(ChainSide::Target, &call(), &signer()).await.unwrap();

		// target instruction weight (10^9, 0) times the 6 origin instructions
		let total = Weight::from_parts(6_500_000_000, 10);
		assert_eq!(estimation.extrinsic_weight, Weight::from_parts(500_000_000, 10));
		assert_eq!(estimation.total_xcm_extrinsic_weight, total);
		assert_eq!(estimation.total_xcm_extrinsic_fee, 6_500_000_000 * 416_000_000_000 / 1_000_000_000_000);
	}

	#[tokio::test]
	async fn target_estimate_never_falls_back_to_zero() {
		let origin_connection = MockConnection::new();
		let target_connection = MockConnection::new();
		let origin = origin_chain(&origin_connection);
		let target = target_chain(&target_connection);
		let estimator = FeeEstimator::new(&origin, &target);

		assert_matches!(
			estimator.estimate_target(&call(), &signer()).await,
			Err(Error::AssetNotRegistered { chain: ChainSide::Target, .. })
		);

		target_connection.register_asset(origin.endpoint().default_asset(), 3, AssetMetadata {
			decimals: 18,
			fee_per_second: None,
		});
		assert_matches!(
			estimator.estimate_target(&call(), &signer()).await,
			Err(Error::FeeRateUnavailable { chain: ChainSide::Target, asset_id: 3 })
		);
	}

	#[tokio::test]
	async fn failing_queries_reject_the_estimation() {
		let origin_connection = MockConnection::new();
		let target_connection = MockConnection::new();
		origin_connection.fail_queries();
		let origin = origin_chain(&origin_connection);
		let target = target_chain(&target_connection);

		assert_matches!(
			FeeEstimator::new(&origin, &target).estimate_origin(&call(), &signer()).await,
			Err(Error::Query { .. })
		);

		let disconnected = ChainContext::new(ChainSide::Origin, origin.endpoint().clone());
		assert_matches!(
			FeeEstimator::new(&disconnected, &target).estimate_origin(&call(), &signer()).await,
			Err(Error::ConnectionUnavailable(ChainSide::Origin))
		);
	}

	#[test]
	fn target_fee_is_computed_without_intermediate_overflow() {
		assert_eq!(fee_of_ref_time(u128::MAX, PICOSECONDS_PER_SECOND).unwrap(), u128::MAX);
		assert_matches!(
			fee_of_ref_time(u128::MAX, PICOSECONDS_PER_SECOND * 2),
			Err(Error::Primitives(_))
		);
		assert_eq!(fee_of_ref_time(999_999_999_999, 1).unwrap(), 0);
	}
}
