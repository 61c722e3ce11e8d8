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

//! Messages of the schedules contract and of PSP22 token contracts.
//!
//! Messages are encoded the way ink! dispatches them: the 4-byte selector, which is the
//! prefix of `blake2_256` of the message label, followed by the SCALE-encoded arguments.

use crate::{
	calls::{ContractsCall, RuntimeCall},
	chain::ChainContext,
	error::Error,
	Result,
};
use codec::Encode;
use sp_crypto_hashing::blake2_256;
use xcm_payments_primitives::{
	address::decode_address,
	schedule::{ContractScheduleRecord, PaymentPlan},
	AccountId32, Balance, UnixTime, H256,
};

const LOG_TARGET: &str = "xcm-payments::contract";

/// Message of the schedules contract or of a PSP22 token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractMessage {
	/// Store a schedule executed by automation task `task_id`.
	SaveSchedule {
		/// Schedule identifier.
		id: H256,
		/// Automation task identifier.
		task_id: String,
		/// Receiver.
		recipient: AccountId32,
		/// Amount of every execution.
		amount: Balance,
		/// PSP22 token, `None` for the native token.
		token_address: Option<AccountId32>,
		/// Start time of recurring schedules.
		start_time: Option<UnixTime>,
		/// Interval of recurring schedules, in seconds.
		interval: Option<u64>,
		/// Execution times of fixed schedules.
		execution_times: Option<Vec<UnixTime>>,
	},
	/// Pay one execution of schedule `schedule_id`. Native payments carry the amount as value.
	TriggerPayment {
		/// Receiver.
		recipient: AccountId32,
		/// Amount.
		amount: Balance,
		/// PSP22 token, `None` for the native token.
		token_address: Option<AccountId32>,
		/// Schedule identifier.
		schedule_id: H256,
	},
	/// Remove a stored schedule.
	RemoveSchedule {
		/// Schedule identifier.
		schedule_id: H256,
	},
	/// Replace a stored schedule.
	UpdateSchedule {
		/// New record.
		record: ContractScheduleRecord,
	},
	/// `PSP22::increase_allowance` of the token contract.
	IncreaseAllowance {
		/// Account allowed to spend.
		spender: AccountId32,
		/// Allowance increase.
		delta_value: Balance,
	},
}

impl ContractMessage {
	/// `save_schedule` of `plan`.
	pub fn save_schedule(id: H256, task_id: String, plan: &PaymentPlan) -> Result<Self> {
		let (start_time, interval, execution_times) = plan.recurrence.to_parts();
		Ok(ContractMessage::SaveSchedule {
			id,
			task_id,
			recipient: decode_address(&plan.recipient)?,
			amount: plan.amount,
			token_address: token_account(plan)?,
			start_time,
			interval,
			execution_times,
		})
	}

	/// `trigger_payment` of one execution of `plan`.
	pub fn trigger_payment(schedule_id: H256, plan: &PaymentPlan) -> Result<Self> {
		Ok(ContractMessage::TriggerPayment {
			recipient: decode_address(&plan.recipient)?,
			amount: plan.amount,
			token_address: token_account(plan)?,
			schedule_id,
		})
	}

	/// Label the selector is derived from.
	pub fn label(&self) -> &'static str {
		match self {
			ContractMessage::SaveSchedule { .. } => "save_schedule",
			ContractMessage::TriggerPayment { .. } => "trigger_payment",
			ContractMessage::RemoveSchedule { .. } => "remove_schedule",
			ContractMessage::UpdateSchedule { .. } => "update_schedule",
			ContractMessage::IncreaseAllowance { .. } => "PSP22::increase_allowance",
		}
	}

	/// Selector of the message.
	pub fn selector(&self) -> [u8; 4] {
		let hash = blake2_256(self.label().as_bytes());
		[hash[0], hash[1], hash[2], hash[3]]
	}

	/// Selector followed by the encoded arguments.
	pub fn encode_input(&self) -> Vec<u8> {
		let mut input = self.selector().to_vec();
		match self {
			ContractMessage::SaveSchedule {
				id,
				task_id,
				recipient,
				amount,
				token_address,
				start_time,
				interval,
				execution_times,
			} => (id, task_id, recipient, amount, token_address, start_time, interval, execution_times)
				.encode_to(&mut input),
			ContractMessage::TriggerPayment { recipient, amount, token_address, schedule_id } =>
				(recipient, amount, token_address, schedule_id).encode_to(&mut input),
			ContractMessage::RemoveSchedule { schedule_id } => schedule_id.encode_to(&mut input),
			ContractMessage::UpdateSchedule { record } => record.encode_to(&mut input),
			ContractMessage::IncreaseAllowance { spender, delta_value } =>
				(spender, delta_value).encode_to(&mut input),
		}
		input
	}

	/// Value transferred to the contract with the message.
	pub fn transferred_value(&self) -> Balance {
		match self {
			ContractMessage::TriggerPayment { amount, token_address: None, .. } => *amount,
			_ => 0,
		}
	}
}

fn token_account(plan: &PaymentPlan) -> Result<Option<AccountId32>> {
	plan.token.contract_address().map(decode_address).transpose().map_err(Error::from)
}

/// `contracts.call` of `message` on `contract`, signed by `caller`.
///
/// The message is dry-run first and the call gets the gas the dry-run required.
pub async fn build_call(
	chain: &ChainContext,
	caller: &AccountId32,
	contract: &AccountId32,
	message: &ContractMessage,
) -> Result<RuntimeCall> {
	let connection = chain.connection()?;
	let input = message.encode_input();
	let value = message.transferred_value();

	let gas_limit = connection
		.contract_gas_required(caller, contract, value, &input)
		.await
		.map_err(|e| Error::ContractMessage { message: message.label(), reason: e.to_string() })?;
	log::debug!(
		target: LOG_TARGET,
		"{} on {contract}: input 0x{}, gas {gas_limit:?}",
		message.label(),
		hex::encode(&input),
	);

	Ok(RuntimeCall::Contracts(ContractsCall::Call {
		dest: contract.clone(),
		value,
		gas_limit,
		storage_deposit_limit: None,
		data: input,
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		chain::ChainSide,
		mock::{origin_chain, MockConnection, CONTRACT_GAS},
	};
	use assert_matches::assert_matches;
	use hex_literal::hex;
	use xcm_payments_primitives::{schedule::Recurrence, PaymentToken};

	const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
	const TOKEN: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

	fn plan(token: PaymentToken) -> PaymentPlan {
		PaymentPlan {
			recipient: BOB.into(),
			token,
			amount: 1_000,
			recurrence: Recurrence::Fixed { execution_times: vec![10, 20] },
		}
	}

	fn psp22() -> PaymentToken {
		PaymentToken { name: "NUSD".into(), address: Some(TOKEN.into()), decimals: Some(6), is_native: false }
	}

	#[test]
	fn selectors_are_label_hash_prefixes() {
		let id = H256::zero();
		let cases = [
			(ContractMessage::RemoveSchedule { schedule_id: id }, hex!("2762307d")),
			(
				ContractMessage::IncreaseAllowance { spender: AccountId32::from([0; 32]), delta_value: 0 },
				hex!("96d6b57a"),
			),
			(ContractMessage::trigger_payment(id, &plan(psp22())).unwrap(), hex!("4dca5058")),
			(
				ContractMessage::save_schedule(id, "t".into(), &plan(psp22())).unwrap(),
				hex!("1a227d84"),
			),
		];
		for (message, selector) in cases {
			assert_eq!(message.selector(), selector, "{}", message.label());
		}
	}

	#[test]
	fn arguments_follow_the_selector() {
		let remove = ContractMessage::RemoveSchedule { schedule_id: H256::repeat_byte(0x11) };
		let mut expected = hex!("2762307d").to_vec();
		expected.extend_from_slice(&[0x11; 32]);
		assert_eq!(remove.encode_input(), expected);

		let allowance =
			ContractMessage::IncreaseAllowance { spender: AccountId32::from([2; 32]), delta_value: 5 };
		let mut expected = hex!("96d6b57a").to_vec();
		expected.extend_from_slice(&[2; 32]);
		expected.extend_from_slice(&5u128.to_le_bytes());
		assert_eq!(allowance.encode_input(), expected);
	}

	#[test]
	fn save_schedule_carries_the_recurrence_parts() {
		let message = ContractMessage::save_schedule(H256::zero(), "task".into(), &plan(psp22())).unwrap();
		assert_matches!(
			message,
			ContractMessage::SaveSchedule {
				start_time: None,
				interval: None,
				execution_times: Some(ref times),
				token_address: Some(_),
				..
			} if times == &vec![10, 20]
		);
	}

	#[test]
	fn only_native_trigger_transfers_value() {
		let native = ContractMessage::trigger_payment(H256::zero(), &plan(PaymentToken::native("SBY", 18)))
			.unwrap();
		assert_eq!(native.transferred_value(), 1_000);

		let token = ContractMessage::trigger_payment(H256::zero(), &plan(psp22())).unwrap();
		assert_eq!(token.transferred_value(), 0);
		assert_eq!(ContractMessage::RemoveSchedule { schedule_id: H256::zero() }.transferred_value(), 0);
	}

	#[tokio::test]
	async fn call_uses_dry_run_gas() {
		let connection = MockConnection::new();
		let chain = origin_chain(&connection);
		let contract = AccountId32::from([9; 32]);
		let message = ContractMessage::trigger_payment(H256::zero(), &plan(PaymentToken::native("SBY", 18)))
			.unwrap();

		let call = build_call(&chain, &AccountId32::from([1; 32]), &contract, &message).await.unwrap();
		assert_eq!(
			call,
			RuntimeCall::Contracts(ContractsCall::Call {
				dest: contract,
				value: 1_000,
				gas_limit: CONTRACT_GAS,
				storage_deposit_limit: None,
				data: message.encode_input(),
			})
		);
	}

	#[tokio::test]
	async fn failed_dry_run_names_the_message() {
		let connection = MockConnection::new();
		connection.fail_queries();
		let chain = origin_chain(&connection);
		let message = ContractMessage::RemoveSchedule { schedule_id: H256::zero() };

		assert_matches!(
			build_call(&chain, &AccountId32::from([1; 32]), &AccountId32::from([9; 32]), &message).await,
			Err(Error::ContractMessage { message: "remove_schedule", .. })
		);

		let disconnected = ChainContext::new(ChainSide::Origin, chain.endpoint().clone());
		assert_matches!(
			build_call(&disconnected, &AccountId32::from([1; 32]), &AccountId32::from([9; 32]), &message)
				.await,
			Err(Error::ConnectionUnavailable(ChainSide::Origin))
		);
	}
}
