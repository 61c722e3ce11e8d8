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

//! Runtime calls submitted by the payments client.
//!
//! Pallet and call indices differ between runtimes, so calls are kept symbolic here and
//! encoded by the [`ChainConnection`](crate::chain::ChainConnection) of the chain they are sent
//! to.

use crate::chain::ProxyType;
use xcm_payments_primitives::{
	schedule::PaymentSchedule,
	xcm::{EncodedCall, VersionedMultiAsset, VersionedMultiLocation, VersionedXcm, WeightLimit},
	AccountId32, Balance, Weight,
};

/// A call of one of the runtimes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeCall {
	/// `balances` pallet.
	Balances(BalancesCall),
	/// `xTokens` pallet.
	XTokens(XTokensCall),
	/// `proxy` pallet.
	Proxy(ProxyCall),
	/// `utility` pallet.
	Utility(UtilityCall),
	/// `polkadotXcm` pallet.
	PolkadotXcm(PolkadotXcmCall),
	/// `automationTime` pallet.
	AutomationTime(AutomationTimeCall),
	/// `contracts` pallet.
	Contracts(ContractsCall),
}

/// Calls of the `balances` pallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BalancesCall {
	/// Transfer native tokens.
	Transfer {
		/// Receiver.
		dest: AccountId32,
		/// Amount.
		value: Balance,
	},
}

/// Calls of the `xTokens` pallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XTokensCall {
	/// Transfer an asset to another chain.
	TransferMultiasset {
		/// Asset and amount.
		asset: VersionedMultiAsset,
		/// Receiver location.
		dest: VersionedMultiLocation,
		/// Weight limit of the execution on the receiving chain.
		dest_weight_limit: WeightLimit,
	},
}

/// Calls of the `proxy` pallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProxyCall {
	/// Register a delegate of the caller.
	AddProxy {
		/// Delegate account.
		delegate: AccountId32,
		/// Scope of the delegation.
		proxy_type: ProxyType,
		/// Announcement delay.
		delay: u32,
	},
	/// Dispatch `call` on behalf of `real`.
	Proxy {
		/// Account the caller is a delegate of.
		real: AccountId32,
		/// Scope required from the delegation.
		force_proxy_type: Option<ProxyType>,
		/// Dispatched call.
		call: Box<RuntimeCall>,
	},
}

/// Calls of the `utility` pallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UtilityCall {
	/// Dispatch all calls or none of them.
	BatchAll {
		/// Batched calls.
		calls: Vec<RuntimeCall>,
	},
}

/// Calls of the `polkadotXcm` pallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolkadotXcmCall {
	/// Send an XCM message.
	Send {
		/// Receiving chain.
		dest: VersionedMultiLocation,
		/// The message.
		message: VersionedXcm,
	},
}

/// How the automation task pays for its XCM execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutomationInstructionSequence {
	/// The sovereign account of the automation chain pays.
	PayThroughSovereignAccount,
	/// The derivative account of the task owner pays.
	PayThroughRemoteDerivativeAccount,
}

/// Fee paid for the execution of an automation task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPayment {
	/// Asset to pay with.
	pub asset_location: VersionedMultiLocation,
	/// Amount per execution.
	pub amount: Balance,
}

/// Calls of the `automationTime` pallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AutomationTimeCall {
	/// Schedule a task that sends `encoded_call` to `destination` on behalf of `schedule_as`.
	ScheduleXcmpTaskThroughProxy {
		/// When to run.
		schedule: PaymentSchedule,
		/// Chain the call is sent to.
		destination: VersionedMultiLocation,
		/// Asset the scheduling fee is paid with.
		schedule_fee: VersionedMultiLocation,
		/// Fee of every execution.
		execution_fee: AssetPayment,
		/// Call dispatched on `destination`.
		encoded_call: EncodedCall,
		/// Weight of `encoded_call`.
		encoded_call_weight: Weight,
		/// Weight of the whole XCM execution.
		overall_weight: Weight,
		/// Who pays the execution.
		instruction_sequence: AutomationInstructionSequence,
		/// Account the task acts for.
		schedule_as: AccountId32,
	},
	/// Cancel a task scheduled on behalf of `owner`.
	CancelTaskWithScheduleAs {
		/// Task owner.
		owner: AccountId32,
		/// Task identifier.
		task_id: String,
	},
}

/// Calls of the `contracts` pallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractsCall {
	/// Call a contract message.
	Call {
		/// Contract.
		dest: AccountId32,
		/// Value transferred with the call.
		value: Balance,
		/// Gas limit.
		gas_limit: Weight,
		/// Storage deposit limit, unlimited when `None`.
		storage_deposit_limit: Option<Balance>,
		/// Selector and SCALE-encoded arguments.
		data: Vec<u8>,
	},
}

impl RuntimeCall {
	/// `utility.batchAll(calls)`.
	pub fn batch_all(calls: Vec<RuntimeCall>) -> Self {
		RuntimeCall::Utility(UtilityCall::BatchAll { calls })
	}

	/// `proxy.proxy(real, Any, call)`: dispatch `call` through a delegation of `real`.
	pub fn via_proxy(real: AccountId32, call: RuntimeCall) -> Self {
		RuntimeCall::Proxy(ProxyCall::Proxy {
			real,
			force_proxy_type: Some(ProxyType::Any),
			call: Box::new(call),
		})
	}

	/// `pallet.call` name of the call, for logs.
	pub fn name(&self) -> &'static str {
		match self {
			RuntimeCall::Balances(BalancesCall::Transfer { .. }) => "balances.transfer",
			RuntimeCall::XTokens(XTokensCall::TransferMultiasset { .. }) =>
				"xTokens.transferMultiasset",
			RuntimeCall::Proxy(ProxyCall::AddProxy { .. }) => "proxy.addProxy",
			RuntimeCall::Proxy(ProxyCall::Proxy { .. }) => "proxy.proxy",
			RuntimeCall::Utility(UtilityCall::BatchAll { .. }) => "utility.batchAll",
			RuntimeCall::PolkadotXcm(PolkadotXcmCall::Send { .. }) => "polkadotXcm.send",
			RuntimeCall::AutomationTime(AutomationTimeCall::ScheduleXcmpTaskThroughProxy {
				..
			}) => "automationTime.scheduleXcmpTaskThroughProxy",
			RuntimeCall::AutomationTime(AutomationTimeCall::CancelTaskWithScheduleAs { .. }) =>
				"automationTime.cancelTaskWithScheduleAs",
			RuntimeCall::Contracts(ContractsCall::Call { .. }) => "contracts.call",
		}
	}

	/// Calls of a `utility.batchAll`, `None` for other calls.
	pub fn batched_calls(&self) -> Option<&[RuntimeCall]> {
		match self {
			RuntimeCall::Utility(UtilityCall::BatchAll { calls }) => Some(calls),
			_ => None,
		}
	}
}
