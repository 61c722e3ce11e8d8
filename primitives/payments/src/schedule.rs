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

//! Payment schedules: what the user asks for, what the automation pallet receives and what the
//! schedules contract stores.

use crate::{
	address::{decode_address, is_valid_address},
	balance::{convert_with_scientific_notation, parse_chain_integer},
	Balance, Error, Result, UnixTime, H256,
};
use codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use sp_core::crypto::AccountId32;
use sp_crypto_hashing::blake2_256;

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: u64 = 3_600;

/// Kind of a payment schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
	/// Payment executed at a list of given times.
	Fixed,
	/// Payment executed every `interval` seconds from a start time on.
	Recurring,
}

impl std::fmt::Display for PaymentType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			PaymentType::Fixed => f.write_str("Fixed"),
			PaymentType::Recurring => f.write_str("Recurring"),
		}
	}
}

/// Token a payment is made in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentToken {
	/// Display name.
	pub name: String,
	/// Address of the PSP22 contract, `None` for the native token.
	#[serde(default)]
	pub address: Option<String>,
	/// Decimals of the token. The origin chain decimals are used when absent.
	#[serde(default)]
	pub decimals: Option<u32>,
	/// Whether the token is the native token of the origin chain.
	pub is_native: bool,
}

impl PaymentToken {
	/// Native token of the origin chain.
	pub fn native(name: impl Into<String>, decimals: u32) -> Self {
		Self { name: name.into(), address: None, decimals: Some(decimals), is_native: true }
	}

	/// Address of the token contract, for non-native tokens only.
	pub fn contract_address(&self) -> Option<&str> {
		if self.is_native {
			None
		} else {
			self.address.as_deref()
		}
	}
}

/// Recurrence as entered by the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecurrenceIntent {
	/// Every `interval_hours` hours from `start_time` on.
	#[serde(rename_all = "camelCase")]
	Recurring {
		/// First execution.
		start_time: UnixTime,
		/// Hours between executions.
		interval_hours: u64,
	},
	/// At each of the given times.
	#[serde(rename_all = "camelCase")]
	Fixed {
		/// Execution times.
		execution_times: Vec<UnixTime>,
	},
}

/// Payment as entered by the user, before validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePaymentIntent {
	/// Receiver of every execution.
	pub recipient: String,
	/// Token to pay with.
	pub token: PaymentToken,
	/// Amount of every execution as a decimal number.
	pub amount: String,
	/// When to pay.
	pub recurrence: RecurrenceIntent,
}

impl SchedulePaymentIntent {
	/// Kind of the requested schedule.
	pub fn payment_type(&self) -> PaymentType {
		match self.recurrence {
			RecurrenceIntent::Recurring { .. } => PaymentType::Recurring,
			RecurrenceIntent::Fixed { .. } => PaymentType::Fixed,
		}
	}

	/// Check the intent and turn it into a payment plan.
	///
	/// The recipient must be a valid address, the amount must be positive once scaled to base
	/// units, and every execution must lie after `now`. Execution times must be strictly
	/// increasing and the interval must not be zero. The token decimals fall back to
	/// `default_decimals`.
	pub fn validate(&self, now: UnixTime, default_decimals: u32) -> Result<PaymentPlan> {
		if !is_valid_address(&self.recipient) {
			return Err(Error::InvalidAddress(self.recipient.clone()))
		}

		let decimals = self.token.decimals.unwrap_or(default_decimals);
		let amount = convert_with_scientific_notation(&self.amount, decimals)?;
		if amount == 0 {
			return Err(Error::InvalidAmount(self.amount.clone()))
		}

		let recurrence = match &self.recurrence {
			RecurrenceIntent::Recurring { start_time, interval_hours } => {
				if *interval_hours == 0 {
					return Err(Error::InvalidSchedule("interval must not be zero".into()))
				}
				if *start_time <= now {
					return Err(Error::InvalidSchedule("start time is in the past".into()))
				}
				let interval = interval_hours
					.checked_mul(SECONDS_PER_HOUR)
					.ok_or(Error::ArithmeticOverflow("schedule interval"))?;
				Recurrence::Recurring { start_time: *start_time, interval }
			},
			RecurrenceIntent::Fixed { execution_times } => {
				let Some(first) = execution_times.first() else {
					return Err(Error::InvalidSchedule("no execution times".into()))
				};
				if *first <= now {
					return Err(Error::InvalidSchedule("execution time is in the past".into()))
				}
				if execution_times.windows(2).any(|pair| pair[0] >= pair[1]) {
					return Err(Error::InvalidSchedule(
						"execution times are not strictly increasing".into(),
					))
				}
				Recurrence::Fixed { execution_times: execution_times.clone() }
			},
		};

		Ok(PaymentPlan {
			recipient: self.recipient.clone(),
			token: self.token.clone(),
			amount,
			recurrence,
		})
	}
}

/// Recurrence of a validated schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Recurrence {
	/// Every `interval` seconds from `start_time` on.
	#[serde(rename_all = "camelCase")]
	Recurring {
		/// Next execution.
		start_time: UnixTime,
		/// Seconds between executions.
		interval: u64,
	},
	/// At each of the given times.
	#[serde(rename_all = "camelCase")]
	Fixed {
		/// Execution times.
		execution_times: Vec<UnixTime>,
	},
}

impl Recurrence {
	/// Kind of the schedule.
	pub fn payment_type(&self) -> PaymentType {
		match self {
			Recurrence::Recurring { .. } => PaymentType::Recurring,
			Recurrence::Fixed { .. } => PaymentType::Fixed,
		}
	}

	/// Schedule parameter of the automation pallet.
	pub fn to_payment_schedule(&self) -> PaymentSchedule {
		match self {
			Recurrence::Recurring { start_time, interval } => PaymentSchedule::Recurring {
				next_execution_time: *start_time,
				frequency: *interval,
			},
			Recurrence::Fixed { execution_times } =>
				PaymentSchedule::Fixed { execution_times: execution_times.clone() },
		}
	}

	/// Number of executions whose fees are pre-paid on the origin chain.
	///
	/// Fixed schedules pay for every execution. Open-ended recurring schedules pay for
	/// `recurring_iterations`, which is an approximation and not derived from the interval.
	pub fn iterations_to_cover_fee(&self, recurring_iterations: u32) -> u32 {
		match self {
			Recurrence::Fixed { execution_times } =>
				u32::try_from(execution_times.len()).unwrap_or(u32::MAX),
			Recurrence::Recurring { .. } => recurring_iterations,
		}
	}

	/// Drop elapsed executions.
	///
	/// Fixed schedules keep the times that are not before `now`. Recurring schedules move the
	/// start time to the first interval boundary after `now`; a start time in the future is
	/// left untouched.
	pub fn advance_past(&mut self, now: UnixTime) -> Result<()> {
		match self {
			Recurrence::Fixed { execution_times } => {
				execution_times.retain(|time| *time >= now);
			},
			Recurrence::Recurring { start_time, interval } => {
				if *interval == 0 {
					return Err(Error::InvalidSchedule("interval must not be zero".into()))
				}
				let (start, step) = (*start_time, *interval);
				if start > now {
					return Ok(())
				}
				let elapsed_intervals = (now - start) / step;
				*start_time = elapsed_intervals
					.checked_add(1)
					.and_then(|intervals| intervals.checked_mul(step))
					.and_then(|offset| start.checked_add(offset))
					.ok_or(Error::ArithmeticOverflow("advanced start time"))?;
			},
		}
		Ok(())
	}

	/// Recurrence as the optional `(start_time, interval, execution_times)` triple the contract
	/// stores.
	pub fn to_parts(&self) -> (Option<UnixTime>, Option<u64>, Option<Vec<UnixTime>>) {
		match self {
			Recurrence::Recurring { start_time, interval } =>
				(Some(*start_time), Some(*interval), None),
			Recurrence::Fixed { execution_times } => (None, None, Some(execution_times.clone())),
		}
	}

	/// Inverse of [`Self::to_parts`]: exactly one of `execution_times` or the
	/// `(start_time, interval)` pair must be present.
	pub fn from_parts(
		start_time: Option<UnixTime>,
		interval: Option<u64>,
		execution_times: Option<Vec<UnixTime>>,
	) -> Result<Self> {
		match (start_time, interval, execution_times) {
			(Some(start_time), Some(interval), None) => {
				if interval == 0 {
					return Err(Error::InvalidSchedule("interval must not be zero".into()))
				}
				Ok(Recurrence::Recurring { start_time, interval })
			},
			(None, None, Some(execution_times)) => Ok(Recurrence::Fixed { execution_times }),
			(None, None, None) => Err(Error::InvalidSchedule("no recurrence".into())),
			(_, _, Some(_)) => Err(Error::InvalidSchedule(
				"both execution times and a recurring interval are set".into(),
			)),
			_ => Err(Error::InvalidSchedule(
				"start time and interval must be set together".into(),
			)),
		}
	}
}

/// Validated payment, with the amount in base units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentPlan {
	/// Receiver of every execution.
	pub recipient: String,
	/// Token to pay with.
	pub token: PaymentToken,
	/// Amount of every execution, in base units.
	pub amount: Balance,
	/// When to pay.
	pub recurrence: Recurrence,
}

impl PaymentPlan {
	/// Kind of the schedule.
	pub fn payment_type(&self) -> PaymentType {
		self.recurrence.payment_type()
	}
}

/// Schedule parameter of `automationTime` task calls.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum PaymentSchedule {
	/// Run at each of the given times.
	#[codec(index = 0)]
	Fixed {
		/// Execution times.
		execution_times: Vec<UnixTime>,
	},
	/// Run every `frequency` seconds from `next_execution_time` on.
	#[codec(index = 1)]
	Recurring {
		/// First execution.
		next_execution_time: UnixTime,
		/// Seconds between executions.
		frequency: u64,
	},
}

/// Identifier of a new schedule: `blake2_256` of the recipient, the amount, the type and the
/// creation time in milliseconds, concatenated as text.
pub fn generate_schedule_id(
	recipient: &str,
	amount: Balance,
	payment_type: PaymentType,
	now_millis: u128,
) -> H256 {
	let preimage = format!("{recipient}{amount}{payment_type}{now_millis}");
	H256::from(blake2_256(preimage.as_bytes()))
}

/// Schedule as stored by the schedules contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleConfiguration {
	/// Schedule identifier.
	pub id: H256,
	/// Identifier of the automation task that executes the schedule.
	pub task_id: String,
	/// Payer.
	pub sender: String,
	/// Receiver of every execution.
	pub recipient: String,
	/// Amount of every execution, in base units.
	pub amount: Balance,
	/// Token contract, `None` for the native token.
	pub token_address: Option<String>,
	/// Whether the schedule is active.
	pub enabled: bool,
	/// When to pay.
	pub recurrence: Recurrence,
}

impl ScheduleConfiguration {
	/// Payment plan of the stored schedule, paid with `token`.
	pub fn to_plan(&self, token: PaymentToken) -> PaymentPlan {
		PaymentPlan {
			recipient: self.recipient.clone(),
			token,
			amount: self.amount,
			recurrence: self.recurrence.clone(),
		}
	}

	/// SCALE form of the record accepted by the contract `update_schedule` message.
	pub fn to_contract_record(&self) -> Result<ContractScheduleRecord> {
		let (start_time, interval, execution_times) = self.recurrence.to_parts();
		Ok(ContractScheduleRecord {
			id: self.id,
			task_id: self.task_id.clone(),
			sender: decode_address(&self.sender)?,
			recipient: decode_address(&self.recipient)?,
			amount: self.amount,
			token_address: self.token_address.as_deref().map(decode_address).transpose()?,
			start_time,
			interval,
			execution_times,
			enabled: self.enabled,
		})
	}
}

/// Schedule record as the contract renders it back: numbers as text, possibly with digit
/// group separators, and the recurrence as independent optional fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScheduleConfiguration {
	/// `0x` prefixed schedule identifier.
	pub id: String,
	/// Automation task identifier.
	pub task_id: String,
	/// Payer.
	pub sender: String,
	/// Receiver.
	pub recipient: String,
	/// Amount in base units.
	pub amount: String,
	/// Token contract.
	#[serde(default)]
	pub token_address: Option<String>,
	/// Start time of recurring schedules.
	#[serde(default)]
	pub start_time: Option<String>,
	/// Interval of recurring schedules, in seconds.
	#[serde(default)]
	pub interval: Option<String>,
	/// Execution times of fixed schedules.
	#[serde(default)]
	pub execution_times: Option<Vec<String>>,
	/// Whether the schedule is active.
	pub enabled: bool,
}

impl TryFrom<RawScheduleConfiguration> for ScheduleConfiguration {
	type Error = Error;

	fn try_from(raw: RawScheduleConfiguration) -> Result<Self> {
		let id = parse_hash(&raw.id)?;
		let amount = parse_chain_integer(&raw.amount)?;
		let start_time = raw.start_time.as_deref().map(parse_timestamp).transpose()?;
		let interval = raw.interval.as_deref().map(parse_timestamp).transpose()?;
		let execution_times = raw
			.execution_times
			.map(|times| times.iter().map(|time| parse_timestamp(time)).collect::<Result<Vec<_>>>())
			.transpose()?;

		Ok(Self {
			id,
			task_id: raw.task_id,
			sender: raw.sender,
			recipient: raw.recipient,
			amount,
			token_address: raw.token_address.filter(|address| !address.is_empty()),
			enabled: raw.enabled,
			recurrence: Recurrence::from_parts(start_time, interval, execution_times)?,
		})
	}
}

fn parse_timestamp(value: &str) -> Result<u64> {
	u64::try_from(parse_chain_integer(value)?).map_err(|_| Error::InvalidInteger(value.into()))
}

fn parse_hash(value: &str) -> Result<H256> {
	let invalid = || Error::InvalidSchedule(format!("invalid schedule id {value}"));
	let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value)).map_err(|_| invalid())?;
	let raw: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;
	Ok(H256::from(raw))
}

/// SCALE layout of the contract `ScheduleConfiguration` struct.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ContractScheduleRecord {
	/// Schedule identifier.
	pub id: H256,
	/// Automation task identifier.
	pub task_id: String,
	/// Payer.
	pub sender: AccountId32,
	/// Receiver.
	pub recipient: AccountId32,
	/// Amount in base units.
	pub amount: Balance,
	/// Token contract.
	pub token_address: Option<AccountId32>,
	/// Start time of recurring schedules.
	pub start_time: Option<UnixTime>,
	/// Interval of recurring schedules, in seconds.
	pub interval: Option<u64>,
	/// Execution times of fixed schedules.
	pub execution_times: Option<Vec<UnixTime>>,
	/// Whether the schedule is active.
	pub enabled: bool,
}
