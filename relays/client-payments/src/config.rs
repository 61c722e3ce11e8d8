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

//! Scheduler configuration and built-in chain presets.

use crate::{chain::ChainEndpoint, error::Error, Result};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use xcm_payments_primitives::{address::is_valid_address, schedule::PaymentToken, Weight};

/// Default time we wait for the automation chain to confirm a scheduled task.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 300;

/// Default number of executions whose fees are pre-paid for open-ended recurring schedules.
pub const DEFAULT_RECURRING_FEE_ITERATIONS: u32 = 10;

/// XCM instruction weight of the origin presets.
const ORIGIN_INSTRUCTION_WEIGHT: Weight = Weight::from_parts(1_000_000_000, 65_536);
/// XCM instruction weight of the target presets.
const TARGET_INSTRUCTION_WEIGHT: Weight = Weight::from_parts(1_000_000_000, 0);

/// Deployment the chain presets are taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	/// Local zombienet network.
	Development,
	/// Rococo test network.
	Testing,
	/// Kusama network.
	Kusama,
}

impl FromStr for Environment {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_lowercase().as_str() {
			"dev" | "development" => Ok(Environment::Development),
			"testing" => Ok(Environment::Testing),
			"kusama" => Ok(Environment::Kusama),
			_ => Err(Error::Config(format!("unknown environment: {s}"))),
		}
	}
}

impl Environment {
	/// Chains of the environment.
	pub fn chains(self) -> ChainPair {
		let (origin_name, origin_para_id, origin_rpc, target_name, target_rpc) = match self {
			Environment::Development =>
				("Shibuya", 2000, "ws://127.0.0.1:9948", "Turing Dev", "ws://127.0.0.1:9946"),
			Environment::Testing => (
				"Rocstar",
				2006,
				"wss://rocstar.astar.network",
				"Turing Staging",
				"wss://rpc.turing-staging.oak.tech",
			),
			Environment::Kusama => (
				"Shiden",
				2007,
				"wss://rpc.shiden.astar.network",
				"Turing",
				"wss://rpc.turing.oak.tech",
			),
		};

		ChainPair {
			origin: ChainEndpoint {
				name: origin_name.into(),
				para_id: origin_para_id,
				ss58_prefix: 5,
				decimals: 18,
				xcm_instruction_weight: ORIGIN_INSTRUCTION_WEIGHT,
				xcm_instructions_count: 6,
				rpc_url: origin_rpc.into(),
			},
			target: ChainEndpoint {
				name: target_name.into(),
				para_id: 2114,
				ss58_prefix: 51,
				decimals: 10,
				xcm_instruction_weight: TARGET_INSTRUCTION_WEIGHT,
				xcm_instructions_count: 4,
				rpc_url: target_rpc.into(),
			},
		}
	}
}

/// Origin and target chains of a deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPair {
	/// Chain of the user and of the schedules contract.
	pub origin: ChainEndpoint,
	/// Chain running the automation tasks.
	pub target: ChainEndpoint,
}

/// What the automation task calls on the origin chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum DeploymentMode {
	/// The proxy calls `triggerPayment` of the schedules contract, which also stores the
	/// schedules.
	Contract {
		/// Address of the schedules contract.
		address: String,
	},
	/// The proxy transfers native tokens directly. Schedules are not stored anywhere.
	DirectTransfer,
}

/// Configuration of the [`PaymentScheduler`](crate::scheduler::PaymentScheduler).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
	/// Chains of the deployment.
	pub chains: ChainPair,
	/// What the scheduled task executes.
	pub deployment: DeploymentMode,
	/// Non-native tokens payments can be made in.
	#[serde(default)]
	pub payment_tokens: Vec<PaymentToken>,
	/// Seconds to wait for the task confirmation.
	#[serde(default = "default_confirmation_timeout_secs")]
	pub confirmation_timeout_secs: u64,
	/// Executions pre-paid for recurring schedules.
	#[serde(default = "default_recurring_fee_iterations")]
	pub recurring_fee_iterations: u32,
}

fn default_confirmation_timeout_secs() -> u64 {
	DEFAULT_CONFIRMATION_TIMEOUT_SECS
}

fn default_recurring_fee_iterations() -> u32 {
	DEFAULT_RECURRING_FEE_ITERATIONS
}

impl SchedulerConfig {
	/// Configuration with the chain presets of `environment`.
	pub fn for_environment(environment: Environment, deployment: DeploymentMode) -> Self {
		Self {
			chains: environment.chains(),
			deployment,
			payment_tokens: Vec::new(),
			confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
			recurring_fee_iterations: DEFAULT_RECURRING_FEE_ITERATIONS,
		}
	}

	/// Parse and validate a JSON configuration.
	pub fn from_json(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Check values that serde can not.
	pub fn validate(&self) -> Result<()> {
		if let DeploymentMode::Contract { address } = &self.deployment {
			if !is_valid_address(address) {
				return Err(Error::Config(format!("invalid contract address: {address}")))
			}
		}
		if self.chains.origin.para_id == self.chains.target.para_id {
			return Err(Error::Config("origin and target chains must differ".into()))
		}
		if self.confirmation_timeout_secs == 0 {
			return Err(Error::Config("confirmation timeout must not be zero".into()))
		}
		if self.recurring_fee_iterations == 0 {
			return Err(Error::Config("recurring fee iterations must not be zero".into()))
		}
		Ok(())
	}

	/// How long to wait for the task confirmation.
	pub fn confirmation_timeout(&self) -> Duration {
		Duration::from_secs(self.confirmation_timeout_secs)
	}

	/// Token with contract address `address`, native token of the origin chain otherwise.
	pub fn payment_token(&self, address: Option<&str>) -> PaymentToken {
		address
			.and_then(|address| {
				self.payment_tokens
					.iter()
					.find(|token| token.address.as_deref() == Some(address))
					.cloned()
			})
			.unwrap_or_else(|| {
				PaymentToken::native(self.chains.origin.name.clone(), self.chains.origin.decimals)
			})
	}
}
