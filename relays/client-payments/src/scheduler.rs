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

//! Scheduling of payments: estimation, funding, task creation, cancellation and update.
//!
//! A payment is executed by an automation task on the target chain. Every execution sends an
//! XCM back to the origin chain, where the origin proxy dispatches the payment on behalf of the
//! user. The task itself is created by an XCM sent from the origin chain, which makes the target
//! proxy call `automationTime` on behalf of the user.
//!
//! ```text
//! origin                                   target
//! user ---- polkadotXcm.send(create) ----> target proxy: scheduleXcmpTask
//!                                          <-- TaskScheduled(task_id)
//! user ---- batchAll[save_schedule]
//!      ...
//! origin proxy: proxy(user, trigger) <---- task execution
//! ```

use crate::{
	calls::{
		AssetPayment, AutomationInstructionSequence, AutomationTimeCall, BalancesCall,
		PolkadotXcmCall, RuntimeCall,
	},
	chain::{ChainSide, TaskScheduledEvent},
	config::{DeploymentMode, SchedulerConfig},
	contract::{self, ContractMessage},
	error::Error,
	events,
	fee::{FeeEstimation, FeeEstimator},
	proxy::TopUpBalances,
	session::Session,
	transaction, Result,
};
use xcm_payments_primitives::{
	address::decode_address,
	schedule::{generate_schedule_id, PaymentPlan, Recurrence},
	xcm::{ExecutionWeightLimit, MultiLocation, VersionedMultiLocation, XcmBuilder},
	AccountId32, Balance, PaymentToken, ScheduleConfiguration, SchedulePaymentIntent, UnixTime,
	H256,
};

const LOG_TARGET: &str = "xcm-payments::scheduler";

/// Task id used while estimating the `save_schedule` message, before the real one is known.
const PLACEHOLDER_TASK_ID: &str = "taskId";

/// Source of the current time.
pub trait Clock: Send + Sync {
	/// Milliseconds since the Unix epoch.
	fn now_millis(&self) -> u128;

	/// Seconds since the Unix epoch.
	fn now(&self) -> UnixTime {
		UnixTime::try_from(self.now_millis() / 1_000).unwrap_or(UnixTime::MAX)
	}
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now_millis(&self) -> u128 {
		std::time::SystemTime::now()
			.duration_since(std::time::UNIX_EPOCH)
			.map(|elapsed| elapsed.as_millis())
			.unwrap_or_default()
	}
}

/// Progress of the last flow driven by a [`PaymentScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulingState {
	/// Nothing estimated yet.
	Drafting,
	/// Calls are built and their fees estimated.
	FeesEstimated,
	/// Proxies hold enough funds.
	ProxiesFunded,
	/// The XCM creating the task is being submitted.
	TaskSubmittedToXcm,
	/// Waiting for the target chain to announce the task.
	AwaitingRemoteConfirmation,
	/// The task is scheduled and the follow-up calls are finalized.
	ScheduleSaved,
	/// An existing task is being cancelled.
	Cancelling,
	/// The task is cancelled and the schedule removed.
	Cancelled,
	/// An existing schedule is being replaced.
	Updating,
	/// The schedule has been replaced.
	Updated,
	/// The flow failed while in `stage`.
	Failed {
		/// Name of the state the flow failed in.
		stage: &'static str,
	},
}

impl SchedulingState {
	/// Name of the state.
	pub fn name(&self) -> &'static str {
		match self {
			SchedulingState::Drafting => "Drafting",
			SchedulingState::FeesEstimated => "FeesEstimated",
			SchedulingState::ProxiesFunded => "ProxiesFunded",
			SchedulingState::TaskSubmittedToXcm => "TaskSubmittedToXcm",
			SchedulingState::AwaitingRemoteConfirmation => "AwaitingRemoteConfirmation",
			SchedulingState::ScheduleSaved => "ScheduleSaved",
			SchedulingState::Cancelling => "Cancelling",
			SchedulingState::Cancelled => "Cancelled",
			SchedulingState::Updating => "Updating",
			SchedulingState::Updated => "Updated",
			SchedulingState::Failed { .. } => "Failed",
		}
	}
}

/// Calls and fees of a new payment, ready to be funded and submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPaymentSummary {
	/// Identifier of the schedule.
	pub schedule_id: H256,
	/// The payment.
	pub plan: PaymentPlan,
	/// `automationTime` call the target proxy dispatches to create the task.
	pub task_schedule_call: RuntimeCall,
	/// Origin fees paid by the user: pre-paid executions and the follow-up calls.
	pub origin_fee_estimation: Balance,
	/// Estimation of one execution on the origin chain.
	pub trigger_fee_estimation: FeeEstimation,
	/// Estimation of the task creation on the target chain.
	pub target_fee_estimation: FeeEstimation,
	/// Executions whose fees are pre-paid to the origin proxy.
	pub iterations_to_cover_fee_on_origin: u32,
	/// Top-ups the proxies need.
	pub top_up: TopUpBalances,
}

/// Schedule backed by a confirmed automation task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledPayment {
	/// Identifier of the schedule.
	pub schedule_id: H256,
	/// Identifier of the automation task.
	pub task_id: String,
}

/// Drives the payment flows of a session.
pub struct PaymentScheduler {
	config: SchedulerConfig,
	state: SchedulingState,
	clock: Box<dyn Clock>,
}

impl PaymentScheduler {
	/// Scheduler using the wall clock.
	pub fn new(config: SchedulerConfig) -> Self {
		Self::with_clock(config, Box::new(SystemClock))
	}

	/// Scheduler using `clock`.
	pub fn with_clock(config: SchedulerConfig, clock: Box<dyn Clock>) -> Self {
		Self { config, state: SchedulingState::Drafting, clock }
	}

	/// Configuration.
	pub fn config(&self) -> &SchedulerConfig {
		&self.config
	}

	/// State of the last flow.
	pub fn state(&self) -> SchedulingState {
		self.state
	}

	/// Validate a payment entered by the user.
	pub fn plan(&self, intent: &SchedulePaymentIntent) -> Result<PaymentPlan> {
		Ok(intent.validate(self.clock.now(), self.config.chains.origin.decimals)?)
	}

	/// Build the calls of a new payment and estimate what they cost.
	///
	/// A new schedule id is generated unless `schedule_id` is given. The session proxies must
	/// have been prepared, because the top-ups depend on their balances.
	pub async fn generate_extrinsics_and_estimate(
		&mut self,
		session: &Session,
		plan: &PaymentPlan,
		schedule_id: Option<H256>,
	) -> Result<NewPaymentSummary> {
		self.set_state(SchedulingState::Drafting);
		let result = self.draft(session, plan, schedule_id).await;
		let summary = self.track(result)?;
		self.set_state(SchedulingState::FeesEstimated);
		Ok(summary)
	}

	/// Fund the proxies with a single batch. Nothing is submitted if no top-up is needed.
	pub async fn top_up_accounts(
		&mut self,
		session: &Session,
		top_up: TopUpBalances,
	) -> Result<Option<H256>> {
		let result = submit_top_up(session, top_up).await;
		let block = self.track(result)?;
		self.set_state(SchedulingState::ProxiesFunded);
		Ok(block)
	}

	/// Create the automation task of `summary` and store the schedule once the target chain
	/// confirms the task.
	///
	/// A [`Error::ConfirmationTimeout`] means that the task may still be created later; the
	/// schedule is not stored in that case.
	pub async fn create_and_save_scheduled_payment(
		&mut self,
		session: &Session,
		summary: &NewPaymentSummary,
	) -> Result<ScheduledPayment> {
		let result = self.create_and_save(session, summary).await;
		let scheduled = self.track(result)?;
		self.set_state(SchedulingState::ScheduleSaved);
		Ok(scheduled)
	}

	/// Cancel the task of a schedule and remove the schedule, in one batch.
	pub async fn delete_scheduled_payment(
		&mut self,
		session: &Session,
		schedule_id: H256,
		task_id: &str,
	) -> Result<H256> {
		self.set_state(SchedulingState::Cancelling);
		let result = self.delete(session, schedule_id, task_id).await;
		let block = self.track(result)?;
		self.set_state(SchedulingState::Cancelled);
		Ok(block)
	}

	/// Replace the task of `record` by a task of the updated record.
	///
	/// Elapsed executions are dropped from the record first. `previous_amount` is the amount
	/// the token allowance has been granted for.
	pub async fn update_scheduled_payment(
		&mut self,
		session: &Session,
		record: ScheduleConfiguration,
		previous_amount: Balance,
	) -> Result<ScheduledPayment> {
		self.set_state(SchedulingState::Updating);
		let result = self.update(session, record, previous_amount).await;
		let scheduled = self.track(result)?;
		self.set_state(SchedulingState::Updated);
		Ok(scheduled)
	}

	fn set_state(&mut self, state: SchedulingState) {
		log::info!(target: LOG_TARGET, "Scheduling state: {} -> {}", self.state.name(), state.name());
		self.state = state;
	}

	fn track<T>(&mut self, result: Result<T>) -> Result<T> {
		if let Err(ref e) = result {
			let stage = self.state.name();
			log::warn!(target: LOG_TARGET, "Scheduling failed in {stage}: {e}");
			self.state = SchedulingState::Failed { stage };
		}
		result
	}

	async fn draft(
		&self,
		session: &Session,
		plan: &PaymentPlan,
		schedule_id: Option<H256>,
	) -> Result<NewPaymentSummary> {
		let user = session.account();
		let estimator = FeeEstimator::new(session.origin(), session.target());
		let schedule_id = schedule_id.unwrap_or_else(|| {
			generate_schedule_id(
				&plan.recipient,
				plan.amount,
				plan.payment_type(),
				self.clock.now_millis(),
			)
		});

		let trigger_call = RuntimeCall::via_proxy(
			user.clone(),
			self.payment_call(session, schedule_id, plan).await?,
		);
		let trigger_fee_estimation = estimator.estimate_origin(&trigger_call, user).await?;

		let save_fee = match self.schedules_contract()? {
			Some(contract) => {
				let message =
					ContractMessage::save_schedule(schedule_id, PLACEHOLDER_TASK_ID.into(), plan)?;
				let call = contract::build_call(session.origin(), user, &contract, &message).await?;
				estimator.estimate_origin(&call, user).await?.total_xcm_extrinsic_fee
			},
			None => 0,
		};

		let origin_asset = session.origin().endpoint().default_asset();
		let task_schedule_call = RuntimeCall::AutomationTime(
			AutomationTimeCall::ScheduleXcmpTaskThroughProxy {
				schedule: plan.recurrence.to_payment_schedule(),
				destination: VersionedMultiLocation::V3(origin_asset.clone()),
				schedule_fee: VersionedMultiLocation::V3(origin_asset.clone()),
				execution_fee: AssetPayment {
					asset_location: VersionedMultiLocation::V3(origin_asset),
					amount: trigger_fee_estimation.total_xcm_extrinsic_fee,
				},
				encoded_call: session.origin().connection()?.encode_call(&trigger_call)?,
				encoded_call_weight: trigger_fee_estimation.extrinsic_weight,
				overall_weight: trigger_fee_estimation.total_xcm_extrinsic_weight,
				instruction_sequence: AutomationInstructionSequence::PayThroughRemoteDerivativeAccount,
				schedule_as: user.clone(),
			},
		);
		let target_fee_estimation = estimator.estimate_target(&task_schedule_call, user).await?;

		let iterations_to_cover_fee_on_origin =
			plan.recurrence.iterations_to_cover_fee(self.config.recurring_fee_iterations);
		let origin_fees_via_proxy = trigger_fee_estimation
			.total_xcm_extrinsic_fee
			.checked_mul(iterations_to_cover_fee_on_origin.into())
			.ok_or(xcm_payments_primitives::Error::ArithmeticOverflow("pre-paid origin fees"))?;
		let origin_fee_estimation = origin_fees_via_proxy
			.checked_add(save_fee)
			.ok_or(xcm_payments_primitives::Error::ArithmeticOverflow("origin fees"))?;
		let top_up = session.calculate_total_top_up_balances(
			origin_fees_via_proxy,
			target_fee_estimation.total_xcm_extrinsic_fee,
		)?;

		log::debug!(
			target: LOG_TARGET,
			"Schedule {schedule_id:?}: {iterations_to_cover_fee_on_origin} pre-paid executions, \
			origin fees {origin_fee_estimation}, target fee {}, top-up {top_up:?}",
			target_fee_estimation.total_xcm_extrinsic_fee,
		);

		Ok(NewPaymentSummary {
			schedule_id,
			plan: plan.clone(),
			task_schedule_call,
			origin_fee_estimation,
			trigger_fee_estimation,
			target_fee_estimation,
			iterations_to_cover_fee_on_origin,
			top_up,
		})
	}

	async fn create_and_save(
		&mut self,
		session: &Session,
		summary: &NewPaymentSummary,
	) -> Result<ScheduledPayment> {
		let create_xcm = xcm_call(
			session,
			&summary.target_fee_estimation,
			&summary.task_schedule_call,
		)?;

		self.set_state(SchedulingState::TaskSubmittedToXcm);
		let task = self.submit_and_confirm(session, create_xcm).await?;

		let mut follow_up = Vec::new();
		if let Some(contract) = self.schedules_contract()? {
			let plan = &summary.plan;
			if let Some(token) = plan.token.contract_address() {
				let message =
					ContractMessage::IncreaseAllowance { spender: contract.clone(), delta_value: plan.amount };
				follow_up.push(
					contract::build_call(
						session.origin(),
						session.account(),
						&decode_address(token)?,
						&message,
					)
					.await?,
				);
			}
			let message = ContractMessage::save_schedule(summary.schedule_id, task.task_id.clone(), plan)?;
			follow_up
				.push(contract::build_call(session.origin(), session.account(), &contract, &message).await?);
		}
		submit_batch(session, follow_up).await?;

		Ok(ScheduledPayment { schedule_id: summary.schedule_id, task_id: task.task_id })
	}

	async fn delete(&self, session: &Session, schedule_id: H256, task_id: &str) -> Result<H256> {
		let mut calls = vec![cancel_xcm_call(session, task_id).await?];
		if let Some(contract) = self.schedules_contract()? {
			let message = ContractMessage::RemoveSchedule { schedule_id };
			calls.push(contract::build_call(session.origin(), session.account(), &contract, &message).await?);
		}
		transaction::sign_and_send(session.origin(), session.account(), RuntimeCall::batch_all(calls))
			.await
	}

	async fn update(
		&mut self,
		session: &Session,
		mut record: ScheduleConfiguration,
		previous_amount: Balance,
	) -> Result<ScheduledPayment> {
		let cancel_xcm = cancel_xcm_call(session, &record.task_id).await?;

		record.recurrence.advance_past(self.clock.now())?;
		if let Recurrence::Fixed { execution_times } = &record.recurrence {
			if execution_times.is_empty() {
				return Err(xcm_payments_primitives::Error::InvalidSchedule(
					"no execution time left".into(),
				)
				.into())
			}
		}

		let plan = record.to_plan(self.record_token(record.token_address.as_deref()));
		let summary = self.draft(session, &plan, Some(record.id)).await?;
		let create_xcm = xcm_call(
			session,
			&summary.target_fee_estimation,
			&summary.task_schedule_call,
		)?;
		submit_top_up(session, summary.top_up).await?;

		let task = self
			.submit_and_confirm(session, RuntimeCall::batch_all(vec![cancel_xcm, create_xcm]))
			.await?;
		record.task_id = task.task_id.clone();

		let mut follow_up = Vec::new();
		if let Some(contract) = self.schedules_contract()? {
			if let Some(token) = &record.token_address {
				if record.amount > previous_amount {
					let message = ContractMessage::IncreaseAllowance {
						spender: contract.clone(),
						delta_value: record.amount - previous_amount,
					};
					follow_up.push(
						contract::build_call(
							session.origin(),
							session.account(),
							&decode_address(token)?,
							&message,
						)
						.await?,
					);
				}
			}
			let message = ContractMessage::UpdateSchedule { record: record.to_contract_record()? };
			follow_up
				.push(contract::build_call(session.origin(), session.account(), &contract, &message).await?);
		}
		submit_batch(session, follow_up).await?;

		Ok(ScheduledPayment { schedule_id: record.id, task_id: task.task_id })
	}

	/// Submit `call` on the origin chain and wait for the task it creates on the target chain.
	///
	/// The subscription is opened before the submission, so the event can not be missed.
	async fn submit_and_confirm(
		&mut self,
		session: &Session,
		call: RuntimeCall,
	) -> Result<TaskScheduledEvent> {
		let identity = session.task_identity()?;
		let subscription = session.target().connection()?.subscribe_events().await?;

		transaction::sign_and_send(session.origin(), session.account(), call).await?;

		self.set_state(SchedulingState::AwaitingRemoteConfirmation);
		events::await_task_scheduled(
			subscription,
			ChainSide::Target,
			&identity,
			self.config.confirmation_timeout(),
		)
		.await
	}

	/// Call the origin proxy dispatches on every execution.
	async fn payment_call(
		&self,
		session: &Session,
		schedule_id: H256,
		plan: &PaymentPlan,
	) -> Result<RuntimeCall> {
		match self.schedules_contract()? {
			Some(contract) => {
				let message = ContractMessage::trigger_payment(schedule_id, plan)?;
				contract::build_call(session.origin(), session.account(), &contract, &message).await
			},
			None => {
				if !plan.token.is_native {
					return Err(Error::Config(format!(
						"direct transfers can not pay in {}",
						plan.token.name
					)))
				}
				Ok(RuntimeCall::Balances(BalancesCall::Transfer {
					dest: decode_address(&plan.recipient)?,
					value: plan.amount,
				}))
			},
		}
	}

	fn schedules_contract(&self) -> Result<Option<AccountId32>> {
		match &self.config.deployment {
			DeploymentMode::Contract { address } => Ok(Some(decode_address(address)?)),
			DeploymentMode::DirectTransfer => Ok(None),
		}
	}

	/// Token of a stored schedule. Tokens missing from the configuration are still PSP22 tokens.
	fn record_token(&self, address: Option<&str>) -> PaymentToken {
		match address {
			Some(address) => {
				let token = self.config.payment_token(Some(address));
				if token.is_native {
					PaymentToken {
						name: address.into(),
						address: Some(address.into()),
						decimals: None,
						is_native: false,
					}
				} else {
					token
				}
			},
			None => self.config.payment_token(None),
		}
	}
}

/// `polkadotXcm.send` of a message that makes the target proxy dispatch `call`.
///
/// The message withdraws the fee from the target proxy, buys the estimated weight, dispatches
/// the call, and returns what is left to the user.
fn xcm_call(session: &Session, fee: &FeeEstimation, call: &RuntimeCall) -> Result<RuntimeCall> {
	let origin_asset = session.origin().endpoint().default_asset();
	let encoded = session.target().connection()?.encode_call(call)?;
	let message = XcmBuilder::new()
		.add_withdraw_asset(origin_asset.clone(), fee.total_xcm_extrinsic_fee)
		.add_buy_execution(
			origin_asset,
			fee.total_xcm_extrinsic_fee,
			ExecutionWeightLimit::Limited(fee.total_xcm_extrinsic_weight),
		)
		.add_transact(fee.extrinsic_weight, encoded)
		.add_refund_surplus()
		.add_deposit_asset(session.account())
		.build()?;

	Ok(RuntimeCall::PolkadotXcm(PolkadotXcmCall::Send {
		dest: VersionedMultiLocation::V3(MultiLocation::parachain(
			session.target().endpoint().para_id,
		)),
		message,
	}))
}

/// XCM cancelling task `task_id` of the user.
async fn cancel_xcm_call(session: &Session, task_id: &str) -> Result<RuntimeCall> {
	let cancel = RuntimeCall::via_proxy(
		session.account().clone(),
		RuntimeCall::AutomationTime(AutomationTimeCall::CancelTaskWithScheduleAs {
			owner: session.target_proxy()?,
			task_id: task_id.into(),
		}),
	);
	let fee = FeeEstimator::new(session.origin(), session.target())
		.estimate_target(&cancel, session.account())
		.await?;
	xcm_call(session, &fee, &cancel)
}

async fn submit_top_up(session: &Session, top_up: TopUpBalances) -> Result<Option<H256>> {
	let calls = session.top_up_calls(top_up)?;
	if calls.is_empty() {
		log::debug!(target: LOG_TARGET, "Proxies hold enough funds");
		return Ok(None)
	}
	transaction::sign_and_send(session.origin(), session.account(), RuntimeCall::batch_all(calls))
		.await
		.map(Some)
}

async fn submit_batch(session: &Session, calls: Vec<RuntimeCall>) -> Result<Option<H256>> {
	if calls.is_empty() {
		return Ok(None)
	}
	transaction::sign_and_send(session.origin(), session.account(), RuntimeCall::batch_all(calls))
		.await
		.map(Some)
}
