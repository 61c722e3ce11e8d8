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

//! Waiting for the automation chain to confirm a scheduled task.

use crate::{
	chain::{ChainEvent, ChainSide, EventSubscription, TaskScheduledEvent},
	error::Error,
	Result,
};
use futures::StreamExt;
use std::time::Duration;
use xcm_payments_primitives::AccountId32;

const LOG_TARGET: &str = "xcm-payments::events";

/// Accounts that identify the tasks scheduled for a user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskIdentity {
	/// Proxy of the user on the automation chain. Tasks sent over XCM are owned by it.
	pub owner: AccountId32,
	/// The user.
	pub schedule_as: AccountId32,
}

impl TaskIdentity {
	/// Returns true if the event announces a task owned by our proxy and scheduled for our user.
	pub fn matches(&self, event: &TaskScheduledEvent) -> bool {
		event.who == self.owner && event.schedule_as.as_ref() == Some(&self.schedule_as)
	}
}

/// Wait until `subscription` yields a `TaskScheduled` event of `identity`, for at most
/// `deadline`.
///
/// The subscription is consumed and dropped, which unsubscribes, whatever the outcome. Running
/// out of time yields [`Error::ConfirmationTimeout`].
pub async fn await_task_scheduled(
	subscription: EventSubscription,
	chain: ChainSide,
	identity: &TaskIdentity,
	deadline: Duration,
) -> Result<TaskScheduledEvent> {
	let wait_for_event = async move {
		let mut subscription = subscription;
		while let Some(events) = subscription.next().await {
			for event in events {
				let ChainEvent::TaskScheduled(task) = event else { continue };
				if identity.matches(&task) {
					log::info!(
						target: LOG_TARGET,
						"Task {} scheduled on the {chain} chain",
						task.task_id,
					);
					return Ok(task)
				}
				log::trace!(target: LOG_TARGET, "Ignoring task {} of {}", task.task_id, task.who);
			}
		}
		Err(Error::EventStreamClosed(chain))
	};

	match tokio::time::timeout(deadline, wait_for_event).await {
		Ok(result) => result,
		Err(_) => {
			log::warn!(
				target: LOG_TARGET,
				"No task confirmation from the {chain} chain within {deadline:?}",
			);
			Err(Error::ConfirmationTimeout { chain, waited: deadline })
		},
	}
}
