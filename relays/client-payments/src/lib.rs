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

//! Client of cross-chain scheduled payments.
//!
//! Payments are made on an Astar-family origin chain and triggered by automation tasks of the
//! Turing target chain. Both chains act on behalf of the user through derived proxy accounts,
//! which this client registers and funds. See [`scheduler::PaymentScheduler`] for the flows.

#![warn(missing_docs)]

pub mod calls;
pub mod chain;
pub mod config;
pub mod contract;
pub mod error;
pub mod events;
pub mod fee;
pub mod proxy;
pub mod scheduler;
pub mod session;
pub mod transaction;

#[cfg(test)]
mod mock;

pub use chain::{ChainConnection, ChainContext, ChainEndpoint, ChainSide};
pub use config::{DeploymentMode, Environment, SchedulerConfig};
pub use error::{Error, Result};
pub use fee::{FeeEstimation, FeeEstimator};
pub use scheduler::{NewPaymentSummary, PaymentScheduler, ScheduledPayment, SchedulingState};
pub use session::Session;
