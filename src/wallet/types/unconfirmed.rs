// Copyright 2019 The Peridot Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::Transaction;

/// Outbound transaction we have submitted (or prepared for manual relay)
/// that has not yet appeared in a confirmed block.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct UnconfirmedOutbound {
	pub tx: Transaction,
	/// Change returning to us; counted as available balance because the
	/// sources already left the selectable supply
	pub change: u64,
	/// Unix time the transaction was handed to the daemon
	pub sent_time: u64,
	pub recipient: String,
	pub recipient_alias: String,
}
