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

use super::{Hash, KeyImage, PublicKey, Transaction, TxOutTarget};

/// One discovered incoming output the account controls.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TransferRecord {
	/// Height of the block the carrying transaction was mined in
	pub block_height: u64,
	/// Position of the output within `tx.vout`
	pub internal_output_index: usize,
	/// Chain-wide output id assigned by the node, needed for ring references
	pub global_output_index: u64,
	/// The carrying transaction, stored verbatim
	pub tx: Transaction,
	/// Set once an input revealing this output's key image is seen on chain
	pub spent: bool,
	pub key_image: KeyImage,
}

impl TransferRecord {
	pub fn amount(&self) -> u64 {
		self.tx.vout[self.internal_output_index].amount
	}

	pub fn out_key(&self) -> PublicKey {
		match self.tx.vout[self.internal_output_index].target {
			TxOutTarget::ToKey { key, .. } => key,
		}
	}

	pub fn mix_attr(&self) -> u8 {
		match self.tx.vout[self.internal_output_index].target {
			TxOutTarget::ToKey { mix_attr, .. } => mix_attr,
		}
	}
}

/// Input/output positions a transaction touched within our wallet, kept on
/// the history entry for display purposes.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TransferDetails {
	/// Indices into `tx.vout` received by this wallet
	pub receive_indices: Vec<usize>,
	/// Indices into `tx.vin` spending this wallet's outputs
	pub spent_indices: Vec<usize>,
}

/// User-facing record of one wallet-relevant transaction, confirmed or
/// pending. The confirmed log is append-only; reorgs are reconciled at query
/// time through the `height` field.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TransferInfo {
	pub tx_hash: Hash,
	/// Height of the containing block, 0 while unconfirmed
	pub height: u64,
	pub timestamp: u64,
	pub amount: u64,
	pub fee: u64,
	pub payment_id: Option<String>,
	pub is_income: bool,
	pub unlock_time: u64,
	pub tx_blob_size: u64,
	pub destinations: String,
	pub destination_alias: String,
	pub details: TransferDetails,
	pub tx: Transaction,
}

/// Filter for the paginated history query.
#[derive(Clone, Debug, Default)]
pub struct GetTransfersRequest {
	pub filter_by_height: bool,
	pub min_height: u64,
	pub max_height: u64,
	pub incoming: bool,
	pub outgoing: bool,
	pub pool: bool,
}

#[derive(Clone, Debug, Default)]
pub struct GetTransfersResponse {
	pub incoming: Vec<TransferInfo>,
	pub outgoing: Vec<TransferInfo>,
	pub pool: Vec<TransferInfo>,
}
