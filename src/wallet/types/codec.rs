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

use crate::common::Result;
use super::{AccountAddress, Block, Hash, PaymentId, PublicKey, Transaction, TxExtra};

/// Wire-format capability: parsing, serialization and hashing of chain
/// objects, plus the chain parameters the engine cannot derive itself.
/// The extra-field helpers are defaulted over the structured extra entries.
pub trait ChainCodec {
	fn parse_block(&self, blob: &[u8]) -> Result<Block>;

	fn parse_tx(&self, blob: &[u8]) -> Result<Transaction>;

	fn tx_to_blob(&self, tx: &Transaction) -> Vec<u8>;

	fn tx_hash(&self, tx: &Transaction) -> Hash;

	fn block_hash(&self, block: &Block) -> Hash;

	/// The well-known first block of the chain.
	fn generate_genesis_block(&self) -> Block;

	/// Canonical textual form of an address.
	fn address_to_str(&self, address: &AccountAddress) -> String;

	fn tx_blob_size(&self, tx: &Transaction) -> u64 {
		self.tx_to_blob(tx).len() as u64
	}

	/// Fee is whatever the inputs carry beyond the outputs; coinbase
	/// transactions pay none.
	fn get_tx_fee(&self, tx: &Transaction) -> u64 {
		tx.ins_amount().saturating_sub(tx.outs_amount())
	}

	fn tx_pub_key_from_extra(&self, tx: &Transaction) -> Option<PublicKey> {
		tx.extra.iter().find_map(|e| match e {
			TxExtra::PubKey(key) => Some(*key),
			_ => None,
		})
	}

	fn payment_id_from_extra(&self, tx: &Transaction) -> Option<PaymentId> {
		tx.extra.iter().find_map(|e| match e {
			TxExtra::PaymentId(pid) => Some(pid.clone()),
			_ => None,
		})
	}
}
