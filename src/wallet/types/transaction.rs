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

//! In-memory model of transactions and blocks. Wire parsing into and out of
//! these structures belongs to the `ChainCodec` capability.

use super::{Hash, KeyImage, PaymentId, PublicKey, Signature};

/// Spend of an on-chain output, referencing ring members by global index
/// offsets and revealing the output's key image.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TxInToKey {
	pub amount: u64,
	pub key_offsets: Vec<u64>,
	pub k_image: KeyImage,
}

/// Transaction input variants. Anything that is not a to-key spend is
/// matched explicitly and skipped by the scanning code.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TxIn {
	/// Coinbase input carrying the height of the block it rewards.
	Gen { height: u64 },
	/// Spend of a to-key output.
	ToKey(TxInToKey),
}

/// Output target variants.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TxOutTarget {
	ToKey {
		key: PublicKey,
		/// Ring-size admission attribute: 0 = no restriction, 1 = must be
		/// spent without decoys, n > 1 = ring of at least n.
		mix_attr: u8,
	},
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TxOut {
	pub amount: u64,
	pub target: TxOutTarget,
}

/// Entries of the transaction extra field.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TxExtra {
	PubKey(PublicKey),
	PaymentId(PaymentId),
	UserData(Vec<u8>),
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Transaction {
	pub version: u64,
	/// Minimum block height (if below the max block number) or Unix time
	/// before the outputs of this transaction may be spent.
	pub unlock_time: u64,
	pub vin: Vec<TxIn>,
	pub vout: Vec<TxOut>,
	pub extra: Vec<TxExtra>,
	pub signatures: Vec<Vec<Signature>>,
}

impl Transaction {
	/// A coinbase transaction has a single generation input.
	pub fn is_coinbase(&self) -> bool {
		match self.vin.first() {
			Some(TxIn::Gen { .. }) => self.vin.len() == 1,
			_ => false,
		}
	}

	/// Sum of all output amounts.
	pub fn outs_amount(&self) -> u64 {
		self.vout.iter().map(|o| o.amount).sum()
	}

	/// Sum of all to-key input amounts; generation inputs carry none.
	pub fn ins_amount(&self) -> u64 {
		self.vin
			.iter()
			.map(|i| match i {
				TxIn::ToKey(ref itk) => itk.amount,
				TxIn::Gen { .. } => 0,
			})
			.sum()
	}
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Block {
	pub major_version: u8,
	pub minor_version: u8,
	pub timestamp: u64,
	pub prev_id: Hash,
	pub nonce: u64,
	pub miner_tx: Transaction,
	pub tx_hashes: Vec<Hash>,
}

impl Block {
	/// Height recorded in the generation input of the miner transaction.
	pub fn height(&self) -> u64 {
		match self.miner_tx.vin.first() {
			Some(TxIn::Gen { height }) => *height,
			_ => 0,
		}
	}
}

/// Whether an output with the given mix attribute may enter a ring with
/// `fake_outputs_count` decoys.
pub fn is_mix_attr_compatible(mix_attr: u8, fake_outputs_count: u64) -> bool {
	if mix_attr == 1 {
		fake_outputs_count == 0
	} else if mix_attr > 1 {
		fake_outputs_count + 1 >= u64::from(mix_attr)
	} else {
		true
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn to_key_in(amount: u64) -> TxIn {
		TxIn::ToKey(TxInToKey {
			amount,
			key_offsets: vec![0],
			k_image: KeyImage::null(),
		})
	}

	#[test]
	fn coinbase_detection() {
		let mut tx = Transaction::default();
		tx.vin.push(TxIn::Gen { height: 7 });
		assert!(tx.is_coinbase());
		tx.vin.push(to_key_in(10));
		assert!(!tx.is_coinbase());
	}

	#[test]
	fn amount_sums_skip_gen_inputs() {
		let mut tx = Transaction::default();
		tx.vin.push(TxIn::Gen { height: 1 });
		tx.vin.push(to_key_in(25));
		tx.vin.push(to_key_in(75));
		tx.vout.push(TxOut {
			amount: 90,
			target: TxOutTarget::ToKey {
				key: PublicKey::null(),
				mix_attr: 0,
			},
		});
		assert_eq!(100, tx.ins_amount());
		assert_eq!(90, tx.outs_amount());
	}

	#[test]
	fn mix_attr_admission() {
		// unrestricted
		assert!(is_mix_attr_compatible(0, 0));
		assert!(is_mix_attr_compatible(0, 10));
		// forced no-mix
		assert!(is_mix_attr_compatible(1, 0));
		assert!(!is_mix_attr_compatible(1, 3));
		// minimum ring size
		assert!(!is_mix_attr_compatible(4, 2));
		assert!(is_mix_attr_compatible(4, 3));
		assert!(is_mix_attr_compatible(4, 9));
	}
}
