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
use super::{
	AccountAddress, AccountKeys, ChachaIv, ChachaKey, Hash, KeyImage, KeyPair, PublicKey,
	SecretKey, Signature, Transaction, TxExtra,
};

/// One input of a transaction under construction: the ring members it may
/// reference and which of them is the real spend.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TxSourceEntry {
	/// Candidate ring members as (global output index, output key)
	pub outputs: Vec<(u64, PublicKey)>,
	/// Position of the real output within `outputs`
	pub real_output: usize,
	/// Tx public key of the transaction that created the real output
	pub real_out_tx_key: PublicKey,
	/// Position of the real output within its transaction's `vout`
	pub real_output_in_tx_index: usize,
	pub amount: u64,
	/// Index of the backing record in the wallet's transfer list, used to
	/// flip `spent` flags after submission
	pub transfer_index: usize,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TxDestinationEntry {
	pub amount: u64,
	pub addr: AccountAddress,
}

/// How amounts below the dust threshold are treated during output splitting.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TxDustPolicy {
	pub dust_threshold: u64,
	/// Fold dust into the fee instead of emitting a dust output
	pub add_to_fee: bool,
}

impl TxDustPolicy {
	pub fn new(dust_threshold: u64) -> TxDustPolicy {
		TxDustPolicy {
			dust_threshold,
			add_to_fee: true,
		}
	}
}

/// Everything the transaction constructor needs. Also the payload of the
/// unsigned-transfer file in the offline signing flow, hence serializable.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CreateTxArg {
	pub sources: Vec<TxSourceEntry>,
	pub destinations: Vec<TxDestinationEntry>,
	pub change_addr: AccountAddress,
	pub change_amount: u64,
	pub fake_outputs_count: u64,
	pub unlock_time: u64,
	pub extra: Vec<TxExtra>,
	pub dust_policy: TxDustPolicy,
	/// Spend key of the wallet the sources belong to; checked by the signing
	/// wallet in the offline flow
	pub spend_pub_key: PublicKey,
}

/// Output of the transaction constructor.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CreateTxRes {
	pub tx: Transaction,
	/// Per-transaction key pair; the secret half is retained to later prove
	/// payment
	pub tx_key: KeyPair,
}

/// Curve, hashing and ring-signature capability. The engine never touches
/// key material except through this trait.
pub trait CryptoProvider {
	/// Create a fresh account; returns the keys and the restore seed that
	/// regenerates them.
	fn generate_account(&self) -> (AccountKeys, Vec<u8>);

	/// Rebuild account keys from a restore seed.
	fn restore_account(&self, seed: &[u8]) -> Result<AccountKeys>;

	fn secret_to_public(&self, secret: &SecretKey) -> Result<PublicKey>;

	fn fast_hash(&self, data: &[u8]) -> Hash;

	fn generate_signature(
		&self,
		hash: &Hash,
		public: &PublicKey,
		secret: &SecretKey,
	) -> Result<Signature>;

	/// Scan a transaction's outputs for ones addressed to `keys`; returns
	/// the owned `vout` indices and their total amount.
	fn lookup_acc_outs(
		&self,
		keys: &AccountKeys,
		tx: &Transaction,
		tx_pub_key: &PublicKey,
	) -> Result<(Vec<usize>, u64)>;

	/// Derive the one-time ephemeral key pair and key image for the output
	/// at `out_index` of a transaction with the given public key.
	fn derive_key_image(
		&self,
		keys: &AccountKeys,
		tx_pub_key: &PublicKey,
		out_index: usize,
	) -> Result<(KeyPair, KeyImage)>;

	fn chacha_key_from_password(&self, password: &str) -> ChachaKey;

	fn chacha_key_from_secret(&self, secret: &SecretKey) -> ChachaKey;

	/// Stream-cipher the data; encryption and decryption are the same
	/// operation.
	fn chacha(&self, data: &[u8], key: &ChachaKey, iv: &ChachaIv) -> Vec<u8>;

	/// Assemble and ring-sign a transaction from prepared sources and
	/// destinations.
	fn construct_tx(&self, keys: &AccountKeys, arg: &CreateTxArg) -> Result<CreateTxRes>;
}
