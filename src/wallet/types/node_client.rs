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
use super::Hash;

/// Status a healthy daemon reports on success.
pub const STATUS_OK: &str = "OK";
/// Status a syncing or overloaded daemon reports; treated as transient.
pub const STATUS_BUSY: &str = "BUSY";

/// One block as shipped by the daemon: the block blob plus the blobs of the
/// non-miner transactions it contains.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BlockCompleteEntry {
	pub block: Vec<u8>,
	pub txs: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GetBlocksResponse {
	/// Height of the first returned block; always a block the daemon believes
	/// the wallet already has
	pub start_height: u64,
	pub blocks: Vec<BlockCompleteEntry>,
	pub status: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OutputIndexesResponse {
	/// Chain-global index of every output of the queried transaction, in
	/// `vout` order
	pub o_indexes: Vec<u64>,
	pub status: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeInfoResponse {
	pub current_blocks_median: u64,
	pub status: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TxPoolResponse {
	pub txs: Vec<Vec<u8>>,
	pub status: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AliasResponse {
	pub alias: String,
	pub status: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatusResponse {
	pub status: String,
}

/// Encapsulates all wallet-node communication. Nothing inside the engine
/// cares about transport details; implementations map transport failures to
/// `ErrorKind::NoConnection`, while non-OK statuses are returned verbatim for
/// the engine to interpret.
pub trait NodeClient {
	/// Fetch blocks following the most recent locator hash the daemon
	/// recognizes.
	fn get_blocks_fast(&self, block_ids: &[Hash]) -> Result<GetBlocksResponse>;

	/// Fetch the chain-global output indexes of a transaction.
	fn get_tx_global_output_indexes(&self, tx_hash: &Hash) -> Result<OutputIndexesResponse>;

	/// Fetch current chain info; the wallet only consumes the block median.
	fn get_info(&self) -> Result<NodeInfoResponse>;

	/// Snapshot the daemon's transaction pool.
	fn get_tx_pool(&self) -> Result<TxPoolResponse>;

	/// Submit a freshly built transaction.
	fn send_raw_tx(&self, tx_as_hex: &str) -> Result<StatusResponse>;

	/// Ask the daemon to rebroadcast already-submitted transactions.
	fn relay_txs(&self, raw_txs: &[String]) -> Result<StatusResponse>;

	/// Resolve the alias registered for an address, if any.
	fn get_aliases_by_address(&self, address: &str) -> Result<AliasResponse>;

	/// Verify a text signature against the key registered for an address.
	fn validate_signed_text(
		&self,
		address: &str,
		signature_hex: &str,
		text: &str,
	) -> Result<StatusResponse>;
}
