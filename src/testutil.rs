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

//! Deterministic mock capabilities for the engine tests: a toy curve built
//! on an FNV mash, a bincode wire codec, and a scripted in-memory node.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rand::{thread_rng, Rng};

use crate::common::Result;
use crate::wallet::error::ErrorKind;
use crate::wallet::types::{
	Account, AccountAddress, AccountKeys, AliasResponse, Block, BlockCompleteEntry, ChachaIv,
	ChachaKey, ChainCodec, CreateTxArg, CreateTxRes, CryptoProvider, GetBlocksResponse, Hash,
	KeyImage, KeyPair, NodeClient, NodeInfoResponse, OutputIndexesResponse, PaymentId,
	PublicKey, SecretKey, Signature, StatusResponse, Transaction, TransferInfo, TxExtra, TxIn,
	TxInToKey, TxOut, TxOutTarget, TxPoolResponse, WalletCallback, STATUS_OK,
};
use crate::wallet::Wallet;

/// 32 deterministic bytes out of arbitrary labeled parts.
pub fn mash(parts: &[&[u8]]) -> [u8; 32] {
	let mut out = [0u8; 32];
	for lane in 0u64..4 {
		let mut h: u64 = 0xcbf2_9ce4_8422_2325 ^ lane.wrapping_mul(0x9e37_79b9_7f4a_7c15);
		for part in parts {
			for &b in *part {
				h ^= u64::from(b);
				h = h.wrapping_mul(0x0100_0000_01b3);
			}
			h ^= 0xff;
			h = h.wrapping_mul(0x0100_0000_01b3);
		}
		out[lane as usize * 8..(lane as usize + 1) * 8].copy_from_slice(&h.to_le_bytes());
	}
	out
}

pub fn pub_of(secret: &SecretKey) -> PublicKey {
	PublicKey(mash(&[b"pub", &secret.0]))
}

pub fn account_from_seed(seed: &[u8]) -> AccountKeys {
	let spend_secret_key = SecretKey(mash(&[b"spend-sec", seed]));
	let view_secret_key = SecretKey(mash(&[b"view-sec", seed]));
	AccountKeys {
		address: AccountAddress {
			spend_public_key: pub_of(&spend_secret_key),
			view_public_key: pub_of(&view_secret_key),
		},
		spend_secret_key,
		view_secret_key,
	}
}

/// The output key an owned output carries for a given address; the mock
/// ownership test in `lookup_acc_outs` recomputes and compares this.
pub fn owned_out_key(addr: &AccountAddress, tx_pub_key: &PublicKey, out_index: usize) -> PublicKey {
	PublicKey(mash(&[
		b"owned-out",
		&addr.spend_public_key.0,
		&addr.view_public_key.0,
		&tx_pub_key.0,
		&(out_index as u64).to_le_bytes(),
	]))
}

pub struct MockCrypto {
	/// Forced key images per (tx public key, output index), for poisoning
	/// tests
	pub ki_overrides: HashMap<(PublicKey, usize), KeyImage>,
}

impl MockCrypto {
	pub fn new() -> MockCrypto {
		MockCrypto {
			ki_overrides: HashMap::new(),
		}
	}
}

impl CryptoProvider for MockCrypto {
	fn generate_account(&self) -> (AccountKeys, Vec<u8>) {
		let seed: [u8; 32] = thread_rng().gen();
		(account_from_seed(&seed), seed.to_vec())
	}

	fn restore_account(&self, seed: &[u8]) -> Result<AccountKeys> {
		Ok(account_from_seed(seed))
	}

	fn secret_to_public(&self, secret: &SecretKey) -> Result<PublicKey> {
		Ok(pub_of(secret))
	}

	fn fast_hash(&self, data: &[u8]) -> Hash {
		Hash(mash(&[b"fast-hash", data]))
	}

	fn generate_signature(
		&self,
		hash: &Hash,
		public: &PublicKey,
		secret: &SecretKey,
	) -> Result<Signature> {
		Ok(Signature {
			c: mash(&[b"sig-c", &hash.0, &public.0]),
			r: mash(&[b"sig-r", &hash.0, &secret.0]),
		})
	}

	fn lookup_acc_outs(
		&self,
		keys: &AccountKeys,
		tx: &Transaction,
		tx_pub_key: &PublicKey,
	) -> Result<(Vec<usize>, u64)> {
		let mut outs = Vec::new();
		let mut total = 0;
		for (i, out) in tx.vout.iter().enumerate() {
			let TxOutTarget::ToKey { key, .. } = &out.target;
			if *key == owned_out_key(&keys.address, tx_pub_key, i) {
				outs.push(i);
				total += out.amount;
			}
		}
		Ok((outs, total))
	}

	fn derive_key_image(
		&self,
		keys: &AccountKeys,
		tx_pub_key: &PublicKey,
		out_index: usize,
	) -> Result<(KeyPair, KeyImage)> {
		let public = owned_out_key(&keys.address, tx_pub_key, out_index);
		let secret = SecretKey(mash(&[b"eph-sec", &public.0]));
		let key_image = self
			.ki_overrides
			.get(&(*tx_pub_key, out_index))
			.cloned()
			.unwrap_or_else(|| {
				KeyImage(mash(&[
					b"ki",
					&keys.address.spend_public_key.0,
					&tx_pub_key.0,
					&(out_index as u64).to_le_bytes(),
				]))
			});
		Ok((KeyPair { public, secret }, key_image))
	}

	fn chacha_key_from_password(&self, password: &str) -> ChachaKey {
		ChachaKey(mash(&[b"chacha-pwd", password.as_bytes()]))
	}

	fn chacha_key_from_secret(&self, secret: &SecretKey) -> ChachaKey {
		ChachaKey(mash(&[b"chacha-sec", &secret.0]))
	}

	fn chacha(&self, data: &[u8], key: &ChachaKey, iv: &ChachaIv) -> Vec<u8> {
		let mut out = Vec::with_capacity(data.len());
		let mut block = 0u64;
		let mut stream = [0u8; 32];
		for (i, &b) in data.iter().enumerate() {
			if i % 32 == 0 {
				stream = mash(&[b"keystream", &key.0, &iv.0, &block.to_le_bytes()]);
				block += 1;
			}
			out.push(b ^ stream[i % 32]);
		}
		out
	}

	fn construct_tx(&self, keys: &AccountKeys, arg: &CreateTxArg) -> Result<CreateTxRes> {
		let arg_blob = bincode::serialize(arg)
			.map_err(|e| ErrorKind::Internal(format!("construct_tx serialize: {}", e)))?;
		let tx_secret = SecretKey(mash(&[b"tx-sec", &arg_blob]));
		let tx_public = pub_of(&tx_secret);

		let mut vin = Vec::new();
		for source in &arg.sources {
			let (_, k_image) = self.derive_key_image(
				keys,
				&source.real_out_tx_key,
				source.real_output_in_tx_index,
			)?;
			vin.push(TxIn::ToKey(TxInToKey {
				amount: source.amount,
				key_offsets: source.outputs.iter().map(|(gi, _)| *gi).collect(),
				k_image,
			}));
		}

		let mut vout = Vec::new();
		for dst in &arg.destinations {
			let key = owned_out_key(&dst.addr, &tx_public, vout.len());
			vout.push(TxOut {
				amount: dst.amount,
				target: TxOutTarget::ToKey { key, mix_attr: 0 },
			});
		}
		if arg.change_amount > 0 {
			let key = owned_out_key(&arg.change_addr, &tx_public, vout.len());
			vout.push(TxOut {
				amount: arg.change_amount,
				target: TxOutTarget::ToKey { key, mix_attr: 0 },
			});
		}

		let mut extra = vec![TxExtra::PubKey(tx_public)];
		extra.extend(arg.extra.iter().cloned());

		let signatures = vec![vec![Signature::default()]; vin.len()];
		let tx = Transaction {
			version: 1,
			unlock_time: arg.unlock_time,
			vin,
			vout,
			extra,
			signatures,
		};
		Ok(CreateTxRes {
			tx,
			tx_key: KeyPair {
				public: tx_public,
				secret: tx_secret,
			},
		})
	}
}

pub struct MockCodec;

pub fn tx_blob(tx: &Transaction) -> Vec<u8> {
	bincode::serialize(tx).expect("tx serializes")
}

pub fn tx_hash_of(tx: &Transaction) -> Hash {
	Hash(mash(&[b"tx-hash", &tx_blob(tx)]))
}

pub fn block_blob(block: &Block) -> Vec<u8> {
	bincode::serialize(block).expect("block serializes")
}

pub fn block_hash_of(block: &Block) -> Hash {
	Hash(mash(&[b"block-hash", &block_blob(block)]))
}

pub fn genesis_block() -> Block {
	Block {
		major_version: 1,
		minor_version: 0,
		timestamp: 0,
		prev_id: Hash::null(),
		nonce: 0,
		miner_tx: Transaction {
			version: 1,
			unlock_time: 0,
			vin: vec![TxIn::Gen { height: 0 }],
			vout: Vec::new(),
			extra: vec![TxExtra::PubKey(PublicKey::null())],
			signatures: Vec::new(),
		},
		tx_hashes: Vec::new(),
	}
}

impl ChainCodec for MockCodec {
	fn parse_block(&self, blob: &[u8]) -> Result<Block> {
		bincode::deserialize(blob).map_err(|_| ErrorKind::BlockParse.into())
	}

	fn parse_tx(&self, blob: &[u8]) -> Result<Transaction> {
		bincode::deserialize(blob).map_err(|_| ErrorKind::TxParse.into())
	}

	fn tx_to_blob(&self, tx: &Transaction) -> Vec<u8> {
		tx_blob(tx)
	}

	fn tx_hash(&self, tx: &Transaction) -> Hash {
		tx_hash_of(tx)
	}

	fn block_hash(&self, block: &Block) -> Hash {
		block_hash_of(block)
	}

	fn generate_genesis_block(&self) -> Block {
		genesis_block()
	}

	fn address_to_str(&self, address: &AccountAddress) -> String {
		let mut s = String::from("P");
		s.push_str(&address.spend_public_key.to_hex()[..16]);
		s.push_str(&address.view_public_key.to_hex()[..16]);
		s
	}
}

#[derive(Default)]
pub struct MockNodeInner {
	/// Node-side chain: (block id, block, regular txs), position is height
	pub chain: Vec<(Hash, Block, Vec<Transaction>)>,
	pub pool: Vec<Transaction>,
	pub pool_status: Option<String>,
	pub send_status: Option<String>,
	pub blocks_median: u64,
	pub aliases: HashMap<String, String>,
	pub sent_txs: Vec<String>,
	pub relayed: Vec<Vec<String>>,
	/// Inject this many transport failures into `get_blocks_fast`
	pub fail_next_pulls: u32,
}

#[derive(Clone)]
pub struct MockNode {
	pub inner: Rc<RefCell<MockNodeInner>>,
}

impl MockNode {
	pub fn new() -> MockNode {
		let node = MockNode {
			inner: Rc::new(RefCell::new(MockNodeInner::default())),
		};
		let genesis = genesis_block();
		node.inner
			.borrow_mut()
			.chain
			.push((block_hash_of(&genesis), genesis, Vec::new()));
		node.inner.borrow_mut().blocks_median = 200_000;
		node
	}

	/// Append a block holding the given regular transactions.
	pub fn push_block(&self, txs: Vec<Transaction>, timestamp: u64) -> Hash {
		self.push_block_salted(txs, timestamp, 0)
	}

	/// Append a block with a nonce salt, for building forks that differ at
	/// the same height.
	pub fn push_block_salted(&self, txs: Vec<Transaction>, timestamp: u64, salt: u64) -> Hash {
		let mut inner = self.inner.borrow_mut();
		let height = inner.chain.len() as u64;
		let prev_id = inner.chain.last().map(|(id, _, _)| *id).unwrap_or_else(Hash::null);
		let miner_secret = SecretKey(mash(&[
			b"miner-sec",
			&height.to_le_bytes(),
			&salt.to_le_bytes(),
		]));
		let block = Block {
			major_version: 1,
			minor_version: 0,
			timestamp,
			prev_id,
			nonce: salt,
			miner_tx: Transaction {
				version: 1,
				unlock_time: 0,
				vin: vec![TxIn::Gen { height }],
				vout: Vec::new(),
				extra: vec![TxExtra::PubKey(pub_of(&miner_secret))],
				signatures: Vec::new(),
			},
			tx_hashes: txs.iter().map(tx_hash_of).collect(),
		};
		let id = block_hash_of(&block);
		inner.chain.push((id, block, txs));
		id
	}

	/// Drop every block at and above `height`, simulating the node having
	/// switched to a different chain.
	pub fn truncate(&self, height: u64) {
		self.inner.borrow_mut().chain.truncate(height as usize);
	}
}

impl NodeClient for MockNode {
	fn get_blocks_fast(&self, block_ids: &[Hash]) -> Result<GetBlocksResponse> {
		let mut inner = self.inner.borrow_mut();
		if inner.fail_next_pulls > 0 {
			inner.fail_next_pulls -= 1;
			return Err(ErrorKind::NoConnection("getblocks.bin".to_owned()).into());
		}
		let mut start_height = 0u64;
		for id in block_ids {
			if let Some(pos) = inner.chain.iter().position(|(h, _, _)| h == id) {
				start_height = pos as u64;
				break;
			}
		}
		let blocks = inner.chain[start_height as usize..]
			.iter()
			.map(|(_, block, txs)| BlockCompleteEntry {
				block: block_blob(block),
				txs: txs.iter().map(tx_blob).collect(),
			})
			.collect();
		Ok(GetBlocksResponse {
			start_height,
			blocks,
			status: STATUS_OK.to_owned(),
		})
	}

	fn get_tx_global_output_indexes(&self, tx_hash: &Hash) -> Result<OutputIndexesResponse> {
		let inner = self.inner.borrow();
		for (height, (_, block, txs)) in inner.chain.iter().enumerate() {
			let mut candidates: Vec<&Transaction> = vec![&block.miner_tx];
			candidates.extend(txs.iter());
			for (tx_pos, tx) in candidates.into_iter().enumerate() {
				if tx_hash_of(tx) == *tx_hash {
					let o_indexes = (0..tx.vout.len() as u64)
						.map(|oi| height as u64 * 1_000_000 + tx_pos as u64 * 1_000 + oi)
						.collect();
					return Ok(OutputIndexesResponse {
						o_indexes,
						status: STATUS_OK.to_owned(),
					});
				}
			}
		}
		Ok(OutputIndexesResponse {
			o_indexes: Vec::new(),
			status: "NOT FOUND".to_owned(),
		})
	}

	fn get_info(&self) -> Result<NodeInfoResponse> {
		Ok(NodeInfoResponse {
			current_blocks_median: self.inner.borrow().blocks_median,
			status: STATUS_OK.to_owned(),
		})
	}

	fn get_tx_pool(&self) -> Result<TxPoolResponse> {
		let inner = self.inner.borrow();
		if let Some(status) = &inner.pool_status {
			return Ok(TxPoolResponse {
				txs: Vec::new(),
				status: status.clone(),
			});
		}
		Ok(TxPoolResponse {
			txs: inner.pool.iter().map(tx_blob).collect(),
			status: STATUS_OK.to_owned(),
		})
	}

	fn send_raw_tx(&self, tx_as_hex: &str) -> Result<StatusResponse> {
		let mut inner = self.inner.borrow_mut();
		inner.sent_txs.push(tx_as_hex.to_owned());
		let status = inner
			.send_status
			.clone()
			.unwrap_or_else(|| STATUS_OK.to_owned());
		Ok(StatusResponse { status })
	}

	fn relay_txs(&self, raw_txs: &[String]) -> Result<StatusResponse> {
		self.inner.borrow_mut().relayed.push(raw_txs.to_vec());
		Ok(StatusResponse {
			status: STATUS_OK.to_owned(),
		})
	}

	fn get_aliases_by_address(&self, address: &str) -> Result<AliasResponse> {
		let inner = self.inner.borrow();
		Ok(AliasResponse {
			alias: inner.aliases.get(address).cloned().unwrap_or_default(),
			status: STATUS_OK.to_owned(),
		})
	}

	fn validate_signed_text(
		&self,
		_address: &str,
		_signature_hex: &str,
		_text: &str,
	) -> Result<StatusResponse> {
		Ok(StatusResponse {
			status: STATUS_OK.to_owned(),
		})
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
	NewBlock(u64),
	Received { height: u64, out_index: usize },
	Spent { height: u64, out_index: usize },
	Transfer { is_income: bool, amount: u64 },
}

#[derive(Clone, Default)]
pub struct Recorder {
	pub events: Rc<RefCell<Vec<Event>>>,
}

impl WalletCallback for Recorder {
	fn on_new_block(&self, height: u64, _block: &Block) {
		self.events.borrow_mut().push(Event::NewBlock(height));
	}

	fn on_money_received(&self, height: u64, _tx: &Transaction, out_index: usize) {
		self.events
			.borrow_mut()
			.push(Event::Received { height, out_index });
	}

	fn on_money_spent(
		&self,
		height: u64,
		_in_tx: &Transaction,
		out_index: usize,
		_spending_tx: &Transaction,
	) {
		self.events
			.borrow_mut()
			.push(Event::Spent { height, out_index });
	}

	fn on_transfer(&self, info: &TransferInfo) {
		self.events.borrow_mut().push(Event::Transfer {
			is_income: info.is_income,
			amount: info.amount,
		});
	}
}

pub type TestWallet = Wallet<MockCrypto, MockCodec, MockNode>;

/// Wallet over a fresh mock node, with an account whose creation time does
/// not filter any blocks.
pub fn test_wallet(tag: &[u8]) -> (TestWallet, MockNode) {
	let node = MockNode::new();
	let mut wallet = Wallet::new(MockCrypto::new(), MockCodec, node.clone());
	wallet.account = Account::from_restore(account_from_seed(tag));
	wallet.account_public_address = wallet.account.get_keys().address;
	(wallet, node)
}

/// The deterministic tx public key `pay_tx` gives a transaction tagged `tag`.
pub fn test_tx_pub(tag: &[u8]) -> PublicKey {
	pub_of(&SecretKey(mash(&[b"test-tx-sec", tag])))
}

/// A transaction paying the given address the listed amounts, spending
/// someone else's output.
pub fn pay_tx(
	addr: &AccountAddress,
	amounts: &[u64],
	unlock_time: u64,
	tag: &[u8],
	payment_id: Option<PaymentId>,
) -> Transaction {
	let tx_public = test_tx_pub(tag);
	let total: u64 = amounts.iter().sum();
	let vout = amounts
		.iter()
		.enumerate()
		.map(|(i, &amount)| TxOut {
			amount,
			target: TxOutTarget::ToKey {
				key: owned_out_key(addr, &tx_public, i),
				mix_attr: 0,
			},
		})
		.collect();
	let mut extra = vec![TxExtra::PubKey(tx_public)];
	if let Some(pid) = payment_id {
		extra.push(TxExtra::PaymentId(pid));
	}
	Transaction {
		version: 1,
		unlock_time,
		vin: vec![TxIn::ToKey(TxInToKey {
			amount: total + 10,
			key_offsets: vec![1],
			k_image: KeyImage(mash(&[b"foreign-ki", tag])),
		})],
		vout,
		extra,
		signatures: vec![vec![Signature::default()]],
	}
}

/// Checks the key-image index is the exact inverse of the transfer list.
pub fn assert_key_image_index_consistent(wallet: &TestWallet) {
	assert_eq!(wallet.key_images.len(), wallet.transfers.len());
	for (i, td) in wallet.transfers.iter().enumerate() {
		assert_eq!(Some(&i), wallet.key_images.get(&td.key_image));
	}
}
