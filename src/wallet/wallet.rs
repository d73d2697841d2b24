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

//! The wallet engine: one account's view of the chain and the operations
//! that keep it consistent. All mutating operations must be serialized by
//! the caller; the engine has no internal locking.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::common::Result;
use crate::internal::{scan, tx};
use super::consts::{
	DEFAULT_TX_SPENDABLE_AGE, LOCKED_TX_ALLOWED_DELTA_BLOCKS, LOCKED_TX_ALLOWED_DELTA_SECONDS,
	MAX_BLOCK_NUMBER,
};
use super::error::ErrorKind;
use super::types::{
	Account, AccountAddress, ChainCodec, CryptoProvider, GetTransfersRequest,
	GetTransfersResponse, Hash, KeyImage, NodeClient, PaymentId, PaymentRecord, SecretKey,
	Signature, Transaction, TransferInfo, TransferRecord, TxDestinationEntry, TxExtra,
	UnconfirmedOutbound, WalletCallback,
};

/// Stateful engine bound to a single account. `C`, `D` and `N` supply the
/// curve primitives, the wire codec and the node transport.
pub struct Wallet<C, D, N> {
	pub(crate) crypto: C,
	pub(crate) codec: D,
	pub(crate) node: N,

	pub(crate) account: Account,
	/// Address cached in the state file; compared against the loaded keys to
	/// detect a state file belonging to another wallet
	pub(crate) account_public_address: AccountAddress,
	pub(crate) is_view_only: bool,

	pub(crate) keys_file: PathBuf,
	pub(crate) wallet_file: PathBuf,

	/// Block ids from genesis to the local tip; `local_height` equals its
	/// length at all times
	pub(crate) blockchain: Vec<Hash>,
	pub(crate) local_height: u64,
	/// Discovered owned outputs, append-ordered by block height
	pub(crate) transfers: Vec<TransferRecord>,
	/// Exact inverse index of `transfers` by key image
	pub(crate) key_images: HashMap<KeyImage, usize>,
	pub(crate) payments: HashMap<PaymentId, Vec<PaymentRecord>>,
	/// Append-only user-facing log; never pruned, reorgs are reconciled at
	/// query time through the height field
	pub(crate) transfer_history: Vec<TransferInfo>,
	pub(crate) unconfirmed_txs: HashMap<Hash, UnconfirmedOutbound>,
	pub(crate) unconfirmed_in_transfers: HashMap<Hash, TransferInfo>,
	pub(crate) unconfirmed_balance: u64,
	/// Secret tx keys of transactions we sent, kept to prove payment later;
	/// never pruned
	pub(crate) tx_keys: HashMap<Hash, SecretKey>,

	pub(crate) upper_transaction_size_limit: u64,
	pub(crate) callback: Option<Box<dyn WalletCallback>>,
	/// Cancellation flag owned by the scheduler driving refresh; the engine
	/// only reads it, between blocks, never mid-block
	pub(crate) run: Arc<AtomicBool>,
}

impl<C, D, N> Wallet<C, D, N>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	pub fn new(crypto: C, codec: D, node: N) -> Wallet<C, D, N> {
		let mut wallet = Wallet {
			crypto,
			codec,
			node,
			account: Account::default(),
			account_public_address: AccountAddress::default(),
			is_view_only: false,
			keys_file: PathBuf::new(),
			wallet_file: PathBuf::new(),
			blockchain: Vec::new(),
			local_height: 0,
			transfers: Vec::new(),
			key_images: HashMap::new(),
			payments: HashMap::new(),
			transfer_history: Vec::new(),
			unconfirmed_txs: HashMap::new(),
			unconfirmed_in_transfers: HashMap::new(),
			unconfirmed_balance: 0,
			tx_keys: HashMap::new(),
			upper_transaction_size_limit: 0,
			callback: None,
			run: Arc::new(AtomicBool::new(true)),
		};
		wallet.clear();
		wallet
	}

	pub fn set_callback(&mut self, callback: Option<Box<dyn WalletCallback>>) {
		self.callback = callback;
	}

	/// Install the scheduler-owned cancellation flag.
	pub fn set_run_flag(&mut self, run: Arc<AtomicBool>) {
		self.run = run;
	}

	pub fn account(&self) -> &Account {
		&self.account
	}

	pub fn is_view_only(&self) -> bool {
		self.is_view_only
	}

	pub fn address(&self) -> &AccountAddress {
		&self.account.get_keys().address
	}

	pub fn address_str(&self) -> String {
		self.codec.address_to_str(self.address())
	}

	pub fn local_height(&self) -> u64 {
		self.local_height
	}

	pub fn transfers(&self) -> &[TransferRecord] {
		&self.transfers
	}

	/// Pull blocks from the daemon until it reports no progress. Returns the
	/// number of blocks applied and whether new transfers were discovered.
	/// Transient failures are retried up to 3 times before surfacing.
	pub fn refresh(&mut self) -> Result<(u64, bool)> {
		let mut blocks_fetched = 0u64;
		let mut try_count = 0;
		let last_tx_hash = self.last_transfer_tx_hash();

		while self.run.load(Ordering::Relaxed) {
			match scan::pull_blocks(self) {
				Ok(0) => break,
				Ok(added) => blocks_fetched += added,
				Err(e) => {
					if try_count < 3 {
						try_count += 1;
						warn!("pull_blocks failed, another try (try_count={})", try_count);
					} else {
						error!("pull_blocks failed, try_count={}: {}", try_count, e);
						return Err(e);
					}
				}
			}
		}

		let received_money = self.last_transfer_tx_hash() != last_tx_hash;
		info!(
			"Refresh done, blocks received: {}, balance: {}, unlocked: {}",
			blocks_fetched,
			self.balance(),
			self.unlocked_balance()
		);
		if received_money {
			tx::resend_unconfirmed(self);
		}
		Ok((blocks_fetched, received_money))
	}

	/// Error-swallowing refresh for periodic callers; the third element
	/// reports success.
	pub fn try_refresh(&mut self) -> (u64, bool, bool) {
		match self.refresh() {
			Ok((blocks_fetched, received_money)) => (blocks_fetched, received_money, true),
			Err(e) => {
				warn!("refresh failed: {}", e);
				(0, false, false)
			}
		}
	}

	/// Rebuild the pending-inbound view from the daemon's pool. On failure
	/// the previous view is left untouched.
	pub fn scan_tx_pool(&mut self) -> Result<()> {
		scan::scan_tx_pool(self)
	}

	/// Build, sign and (unless `do_not_relay`) submit a transfer. Returns
	/// the transaction and its relay blob.
	pub fn transfer(
		&mut self,
		destinations: &[TxDestinationEntry],
		fake_outputs_count: u64,
		unlock_time: u64,
		fee: u64,
		extra: Vec<TxExtra>,
		do_not_relay: bool,
	) -> Result<(Transaction, Vec<u8>)> {
		tx::transfer(
			self,
			destinations,
			fake_outputs_count,
			unlock_time,
			fee,
			extra,
			do_not_relay,
		)
	}

	/// Select inputs and write the encrypted unsigned-transfer file for the
	/// offline signing flow.
	pub fn prepare_unsigned_transfer(
		&mut self,
		destinations: &[TxDestinationEntry],
		fake_outputs_count: u64,
		unlock_time: u64,
		fee: u64,
		extra: Vec<TxExtra>,
		sources_file: &std::path::Path,
	) -> Result<()> {
		tx::prepare_unsigned_transfer(
			self,
			destinations,
			fake_outputs_count,
			unlock_time,
			fee,
			extra,
			sources_file,
		)
	}

	/// Sign an unsigned-transfer file produced on another host and write the
	/// encrypted signed result.
	pub fn sign_transfer(
		&mut self,
		sources_file: &std::path::Path,
		signed_file: &std::path::Path,
	) -> Result<Transaction> {
		tx::sign_transfer(self, sources_file, signed_file)
	}

	/// Submit a signed-transfer file; spent-flag and unconfirmed bookkeeping
	/// match the online `transfer` path.
	pub fn submit_transfer(
		&mut self,
		sources_file: &std::path::Path,
		signed_file: &std::path::Path,
	) -> Result<Transaction> {
		tx::submit_transfer(self, sources_file, signed_file)
	}

	/// Rebroadcast every pending outbound transaction. Failures are logged,
	/// never surfaced.
	pub fn resend_unconfirmed(&mut self) {
		tx::resend_unconfirmed(self)
	}

	/// Refresh the transaction size limit from the daemon's block median.
	pub fn update_current_tx_limit(&mut self) -> Result<()> {
		tx::update_current_tx_limit(self)
	}

	pub fn balance(&self) -> u64 {
		let mut amount: u64 = self
			.transfers
			.iter()
			.filter(|td| !td.spent)
			.map(|td| td.amount())
			.sum();
		for utx in self.unconfirmed_txs.values() {
			amount += utx.change;
		}
		amount
	}

	pub fn unlocked_balance(&self) -> u64 {
		self.transfers
			.iter()
			.filter(|td| !td.spent && self.is_transfer_unlocked(td))
			.map(|td| td.amount())
			.sum()
	}

	pub fn unconfirmed_balance(&self) -> u64 {
		if !self.unconfirmed_in_transfers.is_empty() {
			self.unconfirmed_balance
		} else {
			0
		}
	}

	pub fn is_transfer_unlocked(&self, td: &TransferRecord) -> bool {
		if !self.is_tx_spendtime_unlocked(td.tx.unlock_time) {
			return false;
		}
		if td.block_height + DEFAULT_TX_SPENDABLE_AGE > self.local_height {
			return false;
		}
		true
	}

	pub fn is_tx_spendtime_unlocked(&self, unlock_time: u64) -> bool {
		if unlock_time < MAX_BLOCK_NUMBER {
			// interpret as block height
			self.local_height - 1 + LOCKED_TX_ALLOWED_DELTA_BLOCKS >= unlock_time
		} else {
			// interpret as Unix time
			let current_time = Utc::now().timestamp() as u64;
			current_time + LOCKED_TX_ALLOWED_DELTA_SECONDS >= unlock_time
		}
	}

	/// Walk the history newest-first, applying the height window and
	/// optionally appending the pool view.
	pub fn get_transfer_history(&self, req: &GetTransfersRequest) -> GetTransfersResponse {
		let mut res = GetTransfersResponse::default();
		for thi in self.transfer_history.iter().rev() {
			if req.filter_by_height {
				if thi.height == 0 {
					// unconfirmed
					continue;
				}
				if thi.height < req.min_height {
					// no need to scan further back
					break;
				}
				if thi.height > req.max_height {
					continue;
				}
			}
			if thi.is_income && req.incoming {
				res.incoming.push(thi.clone());
			}
			if !thi.is_income && req.outgoing {
				res.outgoing.push(thi.clone());
			}
		}
		if req.pool {
			for utx in self.unconfirmed_txs.values() {
				res.pool.push(tx::wti_from_unconfirmed(self, utx));
			}
			for wti in self.unconfirmed_in_transfers.values() {
				res.pool.push(wti.clone());
			}
		}
		res
	}

	/// Newest-first page of the confirmed history.
	pub fn get_recent_transfers_history(&self, offset: usize, count: usize) -> Vec<TransferInfo> {
		self.transfer_history
			.iter()
			.rev()
			.skip(offset)
			.take(count)
			.cloned()
			.collect()
	}

	pub fn get_unconfirmed_transfers(&self) -> Vec<TransferInfo> {
		self.unconfirmed_txs
			.values()
			.map(|utx| tx::wti_from_unconfirmed(self, utx))
			.collect()
	}

	pub fn get_payments(&self, payment_id: &PaymentId, min_height: u64) -> Vec<PaymentRecord> {
		match self.payments.get(payment_id) {
			Some(records) => records
				.iter()
				.filter(|p| p.block_height > min_height)
				.cloned()
				.collect(),
			None => Vec::new(),
		}
	}

	pub fn get_tx_key(&self, tx_hash: &Hash) -> Option<SecretKey> {
		self.tx_keys.get(tx_hash).cloned()
	}

	/// Sign arbitrary text with the spend keypair.
	pub fn sign_text(&self, text: &str) -> Result<Signature> {
		if self.is_view_only {
			return Err(ErrorKind::Internal(
				"spend secret key is not available in a view-only wallet".to_owned(),
			)
			.into());
		}
		let keys = self.account.get_keys();
		let hash = self.crypto.fast_hash(text.as_bytes());
		self.crypto
			.generate_signature(&hash, &keys.address.spend_public_key, &keys.spend_secret_key)
	}

	/// Ask the daemon to verify a text signature for an address; returns the
	/// daemon's status string.
	pub fn validate_signed_text(
		&self,
		address: &str,
		text: &str,
		signature: &Signature,
	) -> Result<String> {
		let res = self
			.node
			.validate_signed_text(address, &signature.to_hex(), text)?;
		Ok(res.status)
	}

	/// Drop all chain-derived state and reinstall the genesis block.
	pub fn clear(&mut self) {
		self.blockchain.clear();
		self.transfers.clear();
		self.key_images.clear();
		self.payments.clear();
		self.transfer_history.clear();
		self.unconfirmed_in_transfers.clear();
		self.unconfirmed_balance = 0;
		// tx_keys and pending outbound txs are kept; they are not derived
		// from the chain
		let genesis = self.codec.generate_genesis_block();
		self.blockchain.push(self.codec.block_hash(&genesis));
		self.local_height = 1;
	}

	pub fn reset_and_sync(&mut self) -> Result<(u64, bool)> {
		self.clear();
		self.refresh()
	}

	pub(crate) fn last_transfer_tx_hash(&self) -> Option<Hash> {
		self.transfers.last().map(|td| self.codec.tx_hash(&td.tx))
	}
}
