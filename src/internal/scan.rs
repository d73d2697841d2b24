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

//! Chain and pool scanning: the sparse locator, the pull loop with reorg
//! handling, and the mempool snapshot.

use std::collections::HashMap;

use chrono::Utc;
use failure::Error;

use crate::wallet::consts::SCAN_TIMESTAMP_WINDOW;
use crate::wallet::error::ErrorKind;
use crate::wallet::types::{
	Block, BlockCompleteEntry, ChainCodec, CryptoProvider, Hash, NodeClient, Transaction,
	TransferDetails, TransferInfo, TxIn, STATUS_BUSY, STATUS_OK,
};
use crate::wallet::Wallet;
use super::discovery;

/// Descending list of block ids from the tip toward genesis: the last 10
/// tips densely, then a stride doubling with each step, genesis always last.
pub fn short_chain_history(blockchain: &[Hash]) -> Vec<Hash> {
	let mut ids = Vec::new();
	let sz = blockchain.len();
	if sz == 0 {
		return ids;
	}
	let mut i = 0;
	let mut current_multiplier = 1;
	let mut current_back_offset = 1;
	while current_back_offset < sz {
		ids.push(blockchain[sz - current_back_offset]);
		if i < 10 {
			current_back_offset += 1;
		} else {
			current_multiplier *= 2;
			current_back_offset += current_multiplier;
		}
		i += 1;
	}
	if !ids.contains(&blockchain[0]) {
		ids.push(blockchain[0]);
	}
	ids
}

/// One round against the daemon: ask for blocks past our locator, apply new
/// ones, detach on a detected reorg. Returns the number of freshly applied
/// blocks beyond the local tip.
pub fn pull_blocks<C, D, N>(wallet: &mut Wallet<C, D, N>) -> Result<u64, Error>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let block_ids = short_chain_history(&wallet.blockchain);
	let res = wallet.node.get_blocks_fast(&block_ids)?;
	if res.status == STATUS_BUSY {
		return Err(ErrorKind::DaemonBusy("getblocks".to_owned()).into());
	}
	if res.status != STATUS_OK {
		return Err(ErrorKind::GetBlocks(res.status).into());
	}
	if res.start_height >= wallet.blockchain.len() as u64 {
		return Err(ErrorKind::Internal(format!(
			"wrong daemon response: start_height={} not less than local blockchain size={}",
			res.start_height,
			wallet.blockchain.len()
		))
		.into());
	}

	let mut blocks_added = 0;
	let mut current_index = res.start_height;
	for entry in &res.blocks {
		let block = wallet
			.codec
			.parse_block(&entry.block)
			.map_err(|_| ErrorKind::BlockParse)?;
		let block_id = wallet.codec.block_hash(&block);

		if current_index >= wallet.blockchain.len() as u64 {
			process_new_blockchain_entry(wallet, &block, entry, &block_id, current_index)?;
			blocks_added += 1;
		} else if block_id != wallet.blockchain[current_index as usize] {
			// split detected here !!!
			if current_index == res.start_height {
				return Err(ErrorKind::Internal(format!(
					"wrong daemon response: split starts from the first block in response {} (height {}), local block id at this height: {}",
					block_id,
					res.start_height,
					wallet.blockchain[current_index as usize]
				))
				.into());
			}
			detach_blockchain(wallet, current_index);
			process_new_blockchain_entry(wallet, &block, entry, &block_id, current_index)?;
		} else {
			debug!("Block is already in blockchain: {}", block_id);
		}

		current_index += 1;
	}
	Ok(blocks_added)
}

/// Apply one block at the local tip: run discovery over its transactions
/// (unless it predates the account), then extend the local chain.
pub fn process_new_blockchain_entry<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	block: &Block,
	entry: &BlockCompleteEntry,
	block_id: &Hash,
	height: u64,
) -> Result<(), Error>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	if height != wallet.blockchain.len() as u64 {
		return Err(ErrorKind::Internal(format!(
			"current_index={}, blockchain size={}",
			height,
			wallet.blockchain.len()
		))
		.into());
	}

	// seek only through blocks not older than the account creation time,
	// less a day for a badly set user clock
	if block.timestamp + SCAN_TIMESTAMP_WINDOW >= wallet.account.created_at() {
		discovery::process_new_transaction(wallet, &block.miner_tx, height, block)?;
		for tx_blob in &entry.txs {
			let tx = wallet
				.codec
				.parse_tx(tx_blob)
				.map_err(|_| ErrorKind::TxParse)?;
			discovery::process_new_transaction(wallet, &tx, height, block)?;
		}
		debug!("Processed block: {}, height {}", block_id, height);
	} else {
		debug!(
			"Skipped block by timestamp, height: {}, block time {}, account time {}",
			height,
			block.timestamp,
			wallet.account.created_at()
		);
	}
	wallet.blockchain.push(*block_id);
	wallet.local_height += 1;

	if let Some(cb) = &wallet.callback {
		cb.on_new_block(height, block);
	}
	Ok(())
}

/// Truncate everything at and above `height`: transfer records and their
/// key images, the block id chain, and payment records. The user-facing
/// transfer history is deliberately left alone.
pub fn detach_blockchain<C, D, N>(wallet: &mut Wallet<C, D, N>, height: u64)
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	info!("Detaching blockchain on height {}", height);

	let i_start = wallet
		.transfers
		.iter()
		.position(|td| td.block_height >= height)
		.unwrap_or_else(|| wallet.transfers.len());
	let mut transfers_detached = 0;
	for i in i_start..wallet.transfers.len() {
		let ki = wallet.transfers[i].key_image;
		match wallet.key_images.remove(&ki) {
			Some(idx) if idx != i => {
				error!(
					"internal condition failure: ki {} maps to transfer #{}, expected #{}",
					ki, idx, i
				);
			}
			Some(_) => {}
			None => {
				error!(
					"internal condition failure: ki {} not found while detaching transfer #{}",
					ki, i
				);
			}
		}
		transfers_detached += 1;
	}
	wallet.transfers.truncate(i_start);

	let blocks_detached = wallet.blockchain.len() as u64 - height;
	wallet.blockchain.truncate(height as usize);
	wallet.local_height -= blocks_detached;

	wallet.payments.retain(|_, records| {
		records.retain(|p| p.block_height < height);
		!records.is_empty()
	});

	info!(
		"Detached blockchain on height {}, transfers detached {}, blocks detached {}",
		height, transfers_detached, blocks_detached
	);
}

/// Rebuild the pending-inbound view from a fresh pool snapshot. Entries
/// still in the pool are carried forward verbatim; the rest drop. The swap
/// happens only after the whole snapshot parsed and scanned, so a failure
/// leaves the previous view in place.
pub fn scan_tx_pool<C, D, N>(wallet: &mut Wallet<C, D, N>) -> Result<(), Error>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let res = wallet.node.get_tx_pool()?;
	if res.status == STATUS_BUSY {
		return Err(ErrorKind::DaemonBusy("get_tx_pool".to_owned()).into());
	}
	if res.status != STATUS_OK {
		return Err(ErrorKind::GetBlocks(res.status).into());
	}

	let mut pool: Vec<(Hash, Transaction)> = Vec::with_capacity(res.txs.len());
	for tx_blob in &res.txs {
		let tx = wallet
			.codec
			.parse_tx(tx_blob)
			.map_err(|_| ErrorKind::TxParse)?;
		pool.push((wallet.codec.tx_hash(&tx), tx));
	}

	let mut fresh: HashMap<Hash, TransferInfo> = HashMap::new();
	let mut fresh_balance = 0u64;
	let mut announced: Vec<TransferInfo> = Vec::new();

	for (tx_hash, tx) in pool {
		if let Some(wti) = wallet.unconfirmed_in_transfers.get(&tx_hash) {
			fresh_balance += wti.amount;
			fresh.insert(tx_hash, wti.clone());
			continue;
		}

		let tx_pub_key = wallet
			.codec
			.tx_pub_key_from_extra(&tx)
			.ok_or_else(|| ErrorKind::TxExtraParse(tx_hash.to_hex()))?;
		// check if we have money
		let (_outs, tx_money_got_in_outs) = wallet
			.crypto
			.lookup_acc_outs(wallet.account.get_keys(), &tx, &tx_pub_key)
			.map_err(|_| ErrorKind::AccOutsLookup(tx_hash.to_hex()))?;
		// check if we have spendings
		let mut tx_money_spent_in_ins = 0u64;
		for vin in &tx.vin {
			if let TxIn::ToKey(input) = vin {
				if wallet.key_images.contains_key(&input.k_image) {
					tx_money_spent_in_ins += input.amount;
				}
			}
		}

		if tx_money_spent_in_ins == 0 && tx_money_got_in_outs > 0 {
			let timestamp = Utc::now().timestamp() as u64;
			let mut wti = discovery::prepare_wti(
				wallet,
				0,
				timestamp,
				&tx,
				tx_money_got_in_outs,
				TransferDetails::default(),
			);
			wti.is_income = true;
			fresh_balance += wti.amount;
			fresh.insert(tx_hash, wti.clone());
			announced.push(wti);
		}
	}

	wallet.unconfirmed_in_transfers = fresh;
	wallet.unconfirmed_balance = fresh_balance;
	if let Some(cb) = &wallet.callback {
		for wti in &announced {
			cb.on_transfer(wti);
		}
	}
	Ok(())
}
