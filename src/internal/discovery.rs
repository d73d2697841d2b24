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

//! Per-transaction output discovery: find outputs addressed to the account,
//! detect spends of known outputs, and record payments and history entries.

use failure::Error;

use crate::wallet::error::ErrorKind;
use crate::wallet::types::{
	Block, ChainCodec, CryptoProvider, Hash, KeyImage, NodeClient, PaymentRecord, Transaction,
	TransferDetails, TransferInfo, TransferRecord, TxIn, TxOutTarget, STATUS_BUSY, STATUS_OK,
};
use crate::wallet::Wallet;

/// Run discovery over one confirmed transaction, mutating the wallet ledger.
///
/// A transaction whose owned outputs would collide with an already known key
/// image is poisoned and skipped in full: no transfer records, no spend
/// flags, no history.
pub fn process_new_transaction<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	tx: &Transaction,
	height: u64,
	block: &Block,
) -> Result<(), Error>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let tx_hash = wallet.codec.tx_hash(tx);
	let (recipient, recipient_alias) = process_unconfirmed(wallet, &tx_hash);

	let tx_pub_key = wallet
		.codec
		.tx_pub_key_from_extra(tx)
		.ok_or_else(|| ErrorKind::TxExtraParse(tx_hash.to_hex()))?;
	let (outs, tx_money_got_in_outs) = wallet
		.crypto
		.lookup_acc_outs(wallet.account.get_keys(), tx, &tx_pub_key)
		.map_err(|_| ErrorKind::AccOutsLookup(tx_hash.to_hex()))?;

	let mut mtd = TransferDetails::default();

	if !outs.is_empty() && tx_money_got_in_outs > 0 {
		// good news - got money! take care about it
		let res = wallet.node.get_tx_global_output_indexes(&tx_hash)?;
		if res.status == STATUS_BUSY {
			return Err(ErrorKind::DaemonBusy("get_o_indexes".to_owned()).into());
		}
		if res.status != STATUS_OK {
			return Err(ErrorKind::GetOutIndexes(res.status).into());
		}
		if res.o_indexes.len() != tx.vout.len() {
			return Err(ErrorKind::Internal(format!(
				"transaction outputs size={} does not match output indexes response size={}",
				tx.vout.len(),
				res.o_indexes.len()
			))
			.into());
		}

		// derive every owned output before touching the ledger, so a key
		// image collision anywhere in the tx leaves no trace of it
		let mut discovered: Vec<(usize, KeyImage)> = Vec::with_capacity(outs.len());
		for o in outs {
			if o >= tx.vout.len() {
				return Err(ErrorKind::Internal(format!(
					"wrong out in transaction: internal index={}, total_outs={}",
					o,
					tx.vout.len()
				))
				.into());
			}
			let (ephemeral, key_image) =
				wallet.crypto.derive_key_image(wallet.account.get_keys(), &tx_pub_key, o)?;
			let TxOutTarget::ToKey { key: out_key, .. } = tx.vout[o].target;
			if ephemeral.public != out_key {
				return Err(ErrorKind::Internal(
					"derived ephemeral public key does not match output key".to_owned(),
				)
				.into());
			}
			if let Some(&prev) = wallet.key_images.get(&key_image) {
				warn!(
					"tx {} output's key image has already been seen in tx {}. The entire transaction will be skipped.",
					tx_hash,
					wallet.codec.tx_hash(&wallet.transfers[prev].tx)
				);
				return Ok(());
			}
			if discovered.iter().any(|(_, ki)| *ki == key_image) {
				warn!(
					"tx {} derives one key image for two of its outputs. The entire transaction will be skipped.",
					tx_hash
				);
				return Ok(());
			}
			discovered.push((o, key_image));
		}

		for (o, key_image) in discovered {
			mtd.receive_indices.push(o);
			wallet.transfers.push(TransferRecord {
				block_height: height,
				internal_output_index: o,
				global_output_index: res.o_indexes[o],
				tx: tx.clone(),
				spent: false,
				key_image,
			});
			wallet
				.key_images
				.insert(key_image, wallet.transfers.len() - 1);
			let td = wallet.transfers.last().unwrap();
			info!("Received money: {}, with tx: {}", td.amount(), tx_hash);
			if let Some(cb) = &wallet.callback {
				cb.on_money_received(height, &td.tx, td.internal_output_index);
			}
		}
	}

	// check all inputs for spending (compare key images)
	let mut tx_money_spent_in_ins: u64 = 0;
	for (i, vin) in tx.vin.iter().enumerate() {
		let input = match vin {
			TxIn::ToKey(input) => input,
			TxIn::Gen { .. } => continue,
		};
		if let Some(&ti) = wallet.key_images.get(&input.k_image) {
			info!("Spent money: {}, with tx: {}", input.amount, tx_hash);
			tx_money_spent_in_ins += input.amount;
			wallet.transfers[ti].spent = true;
			mtd.spent_indices.push(i);
			if let Some(cb) = &wallet.callback {
				let td = &wallet.transfers[ti];
				cb.on_money_spent(height, &td.tx, td.internal_output_index, tx);
			}
		}
	}

	if tx_money_got_in_outs > 0 {
		if let Some(payment_id) = wallet.codec.payment_id_from_extra(tx) {
			let received = tx_money_got_in_outs.saturating_sub(tx_money_spent_in_ins);
			if received > 0 && !payment_id.is_empty() {
				let payment = PaymentRecord {
					tx_hash,
					amount: received,
					block_height: height,
					unlock_time: tx.unlock_time,
				};
				debug!(
					"Payment found: {} / {} / {}",
					payment_id, payment.tx_hash, payment.amount
				);
				wallet
					.payments
					.entry(payment_id)
					.or_insert_with(Vec::new)
					.push(payment);
			}
		}
	}

	if tx_money_spent_in_ins > 0 {
		// this actually is a transfer transaction, notify about the spend
		if tx_money_spent_in_ins > tx_money_got_in_outs {
			handle_money_spent(
				wallet,
				block,
				tx,
				tx_money_spent_in_ins - tx_money_got_in_outs,
				&mtd,
				&recipient,
				&recipient_alias,
			);
		} else {
			// one transaction carrying transfers from different wallets
			warn!(
				"Unusual transaction {}, tx_money_spent_in_ins: {}, tx_money_got_in_outs: {}",
				tx_hash, tx_money_spent_in_ins, tx_money_got_in_outs
			);
			handle_money_spent(
				wallet,
				block,
				tx,
				tx_money_spent_in_ins,
				&mtd,
				&recipient,
				&recipient_alias,
			);
			handle_money_received(wallet, block, tx, tx_money_got_in_outs, &mtd);
		}
	} else if tx_money_got_in_outs > 0 {
		handle_money_received(wallet, block, tx, tx_money_got_in_outs, &mtd);
	}

	Ok(())
}

/// If the confirmed tx was one of ours pending in `unconfirmed_txs`, evict
/// it and hand back its recipient strings for the history entry.
pub fn process_unconfirmed<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	tx_hash: &Hash,
) -> (String, String) {
	match wallet.unconfirmed_txs.remove(tx_hash) {
		Some(utd) => (utd.recipient, utd.recipient_alias),
		None => (String::new(), String::new()),
	}
}

/// Fill a history entry from a transaction and its wallet-relevant amounts.
pub fn prepare_wti<C, D, N>(
	wallet: &Wallet<C, D, N>,
	height: u64,
	timestamp: u64,
	tx: &Transaction,
	amount: u64,
	details: TransferDetails,
) -> TransferInfo
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	TransferInfo {
		tx_hash: wallet.codec.tx_hash(tx),
		height,
		timestamp,
		amount,
		fee: if tx.is_coinbase() {
			0
		} else {
			wallet.codec.get_tx_fee(tx)
		},
		payment_id: wallet.codec.payment_id_from_extra(tx).map(|p| p.to_hex()),
		is_income: false,
		unlock_time: tx.unlock_time,
		tx_blob_size: wallet.codec.tx_blob_size(tx),
		destinations: String::new(),
		destination_alias: String::new(),
		details,
		tx: tx.clone(),
	}
}

fn handle_money_received<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	block: &Block,
	tx: &Transaction,
	amount: u64,
	mtd: &TransferDetails,
) where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let mut wti = prepare_wti(wallet, block.height(), block.timestamp, tx, amount, mtd.clone());
	wti.is_income = true;
	wallet.transfer_history.push(wti);
	if let Some(cb) = &wallet.callback {
		cb.on_transfer(wallet.transfer_history.last().unwrap());
	}
}

fn handle_money_spent<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	block: &Block,
	in_tx: &Transaction,
	amount: u64,
	mtd: &TransferDetails,
	recipient: &str,
	recipient_alias: &str,
) where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let mut wti = prepare_wti(
		wallet,
		block.height(),
		block.timestamp,
		in_tx,
		amount,
		mtd.clone(),
	);
	wti.is_income = false;
	wti.destinations = recipient.to_owned();
	wti.destination_alias = recipient_alias.to_owned();
	wallet.transfer_history.push(wti);
	if let Some(cb) = &wallet.callback {
		cb.on_transfer(wallet.transfer_history.last().unwrap());
	}
}
