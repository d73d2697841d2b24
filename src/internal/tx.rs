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

//! Building, submitting and rebroadcasting transfers, online and through
//! the encrypted offline signing files.

use std::path::Path;

use chrono::Utc;

use crate::common::{to_hex, Result};
use crate::wallet::consts::{
	BLOCK_GRANTED_FULL_REWARD_ZONE, COINBASE_BLOB_RESERVED_SIZE, MAX_TRANSACTION_BLOB_SIZE,
};
use crate::wallet::error::ErrorKind;
use crate::wallet::keystore;
use crate::wallet::types::{
	ChainCodec, CreateTxArg, CreateTxRes, CryptoProvider, NodeClient, Transaction,
	TransferDetails, TransferInfo, TxDestinationEntry, TxDustPolicy, TxExtra, TxIn,
	TxSourceEntry, UnconfirmedOutbound, STATUS_BUSY, STATUS_OK,
};
use crate::wallet::Wallet;
use super::{discovery, selection};

fn now() -> u64 {
	Utc::now().timestamp() as u64
}

/// Synchronous end-to-end transfer: select, build, submit, record. Returns
/// the transaction and its relay blob.
pub fn transfer<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	destinations: &[TxDestinationEntry],
	fake_outputs_count: u64,
	unlock_time: u64,
	fee: u64,
	extra: Vec<TxExtra>,
	do_not_relay: bool,
) -> Result<(Transaction, Vec<u8>)>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let arg = prepare_tx_arg(
		wallet,
		destinations,
		fake_outputs_count,
		unlock_time,
		fee,
		extra,
	)?;
	let res = wallet.crypto.construct_tx(wallet.account.get_keys(), &arg)?;
	finalize_transaction(wallet, &arg, &res, do_not_relay)?;
	let relay_blob = wallet.codec.tx_to_blob(&res.tx);
	Ok((res.tx, relay_blob))
}

/// Select inputs and assemble the constructor argument. Pure with respect
/// to wallet state; nothing is marked spent here.
fn prepare_tx_arg<C, D, N>(
	wallet: &Wallet<C, D, N>,
	destinations: &[TxDestinationEntry],
	fake_outputs_count: u64,
	unlock_time: u64,
	fee: u64,
	extra: Vec<TxExtra>,
) -> Result<CreateTxArg>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	if destinations.is_empty() {
		return Err(ErrorKind::Internal("transfer destinations are empty".to_owned()).into());
	}
	let mut needed_money = fee;
	for dst in destinations {
		needed_money = needed_money
			.checked_add(dst.amount)
			.ok_or_else(|| ErrorKind::Internal("transfer amount overflow".to_owned()))?;
	}

	let dust_policy = TxDustPolicy::new(fee);
	let (found_money, selected) = selection::select_transfers(
		wallet,
		needed_money,
		fake_outputs_count,
		dust_policy.dust_threshold,
		&[],
	)?;
	if found_money < needed_money {
		return Err(ErrorKind::NotEnoughMoney {
			available: found_money,
			needed: needed_money,
		}
		.into());
	}

	let mut sources = Vec::with_capacity(selected.len());
	for i in selected {
		let td = &wallet.transfers[i];
		let real_out_tx_key = wallet
			.codec
			.tx_pub_key_from_extra(&td.tx)
			.ok_or_else(|| ErrorKind::TxExtraParse(wallet.codec.tx_hash(&td.tx).to_hex()))?;
		sources.push(TxSourceEntry {
			outputs: vec![(td.global_output_index, td.out_key())],
			real_output: 0,
			real_out_tx_key,
			real_output_in_tx_index: td.internal_output_index,
			amount: td.amount(),
			transfer_index: i,
		});
	}

	let keys = wallet.account.get_keys();
	Ok(CreateTxArg {
		sources,
		destinations: destinations.to_vec(),
		change_addr: keys.address,
		change_amount: found_money - needed_money,
		fake_outputs_count,
		unlock_time,
		extra,
		dust_policy,
		spend_pub_key: keys.address.spend_public_key,
	})
}

/// Validate a constructed transaction, submit it unless asked not to, and
/// record the speculative bookkeeping. A rejection by the daemon rolls the
/// spent flags back; a transport error leaves them untouched and surfaces.
pub fn finalize_transaction<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	arg: &CreateTxArg,
	res: &CreateTxRes,
	do_not_relay: bool,
) -> Result<()>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let tx = &res.tx;
	let tx_hash = wallet.codec.tx_hash(tx);

	let blob_size = wallet.codec.tx_blob_size(tx);
	if blob_size >= MAX_TRANSACTION_BLOB_SIZE {
		return Err(ErrorKind::TxTooBig(blob_size, wallet.upper_transaction_size_limit).into());
	}
	let mut key_images = String::new();
	for vin in &tx.vin {
		match vin {
			TxIn::ToKey(input) => {
				key_images.push_str(&input.k_image.to_hex());
				key_images.push(' ');
			}
			TxIn::Gen { .. } => {
				return Err(ErrorKind::UnexpectedTxInType(tx_hash.to_hex()).into());
			}
		}
	}

	if !do_not_relay {
		let tx_as_hex = to_hex(&wallet.codec.tx_to_blob(tx));
		let resp = wallet.node.send_raw_tx(&tx_as_hex)?;
		if resp.status != STATUS_OK {
			// unlock funds, the transaction was not accepted
			for source in &arg.sources {
				wallet.transfers[source.transfer_index].spent = false;
			}
			if resp.status == STATUS_BUSY {
				return Err(ErrorKind::DaemonBusy("sendrawtransaction".to_owned()).into());
			}
			return Err(ErrorKind::TxRejected {
				tx_hash: tx_hash.to_hex(),
				status: resp.status,
			}
			.into());
		}
		for source in &arg.sources {
			wallet.transfers[source.transfer_index].spent = true;
		}
	} else {
		for source in &arg.sources {
			wallet.transfers[source.transfer_index].spent = true;
		}
	}

	let recipient = arg
		.destinations
		.iter()
		.map(|dst| wallet.codec.address_to_str(&dst.addr))
		.collect::<Vec<_>>()
		.join(", ");
	add_sent_unconfirmed_tx(wallet, tx.clone(), arg.change_amount, recipient);
	wallet.tx_keys.insert(tx_hash, res.tx_key.secret);

	debug!(
		"transaction {} generated ok, key_images: [{}]",
		tx_hash, key_images
	);
	info!(
		"Transaction successfully sent. <{}>, fee: {}, balance: {}, unlocked: {}",
		tx_hash,
		wallet.codec.get_tx_fee(tx),
		wallet.balance(),
		wallet.unlocked_balance()
	);
	Ok(())
}

/// Record a submitted (or relay-withheld) transaction as pending outbound.
pub fn add_sent_unconfirmed_tx<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	tx: Transaction,
	change_amount: u64,
	recipient: String,
) where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let tx_hash = wallet.codec.tx_hash(&tx);
	let recipient_alias = get_alias_for_address(wallet, &recipient);
	let utd = UnconfirmedOutbound {
		tx,
		change: change_amount,
		sent_time: now(),
		recipient,
		recipient_alias,
	};
	wallet.unconfirmed_txs.insert(tx_hash, utd);

	if let Some(cb) = &wallet.callback {
		let wti = wti_from_unconfirmed(wallet, &wallet.unconfirmed_txs[&tx_hash]);
		cb.on_transfer(&wti);
	}
}

/// Alias lookup is best-effort display sugar; failures degrade to an empty
/// alias.
pub fn get_alias_for_address<C, D, N>(wallet: &Wallet<C, D, N>, address: &str) -> String
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	match wallet.node.get_aliases_by_address(address) {
		Ok(res) => res.alias,
		Err(e) => {
			warn!("failed to get alias for address {}: {}", address, e);
			String::new()
		}
	}
}

/// Project a pending outbound tx into a history-style entry: the shown
/// amount is what actually left the wallet, outputs less change.
pub fn wti_from_unconfirmed<C, D, N>(
	wallet: &Wallet<C, D, N>,
	utd: &UnconfirmedOutbound,
) -> TransferInfo
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let outs = utd.tx.outs_amount();
	let mut wti = discovery::prepare_wti(
		wallet,
		0,
		utd.sent_time,
		&utd.tx,
		outs - utd.change,
		TransferDetails::default(),
	);
	wti.is_income = false;
	wti.destinations = utd.recipient.clone();
	wti.destination_alias = utd.recipient_alias.clone();
	wti
}

/// Rebroadcast every pending outbound transaction. Never fails the caller;
/// the next refresh tick retries anyway.
pub fn resend_unconfirmed<C, D, N>(wallet: &mut Wallet<C, D, N>)
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	if wallet.unconfirmed_txs.is_empty() {
		return;
	}
	let mut raw_txs = Vec::with_capacity(wallet.unconfirmed_txs.len());
	for utd in wallet.unconfirmed_txs.values() {
		info!("Relaying tx: {}", wallet.codec.tx_hash(&utd.tx));
		raw_txs.push(to_hex(&wallet.codec.tx_to_blob(&utd.tx)));
	}
	match wallet.node.relay_txs(&raw_txs) {
		Ok(res) => {
			if res.status == STATUS_OK {
				info!("Relayed {} txs", raw_txs.len());
			} else {
				warn!("relay_txs answered with status: {}", res.status);
			}
		}
		Err(e) => warn!("relay_txs failed: {}", e),
	}
}

/// Refresh the upper transaction size limit from the daemon's block median.
pub fn update_current_tx_limit<C, D, N>(wallet: &mut Wallet<C, D, N>) -> Result<()>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let res = wallet.node.get_info()?;
	if res.status == STATUS_BUSY {
		return Err(ErrorKind::DaemonBusy("getinfo".to_owned()).into());
	}
	if res.status != STATUS_OK {
		return Err(ErrorKind::GetBlocks(res.status).into());
	}
	if res.current_blocks_median < BLOCK_GRANTED_FULL_REWARD_ZONE {
		return Err(ErrorKind::GetBlocks("bad median size".to_owned()).into());
	}
	wallet.upper_transaction_size_limit = res.current_blocks_median - COINBASE_BLOB_RESERVED_SIZE;
	Ok(())
}

/// Select inputs and write the encrypted unsigned-transfer file for cold
/// signing on another host.
pub fn prepare_unsigned_transfer<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	destinations: &[TxDestinationEntry],
	fake_outputs_count: u64,
	unlock_time: u64,
	fee: u64,
	extra: Vec<TxExtra>,
	sources_file: &Path,
) -> Result<()>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let arg = prepare_tx_arg(
		wallet,
		destinations,
		fake_outputs_count,
		unlock_time,
		fee,
		extra,
	)?;
	write_transfer_file(wallet, sources_file, &arg)?;
	info!("Unsigned transfer stored in {}", sources_file.display());
	Ok(())
}

/// Cold half of the offline flow: check the sources were prepared for this
/// wallet, construct and sign, write the encrypted result.
pub fn sign_transfer<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	sources_file: &Path,
	signed_file: &Path,
) -> Result<Transaction>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let arg: CreateTxArg = read_transfer_file(wallet, sources_file)?;
	if arg.spend_pub_key != wallet.account.get_keys().address.spend_public_key {
		return Err(ErrorKind::Internal(
			"the unsigned transfer file was created by a different wallet".to_owned(),
		)
		.into());
	}
	let res = wallet.crypto.construct_tx(wallet.account.get_keys(), &arg)?;
	write_transfer_file(wallet, signed_file, &res)?;
	Ok(res.tx)
}

/// Online half of the offline flow; bookkeeping is identical to a direct
/// `transfer` submission.
pub fn submit_transfer<C, D, N>(
	wallet: &mut Wallet<C, D, N>,
	sources_file: &Path,
	signed_file: &Path,
) -> Result<Transaction>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let arg: CreateTxArg = read_transfer_file(wallet, sources_file)?;
	let res: CreateTxRes = read_transfer_file(wallet, signed_file)?;
	finalize_transaction(wallet, &arg, &res, false)?;
	Ok(res.tx)
}

fn write_transfer_file<C, D, N, T>(
	wallet: &Wallet<C, D, N>,
	path: &Path,
	payload: &T,
) -> Result<()>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
	T: serde::Serialize,
{
	let plain = bincode::serialize(payload)
		.map_err(|e| ErrorKind::Internal(format!("failed to serialize transfer file: {}", e)))?;
	let key = wallet
		.crypto
		.chacha_key_from_secret(&wallet.account.get_keys().view_secret_key);
	let envelope = keystore::seal(&wallet.crypto, &key, &plain);
	let buf = bincode::serialize(&envelope)
		.map_err(|e| ErrorKind::Internal(format!("failed to serialize transfer file: {}", e)))?;
	std::fs::write(path, buf).map_err(|_| ErrorKind::FileSave(path.display().to_string()))?;
	Ok(())
}

fn read_transfer_file<C, D, N, T>(wallet: &Wallet<C, D, N>, path: &Path) -> Result<T>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
	T: serde::de::DeserializeOwned,
{
	let buf = std::fs::read(path).map_err(|_| ErrorKind::FileRead(path.display().to_string()))?;
	let envelope: keystore::EncryptedEnvelope = bincode::deserialize(&buf).map_err(|_| {
		ErrorKind::Internal(format!(
			"failed to deserialize transfer file {}",
			path.display()
		))
	})?;
	let key = wallet
		.crypto
		.chacha_key_from_secret(&wallet.account.get_keys().view_secret_key);
	let plain = keystore::open(&wallet.crypto, &key, &envelope);
	let payload = bincode::deserialize(&plain).map_err(|_| {
		ErrorKind::Internal(format!(
			"failed to decrypt transfer file {}",
			path.display()
		))
	})?;
	Ok(payload)
}
