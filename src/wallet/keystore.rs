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

//! Key and state files: password-encrypted account secrets, the whole-state
//! binary dump, and wallet creation/restore on top of them.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::{thread_rng, Rng};

use crate::common::Result;
use super::consts::{WALLET_ADDRESS_FILE_SUFFIX, WALLET_KEYS_FILE_EXT};
use super::error::ErrorKind;
use super::types::{
	Account, AccountAddress, ChachaIv, ChachaKey, ChainCodec, CryptoProvider, Hash, KeyImage,
	NodeClient, PaymentId, PaymentRecord, SecretKey, TransferInfo, TransferRecord,
	UnconfirmedOutbound,
};
use super::wallet::Wallet;

/// On-disk layout shared by the keys file and the offline transfer files:
/// a clear-text iv followed by the chacha ciphertext.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct EncryptedEnvelope {
	pub iv: ChachaIv,
	pub data: Vec<u8>,
}

pub(crate) fn seal<C: CryptoProvider>(
	crypto: &C,
	key: &ChachaKey,
	plain: &[u8],
) -> EncryptedEnvelope {
	let iv = ChachaIv(thread_rng().gen());
	EncryptedEnvelope {
		iv,
		data: crypto.chacha(plain, key, &iv),
	}
}

pub(crate) fn open<C: CryptoProvider>(
	crypto: &C,
	key: &ChachaKey,
	envelope: &EncryptedEnvelope,
) -> Vec<u8> {
	crypto.chacha(&envelope.data, key, &envelope.iv)
}

/// Serializable projection of the wallet state, dumped and restored as one
/// binary blob. The pool view is transient and deliberately absent.
#[derive(Serialize, Deserialize)]
pub(crate) struct WalletData {
	pub account_public_address: AccountAddress,
	pub blockchain: Vec<Hash>,
	pub transfers: Vec<TransferRecord>,
	pub key_images: HashMap<KeyImage, usize>,
	pub payments: HashMap<PaymentId, Vec<PaymentRecord>>,
	pub transfer_history: Vec<TransferInfo>,
	pub unconfirmed_txs: HashMap<Hash, UnconfirmedOutbound>,
	pub tx_keys: HashMap<Hash, SecretKey>,
}

impl<C, D, N> Wallet<C, D, N>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	/// Create a fresh wallet at `wallet_path`, refusing to overwrite
	/// anything. Returns the restore seed.
	pub fn generate(&mut self, wallet_path: &Path, password: &str) -> Result<Vec<u8>> {
		self.clear();
		self.prepare_file_names(wallet_path);
		self.check_files_absent()?;

		let (keys, restore_seed) = self.crypto.generate_account();
		self.account = Account::new(keys);
		self.account_public_address = self.account.get_keys().address;
		self.is_view_only = false;

		self.store_keys(&self.keys_file.clone(), password, false)?;
		self.write_address_file();
		self.store()?;
		Ok(restore_seed)
	}

	/// Recreate a wallet from a restore seed. The account creation time is
	/// unknown, so the first refresh scans the whole chain.
	pub fn restore(
		&mut self,
		wallet_path: &Path,
		restore_seed: &[u8],
		password: &str,
	) -> Result<()> {
		self.clear();
		self.prepare_file_names(wallet_path);
		self.check_files_absent()?;

		let keys = self.crypto.restore_account(restore_seed)?;
		self.account = Account::from_restore(keys);
		self.account_public_address = self.account.get_keys().address;
		self.is_view_only = false;

		self.store_keys(&self.keys_file.clone(), password, false)?;
		self.write_address_file();
		self.store()?;
		Ok(())
	}

	/// Write a keys file holding the view-only projection of this account.
	pub fn generate_view_wallet(&self, keys_path: &Path, password: &str) -> Result<()> {
		self.store_keys(keys_path, password, true)
	}

	/// Load keys, then the state file if present and matching; a missing,
	/// unreadable or foreign state file falls back to a genesis resync.
	pub fn load(&mut self, wallet_path: &Path, password: &str) -> Result<()> {
		self.clear();
		self.prepare_file_names(wallet_path);
		if !self.keys_file.exists() {
			return Err(ErrorKind::FileNotFound(self.keys_file.display().to_string()).into());
		}

		let (account, is_view_only) = self.load_keys(&self.keys_file.clone(), password)?;
		self.account = account;
		self.is_view_only = is_view_only;
		info!(
			"Loaded wallet keys file, with public address: {}",
			self.address_str()
		);

		if !self.wallet_file.exists() {
			debug!(
				"file not found: {}, starting with empty blockchain",
				self.wallet_file.display()
			);
			self.account_public_address = self.account.get_keys().address;
			return Ok(());
		}

		let address = self.account.get_keys().address;
		let need_resync = match fs::read(&self.wallet_file) {
			Err(_) => true,
			Ok(buf) => match bincode::deserialize::<WalletData>(&buf) {
				Err(_) => true,
				Ok(data) => {
					if data.blockchain.is_empty() || data.account_public_address != address {
						true
					} else {
						self.install_data(data);
						false
					}
				}
			},
		};
		if need_resync {
			warn!("Wallet state file unusable, resyncing from genesis...");
			self.clear();
			self.account_public_address = address;
		}
		self.local_height = self.blockchain.len() as u64;
		Ok(())
	}

	/// Dump the whole state to the wallet file.
	pub fn store(&self) -> Result<()> {
		let data = WalletData {
			account_public_address: self.account_public_address,
			blockchain: self.blockchain.clone(),
			transfers: self.transfers.clone(),
			key_images: self.key_images.clone(),
			payments: self.payments.clone(),
			transfer_history: self.transfer_history.clone(),
			unconfirmed_txs: self.unconfirmed_txs.clone(),
			tx_keys: self.tx_keys.clone(),
		};
		let buf = bincode::serialize(&data).map_err(|e| {
			ErrorKind::Internal(format!("failed to serialize wallet state: {}", e))
		})?;
		fs::write(&self.wallet_file, buf)
			.map_err(|_| ErrorKind::FileSave(self.wallet_file.display().to_string()))?;
		Ok(())
	}

	/// Encrypt the account (or its view-only projection) to a keys file.
	/// The file is written once and afterwards only ever read.
	pub(crate) fn store_keys(&self, path: &Path, password: &str, view_only: bool) -> Result<()> {
		let account = if view_only {
			self.account.view_only()
		} else {
			self.account.clone()
		};
		let plain = bincode::serialize(&account)
			.map_err(|e| ErrorKind::Internal(format!("failed to serialize wallet keys: {}", e)))?;
		let key = self.crypto.chacha_key_from_password(password);
		let envelope = seal(&self.crypto, &key, &plain);
		let buf = bincode::serialize(&envelope)
			.map_err(|e| ErrorKind::Internal(format!("failed to serialize keys file: {}", e)))?;
		fs::write(path, buf).map_err(|_| ErrorKind::FileSave(path.display().to_string()))?;
		Ok(())
	}

	/// Decrypt a keys file and verify the secrets reproduce the recorded
	/// public keys; any mismatch reads as a wrong password.
	pub(crate) fn load_keys(&self, path: &Path, password: &str) -> Result<(Account, bool)> {
		let buf = fs::read(path).map_err(|_| ErrorKind::FileRead(path.display().to_string()))?;
		let envelope: EncryptedEnvelope = bincode::deserialize(&buf).map_err(|_| {
			ErrorKind::Internal(format!("failed to deserialize keys file {}", path.display()))
		})?;
		let key = self.crypto.chacha_key_from_password(password);
		let plain = open(&self.crypto, &key, &envelope);
		let account: Account =
			bincode::deserialize(&plain).map_err(|_| ErrorKind::InvalidPassword)?;

		let keys = account.get_keys();
		let view_ok = self
			.crypto
			.secret_to_public(&keys.view_secret_key)
			.map(|public| public == keys.address.view_public_key)
			.unwrap_or(false);
		let is_view_only = keys.spend_secret_key.is_null();
		let spend_ok = is_view_only
			|| self
				.crypto
				.secret_to_public(&keys.spend_secret_key)
				.map(|public| public == keys.address.spend_public_key)
				.unwrap_or(false);
		if !view_ok || !spend_ok {
			return Err(ErrorKind::InvalidPassword.into());
		}
		Ok((account, is_view_only))
	}

	fn install_data(&mut self, data: WalletData) {
		self.account_public_address = data.account_public_address;
		self.blockchain = data.blockchain;
		self.transfers = data.transfers;
		self.key_images = data.key_images;
		self.payments = data.payments;
		self.transfer_history = data.transfer_history;
		self.unconfirmed_txs = data.unconfirmed_txs;
		self.tx_keys = data.tx_keys;
	}

	fn check_files_absent(&self) -> Result<()> {
		if self.wallet_file.exists() {
			return Err(ErrorKind::FileExists(self.wallet_file.display().to_string()).into());
		}
		if self.keys_file.exists() {
			return Err(ErrorKind::FileExists(self.keys_file.display().to_string()).into());
		}
		Ok(())
	}

	/// `<wallet>` and `<wallet>.keys` from either name.
	fn prepare_file_names(&mut self, wallet_path: &Path) {
		if wallet_path.extension().and_then(|ext| ext.to_str()) == Some(WALLET_KEYS_FILE_EXT) {
			self.keys_file = wallet_path.to_path_buf();
			self.wallet_file = wallet_path.with_extension("");
		} else {
			self.wallet_file = wallet_path.to_path_buf();
			let mut keys_file = wallet_path.as_os_str().to_owned();
			keys_file.push(".");
			keys_file.push(WALLET_KEYS_FILE_EXT);
			self.keys_file = PathBuf::from(keys_file);
		}
	}

	/// Convenience sidecar with the plain address; losing it is harmless.
	fn write_address_file(&self) {
		let mut path = self.wallet_file.as_os_str().to_owned();
		path.push(WALLET_ADDRESS_FILE_SUFFIX);
		if let Err(e) = fs::write(PathBuf::from(path), self.address_str()) {
			warn!("String with address text not saved: {}", e);
		}
	}
}

#[cfg(test)]
mod test {
	use chrono::Utc;
	use tempfile::tempdir;

	use crate::testutil::{pay_tx, test_wallet, MockCodec, MockCrypto, MockNode, TestWallet};
	use crate::wallet::ErrorKind;
	use super::super::wallet::Wallet;

	fn fresh_wallet(node: &MockNode) -> TestWallet {
		Wallet::new(MockCrypto::new(), MockCodec, node.clone())
	}

	fn kind_of(err: failure::Error) -> ErrorKind {
		err.downcast::<ErrorKind>().expect("engine error kind")
	}

	#[test]
	fn generate_writes_keys_state_and_address_sidecar() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("wally");
		let (mut wallet, node) = test_wallet(b"gen");
		let seed = wallet.generate(&path, "hunter2").unwrap();
		assert!(!seed.is_empty());
		assert!(path.exists());
		assert!(dir.path().join("wally.keys").exists());
		let sidecar = std::fs::read_to_string(dir.path().join("wally.address.txt")).unwrap();
		assert_eq!(wallet.address_str(), sidecar);

		let mut loaded = fresh_wallet(&node);
		loaded.load(&path, "hunter2").unwrap();
		assert_eq!(wallet.account(), loaded.account());
		assert!(!loaded.is_view_only());
		assert_eq!(1, loaded.local_height());
	}

	#[test]
	fn generate_refuses_to_overwrite() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("wally");
		let (mut wallet, node) = test_wallet(b"dup");
		wallet.generate(&path, "pw").unwrap();

		let mut second = fresh_wallet(&node);
		match kind_of(second.generate(&path, "pw").unwrap_err()) {
			ErrorKind::FileExists(_) => {}
			kind => panic!("unexpected error kind: {}", kind),
		}
	}

	#[test]
	fn wrong_password_is_rejected_without_touching_the_account() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("wally");
		let (mut wallet, node) = test_wallet(b"pwd");
		wallet.generate(&path, "right").unwrap();

		let loaded = fresh_wallet(&node);
		let before = loaded.account().clone();
		let err = loaded.load_keys(&dir.path().join("wally.keys"), "wrong").unwrap_err();
		match kind_of(err) {
			ErrorKind::InvalidPassword => {}
			kind => panic!("unexpected error kind: {}", kind),
		}
		assert_eq!(&before, loaded.account());
	}

	#[test]
	fn restore_rebuilds_the_same_account() {
		let dir = tempdir().unwrap();
		let (mut wallet, node) = test_wallet(b"seed");
		let seed = wallet.generate(&dir.path().join("one"), "pw").unwrap();
		let address = *wallet.address();

		let mut restored = fresh_wallet(&node);
		restored
			.restore(&dir.path().join("two"), &seed, "pw2")
			.unwrap();
		assert_eq!(&address, restored.address());
		// a restored account scans the whole chain
		assert_eq!(0, restored.account().created_at());
	}

	#[test]
	fn view_wallet_projection_loads_without_spend_secret() {
		let dir = tempdir().unwrap();
		let (mut wallet, node) = test_wallet(b"view");
		wallet.generate(&dir.path().join("full"), "pw").unwrap();
		let view_keys = dir.path().join("watcher.keys");
		wallet.generate_view_wallet(&view_keys, "vpw").unwrap();

		let loaded = fresh_wallet(&node);
		let (account, is_view_only) = loaded.load_keys(&view_keys, "vpw").unwrap();
		assert!(is_view_only);
		assert!(account.get_keys().spend_secret_key.is_null());
		assert_eq!(wallet.address(), &account.get_keys().address);
		assert_eq!(
			wallet.account().get_keys().view_secret_key,
			account.get_keys().view_secret_key
		);
	}

	#[test]
	fn state_round_trips_through_store_and_load() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("wally");
		let (mut wallet, node) = test_wallet(b"state");
		wallet.generate(&path, "pw").unwrap();

		let now = Utc::now().timestamp() as u64;
		let addr = *wallet.address();
		node.push_block(vec![pay_tx(&addr, &[4_000], 0, b"s1", None)], now);
		node.push_block(vec![], now + 1);
		wallet.refresh().unwrap();
		assert_eq!(1, wallet.transfers().len());
		wallet.store().unwrap();

		let mut loaded = fresh_wallet(&node);
		loaded.load(&path, "pw").unwrap();
		assert_eq!(wallet.transfers, loaded.transfers);
		assert_eq!(wallet.key_images, loaded.key_images);
		assert_eq!(wallet.blockchain, loaded.blockchain);
		assert_eq!(wallet.transfer_history, loaded.transfer_history);
		assert_eq!(3, loaded.local_height());
		assert_eq!(4_000, loaded.balance());

		// and the reloaded wallet keeps scanning from where it stopped
		node.push_block(vec![], now + 2);
		let (blocks_fetched, _) = loaded.refresh().unwrap();
		assert_eq!(1, blocks_fetched);
	}

	#[test]
	fn foreign_state_file_triggers_resync_from_genesis() {
		let dir = tempdir().unwrap();
		let (mut first, node) = test_wallet(b"owner1");
		first.generate(&dir.path().join("first"), "pw").unwrap();
		let now = Utc::now().timestamp() as u64;
		let addr = *first.address();
		node.push_block(vec![pay_tx(&addr, &[500], 0, b"f1", None)], now);
		first.refresh().unwrap();
		first.store().unwrap();

		let (mut second, _) = test_wallet(b"owner2");
		second.generate(&dir.path().join("second"), "pw").unwrap();
		// swap in the first wallet's state file
		std::fs::copy(dir.path().join("first"), dir.path().join("second")).unwrap();

		let mut loaded = fresh_wallet(&node);
		loaded.load(&dir.path().join("second"), "pw").unwrap();
		assert!(loaded.transfers().is_empty());
		assert_eq!(1, loaded.local_height());
		assert_eq!(1, loaded.blockchain.len());
	}

	#[test]
	fn missing_keys_file_is_reported() {
		let dir = tempdir().unwrap();
		let (mut wallet, _node) = test_wallet(b"missing");
		match kind_of(wallet.load(&dir.path().join("nope"), "pw").unwrap_err()) {
			ErrorKind::FileNotFound(_) => {}
			kind => panic!("unexpected error kind: {}", kind),
		}
	}

	#[test]
	fn keys_file_name_is_accepted_directly() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("wally");
		let (mut wallet, node) = test_wallet(b"byname");
		wallet.generate(&path, "pw").unwrap();

		let mut loaded = fresh_wallet(&node);
		loaded.load(&dir.path().join("wally.keys"), "pw").unwrap();
		assert_eq!(wallet.address(), loaded.address());
	}
}
