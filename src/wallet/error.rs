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

//! Error types for the wallet engine

use failure::Fail;

/// Wallet errors, mostly wrappers around node, codec or I/O failures.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
	/// No connection could be established with the daemon
	#[fail(display = "no connection to daemon: {}", _0)]
	NoConnection(String),

	/// The daemon answered BUSY; the caller may retry
	#[fail(display = "daemon is busy: {}", _0)]
	DaemonBusy(String),

	/// The daemon refused a block request
	#[fail(display = "failed to get blocks from daemon: {}", _0)]
	GetBlocks(String),

	/// The daemon refused an output-indexes request
	#[fail(display = "failed to get output indexes from daemon: {}", _0)]
	GetOutIndexes(String),

	/// A transaction blob received from the daemon could not be parsed
	#[fail(display = "failed to parse transaction from blob")]
	TxParse,

	/// A block blob received from the daemon could not be parsed
	#[fail(display = "failed to parse block from blob")]
	BlockParse,

	/// The extra field of a transaction carries no public key
	#[fail(display = "failed to parse public key from tx extra, tx {}", _0)]
	TxExtraParse(String),

	/// Output ownership lookup failed
	#[fail(display = "failed to lookup account outputs, tx {}", _0)]
	AccOutsLookup(String),

	/// A constructed transaction exceeds the network blob limit
	#[fail(display = "transaction is too big: {} bytes, limit {}", _0, _1)]
	TxTooBig(u64, u64),

	/// A constructed transaction carries an input variant other than to-key
	#[fail(display = "unexpected input type in transaction {}", _0)]
	UnexpectedTxInType(String),

	/// The daemon rejected a submitted transaction
	#[fail(display = "transaction {} was rejected by daemon with status: {}", tx_hash, status)]
	TxRejected {
		/// Hash of the rejected transaction
		tx_hash: String,
		/// Status string returned by the daemon
		status: String,
	},

	/// Not enough unlocked funds to cover the requested transfer
	#[fail(display = "not enough money: available {}, required {}", available, needed)]
	NotEnoughMoney {
		/// Total of selectable outputs
		available: u64,
		/// Amount plus fee requested
		needed: u64,
	},

	/// The keys file could not be decrypted and verified with this password
	#[fail(display = "invalid password")]
	InvalidPassword,

	/// Refusing to overwrite an existing wallet or keys file
	#[fail(display = "file already exists: {}", _0)]
	FileExists(String),

	/// The requested wallet file does not exist
	#[fail(display = "file not found: {}", _0)]
	FileNotFound(String),

	/// A wallet file could not be read
	#[fail(display = "failed to read file: {}", _0)]
	FileRead(String),

	/// A wallet file could not be written
	#[fail(display = "failed to save file: {}", _0)]
	FileSave(String),

	/// An internal invariant was violated; the current operation is aborted
	#[fail(display = "wallet internal error: {}", _0)]
	Internal(String),
}
