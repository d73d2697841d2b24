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

//! Currency constants shared by the wallet engine.

/// Number of blocks a fresh output must age before it becomes spendable.
pub const DEFAULT_TX_SPENDABLE_AGE: u64 = 10;

/// `unlock_time` values below this are block heights, above it Unix seconds.
pub const MAX_BLOCK_NUMBER: u64 = 500_000_000;

/// Height slack granted when deciding whether a height-locked tx is spendable.
pub const LOCKED_TX_ALLOWED_DELTA_BLOCKS: u64 = 1;

/// Clock slack granted when deciding whether a time-locked tx is spendable.
pub const LOCKED_TX_ALLOWED_DELTA_SECONDS: u64 = 86_400;

/// Median block size zone within which blocks carry full reward.
pub const BLOCK_GRANTED_FULL_REWARD_ZONE: u64 = 128_000;

/// Blob space reserved in a block for the coinbase transaction.
pub const COINBASE_BLOB_RESERVED_SIZE: u64 = 600;

/// Hard upper bound on a serialized transaction accepted by the network.
pub const MAX_TRANSACTION_BLOB_SIZE: u64 =
	BLOCK_GRANTED_FULL_REWARD_ZONE - COINBASE_BLOB_RESERVED_SIZE * 2;

/// Blocks older than the account creation time minus this window are not
/// scanned for outputs. Covers a badly set user clock.
pub const SCAN_TIMESTAMP_WINDOW: u64 = 86_400;

/// Extension of the encrypted keys file placed next to the wallet file.
pub const WALLET_KEYS_FILE_EXT: &str = "keys";

/// Suffix of the plain-text address sidecar written on generate/restore.
pub const WALLET_ADDRESS_FILE_SUFFIX: &str = ".address.txt";
