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

use super::{Block, Transaction, TransferInfo};

/// Observer hooks invoked synchronously from inside the mutating engine
/// operations. Implementations must not call back into the engine.
pub trait WalletCallback {
	fn on_new_block(&self, _height: u64, _block: &Block) {}

	fn on_money_received(&self, _height: u64, _tx: &Transaction, _out_index: usize) {}

	fn on_money_spent(
		&self,
		_height: u64,
		_in_tx: &Transaction,
		_out_index: usize,
		_spending_tx: &Transaction,
	) {
	}

	fn on_transfer(&self, _info: &TransferInfo) {}
}
