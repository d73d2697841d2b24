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

use chrono::Utc;

use super::{PublicKey, SecretKey};

/// The public half of an account: the pair of keys encoded in its address.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct AccountAddress {
	pub spend_public_key: PublicKey,
	pub view_public_key: PublicKey,
}

/// Full key material of an account. The spend secret is null for a
/// view-only wallet.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct AccountKeys {
	pub address: AccountAddress,
	pub spend_secret_key: SecretKey,
	pub view_secret_key: SecretKey,
}

/// An account plus its creation time, which bounds how far back the chain
/// scan has to look for outputs.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Account {
	keys: AccountKeys,
	created_at: u64,
}

impl Account {
	/// Wrap freshly generated keys, stamping the creation time with the
	/// current clock.
	pub fn new(keys: AccountKeys) -> Account {
		Account {
			keys,
			created_at: Utc::now().timestamp() as u64,
		}
	}

	/// Wrap keys recovered from a restore seed. The creation time is unknown,
	/// so the whole chain is eligible for scanning.
	pub fn from_restore(keys: AccountKeys) -> Account {
		Account {
			keys,
			created_at: 0,
		}
	}

	pub fn get_keys(&self) -> &AccountKeys {
		&self.keys
	}

	pub fn created_at(&self) -> u64 {
		self.created_at
	}

	/// View-only projection: same address and view secret, spend secret
	/// zeroed out.
	pub fn view_only(&self) -> Account {
		let mut account = self.clone();
		account.keys.spend_secret_key = SecretKey::null();
		account
	}

	pub fn is_view_only(&self) -> bool {
		self.keys.spend_secret_key.is_null()
	}
}
