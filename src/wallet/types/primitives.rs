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

//! Plain-old-data newtypes shared across the engine. The curve math behind
//! them lives entirely in the `CryptoProvider` capability; here they are
//! opaque byte arrays with hex display.

use crate::common::to_hex;
use std::fmt;

macro_rules! bytes32_newtype {
	($name:ident) => {
		#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
		pub struct $name(pub [u8; 32]);

		impl $name {
			pub fn null() -> $name {
				$name([0u8; 32])
			}

			pub fn is_null(&self) -> bool {
				self.0 == [0u8; 32]
			}

			pub fn to_hex(&self) -> String {
				to_hex(&self.0)
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.to_hex())
			}
		}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}<{}>", stringify!($name), self.to_hex())
			}
		}
	};
}

bytes32_newtype!(Hash);
bytes32_newtype!(PublicKey);
bytes32_newtype!(SecretKey);
bytes32_newtype!(KeyImage);

/// A public/secret key pair, e.g. the one-time ephemeral keys derived for an
/// owned output, or the per-transaction key returned by tx construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct KeyPair {
	pub public: PublicKey,
	pub secret: SecretKey,
}

/// Schnorr-style signature: a pair of scalars.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Signature {
	pub c: [u8; 32],
	pub r: [u8; 32],
}

impl Signature {
	pub fn to_hex(&self) -> String {
		let mut s = to_hex(&self.c);
		s.push_str(&to_hex(&self.r));
		s
	}
}

/// Symmetric key for the chacha stream cipher protecting wallet files.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ChachaKey(pub [u8; 32]);

/// Initialization vector stored in clear next to each encrypted blob.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct ChachaIv(pub [u8; 8]);

/// Opaque payment id attached to a transaction's extra field.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PaymentId(pub Vec<u8>);

impl PaymentId {
	pub fn to_hex(&self) -> String {
		to_hex(&self.0)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Display for PaymentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

impl fmt::Debug for PaymentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "PaymentId<{}>", self.to_hex())
	}
}
