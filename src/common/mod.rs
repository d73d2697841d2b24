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

use std::fmt::Write;
use std::result::Result as StdResult;

pub use failure::Error;

pub type Result<T> = StdResult<T, Error>;

/// Encode the provided bytes into a hex string
pub fn to_hex(bytes: &[u8]) -> String {
	let mut s = String::with_capacity(bytes.len() * 2);
	for byte in bytes {
		write!(&mut s, "{:02x}", byte).expect("Unable to write");
	}
	s
}

/// Decode a hex string into bytes.
pub fn from_hex(hex_str: &str) -> Option<Vec<u8>> {
	let hex_trim = hex_str.trim_start_matches("0x").trim();
	if hex_trim.len() % 2 == 1 {
		return None;
	}
	let mut vec = Vec::with_capacity(hex_trim.len() / 2);
	for i in 0..hex_trim.len() / 2 {
		match u8::from_str_radix(&hex_trim[2 * i..2 * i + 2], 16) {
			Ok(b) => vec.push(b),
			Err(_) => return None,
		}
	}
	Some(vec)
}

#[cfg(test)]
mod test {
	use super::{from_hex, to_hex};

	#[test]
	fn hex_round_trip() {
		let bytes = vec![0u8, 1, 15, 16, 127, 128, 255];
		let s = to_hex(&bytes);
		assert_eq!("00010f107f80ff", s);
		assert_eq!(Some(bytes), from_hex(&s));
	}

	#[test]
	fn hex_rejects_odd_length() {
		assert_eq!(None, from_hex("abc"));
		assert_eq!(None, from_hex("zz"));
	}
}
