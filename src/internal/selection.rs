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

//! Selection of inputs for building transactions

use std::collections::BTreeMap;

use failure::Error;

use crate::wallet::error::ErrorKind;
use crate::wallet::types::{is_mix_attr_compatible, ChainCodec, CryptoProvider, NodeClient};
use crate::wallet::Wallet;

/// Pick unspent, unlocked, mix-compatible transfers covering `needed_money`.
///
/// Outputs are bucketed by denomination; each round takes the smallest
/// bucket that covers the remainder in one output, or failing that one
/// output from the largest bucket. Returns the total selected and the
/// indices of the selected transfer records; the caller checks the total
/// against what it needs.
pub fn select_transfers<C, D, N>(
	wallet: &Wallet<C, D, N>,
	needed_money: u64,
	fake_outputs_count: u64,
	_dust: u64,
	outs_to_spend: &[usize],
) -> Result<(u64, Vec<usize>), Error>
where
	C: CryptoProvider,
	D: ChainCodec,
	N: NodeClient,
{
	let allowed: Vec<usize> = if outs_to_spend.is_empty() {
		// all outs are allowed to be spent
		(0..wallet.transfers.len()).collect()
	} else {
		for &idx in outs_to_spend {
			if idx >= wallet.transfers.len() {
				return Err(
					ErrorKind::Internal(format!("invalid output index given: {}", idx)).into(),
				);
			}
		}
		outs_to_spend.to_vec()
	};

	let mut found_free_amounts: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
	for i in allowed {
		let td = &wallet.transfers[i];
		if !td.spent
			&& wallet.is_transfer_unlocked(td)
			&& is_mix_attr_compatible(td.mix_attr(), fake_outputs_count)
		{
			found_free_amounts
				.entry(td.amount())
				.or_insert_with(Vec::new)
				.push(i);
		}
	}

	Ok(select_indices_for_transfer(
		&mut found_free_amounts,
		needed_money,
	))
}

fn select_indices_for_transfer(
	found_free_amounts: &mut BTreeMap<u64, Vec<usize>>,
	needed_money: u64,
) -> (u64, Vec<usize>) {
	let mut found_money = 0u64;
	let mut selected_indices = Vec::new();
	while found_money < needed_money && !found_free_amounts.is_empty() {
		let covering = found_free_amounts
			.range(needed_money - found_money..)
			.next()
			.map(|(amount, _)| *amount);
		let amount = match covering {
			Some(amount) => amount,
			// no single output covers the remainder, take from the largest
			// bucket and keep going
			None => *found_free_amounts.keys().next_back().unwrap(),
		};
		let indices = found_free_amounts.get_mut(&amount).unwrap();
		found_money += amount;
		selected_indices.push(indices.pop().unwrap());
		if indices.is_empty() {
			found_free_amounts.remove(&amount);
		}
		if covering.is_some() {
			break;
		}
	}
	(found_money, selected_indices)
}
