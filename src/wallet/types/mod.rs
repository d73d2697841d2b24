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

mod account;
mod callback;
mod codec;
mod crypto_provider;
mod node_client;
mod payment;
mod primitives;
mod transaction;
mod transfer;
mod unconfirmed;

pub use self::account::{Account, AccountAddress, AccountKeys};
pub use self::callback::WalletCallback;
pub use self::codec::ChainCodec;
pub use self::crypto_provider::{
	CreateTxArg, CreateTxRes, CryptoProvider, TxDestinationEntry, TxDustPolicy, TxSourceEntry,
};
pub use self::node_client::{
	AliasResponse, BlockCompleteEntry, GetBlocksResponse, NodeClient, NodeInfoResponse,
	OutputIndexesResponse, StatusResponse, TxPoolResponse, STATUS_BUSY, STATUS_OK,
};
pub use self::payment::PaymentRecord;
pub use self::primitives::{
	ChachaIv, ChachaKey, Hash, KeyImage, KeyPair, PaymentId, PublicKey, SecretKey, Signature,
};
pub use self::transaction::{
	is_mix_attr_compatible, Block, Transaction, TxExtra, TxIn, TxInToKey, TxOut, TxOutTarget,
};
pub use self::transfer::{
	GetTransfersRequest, GetTransfersResponse, TransferDetails, TransferInfo, TransferRecord,
};
pub use self::unconfirmed::UnconfirmedOutbound;
