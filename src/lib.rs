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

//! Client-side wallet engine for the Peridot cryptocurrency.
//!
//! The engine owns the secrets of a single account, replays the blockchain
//! received from a remote node against those secrets to discover which
//! outputs the account controls and when they are spent, and constructs,
//! signs and submits new transactions. Curve primitives, wire codecs and the
//! node transport are supplied by the embedder through the capability traits
//! in [`wallet::types`].

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
extern crate bincode;
extern crate chrono;
extern crate failure;
extern crate rand;
extern crate serde;

pub mod common;
mod internal;
pub mod wallet;

#[cfg(test)]
mod testutil;
