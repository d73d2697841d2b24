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

//! Lower-level wallet machinery: output discovery, chain and pool scanning,
//! input selection and transaction orchestration. Everything here operates
//! on the `Wallet` state and is reached through its public methods.

pub mod discovery;
pub mod scan;
pub mod selection;
pub mod tx;
