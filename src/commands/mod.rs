// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod config;
pub mod users;
pub mod securities;
pub mod transactions;
pub mod dividends;
pub mod rates;
pub mod prices;
pub mod stats;
pub mod doctor;
