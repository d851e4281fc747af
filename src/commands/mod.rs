// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod auth;
pub mod users;
pub mod sales;
pub mod products;
pub mod expenses;
pub mod dashboard;
pub mod reports;
pub mod importer;
pub mod notifications;
pub mod analytics;
pub mod recommend;
pub mod forecast;
pub mod sample;
pub mod reset;
pub mod settings;
