// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod parties;
pub mod properties;
pub mod contracts;
pub mod adjustments;
pub mod obligations;
pub mod cashbook;
pub mod billing;
pub mod reports;
pub mod exporter;
pub mod doctor;
pub mod settings;
