// SPDX-License-Identifier: Apache-2.0
pub mod bindings;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod resolver;
pub mod token;
