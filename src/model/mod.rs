// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entity/descriptor data model.

pub mod descriptor;
pub mod entity;

pub use descriptor::{primary_name_offset, ConfigurationDescriptors, Descriptor, DescriptorKey};
pub use entity::{Entity, EntityStatus};
