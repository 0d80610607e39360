// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tick Sweep Benchmark
//!
//! Measures `Controller::tick()` cost as the number of tracked entities
//! grows. `tick()` walks every known entity once per call (retry/timeout
//! checks, enumeration driver advancement), so its cost is the thing an
//! embedder calling it at [`avdecc::config::RECOMMENDED_TICK_PERIOD`] cares
//! about most as a deployment scales up.

use avdecc::codec::{AdpFrame, AdpMessageType};
use avdecc::config::AVDECC_MULTICAST_MAC;
use avdecc::platform::{PlatformInterface, SendError};
use avdecc::{Controller, ControllerConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

/// Send path that drops every frame; this benchmark only cares about
/// `tick()`'s own bookkeeping cost, not transport.
struct NullPlatform {
    mac: u64,
}

impl PlatformInterface for NullPlatform {
    fn mac_addr(&self) -> u64 {
        self.mac
    }

    fn send_frame(&self, _frame: &[u8]) -> Result<(), SendError> {
        Ok(())
    }
}

fn entity_available(entity_id: u64, available_index: u32) -> AdpFrame {
    AdpFrame {
        message_type: AdpMessageType::EntityAvailable,
        valid_time: 62,
        entity_id,
        entity_model_id: 0x0011_2233_4455_6677,
        entity_capabilities: 0,
        talker_stream_sources: 2,
        talker_capabilities: 0x4801,
        listener_stream_sinks: 2,
        listener_capabilities: 0x4801,
        controller_capabilities: 0,
        available_index,
        gptp_grandmaster_id: 0,
        gptp_domain_number: 0,
        identify_control_index: 0,
        interface_index: 0,
        association_id: 0,
    }
}

fn controller_with_entities(count: u64) -> Controller<NullPlatform> {
    let platform = NullPlatform { mac: 0x0000_AABB_CCDD_EEFF };
    let ctl = Controller::new(platform, ControllerConfig::default());
    for i in 0..count {
        let entity_id = 0xAABB_CC00_0000_0000 | i;
        let bytes = entity_available(entity_id, 0).build([0x02; 6], AVDECC_MULTICAST_MAC);
        ctl.on_rx_frame(&bytes);
    }
    ctl
}

fn bench_tick_by_entity_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_by_entity_count");
    for &count in &[1u64, 16, 64, 256] {
        let ctl = controller_with_entities(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &ctl, |b, ctl| {
            b.iter(|| ctl.tick());
        });
    }
    group.finish();
}

fn bench_on_rx_frame_refresh(c: &mut Criterion) {
    let ctl = controller_with_entities(64);
    let mut available_index = 1u32;
    c.bench_function("on_rx_frame_refresh_known_entity", |b| {
        b.iter(|| {
            let bytes = entity_available(0xAABB_CC00_0000_0000, available_index)
                .build([0x02; 6], AVDECC_MULTICAST_MAC);
            ctl.on_rx_frame(&bytes);
            available_index += 1;
        });
    });
}

criterion_group!(benches, bench_tick_by_entity_count, bench_on_rx_frame_refresh);
criterion_main!(benches);
