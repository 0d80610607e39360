// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec Roundtrip Benchmark
//!
//! Measures build()/parse() cost for the three AVDECC wire frames on the
//! hot receive/send path: ADPDU (fixed 82 bytes), AECPDU/AEM (fixed header
//! plus a variable descriptor payload), and ACMPDU (fixed 70 bytes).

use avdecc::codec::{AcmpFrame, AcmpMessageType, AdpFrame, AdpMessageType, AecpAemFrame, AecpMessageType};
use avdecc::config::AVDECC_MULTICAST_MAC;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box as bb;

const SRC_MAC: [u8; 6] = [0x00, 0x1b, 0x21, 0x11, 0x22, 0x33];

fn sample_adp() -> AdpFrame {
    AdpFrame {
        message_type: AdpMessageType::EntityAvailable,
        valid_time: 10,
        entity_id: 0xAABB_CCFF_FEDD_EEFF,
        entity_model_id: 0x0011_2233_4455_6677,
        entity_capabilities: 0x0000_0008,
        talker_stream_sources: 2,
        talker_capabilities: 0x4801,
        listener_stream_sinks: 2,
        listener_capabilities: 0x4801,
        controller_capabilities: 0,
        available_index: 7,
        gptp_grandmaster_id: 0x0011_2233_4455_6677,
        gptp_domain_number: 0,
        identify_control_index: 0,
        interface_index: 0,
        association_id: 0,
    }
}

fn sample_acmp() -> AcmpFrame {
    AcmpFrame {
        message_type: AcmpMessageType::ConnectRxCommand,
        status: 0,
        stream_id: 0,
        controller_entity_id: 0x0011_2233_4455_6677,
        talker_entity_id: 0xAABB_CCFF_FEDD_EEFF,
        listener_entity_id: 0x1122_33FF_FE44_5566,
        talker_unique_id: 0,
        listener_unique_id: 0,
        stream_dest_mac: [0; 6],
        connection_count: 0,
        sequence_id: 99,
        flags: 0,
    }
}

fn sample_aem(payload_len: usize) -> AecpAemFrame {
    AecpAemFrame {
        message_type: AecpMessageType::AemResponse,
        status: 0,
        target_entity_id: 0xAABB_CCFF_FEDD_EEFF,
        controller_entity_id: 0x0011_2233_4455_6677,
        sequence_id: 42,
        command_type: 0x0004,
        descriptor_type: 0x0005,
        descriptor_index: 0,
        payload: vec![0xAB; payload_len],
    }
}

fn bench_adp_roundtrip(c: &mut Criterion) {
    let frame = sample_adp();
    c.bench_function("adp_build", |b| {
        b.iter(|| bb(frame.build(SRC_MAC, AVDECC_MULTICAST_MAC)));
    });

    let bytes = frame.build(SRC_MAC, AVDECC_MULTICAST_MAC);
    c.bench_function("adp_parse", |b| {
        b.iter(|| bb(AdpFrame::parse(&bytes).unwrap()));
    });
}

fn bench_acmp_roundtrip(c: &mut Criterion) {
    let frame = sample_acmp();
    c.bench_function("acmp_build", |b| {
        b.iter(|| bb(frame.build(SRC_MAC, AVDECC_MULTICAST_MAC)));
    });

    let bytes = frame.build(SRC_MAC, AVDECC_MULTICAST_MAC);
    c.bench_function("acmp_parse", |b| {
        b.iter(|| bb(AcmpFrame::parse(&bytes).unwrap()));
    });
}

fn bench_aem_roundtrip_by_payload_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("aem_roundtrip_by_payload_size");
    for payload_len in [0usize, 64, 308, 1024] {
        let frame = sample_aem(payload_len);
        group.bench_with_input(BenchmarkId::new("build", payload_len), &frame, |b, frame| {
            b.iter(|| bb(frame.build(SRC_MAC, AVDECC_MULTICAST_MAC).unwrap()));
        });

        let bytes = frame.build(SRC_MAC, AVDECC_MULTICAST_MAC).unwrap();
        group.bench_with_input(BenchmarkId::new("parse", payload_len), &bytes, |b, bytes| {
            b.iter(|| bb(AecpAemFrame::parse(bytes).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_adp_roundtrip,
    bench_acmp_roundtrip,
    bench_aem_roundtrip_by_payload_size
);
criterion_main!(benches);
