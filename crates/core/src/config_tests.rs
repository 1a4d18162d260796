// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_match_spec_values() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.min_schedule_interval_secs(), 1);
    assert_eq!(cfg.max_schedule_interval_secs(), 3600);
    assert_eq!(cfg.acknowledge_countdown_secs(), 5);
    assert_eq!(cfg.blob_compression_level(), 6);
}

#[test]
fn clamp_interval_saturates_at_bounds() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.clamp_interval(0), 1);
    assert_eq!(cfg.clamp_interval(10_000), 3600);
    assert_eq!(cfg.clamp_interval(120), 120);
}

#[test]
fn setters_are_chainable() {
    let cfg = EngineConfig::default()
        .min_schedule_interval_secs(2)
        .max_schedule_interval_secs(60)
        .acknowledge_countdown_secs(1)
        .blob_compression_level(9);
    assert_eq!(cfg.min_schedule_interval_secs(), 2);
    assert_eq!(cfg.max_schedule_interval_secs(), 60);
    assert_eq!(cfg.acknowledge_countdown_secs(), 1);
    assert_eq!(cfg.blob_compression_level(), 9);
}
