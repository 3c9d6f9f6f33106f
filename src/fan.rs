use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of entries in every EC curve/timing table.
pub const CURVE_POINTS: usize = 10;

/// Nominal full-speed RPM per fan, used to derive duty percentages.
pub const MAX_FAN1_RPM: u16 = 5200;
pub const MAX_FAN2_RPM: u16 = 5000;

/// Snapshot of the EC's fan state, as read by `EcController::read_status`.
///
/// Every table always holds exactly [`CURVE_POINTS`] entries — `Default`
/// zero-fills them so a partially failed read never yields short tables.
#[derive(Debug, Clone)]
pub struct FanStatus {
    /// Tachometer readings in RPM (low/high byte combined little-endian).
    pub fan1_speed: u16,
    pub fan2_speed: u16,
    /// Speed as a floored percentage of the per-fan maximum RPM.
    pub fan1_percent: u32,
    pub fan2_percent: u32,
    pub fan1_curve: Vec<u8>,
    pub fan2_curve: Vec<u8>,
    pub acc_time: Vec<u8>,
    pub dec_time: Vec<u8>,
    pub cpu_lower_temp: Vec<u8>,
    pub cpu_upper_temp: Vec<u8>,
    pub gpu_lower_temp: Vec<u8>,
    pub gpu_upper_temp: Vec<u8>,
    pub vrm_lower_temp: Vec<u8>,
    pub vrm_upper_temp: Vec<u8>,
    pub chip_id1: u8,
    pub chip_id2: u8,
    pub chip_ver: u8,
    /// Firmware version register. Kept 16-bit wide but populated from a
    /// single-byte read; the EC does not expose a two-byte read for it.
    pub fw_ver: u16,
    pub fan1_target_duty: u8,
    pub fan2_target_duty: u8,
    pub fan1_target_curve_val: u8,
    pub fan2_target_curve_val: u8,
    /// Index of the curve entry the EC is currently running.
    pub fan_cur_point: u8,
}

impl Default for FanStatus {
    fn default() -> Self {
        Self {
            fan1_speed: 0,
            fan2_speed: 0,
            fan1_percent: 0,
            fan2_percent: 0,
            fan1_curve: vec![0; CURVE_POINTS],
            fan2_curve: vec![0; CURVE_POINTS],
            acc_time: vec![0; CURVE_POINTS],
            dec_time: vec![0; CURVE_POINTS],
            cpu_lower_temp: vec![0; CURVE_POINTS],
            cpu_upper_temp: vec![0; CURVE_POINTS],
            gpu_lower_temp: vec![0; CURVE_POINTS],
            gpu_upper_temp: vec![0; CURVE_POINTS],
            vrm_lower_temp: vec![0; CURVE_POINTS],
            vrm_upper_temp: vec![0; CURVE_POINTS],
            chip_id1: 0,
            chip_id2: 0,
            chip_ver: 0,
            fw_ver: 0,
            fan1_target_duty: 0,
            fan2_target_duty: 0,
            fan1_target_curve_val: 0,
            fan2_target_curve_val: 0,
            fan_cur_point: 0,
        }
    }
}

impl FanStatus {
    /// Project the snapshot's writable tables into a config payload.
    pub fn to_config(&self) -> FanConfig {
        FanConfig {
            fan1_curve: self.fan1_curve.clone(),
            fan2_curve: self.fan2_curve.clone(),
            acc_time: self.acc_time.clone(),
            dec_time: self.dec_time.clone(),
            cpu_lower_temp: self.cpu_lower_temp.clone(),
            cpu_upper_temp: self.cpu_upper_temp.clone(),
            gpu_lower_temp: self.gpu_lower_temp.clone(),
            gpu_upper_temp: self.gpu_upper_temp.clone(),
            vrm_lower_temp: self.vrm_lower_temp.clone(),
            vrm_upper_temp: self.vrm_upper_temp.clone(),
        }
    }
}

impl fmt::Display for FanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fan1: {} RPM ({}%), fan2: {} RPM ({}%), curve point {}",
            self.fan1_speed, self.fan1_percent, self.fan2_speed, self.fan2_percent,
            self.fan_cur_point
        )
    }
}

/// Configuration payload accepted by `EcController::write_config`.
///
/// Only the EC-writable tables appear here; tachometers, chip identity and
/// the derived target registers are EC-owned and read-only. Each table must
/// hold exactly [`CURVE_POINTS`] entries or the write is rejected before any
/// hardware access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanConfig {
    pub fan1_curve: Vec<u8>,
    pub fan2_curve: Vec<u8>,
    pub acc_time: Vec<u8>,
    pub dec_time: Vec<u8>,
    pub cpu_lower_temp: Vec<u8>,
    pub cpu_upper_temp: Vec<u8>,
    pub gpu_lower_temp: Vec<u8>,
    pub gpu_upper_temp: Vec<u8>,
    pub vrm_lower_temp: Vec<u8>,
    pub vrm_upper_temp: Vec<u8>,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            fan1_curve: vec![0; CURVE_POINTS],
            fan2_curve: vec![0; CURVE_POINTS],
            acc_time: vec![0; CURVE_POINTS],
            dec_time: vec![0; CURVE_POINTS],
            cpu_lower_temp: vec![0; CURVE_POINTS],
            cpu_upper_temp: vec![0; CURVE_POINTS],
            gpu_lower_temp: vec![0; CURVE_POINTS],
            gpu_upper_temp: vec![0; CURVE_POINTS],
            vrm_lower_temp: vec![0; CURVE_POINTS],
            vrm_upper_temp: vec![0; CURVE_POINTS],
        }
    }
}

impl FanConfig {
    /// All tables in write order, paired with their payload field names.
    pub fn tables(&self) -> [(&'static str, &[u8]); 10] {
        [
            ("fan1_curve", &self.fan1_curve),
            ("fan2_curve", &self.fan2_curve),
            ("acc_time", &self.acc_time),
            ("dec_time", &self.dec_time),
            ("cpu_lower_temp", &self.cpu_lower_temp),
            ("cpu_upper_temp", &self.cpu_upper_temp),
            ("gpu_lower_temp", &self.gpu_lower_temp),
            ("gpu_upper_temp", &self.gpu_upper_temp),
            ("vrm_lower_temp", &self.vrm_lower_temp),
            ("vrm_upper_temp", &self.vrm_upper_temp),
        ]
    }
}

/// Derive a floored duty percentage from a tachometer reading.
///
/// Returns 0 when `max_rpm` is configured as 0 rather than dividing by zero.
pub fn duty_percent(speed_rpm: u16, max_rpm: u16) -> u32 {
    if max_rpm == 0 {
        return 0;
    }
    u32::from(speed_rpm) * 100 / u32::from(max_rpm)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_percent_half_speed() {
        assert_eq!(duty_percent(2600, MAX_FAN1_RPM), 50);
    }

    #[test]
    fn duty_percent_stopped_fan() {
        assert_eq!(duty_percent(0, MAX_FAN2_RPM), 0);
    }

    #[test]
    fn duty_percent_zero_max_guard() {
        assert_eq!(duty_percent(2600, 0), 0);
        assert_eq!(duty_percent(u16::MAX, 0), 0);
    }

    #[test]
    fn duty_percent_floors() {
        // 2599 / 5200 = 49.98..% — must floor, not round.
        assert_eq!(duty_percent(2599, MAX_FAN1_RPM), 49);
    }

    #[test]
    fn default_status_tables_are_full_length() {
        let status = FanStatus::default();
        assert!(status
            .to_config()
            .tables()
            .iter()
            .all(|(_, table)| table.len() == CURVE_POINTS));
    }

    #[test]
    fn to_config_carries_table_contents() {
        let mut status = FanStatus::default();
        status.fan1_curve = vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100];
        status.dec_time = vec![5; CURVE_POINTS];

        let config = status.to_config();
        assert_eq!(config.fan1_curve, status.fan1_curve);
        assert_eq!(config.dec_time, vec![5; CURVE_POINTS]);
    }

    #[test]
    fn config_json_round_trip() {
        let mut config = FanConfig::default();
        config.fan2_curve = vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90];

        let json = serde_json::to_string(&config).unwrap();
        let parsed: FanConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
