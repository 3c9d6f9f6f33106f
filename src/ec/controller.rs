//! Stateful controller sequencing EC reads and table writes.

use log::{debug, warn};

use crate::errors::EcControlError;
use crate::fan::{duty_percent, FanConfig, FanStatus, CURVE_POINTS, MAX_FAN1_RPM, MAX_FAN2_RPM};

use super::{protocol, registers, PortGateway};

/// Owns the port I/O gateway and exposes the EC's fan tables as whole-value
/// snapshot/config operations.
///
/// A controller starts uninitialized; every operation other than the
/// lifecycle ones fails with [`EcControlError::NotInitialized`] until
/// [`initialize`](Self::initialize) succeeds. Access must be serialized by
/// the caller — the two-port addressing sequence is a shared hardware cursor
/// and interleaved use corrupts it.
pub struct EcController<G: PortGateway> {
    gateway: G,
    initialized: bool,
    last_error: String,
    raw_duty_write: bool,
}

impl<G: PortGateway> EcController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            initialized: false,
            last_error: String::new(),
            raw_duty_write: false,
        }
    }

    /// Load and activate the port I/O provider. Idempotent; a failure at
    /// any step releases the provider and leaves the controller
    /// uninitialized with the cause retrievable via
    /// [`last_error`](Self::last_error).
    pub fn initialize(&mut self) -> Result<(), EcControlError> {
        if self.initialized {
            return Ok(());
        }
        self.last_error.clear();

        if let Err(error) = self.gateway.load() {
            return Err(self.record(error));
        }
        if let Err(error) = self.gateway.init() {
            self.gateway.deinit();
            return Err(self.record(error));
        }

        self.initialized = true;
        debug!("EC controller initialized");
        Ok(())
    }

    /// Release the provider and reset to uninitialized. Always safe,
    /// idempotent, and callable regardless of prior state.
    pub fn deinitialize(&mut self) {
        self.gateway.deinit();
        self.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Message recorded by the most recent failure or partial-write warning.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// Opt into the raw duty-cycle register write (DCR4/DCR5) after a table
    /// write. Off by default: the EC normally recomputes those registers
    /// itself, and whether writing them from the host helps or interferes is
    /// unresolved.
    pub fn set_raw_duty_write(&mut self, enabled: bool) {
        self.raw_duty_write = enabled;
    }

    /// Read the full fan status snapshot from the EC.
    ///
    /// A failed return means the snapshot must be discarded as a whole;
    /// individual array reads cannot fail distinguishably from legitimate
    /// zeroes, so there is no per-field validity.
    pub fn read_status(&mut self) -> Result<FanStatus, EcControlError> {
        self.ensure_initialized()?;
        self.last_error.clear();

        let gateway = &mut self.gateway;
        let mut status = FanStatus::default();

        let fan1_low = protocol::read_register(gateway, registers::FAN1_RPM_LSB);
        let fan1_high = protocol::read_register(gateway, registers::FAN1_RPM_MSB);
        status.fan1_speed = u16::from_le_bytes([fan1_low, fan1_high]);

        let fan2_low = protocol::read_register(gateway, registers::FAN2_RPM_LSB);
        let fan2_high = protocol::read_register(gateway, registers::FAN2_RPM_MSB);
        status.fan2_speed = u16::from_le_bytes([fan2_low, fan2_high]);

        status.fan1_percent = duty_percent(status.fan1_speed, MAX_FAN1_RPM);
        status.fan2_percent = duty_percent(status.fan2_speed, MAX_FAN2_RPM);

        status.fan1_curve = protocol::read_block(gateway, registers::FAN1_BASE, CURVE_POINTS);
        status.fan2_curve = protocol::read_block(gateway, registers::FAN2_BASE, CURVE_POINTS);
        status.acc_time = protocol::read_block(gateway, registers::FAN_ACC_BASE, CURVE_POINTS);
        status.dec_time = protocol::read_block(gateway, registers::FAN_DEC_BASE, CURVE_POINTS);
        status.cpu_upper_temp = protocol::read_block(gateway, registers::CPU_TEMP, CURVE_POINTS);
        status.cpu_lower_temp =
            protocol::read_block(gateway, registers::CPU_TEMP_HYST, CURVE_POINTS);
        status.gpu_upper_temp = protocol::read_block(gateway, registers::GPU_TEMP, CURVE_POINTS);
        status.gpu_lower_temp =
            protocol::read_block(gateway, registers::GPU_TEMP_HYST, CURVE_POINTS);
        status.vrm_upper_temp = protocol::read_block(gateway, registers::VRM_TEMP, CURVE_POINTS);
        status.vrm_lower_temp =
            protocol::read_block(gateway, registers::VRM_TEMP_HYST, CURVE_POINTS);

        status.chip_id1 = protocol::read_register(gateway, registers::ECHIPID1);
        status.chip_id2 = protocol::read_register(gateway, registers::ECHIPID2);
        status.chip_ver = protocol::read_register(gateway, registers::ECHIPVER);
        // The register is modeled 16-bit wide but the EC only answers a
        // single-byte read here.
        status.fw_ver = u16::from(protocol::read_register(gateway, registers::FW_VER));

        status.fan1_target_duty = protocol::read_register(gateway, registers::FAN1_TARGET_DUTY);
        status.fan2_target_duty = protocol::read_register(gateway, registers::FAN2_TARGET_DUTY);
        status.fan1_target_curve_val =
            protocol::read_register(gateway, registers::FAN1_TARGET_CURVE_VAL);
        status.fan2_target_curve_val =
            protocol::read_register(gateway, registers::FAN2_TARGET_CURVE_VAL);
        status.fan_cur_point = protocol::read_register(gateway, registers::FAN_CUR_POINT);

        Ok(status)
    }

    /// Validate and write all ten tables, then refresh the EC-internal
    /// derived registers.
    ///
    /// Validation is all-or-nothing and happens before any port access: a
    /// table whose length is not exactly [`CURVE_POINTS`] fails with
    /// [`EcControlError::InvalidShape`] and the EC is never touched.
    ///
    /// After the tables are written, the curve value the EC already derived
    /// is mirrored into each fan's live duty target, and the
    /// acceleration/deceleration entries at the EC's current curve point are
    /// copied into the live timing registers. If the EC reports a current
    /// point outside the tables just written, that particular refresh is
    /// skipped and a warning recorded — the tables stay written; port writes
    /// are not transactional and there is no rollback.
    pub fn write_config(&mut self, config: &FanConfig) -> Result<(), EcControlError> {
        self.ensure_initialized()?;
        self.last_error.clear();

        for (table, entries) in config.tables() {
            if entries.len() != CURVE_POINTS {
                return Err(self.record(EcControlError::InvalidShape {
                    table,
                    actual: entries.len(),
                    expected: CURVE_POINTS,
                }));
            }
        }

        let raw_duty_write = self.raw_duty_write;
        let gateway = &mut self.gateway;

        protocol::write_block(gateway, registers::FAN1_BASE, &config.fan1_curve);
        protocol::write_block(gateway, registers::FAN2_BASE, &config.fan2_curve);
        protocol::write_block(gateway, registers::CPU_TEMP, &config.cpu_upper_temp);
        protocol::write_block(gateway, registers::GPU_TEMP, &config.gpu_upper_temp);
        protocol::write_block(gateway, registers::VRM_TEMP, &config.vrm_upper_temp);
        protocol::write_block(gateway, registers::CPU_TEMP_HYST, &config.cpu_lower_temp);
        protocol::write_block(gateway, registers::GPU_TEMP_HYST, &config.gpu_lower_temp);
        protocol::write_block(gateway, registers::VRM_TEMP_HYST, &config.vrm_lower_temp);
        protocol::write_block(gateway, registers::FAN_ACC_BASE, &config.acc_time);
        protocol::write_block(gateway, registers::FAN_DEC_BASE, &config.dec_time);

        // Mirror the curve value the EC already derived into the live duty
        // target, instead of waiting for the EC's next polling cycle.
        let fan1_target = protocol::read_register(gateway, registers::FAN1_TARGET_CURVE_VAL);
        protocol::write_register(gateway, registers::FAN1_TARGET_DUTY, fan1_target);
        let fan2_target = protocol::read_register(gateway, registers::FAN2_TARGET_CURVE_VAL);
        protocol::write_register(gateway, registers::FAN2_TARGET_DUTY, fan2_target);

        if raw_duty_write {
            protocol::write_register(gateway, registers::DCR5, scale_duty(fan1_target));
            protocol::write_register(gateway, registers::DCR4, scale_duty(fan2_target));
        }

        // Keep the live timing registers consistent with the tables just
        // written, selected by the EC's own current curve point.
        let cur_point = usize::from(protocol::read_register(gateway, registers::FAN_CUR_POINT));
        let mut warnings: Vec<String> = Vec::new();

        if let Some(acc) = config.acc_time.get(cur_point) {
            protocol::write_register(gateway, registers::FAN1_CUR_ACC, *acc);
            protocol::write_register(gateway, registers::FAN2_CUR_ACC, *acc);
        } else {
            warnings.push(format!(
                "acceleration refresh skipped: curve point {cur_point} read from EC is out of range"
            ));
        }

        if let Some(dec) = config.dec_time.get(cur_point) {
            protocol::write_register(gateway, registers::FAN1_CUR_DEC, *dec);
            protocol::write_register(gateway, registers::FAN2_CUR_DEC, *dec);
        } else {
            warnings.push(format!(
                "deceleration refresh skipped: curve point {cur_point} read from EC is out of range"
            ));
        }

        for warning in &warnings {
            warn!("{warning}");
        }
        if !warnings.is_empty() {
            self.last_error = warnings.join("; ");
        }

        Ok(())
    }

    fn ensure_initialized(&mut self) -> Result<(), EcControlError> {
        if self.initialized {
            Ok(())
        } else {
            Err(self.record(EcControlError::NotInitialized))
        }
    }

    fn record(&mut self, error: EcControlError) -> EcControlError {
        self.last_error = error.to_string();
        error
    }
}

impl<G: PortGateway> Drop for EcController<G> {
    fn drop(&mut self) {
        self.deinitialize();
    }
}

/// Scale a curve value (0–45) to the raw 8-bit duty-cycle register range.
fn scale_duty(curve_val: u8) -> u8 {
    if curve_val <= 45 {
        (u16::from(curve_val) * 255 / 45) as u8
    } else {
        255
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
