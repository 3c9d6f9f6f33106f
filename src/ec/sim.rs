//! In-memory EC stand-in used by the test suite and the `--simulate` flag.
//!
//! [`SimulatedGateway`] holds a full 64 KiB register file and *decodes* the
//! indexed-addressing port sequence instead of short-circuiting it, so a
//! caller that gets the control-byte ordering wrong reads and writes the
//! wrong registers here exactly as it would on hardware. Every port
//! operation is logged for assertions.

use crate::errors::EcControlError;

use super::protocol::{
    CTRL_DATA, CTRL_INDEX, EC_ADDR_PORT, EC_DATA_PORT, IDX_ADDR_HIGH, IDX_ADDR_LOW, IDX_DATA,
};
use super::{registers, PortGateway};

/// One raw port operation seen by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOp {
    Read(u16),
    Write(u16, u8),
}

/// Simulated port I/O provider backed by an in-memory EC register file.
pub struct SimulatedGateway {
    registers: Vec<u8>,
    /// Last control byte written to the address port.
    cursor: u8,
    /// Index register selected by the last `CTRL_INDEX` cycle.
    selected_index: u8,
    addr_high: u8,
    addr_low: u8,
    active: bool,
    refuse_init: Option<u32>,
    log: Vec<PortOp>,
}

impl SimulatedGateway {
    /// A gateway over a zero-filled register file, ready for port access.
    pub fn new() -> Self {
        Self {
            registers: vec![0; 0x1_0000],
            cursor: 0,
            selected_index: 0,
            addr_high: 0,
            addr_low: 0,
            active: true,
            refuse_init: None,
            log: Vec::new(),
        }
    }

    /// A gateway whose `init` is refused with the given provider status.
    #[cfg(test)]
    pub fn refusing_init(status: u32) -> Self {
        Self {
            active: false,
            refuse_init: Some(status),
            ..Self::new()
        }
    }

    /// A gateway seeded with plausible EC content, for running the CLI
    /// without hardware.
    pub fn preset() -> Self {
        let mut gateway = Self::new();

        gateway.poke_block(registers::FAN1_BASE, &[0, 10, 20, 30, 40, 55, 70, 85, 95, 100]);
        gateway.poke_block(registers::FAN2_BASE, &[0, 10, 15, 25, 35, 50, 65, 80, 90, 100]);
        gateway.poke_block(registers::FAN_ACC_BASE, &[1, 1, 2, 2, 3, 3, 4, 4, 5, 5]);
        gateway.poke_block(registers::FAN_DEC_BASE, &[3, 3, 4, 4, 5, 5, 6, 6, 7, 7]);
        gateway.poke_block(registers::CPU_TEMP, &[50, 55, 60, 65, 70, 75, 80, 85, 90, 95]);
        gateway.poke_block(registers::CPU_TEMP_HYST, &[45, 50, 55, 60, 65, 70, 75, 80, 85, 90]);
        gateway.poke_block(registers::GPU_TEMP, &[48, 53, 58, 63, 68, 73, 78, 83, 88, 93]);
        gateway.poke_block(registers::GPU_TEMP_HYST, &[43, 48, 53, 58, 63, 68, 73, 78, 83, 88]);
        gateway.poke_block(registers::VRM_TEMP, &[55, 60, 65, 70, 75, 80, 85, 90, 95, 100]);
        gateway.poke_block(registers::VRM_TEMP_HYST, &[50, 55, 60, 65, 70, 75, 80, 85, 90, 95]);

        // Fan 1 at 2600 RPM, fan 2 at 2500 RPM, little-endian.
        gateway.poke(registers::FAN1_RPM_LSB, 0x28);
        gateway.poke(registers::FAN1_RPM_MSB, 0x0A);
        gateway.poke(registers::FAN2_RPM_LSB, 0xC4);
        gateway.poke(registers::FAN2_RPM_MSB, 0x09);

        gateway.poke(registers::ECHIPID1, 0x82);
        gateway.poke(registers::ECHIPID2, 0x27);
        gateway.poke(registers::ECHIPVER, 0x05);
        gateway.poke(registers::FW_VER, 0x42);

        gateway.poke(registers::FAN_CUR_POINT, 3);
        gateway.poke(registers::FAN1_TARGET_CURVE_VAL, 40);
        gateway.poke(registers::FAN2_TARGET_CURVE_VAL, 35);
        gateway.poke(registers::FAN1_TARGET_DUTY, 40);
        gateway.poke(registers::FAN2_TARGET_DUTY, 35);
        gateway.poke(registers::FAN1_CUR_ACC, 2);
        gateway.poke(registers::FAN1_CUR_DEC, 4);
        gateway.poke(registers::FAN2_CUR_ACC, 2);
        gateway.poke(registers::FAN2_CUR_DEC, 4);

        gateway
    }

    /// Write a register directly, bypassing the port protocol.
    pub fn poke(&mut self, addr: u16, value: u8) {
        self.registers[addr as usize] = value;
    }

    /// Seed consecutive registers directly.
    pub fn poke_block(&mut self, base: u16, data: &[u8]) {
        for (offset, value) in data.iter().enumerate() {
            self.poke(base + offset as u16, *value);
        }
    }

    /// Read a register directly, bypassing the port protocol.
    #[cfg(test)]
    pub fn peek(&self, addr: u16) -> u8 {
        self.registers[addr as usize]
    }

    /// Every port operation performed so far, oldest first.
    #[cfg(test)]
    pub fn port_log(&self) -> &[PortOp] {
        &self.log
    }

    #[cfg(test)]
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn latched_addr(&self) -> u16 {
        u16::from_be_bytes([self.addr_high, self.addr_low])
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PortGateway for SimulatedGateway {
    fn load(&mut self) -> Result<(), EcControlError> {
        Ok(())
    }

    fn init(&mut self) -> Result<(), EcControlError> {
        if let Some(status) = self.refuse_init {
            self.active = false;
            return Err(EcControlError::InitFailure(status));
        }
        self.active = true;
        Ok(())
    }

    fn read_port(&mut self, port: u16) -> u8 {
        self.log.push(PortOp::Read(port));
        if !self.active || port != EC_DATA_PORT || self.cursor != CTRL_DATA {
            return 0;
        }
        match self.selected_index {
            IDX_ADDR_HIGH => self.addr_high,
            IDX_ADDR_LOW => self.addr_low,
            IDX_DATA => self.registers[self.latched_addr() as usize],
            _ => 0,
        }
    }

    fn write_port(&mut self, port: u16, value: u8) {
        self.log.push(PortOp::Write(port, value));
        if !self.active {
            return;
        }
        match port {
            EC_ADDR_PORT => self.cursor = value,
            EC_DATA_PORT => match self.cursor {
                CTRL_INDEX => self.selected_index = value,
                CTRL_DATA => match self.selected_index {
                    IDX_ADDR_HIGH => self.addr_high = value,
                    IDX_ADDR_LOW => self.addr_low = value,
                    IDX_DATA => {
                        let addr = self.latched_addr();
                        self.registers[addr as usize] = value;
                    }
                    _ => {}
                },
                _ => {}
            },
            _ => {}
        }
    }

    fn deinit(&mut self) {
        self.active = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec::protocol;

    #[test]
    fn poke_peek_round_trip() {
        let mut gateway = SimulatedGateway::new();
        gateway.poke(0xC540, 0x7F);
        assert_eq!(gateway.peek(0xC540), 0x7F);
    }

    #[test]
    fn deactivated_gateway_degrades_to_zero() {
        let mut gateway = SimulatedGateway::new();
        gateway.poke(0xC540, 0x7F);
        gateway.deinit();

        // Port traffic is still accepted but reads no longer reach the
        // register file and writes are dropped.
        assert_eq!(protocol::read_register(&mut gateway, 0xC540), 0);
        protocol::write_register(&mut gateway, 0xC540, 0x11);
        assert_eq!(gateway.peek(0xC540), 0x7F);
    }

    #[test]
    fn refused_init_reports_provider_status() {
        let mut gateway = SimulatedGateway::refusing_init(0x0000_0005);
        assert!(gateway.load().is_ok());
        assert!(matches!(
            gateway.init(),
            Err(EcControlError::InitFailure(0x0000_0005))
        ));
    }

    #[test]
    fn read_outside_data_phase_returns_zero() {
        let mut gateway = SimulatedGateway::new();
        gateway.poke(0x0000, 0xEE);

        // No addressing sequence has run; a bare data-port read hits nothing.
        assert_eq!(gateway.read_port(EC_DATA_PORT), 0);
        // Unrelated ports are dead air.
        assert_eq!(gateway.read_port(0x0062), 0);
    }
}
