//! Super-I/O indexed addressing over the EC's configuration port pair.
//!
//! The EC exposes its 16-bit register space one byte at a time through two
//! fixed 8-bit ports: writing `CTRL_INDEX` to the address port selects which
//! internal index register the next data-port access targets, and writing
//! `CTRL_DATA` points the data port at the register selected last. A full
//! register access latches the address high byte (index 0x11), then the low
//! byte (index 0x10), then moves the data phase (index 0x12) to the latched
//! address. The EC treats the latch as a stateful cursor: the sequence must
//! run to completion, in order, or subsequent accesses hit the wrong
//! register.

use super::PortGateway;

/// Port the index-select control bytes are written to.
pub const EC_ADDR_PORT: u16 = 0x4E;
/// Port carrying index-register selections and the data payload.
pub const EC_DATA_PORT: u16 = 0x4F;

/// Select which index register the next data-port write names.
pub const CTRL_INDEX: u8 = 0x2E;
/// Route the next data-port access to the register named last.
pub const CTRL_DATA: u8 = 0x2F;

/// Index register latching the high byte of the target address.
pub const IDX_ADDR_HIGH: u8 = 0x11;
/// Index register latching the low byte of the target address.
pub const IDX_ADDR_LOW: u8 = 0x10;
/// Index register exposing the byte at the latched address.
pub const IDX_DATA: u8 = 0x12;

/// Write `value` into the index register `index` (two port-write pairs).
fn write_indexed<G: PortGateway + ?Sized>(gateway: &mut G, index: u8, value: u8) {
    gateway.write_port(EC_ADDR_PORT, CTRL_INDEX);
    gateway.write_port(EC_DATA_PORT, index);
    gateway.write_port(EC_ADDR_PORT, CTRL_DATA);
    gateway.write_port(EC_DATA_PORT, value);
}

/// Read back the index register `index`.
fn read_indexed<G: PortGateway + ?Sized>(gateway: &mut G, index: u8) -> u8 {
    gateway.write_port(EC_ADDR_PORT, CTRL_INDEX);
    gateway.write_port(EC_DATA_PORT, index);
    gateway.write_port(EC_ADDR_PORT, CTRL_DATA);
    gateway.read_port(EC_DATA_PORT)
}

/// Read one byte from EC register `addr` (7 port writes + 1 port read).
///
/// A read that could not be performed comes back as 0, indistinguishable
/// from a register that legitimately holds 0 — callers must not treat a
/// zero payload as proof the access succeeded.
pub fn read_register<G: PortGateway + ?Sized>(gateway: &mut G, addr: u16) -> u8 {
    write_indexed(gateway, IDX_ADDR_HIGH, (addr >> 8) as u8);
    write_indexed(gateway, IDX_ADDR_LOW, (addr & 0xFF) as u8);
    read_indexed(gateway, IDX_DATA)
}

/// Write one byte to EC register `addr` (8 port writes).
pub fn write_register<G: PortGateway + ?Sized>(gateway: &mut G, addr: u16, value: u8) {
    write_indexed(gateway, IDX_ADDR_HIGH, (addr >> 8) as u8);
    write_indexed(gateway, IDX_ADDR_LOW, (addr & 0xFF) as u8);
    write_indexed(gateway, IDX_DATA, value);
}

/// Read `len` consecutive registers starting at `base`.
///
/// There is no hardware burst mode; every byte is an independent full
/// addressing sequence.
pub fn read_block<G: PortGateway + ?Sized>(gateway: &mut G, base: u16, len: usize) -> Vec<u8> {
    (0..len)
        .map(|offset| read_register(gateway, base + offset as u16))
        .collect()
}

/// Write `data` to consecutive registers starting at `base`.
pub fn write_block<G: PortGateway + ?Sized>(gateway: &mut G, base: u16, data: &[u8]) {
    for (offset, value) in data.iter().enumerate() {
        write_register(gateway, base + offset as u16, *value);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec::sim::{PortOp, SimulatedGateway};

    /// The exact port traffic a single-register read must generate.
    fn expected_read_sequence(addr: u16) -> Vec<PortOp> {
        vec![
            PortOp::Write(EC_ADDR_PORT, CTRL_INDEX),
            PortOp::Write(EC_DATA_PORT, IDX_ADDR_HIGH),
            PortOp::Write(EC_ADDR_PORT, CTRL_DATA),
            PortOp::Write(EC_DATA_PORT, (addr >> 8) as u8),
            PortOp::Write(EC_ADDR_PORT, CTRL_INDEX),
            PortOp::Write(EC_DATA_PORT, IDX_ADDR_LOW),
            PortOp::Write(EC_ADDR_PORT, CTRL_DATA),
            PortOp::Write(EC_DATA_PORT, (addr & 0xFF) as u8),
            PortOp::Write(EC_ADDR_PORT, CTRL_INDEX),
            PortOp::Write(EC_DATA_PORT, IDX_DATA),
            PortOp::Write(EC_ADDR_PORT, CTRL_DATA),
            PortOp::Read(EC_DATA_PORT),
        ]
    }

    #[test]
    fn write_then_read_round_trip() {
        let mut gateway = SimulatedGateway::new();

        for addr in [0x0000u16, 0x103F, 0xC540, 0xC5FD, 0xFFFF] {
            write_register(&mut gateway, addr, 0xA5);
            assert_eq!(read_register(&mut gateway, addr), 0xA5, "addr {addr:#06X}");

            write_register(&mut gateway, addr, 0x00);
            assert_eq!(read_register(&mut gateway, addr), 0x00, "addr {addr:#06X}");
        }
    }

    #[test]
    fn read_follows_exact_control_byte_order() {
        let mut gateway = SimulatedGateway::new();
        gateway.poke(0xC534, 0x07);

        assert_eq!(read_register(&mut gateway, 0xC534), 0x07);
        assert_eq!(gateway.port_log(), expected_read_sequence(0xC534).as_slice());
    }

    #[test]
    fn write_is_eight_port_writes() {
        let mut gateway = SimulatedGateway::new();
        write_register(&mut gateway, 0xC5E4, 0x30);

        let log = gateway.port_log();
        assert_eq!(log.len(), 8);
        assert!(log.iter().all(|op| matches!(op, PortOp::Write(..))));
        assert_eq!(log[7], PortOp::Write(EC_DATA_PORT, 0x30));
        assert_eq!(gateway.peek(0xC5E4), 0x30);
    }

    #[test]
    fn block_read_issues_one_sequence_per_consecutive_address() {
        let mut gateway = SimulatedGateway::new();
        for offset in 0..10u16 {
            gateway.poke(0xC540 + offset, offset as u8 + 1);
        }

        let values = read_block(&mut gateway, 0xC540, 10);
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        let expected: Vec<PortOp> = (0..10u16)
            .flat_map(|offset| expected_read_sequence(0xC540 + offset))
            .collect();
        assert_eq!(gateway.port_log(), expected.as_slice());
    }

    #[test]
    fn block_write_lands_on_consecutive_addresses() {
        let mut gateway = SimulatedGateway::new();
        let data: Vec<u8> = (40..50).collect();

        write_block(&mut gateway, 0xC560, &data);
        for (offset, value) in data.iter().enumerate() {
            assert_eq!(gateway.peek(0xC560 + offset as u16), *value);
        }
    }

    #[test]
    fn interrupted_sequence_leaves_latch_on_previous_address() {
        let mut gateway = SimulatedGateway::new();
        gateway.poke(0x1234, 0xAA);
        gateway.poke(0x5678, 0xBB);
        gateway.poke(0x5634, 0xCC);

        assert_eq!(read_register(&mut gateway, 0x1234), 0xAA);

        // Latch only the high byte of a new address; the data phase then
        // reads from high=0x56, low=0x34 — a register the caller never
        // intended to touch.
        write_indexed(&mut gateway, IDX_ADDR_HIGH, 0x56);
        assert_eq!(read_indexed(&mut gateway, IDX_DATA), 0xCC);
    }
}
