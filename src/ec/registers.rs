//! Named 16-bit register addresses inside the ITE EC's address space.
//!
//! The map is fixed for the chip family; a table base plus an offset 0–9
//! addresses one entry of the corresponding 10-point table.

/// EC firmware version (read as a single byte).
pub const FW_VER: u16 = 0xC2C7;

/// Index of the curve entry the EC is currently running.
pub const FAN_CUR_POINT: u16 = 0xC534;

// 10-point table bases.
pub const FAN1_BASE: u16 = 0xC540;
pub const FAN2_BASE: u16 = 0xC550;
pub const FAN_ACC_BASE: u16 = 0xC560;
pub const FAN_DEC_BASE: u16 = 0xC570;
pub const CPU_TEMP: u16 = 0xC580;
pub const CPU_TEMP_HYST: u16 = 0xC590;
pub const GPU_TEMP: u16 = 0xC5A0;
pub const GPU_TEMP_HYST: u16 = 0xC5B0;
pub const VRM_TEMP: u16 = 0xC5C0;
pub const VRM_TEMP_HYST: u16 = 0xC5D0;

// Tachometers, 16-bit little-endian across two byte registers.
pub const FAN1_RPM_LSB: u16 = 0xC5E0;
pub const FAN1_RPM_MSB: u16 = 0xC5E1;
pub const FAN2_RPM_LSB: u16 = 0xC5E2;
pub const FAN2_RPM_MSB: u16 = 0xC5E3;

// Duty the EC is currently steering toward, and the curve value it derived
// it from. The duty registers sit 0x18 below the curve-value registers.
pub const FAN1_TARGET_DUTY: u16 = 0xC5E4;
pub const FAN2_TARGET_DUTY: u16 = 0xC5E5;
pub const FAN1_TARGET_CURVE_VAL: u16 = 0xC5FC;
pub const FAN2_TARGET_CURVE_VAL: u16 = 0xC5FD;

// Live acceleration/deceleration timing, mirrored from the table entry at
// FAN_CUR_POINT.
pub const FAN1_CUR_ACC: u16 = 0xC3DC;
pub const FAN1_CUR_DEC: u16 = 0xC3DD;
pub const FAN2_CUR_ACC: u16 = 0xC3DE;
pub const FAN2_CUR_DEC: u16 = 0xC3DF;

// Chip identification.
pub const ECHIPID1: u16 = 0x2000;
pub const ECHIPID2: u16 = 0x2001;
pub const ECHIPVER: u16 = 0x2002;

// Raw PWM duty-cycle registers. Only touched by the opt-in raw duty write;
// the EC normally recomputes these itself.
pub const DCR4: u16 = 0x1806;
pub const DCR5: u16 = 0x1807;
