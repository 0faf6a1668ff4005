use crate::errors::ExecutionError;
use crate::hardware::RegisterId;
use crate::numbers;
use std::fmt::{Debug, Formatter};

/// The sixteen LC-3 opcodes, encoded in bits `[15:12]` of an instruction.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, enumn::N, displaydoc::Display)]
pub enum Opcode {
    /// BR
    Br = 0b0000,
    /// ADD
    Add = 0b0001,
    /// LD
    Ld = 0b0010,
    /// ST
    St = 0b0011,
    /// JSR
    Jsr = 0b0100,
    /// AND
    And = 0b0101,
    /// LDR
    Ldr = 0b0110,
    /// STR
    Str = 0b0111,
    /// RTI
    Rti = 0b1000,
    /// NOT
    Not = 0b1001,
    /// LDI
    Ldi = 0b1010,
    /// STI
    Sti = 0b1011,
    /// JMP
    Jmp = 0b1100,
    /// RES
    Res = 0b1101,
    /// LEA
    Lea = 0b1110,
    /// TRAP
    Trap = 0b1111,
}

/// Wrapper for LC-3 u16 instruction.
/// format is: `OOOO_DDD_P_PPPP_PPPP`
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Instruction(u16);

impl Instruction {
    /// Gives the value of only the specified bit range.
    ///
    /// # Parameters
    /// - `from`: starting index
    /// - `to`: end index (inclusive), mut be greater or equal to `from`
    ///
    /// # Panics
    /// - asserts that to is greater or equal from and both are valid indexes
    #[must_use]
    pub fn get_bit_range(self, from: u8, to: u8) -> u16 {
        debug_assert!(
            to >= from,
            "wrong direction of from: {from:?} and to: {to:?}"
        );
        debug_assert!(
            (0..u16::BITS).contains(&u32::from(to)),
            "index: {to:?} to u16 is greater than maximum value {:?}",
            u16::BITS - 1
        );
        let width = u32::from(to - from + 1);
        (self.0 >> from) & u16::MAX.unbounded_shr(u16::BITS - width)
    }
    /// Gives the value of a bit range of at most 8 bits.
    /// See [`Instruction::get_bit_range()`]
    #[must_use]
    pub fn get_bit_range_u8(self, from: u8, to: u8) -> u8 {
        debug_assert!(to - from < 8, "bit range {from}..={to} does not fit into u8");
        #[expect(clippy::cast_possible_truncation, reason = "range is at most 8 bits wide")]
        let value = self.get_bit_range(from, to) as u8;
        value
    }
    #[must_use]
    pub fn get_bit(self, index: u8) -> bool {
        self.get_bit_range(index, index) & 1 != 0
    }
    #[must_use]
    pub const fn as_binary(self) -> u16 {
        self.0
    }
    /// Raw value of bits `[15:12]`.
    #[must_use]
    pub fn op_code(self) -> u8 {
        self.get_bit_range_u8(12, 15)
    }
    /// Decoded opcode.
    ///
    /// # Errors
    /// - bits `[15:12]` do not name an opcode
    pub fn opcode(self) -> Result<Opcode, ExecutionError> {
        let opcode = self.op_code();
        Opcode::n(opcode).ok_or(ExecutionError::UnknownOpcode { opcode })
    }
    /// Destination register, bits `[11:9]`. Same position as the source register of stores.
    ///
    /// # Errors
    /// - not a general purpose register
    pub fn dr(self) -> Result<RegisterId, ExecutionError> {
        RegisterId::general_purpose(self.get_bit_range_u8(9, 11))
    }
    /// First source register, bits `[8:6]`. Same position as `BaseR`.
    ///
    /// # Errors
    /// - not a general purpose register
    pub fn sr1(self) -> Result<RegisterId, ExecutionError> {
        RegisterId::general_purpose(self.get_bit_range_u8(6, 8))
    }
    /// Second source register, bits `[2:0]`.
    ///
    /// # Errors
    /// - not a general purpose register
    pub fn sr2(self) -> Result<RegisterId, ExecutionError> {
        RegisterId::general_purpose(self.get_bit_range_u8(0, 2))
    }
    /// Base register, bits `[8:6]`.
    ///
    /// # Errors
    /// - not a general purpose register
    pub fn base_r(self) -> Result<RegisterId, ExecutionError> {
        self.sr1()
    }
    #[must_use]
    pub fn is_immediate(self) -> bool {
        self.get_bit(5)
    }
    /// `imm5` sign extended to 16 bits.
    #[must_use]
    pub fn get_immediate(self) -> u16 {
        numbers::sign_extend(self.get_bit_range(0, 4), 5)
    }
    /// Offset to add to program counter PC, taken from the lowest `len` bits.
    /// Can be positive or negative.
    #[must_use]
    pub fn pc_offset(self, len: u8) -> i16 {
        let bin_rep = numbers::sign_extend(self.get_bit_range(0, len - 1), len);
        numbers::twos_complement_to_decimal(bin_rep)
    }
    /// Trap vector, bits `[7:0]`.
    #[must_use]
    pub fn trap_vector(self) -> u8 {
        self.get_bit_range_u8(0, 7)
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.opcode() {
            Ok(opcode) => write!(f, "{opcode} {:#018b}", self.0),
            Err(_) => write!(f, "??? {:#018b}", self.0),
        }
    }
}

impl From<u16> for Instruction {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}
