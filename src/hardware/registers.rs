use crate::errors::ExecutionError;
use crate::hardware::INSTRUCTION_WIDTH;
use crate::numbers;
use std::fmt::{Debug, Formatter};

/// Registers of the LC-3: eight general purpose ones, the program counter and the
/// condition register.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, enumn::N, displaydoc::Display)]
pub enum RegisterId {
    /// R0
    R0 = 0,
    /// R1
    R1,
    /// R2
    R2,
    /// R3
    R3,
    /// R4
    R4,
    /// R5
    R5,
    /// R6
    R6,
    /// R7
    R7,
    /// PC
    Pc,
    /// COND
    Cond,
}
const REGISTER_COUNT: usize = RegisterId::Cond as usize + 1;

impl RegisterId {
    /// General purpose register `R<index>`.
    ///
    /// # Errors
    /// - `index` is not in `0..=7`
    pub fn general_purpose(index: u8) -> Result<Self, ExecutionError> {
        Self::n(index)
            .filter(|id| *id <= Self::R7)
            .ok_or(ExecutionError::UnknownRegister { index })
    }
}

/// Content of a single 16 bit register, readable as raw bits or as 2's complement number.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct Register(u16);

impl Register {
    #[must_use]
    pub const fn from_binary(value: u16) -> Self {
        Self(value)
    }
    #[must_use]
    pub const fn from_decimal(value: i16) -> Self {
        Self(value.cast_unsigned())
    }
    #[must_use]
    pub const fn as_binary(self) -> u16 {
        self.0
    }
    #[must_use]
    pub const fn as_decimal(self) -> i16 {
        numbers::twos_complement_to_decimal(self.0)
    }
}

impl Debug for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x} ({})", self.0, self.as_decimal())
    }
}

#[must_use]
pub const fn from_binary(value: u16) -> Register {
    Register::from_binary(value)
}
#[must_use]
pub const fn from_decimal(value: i16) -> Register {
    Register::from_decimal(value)
}

/// The register file. All registers start out as zero.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Registers {
    values: [Register; REGISTER_COUNT],
}

impl Debug for Registers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for id in (0..=RegisterId::Cond as u8).filter_map(RegisterId::n) {
            map.entry(&id, &self.get(id));
        }
        map.finish()
    }
}

impl Registers {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: [Register(0); REGISTER_COUNT],
        }
    }

    #[must_use]
    pub const fn get(&self, r: RegisterId) -> Register {
        self.values[r as usize]
    }
    pub const fn set(&mut self, r: RegisterId, value: Register) {
        self.values[r as usize] = value;
    }

    #[must_use]
    pub const fn pc(&self) -> Register {
        self.get(RegisterId::Pc)
    }
    pub const fn set_pc(&mut self, value: u16) {
        self.set(RegisterId::Pc, Register::from_binary(value));
    }

    /// The flag stored in the condition register, `None` as long as no instruction set one.
    #[must_use]
    pub fn get_conditional_register(&self) -> Option<ConditionFlag> {
        ConditionFlag::n(self.get(RegisterId::Cond).as_binary())
    }
    pub const fn set_conditional_register(&mut self, flag: ConditionFlag) {
        self.set(RegisterId::Cond, Register::from_binary(flag as u16));
    }
    /// Classifies the current value of `r` and stores the resulting flag.
    pub fn update_conditional_register(&mut self, r: RegisterId) {
        let flag = ConditionFlag::from(self.get(r).as_binary());
        self.set_conditional_register(flag);
    }
}

/// Sign of the result of the last flag updating instruction. Exactly one is set at a time.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, enumn::N, displaydoc::Display)]
pub enum ConditionFlag {
    /// POSITIVE
    Pos = 1 << 0,
    /// ZERO
    Zero = 1 << 1,
    /// NEGATIVE
    Neg = 1 << 2,
}

impl From<u16> for ConditionFlag {
    fn from(value: u16) -> Self {
        if value == 0 {
            Self::Zero
        } else if value >> (INSTRUCTION_WIDTH - 1) == 0 {
            Self::Pos
        } else {
            // leftmost bit is 1 for negative numbers
            Self::Neg
        }
    }
}
