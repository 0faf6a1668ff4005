//! Implemented operations for the LC 3.
//!
//! Addresses are bit addresses: PC relative and base relative offsets are added to the
//! register value as signed numbers and point at a bit, not at a word.
use crate::emulator::instruction::Instruction;
use crate::errors::ExecutionError;
use crate::hardware::memory::Memory;
use crate::hardware::registers::{ConditionFlag, Register, RegisterId, Registers, from_binary};

/// ADD: Mathematical addition in 2 variants
/// - DR is set with result of SR 1 + SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0001 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 + sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0001 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn add(i: Instruction, r: &mut Registers) -> Result<(), ExecutionError> {
    let dr = i.dr()?;
    let operand = second_operand(i, r)?;
    r.set(
        dr,
        from_binary(r.get(i.sr1()?).as_binary().wrapping_add(operand)),
    );
    r.update_conditional_register(dr);
    Ok(())
}
/// AND: bit-wise AND in 2 variants
/// - DR is set with result of SR 1 AND SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0101 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 AND sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0101 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn and(i: Instruction, r: &mut Registers) -> Result<(), ExecutionError> {
    let dr = i.dr()?;
    let operand = second_operand(i, r)?;
    r.set(dr, from_binary(r.get(i.sr1()?).as_binary() & operand));
    r.update_conditional_register(dr);
    Ok(())
}

fn second_operand(i: Instruction, r: &Registers) -> Result<u16, ExecutionError> {
    Ok(if i.is_immediate() {
        i.get_immediate()
    } else {
        r.get(i.sr2()?).as_binary()
    })
}

/// NOT: bit-wise complement of the value in SR 1
/// ```text
///  15__12__11_9__8_6___5___0_
/// | 1001 |  DR | SR1 | 11111 |
///  --------------------------
/// ```
pub fn not(i: Instruction, r: &mut Registers) -> Result<(), ExecutionError> {
    let dr = i.dr()?;
    r.set(dr, from_binary(!r.get(i.sr1()?).as_binary()));
    r.update_conditional_register(dr);
    Ok(())
}
/// BR: Conditional Branch
/// This opcode adds the value of the sign extended offset to PC if
/// - either none of the `nzp` bits are set
/// - or the current state of the `ConditionFlag` matches a set bit of `n`, `z` or `p`.
/// ```text
///  15__12__11_9___8_______0_
/// | 0000 |  nzp | PCoffset9 |
///  -------------------------
/// ```
/// A branch not taken leaves PC untouched.
/// See [`ConditionFlag`]
pub fn br(i: Instruction, r: &mut Registers) {
    let none_set = i.get_bit_range(9, 11) == 0;
    let do_branch = none_set
        || match r.get_conditional_register() {
            Some(ConditionFlag::Pos) => i.get_bit(9),
            Some(ConditionFlag::Zero) => i.get_bit(10),
            Some(ConditionFlag::Neg) => i.get_bit(11),
            None => false,
        };
    if do_branch {
        r.set_pc(r.pc().as_binary().wrapping_add_signed(i.pc_offset(9)));
    }
}
/// JSR: Jump to Sub-Routine.
/// Two variants:
/// - JSR to `PCOffset11`
/// ```text
///  15__12__11_10_________0
/// | 0100 | 1 | PCOffset11 |
///  -----------------------
/// ```
/// - JSRR: JSR to location in `BaseR`
/// ```text
///  15__12__11_9__8___6___5____0_
/// | 0100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// The former PC is saved in R7 before `BaseR` is read, `JSRR R7` therefore continues
/// right after the instruction.
pub fn jsr(i: Instruction, r: &mut Registers) -> Result<(), ExecutionError> {
    let pc = r.pc();
    r.set(RegisterId::R7, pc);
    let target = if i.get_bit(11) {
        pc.as_binary().wrapping_add_signed(i.pc_offset(11))
    } else {
        r.get(i.base_r()?).as_binary()
    };
    r.set_pc(target);
    Ok(())
}
/// JMP or RET operation.
/// - JMP sets the PC to the value of register `BaseR`
/// ```text
///  15__12__11_9___8_6____5____0_
/// | 1100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// - RET same as JMP, but special case for returning from JSR where former PC is saved in R7.
/// ```text
///  15__12__11_9__8_6___5____0_
/// | 1100 | 000 | 111 | 000000 |
///  ---------------------------
/// ```
pub fn jmp_or_ret(i: Instruction, r: &mut Registers) -> Result<(), ExecutionError> {
    r.set_pc(r.get(i.base_r()?).as_binary());
    Ok(())
}

/// LD: Loads content of memory address of PC + sign extended offset into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 0010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ld(i: Instruction, r: &mut Registers, memory: &Memory) -> Result<(), ExecutionError> {
    let dr = i.dr()?;
    let value = read_word(memory, address_by_pc_offset(i, r, memory)?)?;
    r.set(dr, from_binary(value));
    r.update_conditional_register(dr);
    Ok(())
}

/// LDI: Load indirect.
/// Calculates memory address of PC + sign extended offset and reads another address from there,
/// the content of the memory at that indirectly loaded address is put into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 1010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ldi(i: Instruction, r: &mut Registers, memory: &Memory) -> Result<(), ExecutionError> {
    let dr = i.dr()?;
    let address_address = address_by_pc_offset(i, r, memory)?;
    let value_address = read_word(memory, address_address)?;
    let value = read_word(memory, u64::from(value_address))?;
    r.set(dr, from_binary(value));
    r.update_conditional_register(dr);
    Ok(())
}
/// LDR: Load address from base register and adds sign extended offset to load the memory content
/// from there into DR.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0110 |  DR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn ldr(i: Instruction, r: &mut Registers, memory: &Memory) -> Result<(), ExecutionError> {
    let dr = i.dr()?;
    let value = read_word(memory, address_by_baser_offset(i, r, memory)?)?;
    r.set(dr, from_binary(value));
    r.update_conditional_register(dr);
    Ok(())
}

/// LEA: Load Effective Address loads PC + sign extended offset into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 1110 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn lea(i: Instruction, r: &mut Registers) -> Result<(), ExecutionError> {
    let dr = i.dr()?;
    r.set(
        dr,
        Register::from_binary(r.pc().as_binary().wrapping_add_signed(i.pc_offset(9))),
    );
    r.update_conditional_register(dr);
    Ok(())
}
/// ST: Store. The contents of the SR are written to memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 0011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn st(i: Instruction, r: &Registers, memory: &mut Memory) -> Result<(), ExecutionError> {
    let store_address = address_by_pc_offset(i, r, memory)?;
    memory.write(store_address, u64::from(r.get(i.dr()?).as_binary()))?;
    Ok(())
}
/// STI: Store Indirect. The contents of the SR are written to the address which is loaded from
/// memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 1011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn sti(i: Instruction, r: &Registers, memory: &mut Memory) -> Result<(), ExecutionError> {
    let address_of_store_address = address_by_pc_offset(i, r, memory)?;
    let store_address = read_word(memory, address_of_store_address)?;
    memory.write(
        u64::from(store_address),
        u64::from(r.get(i.dr()?).as_binary()),
    )?;
    Ok(())
}
/// STR: Store contents of SR to memory address of base register plus sign extended offset.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0111 |  SR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn str(i: Instruction, r: &Registers, memory: &mut Memory) -> Result<(), ExecutionError> {
    let store_address = address_by_baser_offset(i, r, memory)?;
    memory.write(store_address, u64::from(r.get(i.dr()?).as_binary()))?;
    Ok(())
}
/// RTI: Return from Interrupt. Interrupts are not emulated, executes as a no-op.
/// ```text
///  15__12__11_____________0_
/// | 1000 | 0000000000000000 |
///  -------------------------
/// ```
pub fn rti(i: Instruction) {
    log::warn!("RTI is not supported, ignoring {i:?}");
}
/// RES: Reserved opcode, executes as a no-op.
pub fn res(i: Instruction) {
    log::warn!("Reserved opcode, ignoring {i:?}");
}

fn address_by_pc_offset(
    i: Instruction,
    r: &Registers,
    memory: &Memory,
) -> Result<u64, ExecutionError> {
    let address = i64::from(r.pc().as_decimal()) + i64::from(i.pc_offset(9));
    Ok(memory.checked_address(address)?)
}
fn address_by_baser_offset(
    i: Instruction,
    r: &Registers,
    memory: &Memory,
) -> Result<u64, ExecutionError> {
    let base = r.get(i.base_r()?);
    let address = i64::from(base.as_decimal()) + i64::from(i.pc_offset(6));
    Ok(memory.checked_address(address)?)
}

/// Reads one 16 bit word.
pub(crate) fn read_word(memory: &Memory, address: u64) -> Result<u16, ExecutionError> {
    let value = memory.read(address)?;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the LC-3 memory serves 16 bit instructions"
    )]
    let word = value as u16;
    Ok(word)
}

#[expect(clippy::unusual_byte_groupings)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::test_helpers::create_memory;
    use crate::hardware::registers::from_decimal;
    use googletest::prelude::*;

    #[gtest]
    pub fn test_opcode_add() {
        let mut regs = Registers::new();
        regs.set(RegisterId::R1, from_decimal(2));
        regs.set(RegisterId::R2, from_decimal(4));
        // Add: DR: 0, SR1: 1: 2, Immediate: false, SR2: 2: 4 => R0: 6
        add(0b0001_000_001_0_00_010.into(), &mut regs).unwrap();
        expect_that!(regs.get(RegisterId::R0).as_decimal(), eq(6));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Pos)));
    }
    #[gtest]
    pub fn test_opcode_add_register_negative() {
        let mut regs = Registers::new();
        regs.set(RegisterId::R5, from_decimal(2));
        regs.set(RegisterId::R6, from_decimal(-4));
        // Add: DR: 7, SR1: 5: 2, Immediate: false, SR2: 6: -4 => R7: -2
        add(0b0001_111_101_0_00_110.into(), &mut regs).unwrap();
        expect_that!(regs.get(RegisterId::R7).as_decimal(), eq(-2));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Neg)));
    }
    #[yare::parameterized(
        plus_fifteen = { 0b0001_111_101_1_01111, 17, ConditionFlag::Pos },
        minus_two = { 0b0001_111_101_1_11110, 0, ConditionFlag::Zero },
        minus_eleven = { 0b0001_111_101_1_10101, -9, ConditionFlag::Neg },
    )]
    fn test_opcode_add_immediate(instruction: u16, expected: i16, flag: ConditionFlag) {
        let mut regs = Registers::new();
        regs.set(RegisterId::R5, from_decimal(2));
        add(instruction.into(), &mut regs).unwrap();
        assert_that!(regs.get(RegisterId::R7).as_decimal(), eq(expected));
        assert_that!(regs.get_conditional_register(), some(eq(flag)));
    }
    #[gtest]
    pub fn test_opcode_add_overflow() {
        let mut regs = Registers::new();
        regs.set(RegisterId::R0, from_binary(0x7FFF)); // largest positive number in 2's complement
        regs.set(RegisterId::R1, from_binary(1));
        add(0b0001_010_000_0_00_001.into(), &mut regs).unwrap();
        expect_that!(regs.get(RegisterId::R2), eq(from_binary(0x8000)));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Neg)));
    }
    #[gtest]
    pub fn test_opcode_and() {
        let mut regs = Registers::new();
        regs.set(RegisterId::R0, from_decimal(5));
        regs.set(RegisterId::R1, from_decimal(-5));
        and(0b0101_000_000_0_00_001.into(), &mut regs).unwrap();
        expect_that!(regs.get(RegisterId::R0).as_decimal(), eq(1));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Pos)));
    }
    #[gtest]
    pub fn test_opcode_and_immediate() {
        let mut regs = Registers::new();
        regs.set(RegisterId::R0, from_decimal(5));
        // imm5: -5
        and(0b0101_000_000_1_11011.into(), &mut regs).unwrap();
        expect_that!(regs.get(RegisterId::R0).as_decimal(), eq(1));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Pos)));
    }
    #[gtest]
    pub fn test_opcode_and_zero() {
        let mut regs = Registers::new();
        regs.set(RegisterId::R3, from_binary(0b1101_1001_0111_0101));
        and(0b0101_011_011_1_00000.into(), &mut regs).unwrap();
        expect_that!(regs.get(RegisterId::R3), eq(from_binary(0)));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Zero)));
    }
    #[gtest]
    pub fn test_opcode_not() {
        let mut regs = Registers::new();
        regs.set(RegisterId::R0, from_decimal(5));
        super::not(0b1001_000_000_111111.into(), &mut regs).unwrap();
        expect_that!(regs.get(RegisterId::R0).as_decimal(), eq(-6));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Neg)));
    }
    #[yare::parameterized(
        unconditional = { 0b0000_000_000111111, ConditionFlag::Zero, 0x303F },
        unconditional_negative_flag = { 0b0000_000_000111111, ConditionFlag::Neg, 0x303F },
        n_not_taken = { 0b0000_100_000111111, ConditionFlag::Zero, 0x3000 },
        z_taken = { 0b0000_010_000111111, ConditionFlag::Zero, 0x303F },
        nz_taken = { 0b0000_110_000111111, ConditionFlag::Zero, 0x303F },
        p_taken = { 0b0000_001_000111111, ConditionFlag::Pos, 0x303F },
        np_not_taken = { 0b0000_101_000111111, ConditionFlag::Zero, 0x3000 },
        nzp_backwards = { 0b0000_111_111110000, ConditionFlag::Neg, 0x2FF0 },
    )]
    fn test_opcode_br(instruction: u16, flag: ConditionFlag, expected_pc: u16) {
        let mut regs = Registers::new();
        regs.set_pc(0x3000);
        regs.set_conditional_register(flag);
        br(instruction.into(), &mut regs);
        assert_that!(regs.pc(), eq(from_binary(expected_pc)));
    }
    #[gtest]
    pub fn test_opcode_br_without_flag() {
        let mut regs = Registers::new();
        br(0b0000_111_000111111.into(), &mut regs);
        expect_that!(regs.pc(), eq(from_binary(0)));
        br(0b0000_000_000111111.into(), &mut regs);
        expect_that!(regs.pc(), eq(from_binary(0x3F)));
    }
    #[gtest]
    pub fn test_opcode_jmp() {
        let mut regs = Registers::new();
        regs.set(RegisterId::R3, from_binary(0x3000));
        jmp_or_ret(0b1100_000_011_000000.into(), &mut regs).unwrap();
        expect_that!(regs.pc(), eq(from_binary(0x3000)));
    }
    #[gtest]
    pub fn test_opcode_ret() {
        let mut regs = Registers::new();
        regs.set_pc(0x3020);
        regs.set(RegisterId::R7, from_binary(0x3000));
        jmp_or_ret(0b1100_000_111_000000.into(), &mut regs).unwrap();
        expect_that!(regs.pc(), eq(from_binary(0x3000)));
    }
    #[gtest]
    pub fn test_opcode_jsr() {
        let mut regs = Registers::new();
        regs.set_pc(0x3000);
        // JSR - PC_OFFSET11: 0x30
        jsr(0b0100_1_00000110000.into(), &mut regs).unwrap();
        expect_that!(regs.pc(), eq(from_binary(0x3030)));
        expect_that!(regs.get(RegisterId::R7), eq(from_binary(0x3000)));

        let mut regs = Registers::new();
        regs.set_pc(0x3000);
        regs.set(RegisterId::R3, from_binary(0x3030));
        // JSRR - BaseR: 3
        jsr(0b0100_0_00_011_000000.into(), &mut regs).unwrap();
        expect_that!(regs.pc(), eq(from_binary(0x3030)));
        expect_that!(regs.get(RegisterId::R7), eq(from_binary(0x3000)));
    }
    #[gtest]
    pub fn test_opcode_jsrr_through_r7_reads_saved_pc() {
        let mut regs = Registers::new();
        regs.set_pc(0x3010);
        regs.set(RegisterId::R7, from_binary(0x3100));
        jsr(0b0100_0_00_111_000000.into(), &mut regs).unwrap();
        expect_that!(regs.pc(), eq(from_binary(0x3010)));
        expect_that!(regs.get(RegisterId::R7), eq(from_binary(0x3010)));
    }
    #[gtest]
    pub fn test_opcode_ld() {
        let mut regs = Registers::new();
        regs.set_pc(0x0030);
        let memory = create_memory(0x0060, &[26]);
        // LD - DR: 0, PC_OFFSET9: 0x30
        ld(0b0010_000_000110000.into(), &mut regs, &memory).unwrap();
        expect_that!(regs.get(RegisterId::R0).as_decimal(), eq(26));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Pos)));
    }
    #[gtest]
    pub fn test_opcode_ld_negative_offset() {
        let mut regs = Registers::new();
        regs.set_pc(0x3020);
        let memory = create_memory(0x3000, &[4711, 0xFFF6]);
        // LD - DR: 4, PC_OFFSET9: -0x10
        ld(0b0010_100_111110000.into(), &mut regs, &memory).unwrap();
        expect_that!(regs.get(RegisterId::R4).as_decimal(), eq(-10));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Neg)));
    }
    #[gtest]
    pub fn test_opcode_ldr() {
        let mut regs = Registers::new();
        regs.set(RegisterId::R0, from_binary(0x3000));
        let memory = create_memory(0x3018, &[26]);
        // LDR - DR: 0, BaseR: 0, OFFSET6: 24
        ldr(0b0110_000_000_011000.into(), &mut regs, &memory).unwrap();
        expect_that!(regs.get(RegisterId::R0).as_decimal(), eq(26));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Pos)));
    }
    #[gtest]
    pub fn test_opcode_ldr_negative_address() {
        let mut regs = Registers::new();
        let memory = create_memory(0, &[]);
        // LDR - DR: 2, BaseR: 6 (0), OFFSET6: -32
        let err = ldr(0b0110_010_110_100000.into(), &mut regs, &memory).unwrap_err();
        expect_that!(
            err.to_string(),
            eq("Invalid address: -32, memory range: [0, 1048560]")
        );
    }
    #[gtest]
    pub fn test_opcode_ldi() {
        let mut regs = Registers::new();
        let memory = create_memory(0x3000, &[0b1010_001_000010000, 0, 0x3040, 0, 0x7F]);
        regs.set_pc(0x3010);
        // LDI - DR: 1, PC_OFFSET9: 16
        ldi(0b1010_001_000010000.into(), &mut regs, &memory).unwrap();
        expect_that!(regs.get(RegisterId::R1), eq(from_binary(0x7F)));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Pos)));
    }
    #[gtest]
    pub fn test_opcode_ldi_pointer_before_pc() {
        let mut regs = Registers::new();
        let memory = create_memory(0x3000, &[0x7F, 0b1010_001_000010000, 0, 0x3000]);
        regs.set_pc(0x3020);
        ldi(0b1010_001_000010000.into(), &mut regs, &memory).unwrap();
        expect_that!(regs.get(RegisterId::R1), eq(from_binary(0x7F)));
    }
    #[gtest]
    pub fn test_opcode_lea() {
        let mut regs = Registers::new();
        regs.set_pc(0x3000);
        lea(0b1110_000_000110000.into(), &mut regs).unwrap();
        expect_that!(regs.get(RegisterId::R0), eq(from_binary(0x3030)));
        expect_that!(regs.get_conditional_register(), some(eq(ConditionFlag::Pos)));
    }
    #[gtest]
    pub fn test_opcode_st() {
        let mut regs = Registers::new();
        let mut memory = create_memory(0, &[]);
        regs.set(RegisterId::R0, from_decimal(26));
        regs.set_pc(0x3000);
        st(0b0011_000_000110000.into(), &regs, &mut memory).unwrap();
        expect_that!(memory.read(0x3030).unwrap(), eq(26));

        ld(0b0010_001_000110000.into(), &mut regs, &memory).unwrap();
        expect_that!(regs.get(RegisterId::R1).as_decimal(), eq(26));
    }
    #[gtest]
    pub fn test_opcode_st_negative_value() {
        let mut regs = Registers::new();
        let mut memory = create_memory(0x3040, &[0xFFFF]);
        regs.set(RegisterId::R0, from_decimal(-2));
        regs.set_pc(0x3000);
        // unaligned store, the neighbouring word keeps its bits
        st(0b0011_000_000111000.into(), &regs, &mut memory).unwrap();
        expect_that!(memory.read(0x3038).unwrap(), eq(0xFFFE));
        expect_that!(memory.read(0x3040).unwrap(), eq(0xFEFF));
    }
    #[gtest]
    pub fn test_opcode_sti() {
        let mut regs = Registers::new();
        let mut memory = create_memory(0x3030, &[0x2000]);
        regs.set(RegisterId::R0, from_decimal(26));
        regs.set_pc(0x3000);
        sti(0b1011_000_000110000.into(), &regs, &mut memory).unwrap();
        expect_that!(memory.read(0x2000).unwrap(), eq(26));

        ldi(0b1010_001_000110000.into(), &mut regs, &memory).unwrap();
        expect_that!(regs.get(RegisterId::R1).as_decimal(), eq(26));
    }
    #[gtest]
    pub fn test_opcode_str() {
        let mut regs = Registers::new();
        let mut memory = create_memory(0, &[]);
        regs.set(RegisterId::R0, from_decimal(26));
        regs.set(RegisterId::R1, from_binary(0x3000));
        str(0b0111_000_001_010000.into(), &regs, &mut memory).unwrap();
        expect_that!(memory.read(0x3010).unwrap(), eq(26));

        ldr(0b0110_010_001_010000.into(), &mut regs, &memory).unwrap();
        expect_that!(regs.get(RegisterId::R2).as_decimal(), eq(26));
    }
    #[gtest]
    pub fn test_opcode_reserved_are_no_ops() {
        let regs = Registers::new();
        rti(0b1000_0000_0000_0000.into());
        res(0b1101_0000_0000_0000.into());
        expect_that!(regs, eq(&Registers::new()));
    }
}
