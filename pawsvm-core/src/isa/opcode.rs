use std::fmt;

/// Low bits of an encoded opcode byte holding the catalog opcode.
pub const OPCODE_MASK: u8 = 0x1F;
/// Bit position of the first operand's width bit in an encoded opcode byte.
pub const WIDE_OPERAND_SHIFT: usize = 5;
pub const MAX_OPERANDS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Opcode {
    Push = 0x00,
    Pop = 0x01,
    Mov = 0x02,
    Load = 0x03,
    Store = 0x04,
    Add = 0x05,
    Sub = 0x06,
    Mul = 0x07,
    Div = 0x08,
    Mod = 0x09,
    Jump = 0x0A,
    JumpIfZero = 0x0B,
    JumpIfCarry = 0x0C,
    Cmp = 0x0D,
    Call = 0x0E,
    Ret = 0x0F,
    Test = 0x10,
    Nop = 0x11,
    Halt = 0x12,
    Syscall = 0x13,
}

/// What an instruction does with one of its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperandRole {
    /// Written by the instruction; must be a register.
    Destination,
    /// Read by the instruction; a register or a 4-byte value.
    Source,
}

#[derive(Debug)]
pub struct OpcodeDef {
    pub opcode: Opcode,
    pub mnemonic: &'static str,
    pub roles: &'static [OperandRole],
}

impl OpcodeDef {
    const fn new(opcode: Opcode, mnemonic: &'static str, roles: &'static [OperandRole]) -> Self {
        Self {
            opcode,
            mnemonic,
            roles,
        }
    }

    pub fn arity(&self) -> usize {
        self.roles.len()
    }
}

const D: OperandRole = OperandRole::Destination;
const S: OperandRole = OperandRole::Source;

/// The instruction catalog, indexed by opcode value.
pub static INSTRUCTIONS: [OpcodeDef; 20] = [
    OpcodeDef::new(Opcode::Push, "PUSH", &[S]),
    OpcodeDef::new(Opcode::Pop, "POP", &[D]),
    OpcodeDef::new(Opcode::Mov, "MOV", &[D, S]),
    OpcodeDef::new(Opcode::Load, "LOAD", &[D, S]),
    OpcodeDef::new(Opcode::Store, "STORE", &[S, S]),
    OpcodeDef::new(Opcode::Add, "ADD", &[D, S, S]),
    OpcodeDef::new(Opcode::Sub, "SUB", &[D, S, S]),
    OpcodeDef::new(Opcode::Mul, "MUL", &[D, S, S]),
    OpcodeDef::new(Opcode::Div, "DIV", &[D, S, S]),
    OpcodeDef::new(Opcode::Mod, "MOD", &[D, S, S]),
    OpcodeDef::new(Opcode::Jump, "JUMP", &[S]),
    OpcodeDef::new(Opcode::JumpIfZero, "JUMP_IF_ZERO", &[S]),
    OpcodeDef::new(Opcode::JumpIfCarry, "JUMP_IF_CARRY", &[S]),
    OpcodeDef::new(Opcode::Cmp, "CMP", &[S, S]),
    OpcodeDef::new(Opcode::Call, "CALL", &[S]),
    OpcodeDef::new(Opcode::Ret, "RET", &[]),
    OpcodeDef::new(Opcode::Test, "TEST", &[S]),
    OpcodeDef::new(Opcode::Nop, "NOP", &[]),
    OpcodeDef::new(Opcode::Halt, "HALT", &[]),
    OpcodeDef::new(Opcode::Syscall, "SYSCALL", &[]),
];

impl Opcode {
    pub const fn value(self) -> u8 {
        self as u8
    }

    pub fn def(self) -> &'static OpcodeDef {
        &INSTRUCTIONS[self as usize]
    }

    pub fn mnemonic(self) -> &'static str {
        self.def().mnemonic
    }

    pub fn arity(self) -> usize {
        self.def().arity()
    }

    pub fn roles(self) -> &'static [OperandRole] {
        self.def().roles
    }

    /// Looks up a catalog opcode value (without width bits).
    pub fn from_value(value: u8) -> Option<Self> {
        INSTRUCTIONS.get(value as usize).map(|def| def.opcode)
    }

    /// Looks up an uppercase mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        INSTRUCTIONS
            .iter()
            .find(|def| def.mnemonic == mnemonic)
            .map(|def| def.opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// An encoded opcode byte: catalog opcode in the low 5 bits, one width bit
/// per operand above it.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OpcodeByte {
    value: u8,
}

impl OpcodeByte {
    pub fn new(opcode: Opcode, wide: impl IntoIterator<Item = bool>) -> Self {
        let mask = wide
            .into_iter()
            .take(MAX_OPERANDS)
            .enumerate()
            .fold(0u8, |mask, (idx, is_wide)| mask | (u8::from(is_wide) << idx));
        Self {
            value: opcode.value() | (mask << WIDE_OPERAND_SHIFT),
        }
    }

    pub fn from_byte(value: u8) -> Self {
        Self { value }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn opcode_value(&self) -> u8 {
        self.value & OPCODE_MASK
    }

    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_value(self.opcode_value())
    }

    pub fn wide_mask(&self) -> u8 {
        self.value >> WIDE_OPERAND_SHIFT
    }

    /// Whether operand `idx` is encoded as a 4-byte value.
    pub fn is_wide(&self, idx: usize) -> bool {
        idx < MAX_OPERANDS && (self.wide_mask() >> idx) & 0x01 == 1
    }
}

impl fmt::Debug for OpcodeByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("0x{:02X}", self.value))
    }
}
