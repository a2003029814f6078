use std::collections::HashMap;

use pawsvm_core::layout::DEFAULT_ORIGIN;
use pawsvm_core::{Instruction, Opcode, Operand, OperandRole};

use crate::error::{AssemblyError, Result};
use crate::syntax::{
    is_identifier, label_definition, looks_like_register, parse_immediate, parse_register,
    strip_comment, IMMEDIATE_PREFIX, SECTION_PREFIX, TEXT_SECTION,
};

/// A non-blank source line with its comment removed.
#[derive(Clone, Debug)]
struct SourceLine<'a> {
    number: usize,
    code: &'a str,
    text: &'a str,
}

/// An operand as parsed in pass 1, before labels are known.
#[derive(Clone, Debug, PartialEq, Eq)]
enum PendingOperand {
    Ready(Operand),
    Label(String),
}

impl PendingOperand {
    fn encoded_len(&self) -> usize {
        match self {
            PendingOperand::Ready(operand) => operand.encoded_len(),
            PendingOperand::Label(_) => Operand::Address(0).encoded_len(),
        }
    }
}

#[derive(Clone, Debug)]
struct PendingInstruction<'a> {
    line: SourceLine<'a>,
    opcode: Opcode,
    operands: Vec<PendingOperand>,
}

impl PendingInstruction<'_> {
    fn encoded_len(&self) -> usize {
        1 + self
            .operands
            .iter()
            .map(PendingOperand::encoded_len)
            .sum::<usize>()
    }
}

#[derive(Clone, Copy, Debug)]
struct LabelDef {
    address: u32,
    line: usize,
}

/// Two-pass assembler from mnemonic text to the encoded instruction stream.
///
/// Pass 1 parses every instruction in the `.text` section and binds each label
/// to `origin` plus the encoded size of everything before it. Pass 2 resolves
/// label operands and emits bytes.
#[derive(Clone, Debug)]
pub struct Assembler {
    lines: Vec<String>,
    origin: u32,
}

impl Assembler {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            origin: DEFAULT_ORIGIN,
        }
    }

    /// Address the program will be loaded at; labels resolve relative to it.
    pub fn with_origin(mut self, origin: u32) -> Self {
        self.origin = origin;
        self
    }

    pub fn origin(&self) -> u32 {
        self.origin
    }

    pub fn assemble(&self) -> Result<Vec<u8>> {
        let instructions = self.instructions()?;
        let mut bytes = Vec::new();
        for instruction in &instructions {
            instruction.encode_into(&mut bytes);
        }
        tracing::debug!(
            "assembled {} instructions into {} bytes at origin 0x{:04X}",
            instructions.len(),
            bytes.len(),
            self.origin
        );
        Ok(bytes)
    }

    /// Assembles to resolved instructions instead of bytes.
    pub fn instructions(&self) -> Result<Vec<Instruction>> {
        let text = self.text_section()?;
        let (pending, labels) = self.first_pass(&text)?;
        pending
            .into_iter()
            .map(|instruction| resolve(instruction, &labels))
            .collect()
    }

    /// The labels of the text section and their resolved addresses.
    pub fn labels(&self) -> Result<HashMap<String, u32>> {
        let text = self.text_section()?;
        let (_, labels) = self.first_pass(&text)?;
        Ok(labels
            .into_iter()
            .map(|(name, def)| (name, def.address))
            .collect())
    }

    /// Lines between `.text` and the next section marker.
    fn text_section(&self) -> Result<Vec<SourceLine<'_>>> {
        let mut lines = self
            .lines
            .iter()
            .enumerate()
            .map(|(idx, raw)| SourceLine {
                number: idx + 1,
                code: strip_comment(raw),
                text: raw.trim(),
            })
            .filter(|line| !line.code.is_empty());

        lines
            .by_ref()
            .find(|line| line.code == TEXT_SECTION)
            .ok_or(AssemblyError::MissingSection)?;
        Ok(lines
            .take_while(|line| !line.code.starts_with(SECTION_PREFIX))
            .collect())
    }

    fn first_pass<'a>(
        &self,
        text: &[SourceLine<'a>],
    ) -> Result<(Vec<PendingInstruction<'a>>, HashMap<String, LabelDef>)> {
        let mut labels: HashMap<String, LabelDef> = HashMap::new();
        let mut pending = Vec::new();
        let mut offset = 0usize;

        for line in text {
            if let Some(label) = label_definition(line.code) {
                if looks_like_register(label) {
                    return Err(AssemblyError::IllegalRegister {
                        register: label.to_string(),
                        line: line.number,
                        text: line.text.to_string(),
                    });
                }
                if let Some(first) = labels.get(label) {
                    return Err(AssemblyError::DuplicateLabel {
                        label: label.to_string(),
                        line: line.number,
                        first: first.line,
                    });
                }
                let address = self.origin.wrapping_add(offset as u32);
                tracing::trace!("label {} = 0x{:04X}", label, address);
                labels.insert(
                    label.to_string(),
                    LabelDef {
                        address,
                        line: line.number,
                    },
                );
                continue;
            }

            let instruction = parse_instruction(line)?;
            offset += instruction.encoded_len();
            pending.push(instruction);
        }
        Ok((pending, labels))
    }
}

/// Assembles a whole source text at the default origin.
pub fn assemble_source(source: &str) -> Result<Vec<u8>> {
    Assembler::new(source.lines()).assemble()
}

fn illegal_operand(line: &SourceLine<'_>, operand: &str, reason: impl Into<String>) -> AssemblyError {
    AssemblyError::IllegalOperand {
        operand: operand.to_string(),
        reason: reason.into(),
        line: line.number,
        text: line.text.to_string(),
    }
}

fn parse_instruction<'a>(line: &SourceLine<'a>) -> Result<PendingInstruction<'a>> {
    let mut tokens = line.code.split_whitespace();
    let mnemonic = tokens.next().unwrap_or_default().to_ascii_uppercase();
    let opcode = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| AssemblyError::UnknownOpcode {
        mnemonic: mnemonic.clone(),
        line: line.number,
        text: line.text.to_string(),
    })?;

    let operand_text: String = tokens.collect();
    let roles = opcode.roles();
    if operand_text.is_empty() {
        if !roles.is_empty() {
            return Err(illegal_operand(
                line,
                "",
                format!("{mnemonic} takes {} operand(s)", roles.len()),
            ));
        }
        return Ok(PendingInstruction {
            line: line.clone(),
            opcode,
            operands: Vec::new(),
        });
    }

    let tokens: Vec<&str> = operand_text.split(',').collect();
    if tokens.len() != roles.len() {
        return Err(illegal_operand(
            line,
            &operand_text,
            format!(
                "{mnemonic} takes {} operand(s), found {}",
                roles.len(),
                tokens.len()
            ),
        ));
    }

    let operands = tokens
        .iter()
        .zip(roles)
        .map(|(token, role)| parse_operand(line, token, *role))
        .collect::<Result<Vec<_>>>()?;
    Ok(PendingInstruction {
        line: line.clone(),
        opcode,
        operands,
    })
}

fn parse_operand(line: &SourceLine<'_>, token: &str, role: OperandRole) -> Result<PendingOperand> {
    if looks_like_register(token) {
        return parse_register(token)
            .map(|register| PendingOperand::Ready(Operand::Register(register)))
            .ok_or_else(|| AssemblyError::IllegalRegister {
                register: token.to_string(),
                line: line.number,
                text: line.text.to_string(),
            });
    }
    if role == OperandRole::Destination {
        return Err(illegal_operand(line, token, "destination must be a register"));
    }

    if let Some(value) = token.strip_prefix(IMMEDIATE_PREFIX) {
        parse_immediate(value)
            .map(|value| PendingOperand::Ready(Operand::Immediate(value)))
            .ok_or_else(|| illegal_operand(line, token, "not a 32-bit integer"))
    } else if is_identifier(token) {
        Ok(PendingOperand::Label(token.to_string()))
    } else {
        Err(illegal_operand(line, token, "not a register, immediate or label"))
    }
}

fn resolve(
    instruction: PendingInstruction<'_>,
    labels: &HashMap<String, LabelDef>,
) -> Result<Instruction> {
    let line = &instruction.line;
    let operands = instruction
        .operands
        .into_iter()
        .map(|operand| match operand {
            PendingOperand::Ready(operand) => Ok(operand),
            PendingOperand::Label(label) => labels
                .get(&label)
                .map(|def| Operand::Address(def.address))
                .ok_or_else(|| illegal_operand(line, &label, "unknown label")),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Instruction::new(instruction.opcode, operands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawsvm_core::Register;

    fn assemble(source: &str) -> Result<Vec<u8>> {
        assemble_source(source)
    }

    #[test]
    fn encodes_the_sample_program() {
        let bytes = assemble(
            "
            .text
                ; Example
                mov r0, #5
                add r1, r0, #10
                halt
            ",
        )
        .unwrap();
        assert_eq!(
            bytes,
            [
                0x42, 0x00, 0x05, 0x00, 0x00, 0x00, // MOV r0, #5
                0x85, 0x01, 0x00, 0x0A, 0x00, 0x00, 0x00, // ADD r1, r0, #10
                0x12, // HALT
            ]
        );
    }

    #[test]
    fn register_only_operands_use_the_plain_opcode() {
        let bytes = assemble(".text\nmov r0, r1\npush acc\n").unwrap();
        assert_eq!(bytes, [0x02, 0x00, 0x01, 0x00, 0x0F]);
    }

    #[test]
    fn labels_resolve_to_byte_addresses() {
        let source = "
            .text
            start:
                mov r0, #0xA   ; 6 bytes
                jump end       ; 5 bytes
            end:
                nop
                halt
            ";
        let assembler = Assembler::new(source.lines());
        let labels = assembler.labels().unwrap();
        assert_eq!(labels["start"], 0x0100);
        assert_eq!(labels["end"], 0x010B);
        let instructions = assembler.instructions().unwrap();
        assert_eq!(
            instructions[1],
            Instruction::new(Opcode::Jump, vec![Operand::Address(0x010B)])
        );

        let moved = Assembler::new(source.lines()).with_origin(0x0200);
        assert_eq!(moved.labels().unwrap()["end"], 0x020B);
    }

    #[test]
    fn forward_and_backward_references() {
        let instructions = Assembler::new(".text\nloop:\ncall sub\njump loop\nsub:\nret\n".lines())
            .instructions()
            .unwrap();
        assert_eq!(
            instructions,
            [
                Instruction::new(Opcode::Call, vec![Operand::Address(0x010A)]),
                Instruction::new(Opcode::Jump, vec![Operand::Address(0x0100)]),
                Instruction::new(Opcode::Ret, vec![]),
            ]
        );
    }

    #[test]
    fn requires_text_section() {
        assert_eq!(assemble("mov r0, #1\nhalt"), Err(AssemblyError::MissingSection));
        assert_eq!(assemble(""), Err(AssemblyError::MissingSection));
    }

    #[test]
    fn stops_at_next_section() {
        let bytes = assemble(".text\nhalt\n.data\nthis is not code\n").unwrap();
        assert_eq!(bytes, [0x12]);
    }

    #[test]
    fn unknown_opcode() {
        let err = assemble(".text\n  FOO r0\n").unwrap_err();
        assert_eq!(
            err,
            AssemblyError::UnknownOpcode {
                mnemonic: "FOO".to_string(),
                line: 2,
                text: "FOO r0".to_string()
            }
        );
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn illegal_register() {
        let err = assemble(".text\nmov r13, #1\n").unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::IllegalRegister { ref register, line: 2, .. } if register == "r13"
        ));
    }

    #[test]
    fn operand_counts() {
        assert!(matches!(
            assemble(".text\nhalt r0\n"),
            Err(AssemblyError::IllegalOperand { line: 2, .. })
        ));
        assert!(matches!(
            assemble(".text\nadd r0, r1\n"),
            Err(AssemblyError::IllegalOperand { line: 2, .. })
        ));
        assert!(matches!(
            assemble(".text\npush\n"),
            Err(AssemblyError::IllegalOperand { line: 2, .. })
        ));
        assert!(matches!(
            assemble(".text\nmov r0,, #1\n"),
            Err(AssemblyError::IllegalOperand { line: 2, .. })
        ));
    }

    #[test]
    fn illegal_operands() {
        let err = assemble(".text\nmov r0, #banana\n").unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::IllegalOperand { ref operand, .. } if operand == "#banana"
        ));
        assert!(matches!(
            assemble(".text\nmov r0, #0x1_0000_0000\n"),
            Err(AssemblyError::IllegalOperand { .. })
        ));
        assert!(matches!(
            assemble(".text\njump nowhere\n"),
            Err(AssemblyError::IllegalOperand { ref operand, .. }) if operand == "nowhere"
        ));
        assert!(matches!(
            assemble(".text\nmov #1, r0\n"),
            Err(AssemblyError::IllegalOperand { ref reason, .. }) if reason.contains("destination")
        ));
        assert!(matches!(
            assemble(".text\npop target\ntarget:\n"),
            Err(AssemblyError::IllegalOperand { .. })
        ));
    }

    #[test]
    fn operand_tokens_are_concatenated() {
        let spaced = assemble(".text\nadd r1 , r0 ,#10\n").unwrap();
        let tight = assemble(".text\nADD r1,r0,#10\n").unwrap();
        assert_eq!(spaced, tight);
    }

    #[test]
    fn duplicate_labels() {
        assert_eq!(
            assemble(".text\nhere:\nnop\nhere:\nhalt\n"),
            Err(AssemblyError::DuplicateLabel {
                label: "here".to_string(),
                line: 4,
                first: 2
            })
        );
    }

    #[test]
    fn labels_cannot_be_register_names() {
        for name in ["sp", "pc", "acc", "r1"] {
            let source = format!(".text\njump {name}\nhalt\n{name}:\nnop\nhalt\n");
            assert_eq!(
                assemble(&source),
                Err(AssemblyError::IllegalRegister {
                    register: name.to_string(),
                    line: 4,
                    text: format!("{name}:"),
                })
            );
        }
        assert!(matches!(
            assemble(".text\nr13:\nhalt\n"),
            Err(AssemblyError::IllegalRegister { line: 2, .. })
        ));
        assert!(assemble(".text\njump result\nresult:\nhalt\n").is_ok());
    }

    #[test]
    fn negative_immediates_wrap_to_32_bits() {
        let instructions = Assembler::new([".text", "mov r2, #-1"]).instructions().unwrap();
        assert_eq!(
            instructions[0],
            Instruction::new(
                Opcode::Mov,
                vec![Operand::Register(Register::R2), Operand::Immediate(-1)]
            )
        );
        assert_eq!(
            assemble(".text\nmov r2, #-1\n").unwrap(),
            [0x42, 0x02, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }
}
