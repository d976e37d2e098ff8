//! The two-pass assembler (`spec.md` §5): turns assembly text into the
//! binary image `cpu` executes.
//!
//! Grounded on `original_source/assembler.py`: a data pass that builds a
//! word list and a label-to-offset table, a text preprocessing pass that
//! strips comments, carries orphaned end-of-file labels forward onto a
//! trailing `NO_OP` sentinel, and a per-line tokenize-and-encode pass that
//! resolves `.data` label references (offset by [`crate::isa::DATA_BASE`])
//! and `.text` label references (as branch/jump-relative word offsets).
//!
//! Text grammar, one instruction per line:
//!
//! ```text
//! NO_OP
//! ADD  rd, rs1, rs2          SUB, MUL, SHL, SHR, SLT alike
//! ADDI rd, rs1, imm          SUBI, MULI, SHLI, SHRI, SLTI alike
//! LW   rd, imm, base
//! SW   value, imm, base
//! BEQ  rs1, rs2, label       BNE, BGE, BLT alike
//! JAL  label
//! ```
//!
//! `LW`/`SW` put the immediate between the two registers, matching
//! `assembler.py`'s literal token order; this differs from
//! [`crate::encode::lw`]/[`crate::encode::sw`]'s Rust-side argument order,
//! which groups the two registers together for readability. A label may
//! prefix any line, separated by `:`; a label on a line by itself attaches
//! to the next non-empty line.
//!
//! Every error bubbles up wrapped in [`AssemblyError::AtLine`], tagged with
//! the 1-based source line it came from (comments and blank lines don't
//! count, but they don't shift the numbering either).

pub mod lexer;
pub mod registers;

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use crate::encode::{self, EncodeError};
use crate::isa::{opcode, DATA_BASE, DATA_SIZE, STDOUT_BASE, TEXT_SIZE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),
    #[error("unknown register '{0}'")]
    UnknownRegister(String),
    #[error("undefined label '{0}'")]
    UndefinedLabel(String),
    #[error("'{0}' is not a valid integer immediate or known .data label")]
    InvalidImmediate(String),
    #[error("line is missing an operand: '{0}'")]
    MissingOperand(String),
    #[error(".data section has {words} words, which overflows its {budget}-word budget")]
    DataSectionTooLarge { words: usize, budget: usize },
    #[error(".text section has {words} words, which overflows its {budget}-word budget")]
    TextSectionTooLarge { words: usize, budget: usize },
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<AssemblyError>,
    },
}

struct DataPass {
    words: Vec<i32>,
    labels: HashMap<String, usize>,
}

/// `original_source/assembler.py`'s `assembler_process_data`: each line is
/// zero or more colon-prefixed labels followed by whitespace-separated
/// integer literals, appended to a running word list.
fn process_data(lines: &[(usize, String)]) -> Result<DataPass, AssemblyError> {
    let mut words = Vec::new();
    let mut labels = HashMap::new();
    for (line_no, line) in lines {
        let mut parts: Vec<&str> = line.split(':').collect();
        let tail = parts.pop().unwrap_or("");
        for label in parts {
            labels.insert(label.trim().to_ascii_uppercase(), words.len());
        }
        for token in tail.split_whitespace() {
            let value: i32 = token.parse().map_err(|_| AssemblyError::AtLine {
                line: *line_no,
                source: Box::new(AssemblyError::InvalidImmediate(token.to_string())),
            })?;
            words.push(value);
        }
    }
    Ok(DataPass { words, labels })
}

/// `assembler.py`'s `assembler_preprocess`: split each line on `:` into
/// labels plus an instruction, append a trailing `NO_OP` sentinel so a
/// label at end of file has something to attach to, then drop empty
/// entries while carrying their labels onto the next non-empty one. Each
/// surviving entry keeps the original source line number of its
/// instruction (the sentinel gets the line just past end of file), for
/// error reporting.
fn preprocess_text(lines: &[(usize, String)]) -> Vec<(usize, String, Vec<String>)> {
    let sentinel_line = lines.last().map_or(1, |(line_no, _)| line_no + 1);

    let mut entries: Vec<(usize, String, Vec<String>)> = lines
        .iter()
        .map(|(line_no, line)| {
            let mut parts: Vec<&str> = line.split(':').collect();
            let tail = parts.pop().unwrap_or("").trim().to_string();
            let labels = parts.into_iter().map(|l| l.trim().to_string()).collect();
            (*line_no, tail, labels)
        })
        .collect();
    entries.push((sentinel_line, "NO_OP".to_string(), Vec::new()));

    let mut revised = Vec::new();
    let mut orphaned: Vec<String> = Vec::new();
    for (line_no, line, mut labels) in entries.drain(..) {
        if !line.is_empty() {
            labels.extend(orphaned.drain(..));
            revised.push((line_no, line, labels));
        } else {
            orphaned.extend(labels);
        }
    }
    revised
}

fn build_text_label_lookup(revised: &[(usize, String, Vec<String>)]) -> HashMap<String, usize> {
    let mut labels = HashMap::new();
    for (index, (_, _, entry_labels)) in revised.iter().enumerate() {
        for label in entry_labels {
            labels.insert(label.to_ascii_uppercase(), index);
        }
    }
    labels
}

fn next_token(tokens: &mut VecDeque<String>, line: &str) -> Result<String, AssemblyError> {
    tokens.pop_front().ok_or_else(|| AssemblyError::MissingOperand(line.to_string()))
}

fn next_register(tokens: &mut VecDeque<String>, line: &str) -> Result<u8, AssemblyError> {
    let token = next_token(tokens, line)?;
    registers::resolve(&token).ok_or(AssemblyError::UnknownRegister(token))
}

/// Resolve an I-type immediate token: a `.data` label (offset by
/// [`DATA_BASE`]) or a literal integer.
fn resolve_value_immediate(token: &str, data_labels: &HashMap<String, usize>) -> Result<i32, AssemblyError> {
    let upper = token.to_ascii_uppercase();
    if let Some(&offset) = data_labels.get(&upper) {
        Ok(offset as i32 + DATA_BASE as i32)
    } else {
        token.parse::<i32>().map_err(|_| AssemblyError::InvalidImmediate(token.to_string()))
    }
}

/// Resolve a branch/jump label token into a word-relative offset from
/// `index`.
fn resolve_relative_label(
    token: &str,
    index: usize,
    text_labels: &HashMap<String, usize>,
) -> Result<i32, AssemblyError> {
    let upper = token.to_ascii_uppercase();
    let target = *text_labels.get(&upper).ok_or_else(|| AssemblyError::UndefinedLabel(token.to_string()))?;
    Ok(target as i32 - index as i32)
}

fn parse_line(
    index: usize,
    line: &str,
    text_labels: &HashMap<String, usize>,
    data_labels: &HashMap<String, usize>,
) -> Result<u32, AssemblyError> {
    let mut tokens: VecDeque<String> = lexer::tokenize(line).into();
    let mnemonic = next_token(&mut tokens, line)?.to_ascii_uppercase();

    let word = match mnemonic.as_str() {
        "NO_OP" => 0,

        "ADD" | "SUB" | "MUL" | "SHL" | "SHR" | "SLT" => {
            let op = match mnemonic.as_str() {
                "ADD" => opcode::ADD,
                "SUB" => opcode::SUB,
                "MUL" => opcode::MUL,
                "SHL" => opcode::SHL,
                "SHR" => opcode::SHR,
                _ => opcode::SLT,
            };
            let rd = next_register(&mut tokens, line)?;
            let rs1 = next_register(&mut tokens, line)?;
            let rs2 = next_register(&mut tokens, line)?;
            encode::rtype(op, rd, rs1, rs2)
        }

        "ADDI" | "SUBI" | "MULI" | "SHLI" | "SHRI" | "SLTI" => {
            let op = match mnemonic.as_str() {
                "ADDI" => opcode::ADDI,
                "SUBI" => opcode::SUBI,
                "MULI" => opcode::MULI,
                "SHLI" => opcode::SHLI,
                "SHRI" => opcode::SHRI,
                _ => opcode::SLTI,
            };
            let rd = next_register(&mut tokens, line)?;
            let rs1 = next_register(&mut tokens, line)?;
            let imm_token = next_token(&mut tokens, line)?;
            let imm = resolve_value_immediate(&imm_token, data_labels)?;
            encode::itype(op, rd, rs1, imm)?
        }

        "LW" => {
            let rd = next_register(&mut tokens, line)?;
            let imm_token = next_token(&mut tokens, line)?;
            let imm = resolve_value_immediate(&imm_token, data_labels)?;
            let base = next_register(&mut tokens, line)?;
            encode::lw(rd, base, imm)?
        }

        "SW" => {
            let value = next_register(&mut tokens, line)?;
            let imm_token = next_token(&mut tokens, line)?;
            let imm = resolve_value_immediate(&imm_token, data_labels)?;
            let base = next_register(&mut tokens, line)?;
            encode::sw(base, value, imm)?
        }

        "BEQ" | "BNE" | "BGE" | "BLT" => {
            let op = match mnemonic.as_str() {
                "BEQ" => opcode::BEQ,
                "BNE" => opcode::BNE,
                "BGE" => opcode::BGE,
                _ => opcode::BLT,
            };
            let rs1 = next_register(&mut tokens, line)?;
            let rs2 = next_register(&mut tokens, line)?;
            let label_token = next_token(&mut tokens, line)?;
            let imm = resolve_relative_label(&label_token, index, text_labels)?;
            encode::btype(op, rs1, rs2, imm)?
        }

        "JAL" => {
            let label_token = next_token(&mut tokens, line)?;
            let imm = resolve_relative_label(&label_token, index, text_labels)?;
            encode::jal(imm)?
        }

        other => return Err(AssemblyError::UnknownMnemonic(other.to_string())),
    };

    Ok(word)
}

/// Assemble `source` into a binary image: [`TEXT_SIZE`] words of `.text`
/// followed by [`DATA_SIZE`] words of `.data`, the layout `crate::cpu`
/// expects.
pub fn assemble(source: &str) -> Result<Vec<i32>, AssemblyError> {
    let cleaned = lexer::clean(source);
    let sections = lexer::split_sections(&cleaned);

    let data_pass = process_data(&sections.data)?;
    if data_pass.words.len() > DATA_SIZE {
        return Err(AssemblyError::DataSectionTooLarge { words: data_pass.words.len(), budget: DATA_SIZE });
    }

    let revised_text = preprocess_text(&sections.text);
    if revised_text.len() > TEXT_SIZE {
        return Err(AssemblyError::TextSectionTooLarge { words: revised_text.len(), budget: TEXT_SIZE });
    }
    let text_labels = build_text_label_lookup(&revised_text);

    let mut text_words = Vec::with_capacity(revised_text.len());
    for (index, (line_no, line, _)) in revised_text.iter().enumerate() {
        let word = parse_line(index, line, &text_labels, &data_pass.labels)
            .map_err(|err| AssemblyError::AtLine { line: *line_no, source: Box::new(err) })?;
        text_words.push(word as i32);
    }

    let mut image = vec![0i32; STDOUT_BASE as usize];
    image[..text_words.len()].copy_from_slice(&text_words);
    let data_start = DATA_BASE as usize;
    image[data_start..data_start + data_pass.words.len()].copy_from_slice(&data_pass.words);
    Ok(image)
}

/// Serialize a binary image to big-endian, 4-bytes-per-word bytes
/// (`spec.md` §6).
pub fn image_to_bytes(image: &[i32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(image.len() * 4);
    for word in image {
        bytes.extend_from_slice(&(*word as u32).to_be_bytes());
    }
    bytes
}

/// Deserialize bytes produced by [`image_to_bytes`] back into a word
/// image. Trailing bytes that don't fill a whole word are ignored.
pub fn image_from_bytes(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let array: [u8; 4] = chunk.try_into().expect("chunks_exact(4) yields 4-byte chunks");
            u32::from_be_bytes(array) as i32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;

    #[test]
    fn assembles_a_straight_line_program() {
        let image = assemble("ADDI r1, r0, 5\nADDI r2, r0, 7\nADD r3, r1, r2\nNO_OP\n").unwrap();
        assert_eq!(decode(image[0] as u32).unwrap().imm, 5);
        assert_eq!(decode(image[2] as u32).unwrap().rd, 3);
    }

    #[test]
    fn resolves_forward_and_backward_text_labels() {
        let source = "\
            start: BEQ r0, r0, end\n\
            ADDI r1, r0, 999\n\
            end: NO_OP\n";
        let image = assemble(source).unwrap();
        let decoded = decode(image[0] as u32).unwrap();
        assert_eq!(decoded.imm, 2);
    }

    #[test]
    fn resolves_data_labels_with_data_base_offset() {
        let source = ".data\nanswer: 42\n.text\nLW r1, answer, r0\nNO_OP\n";
        let image = assemble(source).unwrap();
        let decoded = decode(image[0] as u32).unwrap();
        assert_eq!(decoded.imm, DATA_BASE as i32);
        assert_eq!(image[DATA_BASE as usize], 42);
    }

    #[test]
    fn end_of_file_label_attaches_to_the_trailing_no_op_sentinel() {
        let source = "JAL past_end\npast_end:\n";
        let image = assemble(source).unwrap();
        let decoded = decode(image[0] as u32).unwrap();
        assert_eq!(decoded.imm, 1);
    }

    #[test]
    fn unknown_mnemonic_is_an_error() {
        assert_eq!(
            assemble("FROB r1, r2, r3\n"),
            Err(AssemblyError::AtLine {
                line: 1,
                source: Box::new(AssemblyError::UnknownMnemonic("FROB".to_string())),
            })
        );
    }

    #[test]
    fn undefined_label_is_an_error() {
        assert_eq!(
            assemble("JAL nowhere\n"),
            Err(AssemblyError::AtLine {
                line: 1,
                source: Box::new(AssemblyError::UndefinedLabel("nowhere".to_string())),
            })
        );
    }

    #[test]
    fn error_line_number_accounts_for_stripped_comments_and_blanks() {
        let err = assemble("# header comment\n\nADDI r1, r0, 5\nFROB r2, r0, 1\n").unwrap_err();
        assert_eq!(
            err,
            AssemblyError::AtLine { line: 4, source: Box::new(AssemblyError::UnknownMnemonic("FROB".to_string())) }
        );
    }

    #[test]
    fn image_bytes_round_trip() {
        let image = assemble("ADDI r1, r0, 5\nNO_OP\n").unwrap();
        let bytes = image_to_bytes(&image);
        assert_eq!(bytes.len(), image.len() * 4);
        assert_eq!(image_from_bytes(&bytes), image);
    }
}
