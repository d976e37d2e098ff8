//! Register ABI names, carried from `original_source/assembler.py`'s
//! `ABI_NAMES` table (itself modelled on the RISC-V calling convention
//! names) plus the `r0`..`r31` numeric aliases.

use std::collections::HashMap;
use std::sync::OnceLock;

const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

fn lookup_table() -> &'static HashMap<String, u8> {
    static TABLE: OnceLock<HashMap<String, u8>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::new();
        for (i, name) in ABI_NAMES.iter().enumerate() {
            table.insert(name.to_string(), i as u8);
        }
        for i in 0..=31u8 {
            table.insert(format!("r{i}"), i);
        }
        table
    })
}

/// Resolve a register token (`"zero"`, `"ra"`, `"r5"`, ...) to its number,
/// case-insensitively.
pub fn resolve(token: &str) -> Option<u8> {
    lookup_table().get(&token.to_ascii_lowercase()).copied()
}
