//! Streams a `.data` string to the memory-mapped STDOUT device one
//! character at a time, stopping at a newline sentinel, grounded on the
//! original prototype's `test_stdout.py`.

fn main() {
    env_logger::init();

    let source = r#"
        .data
        message: 72 101 108 108 111 32 87 111 114 108 100 10

        .text
        ADDI r1, r0, 10          # sentinel: newline
        ADDI r2, r0, message     # r2 = cursor into the string
        ADDI r4, r0, 1000        # r4 = STDOUT_BASE, built from two
        ADDI r4, r4, 1000        # additions since it overflows an 11-bit immediate

        loop: LW r3, 0, r2
        BEQ r1, r3, end
        SW r3, 0, r4
        ADDI r2, r2, 1
        BEQ r0, r0, loop

        end: SW r3, 1, r4
        NO_OP
    "#;

    let image = stagedvm::assembler::assemble(source).expect("hello program should assemble");
    let mut cpu = stagedvm::cpu::Cpu::new(&image).expect("image should fit in memory");
    cpu.run().expect("hello program should run to completion");
    println!();
}
