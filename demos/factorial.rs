//! Computes 5! with the recursive, stack-based routine from the original
//! prototype's `main.py`, expressed as assembly text instead of
//! hand-packed instruction words.

fn main() {
    env_logger::init();

    let source = r#"
        .text
        ADDI r30, r0, 50        # stack pointer
        ADDI r1, r0, 5          # n = 5

        JAL fact
        LW r1, 1, r30
        LW r31, 0, r30
        BEQ r0, r0, end

        fact: ADDI r2, r0, 1
        BEQ r1, r2, return
        SW r31, 0, r30
        SW r1, 1, r30
        ADDI r30, r30, 2
        ADDI r1, r1, -1
        JAL fact
        ADDI r30, r30, -2
        LW r1, 1, r30
        LW r31, 0, r30
        MUL r2, r1, r2
        return: ADD r29, r0, r31

        end: NO_OP
    "#;

    let image = stagedvm::assembler::assemble(source).expect("factorial program should assemble");
    let mut cpu = stagedvm::cpu::Cpu::new(&image).expect("image should fit in memory");
    cpu.run().expect("factorial program should run to completion");

    println!("5! = {}", cpu.registers.read(2).unwrap());
}
