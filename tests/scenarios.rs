//! End-to-end scenarios driven through the public API: assemble text, run
//! it to completion, inspect the resulting machine state (`spec.md` §8).

use stagedvm::assembler::assemble;
use stagedvm::bus::Bus;
use stagedvm::cpu::Cpu;
use stagedvm::devices::StdoutDevice;
use stagedvm::isa::RETURN_ADDRESS_REGISTER;
use stagedvm::memory::Ram;

fn run_source(source: &str) -> Cpu {
    let image = assemble(source).expect("program should assemble");
    let mut cpu = Cpu::new(&image).expect("image should fit in memory");
    cpu.run().expect("program should run to completion");
    cpu
}

#[test]
fn add_with_immediates_produces_the_expected_sum() {
    let cpu = run_source("ADDI r1, r0, 5\nADDI r2, r0, 7\nADD r3, r1, r2\nNO_OP\n");
    assert_eq!(cpu.registers.read(3).unwrap(), 12);
}

#[test]
fn unconditional_self_branch_never_halts() {
    let image = assemble("loop: BEQ r0, r0, loop\n").unwrap();
    let mut cpu = Cpu::new(&image).unwrap();
    for _ in 0..50 {
        cpu.tick().unwrap();
    }
    assert!(!cpu.is_stopped());
    assert_eq!(cpu.pc.get(), 0);
}

#[test]
fn false_predicate_branch_falls_through_to_the_next_instruction() {
    let cpu = run_source("ADDI r1, r0, 1\nBEQ r0, r1, away\nADDI r2, r0, 99\nNO_OP\naway: NO_OP\n");
    assert_eq!(cpu.registers.read(2).unwrap(), 99);
    assert_eq!(cpu.pc.get(), 3);
}

#[test]
fn store_then_load_round_trips_through_ram() {
    let cpu = run_source(
        "ADDI r1, r0, 1234\n\
         ADDI r2, r0, 0\n\
         SW r1, 5, r2\n\
         LW r3, 5, r2\n\
         NO_OP\n",
    );
    assert_eq!(cpu.registers.read(3).unwrap(), 1234);
}

#[test]
fn jal_saves_a_return_address_and_skips_the_delay_instruction() {
    let cpu = run_source("JAL past\nADDI r1, r0, 999\npast: ADDI r2, r0, 1\nNO_OP\n");
    assert_eq!(cpu.registers.read(RETURN_ADDRESS_REGISTER).unwrap(), 1);
    assert_eq!(cpu.registers.read(1).unwrap(), 0);
    assert_eq!(cpu.registers.read(2).unwrap(), 1);
}

#[test]
fn writing_the_pc_register_diverts_execution() {
    let cpu = run_source("ADDI r29, r0, 3\nNO_OP\nNO_OP\nNO_OP\n");
    assert_eq!(cpu.pc.get(), 3);
}

#[test]
fn factorial_of_five_via_recursive_jal() {
    let source = "\
        .text
        ADDI r30, r0, 50
        ADDI r1, r0, 5

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
    ";
    let cpu = run_source(source);
    assert_eq!(cpu.registers.read(2).unwrap(), 120);
}

#[test]
fn hello_world_streams_characters_to_the_stdout_device() {
    let source = "\
        .data
        message: 72 105 10

        .text
        ADDI r1, r0, 10
        ADDI r2, r0, message
        ADDI r4, r0, 1000
        ADDI r4, r4, 1000

        loop: LW r3, 0, r2
        BEQ r1, r3, end
        SW r3, 0, r4
        ADDI r2, r2, 1
        BEQ r0, r0, loop

        end: SW r3, 1, r4
        NO_OP
    ";
    let image = assemble(source).unwrap();
    let ram = Ram::load(image.len(), &image).unwrap();
    let mut cpu = Cpu::with_bus(Bus::with_stdout(ram, StdoutDevice::with_writer(Vec::new())));
    cpu.run().unwrap();
    assert_eq!(cpu.bus.stdout.writer(), b"Hi");
}
