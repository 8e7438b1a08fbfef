//! Execution core for the ForwardCom instruction set architecture.
//!
//! The crate implements the instruction handlers for ForwardCom's
//! single-format instructions (formats 1.0, 1.1, 1.2, 1.8 and 2.9):
//! scalar bit manipulation, wide-immediate composition, vector reshaping,
//! extended-precision arithmetic chains, saturating and overflow-checked
//! arithmetic, and floating-point categorization. The instruction decoder,
//! memory system and interrupt delivery live in the surrounding emulator;
//! their interface to the core is the [`cpu::Thread`] execution context and
//! the dispatch tables in [`cpu::dispatch`].

pub mod cpu;
