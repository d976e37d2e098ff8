//! Crate-wide error taxonomy (see `spec.md` §7).
//!
//! Individual subsystems define their own narrow error enum (so that
//! callers can match on exactly the failures they can cause); this module
//! collects them into one type for callers, such as the `cpu`, that can
//! fail for more than one reason.

use thiserror::Error;

use crate::alu::AluError;
use crate::bus::BusError;
use crate::decode::DecodeError;
use crate::register_file::RegisterError;

/// A fatal simulator error.
///
/// The simulator has no exception-handler frames within the guest program
/// (`spec.md` §7): any of these is surfaced to the driver and ends the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Alu(#[from] AluError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error(transparent)]
    Register(#[from] RegisterError),
}
