//! Module interfaces
//!
//! Each stateful navigation module that is stepped by the control loop
//! implements the [`State`] trait, giving every module the same
//! initialise-then-process lifecycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The module's internal state.
pub trait State {
    /// Data required during initialisation, usually parameter file paths.
    type InitData;
    /// An error which can occur during initialisation.
    type InitError;

    /// Data required for each control tick.
    type InputData;
    /// Data produced by each control tick.
    type OutputData;
    /// A report on the status of the tick.
    type StatusReport;
    /// An error which can occur during a tick.
    type ProcError;

    /// Initialise the module, replacing any configuration it already holds.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Main module processing function, called once per control tick.
    ///
    /// # Outputs
    /// - On success a tuple of the output data and status report.
    /// - On error a `ProcError` instance.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
