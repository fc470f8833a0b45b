//! Signal logic over indicator frames.
//!
//! - `filter`: the composite buy filter evaluated on the most recent rows
//! - `crossover`: oversold stochastic crossover detection
//! - `confirmation`: forward search for an EMA confirmation after each crossover
//! - `outcome`: forward search for a target gain after each reference date
//!
//! Everything here works on one instrument's rows or bars at a time and
//! never mutates its inputs. Undefined indicator values make every
//! comparison false.

pub mod confirmation;
pub mod crossover;
pub mod filter;
pub mod outcome;

pub use confirmation::{ConfirmationEvent, ConfirmationTracker};
pub use crossover::{CrossoverDetector, CrossoverEvent, CrossoverKind};
pub use filter::{filter_instruments, FilterOutcome, SignalFilter, SignalRecord};
pub use outcome::{successful_dates, Outcome, OutcomeTracker};
