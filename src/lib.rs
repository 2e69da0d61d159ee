//! A client for the Databento live subscription gateway (LSG). Performs the
//! CRAM handshake, subscribes to one or more data streams, and decodes the
//! resulting stream of [DBN](https://databento.com/docs/standards-and-conventions)
//! records into typed callbacks.
//!
//! The building blocks, from the bottom up:
//! - [`record`] and [`RecordRef`]: the wire record types and a non-owning
//!   polymorphic view over them.
//! - [`osi::OsiSymbol`]: the fixed-width OCC (OSI) option contract symbol.
//! - [`live::Session`]: one authenticated TCP session with an io_uring
//!   double-buffered receive loop. Linux only.
//! - [`live::MultiClient`]: several parallel sessions, each driven by a
//!   worker thread.
//! - [`discover::OpraDiscovery`]: an OPRA definition-replay consumer that
//!   builds a sorted table of option roots cross-referenced to their
//!   security definitions.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::missing_errors_doc)]

pub mod discover;
pub mod enums;
pub mod error;
pub mod live;
#[doc(hidden)]
pub mod macros;
pub mod osi;
pub mod record;
pub mod record_ref;

pub use crate::{
    enums::{
        rtype::{self, RType},
        Action, InstrumentClass, MatchAlgorithm, SType, Schema, SecurityUpdateAction, Side,
        UserDefinedInstrument,
    },
    error::{Error, Result},
    osi::OsiSymbol,
    record::{
        BboMsg, Cmbp1Msg, ErrorMsg, HasRType, InstrumentDefMsg, Record, RecordHeader, RecordMut,
        SymbolMappingMsg, SystemMsg,
    },
    record_ref::RecordRef,
};

/// The version of the DBN encoding this client speaks. The stream preamble
/// must carry exactly this version.
pub const DBN_VERSION: u8 = 1;

pub(crate) const SYMBOL_CSTR_LEN: usize = 22;
pub(crate) const SYSTEM_MSG_CSTR_LEN: usize = 64;

/// The denominator of fixed prices in DBN.
pub const FIXED_PRICE_SCALE: i64 = 1_000_000_000;
/// The sentinel value for an unset or null price.
pub const UNDEF_PRICE: i64 = i64::MAX;
/// The sentinel value for an unset or null order quantity.
pub const UNDEF_ORDER_SIZE: u32 = u32::MAX;
/// The sentinel value for an unset or null timestamp.
pub const UNDEF_TIMESTAMP: u64 = u64::MAX;

/// Contains dataset code constants.
pub mod datasets {
    /// The dataset code for OPRA Pillar, the consolidated US options tape.
    pub const OPRA_PILLAR: &str = "OPRA.PILLAR";
    /// The dataset code for CME Globex MDP 3.0.
    pub const GLBX_MDP3: &str = "GLBX.MDP3";
    /// The dataset code for Nasdaq TotalView ITCH.
    pub const XNAS_ITCH: &str = "XNAS.ITCH";
}
