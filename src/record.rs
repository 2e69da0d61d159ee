//! Market data record types for the DBN stream and conversion functions.
//!
//! Unlike aligned file encodings, the live gateway's record layouts place
//! multi-byte fields at odd offsets, so every struct here is packed. All
//! structs are plain old data and `Copy`; numeric fields are read by value
//! and only align-1 fields (the header and `c_char` arrays) are borrowed.
//!
//! Prices are fixed-point throughout: one unit is 1e-9 of the instrument's
//! currency, i.e. the denominator is
//! [`FIXED_PRICE_SCALE`](crate::FIXED_PRICE_SCALE). Timestamps count
//! nanoseconds since the UNIX epoch. Every `ts_out` field is garbage unless
//! `ts_out` stamping was negotiated when the session authenticated.

mod conv;
mod impl_default;
#[cfg(test)]
mod layout_tests;
mod methods;
#[cfg(test)]
mod record_methods_tests;
mod traits;

use std::os::raw::c_char;

use crate::{enums::rtype, macros::impl_record, SYMBOL_CSTR_LEN, SYSTEM_MSG_CSTR_LEN};
pub(crate) use conv::as_u8_slice;
pub use conv::{
    c_chars_to_str, str_to_c_chars, transmute_header_bytes, transmute_record_bytes, ts_to_dt,
};
pub use traits::{HasRType, Record, RecordMut};

/// The 16 bytes every record starts with. The first byte fixes the record's
/// total size, the second selects which struct the rest of the bytes are.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    /// Total record size in 4-byte units, header included. A value below 4
    /// can't even hold this header and is rejected as a framing error.
    pub(crate) length: u8,
    /// Discriminant byte selecting the record struct; the known values live
    /// in [`rtype`], and [`HasRType::has_rtype`] checks whether a given
    /// struct decodes a given value. Types this crate has no struct for
    /// still flow through as raw [`RecordRef`](crate::RecordRef)s.
    pub rtype: u8,
    /// Which dataset and venue produced the record.
    pub publisher_id: u16,
    /// The gateway's numeric handle for the instrument. Handles are recycled
    /// across trading days, so never persist them.
    pub instrument_id: u32,
    /// When the event happened at the matching engine, in nanoseconds since
    /// the UNIX epoch.
    pub ts_event: u64,
}

/// Ties a subscribed symbol to the symbol the gateway resolved it to. On an
/// OPRA definition stream the resolved side is an OSI option contract.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolMappingMsg {
    /// The leading header.
    pub hd: RecordHeader,
    /// The symbol as it appeared in the subscription request, in the input
    /// symbology.
    pub stype_in_symbol: [c_char; SYMBOL_CSTR_LEN],
    /// What that symbol resolved to in the output symbology.
    pub stype_out_symbol: [c_char; SYMBOL_CSTR_LEN],
    #[doc(hidden)]
    pub _reserved: [u8; 4],
    /// From when the mapping holds, in nanoseconds since the UNIX epoch.
    pub start_ts: u64,
    /// Until when the mapping holds, in nanoseconds since the UNIX epoch.
    pub end_ts: u64,
    /// When the gateway sent the record, if `ts_out` stamping was
    /// negotiated.
    pub ts_out: u64,
}

/// Everything the venue publishes about one instrument; the record of the
/// [`Definition`](crate::enums::Schema::Definition) schema. Most of the
/// roughly one hundred fixed fields are carried so callers can read them
/// back out of the discovery index; the session itself only keys on the
/// header.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstrumentDefMsg {
    /// The leading header.
    pub hd: RecordHeader,
    /// When the capture server received the record, in nanoseconds since
    /// the UNIX epoch.
    pub ts_recv: u64,
    /// The instrument's tick size, as a fixed price.
    pub min_price_increment: i64,
    /// Factor that turns the venue's display price into the conventional
    /// price.
    pub display_factor: i64,
    /// The last moment the instrument can trade, in nanoseconds since the
    /// UNIX epoch.
    pub expiration: u64,
    /// When the instrument becomes tradable, in nanoseconds since the UNIX
    /// epoch.
    pub activation: u64,
    /// Upper price band for the trading day, as a fixed price.
    pub high_limit_price: i64,
    /// Lower price band for the trading day, as a fixed price.
    pub low_limit_price: i64,
    /// Width used for price banding, as a fixed price.
    pub max_price_variation: i64,
    /// Settlement price of the session dated by `trading_reference_date`.
    pub trading_reference_price: i64,
    /// How much of `unit_of_measure` one contract covers.
    pub unit_of_measure_qty: i64,
    /// Cash value of a single tick, as a fixed price.
    pub min_price_increment_amount: i64,
    /// Ratio applied when pricing the legs of a spread.
    pub price_ratio: i64,
    /// Bitmap of venue eligibility attributes.
    pub inst_attrib_value: i32,
    /// Instrument handle of the primary underlying, if any.
    pub underlying_id: u32,
    /// The publisher's own numeric handle for the instrument, which may
    /// coincide with the header's.
    pub raw_instrument_id: u32,
    /// Book depth of the implied price feed.
    pub market_depth_implied: i32,
    /// Book depth of the outright price feed.
    pub market_depth: i32,
    /// Venue market segment the instrument trades in.
    pub market_segment_id: u32,
    /// Largest order quantity the venue accepts.
    pub max_trade_vol: u32,
    /// Smallest order quantity the venue accepts.
    pub min_lot_size: i32,
    /// Quantity floor for block trades.
    pub min_lot_size_block: i32,
    /// Round lot size; bigger round lots come in multiples of it.
    pub min_lot_size_round_lot: i32,
    /// Smallest tradable volume.
    pub min_trade_vol: u32,
    #[doc(hidden)]
    pub _reserved2: [u8; 4],
    /// Number of deliverables backing one contract, i.e. its face value.
    pub contract_multiplier: i32,
    /// Quantity the contract sheds per day once `decay_start_date` passes.
    pub decay_quantity: i32,
    /// The contract's fixed value as originally listed.
    pub original_contract_size: i32,
    #[doc(hidden)]
    pub _reserved3: [u8; 4],
    /// Session date that `trading_reference_price` settles, in days since
    /// the UNIX epoch.
    pub trading_reference_date: u16,
    /// The venue's application/channel identifier.
    pub appl_id: i16,
    /// Contract year as written in the symbol.
    pub maturity_year: u16,
    /// Date decay starts applying to the contract.
    pub decay_start_date: u16,
    /// Feed channel the record arrived on, as numbered by the gateway.
    pub channel_id: u16,
    /// Currency the price fields are denominated in.
    pub currency: [c_char; 4],
    /// Settlement currency, when it isn't `currency`.
    pub settl_currency: [c_char; 4],
    /// Strategy code for spread instruments.
    pub secsubtype: [c_char; 6],
    /// The symbol under which the publisher lists the instrument.
    pub raw_symbol: [c_char; SYMBOL_CSTR_LEN],
    /// Security group the instrument belongs to.
    pub group: [c_char; 21],
    /// Code of the listing exchange.
    pub exchange: [c_char; 5],
    /// Product code of the underlying asset.
    pub asset: [c_char; 7],
    /// ISO 10962 classification code.
    pub cfi: [c_char; 7],
    /// Venue security type, e.g. `OPT`.
    pub security_type: [c_char; 7],
    /// Unit that `unit_of_measure_qty` is counted in, e.g. `USD` or `LBS`.
    pub unit_of_measure: [c_char; 31],
    /// Symbol of the primary underlying.
    pub underlying: [c_char; 21],
    /// Currency `strike_price` is denominated in.
    pub strike_price_currency: [c_char; 4],
    /// Raw instrument classification, carried widened to 32 bits; decode
    /// with [`instrument_class()`](Self::instrument_class).
    pub instrument_class: u32,
    #[doc(hidden)]
    pub _reserved4: [u8; 2],
    /// Strike of the option, as a fixed price.
    pub strike_price: i64,
    #[doc(hidden)]
    pub _reserved5: [u8; 6],
    /// Raw venue matching algorithm, carried widened to 32 bits; decode
    /// with [`match_algorithm()`](Self::match_algorithm).
    pub match_algorithm: u32,
    /// Raw trading status code of the instrument.
    pub md_security_trading_status: u8,
    /// Denominator of the main fraction, for venues that display fractional
    /// prices.
    pub main_fraction: u8,
    /// How many digits the venue displays right of the tick mark.
    pub price_display_format: u8,
    /// Bitmap qualifying the settlement price.
    pub settl_price_type: u8,
    /// Denominator of the sub fraction, for fractional price display.
    pub sub_fraction: u8,
    /// Product complex the instrument belongs to.
    pub underlying_product: u8,
    /// Whether this definition adds, modifies, or deletes the instrument,
    /// carried widened to 32 bits; decode with
    /// [`security_update_action()`](Self::security_update_action).
    pub security_update_action: u32,
    /// Contract month as written in the symbol.
    pub maturity_month: u8,
    /// Contract day as written in the symbol, or 0 when absent.
    pub maturity_day: u8,
    /// Contract week as written in the symbol, or 0 when absent.
    pub maturity_week: u8,
    /// Whether a user defined the instrument, carried widened to 32 bits;
    /// decode with
    /// [`user_defined_instrument()`](Self::user_defined_instrument).
    pub user_defined_instrument: u32,
    /// Unit that `contract_multiplier` counts: `1` for hours, `2` for days.
    pub contract_multiplier_unit: i8,
    /// Delivery schedule code, for electricity products.
    pub flow_schedule_type: i8,
    /// Tick rule applied to the spread.
    pub tick_rule: u8,
    #[doc(hidden)]
    pub _reserved6: [u8; 3],
    /// When the gateway sent the record, if `ts_out` stamping was
    /// negotiated.
    pub ts_out: u64,
}

/// The top of one order book: best bid and best ask with their depth.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BidAskPair {
    /// Best bid, as a fixed price.
    pub bid_px: i64,
    /// Best ask, as a fixed price.
    pub ask_px: i64,
    /// Quantity resting at the best bid.
    pub bid_sz: u32,
    /// Quantity resting at the best ask.
    pub ask_sz: u32,
    /// How many orders make up the best bid.
    pub bid_ct: u32,
    /// How many orders make up the best ask.
    pub ask_ct: u32,
}

/// The top of the consolidated book: best bid and best ask across venues,
/// each tagged with the venue that holds it.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsolidatedBidAskPair {
    /// Best bid across venues, as a fixed price.
    pub bid_px: i64,
    /// Best ask across venues, as a fixed price.
    pub ask_px: i64,
    /// Quantity resting at the best bid.
    pub bid_sz: u32,
    /// Quantity resting at the best ask.
    pub ask_sz: u32,
    /// Publisher of the venue holding the best bid.
    pub bid_pb: u16,
    #[doc(hidden)]
    pub _reserved1: [u8; 2],
    /// Publisher of the venue holding the best ask.
    pub ask_pb: u16,
    #[doc(hidden)]
    pub _reserved2: [u8; 2],
}

/// A consolidated top-of-book event: one book action together with the
/// resulting cross-venue best bid and offer. The record of the
/// [`Cmbp1`](crate::enums::Schema::Cmbp1) schema.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cmbp1Msg {
    /// The leading header.
    pub hd: RecordHeader,
    /// Price of the event, as a fixed price.
    pub price: i64,
    /// Quantity of the event.
    pub size: u32,
    /// Raw book action byte (add, cancel, modify, clear, trade); decode
    /// with [`action()`](Self::action).
    pub action: c_char,
    /// Raw side byte of the order or aggressor; decode with
    /// [`side()`](Self::side).
    pub side: c_char,
    /// Packet-end and quality flag bits.
    pub flags: u8,
    #[doc(hidden)]
    pub _reserved1: [u8; 1],
    /// When the capture server received the record, in nanoseconds since
    /// the UNIX epoch.
    pub ts_recv: u64,
    /// `ts_recv` minus the exchange's sending time, capped at two seconds.
    pub ts_in_delta: i32,
    #[doc(hidden)]
    pub _reserved2: [u8; 4],
    /// The consolidated best bid and offer after the event.
    pub levels: [ConsolidatedBidAskPair; 1],
    /// When the gateway sent the record, if `ts_out` stamping was
    /// negotiated.
    pub ts_out: u64,
}

/// A best bid and offer snapshot taken on a fixed sampling interval, with
/// the interval's last trade. One struct serves the
/// [`Bbo1S`](crate::enums::Schema::Bbo1S),
/// [`Bbo1M`](crate::enums::Schema::Bbo1M),
/// [`Cbbo1S`](crate::enums::Schema::Cbbo1S), and
/// [`Cbbo1M`](crate::enums::Schema::Cbbo1M) schemas.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BboMsg {
    /// The leading header.
    pub hd: RecordHeader,
    /// Price of the last trade in the interval, as a fixed price.
    pub price: i64,
    /// Quantity of the last trade in the interval.
    pub size: u32,
    #[doc(hidden)]
    pub _reserved1: [u8; 1],
    /// Raw side byte of whoever initiated that trade; decode with
    /// [`side()`](Self::side).
    pub side: c_char,
    /// Packet-end and quality flag bits.
    pub flags: u8,
    #[doc(hidden)]
    pub _reserved2: [u8; 1],
    /// End of the sampling interval, clamped to its second or minute
    /// boundary, in nanoseconds since the UNIX epoch.
    pub ts_recv: u64,
    #[doc(hidden)]
    pub _reserved3: [u8; 4],
    /// Venue sequence number of the last update inside the interval.
    pub sequence: u32,
    /// The best bid and offer as of the sample.
    pub levels: [BidAskPair; 1],
    /// When the gateway sent the record, if `ts_out` stamping was
    /// negotiated.
    pub ts_out: u64,
}

/// Something went wrong with this session, in the gateway's words. The
/// stream keeps flowing; the text says what to fix.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorMsg {
    /// The leading header.
    pub hd: RecordHeader,
    /// NUL-terminated ASCII text describing what went wrong.
    pub err: [c_char; SYSTEM_MSG_CSTR_LEN],
    /// When the gateway sent the record, if `ts_out` stamping was
    /// negotiated.
    pub ts_out: u64,
}

/// A non-error notification from the gateway. Heartbeats and end-of-replay
/// markers arrive this way.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemMsg {
    /// The leading header.
    pub hd: RecordHeader,
    /// NUL-terminated ASCII text of the notification; heartbeats start with
    /// `Heartbeat`.
    pub msg: [c_char; SYSTEM_MSG_CSTR_LEN],
    /// When the gateway sent the record, if `ts_out` stamping was
    /// negotiated.
    pub ts_out: u64,
}

impl_record!(SymbolMappingMsg, rtype::SYMBOL_MAPPING);
impl_record!(InstrumentDefMsg, rtype::INSTRUMENT_DEF);
impl_record!(Cmbp1Msg, rtype::CMBP_1, rtype::TCBBO);
impl_record!(
    BboMsg,
    rtype::BBO_1S,
    rtype::BBO_1M,
    rtype::CBBO_1S,
    rtype::CBBO_1M
);
impl_record!(ErrorMsg, rtype::ERROR);
impl_record!(SystemMsg, rtype::SYSTEM);
