//! Enums for the raw fields of DBN records and for subscription parameters.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Which side of the market a record refers to: the side a resting order
/// sits on, or the side the aggressor of a trade took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Side {
    /// A resting sell order, or the selling aggressor of a trade.
    Ask = b'A',
    /// A resting buy order, or the buying aggressor of a trade.
    Bid = b'B',
    /// The source didn't specify a side.
    #[default]
    None = b'N',
}

impl From<Side> for char {
    fn from(side: Side) -> Self {
        u8::from(side) as char
    }
}

/// What a book event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Action {
    /// The price and/or size of a resting order changed.
    Modify = b'M',
    /// An aggressor traded; the book itself is untouched.
    Trade = b'T',
    /// A resting order was filled; the book itself is untouched.
    Fill = b'F',
    /// A resting order was cancelled, in part or in full.
    Cancel = b'C',
    /// A new resting order entered the book.
    Add = b'A',
    /// Every resting order for the instrument was cleared.
    Clear = b'R',
    /// Nothing changed; the record carries flags or metadata only.
    #[default]
    None = b'N',
}

impl From<Action> for char {
    fn from(action: Action) -> Self {
        u8::from(action) as char
    }
}

/// What kind of instrument a definition describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum InstrumentClass {
    /// A bond.
    Bond = b'B',
    /// A call option.
    Call = b'C',
    /// A future.
    Future = b'F',
    /// A stock.
    Stock = b'K',
    /// A spread whose legs span more than one instrument class.
    MixedSpread = b'M',
    /// A put option.
    Put = b'P',
    /// A spread with future legs.
    FutureSpread = b'S',
    /// A spread with option legs.
    OptionSpread = b'T',
    /// A foreign exchange spot.
    FxSpot = b'X',
}

impl From<InstrumentClass> for char {
    fn from(class: InstrumentClass) -> Self {
        u8::from(class) as char
    }
}

impl InstrumentClass {
    /// Whether this class is an option or option spread. `MixedSpread` is
    /// left out even though its legs may include options.
    pub fn is_option(&self) -> bool {
        matches!(self, Self::Call | Self::Put | Self::OptionSpread)
    }

    /// Whether this class is a future or future spread. `MixedSpread` is
    /// left out even though its legs may include futures.
    pub fn is_future(&self) -> bool {
        matches!(self, Self::Future | Self::FutureSpread)
    }
}

/// How the venue matches orders for an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MatchAlgorithm {
    /// The venue didn't specify an algorithm.
    #[default]
    Undefined = b' ',
    /// Strict price-time priority.
    Fifo = b'F',
    /// A venue-configurable algorithm.
    Configurable = b'K',
    /// Trade quantity split across resting orders by their share of the
    /// total resting quantity.
    ProRata = b'C',
    /// FIFO, preceded by lead-market-maker allocations.
    FifoLmm = b'T',
    /// Pro rata, with a configurable slice for the first order that
    /// improved the market.
    ThresholdProRata = b'O',
    /// FIFO with LMM allocations, plus a configurable slice for the first
    /// order that improved the market.
    FifoTopLmm = b'S',
    /// Threshold pro rata with an extra priority tier for LMMs.
    ThresholdProRataLmm = b'Q',
    /// The CME Eurodollar-futures special case.
    EurodollarFutures = b'Y',
    /// Quantity shared among orders at the best price, weighted toward
    /// higher time priority.
    TimeProRata = b'P',
}

impl From<MatchAlgorithm> for char {
    fn from(algo: MatchAlgorithm) -> Self {
        u8::from(algo) as char
    }
}

/// What an instrument definition does to the instrument it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SecurityUpdateAction {
    /// The definition introduces the instrument.
    Add = b'A',
    /// The definition changes an instrument defined earlier.
    Modify = b'M',
    /// The definition retires the instrument.
    Delete = b'D',
}

impl From<SecurityUpdateAction> for char {
    fn from(action: SecurityUpdateAction) -> Self {
        u8::from(action) as char
    }
}

/// Marks instruments defined by users rather than listed by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum UserDefinedInstrument {
    /// Listed by the venue.
    #[default]
    No = b'N',
    /// Defined by a user.
    Yes = b'Y',
}

impl From<UserDefinedInstrument> for char {
    fn from(user_defined_instrument: UserDefinedInstrument) -> Self {
        u8::from(user_defined_instrument) as char
    }
}

/// A scheme for naming instruments in a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum SType {
    /// The gateway's numeric instrument handles.
    InstrumentId = 0,
    /// The symbols the publisher itself uses.
    RawSymbol = 1,
    /// One symbol that follows an instrument over time, e.g. whatever the
    /// front-month future currently is.
    Continuous = 3,
    /// One symbol standing for a whole family of instruments, e.g. `ES.FUT`
    /// for every ES future, or an equity root for all its options.
    Parent = 4,
    /// US equity symbols in NASDAQ Integrated suffix form.
    NasdaqSymbol = 5,
    /// US equity symbols in CMS suffix form.
    CmsSymbol = 6,
}

impl FromStr for SType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instrument_id" | "product_id" => Ok(SType::InstrumentId),
            "raw_symbol" | "native" => Ok(SType::RawSymbol),
            "continuous" => Ok(SType::Continuous),
            "parent" => Ok(SType::Parent),
            "nasdaq_symbol" | "nasdaq" => Ok(SType::NasdaqSymbol),
            "cms_symbol" | "cms" => Ok(SType::CmsSymbol),
            _ => Err(crate::Error::conversion::<Self>(s.to_owned())),
        }
    }
}

impl AsRef<str> for SType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl SType {
    /// The name this symbology goes by on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SType::InstrumentId => "instrument_id",
            SType::RawSymbol => "raw_symbol",
            SType::Continuous => "continuous",
            SType::Parent => "parent",
            SType::NasdaqSymbol => "nasdaq_symbol",
            SType::CmsSymbol => "cms_symbol",
        }
    }
}

impl Display for SType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub use rtype::RType;

/// Record types, possible values for [`RecordHeader::rtype`][crate::RecordHeader::rtype].
pub mod rtype {
    use num_enum::TryFromPrimitive;

    /// The record type discriminant as an enum, for exhaustive matching on
    /// streams that mix record types. Each struct implementing
    /// [`HasRType`](crate::record::HasRType) answers for the raw values it
    /// decodes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
    #[repr(u8)]
    pub enum RType {
        /// Trades: market by price with no book depth.
        Mbp0 = 0,
        /// Market by price, book depth 1.
        Mbp1 = 0x01,
        /// Market by price, book depth 10.
        Mbp10 = 0x0A,
        /// Exchange trading status.
        Status = 0x12,
        /// Instrument definition.
        InstrumentDef = 0x13,
        /// Auction order imbalance.
        Imbalance = 0x14,
        /// An error the gateway raised for this session.
        Error = 0x15,
        /// A symbology mapping for one subscribed symbol.
        SymbolMapping = 0x16,
        /// A gateway notification, heartbeats included.
        System = 0x17,
        /// Venue-published statistics.
        Statistics = 0x18,
        /// OHLCV bars aggregated per second.
        Ohlcv1S = 0x20,
        /// OHLCV bars aggregated per minute.
        Ohlcv1M = 0x21,
        /// OHLCV bars aggregated per hour.
        Ohlcv1H = 0x22,
        /// OHLCV bars aggregated per UTC day.
        Ohlcv1D = 0x23,
        /// Market by order.
        Mbo = 0xA0,
        /// Consolidated market by price, book depth 1.
        Cmbp1 = 0xB1,
        /// Consolidated BBO sampled every second.
        Cbbo1S = 0xC0,
        /// Consolidated BBO sampled every minute.
        Cbbo1M = 0xC1,
        /// Trades paired with the consolidated BBO from just before each
        /// trade.
        Tcbbo = 0xC2,
        /// BBO sampled every second.
        Bbo1S = 0xC3,
        /// BBO sampled every minute.
        Bbo1M = 0xC4,
    }

    /// Trades: market by price with no book depth.
    pub const MBP_0: u8 = RType::Mbp0 as u8;
    /// Market by price, book depth 1.
    pub const MBP_1: u8 = RType::Mbp1 as u8;
    /// Market by price, book depth 10.
    pub const MBP_10: u8 = RType::Mbp10 as u8;
    /// Exchange trading status.
    pub const STATUS: u8 = RType::Status as u8;
    /// Instrument definition.
    pub const INSTRUMENT_DEF: u8 = RType::InstrumentDef as u8;
    /// Auction order imbalance.
    pub const IMBALANCE: u8 = RType::Imbalance as u8;
    /// An error the gateway raised for this session.
    pub const ERROR: u8 = RType::Error as u8;
    /// A symbology mapping for one subscribed symbol.
    pub const SYMBOL_MAPPING: u8 = RType::SymbolMapping as u8;
    /// A gateway notification, heartbeats included.
    pub const SYSTEM: u8 = RType::System as u8;
    /// Venue-published statistics.
    pub const STATISTICS: u8 = RType::Statistics as u8;
    /// OHLCV bars aggregated per second.
    pub const OHLCV_1S: u8 = RType::Ohlcv1S as u8;
    /// OHLCV bars aggregated per minute.
    pub const OHLCV_1M: u8 = RType::Ohlcv1M as u8;
    /// OHLCV bars aggregated per hour.
    pub const OHLCV_1H: u8 = RType::Ohlcv1H as u8;
    /// OHLCV bars aggregated per UTC day.
    pub const OHLCV_1D: u8 = RType::Ohlcv1D as u8;
    /// Market by order.
    pub const MBO: u8 = RType::Mbo as u8;
    /// Consolidated market by price, book depth 1.
    pub const CMBP_1: u8 = RType::Cmbp1 as u8;
    /// Consolidated BBO sampled every second.
    pub const CBBO_1S: u8 = RType::Cbbo1S as u8;
    /// Consolidated BBO sampled every minute.
    pub const CBBO_1M: u8 = RType::Cbbo1M as u8;
    /// Trades paired with the consolidated BBO from just before each trade.
    pub const TCBBO: u8 = RType::Tcbbo as u8;
    /// BBO sampled every second.
    pub const BBO_1S: u8 = RType::Bbo1S as u8;
    /// BBO sampled every minute.
    pub const BBO_1M: u8 = RType::Bbo1M as u8;
}

/// A subscribable record schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u16)]
pub enum Schema {
    /// Market by order.
    Mbo = 0,
    /// Market by price, book depth 1.
    Mbp1 = 1,
    /// Market by price, book depth 10.
    Mbp10 = 2,
    /// Every trade, paired with the BBO as it stood just before the trade
    /// took effect.
    Tbbo = 3,
    /// Every trade.
    Trades = 4,
    /// OHLCV bars aggregated per second.
    Ohlcv1S = 5,
    /// OHLCV bars aggregated per minute.
    Ohlcv1M = 6,
    /// OHLCV bars aggregated per hour.
    Ohlcv1H = 7,
    /// OHLCV bars aggregated per UTC day.
    Ohlcv1D = 8,
    /// Instrument definitions.
    Definition = 9,
    /// Venue-published statistics.
    Statistics = 10,
    /// Trading status transitions.
    Status = 11,
    /// Auction order imbalances.
    Imbalance = 12,
    /// Consolidated market by price, book depth 1.
    Cmbp1 = 14,
    /// Consolidated BBO sampled every second, plus trades.
    Cbbo1S = 15,
    /// Consolidated BBO sampled every minute, plus trades.
    Cbbo1M = 16,
    /// Every trade, paired with the consolidated BBO from just before the
    /// trade took effect.
    Tcbbo = 17,
    /// BBO sampled every second, plus trades.
    Bbo1S = 18,
    /// BBO sampled every minute, plus trades.
    Bbo1M = 19,
}

impl FromStr for Schema {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mbo" => Ok(Schema::Mbo),
            "mbp-1" => Ok(Schema::Mbp1),
            "mbp-10" => Ok(Schema::Mbp10),
            "tbbo" => Ok(Schema::Tbbo),
            "trades" => Ok(Schema::Trades),
            "ohlcv-1s" => Ok(Schema::Ohlcv1S),
            "ohlcv-1m" => Ok(Schema::Ohlcv1M),
            "ohlcv-1h" => Ok(Schema::Ohlcv1H),
            "ohlcv-1d" => Ok(Schema::Ohlcv1D),
            "definition" => Ok(Schema::Definition),
            "statistics" => Ok(Schema::Statistics),
            "status" => Ok(Schema::Status),
            "imbalance" => Ok(Schema::Imbalance),
            "cmbp-1" => Ok(Schema::Cmbp1),
            "cbbo-1s" => Ok(Schema::Cbbo1S),
            "cbbo-1m" => Ok(Schema::Cbbo1M),
            "tcbbo" => Ok(Schema::Tcbbo),
            "bbo-1s" => Ok(Schema::Bbo1S),
            "bbo-1m" => Ok(Schema::Bbo1M),
            _ => Err(crate::Error::conversion::<Self>(s.to_owned())),
        }
    }
}

impl AsRef<str> for Schema {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Schema {
    /// The name this schema goes by on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Schema::Mbo => "mbo",
            Schema::Mbp1 => "mbp-1",
            Schema::Mbp10 => "mbp-10",
            Schema::Tbbo => "tbbo",
            Schema::Trades => "trades",
            Schema::Ohlcv1S => "ohlcv-1s",
            Schema::Ohlcv1M => "ohlcv-1m",
            Schema::Ohlcv1H => "ohlcv-1h",
            Schema::Ohlcv1D => "ohlcv-1d",
            Schema::Definition => "definition",
            Schema::Statistics => "statistics",
            Schema::Status => "status",
            Schema::Imbalance => "imbalance",
            Schema::Cmbp1 => "cmbp-1",
            Schema::Cbbo1S => "cbbo-1s",
            Schema::Cbbo1M => "cbbo-1m",
            Schema::Tcbbo => "tcbbo",
            Schema::Bbo1S => "bbo-1s",
            Schema::Bbo1M => "bbo-1m",
        }
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Schema::Definition, "definition")]
    #[case(Schema::Cmbp1, "cmbp-1")]
    #[case(Schema::Bbo1S, "bbo-1s")]
    #[case(Schema::Cbbo1M, "cbbo-1m")]
    fn schema_str_round_trip(#[case] schema: Schema, #[case] s: &str) {
        assert_eq!(schema.as_str(), s);
        assert_eq!(Schema::from_str(s).unwrap(), schema);
    }

    #[rstest]
    #[case(SType::Parent, "parent")]
    #[case(SType::RawSymbol, "raw_symbol")]
    fn stype_str_round_trip(#[case] stype: SType, #[case] s: &str) {
        assert_eq!(stype.as_str(), s);
        assert_eq!(SType::from_str(s).unwrap(), stype);
    }

    #[test]
    fn rtype_from_primitive() {
        assert_eq!(RType::try_from(0x16).unwrap(), RType::SymbolMapping);
        assert_eq!(RType::try_from(0xB1).unwrap(), RType::Cmbp1);
        assert!(RType::try_from(0xE0).is_err());
    }
}
