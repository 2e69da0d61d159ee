use std::mem;

use crate::{
    enums::{
        rtype, Action, InstrumentClass, MatchAlgorithm, RType, SecurityUpdateAction, Side,
        UserDefinedInstrument,
    },
    error::Error,
    record::{c_chars_to_str, str_to_c_chars, ts_to_dt},
};

use super::*;

impl RecordHeader {
    /// How many bytes one unit of the `length` field stands for.
    pub const LENGTH_MULTIPLIER: usize = 4;

    /// Builds a header for a record of type `R`, whose size fixes the
    /// `length` field. `rtype` should be one of the values `R` decodes.
    pub const fn new<R: HasRType>(
        rtype: u8,
        publisher_id: u16,
        instrument_id: u32,
        ts_event: u64,
    ) -> Self {
        Self {
            length: (mem::size_of::<R>() / Self::LENGTH_MULTIPLIER) as u8,
            rtype,
            publisher_id,
            instrument_id,
            ts_event,
        }
    }

    /// The full size in bytes of the record this header starts, decoded
    /// from the `length` field.
    pub const fn record_size(&self) -> usize {
        self.length as usize * Self::LENGTH_MULTIPLIER
    }

    /// The record type as an enum, for exhaustive matching.
    ///
    /// # Errors
    /// This function returns an error when the raw `rtype` value has no
    /// [`RType`] counterpart.
    pub fn rtype(&self) -> crate::Result<RType> {
        let raw = self.rtype;
        RType::try_from(raw).map_err(|_| Error::conversion::<RType>(format!("{raw:#04X}")))
    }

    /// `ts_event` as a datetime, or `None` when it holds the
    /// null-timestamp sentinel.
    pub fn ts_event(&self) -> Option<time::OffsetDateTime> {
        ts_to_dt(self.ts_event)
    }
}

impl SymbolMappingMsg {
    /// Builds a symbol mapping between the given input and output symbols.
    ///
    /// # Errors
    /// This function returns an error when either symbol exceeds 21
    /// characters, the most that fit beside the null terminator.
    pub fn new(
        instrument_id: u32,
        ts_event: u64,
        stype_in_symbol: &str,
        stype_out_symbol: &str,
        start_ts: u64,
        end_ts: u64,
    ) -> crate::Result<Self> {
        Ok(Self {
            hd: RecordHeader::new::<Self>(rtype::SYMBOL_MAPPING, 0, instrument_id, ts_event),
            stype_in_symbol: str_to_c_chars(stype_in_symbol)?,
            stype_out_symbol: str_to_c_chars(stype_out_symbol)?,
            _reserved: Default::default(),
            start_ts,
            end_ts,
            ts_out: 0,
        })
    }

    /// The subscribed-side symbol as a `&str`.
    ///
    /// # Errors
    /// This function returns an error when `stype_in_symbol` lacks a null
    /// terminator or isn't valid UTF-8.
    pub fn stype_in_symbol(&self) -> crate::Result<&str> {
        c_chars_to_str(&self.stype_in_symbol)
    }

    /// The resolved-side symbol as a `&str`.
    ///
    /// # Errors
    /// This function returns an error when `stype_out_symbol` lacks a null
    /// terminator or isn't valid UTF-8.
    pub fn stype_out_symbol(&self) -> crate::Result<&str> {
        c_chars_to_str(&self.stype_out_symbol)
    }

    /// `start_ts` as a datetime, or `None` when it holds the
    /// null-timestamp sentinel.
    pub fn start_ts(&self) -> Option<time::OffsetDateTime> {
        ts_to_dt(self.start_ts)
    }

    /// `end_ts` as a datetime, or `None` when it holds the null-timestamp
    /// sentinel.
    pub fn end_ts(&self) -> Option<time::OffsetDateTime> {
        ts_to_dt(self.end_ts)
    }
}

impl InstrumentDefMsg {
    /// The publisher's symbol for the instrument as a `&str`.
    ///
    /// # Errors
    /// This function returns an error when `raw_symbol` lacks a null
    /// terminator or isn't valid UTF-8.
    pub fn raw_symbol(&self) -> crate::Result<&str> {
        c_chars_to_str(&self.raw_symbol)
    }

    /// The listing exchange code as a `&str`.
    ///
    /// # Errors
    /// This function returns an error when `exchange` lacks a null
    /// terminator or isn't valid UTF-8.
    pub fn exchange(&self) -> crate::Result<&str> {
        c_chars_to_str(&self.exchange)
    }

    /// The underlying product code as a `&str`.
    ///
    /// # Errors
    /// This function returns an error when `asset` lacks a null terminator
    /// or isn't valid UTF-8.
    pub fn asset(&self) -> crate::Result<&str> {
        c_chars_to_str(&self.asset)
    }

    /// The instrument's classification as an enum.
    ///
    /// # Errors
    /// This function returns an error when the widened `instrument_class`
    /// value has no [`InstrumentClass`] counterpart.
    pub fn instrument_class(&self) -> crate::Result<InstrumentClass> {
        let raw = self.instrument_class;
        u8::try_from(raw)
            .ok()
            .and_then(|c| InstrumentClass::try_from(c).ok())
            .ok_or_else(|| Error::conversion::<InstrumentClass>(format!("{raw:#04X}")))
    }

    /// The venue's matching algorithm as an enum.
    ///
    /// # Errors
    /// This function returns an error when the widened `match_algorithm`
    /// value has no [`MatchAlgorithm`] counterpart.
    pub fn match_algorithm(&self) -> crate::Result<MatchAlgorithm> {
        let raw = self.match_algorithm;
        u8::try_from(raw)
            .ok()
            .and_then(|a| MatchAlgorithm::try_from(a).ok())
            .ok_or_else(|| Error::conversion::<MatchAlgorithm>(format!("{raw:#04X}")))
    }

    /// What this definition does to the instrument, as an enum.
    ///
    /// # Errors
    /// This function returns an error when the widened
    /// `security_update_action` value has no [`SecurityUpdateAction`]
    /// counterpart.
    pub fn security_update_action(&self) -> crate::Result<SecurityUpdateAction> {
        let raw = self.security_update_action;
        u8::try_from(raw)
            .ok()
            .and_then(|a| SecurityUpdateAction::try_from(a).ok())
            .ok_or_else(|| Error::conversion::<SecurityUpdateAction>(format!("{raw:#04X}")))
    }

    /// Whether a user defined the instrument, as an enum.
    ///
    /// # Errors
    /// This function returns an error when the widened
    /// `user_defined_instrument` value has no [`UserDefinedInstrument`]
    /// counterpart.
    pub fn user_defined_instrument(&self) -> crate::Result<UserDefinedInstrument> {
        let raw = self.user_defined_instrument;
        u8::try_from(raw)
            .ok()
            .and_then(|u| UserDefinedInstrument::try_from(u).ok())
            .ok_or_else(|| Error::conversion::<UserDefinedInstrument>(format!("{raw:#04X}")))
    }

    /// `ts_recv` as a datetime, or `None` when it holds the null-timestamp
    /// sentinel.
    pub fn ts_recv(&self) -> Option<time::OffsetDateTime> {
        ts_to_dt(self.ts_recv)
    }

    /// `expiration` as a datetime, or `None` when it holds the
    /// null-timestamp sentinel.
    pub fn expiration(&self) -> Option<time::OffsetDateTime> {
        ts_to_dt(self.expiration)
    }
}

impl Cmbp1Msg {
    /// The book action as an enum.
    ///
    /// # Errors
    /// This function returns an error when the raw `action` byte has no
    /// [`Action`] counterpart.
    pub fn action(&self) -> crate::Result<Action> {
        let raw = self.action as u8;
        Action::try_from(raw).map_err(|_| Error::conversion::<Action>(format!("{raw:#04X}")))
    }

    /// The order or aggressor side as an enum.
    ///
    /// # Errors
    /// This function returns an error when the raw `side` byte has no
    /// [`Side`] counterpart.
    pub fn side(&self) -> crate::Result<Side> {
        let raw = self.side as u8;
        Side::try_from(raw).map_err(|_| Error::conversion::<Side>(format!("{raw:#04X}")))
    }

    /// `ts_recv` as a datetime, or `None` when it holds the null-timestamp
    /// sentinel.
    pub fn ts_recv(&self) -> Option<time::OffsetDateTime> {
        ts_to_dt(self.ts_recv)
    }
}

impl BboMsg {
    /// The side that initiated the interval's last trade, as an enum.
    ///
    /// # Errors
    /// This function returns an error when the raw `side` byte has no
    /// [`Side`] counterpart.
    pub fn side(&self) -> crate::Result<Side> {
        let raw = self.side as u8;
        Side::try_from(raw).map_err(|_| Error::conversion::<Side>(format!("{raw:#04X}")))
    }

    /// `ts_recv` as a datetime, or `None` when it holds the null-timestamp
    /// sentinel.
    pub fn ts_recv(&self) -> Option<time::OffsetDateTime> {
        ts_to_dt(self.ts_recv)
    }
}

impl ErrorMsg {
    /// Builds an error record carrying `msg`, cut down to the 63 bytes the
    /// text field can hold.
    pub fn new(ts_event: u64, msg: &str) -> Self {
        let mut error = Self {
            hd: RecordHeader::new::<Self>(rtype::ERROR, 0, 0, ts_event),
            ..Default::default()
        };
        // Truncate to leave room for the null terminator.
        let msg = &msg[..msg.len().min(SYSTEM_MSG_CSTR_LEN - 1)];
        if let Ok(chars) = str_to_c_chars(msg) {
            error.err = chars;
        }
        error
    }

    /// The error text as a `&str`.
    ///
    /// # Errors
    /// This function returns an error when `err` lacks a null terminator or
    /// isn't valid UTF-8.
    pub fn err(&self) -> crate::Result<&str> {
        c_chars_to_str(&self.err)
    }
}

impl SystemMsg {
    /// The text heartbeat notifications begin with.
    pub const HEARTBEAT: &'static str = "Heartbeat";

    /// Builds a system record carrying `msg`.
    ///
    /// # Errors
    /// This function returns an error when `msg` exceeds 63 characters, the
    /// most that fit beside the null terminator.
    pub fn new(ts_event: u64, msg: &str) -> crate::Result<Self> {
        Ok(Self {
            hd: RecordHeader::new::<Self>(rtype::SYSTEM, 0, 0, ts_event),
            msg: str_to_c_chars(msg)?,
            ts_out: 0,
        })
    }

    /// Whether this notification is a gateway heartbeat.
    pub fn is_heartbeat(&self) -> bool {
        self.msg()
            .map(|msg| msg.starts_with(Self::HEARTBEAT))
            .unwrap_or_default()
    }

    /// The notification text as a `&str`.
    ///
    /// # Errors
    /// This function returns an error when `msg` lacks a null terminator or
    /// isn't valid UTF-8.
    pub fn msg(&self) -> crate::Result<&str> {
        c_chars_to_str(&self.msg)
    }
}
