use crate::{
    enums::{MatchAlgorithm, SecurityUpdateAction, UserDefinedInstrument},
    UNDEF_ORDER_SIZE, UNDEF_PRICE, UNDEF_TIMESTAMP,
};

use super::*;

impl RecordHeader {
    /// A header for a record of type `R`: `rtype` and `length` filled in,
    /// everything else at its default.
    pub const fn default<R: HasRType>(rtype: u8) -> Self {
        Self::new::<R>(rtype, 0, 0, UNDEF_TIMESTAMP)
    }
}

impl Default for SymbolMappingMsg {
    fn default() -> Self {
        Self {
            hd: RecordHeader::default::<Self>(rtype::SYMBOL_MAPPING),
            stype_in_symbol: [0; SYMBOL_CSTR_LEN],
            stype_out_symbol: [0; SYMBOL_CSTR_LEN],
            _reserved: Default::default(),
            start_ts: UNDEF_TIMESTAMP,
            end_ts: UNDEF_TIMESTAMP,
            ts_out: 0,
        }
    }
}

impl Default for InstrumentDefMsg {
    fn default() -> Self {
        Self {
            hd: RecordHeader::default::<Self>(rtype::INSTRUMENT_DEF),
            ts_recv: UNDEF_TIMESTAMP,
            min_price_increment: UNDEF_PRICE,
            display_factor: UNDEF_PRICE,
            expiration: UNDEF_TIMESTAMP,
            activation: UNDEF_TIMESTAMP,
            high_limit_price: UNDEF_PRICE,
            low_limit_price: UNDEF_PRICE,
            max_price_variation: UNDEF_PRICE,
            trading_reference_price: UNDEF_PRICE,
            unit_of_measure_qty: UNDEF_PRICE,
            min_price_increment_amount: UNDEF_PRICE,
            price_ratio: UNDEF_PRICE,
            inst_attrib_value: 0,
            underlying_id: 0,
            raw_instrument_id: 0,
            market_depth_implied: 0,
            market_depth: 0,
            market_segment_id: 0,
            max_trade_vol: 0,
            min_lot_size: 0,
            min_lot_size_block: 0,
            min_lot_size_round_lot: 0,
            min_trade_vol: 0,
            _reserved2: Default::default(),
            contract_multiplier: 0,
            decay_quantity: 0,
            original_contract_size: 0,
            _reserved3: Default::default(),
            trading_reference_date: 0,
            appl_id: 0,
            maturity_year: 0,
            decay_start_date: 0,
            channel_id: 0,
            currency: [0; 4],
            settl_currency: [0; 4],
            secsubtype: [0; 6],
            raw_symbol: [0; SYMBOL_CSTR_LEN],
            group: [0; 21],
            exchange: [0; 5],
            asset: [0; 7],
            cfi: [0; 7],
            security_type: [0; 7],
            unit_of_measure: [0; 31],
            underlying: [0; 21],
            strike_price_currency: [0; 4],
            instrument_class: 0,
            _reserved4: Default::default(),
            strike_price: UNDEF_PRICE,
            _reserved5: Default::default(),
            match_algorithm: MatchAlgorithm::Undefined as u8 as u32,
            md_security_trading_status: 0,
            main_fraction: 0,
            price_display_format: 0,
            settl_price_type: 0,
            sub_fraction: 0,
            underlying_product: 0,
            security_update_action: SecurityUpdateAction::Add as u8 as u32,
            maturity_month: 0,
            maturity_day: 0,
            maturity_week: 0,
            user_defined_instrument: UserDefinedInstrument::No as u8 as u32,
            contract_multiplier_unit: 0,
            flow_schedule_type: 0,
            tick_rule: 0,
            _reserved6: Default::default(),
            ts_out: 0,
        }
    }
}

impl Default for BidAskPair {
    fn default() -> Self {
        Self {
            bid_px: UNDEF_PRICE,
            ask_px: UNDEF_PRICE,
            bid_sz: 0,
            ask_sz: 0,
            bid_ct: 0,
            ask_ct: 0,
        }
    }
}

impl Default for ConsolidatedBidAskPair {
    fn default() -> Self {
        Self {
            bid_px: UNDEF_PRICE,
            ask_px: UNDEF_PRICE,
            bid_sz: 0,
            ask_sz: 0,
            bid_pb: 0,
            _reserved1: Default::default(),
            ask_pb: 0,
            _reserved2: Default::default(),
        }
    }
}

impl Default for Cmbp1Msg {
    fn default() -> Self {
        Self {
            hd: RecordHeader::default::<Self>(rtype::CMBP_1),
            price: UNDEF_PRICE,
            size: UNDEF_ORDER_SIZE,
            action: crate::enums::Action::default() as u8 as c_char,
            side: crate::enums::Side::default() as u8 as c_char,
            flags: 0,
            _reserved1: Default::default(),
            ts_recv: UNDEF_TIMESTAMP,
            ts_in_delta: 0,
            _reserved2: Default::default(),
            levels: Default::default(),
            ts_out: 0,
        }
    }
}

impl Default for BboMsg {
    fn default() -> Self {
        Self {
            hd: RecordHeader::default::<Self>(rtype::BBO_1S),
            price: UNDEF_PRICE,
            size: UNDEF_ORDER_SIZE,
            _reserved1: Default::default(),
            side: crate::enums::Side::default() as u8 as c_char,
            flags: 0,
            _reserved2: Default::default(),
            ts_recv: UNDEF_TIMESTAMP,
            _reserved3: Default::default(),
            sequence: 0,
            levels: Default::default(),
            ts_out: 0,
        }
    }
}

impl Default for ErrorMsg {
    fn default() -> Self {
        Self {
            hd: RecordHeader::default::<Self>(rtype::ERROR),
            err: [0; SYSTEM_MSG_CSTR_LEN],
            ts_out: 0,
        }
    }
}

impl Default for SystemMsg {
    fn default() -> Self {
        Self {
            hd: RecordHeader::default::<Self>(rtype::SYSTEM),
            msg: [0; SYSTEM_MSG_CSTR_LEN],
            ts_out: 0,
        }
    }
}
