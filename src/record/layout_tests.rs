#![cfg(test)]

//! The gateway's record layouts are packed, so their sizes pin the entire
//! wire format.

use std::mem;

use rstest::rstest;

use super::*;

#[test]
fn header_is_sixteen_bytes() {
    assert_eq!(mem::size_of::<RecordHeader>(), 16);
    assert_eq!(mem::align_of::<RecordHeader>(), 1);
}

#[rstest]
#[case::symbol_mapping(mem::size_of::<SymbolMappingMsg>(), 88)]
#[case::instrument_def(mem::size_of::<InstrumentDefMsg>(), 380)]
#[case::cmbp1(mem::size_of::<Cmbp1Msg>(), 88)]
#[case::bbo(mem::size_of::<BboMsg>(), 88)]
#[case::error(mem::size_of::<ErrorMsg>(), 88)]
#[case::system(mem::size_of::<SystemMsg>(), 88)]
fn record_sizes(#[case] size: usize, #[case] exp: usize) {
    assert_eq!(size, exp);
}

#[test]
fn length_field_is_in_four_byte_units() {
    let smap = SymbolMappingMsg::default();
    assert_eq!(smap.record_size(), mem::size_of::<SymbolMappingMsg>());
    assert_eq!({ smap.hd.length } as usize * 4, 88);
    let sdef = InstrumentDefMsg::default();
    assert_eq!(sdef.record_size(), 380);
    assert_eq!({ sdef.hd.length }, 95);
}

#[test]
fn pair_sizes() {
    assert_eq!(mem::size_of::<BidAskPair>(), 32);
    assert_eq!(mem::size_of::<ConsolidatedBidAskPair>(), 32);
}
