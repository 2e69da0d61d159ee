#![cfg(test)]

use crate::enums::{InstrumentClass, SecurityUpdateAction};

use super::*;

#[test]
fn invalid_rtype_error() {
    let header = RecordHeader::new::<SystemMsg>(0xE0, 1, 2, 3);
    assert_eq!(
        header.rtype().unwrap_err().to_string(),
        "couldn't convert 0xE0 to dbn_live::enums::rtype::RType"
    );
}

#[test]
fn symbol_mapping_symbols() {
    let smap = SymbolMappingMsg::new(42, 0, "SPX.OPT", "SPX   240915P04700000", 1, 2).unwrap();
    assert_eq!(smap.stype_in_symbol().unwrap(), "SPX.OPT");
    assert_eq!(smap.stype_out_symbol().unwrap(), "SPX   240915P04700000");
    assert_eq!({ smap.hd.instrument_id }, 42);
    assert!(SymbolMappingMsg::has_rtype(0x16));
    assert!(!SymbolMappingMsg::has_rtype(0x17));
}

#[test]
fn symbol_too_long_for_cstr() {
    assert!(SymbolMappingMsg::new(0, 0, "", "X".repeat(SYMBOL_CSTR_LEN).as_str(), 0, 0).is_err());
}

#[test]
fn instrument_def_widened_enums() {
    let sdef = InstrumentDefMsg {
        instrument_class: InstrumentClass::Call as u8 as u32,
        security_update_action: SecurityUpdateAction::Add as u8 as u32,
        ..Default::default()
    };
    assert_eq!(sdef.instrument_class().unwrap(), InstrumentClass::Call);
    assert_eq!(
        sdef.security_update_action().unwrap(),
        SecurityUpdateAction::Add
    );
    let bad = InstrumentDefMsg {
        instrument_class: 0x1_0000,
        ..Default::default()
    };
    assert!(bad.instrument_class().is_err());
}

#[test]
fn system_msg_heartbeat() {
    let heartbeat = SystemMsg::new(0, SystemMsg::HEARTBEAT).unwrap();
    assert!(heartbeat.is_heartbeat());
    let replay_done = SystemMsg::new(0, "Finished definition replay").unwrap();
    assert!(!replay_done.is_heartbeat());
    assert_eq!(replay_done.msg().unwrap(), "Finished definition replay");
}

#[test]
fn error_msg_truncates() {
    let err = ErrorMsg::new(0, &"e".repeat(100));
    assert_eq!(err.err().unwrap().len(), SYSTEM_MSG_CSTR_LEN - 1);
}

#[test]
fn record_as_bytes_round_trips_through_transmute() {
    let orig = SymbolMappingMsg::new(7, 11, "MSFT.OPT", "MSFT  250117C00400000", 0, 0).unwrap();
    let bytes = orig.as_ref();
    assert_eq!(bytes.len(), 88);
    // Safety: `bytes` is a complete `SymbolMappingMsg`.
    let decoded = unsafe { transmute_record_bytes::<SymbolMappingMsg>(bytes) }.unwrap();
    assert_eq!(*decoded, orig);
    // Safety: `bytes` is a complete record.
    let header = unsafe { transmute_header_bytes(bytes) }.unwrap();
    assert_eq!(header.record_size(), 88);
}
