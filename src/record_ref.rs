//! A borrowed view over a record of any type.

use std::{marker::PhantomData, mem, ptr::NonNull, slice};

use crate::record::{HasRType, Record, RecordHeader};

/// A non-owning view into a record sitting in a receive buffer, typed only
/// by its header until the caller asks for a concrete record struct. The
/// lifetime ties the view to the buffer, so handlers can't retain it.
///
/// Record layouts all have alignment 1, so the view may start at any byte
/// offset of the buffer.
#[derive(Clone, Debug)]
pub struct RecordRef<'a> {
    ptr: NonNull<RecordHeader>,
    _marker: PhantomData<&'a RecordHeader>,
}

// Safety: RecordRef exposes only shared references to plain old data.
unsafe impl Send for RecordRef<'_> {}
unsafe impl Sync for RecordRef<'_> {}

impl<'a> RecordRef<'a> {
    /// Wraps the record at the front of `buffer`.
    ///
    /// # Safety
    /// `buffer` must start with a [`RecordHeader`] whose `length` field
    /// describes a complete record lying within `buffer`.
    pub unsafe fn new(buffer: &'a [u8]) -> Self {
        debug_assert!(buffer.len() >= mem::size_of::<RecordHeader>());
        let ptr = NonNull::new_unchecked(buffer.as_ptr().cast_mut().cast::<RecordHeader>());
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Borrows the record's header.
    pub fn header(&self) -> &RecordHeader {
        // Safety: the constructor contract guarantees a header is present.
        unsafe { self.ptr.as_ref() }
    }

    /// The record's full size in bytes, header included.
    pub fn record_size(&self) -> usize {
        self.header().record_size()
    }

    /// Whether the viewed record is a `T`: the `rtype` matches and the
    /// record is big enough to hold one.
    pub fn has<T: HasRType>(&self) -> bool {
        T::has_rtype(self.header().rtype) && self.record_size() >= mem::size_of::<T>()
    }

    /// The record as a `T`, or `None` when it is some other type or too
    /// short to be a `T`. Checks [`has::<T>()`](Self::has) first; use
    /// [`get_unchecked()`](Self::get_unchecked) when the check was already
    /// done.
    pub fn get<T: HasRType>(&self) -> Option<&T> {
        if self.has::<T>() {
            // Safety: `has()` just confirmed the rtype and the size, and
            // the constructor contract guarantees a complete record.
            Some(unsafe { self.ptr.cast::<T>().as_ref() })
        } else {
            None
        }
    }

    /// The record as a `T`, skipping the type check that
    /// [`get()`](Self::get) performs.
    ///
    /// # Safety
    /// The caller must know the record is a `T`.
    pub unsafe fn get_unchecked<T: HasRType>(&self) -> &T {
        debug_assert!(self.has::<T>());
        self.ptr.cast::<T>().as_ref()
    }

    /// The record's raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        // Safety: the constructor contract guarantees `record_size()` bytes
        // are present behind `ptr`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr().cast::<u8>(), self.record_size()) }
    }
}

impl Record for RecordRef<'_> {
    fn header(&self) -> &RecordHeader {
        // Safety: the constructor contract guarantees a header is present.
        unsafe { self.ptr.as_ref() }
    }
}

impl AsRef<[u8]> for RecordRef<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        record::{ErrorMsg, SymbolMappingMsg, SystemMsg},
        rtype,
    };

    use super::*;

    #[test]
    fn typed_get() {
        let smap = SymbolMappingMsg::new(1, 2, "ES.FUT", "ESM4", 0, 0).unwrap();
        // Safety: `smap` is a complete record.
        let record = unsafe { RecordRef::new(smap.as_ref()) };
        assert_eq!(record.header().rtype, rtype::SYMBOL_MAPPING);
        assert_eq!(record.record_size(), 88);
        assert!(record.has::<SymbolMappingMsg>());
        assert!(!record.has::<ErrorMsg>());
        assert!(record.get::<ErrorMsg>().is_none());
        let decoded = record.get::<SymbolMappingMsg>().unwrap();
        assert_eq!(decoded.stype_out_symbol().unwrap(), "ESM4");
    }

    #[test]
    fn short_record_is_rejected() {
        let mut system = SystemMsg::new(0, "Heartbeat").unwrap();
        // Claim a 16-byte record despite the system rtype.
        system.hd.length = 4;
        // Safety: the buffer holds a full `SystemMsg`, of which the header
        // describes a prefix.
        let record = unsafe { RecordRef::new(system.as_ref()) };
        assert!(!record.has::<SystemMsg>());
        assert!(record.get::<SystemMsg>().is_none());
    }
}
