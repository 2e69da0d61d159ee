use crate::{record::ts_to_dt, RType, RecordHeader};

/// The common surface of every type that starts with a [`RecordHeader`].
/// Lets code handle records generically when the concrete type doesn't
/// matter.
pub trait Record: AsRef<[u8]> {
    /// Borrows the leading [`RecordHeader`].
    fn header(&self) -> &RecordHeader;

    /// The record's full size in bytes, header included.
    fn record_size(&self) -> usize {
        self.header().record_size()
    }

    /// The record type as an enum, for exhaustive matching.
    ///
    /// # Errors
    /// This function returns an error when the header carries an `rtype`
    /// value with no [`RType`] counterpart.
    fn rtype(&self) -> crate::Result<RType> {
        self.header().rtype()
    }

    /// The raw matching-engine timestamp the record is indexed by.
    fn raw_index_ts(&self) -> u64 {
        self.header().ts_event
    }

    /// The record's index timestamp as a datetime, or `None` when it holds
    /// the null-timestamp sentinel.
    fn index_ts(&self) -> Option<time::OffsetDateTime> {
        ts_to_dt(self.raw_index_ts())
    }
}

/// Mutable access to the leading [`RecordHeader`] of a record type.
pub trait RecordMut {
    /// Borrows the leading [`RecordHeader`] mutably.
    fn header_mut(&mut self) -> &mut RecordHeader;
}

/// Implemented by record types that own a fixed set of `rtype` values, so a
/// raw discriminant can be tested against the type before casting.
pub trait HasRType: Record + RecordMut {
    /// Whether this type decodes records carrying `rtype`.
    fn has_rtype(rtype: u8) -> bool;
}
