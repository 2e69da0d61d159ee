//! Helper macros for implementing the record traits.

/// Implements [`Record`](crate::record::Record),
/// [`RecordMut`](crate::record::RecordMut),
/// [`HasRType`](crate::record::HasRType), and `AsRef<[u8]>` for a record
/// struct whose first field is the [`RecordHeader`](crate::RecordHeader),
/// given the `rtype` values that match the struct.
macro_rules! impl_record {
    ($ty:ident, $($rtype:path),+) => {
        impl crate::record::Record for $ty {
            fn header(&self) -> &crate::record::RecordHeader {
                &self.hd
            }
        }

        impl crate::record::RecordMut for $ty {
            fn header_mut(&mut self) -> &mut crate::record::RecordHeader {
                &mut self.hd
            }
        }

        impl crate::record::HasRType for $ty {
            fn has_rtype(rtype: u8) -> bool {
                matches!(rtype, $($rtype)|+)
            }
        }

        impl AsRef<[u8]> for $ty {
            fn as_ref(&self) -> &[u8] {
                // Safety: `$ty` is plain old data with no padding.
                unsafe { crate::record::as_u8_slice(self) }
            }
        }
    };
}

pub(crate) use impl_record;
