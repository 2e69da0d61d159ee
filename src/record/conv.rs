use std::{ffi::CStr, mem, ptr::NonNull, slice};

use crate::record::{HasRType, RecordHeader};

/// Reinterprets `bytes` as a `T`, checking the header's `rtype` first so a
/// mismatched record type comes back as `None` instead of garbage. The
/// returned reference borrows from `bytes`.
///
/// # Safety
/// `bytes` must hold a complete record at least `std::mem::size_of::<T>()`
/// bytes long.
///
/// # Panics
/// Panics when `bytes` is shorter than `T`.
pub unsafe fn transmute_record_bytes<T: HasRType>(bytes: &[u8]) -> Option<&T> {
    assert!(
        bytes.len() >= mem::size_of::<T>(),
        "`transmute_record_bytes` requires at least enough bytes for a `{}`",
        std::any::type_name::<T>()
    );
    let non_null = NonNull::new_unchecked(bytes.as_ptr().cast_mut());
    if T::has_rtype(non_null.cast::<RecordHeader>().as_ref().rtype) {
        Some(non_null.cast::<T>().as_ref())
    } else {
        None
    }
}

/// Reinterprets the front of `bytes` as a [`RecordHeader`], returning `None`
/// when the header claims a record longer than `bytes` actually is. The
/// returned reference borrows from `bytes`.
///
/// # Safety
/// `bytes` must start with a well-formed record header.
///
/// # Panics
/// Panics when `bytes` can't even hold a [`RecordHeader`], the smallest
/// possible record.
pub unsafe fn transmute_header_bytes(bytes: &[u8]) -> Option<&RecordHeader> {
    assert!(
        bytes.len() >= mem::size_of::<RecordHeader>(),
        concat!(
            "`transmute_header_bytes` requires at least enough bytes for a `",
            stringify!(RecordHeader),
            "`"
        )
    );
    let non_null = NonNull::new_unchecked(bytes.as_ptr().cast_mut());
    let header = non_null.cast::<RecordHeader>().as_ref();
    if header.record_size() > bytes.len() {
        None
    } else {
        Some(header)
    }
}

/// Views `data` as its raw bytes.
///
/// # Safety
/// `data` must be plain old data: sized and pointer-free.
pub(crate) unsafe fn as_u8_slice<T: Sized>(data: &T) -> &[u8] {
    slice::from_raw_parts((data as *const T).cast(), mem::size_of::<T>())
}

/// Reads a fixed-width `c_char` array as a `&str`, stopping at the first
/// null byte.
///
/// # Errors
/// This function returns an error if no null byte is present or the bytes
/// before it aren't valid UTF-8.
pub fn c_chars_to_str<const N: usize>(chars: &[std::os::raw::c_char; N]) -> crate::Result<&str> {
    // Safety: `c_char` and `u8` have the same layout.
    let bytes = unsafe { slice::from_raw_parts(chars.as_ptr().cast::<u8>(), N) };
    let cstr = CStr::from_bytes_until_nul(bytes)
        .map_err(|_| crate::Error::conversion::<&str>(format!("{bytes:?}")))?;
    cstr.to_str()
        .map_err(|_| crate::Error::conversion::<&str>(format!("{bytes:?}")))
}

/// Writes `s` into a fixed-width `c_char` array, null-terminated.
///
/// # Errors
/// This function returns an error if `s` needs more than N - 1 bytes, since
/// the final byte must stay null.
pub fn str_to_c_chars<const N: usize>(s: &str) -> crate::Result<[std::os::raw::c_char; N]> {
    if s.len() > (N - 1) {
        return Err(crate::Error::conversion::<[std::os::raw::c_char; N]>(
            s.to_owned(),
        ));
    }
    let mut res = [0; N];
    for (i, byte) in s.as_bytes().iter().enumerate() {
        res[i] = *byte as std::os::raw::c_char;
    }
    Ok(res)
}

/// Turns a raw nanosecond UNIX timestamp into a datetime, or `None` when
/// `ts` holds the null-timestamp sentinel.
pub fn ts_to_dt(ts: u64) -> Option<time::OffsetDateTime> {
    if ts == crate::UNDEF_TIMESTAMP {
        None
    } else {
        // Every u64 nanosecond count is a representable datetime.
        Some(time::OffsetDateTime::from_unix_timestamp_nanos(ts as i128).unwrap())
    }
}
