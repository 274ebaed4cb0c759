//! Header Map Host Calls

use bytes::Bytes;

use super::{raw, OutBuffer};
use crate::map;
use crate::types::{MapType, Status};

fn fetch_map(map_type: MapType) -> Result<Option<Bytes>, Status> {
    let mut out = OutBuffer::new();
    let status =
        unsafe { raw::proxy_get_header_map_pairs(map_type as u32, &mut out.data, &mut out.size) };
    Status::check(status)?;
    Ok(out.take().map(|buf| buf.into_bytes()))
}

/// Malformed maps mean the host broke the ABI; there is no way to recover
fn malformed(map_type: MapType, err: map::MapError) -> ! {
    panic!("host returned a malformed {:?} map: {}", map_type, err)
}

/// Fetch a whole header map as string pairs, in host order
pub fn get_map(map_type: MapType) -> Result<Vec<(String, String)>, Status> {
    match fetch_map(map_type)? {
        Some(data) => match map::decode(&data) {
            Ok(pairs) => Ok(pairs),
            Err(e) => malformed(map_type, e),
        },
        None => Ok(Vec::new()),
    }
}

/// Fetch a whole header map as raw byte pairs
pub fn get_map_bytes(map_type: MapType) -> Result<Vec<(Bytes, Bytes)>, Status> {
    match fetch_map(map_type)? {
        Some(data) => match map::decode_bytes(&data) {
            Ok(pairs) => Ok(pairs),
            Err(e) => malformed(map_type, e),
        },
        None => Ok(Vec::new()),
    }
}

/// Replace a whole header map
pub fn set_map<K: AsRef<[u8]>, V: AsRef<[u8]>>(
    map_type: MapType,
    pairs: &[(K, V)],
) -> Result<(), Status> {
    let data = map::encode(pairs);
    Status::check(unsafe {
        raw::proxy_set_header_map_pairs(map_type as u32, data.as_ptr(), data.len())
    })
}

pub fn get_map_value(map_type: MapType, key: &str) -> Result<String, Status> {
    let mut out = OutBuffer::new();
    let status = unsafe {
        raw::proxy_get_header_map_value(
            map_type as u32,
            key.as_ptr(),
            key.len(),
            &mut out.data,
            &mut out.size,
        )
    };
    Status::check(status)?;
    match out.take() {
        Some(buf) => Ok(buf.into_string_lossy()),
        None => Err(Status::NotFound),
    }
}

pub fn add_map_value(map_type: MapType, key: &str, value: &str) -> Result<(), Status> {
    Status::check(unsafe {
        raw::proxy_add_header_map_value(
            map_type as u32,
            key.as_ptr(),
            key.len(),
            value.as_ptr(),
            value.len(),
        )
    })
}

pub fn replace_map_value(map_type: MapType, key: &str, value: &str) -> Result<(), Status> {
    Status::check(unsafe {
        raw::proxy_replace_header_map_value(
            map_type as u32,
            key.as_ptr(),
            key.len(),
            value.as_ptr(),
            value.len(),
        )
    })
}

pub fn remove_map_value(map_type: MapType, key: &str) -> Result<(), Status> {
    Status::check(unsafe {
        raw::proxy_remove_header_map_value(map_type as u32, key.as_ptr(), key.len())
    })
}
