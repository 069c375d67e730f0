//! Getting the file bytes into memory.
//!
//! Decoding works on a byte slice; these helpers drain a byte source into a buffer, reporting
//! any failure as `Error::SourceUnavailable`.

use crate::prelude::*;
use std::{fs::File, io::Read, path::Path};

/// Read the whole byte source into memory.
///
/// The source is consumed and dropped before returning, on success and on failure alike.
pub fn read_source<R: Read>(mut source: R) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(16 * 1024);
    source
        .read_to_end(&mut bytes)
        .map_err(Error::SourceUnavailable)?;
    Ok(bytes)
}

/// Read the file at `path` into memory.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    fn load_impl(path: &Path) -> Result<Vec<u8>> {
        let file = File::open(path).map_err(Error::SourceUnavailable)?;
        read_source(file)
    }
    load_impl(path.as_ref())
}
