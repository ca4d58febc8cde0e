// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Read-only probe for the APK Signing Block that Signature Scheme v2 and
//! later place directly before the ZIP Central Directory.
//!
//! The block is laid out as:
//!
//! ```text
//! u64 size (excludes this field)
//! repeated { u64 length, u32 id, value[length - 4] }
//! u64 size (same value as above)
//! "APK Sig Block 42"
//! ```
//!
//! This only answers "is a v2 block present". Whether the signature inside
//! is valid is for `apksigner verify` to decide.

use byteorder::{LittleEndian, ReadBytesExt};
use instant_common::*;
use std::io::Cursor;

use crate::zip_parser::find_offsets;

pub const APK_SIG_BLOCK_MAGIC: &[u8; 16] = b"APK Sig Block 42";
pub const SIGNATURE_SCHEME_V2_BLOCK_ID: u32 = 0x7109871a;
pub const SIGNATURE_SCHEME_V3_BLOCK_ID: u32 = 0xf05368c0;

// Trailing size field plus magic
const FOOTER_LEN: usize = 8 + 16;

/// Lists the IDs of every pair in the APK Signing Block, in file order.
/// An unsigned (or v1-only) APK yields an empty list.
pub fn signing_block_ids(apk_buf: &[u8]) -> Result<Vec<u32>> {
    let offsets = find_offsets(apk_buf)?;
    let cd_start = offsets.cd_start;
    if cd_start < FOOTER_LEN || &apk_buf[(cd_start - 16)..cd_start] != APK_SIG_BLOCK_MAGIC {
        return Ok(vec![]);
    }

    let mut size_field = Cursor::new(&apk_buf[(cd_start - FOOTER_LEN)..(cd_start - 16)]);
    let block_size = size_field.read_u64::<LittleEndian>()? as usize;
    let block_start = Some(block_size)
        .filter(|size| *size >= FOOTER_LEN)
        .and_then(|size| size.checked_add(8))
        .and_then(|len| cd_start.checked_sub(len))
        .ok_or_else(|| {
            InstantError::MalformedApk(format!("signing block size {block_size} is out of range"))
        })?;

    let pairs = &apk_buf[(block_start + 8)..(cd_start - FOOTER_LEN)];
    let mut cursor = Cursor::new(pairs);
    let mut ids = vec![];
    while (cursor.position() as usize) < pairs.len() {
        let pair_len = cursor.read_u64::<LittleEndian>()? as usize;
        let id = cursor.read_u32::<LittleEndian>()?;
        ids.push(id);
        // pair_len counts the id as well as the value
        let next = (cursor.position() as usize)
            .checked_add(pair_len.saturating_sub(4))
            .filter(|next| *next <= pairs.len())
            .ok_or_else(|| {
                InstantError::MalformedApk(format!("signing block pair 0x{id:x} overruns the block"))
            })?;
        cursor.set_position(next as u64);
    }
    Ok(ids)
}

/// True if the APK carries an APK Signature Scheme v2 block.
pub fn has_v2_signature_block(apk_buf: &[u8]) -> Result<bool> {
    Ok(signing_block_ids(apk_buf)?.contains(&SIGNATURE_SCHEME_V2_BLOCK_ID))
}
