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


use byteorder::{LittleEndian, ReadBytesExt};
use instant_common::*;
use std::io::Cursor;

#[derive(Default, Debug, PartialEq, Eq)]
pub struct ZipOffsets {
    // Central Directory (from start of file)
    pub cd_start: usize,
    // End of Central Directory (from start of file)
    pub eocd_start: usize
}

pub const EOCD_MAGIC: &[u8; 4] = &[0x50, 0x4B, 0x05, 0x06];
// Fixed part of the EOCD record, without the trailing comment
const EOCD_MIN_LEN: usize = 22;

pub fn find_offsets(zip_buf: &[u8]) -> Result<ZipOffsets> {
    if zip_buf.len() < EOCD_MIN_LEN {
        return Err(InstantError::MalformedApk("file is too small to be a zip".into()));
    }
    for i in (0..=(zip_buf.len() - EOCD_MIN_LEN)).rev() {
        let magic = &zip_buf[i..(i + 4)];
        if magic == EOCD_MAGIC {
            // The EOCD also tells us where the central directories start
            let mut eocd_cd_start_field = Cursor::new(&zip_buf[(i + 16)..(i + 20)]);
            let cd_start = eocd_cd_start_field.read_u32::<LittleEndian>()? as usize;
            if cd_start > i {
                return Err(InstantError::MalformedApk(format!(
                    "central directory offset {cd_start} is past the end of central directory at {i}"
                )));
            }
            return Ok(ZipOffsets {
                cd_start,
                eocd_start: i
            });
        }
    }
    Err(InstantError::MalformedApk(
        "no End Of Central Directory record".into()
    ))
}
