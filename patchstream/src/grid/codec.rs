//! Grid wire-format decoder and encoder.

use std::collections::HashMap;

use super::data::GridData;
use super::error::DecodeError;
use super::reader::BinaryReader;
use super::writer::BinaryWriter;
use crate::coord::AreaBounds;

/// Magic token at the start of every grid file.
pub const GRID_TOKEN: u32 = 0x600D_F00D;

/// The single supported format version.
pub const GRID_VERSION: u32 = 0x0000_000D;

/// Decode a binary grid file.
///
/// With `include_data` unset only the header and string sections are
/// consumed, producing a record with bounds, cell counts, value range and
/// metadata but an empty value array, the lightweight form the preload
/// pass uses to establish the spatial index.
///
/// With `include_data` set, the value payload, optional mask and trailing
/// distribution table are consumed as well. Masked-out cells (mask byte 0)
/// are rewritten to a sentinel strictly below the header minimum,
/// `floor(min) - 1`, which is returned as the record's no-data marker.
pub fn decode(bytes: &[u8], include_data: bool) -> Result<GridData, DecodeError> {
    let mut reader = BinaryReader::new(bytes);

    let token = reader.read_u32()?;
    if token != GRID_TOKEN {
        return Err(DecodeError::InvalidFormat { found: token });
    }

    let version = reader.read_u32()?;
    if version != GRID_VERSION {
        return Err(DecodeError::UnsupportedVersion { found: version });
    }

    let west = reader.read_f64()?;
    let east = reader.read_f64()?;
    let north = reader.read_f64()?;
    let south = reader.read_f64()?;

    let category_count = reader.read_i32()?;
    let min_value = reader.read_f32()?;
    let max_value = reader.read_f32()?;
    let count_x = reader.read_i32()? as u32;
    let count_y = reader.read_i32()? as u32;
    let units = reader.read_string()?;

    // Coloring mode byte: consumed, renderer concern only
    let _coloring = reader.read_u8()?;

    let mut metadata = read_metadata(&mut reader)?;
    metadata.insert("units".to_string(), units);

    // Category table is declared by the header but not part of the
    // in-memory record; consume it to keep the section order intact.
    for _ in 0..category_count.max(0) {
        let _name = reader.read_string()?;
        let _value = reader.read_i32()?;
    }

    let cell_count = count_x as usize * count_y as usize;
    let mut values = Vec::new();
    let mut no_data = None;

    if include_data {
        values = reader.read_f32_slice(cell_count)?;

        let has_mask = reader.read_bool()?;
        if has_mask {
            let mask = reader.read_bytes(cell_count)?;

            // Sentinel strictly below every real value
            let sentinel = min_value.floor() - 1.0;
            for (value, masked) in values.iter_mut().zip(mask) {
                if *masked == 0 {
                    *value = sentinel;
                }
            }
            no_data = Some(sentinel);
        }

        read_distribution(&mut reader)?;
    }

    Ok(GridData {
        metadata,
        bounds: AreaBounds::new(north, east, south, west),
        values,
        no_data,
        count_x,
        count_y,
        min_value,
        max_value,
    })
}

fn read_metadata(reader: &mut BinaryReader<'_>) -> Result<HashMap<String, String>, DecodeError> {
    let count = reader.read_i32()?;
    let mut metadata = HashMap::new();

    for _ in 0..count.max(0) {
        let key = reader.read_string()?;
        let value = reader.read_string()?;
        metadata.insert(key, value);
    }

    Ok(metadata)
}

fn read_distribution(reader: &mut BinaryReader<'_>) -> Result<(), DecodeError> {
    let count = reader.read_u8()?;
    for _ in 0..count {
        let _bucket = reader.read_u32()?;
    }
    Ok(())
}

/// Encode a grid record back into the wire layout.
///
/// Written with an empty category table and distribution table; the mask
/// is reconstructed from cells equal to the no-data sentinel. Decoding
/// the result reproduces the record (see the round-trip tests).
pub fn encode(grid: &GridData) -> Vec<u8> {
    let mut writer = BinaryWriter::new();

    writer.write_u32(GRID_TOKEN);
    writer.write_u32(GRID_VERSION);

    writer.write_f64(grid.bounds.west);
    writer.write_f64(grid.bounds.east);
    writer.write_f64(grid.bounds.north);
    writer.write_f64(grid.bounds.south);

    writer.write_i32(0); // categories
    writer.write_f32(grid.min_value);
    writer.write_f32(grid.max_value);
    writer.write_i32(grid.count_x as i32);
    writer.write_i32(grid.count_y as i32);
    writer.write_string(grid.units().unwrap_or(""));
    writer.write_u8(0); // coloring mode

    let pairs: Vec<(&String, &String)> = grid
        .metadata
        .iter()
        .filter(|(key, _)| key.as_str() != "units")
        .collect();
    writer.write_i32(pairs.len() as i32);
    for (key, value) in pairs {
        writer.write_string(key);
        writer.write_string(value);
    }

    for value in &grid.values {
        writer.write_f32(*value);
    }

    match grid.no_data {
        Some(sentinel) => {
            writer.write_u8(1);
            for value in &grid.values {
                writer.write_u8(if *value == sentinel { 0 } else { 1 });
            }
        }
        None => writer.write_u8(0),
    }

    writer.write_u8(0); // distribution table
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> GridData {
        let mut metadata = HashMap::new();
        metadata.insert("units".to_string(), "t/ha".to_string());
        metadata.insert("Source".to_string(), "survey".to_string());

        GridData {
            metadata,
            bounds: AreaBounds::new(48.0, 17.5, 47.0, 16.5),
            values: vec![0.5, 1.5, 2.5, 3.5, 4.5, 5.5],
            no_data: None,
            count_x: 3,
            count_y: 2,
            min_value: 0.5,
            max_value: 5.5,
        }
    }

    fn encode_with_mask(grid: &GridData, mask: &[u8]) -> Vec<u8> {
        // Build raw bytes with an explicit mask section, bypassing the
        // sentinel bookkeeping encode() does.
        let mut writer = BinaryWriter::new();
        writer.write_u32(GRID_TOKEN);
        writer.write_u32(GRID_VERSION);
        writer.write_f64(grid.bounds.west);
        writer.write_f64(grid.bounds.east);
        writer.write_f64(grid.bounds.north);
        writer.write_f64(grid.bounds.south);
        writer.write_i32(0);
        writer.write_f32(grid.min_value);
        writer.write_f32(grid.max_value);
        writer.write_i32(grid.count_x as i32);
        writer.write_i32(grid.count_y as i32);
        writer.write_string("t/ha");
        writer.write_u8(0);
        writer.write_i32(0);
        for value in &grid.values {
            writer.write_f32(*value);
        }
        writer.write_u8(1);
        for byte in mask {
            writer.write_u8(*byte);
        }
        writer.write_u8(0);
        writer.into_bytes()
    }

    #[test]
    fn round_trip_without_mask() {
        let grid = sample_grid();
        let decoded = decode(&encode(&grid), true).unwrap();

        assert_eq!(decoded.values, grid.values);
        assert_eq!(decoded.bounds, grid.bounds);
        assert_eq!(decoded.count_x, 3);
        assert_eq!(decoded.count_y, 2);
        assert_eq!(decoded.min_value, grid.min_value);
        assert_eq!(decoded.max_value, grid.max_value);
        assert_eq!(decoded.no_data, None);
        assert_eq!(decoded.units(), Some("t/ha"));
        assert_eq!(decoded.metadata.get("Source").unwrap(), "survey");
    }

    #[test]
    fn round_trip_with_mask_preserves_sentinel_cells() {
        let sentinel = 0.5f32.floor() - 1.0;
        let mut grid = sample_grid();
        grid.values[1] = sentinel;
        grid.values[4] = sentinel;
        grid.no_data = Some(sentinel);

        let decoded = decode(&encode(&grid), true).unwrap();

        assert_eq!(decoded.no_data, Some(sentinel));
        assert_eq!(decoded.values, grid.values);
        assert!(sentinel < grid.min_value);
    }

    #[test]
    fn mask_rewrites_cells_to_sentinel() {
        let grid = sample_grid();
        let bytes = encode_with_mask(&grid, &[1, 0, 1, 1, 0, 1]);

        let decoded = decode(&bytes, true).unwrap();
        let sentinel = grid.min_value.floor() - 1.0;

        assert_eq!(decoded.no_data, Some(sentinel));
        assert_eq!(decoded.values[1], sentinel);
        assert_eq!(decoded.values[4], sentinel);
        assert_eq!(decoded.values[0], 0.5);
        assert!(sentinel < decoded.min_value);
    }

    #[test]
    fn sentinel_sits_below_negative_minimum() {
        let mut grid = sample_grid();
        grid.min_value = -3.25;
        grid.values[0] = -3.25;
        let bytes = encode_with_mask(&grid, &[0, 1, 1, 1, 1, 1]);

        let decoded = decode(&bytes, true).unwrap();
        assert_eq!(decoded.no_data, Some(-5.0));
        assert_eq!(decoded.values[0], -5.0);
    }

    #[test]
    fn header_only_decode_skips_payload() {
        let grid = sample_grid();
        let decoded = decode(&encode(&grid), false).unwrap();

        assert!(decoded.values.is_empty());
        assert_eq!(decoded.no_data, None);
        assert_eq!(decoded.bounds, grid.bounds);
        assert_eq!(decoded.count_x, 3);
        assert_eq!(decoded.units(), Some("t/ha"));
    }

    #[test]
    fn wrong_magic_token_is_invalid_format() {
        let mut bytes = encode(&sample_grid());
        bytes[0..4].copy_from_slice(&0xBAADF00Du32.to_le_bytes());

        assert_eq!(
            decode(&bytes, true),
            Err(DecodeError::InvalidFormat { found: 0xBAADF00D })
        );
    }

    #[test]
    fn wrong_version_is_unsupported() {
        let mut bytes = encode(&sample_grid());
        bytes[4..8].copy_from_slice(&0x0000_000Eu32.to_le_bytes());

        assert_eq!(
            decode(&bytes, true),
            Err(DecodeError::UnsupportedVersion { found: 0x0000_000E })
        );
    }

    #[test]
    fn truncated_value_section_is_detected() {
        let bytes = encode(&sample_grid());
        // Cut into the middle of the value payload
        let cut = bytes.len() - (3 * 4 + 1 + 1);

        assert!(matches!(
            decode(&bytes[..cut], true),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn truncated_header_is_detected() {
        let bytes = encode(&sample_grid());

        assert!(matches!(
            decode(&bytes[..20], true),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn empty_input_is_truncated_not_invalid() {
        assert!(matches!(
            decode(&[], true),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn category_table_is_consumed() {
        // Hand-build a file with two categories between metadata and payload
        let grid = sample_grid();
        let mut writer = BinaryWriter::new();
        writer.write_u32(GRID_TOKEN);
        writer.write_u32(GRID_VERSION);
        writer.write_f64(grid.bounds.west);
        writer.write_f64(grid.bounds.east);
        writer.write_f64(grid.bounds.north);
        writer.write_f64(grid.bounds.south);
        writer.write_i32(2);
        writer.write_f32(grid.min_value);
        writer.write_f32(grid.max_value);
        writer.write_i32(grid.count_x as i32);
        writer.write_i32(grid.count_y as i32);
        writer.write_string("t/ha");
        writer.write_u8(0);
        writer.write_i32(0);
        writer.write_string("forest");
        writer.write_i32(1);
        writer.write_string("water");
        writer.write_i32(2);
        for value in &grid.values {
            writer.write_f32(*value);
        }
        writer.write_u8(0);
        writer.write_u8(0);

        let decoded = decode(&writer.into_bytes(), true).unwrap();
        assert_eq!(decoded.values, grid.values);
    }
}
