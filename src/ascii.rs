//! ASCII and PNG previews of an assembled hex map
//!
//! Rows are axial `r`; each row is shifted half a cell per step so the disc
//! reads as a hexagon. Empty cells render as spaces / background.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::Result;
use crate::hex::HexCoord;
use crate::schema::{AssembledWorld, HexMap, Terrain, WorldHex};

/// ASCII rendering modes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AsciiMode {
    /// One character per terrain
    Terrain,
    /// Cluster, connector or filler
    Origin,
    Height,
    Moisture,
}

impl AsciiMode {
    pub fn name(&self) -> &'static str {
        match self {
            AsciiMode::Terrain => "Terrain",
            AsciiMode::Origin => "Origin",
            AsciiMode::Height => "Height",
            AsciiMode::Moisture => "Moisture",
        }
    }

    pub fn all() -> &'static [AsciiMode] {
        &[AsciiMode::Terrain, AsciiMode::Origin, AsciiMode::Height, AsciiMode::Moisture]
    }
}

pub fn terrain_char(terrain: Terrain) -> char {
    match terrain {
        Terrain::DeepWater => '~',
        Terrain::ShallowWater => '-',
        Terrain::Marsh => ',',
        Terrain::Plains => '.',
        Terrain::Hills => 'n',
        Terrain::Forest => 'f',
        Terrain::DenseForest => 'F',
        Terrain::Mountains => '^',
        Terrain::HighMountains => 'A',
        Terrain::Desert => ':',
        Terrain::Tundra => '_',
        Terrain::Volcanic => 'V',
        Terrain::Glacier => '*',
        Terrain::Underground => '#',
        Terrain::Cavern => 'o',
    }
}

/// Get ASCII character for elevation
pub fn height_char(elevation: f32) -> char {
    // Underground to high peaks: -300 to +1200
    const CHARS: &[char] = &['_', '.', '-', '=', '+', '*', '#', '%', '^', 'A', 'M'];
    let normalized = ((elevation + 300.0) / 1500.0).clamp(0.0, 1.0);
    let idx = (normalized * (CHARS.len() - 1) as f32) as usize;
    CHARS[idx.min(CHARS.len() - 1)]
}

/// Get ASCII character for moisture
pub fn moisture_char(moisture: f32) -> char {
    // 0.0 to 1.0
    const CHARS: &[char] = &['_', '.', '-', ':', ';', '=', '+', '#', '%', '~'];
    let idx = (moisture.clamp(0.0, 1.0) * (CHARS.len() - 1) as f32) as usize;
    CHARS[idx.min(CHARS.len() - 1)]
}

fn origin_char(hex: &WorldHex) -> char {
    if let Some(id) = &hex.cluster_id {
        id.chars().next().map(|c| c.to_ascii_uppercase()).unwrap_or('C')
    } else if hex.connector_id.is_some() {
        if hex.terrain.is_water() {
            '~'
        } else {
            '='
        }
    } else {
        '.'
    }
}

pub fn hex_char(hex: &WorldHex, mode: AsciiMode) -> char {
    match mode {
        AsciiMode::Terrain => terrain_char(hex.terrain),
        AsciiMode::Origin => origin_char(hex),
        AsciiMode::Height => height_char(hex.elevation),
        AsciiMode::Moisture => moisture_char(hex.moisture),
    }
}

/// Render the disc, one text row per axial row
pub fn render_ascii_map(map: &HexMap, mode: AsciiMode) -> String {
    let radius = map.world_radius.max(0);
    let width = (4 * radius + 1) as usize;
    let mut result = String::with_capacity((width + 1) * (2 * radius + 1) as usize);

    for r in -radius..=radius {
        let mut row = vec![' '; width];
        let q_min = (-radius).max(-radius - r);
        let q_max = radius.min(radius - r);
        for q in q_min..=q_max {
            if let Some(hex) = map.get(HexCoord::new(q, r)) {
                let col = (2 * q + r + 2 * radius) as usize;
                row[col] = hex_char(hex, mode);
            }
        }
        let line: String = row.into_iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }

    result
}

/// Generate legend for terrain characters
pub fn terrain_legend() -> String {
    let mut legend = String::new();
    legend.push_str("=== TERRAIN LEGEND ===\n");
    for chunk in Terrain::all().chunks(4) {
        legend.push(' ');
        for terrain in chunk {
            legend.push_str(&format!(" {} {:<15}", terrain_char(*terrain), terrain.name()));
        }
        legend.push('\n');
    }
    legend
}

pub fn calculate_terrain_stats(map: &HexMap) -> BTreeMap<Terrain, usize> {
    let mut stats = BTreeMap::new();
    for hex in map.hexes.values() {
        *stats.entry(hex.terrain).or_insert(0) += 1;
    }
    stats
}

/// Write a text report: header, stats, terrain and origin views
pub fn export_world_file(world: &AssembledWorld, path: impl AsRef<Path>) -> io::Result<()> {
    let mut file = File::create(path)?;
    let map = &world.hex_map;
    let stats = &world.stats;

    // Header
    writeln!(file, "=== HEXWORLD WORLD FILE ===")?;
    if let Some(name) = &world.name {
        writeln!(file, "Name: {}", name)?;
    }
    writeln!(file, "Seed: {}", world.seed_id)?;
    writeln!(file, "Radius: {} ({} hexes)", map.world_radius, map.len())?;
    writeln!(file, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file)?;

    writeln!(file, "=== STATS ===")?;
    writeln!(file, "Clusters: {} ({} hexes)", stats.total_clusters, stats.cluster_hexes)?;
    writeln!(file, "Connectors: {} ({} hexes)", stats.total_connectors, stats.connector_hexes)?;
    writeln!(file, "Anchors: {}", stats.total_anchors)?;
    writeln!(file, "Filler hexes: {}", stats.filler_hexes)?;
    writeln!(file, "Time: {} ms", stats.generation_time_ms)?;
    for failure in &world.failures {
        writeln!(file, "FAILED: {}", failure)?;
    }
    writeln!(file)?;

    writeln!(file, "=== MAP (Terrain View) ===")?;
    write!(file, "{}", render_ascii_map(map, AsciiMode::Terrain))?;
    writeln!(file)?;
    write!(file, "{}", terrain_legend())?;
    writeln!(file)?;

    writeln!(file, "=== MAP (Origin View) ===")?;
    write!(file, "{}", render_ascii_map(map, AsciiMode::Origin))?;
    writeln!(file)?;

    writeln!(file, "=== TERRAIN DISTRIBUTION ===")?;
    let total = map.len().max(1);
    for (terrain, count) in calculate_terrain_stats(map) {
        let pct = count as f32 / total as f32 * 100.0;
        writeln!(file, "  {:<15} {:>6} ({:5.1}%)", terrain.name(), count, pct)?;
    }

    Ok(())
}

pub fn terrain_color(terrain: Terrain) -> (u8, u8, u8) {
    match terrain {
        Terrain::DeepWater => (20, 50, 120),
        Terrain::ShallowWater => (60, 120, 180),
        Terrain::Marsh => (90, 110, 80),
        Terrain::Plains => (140, 180, 90),
        Terrain::Hills => (150, 140, 90),
        Terrain::Forest => (50, 120, 50),
        Terrain::DenseForest => (25, 80, 35),
        Terrain::Mountains => (130, 120, 110),
        Terrain::HighMountains => (220, 220, 225),
        Terrain::Desert => (220, 200, 140),
        Terrain::Tundra => (170, 180, 170),
        Terrain::Volcanic => (90, 40, 30),
        Terrain::Glacier => (235, 245, 255),
        Terrain::Underground => (60, 50, 45),
        Terrain::Cavern => (85, 70, 60),
    }
}

/// Terrain colour, tinted for cluster and route hexes
pub fn hex_color(hex: &WorldHex) -> (u8, u8, u8) {
    let (r, g, b) = terrain_color(hex.terrain);
    let tint = if hex.cluster_id.is_some() {
        Some((200, 60, 50))
    } else if hex.connector_id.is_some() && !hex.terrain.is_water() {
        Some((160, 110, 60))
    } else {
        None
    };
    match tint {
        Some((tr, tg, tb)) => (
            ((r as u16 + tr as u16) / 2) as u8,
            ((g as u16 + tg as u16) / 2) as u8,
            ((b as u16 + tb as u16) / 2) as u8,
        ),
        None => (r, g, b),
    }
}

/// Render one `cell` x `cell` block per hex, rows offset by half a cell
pub fn render_hex_image(map: &HexMap, cell: u32) -> RgbImage {
    let radius = map.world_radius.max(0);
    let cell = cell.max(1);
    let size = (2 * radius + 1) as u32 * cell;
    let mut img: RgbImage = ImageBuffer::from_pixel(size, size, Rgb([0, 0, 0]));

    for (coord, hex) in &map.hexes {
        if !coord.in_radius(radius) {
            continue;
        }
        // x in half-cells so odd rows land between columns
        let half_x = 2 * (coord.q + radius) + coord.r;
        let px = (half_x as f32 * cell as f32 / 2.0) as u32;
        let py = (coord.r + radius) as u32 * cell;
        let (r, g, b) = hex_color(hex);

        for dy in 0..cell {
            for dx in 0..cell {
                let (x, y) = (px + dx, py + dy);
                if x < size && y < size {
                    img.put_pixel(x, y, Rgb([r, g, b]));
                }
            }
        }
    }

    img
}

pub fn export_hex_png(map: &HexMap, path: impl AsRef<Path>, cell: u32) -> Result<()> {
    render_hex_image(map, cell).save(path)?;
    Ok(())
}
