//! Elastic segment stretch and compress

use tracing::debug;

use crate::schema::{ConnectorHex, ElasticSegment, SpeciesFitness};

/// Resize every segment that falls outside its length bounds
///
/// A short segment gets `stretch_terrain` hexes inserted at its midpoint,
/// copying elevation and moisture from the segment's first hex. A long one
/// loses hexes from its midpoint. Segment indices refer to the sequence as
/// it stands when that segment is applied; segments reaching past the end
/// are skipped. The result is reindexed and relinked.
pub fn apply_elastic_segments(hexes: Vec<ConnectorHex>, segments: &[ElasticSegment]) -> Vec<ConnectorHex> {
    let mut result = hexes;

    for segment in segments {
        let (start, end) = (segment.start_hex, segment.end_hex);
        if start >= result.len() || end >= result.len() || end < start {
            debug!(start, end, len = result.len(), "elastic segment out of range");
            continue;
        }

        let current = end - start + 1;
        let mid = start + current / 2;

        if current < segment.min_length {
            let template = result[start].clone();
            let fill = (0..segment.min_length - current).map(|_| ConnectorHex {
                index: 0,
                coord: None,
                terrain: segment.stretch_terrain,
                elevation: template.elevation,
                moisture: template.moisture,
                temperature: template.temperature,
                species_fitness: SpeciesFitness::neutral(),
                connects_to: Vec::new(),
                is_entry_point: false,
                is_slot: false,
            });
            result.splice(mid..mid, fill);
        } else if current > segment.max_length {
            let remove = current - segment.max_length;
            let stop = (mid + remove).min(result.len());
            result.drain(mid..stop);
        }
    }

    relink(&mut result);
    result
}

/// Renumber hexes `0..n` and link each to its predecessor and successor
pub fn relink(hexes: &mut [ConnectorHex]) {
    let last = hexes.len().saturating_sub(1);
    for (i, hex) in hexes.iter_mut().enumerate() {
        hex.index = i;
        hex.connects_to.clear();
        if i > 0 {
            hex.connects_to.push(i - 1);
        }
        if i < last {
            hex.connects_to.push(i + 1);
        }
    }
}
