//! Read-only region queries over campaign markup.
//!
//! Email templates are hand-authored and not reliably well-formed, so instead
//! of parsing the whole document these scans trust only one element type,
//! `<table>`, and balance its open/close tokens from a known anchor.
//! Matching is ASCII case-insensitive; offsets are byte offsets into the
//! original string.

const TABLE_OPEN: &str = "<table";
const TABLE_CLOSE: &str = "</table>";

/// Half-open byte range `[start, end)` covering one balanced element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBounds {
    pub start: usize,
    pub end: usize,
}

impl RegionBounds {
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Largest char boundary of `s` not after `idx`.
pub(crate) fn floor_boundary(s: &str, idx: usize) -> usize {
    let mut idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Start of the last `<table` token that begins at or before `offset`.
fn opening_at_or_before(lower: &str, offset: usize) -> Option<usize> {
    let limit = floor_boundary(lower, offset + TABLE_OPEN.len());
    lower[..limit].rfind(TABLE_OPEN)
}

/// Bounds of the table whose opening tag contains `offset`.
///
/// Scanning starts at the nearest `<table` at or before `offset` with depth
/// zero; every `<table` increments, every `</table>` decrements, and the range
/// ends just past the close that brings depth back to zero. Returns `None` when
/// there is no opening tag or the document runs out before depth returns to zero.
pub fn table_bounds(html: &str, offset: usize) -> Option<RegionBounds> {
    let lower = html.to_ascii_lowercase();
    table_bounds_in(&lower, offset)
}

fn table_bounds_in(lower: &str, offset: usize) -> Option<RegionBounds> {
    let start = opening_at_or_before(lower, offset)?;
    let mut depth = 0usize;
    let mut pos = start;

    loop {
        let next_open = lower[pos..].find(TABLE_OPEN).map(|i| pos + i);
        let next_close = lower[pos..].find(TABLE_CLOSE).map(|i| pos + i);

        match (next_open, next_close) {
            (Some(open), Some(close)) if open < close => {
                depth += 1;
                pos = open + TABLE_OPEN.len();
            }
            (_, Some(close)) => {
                // A close before our own opening was consumed would mean the
                // scan started outside a table.
                depth = depth.checked_sub(1)?;
                pos = close + TABLE_CLOSE.len();
                if depth == 0 {
                    return Some(RegionBounds { start, end: pos });
                }
            }
            (_, None) => return None,
        }
    }
}

/// Opening `<table` of the element that owns the attribute occurrence at `attr_offset`.
///
/// Walks backwards over `<table` tags, skipping any whose opening tag text
/// doesn't contain `attribute` (compared case-insensitively).
pub fn anchored_table_start(html: &str, attr_offset: usize, attribute: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let wanted = attribute.to_ascii_lowercase();
    let mut limit = floor_boundary(&lower, attr_offset + 1);

    loop {
        let lt = lower[..limit].rfind(TABLE_OPEN)?;
        let gt = lower[lt..].find('>').map(|i| lt + i)?;
        if lower[lt..gt].contains(&wanted) {
            return Some(lt);
        }
        if lt == 0 {
            return None;
        }
        limit = lt;
    }
}

/// Start of the table enclosing `pos`, widened through wrapper tables.
///
/// Finds the innermost table whose balanced bounds contain `pos`, then keeps
/// probing the `<table` opening immediately before the current one: while that
/// one also encloses `pos` (a wrapper with no other table content ahead of
/// ours) the result moves outward to it.
pub fn enclosing_table_start(html: &str, pos: usize) -> Option<usize> {
    let lower = html.to_ascii_lowercase();

    let mut search_end = floor_boundary(&lower, pos);
    let mut current = loop {
        let open = lower[..search_end].rfind(TABLE_OPEN)?;
        match table_bounds_in(&lower, open) {
            Some(bounds) if bounds.contains(pos) => break bounds.start,
            _ => search_end = open,
        }
    };

    while let Some(outer) = lower[..current].rfind(TABLE_OPEN) {
        match table_bounds_in(&lower, outer) {
            Some(bounds) if bounds.contains(pos) => current = outer,
            _ => break,
        }
    }

    Some(current)
}
