//! Mouse zones: named rectangular regions used for input hit-testing.
//!
//! Components register zones while rendering. A zone is owned by the
//! registering component and optionally carries a local child id (a table
//! tags each row as `row:3`, say), which is what the component's mouse
//! handlers receive back on a hit.
//!
//! Zone geometry is recovered from the composited frame rather than asked of
//! the layout engine: [`Ctx::mouse_zone`] wraps the zone's content in a pair
//! of invisible APC marker sequences, and [`Ctx::scan_zones`], run on the
//! final frame after compositing, finds the marker pairs, records each
//! zone's cell rectangle, and strips the markers out. The scanner is
//! ANSI-aware and counts display columns, not bytes.
//!
//! Zone tables are rebuilt every render pass; stale zones cannot outlive the
//! components that registered them.

use crate::context::Ctx;
use crate::instance::{ComponentId, Rect};
use rustc_hash::FxHashMap;
use unicode_width::UnicodeWidthChar;

/// Local child id within an owning component's zones.
pub type ZoneChild = smartstring::alias::String;

/// One registered zone.
pub(crate) struct Zone {
    pub(crate) owner: ComponentId,
    pub(crate) child: ZoneChild,
    pub(crate) area: Option<Rect>,
}

/// Per-pass zone table. A zone's index is its registration order, which the
/// markers embed.
#[derive(Default)]
pub(crate) struct ZoneMap {
    zones: Vec<Zone>,
}

impl ZoneMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        self.zones.clear();
    }

    fn register(&mut self, owner: ComponentId, child: &str) -> usize {
        self.zones.push(Zone {
            owner,
            child: ZoneChild::from(child),
            area: None,
        });
        self.zones.len() - 1
    }

    pub(crate) fn len(&self) -> usize {
        self.zones.len()
    }
}

// APC (ESC _ ... ESC \) sequences are zero-width for ANSI-aware width
// measurement, so markers survive compositing without disturbing layout.
const MARKER_PREFIX: &str = "\x1b_zn;";
const MARKER_SUFFIX: &str = "\x1b\\";

fn marker(index: usize, end: bool) -> String {
    let tag = if end { 'e' } else { 's' };
    format!("{MARKER_PREFIX}{index};{tag}{MARKER_SUFFIX}")
}

impl Ctx {
    /// Register a zone covering the current component's whole output and
    /// return `content` wrapped in zone markers. When the frame is scanned,
    /// the recovered rectangle is also written back as the component's
    /// geometry.
    ///
    /// # Panics
    ///
    /// Panics outside an active render.
    #[track_caller]
    pub fn mouse_zone(&mut self, content: impl Into<String>) -> String {
        self.register_marked("", content.into())
    }

    /// Register a zone for a child region of the current component, tagged
    /// with `child` (e.g. `row:3`). Mouse handlers receive the tag on a hit.
    ///
    /// # Panics
    ///
    /// Panics outside an active render.
    #[track_caller]
    pub fn mouse_zone_child(&mut self, child: &str, content: impl Into<String>) -> String {
        self.register_marked(child, content.into())
    }

    fn register_marked(&mut self, child: &str, content: String) -> String {
        let owner = self.current_id().clone();
        let index = self.zones.register(owner, child);
        let mut marked = String::with_capacity(content.len() + 24);
        marked.push_str(&marker(index, false));
        marked.push_str(&content);
        marked.push_str(&marker(index, true));
        marked
    }

    /// Scan a composited frame: record every marked zone's rectangle and
    /// return the frame with markers stripped. Whole-component zones also
    /// write their owner's geometry, feeding `use_size` and
    /// `use_global_position`.
    pub fn scan_zones(&mut self, frame: &str) -> String {
        let mut out = String::with_capacity(frame.len());
        let mut starts: FxHashMap<usize, (u16, u16)> = FxHashMap::default();
        let mut bounds: Vec<(ComponentId, Rect)> = Vec::new();

        let mut row: u16 = 0;
        let mut col: u16 = 0;
        let mut chars = frame.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\n' {
                row += 1;
                col = 0;
                out.push(c);
                continue;
            }
            if c != '\x1b' {
                out.push(c);
                col += UnicodeWidthChar::width(c).unwrap_or(0) as u16;
                continue;
            }

            match chars.peek() {
                // APC: ours carry zone positions and are stripped; foreign
                // ones pass through. Either way, zero width.
                Some('_') => {
                    chars.next();
                    let mut body = String::new();
                    while let Some(next) = chars.next() {
                        if next == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                        body.push(next);
                    }
                    if let Some(payload) = body.strip_prefix("zn;") {
                        if let Some((index, tag)) = parse_marker(payload) {
                            if tag == 's' {
                                starts.insert(index, (col, row));
                            } else if let Some(&(x1, y1)) = starts.get(&index) {
                                let area = span_rect(x1, y1, col, row);
                                if let Some(zone) = self.zones.zones.get_mut(index) {
                                    zone.area = Some(area);
                                    if zone.child.is_empty() {
                                        bounds.push((zone.owner.clone(), area));
                                    }
                                }
                            }
                        }
                    } else {
                        out.push_str("\x1b_");
                        out.push_str(&body);
                        out.push_str("\x1b\\");
                    }
                }
                // CSI: copy through; styling has no width.
                Some('[') => {
                    out.push(c);
                    while let Some(&next) = chars.peek() {
                        out.push(next);
                        chars.next();
                        if ('\x40'..='\x7e').contains(&next) {
                            break;
                        }
                    }
                }
                // OSC: copy through to BEL or ST.
                Some(']') => {
                    out.push(c);
                    while let Some(next) = chars.next() {
                        out.push(next);
                        if next == '\x07' {
                            break;
                        }
                        if next == '\x1b' && chars.peek() == Some(&'\\') {
                            out.push('\\');
                            chars.next();
                            break;
                        }
                    }
                }
                _ => out.push(c),
            }
        }

        for (owner, area) in bounds {
            self.set_bounds(&owner, area);
        }
        out
    }

    /// Find the zone under the cell (x, y) and return its owning component
    /// id plus the local child id. The innermost (smallest) containing zone
    /// wins; among equals, the latest registered.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<(&str, &str)> {
        self.zones
            .zones
            .iter()
            .enumerate()
            .filter_map(|(index, zone)| {
                zone.area
                    .filter(|area| area.contains(x, y))
                    .map(|area| (index, zone, area))
            })
            .min_by_key(|(index, _, area)| (area.cells(), std::cmp::Reverse(*index)))
            .map(|(_, zone, _)| (zone.owner.as_str(), zone.child.as_str()))
    }

    /// Number of zones registered in the current pass.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }
}

/// Marker payload is `{index};{s|e}`.
fn parse_marker(payload: &str) -> Option<(usize, char)> {
    let (index, tag) = payload.split_once(';')?;
    let index = index.parse().ok()?;
    let tag = tag.chars().next()?;
    Some((index, tag))
}

/// Rectangle between a start marker cell and an end marker cell. The end
/// marker sits one past the content's last column on its final row; content
/// whose lines vary in width is approximated by its marker span, as with
/// any marker-scanned zone system.
///
/// Markers touching on one row mean the zone rendered nothing; such a zone
/// gets a zero-width rect and can never be hit.
fn span_rect(x1: u16, y1: u16, x2: u16, y2: u16) -> Rect {
    let width = if y2 == y1 {
        x2.saturating_sub(x1)
    } else {
        x2.saturating_sub(x1).max(1)
    };
    Rect {
        x: x1,
        y: y1,
        width,
        height: y2.saturating_sub(y1) + 1,
    }
}
