//! Operator-facing population summaries

use mobcap_types::CapKey;
use std::fmt;

/// One counted key with its configured and effective caps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapLine {
    pub key: CapKey,
    pub label: String,
    pub count: u32,
    /// `None` when unlimited or not configured
    pub static_cap: Option<u32>,
    /// Effective cap after scaling by active cells, `None` when unlimited
    pub effective_cap: Option<u64>,
}

impl CapLine {
    pub fn is_over(&self) -> bool {
        self.effective_cap
            .is_some_and(|cap| self.count as u64 > cap)
    }
}

/// Snapshot of one world's population state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldReport {
    pub name: String,
    pub generation: u64,
    pub loaded_cells: usize,
    pub active_cells: u32,
    /// Counted observers currently in the world
    pub observers: usize,
    pub animals_in_cells: u64,
    pub lines: Vec<CapLine>,
}

impl WorldReport {
    pub fn line(&self, key: &CapKey) -> Option<&CapLine> {
        self.lines.iter().find(|line| &line.key == key)
    }
}

fn cap_text(cap: Option<u64>) -> String {
    match cap {
        Some(cap) => cap.to_string(),
        None => "-".to_string(),
    }
}

impl fmt::Display for WorldReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "world '{}' (gen {}): {} cells loaded, {} observers, {} animals in cells",
            self.name, self.generation, self.loaded_cells, self.observers, self.animals_in_cells
        )?;
        for line in &self.lines {
            writeln!(
                f,
                "  {:<24} {:>6} / {:>6} (static {:>6}){}",
                line.label,
                line.count,
                cap_text(line.effective_cap),
                cap_text(line.static_cap.map(u64::from)),
                if line.is_over() { "  OVER" } else { "" }
            )?;
        }
        Ok(())
    }
}
