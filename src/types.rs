use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Severity of a single lint finding, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Error,
        Severity::Warning,
        Severity::Info,
        Severity::Hint,
    ];

    /// Parse a severity label, case-insensitively
    ///
    /// Accepts the short forms linters print (`warn`, `information`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "error" | "err" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "info" | "information" => Some(Self::Info),
            "hint" => Some(Self::Hint),
            _ => None,
        }
    }

    /// Map a numeric level (0 = error .. 3 = hint)
    pub fn from_level(level: u64) -> Option<Self> {
        Self::ALL.get(level as usize).copied()
    }
}

/// One rule infraction reported by the linter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub severity: Severity,
}

impl Violation {
    pub fn new(severity: Severity) -> Self {
        Self { severity }
    }
}

/// Number of violations per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub errors: u32,
    pub warnings: u32,
    pub infos: u32,
    pub hints: u32,
}

impl SeverityCounts {
    pub fn new(errors: u32, warnings: u32, infos: u32, hints: u32) -> Self {
        Self {
            errors,
            warnings,
            infos,
            hints,
        }
    }

    pub fn add(&mut self, severity: Severity) {
        let slot = match severity {
            Severity::Error => &mut self.errors,
            Severity::Warning => &mut self.warnings,
            Severity::Info => &mut self.infos,
            Severity::Hint => &mut self.hints,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Error => self.errors,
            Severity::Warning => self.warnings,
            Severity::Info => self.infos,
            Severity::Hint => self.hints,
        }
    }

    pub fn total(&self) -> u32 {
        Severity::ALL
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(self.get(*s)))
    }

    /// Expand counts into one violation per finding, errors first
    pub fn to_violations(&self) -> Vec<Violation> {
        Severity::ALL
            .iter()
            .flat_map(|s| std::iter::repeat_n(Violation::new(*s), self.get(*s) as usize))
            .collect()
    }
}

impl FromIterator<Severity> for SeverityCounts {
    fn from_iter<I: IntoIterator<Item = Severity>>(iter: I) -> Self {
        let mut counts = Self::default();
        for severity in iter {
            counts.add(severity);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_case_folds() {
        assert_eq!(Severity::from_label("ERROR"), Some(Severity::Error));
        assert_eq!(Severity::from_label(" Warn "), Some(Severity::Warning));
        assert_eq!(Severity::from_label("information"), Some(Severity::Info));
        assert_eq!(Severity::from_label("hint"), Some(Severity::Hint));
        assert_eq!(Severity::from_label("fatal"), None);
    }

    #[test]
    fn test_from_level() {
        assert_eq!(Severity::from_level(0), Some(Severity::Error));
        assert_eq!(Severity::from_level(3), Some(Severity::Hint));
        assert_eq!(Severity::from_level(4), None);
    }

    #[test]
    fn test_counts_expand_to_violations() {
        let counts = SeverityCounts::new(2, 1, 0, 3);
        let violations = counts.to_violations();
        assert_eq!(violations.len(), 6);
        assert_eq!(counts.total(), 6);
        assert_eq!(violations[0].severity, Severity::Error);
        assert_eq!(violations[5].severity, Severity::Hint);
        let back: SeverityCounts = violations.iter().map(|v| v.severity).collect();
        assert_eq!(back, counts);
    }
}
