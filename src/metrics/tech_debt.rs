//! How far a project's target platform lags behind the current generation.

use super::{score_projects, MetricCalculator, MetricKind};
use crate::core::CancellationToken;
use crate::errors::Result;
use crate::graph::DependencyGraph;

/// Added when the platform no longer receives support.
pub const UNSUPPORTED_PENALTY: u32 = 4;
/// Added for the Windows-only .NET Framework line.
pub const LEGACY_FRAMEWORK_PENALTY: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    /// .NET 5 and later
    Modern,
    Core,
    Standard,
    /// .NET Framework 1.x to 4.8.1
    Framework,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformRelease {
    pub moniker: &'static str,
    pub year: u32,
    pub supported: bool,
    pub family: PlatformFamily,
}

const fn release(
    moniker: &'static str,
    year: u32,
    supported: bool,
    family: PlatformFamily,
) -> PlatformRelease {
    PlatformRelease {
        moniker,
        year,
        supported,
        family,
    }
}

use PlatformFamily::{Core, Framework, Modern, Standard};

/// Known target platform monikers, newest first.
pub static PLATFORM_CATALOG: &[PlatformRelease] = &[
    release("net10.0", 2025, true, Modern),
    release("net9.0", 2024, true, Modern),
    release("net8.0", 2023, true, Modern),
    release("net7.0", 2022, false, Modern),
    release("net6.0", 2021, false, Modern),
    release("net5.0", 2020, false, Modern),
    release("netcoreapp3.1", 2019, false, Core),
    release("netcoreapp3.0", 2019, false, Core),
    release("netcoreapp2.2", 2018, false, Core),
    release("netcoreapp2.1", 2018, false, Core),
    release("netcoreapp2.0", 2017, false, Core),
    release("netcoreapp1.1", 2016, false, Core),
    release("netcoreapp1.0", 2016, false, Core),
    release("netstandard2.1", 2019, true, Standard),
    release("netstandard2.0", 2017, true, Standard),
    release("netstandard1.6", 2016, false, Standard),
    release("netstandard1.3", 2015, false, Standard),
    release("netstandard1.0", 2014, false, Standard),
    release("net481", 2022, true, Framework),
    release("net48", 2019, true, Framework),
    release("net472", 2018, true, Framework),
    release("net471", 2017, true, Framework),
    release("net47", 2017, true, Framework),
    release("net462", 2016, true, Framework),
    release("net461", 2015, false, Framework),
    release("net46", 2015, false, Framework),
    release("net452", 2014, false, Framework),
    release("net451", 2013, false, Framework),
    release("net45", 2012, false, Framework),
    release("net403", 2011, false, Framework),
    release("net40", 2010, false, Framework),
    release("net35", 2007, true, Framework),
    release("net20", 2005, false, Framework),
    release("net11", 2003, false, Framework),
];

/// Strip OS suffixes (`net8.0-windows`) and fold case.
pub fn canonical_moniker(moniker: &str) -> String {
    let trimmed = moniker.trim().to_lowercase();
    match trimmed.split_once('-') {
        Some((base, _)) => base.to_string(),
        None => trimmed,
    }
}

pub fn lookup(moniker: &str) -> Option<&'static PlatformRelease> {
    let canonical = canonical_moniker(moniker);
    PLATFORM_CATALOG.iter().find(|r| r.moniker == canonical)
}

/// Release year for `netN.0` monikers the catalog may not list yet.
fn modern_release_year(canonical: &str) -> Option<u32> {
    let major: u32 = canonical.strip_prefix("net")?.strip_suffix(".0")?.parse().ok()?;
    (major >= 5).then_some(2015 + major)
}

#[derive(Debug, Clone, Copy)]
pub struct TechDebtCalculator {
    current_generation_year: u32,
    oldest_year: u32,
}

impl Default for TechDebtCalculator {
    fn default() -> Self {
        let years = PLATFORM_CATALOG.iter().map(|r| r.year);
        Self {
            current_generation_year: years.clone().max().unwrap_or_default(),
            oldest_year: years.min().unwrap_or_default(),
        }
    }
}

impl TechDebtCalculator {
    pub fn platform_debt(&self, moniker: &str) -> u32 {
        let canonical = canonical_moniker(moniker);
        if let Some(release) = PLATFORM_CATALOG.iter().find(|r| r.moniker == canonical) {
            return self.debt(release.year, release.supported, release.family == Framework);
        }

        match modern_release_year(&canonical) {
            Some(year) if year >= self.current_generation_year => 0,
            Some(year) => self.debt(year, false, false),
            None => self.debt(self.oldest_year, false, true),
        }
    }

    fn debt(&self, year: u32, supported: bool, legacy_framework: bool) -> u32 {
        let mut score = self.current_generation_year.saturating_sub(year);
        if !supported {
            score += UNSUPPORTED_PENALTY;
        }
        if legacy_framework {
            score += LEGACY_FRAMEWORK_PENALTY;
        }
        score
    }
}

impl MetricCalculator for TechDebtCalculator {
    fn kind(&self) -> MetricKind {
        MetricKind::TechDebt
    }

    fn raw_scores(
        &self,
        graph: &DependencyGraph,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, f64)>> {
        score_projects(graph, cancel, |project| {
            self.platform_debt(&project.target_platform) as f64
        })
    }
}
