mod options;

use itertools::Itertools;
pub use options::ReplayOptions;

use crate::formats::{parse_ccl, parse_tws, LevelMetadata, SolutionMetadata};
use crate::prelude::*;

/// Tally of a verification run.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReplayReport {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Builds a level the way the recorded solution expects it: same seed,
/// same step parity, same starting slide direction.
pub fn setup_for_solution(
    ruleset: RulesetId,
    pedantic: bool,
    solution: &SolutionMetadata,
) -> LevelSetup {
    let mut setup = LevelSetup::new(ruleset).with_seed(solution.prng_seed as u64);
    setup.pedantic_mode = pedantic;
    setup.step_parity = solution.step_value;
    setup.initial_rff_dir = solution.initial_slide_dir();
    setup
}

/// Replays one recorded solution against one level. The solution must
/// leave the level complete; anything else is a defect in the engine or
/// the recording.
pub fn play_solution(
    meta: &LevelMetadata,
    solution: &SolutionMetadata,
    ruleset: RulesetId,
    pedantic: bool,
) -> Result<()> {
    let setup = setup_for_solution(ruleset, pedantic, solution);
    let mut level = meta.make_level(setup)?;
    for tick in 0..solution.num_ticks {
        level.set_input(solution.input(tick));
        level.tick();
    }
    if level.is_complete() {
        Ok(())
    } else {
        Err(anyhow!(
            "level {} not complete after {} recorded ticks (win state {:?})",
            meta.level_number,
            solution.num_ticks,
            level.win_state()
        ))
    }
}

/// Loads a level archive and a solution archive and checks every recorded
/// solution for exact reproduction.
pub struct ReplayRunner {
    options: ReplayOptions,
}

impl ReplayRunner {
    pub fn new(options: ReplayOptions) -> ReplayRunner {
        ReplayRunner { options }
    }

    pub fn run(&self) -> Result<ReplayReport> {
        let ccl_bytes = std::fs::read(&self.options.levels)
            .with_context(|| format!("reading {}", self.options.levels.display()))?;
        let set = parse_ccl(&ccl_bytes)?;

        let tws_bytes = std::fs::read(&self.options.solutions)
            .with_context(|| format!("reading {}", self.options.solutions.display()))?;
        let tws = parse_tws(&tws_bytes)?;

        let ruleset = self.options.ruleset.unwrap_or(tws.ruleset);
        let mut report = ReplayReport::default();
        let mut failures: Vec<u16> = vec![];

        for meta in &set.levels {
            if let Some(only) = self.options.level {
                if meta.level_number != only {
                    continue;
                }
            }
            let Some(solution) = tws.solution_for_level(meta.level_number) else {
                log::debug!("level {}: no recorded solution", meta.level_number);
                report.skipped += 1;
                continue;
            };
            if solution.num_ticks == 0 {
                log::debug!("level {}: attempted but unsolved", meta.level_number);
                report.skipped += 1;
                continue;
            }
            match play_solution(meta, solution, ruleset, self.options.pedantic) {
                Ok(()) => {
                    log::info!(
                        "level {} ({}): ok in {} ticks",
                        meta.level_number,
                        meta.title.as_deref().unwrap_or("untitled"),
                        solution.num_ticks
                    );
                    report.passed += 1;
                }
                Err(err) => {
                    log::error!("level {}: {err}", meta.level_number);
                    failures.push(meta.level_number);
                    report.failed += 1;
                }
            }
        }

        println!(
            "{} passed, {} failed, {} skipped",
            report.passed, report.failed, report.skipped
        );
        if !failures.is_empty() {
            println!("failed levels: {}", failures.iter().join(", "));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{parse_ccl, parse_tws};
    use crate::prelude::*;
    use std::path::Path;

    /// Full-campaign determinism check. The archives are data, not
    /// source; when they are not checked out the test has nothing to do.
    fn campaign(ruleset: RulesetId, tws_name: &str) {
        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        let ccl_path = data.join("CCLP1.ccl");
        let tws_path = data.join(tws_name);
        if !ccl_path.exists() || !tws_path.exists() {
            eprintln!("campaign archives not present, skipping");
            return;
        }
        let set = parse_ccl(&std::fs::read(&ccl_path).unwrap()).unwrap();
        let tws = parse_tws(&std::fs::read(&tws_path).unwrap()).unwrap();
        assert_eq!(tws.ruleset, ruleset);
        for meta in &set.levels {
            let Some(solution) = tws.solution_for_level(meta.level_number) else {
                continue;
            };
            if solution.num_ticks == 0 {
                continue;
            }
            play_solution(meta, solution, ruleset, false).unwrap();
        }
    }

    #[test]
    fn campaign_ms() {
        campaign(RulesetId::Ms, "public_CHIPS.dac.tws");
    }

    #[test]
    fn campaign_lynx() {
        campaign(RulesetId::Lynx, "public_CHIPS_lynx.dac.tws");
    }
}
