use anyhow::{Result, bail};
use casualty_sim::{GateKey, GateVerdict, Mechanism, SessionExport};

use super::simulation::{RunSummary, run_case};

/// How the scripted medic treats the casualty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarePlan {
    Untreated,
    Doctrine,
    /// Uniform random picks from the intervention catalog.
    Random,
}

pub type Expectation = fn(&RunSummary) -> Result<(), String>;

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub care: CarePlan,
    pub compare_untreated: bool,
    pub expectations: Vec<Expectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(care: CarePlan) -> Self {
        Self {
            care,
            compare_untreated: false,
            expectations: vec![no_violations],
        }
    }

    #[must_use]
    pub const fn comparing_untreated(mut self) -> Self {
        self.compare_untreated = true;
        self
    }

    #[must_use]
    pub fn expecting(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

fn no_violations(summary: &RunSummary) -> Result<(), String> {
    match summary.violations.first() {
        None => Ok(()),
        Some(first) => Err(format!(
            "{} invariant violation(s), first: {first}",
            summary.violations.len()
        )),
    }
}

fn bleeders_die_untreated(summary: &RunSummary) -> Result<(), String> {
    let bleeder = matches!(
        summary.mechanism,
        Mechanism::Blast | Mechanism::GswTorso | Mechanism::GswChest
    );
    if bleeder && summary.ticks >= 900 && summary.died_at_s.is_none() {
        return Err(format!(
            "untreated {} casualty survived {}s",
            summary.mechanism, summary.ticks
        ));
    }
    Ok(())
}

fn care_outlives_neglect(summary: &RunSummary) -> Result<(), String> {
    let Some(baseline) = summary.baseline_survival_s else {
        return Err("no untreated baseline recorded".to_string());
    };
    if summary.survival_s() < baseline {
        return Err(format!(
            "treated casualty died at {}s, untreated at {baseline}s",
            summary.survival_s()
        ));
    }
    Ok(())
}

fn hemorrhage_gate_not_missed(summary: &RunSummary) -> Result<(), String> {
    if summary.ticks < 180 {
        return Ok(());
    }
    match summary.session.ledger().gate_verdict(GateKey::M) {
        Some(GateVerdict::Missed) => Err("massive hemorrhage gate missed".to_string()),
        _ => Ok(()),
    }
}

fn replay_matches(summary: &RunSummary) -> Result<(), String> {
    let replay = run_case(
        &SimulationPlan::new(CarePlan::Random),
        summary.mechanism,
        summary.seed,
        summary.ticks,
    )
    .map_err(|err| err.to_string())?;
    match summary
        .trace
        .iter()
        .zip(&replay.trace)
        .position(|(first, second)| first != second)
    {
        Some(index) => Err(format!("replay diverged at tick {}", index + 1)),
        None if replay.trace.len() != summary.trace.len() => {
            Err("replay produced a different number of ticks".to_string())
        }
        None => Ok(()),
    }
}

fn export_roundtrips(summary: &RunSummary) -> Result<(), String> {
    let json = summary
        .session
        .export()
        .to_json()
        .map_err(|err| err.to_string())?;
    let restored = SessionExport::from_json(&json)
        .and_then(SessionExport::into_session)
        .map_err(|err| err.to_string())?;
    if restored.inventory() != summary.session.inventory() {
        return Err("inventory changed across export".to_string());
    }
    if restored.ledger() != summary.session.ledger() {
        return Err("score ledger changed across export".to_string());
    }
    if restored.patient().elapsed_s != summary.session.patient().elapsed_s {
        return Err("elapsed time changed across export".to_string());
    }
    Ok(())
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("untreated", "Untreated casualty deteriorates and dies"),
        ("doctrine", "Doctrine care outlives neglect"),
        ("fuzz", "Random care keeps every vital in domain"),
        ("determinism", "Seeded runs replay identically"),
        ("export", "Session export restores the same session"),
    ]
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let plan = match name {
        "untreated" => SimulationPlan::new(CarePlan::Untreated).expecting(bleeders_die_untreated),
        "doctrine" => SimulationPlan::new(CarePlan::Doctrine)
            .comparing_untreated()
            .expecting(care_outlives_neglect)
            .expecting(hemorrhage_gate_not_missed),
        "fuzz" => SimulationPlan::new(CarePlan::Random),
        "determinism" => SimulationPlan::new(CarePlan::Random).expecting(replay_matches),
        "export" => SimulationPlan::new(CarePlan::Doctrine).expecting(export_roundtrips),
        _ => return None,
    };
    Some(TestScenario {
        name: name.to_string(),
        plan,
    })
}

/// Resolve mechanism tokens; `all` expands to every mechanism.
pub fn resolve_mechanisms(tokens: &[String]) -> Result<Vec<Mechanism>> {
    let mut mechanisms = Vec::new();
    for token in tokens {
        let expanded: Vec<Mechanism> = if token.eq_ignore_ascii_case("all") {
            Mechanism::ALL.to_vec()
        } else {
            match token.parse::<Mechanism>() {
                Ok(mechanism) => vec![mechanism],
                Err(()) => bail!("Unknown mechanism: {token}"),
            }
        };
        for mechanism in expanded {
            if !mechanisms.contains(&mechanism) {
                mechanisms.push(mechanism);
            }
        }
    }
    if mechanisms.is_empty() {
        mechanisms.extend(Mechanism::ALL);
    }
    Ok(mechanisms)
}

/// Expand `all` into every listed scenario.
#[must_use]
pub fn expand_scenarios(tokens: &[String]) -> Vec<String> {
    let mut scenarios: Vec<String> = tokens.iter().filter(|t| *t != "all").cloned().collect();
    if tokens.iter().any(|t| t == "all") {
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}
