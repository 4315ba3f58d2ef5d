use casualty_sim::{
    ConfigError, DeathCause, Intervention, Inventory, Mechanism, PatientState, Session,
    SessionConfig, Side, Supply, VitalsSummary,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::scenarios::{CarePlan, SimulationPlan};

pub const DEFAULT_TICKS: u32 = 1800;

/// Outcome of one scripted casualty run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mechanism: Mechanism,
    pub seed: u64,
    pub ticks: u32,
    pub died_at_s: Option<u32>,
    pub cause: Option<DeathCause>,
    pub score: i32,
    pub interventions_applied: usize,
    pub final_vitals: VitalsSummary,
    /// Survival time of the same casualty left untreated, when requested.
    pub baseline_survival_s: Option<u32>,
    pub violations: Vec<String>,
    pub trace: Vec<VitalsSummary>,
    pub session: Session,
}

impl RunSummary {
    /// Seconds survived, counting a survivor as one past the run length.
    #[must_use]
    pub fn survival_s(&self) -> u32 {
        self.died_at_s.unwrap_or(self.ticks.saturating_add(1))
    }
}

/// Doctrine care schedule for a mechanism.
#[must_use]
pub fn doctrine_schedule(mechanism: Mechanism) -> Vec<(u32, Intervention)> {
    let mut schedule = Vec::new();
    if matches!(mechanism, Mechanism::GswTorso | Mechanism::GswChest) {
        schedule.push((20, Intervention::NeedleDecompression { side: Side::Left }));
        schedule.push((25, Intervention::OcclusiveSeal));
    }
    if mechanism == Mechanism::Blast {
        schedule.push((30, Intervention::Tourniquet));
    }
    schedule.extend([
        (45, Intervention::NasalAirway),
        (60, Intervention::Txa),
        (90, Intervention::WholeBlood),
        (120, Intervention::WholeBlood),
        (150, Intervention::WholeBlood),
        (180, Intervention::WholeBlood),
        (200, Intervention::Calcium),
        (210, Intervention::Calcium),
        (240, Intervention::HypothermiaKit),
    ]);
    schedule
}

fn bounds_violation(patient: &PatientState) -> Option<String> {
    let live = !patient.is_dead();
    let checks = [
        ("HR", patient.heart_rate, if live { 20.0 } else { 0.0 }, 170.0),
        ("MAP", patient.map, if live { 30.0 } else { 0.0 }, 120.0),
        ("SpO2", patient.spo2, if live { 60.0 } else { 0.0 }, 100.0),
        ("EtCO2", patient.etco2, if live { 10.0 } else { 0.0 }, 55.0),
        ("RR", patient.resp_rate, 6.0, 36.0),
        ("volume", patient.volume_fraction, 0.0, 1.2),
        ("coag", patient.coag_index, 0.0, 1.0),
        ("temp", patient.core_temp_c, 30.0, 39.0),
        ("GCS", patient.gcs, 3.0, 15.0),
        ("fio2", patient.fio2, 0.21, 1.0),
        ("shunt_fraction", patient.shunt_fraction, 0.03, 0.60),
        ("minute_ventilation", patient.minute_ventilation, 3.5, 15.0),
        ("catecholamine_tone", patient.catecholamine_tone, 0.1, 1.0),
        ("urine_output", patient.urine_output, 0.0, 120.0),
        ("cap_refill_s", patient.cap_refill_s, 1.0, 5.0),
        ("bleed_rate", patient.bleed_rate, 0.0, 1.0),
    ];
    checks
        .into_iter()
        .find(|(_, value, min, max)| !value.is_finite() || value < min || value > max)
        .map(|(name, value, min, max)| {
            format!(
                "t={}s {name}={value:.3} outside [{min}, {max}]",
                patient.elapsed_s
            )
        })
}

fn inventory_grew(before: &Inventory, after: &Inventory) -> Option<Supply> {
    Supply::ALL
        .into_iter()
        .find(|supply| after.count(*supply) > before.count(*supply))
}

/// Run one casualty under a care plan for `ticks` simulated seconds.
///
/// # Errors
///
/// Returns an error if the session configuration is rejected.
pub fn run_case(
    plan: &SimulationPlan,
    mechanism: Mechanism,
    seed: u64,
    ticks: u32,
) -> Result<RunSummary, ConfigError> {
    let mut summary = simulate(plan.care, mechanism, seed, ticks)?;
    if plan.compare_untreated {
        let baseline = simulate(CarePlan::Untreated, mechanism, seed, ticks)?;
        summary.baseline_survival_s = Some(baseline.survival_s());
    }
    Ok(summary)
}

fn simulate(
    care: CarePlan,
    mechanism: Mechanism,
    seed: u64,
    ticks: u32,
) -> Result<RunSummary, ConfigError> {
    let config = SessionConfig {
        mechanism,
        seed: Some(seed),
        ..SessionConfig::default()
    };
    let mut session = Session::initialize(config)?;
    let schedule = match care {
        CarePlan::Doctrine => doctrine_schedule(mechanism),
        CarePlan::Untreated | CarePlan::Random => Vec::new(),
    };
    let catalog = Intervention::catalog();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut violations = Vec::new();
    let mut trace = Vec::with_capacity(usize::try_from(ticks).unwrap_or_default());
    let mut died_at_s = None;
    let mut applied = 0;

    for second in 0..ticks {
        let mut actions: Vec<&Intervention> = schedule
            .iter()
            .filter(|(at, _)| *at == second)
            .map(|(_, action)| action)
            .collect();
        if care == CarePlan::Random && rng.gen_bool(0.05) {
            actions.push(&catalog[rng.gen_range(0..catalog.len())]);
        }
        for action in actions {
            let before = session.inventory().clone();
            let was_dead = session.is_dead();
            let outcome = session.apply(action);
            if outcome.applied {
                applied += 1;
            }
            if was_dead && outcome.applied {
                violations.push(format!("t={second}s {action} applied to a dead patient"));
            }
            if let Some(supply) = inventory_grew(&before, session.inventory()) {
                violations.push(format!("t={second}s {action} restocked {supply}"));
            }
        }

        let was_dead = session.is_dead();
        let report = session.tick();
        if let Some(cause) = report.step.death {
            log::debug!("{mechanism} seed {seed}: died at {}s ({cause})", second + 1);
            died_at_s.get_or_insert(session.patient().elapsed_s);
        }
        if was_dead && !session.is_dead() {
            violations.push(format!("t={}s death reversed", second + 1));
        }
        if let Some(violation) = bounds_violation(session.patient()) {
            violations.push(violation);
        }
        trace.push(session.summary());
    }

    Ok(RunSummary {
        mechanism,
        seed,
        ticks,
        died_at_s,
        cause: session.death_cause(),
        score: session.score(),
        interventions_applied: applied,
        final_vitals: session.summary(),
        baseline_survival_s: None,
        violations,
        trace,
        session,
    })
}
