//! Catalog of discrete interventions and their immediate effects.
//!
//! Every operation follows the same contract: a dead patient turns it into a
//! no-op, supplies are checked before anything changes, and the patient is
//! clamped back into its domains afterwards.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    ANTIBIOTIC_BONUS, BINDER_BLEED_REDUCTION, CALCIUM_DEBT_PER_ML, CRYSTALLOID_EFFICIENCY,
    CRYSTALLOID_UNIT_ML, DILUTION_THRESHOLD_ML, DRESSING_BLEED_FLOOR, EDEMA_SHUNT_MAX,
    EDEMA_SHUNT_STEP, EDEMA_THRESHOLD_ML, EPINEPHRINE_DOSE, FENTANYL_DOSE, HEMOSTATIC_BLEED_FLOOR,
    HEMOSTATIC_BLEED_REDUCTION, IRRIGATION_BLEED_REDUCTION, KETAMINE_MG_PER_KG, MIDAZOLAM_DOSE,
    NOREPI_START_LEVEL, PACKING_BLEED_FLOOR, PACKING_BLEED_REDUCTION,
    PRESSURE_DRESSING_BLEED_REDUCTION, TOURNIQUET_BLEED_FACTOR, UNNECESSARY_PROCEDURE_PENALTY,
    UNSTERILE_ATTEMPT_PENALTY, WHOLE_BLOOD_UNIT_ML, WOUND_CARE_BONUS,
};
use crate::inventory::{Inventory, Supply};
use crate::ledger::{CareCategory, ScoreLedger};
use crate::mechanism::{Ambient, Environment};
use crate::patient::{Airway, PatientState, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Antibiotic {
    Moxifloxacin,
    Ertapenem,
    Cefotetan,
}

impl Antibiotic {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Moxifloxacin => "Moxifloxacin 400 mg PO",
            Self::Ertapenem => "Ertapenem 1 g IM/IV",
            Self::Cefotetan => "Cefotetan 2 g IV",
        }
    }
}

/// A clinician action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intervention {
    Tourniquet,
    PackWound,
    PelvicBinder,
    AirwayPosition,
    NasalAirway,
    SupraglotticAirway,
    SurgicalAirway,
    SupplementalOxygen,
    BagValveMask,
    OcclusiveSeal,
    NeedleDecompression { side: Side },
    FingerThoracostomy { side: Side },
    ChestTube { side: Side },
    WholeBlood,
    Crystalloid,
    Calcium,
    Txa,
    NorepinephrineStart,
    NorepinephrineStop,
    HypothermiaKit,
    TbiBundle,
    Ketamine,
    Fentanyl,
    Midazolam,
    Epinephrine,
    Ondansetron,
    KetamineInfusion { mg_per_kg_per_h: f64 },
    KetamineInfusionStop,
    Antibiotic { drug: Antibiotic },
    WoundIrrigation,
    PressureDressing,
    HemostaticGauze,
    Reassess,
    SplintUpper,
    SplintLower,
    SlingAndSwathe,
    /// Free-form action with an instructor-assigned score delta.
    Custom { label: String, delta: i32 },
}

impl Intervention {
    /// One representative of every intervention kind.
    #[must_use]
    pub fn catalog() -> Vec<Self> {
        let mut all = vec![
            Self::Tourniquet,
            Self::PackWound,
            Self::PelvicBinder,
            Self::AirwayPosition,
            Self::NasalAirway,
            Self::SupraglotticAirway,
            Self::SurgicalAirway,
            Self::SupplementalOxygen,
            Self::BagValveMask,
            Self::OcclusiveSeal,
        ];
        for side in Side::BOTH {
            all.push(Self::NeedleDecompression { side });
            all.push(Self::FingerThoracostomy { side });
            all.push(Self::ChestTube { side });
        }
        all.extend([
            Self::WholeBlood,
            Self::Crystalloid,
            Self::Calcium,
            Self::Txa,
            Self::NorepinephrineStart,
            Self::NorepinephrineStop,
            Self::HypothermiaKit,
            Self::TbiBundle,
            Self::Ketamine,
            Self::Fentanyl,
            Self::Midazolam,
            Self::Epinephrine,
            Self::Ondansetron,
            Self::KetamineInfusion {
                mg_per_kg_per_h: 0.3,
            },
            Self::KetamineInfusionStop,
            Self::Antibiotic {
                drug: Antibiotic::Ertapenem,
            },
            Self::WoundIrrigation,
            Self::PressureDressing,
            Self::HemostaticGauze,
            Self::Reassess,
            Self::SplintUpper,
            Self::SplintLower,
            Self::SlingAndSwathe,
            Self::Custom {
                label: "IV access".to_string(),
                delta: 0,
            },
        ]);
        all
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Tourniquet => "Tourniquet".to_string(),
            Self::PackWound => "Wound packing".to_string(),
            Self::PelvicBinder => "Pelvic binder".to_string(),
            Self::AirwayPosition => "Airway positioning / jaw thrust".to_string(),
            Self::NasalAirway => "Nasopharyngeal airway".to_string(),
            Self::SupraglotticAirway => "Supraglottic airway".to_string(),
            Self::SurgicalAirway => "Surgical cricothyrotomy".to_string(),
            Self::SupplementalOxygen => "Supplemental O2".to_string(),
            Self::BagValveMask => "Bag-valve-mask ventilation".to_string(),
            Self::OcclusiveSeal => "Occlusive chest seal".to_string(),
            Self::NeedleDecompression { side } => format!("Needle decompression ({side})"),
            Self::FingerThoracostomy { side } => format!("Finger thoracostomy ({side})"),
            Self::ChestTube { side } => format!("Chest tube ({side})"),
            Self::WholeBlood => "Whole blood 250 mL".to_string(),
            Self::Crystalloid => "Crystalloid 500 mL".to_string(),
            Self::Calcium => "Calcium gluconate".to_string(),
            Self::Txa => "TXA 2 g IV".to_string(),
            Self::NorepinephrineStart => "Norepinephrine started".to_string(),
            Self::NorepinephrineStop => "Norepinephrine stopped".to_string(),
            Self::HypothermiaKit => "Hypothermia prevention kit".to_string(),
            Self::TbiBundle => "TBI bundle".to_string(),
            Self::Ketamine => "Ketamine 0.3 mg/kg IV".to_string(),
            Self::Fentanyl => "Fentanyl 50 mcg IV".to_string(),
            Self::Midazolam => "Midazolam 1 mg IV".to_string(),
            Self::Epinephrine => "Push-dose epinephrine".to_string(),
            Self::Ondansetron => "Ondansetron 4 mg IV".to_string(),
            Self::KetamineInfusion { mg_per_kg_per_h } => {
                format!("Ketamine infusion {mg_per_kg_per_h:.2} mg/kg/h")
            }
            Self::KetamineInfusionStop => "Ketamine infusion stopped".to_string(),
            Self::Antibiotic { drug } => drug.label().to_string(),
            Self::WoundIrrigation => "Wound irrigation & debridement".to_string(),
            Self::PressureDressing => "Pressure dressing".to_string(),
            Self::HemostaticGauze => "Hemostatic gauze".to_string(),
            Self::Reassess => "Reassessed bleeding & dressings".to_string(),
            Self::SplintUpper => "Upper limb splint".to_string(),
            Self::SplintLower => "Lower limb splint".to_string(),
            Self::SlingAndSwathe => "Sling & swathe".to_string(),
            Self::Custom { label, .. } => label.clone(),
        }
    }
}

impl fmt::Display for Intervention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Result reported back to the caller for every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionOutcome {
    pub applied: bool,
    pub message: String,
}

impl InterventionOutcome {
    fn applied(message: impl Into<String>) -> Self {
        Self {
            applied: true,
            message: message.into(),
        }
    }

    fn skipped(message: impl Into<String>) -> Self {
        Self {
            applied: false,
            message: message.into(),
        }
    }
}

struct Ctx<'a> {
    patient: &'a mut PatientState,
    inventory: &'a mut Inventory,
    ledger: &'a mut ScoreLedger,
    env: Environment,
}

impl Ctx<'_> {
    fn record(&mut self, category: Option<CareCategory>, label: &str) -> bool {
        self.ledger.record(self.patient.elapsed_s, category, label)
    }

    fn score(&mut self, delta: i32, reason: &str) {
        self.ledger.adjust(self.patient.elapsed_s, delta, reason);
    }

    fn out_of(&self, supply: Supply) -> InterventionOutcome {
        InterventionOutcome::skipped(format!("No {} left", supply.as_str().replace('_', " ")))
    }
}

/// Apply an intervention.
///
/// Never fails: depleted supplies, inapplicable procedures and dead patients
/// are reported through `applied: false` with an informational message.
pub fn apply(
    kind: &Intervention,
    patient: &mut PatientState,
    inventory: &mut Inventory,
    ledger: &mut ScoreLedger,
    env: Environment,
) -> InterventionOutcome {
    if patient.is_dead() {
        return InterventionOutcome::skipped(format!("{kind}: patient is deceased"));
    }
    let mut ctx = Ctx {
        patient,
        inventory,
        ledger,
        env,
    };
    let outcome = dispatch(kind, &mut ctx);
    ctx.patient.clamp();
    if outcome.applied {
        log::info!("t={}s {}", ctx.patient.elapsed_s, outcome.message);
    } else {
        log::debug!("t={}s skipped: {}", ctx.patient.elapsed_s, outcome.message);
    }
    outcome
}

fn dispatch(kind: &Intervention, ctx: &mut Ctx<'_>) -> InterventionOutcome {
    match kind {
        Intervention::Tourniquet => tourniquet(ctx),
        Intervention::PackWound => {
            reduce_bleed(ctx.patient, PACKING_BLEED_REDUCTION, PACKING_BLEED_FLOOR);
            ctx.record(None, "Wound packed");
            InterventionOutcome::applied("Wound packed & pressure dressing")
        }
        Intervention::PelvicBinder => {
            if !ctx.inventory.try_consume(Supply::PelvicBinder) {
                return ctx.out_of(Supply::PelvicBinder);
            }
            reduce_bleed(ctx.patient, BINDER_BLEED_REDUCTION, PACKING_BLEED_FLOOR);
            ctx.patient.pelvic_binder_on = true;
            ctx.record(None, "Pelvic binder");
            InterventionOutcome::applied("Pelvic binder applied")
        }
        Intervention::AirwayPosition => airway(ctx, None, Airway::Adjunct, kind),
        Intervention::NasalAirway => airway(ctx, Some(Supply::NasalAirway), Airway::Adjunct, kind),
        Intervention::SupraglotticAirway => {
            airway(ctx, Some(Supply::SupraglotticAirway), Airway::Secured, kind)
        }
        Intervention::SurgicalAirway => airway(ctx, None, Airway::Secured, kind),
        Intervention::SupplementalOxygen => {
            ctx.patient.o2_on = true;
            ctx.patient.fio2 = ctx.patient.fio2.max(0.5);
            ctx.record(Some(CareCategory::AirwayAdjunct), &kind.label());
            InterventionOutcome::applied("Supplemental O2 (FiO2 ~0.5)")
        }
        Intervention::BagValveMask => {
            ctx.patient.vent_support = true;
            ctx.patient.fio2 = 1.0;
            ctx.record(Some(CareCategory::AirwayAdjunct), &kind.label());
            InterventionOutcome::applied("BVM support with EtCO2 target 35-40")
        }
        Intervention::OcclusiveSeal => {
            if !ctx.inventory.try_consume(Supply::OcclusiveSeal) {
                return ctx.out_of(Supply::OcclusiveSeal);
            }
            ctx.patient.chest.left.open = false;
            ctx.patient.chest.right.open = false;
            ctx.record(Some(CareCategory::ChestCare), &kind.label());
            InterventionOutcome::applied("Occlusive seal applied (bilateral)")
        }
        Intervention::NeedleDecompression { side } => needle_decompression(ctx, *side, kind),
        Intervention::FingerThoracostomy { side } => {
            let hemithorax = ctx.patient.chest.side_mut(*side);
            hemithorax.decompress();
            hemithorax.drained = true;
            ctx.record(Some(CareCategory::ChestCare), &kind.label());
            InterventionOutcome::applied(format!("Finger thoracostomy ({side})"))
        }
        Intervention::ChestTube { side } => chest_tube(ctx, *side, kind),
        Intervention::WholeBlood => whole_blood(ctx, WHOLE_BLOOD_UNIT_ML),
        Intervention::Crystalloid => crystalloid(ctx, CRYSTALLOID_UNIT_ML),
        Intervention::Calcium => {
            if !ctx.inventory.try_consume(Supply::Calcium) {
                return ctx.out_of(Supply::Calcium);
            }
            ctx.patient.calcium_given = true;
            ctx.patient.calcium_debt = (ctx.patient.calcium_debt - 1.0).max(0.0);
            ctx.record(Some(CareCategory::Calcium), &kind.label());
            InterventionOutcome::applied("Calcium gluconate given")
        }
        Intervention::Txa => {
            if !ctx.inventory.try_consume(Supply::Txa) {
                return ctx.out_of(Supply::Txa);
            }
            ctx.patient.txa_given_at_s = Some(ctx.patient.elapsed_s);
            ctx.patient.txa_active = true;
            ctx.record(Some(CareCategory::Txa), &kind.label());
            InterventionOutcome::applied("TXA 2 g IV (3 h window)")
        }
        Intervention::NorepinephrineStart => {
            if !ctx.inventory.try_consume(Supply::Norepinephrine) {
                return ctx.out_of(Supply::Norepinephrine);
            }
            ctx.patient.drugs.norepinephrine = NOREPI_START_LEVEL;
            ctx.record(None, &kind.label());
            InterventionOutcome::applied("Norepinephrine started (level 2)")
        }
        Intervention::NorepinephrineStop => {
            ctx.patient.drugs.norepinephrine = 0.0;
            ctx.record(None, &kind.label());
            InterventionOutcome::applied("Norepinephrine stopped")
        }
        Intervention::HypothermiaKit => {
            if !ctx.inventory.try_consume(Supply::HypothermiaKit) {
                return ctx.out_of(Supply::HypothermiaKit);
            }
            ctx.patient.hypothermia_kit = true;
            if ctx.env.ambient == Ambient::Cold {
                ctx.patient.core_temp_c = ctx.patient.core_temp_c.max(35.0);
            }
            ctx.record(None, &kind.label());
            InterventionOutcome::applied("Hypothermia prevention kit applied")
        }
        Intervention::TbiBundle => {
            ctx.patient.tbi = true;
            ctx.record(None, &kind.label());
            InterventionOutcome::applied("TBI bundle: SBP >= 100, EtCO2 35-40, head elevated")
        }
        Intervention::Ketamine => {
            ctx.patient.drugs.ketamine += KETAMINE_MG_PER_KG * ctx.patient.mass_kg;
            ctx.patient.pain = (ctx.patient.pain - 3.0).max(0.0);
            drug(ctx, kind)
        }
        Intervention::Fentanyl => {
            ctx.patient.drugs.fentanyl += FENTANYL_DOSE;
            ctx.patient.pain = (ctx.patient.pain - 2.0).max(0.0);
            drug(ctx, kind)
        }
        Intervention::Midazolam => {
            ctx.patient.drugs.midazolam += MIDAZOLAM_DOSE;
            drug(ctx, kind)
        }
        Intervention::Epinephrine => {
            ctx.patient.drugs.epinephrine += EPINEPHRINE_DOSE;
            drug(ctx, kind)
        }
        Intervention::Ondansetron => drug(ctx, kind),
        Intervention::KetamineInfusion { mg_per_kg_per_h } => {
            let rate = if mg_per_kg_per_h.is_finite() {
                mg_per_kg_per_h.clamp(0.0, 5.0)
            } else {
                0.0
            };
            ctx.patient.ketamine_infusion = rate * ctx.patient.mass_kg / 3600.0;
            ctx.record(None, &kind.label());
            InterventionOutcome::applied(format!("Ketamine infusion {rate:.2} mg/kg/h"))
        }
        Intervention::KetamineInfusionStop => {
            ctx.patient.ketamine_infusion = 0.0;
            ctx.record(None, &kind.label());
            InterventionOutcome::applied("Ketamine infusion stopped")
        }
        Intervention::Antibiotic { drug } => {
            if ctx.record(Some(CareCategory::Antibiotics), drug.label()) {
                ctx.score(ANTIBIOTIC_BONUS, "Early antibiotics");
            }
            InterventionOutcome::applied(format!("Antibiotic given: {}", drug.label()))
        }
        Intervention::WoundIrrigation => {
            reduce_bleed(ctx.patient, IRRIGATION_BLEED_REDUCTION, DRESSING_BLEED_FLOOR);
            ctx.record(None, &kind.label());
            ctx.score(WOUND_CARE_BONUS, "Good wound care");
            InterventionOutcome::applied("Wound irrigated & debrided")
        }
        Intervention::PressureDressing => {
            reduce_bleed(ctx.patient, PRESSURE_DRESSING_BLEED_REDUCTION, DRESSING_BLEED_FLOOR);
            ctx.record(None, &kind.label());
            InterventionOutcome::applied("Pressure dressing applied")
        }
        Intervention::HemostaticGauze => {
            reduce_bleed(ctx.patient, HEMOSTATIC_BLEED_REDUCTION, HEMOSTATIC_BLEED_FLOOR);
            ctx.record(None, &kind.label());
            ctx.score(WOUND_CARE_BONUS, "Hemostatic use");
            InterventionOutcome::applied("Hemostatic gauze placed")
        }
        Intervention::Reassess => {
            ctx.record(None, &kind.label());
            InterventionOutcome::applied("Reassessed bleeding & dressings, no major changes")
        }
        Intervention::SplintUpper => splint(ctx, 1.5, 0.5, kind),
        Intervention::SplintLower => splint(ctx, 2.0, 0.8, kind),
        Intervention::SlingAndSwathe => splint(ctx, 1.0, 0.0, kind),
        Intervention::Custom { label, delta } => {
            ctx.record(None, label);
            if *delta != 0 {
                ctx.score(*delta, label);
            }
            InterventionOutcome::applied(label.clone())
        }
    }
}

/// Lower the bleed rate without crossing `floor`. Rates already at or below the
/// floor are left alone.
fn reduce_bleed(patient: &mut PatientState, reduction: f64, floor: f64) {
    if patient.bleed_rate > floor {
        patient.bleed_rate = (patient.bleed_rate - reduction).max(floor);
    }
}

fn tourniquet(ctx: &mut Ctx<'_>) -> InterventionOutcome {
    if !ctx.patient.external_bleed {
        return InterventionOutcome::skipped("Tourniquet: no external limb hemorrhage");
    }
    if !ctx.inventory.try_consume(Supply::Tourniquet) {
        return ctx.out_of(Supply::Tourniquet);
    }
    ctx.patient.bleed_rate *= TOURNIQUET_BLEED_FACTOR;
    ctx.patient.external_bleed = false;
    ctx.record(Some(CareCategory::Tourniquet), "Tourniquet");
    InterventionOutcome::applied("Tourniquet applied (external bleed controlled)")
}

fn airway(
    ctx: &mut Ctx<'_>,
    supply: Option<Supply>,
    level: Airway,
    kind: &Intervention,
) -> InterventionOutcome {
    if let Some(supply) = supply
        && !ctx.inventory.try_consume(supply)
    {
        return ctx.out_of(supply);
    }
    // Never downgrade a secured airway.
    if ctx.patient.airway != Airway::Secured {
        ctx.patient.airway = level;
    }
    let label = kind.label();
    ctx.record(Some(CareCategory::AirwayAdjunct), &label);
    InterventionOutcome::applied(label)
}

fn needle_decompression(ctx: &mut Ctx<'_>, side: Side, kind: &Intervention) -> InterventionOutcome {
    if !ctx.inventory.try_consume(Supply::DecompressionNeedle) {
        return ctx.out_of(Supply::DecompressionNeedle);
    }
    if ctx.patient.chest.side_mut(side).decompress() {
        ctx.record(Some(CareCategory::ChestCare), &kind.label());
        InterventionOutcome::applied(format!("Needle decompression successful ({side})"))
    } else {
        ctx.record(None, &kind.label());
        ctx.score(UNNECESSARY_PROCEDURE_PENALTY, "Unnecessary needle decompression");
        InterventionOutcome::applied(format!("Needle decompression ({side}) placed with no tension"))
    }
}

fn chest_tube(ctx: &mut Ctx<'_>, side: Side, kind: &Intervention) -> InterventionOutcome {
    if !ctx
        .inventory
        .try_consume_all(&[Supply::ChestTubeKit, Supply::SterileField])
    {
        ctx.score(
            UNSTERILE_ATTEMPT_PENALTY,
            "Attempted chest tube without sterile setup",
        );
        return InterventionOutcome::skipped("Chest tube needs a tube kit and a sterile field");
    }
    let hemithorax = ctx.patient.chest.side_mut(side);
    hemithorax.decompress();
    hemithorax.drained = true;
    hemithorax.tubed = true;
    ctx.record(Some(CareCategory::ChestCare), &kind.label());
    InterventionOutcome::applied(format!("Chest tube inserted ({side}), sterile"))
}

fn whole_blood(ctx: &mut Ctx<'_>, ml: f64) -> InterventionOutcome {
    if !ctx.inventory.try_consume(Supply::WholeBlood) {
        return ctx.out_of(Supply::WholeBlood);
    }
    let patient = &mut *ctx.patient;
    patient.volume_fraction += ml / patient.nominal_blood_volume_ml();
    patient.coag_index -= 0.05;
    patient.base_deficit -= 0.6;
    patient.lactate -= 0.3;
    patient.map += 3.0;
    patient.calcium_debt += ml * CALCIUM_DEBT_PER_ML;
    patient.transfused_ml += ml;
    let remind = !patient.calcium_given;
    ctx.record(Some(CareCategory::Blood), "Whole blood 250 mL");
    if remind {
        InterventionOutcome::applied(format!(
            "Whole blood {ml:.0} mL (give calcium after blood)"
        ))
    } else {
        InterventionOutcome::applied(format!("Whole blood {ml:.0} mL"))
    }
}

fn crystalloid(ctx: &mut Ctx<'_>, ml: f64) -> InterventionOutcome {
    if !ctx.inventory.try_consume(Supply::Crystalloid) {
        return ctx.out_of(Supply::Crystalloid);
    }
    let patient = &mut *ctx.patient;
    patient.volume_fraction += CRYSTALLOID_EFFICIENCY * ml / patient.nominal_blood_volume_ml();
    patient.map += 1.5;
    patient.crystalloid_ml += ml;
    let mut message = format!("Crystalloid {ml:.0} mL");
    if patient.crystalloid_ml > DILUTION_THRESHOLD_ML {
        patient.bleed_rate += 0.01;
        patient.coag_index += 0.05;
        message.push_str("; dilutional coagulopathy risk up");
    }
    if patient.crystalloid_ml > EDEMA_THRESHOLD_ML {
        patient.edema_shunt = (patient.edema_shunt + EDEMA_SHUNT_STEP).min(EDEMA_SHUNT_MAX);
        message.push_str("; pulmonary edema risk up");
    }
    ctx.record(None, "Crystalloid 500 mL");
    InterventionOutcome::applied(message)
}

fn drug(ctx: &mut Ctx<'_>, kind: &Intervention) -> InterventionOutcome {
    let label = kind.label();
    ctx.record(None, &label);
    InterventionOutcome::applied(label)
}

fn splint(ctx: &mut Ctx<'_>, pain_relief: f64, map_bump: f64, kind: &Intervention) -> InterventionOutcome {
    ctx.patient.pain = (ctx.patient.pain - pain_relief).max(0.0);
    ctx.patient.map += map_bump;
    let label = kind.label();
    ctx.record(None, &label);
    InterventionOutcome::applied(format!("{label} applied"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanism::Mechanism;

    fn env() -> Environment {
        Environment::new(Mechanism::Blast, Ambient::Temperate)
    }

    fn run(kind: &Intervention, patient: &mut PatientState, bag: &mut Inventory) -> InterventionOutcome {
        let mut ledger = ScoreLedger::new();
        apply(kind, patient, bag, &mut ledger, env())
    }

    #[test]
    fn tourniquet_controls_external_bleed() {
        let mut patient = PatientState {
            external_bleed: true,
            bleed_rate: 0.03,
            ..PatientState::default()
        };
        let mut bag = Inventory::standard();
        let outcome = run(&Intervention::Tourniquet, &mut patient, &mut bag);
        assert!(outcome.applied);
        assert!((patient.bleed_rate - 0.006).abs() < 1e-12);
        assert!(!patient.external_bleed);
        assert_eq!(bag.count(Supply::Tourniquet), 1);
    }

    #[test]
    fn tourniquet_without_limb_bleed_is_not_charged() {
        let mut patient = PatientState::default();
        let mut bag = Inventory::standard();
        let outcome = run(&Intervention::Tourniquet, &mut patient, &mut bag);
        assert!(!outcome.applied);
        assert_eq!(bag.count(Supply::Tourniquet), 2);
    }

    #[test]
    fn depleted_supply_reports_not_applied() {
        let mut patient = PatientState::default();
        let mut bag = Inventory::empty();
        for kind in [
            Intervention::WholeBlood,
            Intervention::Crystalloid,
            Intervention::Calcium,
            Intervention::Txa,
            Intervention::OcclusiveSeal,
            Intervention::NasalAirway,
            Intervention::NeedleDecompression { side: Side::Left },
            Intervention::NorepinephrineStart,
        ] {
            let before = patient.clone();
            let outcome = run(&kind, &mut patient, &mut bag);
            assert!(!outcome.applied, "{kind} should be skipped");
            assert_eq!(patient, before, "{kind} must not touch the patient");
        }
    }

    #[test]
    fn blood_then_calcium_settles_debt() {
        let mut patient = PatientState::default();
        let mut bag = Inventory::standard();
        let mut ledger = ScoreLedger::new();
        apply(&Intervention::WholeBlood, &mut patient, &mut bag, &mut ledger, env());
        assert!((patient.calcium_debt - 0.5).abs() < 1e-12);
        assert!((patient.volume_fraction - (0.80 + 250.0 / 5600.0)).abs() < 1e-12);
        apply(&Intervention::Calcium, &mut patient, &mut bag, &mut ledger, env());
        assert!(patient.calcium_debt.abs() < f64::EPSILON);
        assert!(ledger.has(CareCategory::Blood) && ledger.has(CareCategory::Calcium));
    }

    #[test]
    fn crystalloid_past_thresholds_dilutes_and_floods() {
        let mut patient = PatientState::default();
        let mut bag = Inventory::empty();
        bag.set(Supply::Crystalloid, 5);
        for _ in 0..2 {
            run(&Intervention::Crystalloid, &mut patient, &mut bag);
        }
        assert!((patient.bleed_rate - 0.02).abs() < 1e-12);
        run(&Intervention::Crystalloid, &mut patient, &mut bag);
        assert!((patient.bleed_rate - 0.03).abs() < 1e-12);
        assert!(patient.edema_shunt.abs() < f64::EPSILON);
        run(&Intervention::Crystalloid, &mut patient, &mut bag);
        run(&Intervention::Crystalloid, &mut patient, &mut bag);
        assert!((patient.edema_shunt - 0.03).abs() < 1e-12);
    }

    #[test]
    fn unnecessary_needle_costs_a_point() {
        let mut patient = PatientState::default();
        let mut bag = Inventory::standard();
        let mut ledger = ScoreLedger::new();
        let kind = Intervention::NeedleDecompression { side: Side::Right };
        apply(&kind, &mut patient, &mut bag, &mut ledger, env());
        assert_eq!(ledger.score(), -1);
        assert!(!ledger.has(CareCategory::ChestCare));
        assert_eq!(bag.count(Supply::DecompressionNeedle), 1);
    }

    #[test]
    fn chest_tube_requires_sterile_field() {
        let mut patient = PatientState::default();
        patient.chest.left.open = true;
        patient.chest.left.develop_tension(0);
        let mut bag = Inventory::empty();
        bag.set(Supply::ChestTubeKit, 1);
        let mut ledger = ScoreLedger::new();
        let kind = Intervention::ChestTube { side: Side::Left };
        let outcome = apply(&kind, &mut patient, &mut bag, &mut ledger, env());
        assert!(!outcome.applied);
        assert!(patient.chest.left.tension);
        assert_eq!(ledger.score(), -1);

        bag.set(Supply::SterileField, 1);
        let outcome = apply(&kind, &mut patient, &mut bag, &mut ledger, env());
        assert!(outcome.applied);
        let left = patient.chest.left;
        assert!(!left.tension && left.drained && left.tubed);
        assert_eq!(bag.total_units(), 0);
    }

    #[test]
    fn wound_care_respects_floors() {
        let mut patient = PatientState {
            bleed_rate: 0.004,
            ..PatientState::default()
        };
        let mut bag = Inventory::standard();
        run(&Intervention::HemostaticGauze, &mut patient, &mut bag);
        assert!((patient.bleed_rate - 0.0012).abs() < 1e-12);
        run(&Intervention::PressureDressing, &mut patient, &mut bag);
        assert!((patient.bleed_rate - 0.0012).abs() < 1e-12);
    }

    #[test]
    fn antibiotic_bonus_only_first_time() {
        let mut patient = PatientState::default();
        let mut bag = Inventory::standard();
        let mut ledger = ScoreLedger::new();
        let kind = Intervention::Antibiotic {
            drug: Antibiotic::Moxifloxacin,
        };
        apply(&kind, &mut patient, &mut bag, &mut ledger, env());
        apply(&kind, &mut patient, &mut bag, &mut ledger, env());
        assert_eq!(ledger.score(), 1);
        assert_eq!(ledger.actions().len(), 2);
    }

    #[test]
    fn dead_patient_ignores_everything() {
        let mut patient = PatientState::default();
        patient.death.dead = true;
        let mut bag = Inventory::standard();
        let mut ledger = ScoreLedger::new();
        for kind in Intervention::catalog() {
            let outcome = apply(&kind, &mut patient, &mut bag, &mut ledger, env());
            assert!(!outcome.applied);
        }
        assert_eq!(bag, Inventory::standard());
        assert_eq!(ledger, ScoreLedger::new());
    }

    #[test]
    fn secured_airway_is_not_downgraded() {
        let mut patient = PatientState::default();
        let mut bag = Inventory::standard();
        run(&Intervention::SurgicalAirway, &mut patient, &mut bag);
        run(&Intervention::AirwayPosition, &mut patient, &mut bag);
        assert_eq!(patient.airway, Airway::Secured);
    }

    #[test]
    fn ketamine_scales_with_mass_and_relieves_pain() {
        let mut patient = PatientState::default();
        let mut bag = Inventory::standard();
        run(&Intervention::Ketamine, &mut patient, &mut bag);
        assert!((patient.drugs.ketamine - 24.0).abs() < 1e-9);
        assert!((patient.pain - 5.0).abs() < 1e-9);
    }

    #[test]
    fn hypothermia_kit_rewarms_only_in_cold() {
        let mut patient = PatientState {
            core_temp_c: 34.0,
            ..PatientState::default()
        };
        let mut bag = Inventory::standard();
        let mut ledger = ScoreLedger::new();
        let cold = Environment::new(Mechanism::Mvc, Ambient::Cold);
        apply(&Intervention::HypothermiaKit, &mut patient, &mut bag, &mut ledger, cold);
        assert!((patient.core_temp_c - 35.0).abs() < f64::EPSILON);
        assert!(patient.hypothermia_kit);
    }
}
