//! Default seed menus and efficiency definitions.

use crate::dedup::PtHypothesis;
use crate::trigger::{
    Bound, DoubleMuSeed, EfficiencyDefinition, EtaWindow, QualitySet, SingleMuSeed,
    TriggerCondition,
};

pub const DOUBLE_MU_15_7: &str = "L1_DoubleMu_15_7";
pub const DOUBLE_MU_15_7_UPT: &str = "L1_DoubleMu_15_7_UPT";
pub const DOUBLE_MU_15_7_UPT_BMTF: &str = "L1_DoubleMu_15_7_UPT_BMTF";
pub const DOUBLE_MU_15_7_UPT_DXY1: &str = "L1_DoubleMu_15_7_UPT_DXY1";
pub const DOUBLE_MU_0_ER1P5_SQ_OS_DR_MAX1P4: &str = "L1_DoubleMu0er1p5_SQ_OS_dR_Max1p4";
pub const DOUBLE_MU_4P5_SQ_OS_DR_MAX1P2: &str = "L1_DoubleMu4p5_SQ_OS_dR_Max1p2";

pub const BASELINE: &str = "Baseline Run 2";
pub const EXTENDED: &str = "Extended Run 2";

fn single(name: &str, pt_min: f64, eta: EtaWindow) -> TriggerCondition {
    TriggerCondition::single(
        name,
        SingleMuSeed {
            pt_min,
            pt: PtHypothesis::VertexConstrained,
            quality: QualitySet::single(),
            eta,
        },
    )
}

/// Double seed skeleton: vertex pT, no η/charge/ΔR/mass/dxy cuts.
fn double(leading_pt_min: f64, subleading_pt_min: f64, quality: QualitySet) -> DoubleMuSeed {
    DoubleMuSeed {
        leading_pt_min,
        subleading_pt_min,
        pt: PtHypothesis::VertexConstrained,
        quality,
        eta: EtaWindow::any(),
        opposite_sign: false,
        max_delta_r: None,
        min_mass: None,
        min_dxy: None,
    }
}

/// Seeds used in the zero-bias rate study, in report order.
pub fn rate_menu() -> Vec<TriggerCondition> {
    let sq = QualitySet::single;
    let dq = QualitySet::double;
    vec![
        single("L1_SingleMu7", 7.0, EtaWindow::any()),
        single("L1_SingleMu22", 22.0, EtaWindow::any()),
        single("L1_SingleMu22_BMTF", 22.0, EtaWindow::up_to(0.8)),
        single(
            "L1_SingleMu22_OMTF",
            22.0,
            EtaWindow::new(Bound::exclusive(0.8), Bound::inclusive(1.245)),
        ),
        single(
            "L1_SingleMu22_EMTF",
            22.0,
            EtaWindow::new(Bound::exclusive(1.245), Bound::exclusive(2.45)),
        ),
        single("L1_SingleMu25", 25.0, EtaWindow::any()),
        single("L1_SingleMu18er1p5", 18.0, EtaWindow::up_to(1.5062)),
        TriggerCondition::double("L1_DoubleMu0_SQ", double(0.0, 0.0, sq())),
        TriggerCondition::double(
            "L1_DoubleMu0_SQ_OS",
            DoubleMuSeed { opposite_sign: true, ..double(0.0, 0.0, sq()) },
        ),
        TriggerCondition::double("L1_DoubleMu_15_5_SQ", double(15.0, 5.0, sq())),
        TriggerCondition::double("L1_DoubleMu15_7", double(15.0, 7.0, dq())),
        TriggerCondition::double(
            "L1_DoubleMu18_er2p1",
            DoubleMuSeed { eta: EtaWindow::up_to(2.104), ..double(18.0, 18.0, sq()) },
        ),
        TriggerCondition::double(
            "L1_DoubleMu0er1p5_SQ",
            DoubleMuSeed { eta: EtaWindow::up_to(1.506), ..double(0.0, 0.0, sq()) },
        ),
        TriggerCondition::double(
            "L1_DoubleMu0er1p5_SQ_OS",
            DoubleMuSeed {
                eta: EtaWindow::up_to(1.506),
                opposite_sign: true,
                ..double(0.0, 0.0, sq())
            },
        ),
        TriggerCondition::double(
            "L1_DoubleMu0er1p5_SQ_dR_Max1p4",
            DoubleMuSeed {
                eta: EtaWindow::up_to(1.5),
                max_delta_r: Some(1.4),
                ..double(0.0, 0.0, sq())
            },
        ),
        TriggerCondition::double(
            "L1_DoubleMu0er1p5_SQ_OS_dR_Max1p4",
            DoubleMuSeed {
                eta: EtaWindow::up_to(1.5),
                opposite_sign: true,
                max_delta_r: Some(1.4),
                ..double(0.0, 0.0, sq())
            },
        ),
        TriggerCondition::double(
            "L1_DoubleMu4_SQ_OS",
            DoubleMuSeed { opposite_sign: true, ..double(4.0, 4.0, sq()) },
        ),
        TriggerCondition::double(
            "L1_DoubleMu4p5_SQ_OS_dR_Max1p2",
            DoubleMuSeed {
                opposite_sign: true,
                max_delta_r: Some(1.2),
                ..double(4.5, 4.5, sq())
            },
        ),
        TriggerCondition::double(
            "L1_DoubleMu4p5er2p0_SQ_OS",
            DoubleMuSeed {
                eta: EtaWindow::up_to(2.006),
                opposite_sign: true,
                ..double(4.5, 4.5, sq())
            },
        ),
        TriggerCondition::double(
            "L1_DoubleMu4p5er2p0_SQ_OS_Mass_Min7",
            DoubleMuSeed {
                eta: EtaWindow::up_to(2.006),
                opposite_sign: true,
                min_mass: Some(7.0),
                ..double(4.5, 4.5, sq())
            },
        ),
        TriggerCondition::double(
            "L1_DoubleMu15_7_BMTF",
            DoubleMuSeed { eta: EtaWindow::below(0.8), ..double(15.0, 7.0, dq()) },
        ),
        TriggerCondition::double(
            "L1_DoubleMu15_7_BMTF_UPT",
            DoubleMuSeed {
                pt: PtHypothesis::Unconstrained,
                eta: EtaWindow::below(0.8),
                ..double(15.0, 7.0, dq())
            },
        ),
    ]
}

/// Seeds evaluated on matched signal dimuons.
pub fn efficiency_menu() -> Vec<TriggerCondition> {
    let upt = |seed: DoubleMuSeed| DoubleMuSeed { pt: PtHypothesis::Unconstrained, ..seed };
    vec![
        TriggerCondition::double(DOUBLE_MU_15_7, double(15.0, 7.0, QualitySet::double())),
        TriggerCondition::double(
            DOUBLE_MU_15_7_UPT,
            upt(double(15.0, 7.0, QualitySet::double())),
        ),
        TriggerCondition::double(
            DOUBLE_MU_15_7_UPT_BMTF,
            DoubleMuSeed {
                eta: EtaWindow::up_to(0.8),
                ..upt(double(15.0, 7.0, QualitySet::double()))
            },
        ),
        TriggerCondition::double(
            DOUBLE_MU_15_7_UPT_DXY1,
            DoubleMuSeed {
                min_dxy: Some(1.0),
                ..upt(double(15.0, 7.0, QualitySet::double()))
            },
        ),
        TriggerCondition::double(
            DOUBLE_MU_0_ER1P5_SQ_OS_DR_MAX1P4,
            DoubleMuSeed {
                eta: EtaWindow::up_to(1.506),
                opposite_sign: true,
                max_delta_r: Some(1.4),
                ..double(0.0, 0.0, QualitySet::single())
            },
        ),
        TriggerCondition::double(
            DOUBLE_MU_4P5_SQ_OS_DR_MAX1P2,
            DoubleMuSeed {
                opposite_sign: true,
                max_delta_r: Some(1.2),
                ..double(4.5, 4.5, QualitySet::single())
            },
        ),
    ]
}

/// OR-composites reported by the efficiency study, in report order.
pub fn efficiency_definitions() -> Vec<EfficiencyDefinition> {
    let extended = [
        DOUBLE_MU_15_7,
        DOUBLE_MU_0_ER1P5_SQ_OS_DR_MAX1P4,
        DOUBLE_MU_4P5_SQ_OS_DR_MAX1P2,
    ];
    let with = |extra: &'static str| {
        let mut names = extended.to_vec();
        names.push(extra);
        names
    };
    vec![
        EfficiencyDefinition::new(BASELINE, &[DOUBLE_MU_15_7]),
        EfficiencyDefinition::new(EXTENDED, &extended),
        EfficiencyDefinition::new(
            "Extended Run 2A",
            &[DOUBLE_MU_15_7, DOUBLE_MU_0_ER1P5_SQ_OS_DR_MAX1P4],
        ),
        EfficiencyDefinition::new(
            "Extended Run 2B",
            &[DOUBLE_MU_15_7, DOUBLE_MU_4P5_SQ_OS_DR_MAX1P2],
        ),
        EfficiencyDefinition::new(
            "Baseline + UPT BMTF",
            &[DOUBLE_MU_15_7, DOUBLE_MU_15_7_UPT_BMTF],
        ),
        EfficiencyDefinition::new("Baseline + UPT", &[DOUBLE_MU_15_7, DOUBLE_MU_15_7_UPT]),
        EfficiencyDefinition::new(
            "Baseline + UPT DXY1",
            &[DOUBLE_MU_15_7, DOUBLE_MU_15_7_UPT_DXY1],
        ),
        EfficiencyDefinition::new("Extended + UPT DXY1", &with(DOUBLE_MU_15_7_UPT_DXY1)),
        EfficiencyDefinition::new("Extended + UPT", &with(DOUBLE_MU_15_7_UPT)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_menu_names_are_unique() {
        for menu in [rate_menu(), efficiency_menu()] {
            let names: BTreeSet<&str> = menu.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names.len(), menu.len());
        }
    }

    #[test]
    fn test_rate_menu_shape() {
        let menu = rate_menu();
        assert_eq!(menu.len(), 22);
        assert_eq!(menu.iter().filter(|c| c.is_single()).count(), 7);
        assert_eq!(menu[0].name, "L1_SingleMu7");
        assert_eq!(menu[21].name, "L1_DoubleMu15_7_BMTF_UPT");
    }

    #[test]
    fn test_definitions_reference_efficiency_menu() {
        let names: BTreeSet<String> = efficiency_menu().into_iter().map(|c| c.name).collect();
        let definitions = efficiency_definitions();
        assert_eq!(definitions.len(), 9);
        for def in &definitions {
            for condition in &def.any_of {
                assert!(names.contains(condition), "{} -> {}", def.name, condition);
            }
        }
        assert_eq!(definitions[0].name, BASELINE);
        assert_eq!(definitions[1].name, EXTENDED);
    }
}
