use proptest::prelude::*;
use roboforge_core::{
    export::to_csv_string,
    plate::{standard_catalogue, MASTERMIX_PLATE, NAAT_DEEP_WELL_PLATE, NAAT_FLAT_PLATE},
    worklist::{generate_mastermix_worklist, NaatWorklistBuilder},
};
use roboforge_schemas::{
    experiment::{NaatExperiment, PcrPlateSize},
    mastermix::Mastermix,
    reagent::{DispenseType, LiquidType, Reagent, TipWashing},
    worklist::WorklistRow,
};
use std::collections::{BTreeMap, BTreeSet};

const SOURCES: [(&str, LiquidType); 4] = [
    ("Buffer", LiquidType::Buffer),
    ("Primer mix", LiquidType::Primers),
    ("Polymerase", LiquidType::Enzymes),
    ("Betaine", LiquidType::Organics),
];

fn reagent(id: &str, source: &str, liquid_type: LiquidType, final_c: f64, stock_c: f64) -> Reagent {
    Reagent {
        id: id.to_string(),
        source: source.to_string(),
        unit: "X".to_string(),
        final_concentration: final_c,
        stock_concentration: stock_c,
        liquid_type,
        dispense_type: DispenseType::SurfaceEmpty,
        tip_washing: TipWashing::No,
        order_index: None,
    }
}

fn water(id: &str) -> Reagent {
    reagent(id, "Water", LiquidType::Water, 0.0, 0.0)
}

fn experiment(samples: u32, replicates: u32, mastermix: f64, sample: f64) -> NaatExperiment {
    NaatExperiment {
        name_of_experimental_plan: "panel".to_string(),
        num_of_sample_concentrations: samples,
        num_of_technical_replicates: replicates,
        mastermix_volume_per_reaction: mastermix,
        sample_volume_per_reaction: sample,
        pcr_plate_size: PcrPlateSize::Wells96,
        deck_layout_id: String::new(),
        sample_liquid_type: LiquidType::Template,
    }
}

#[test]
fn one_reaction_of_buffer_and_water() {
    let mastermix = Mastermix {
        id: "mm-1".to_string(),
        name: "MM1".to_string(),
        reagents: vec![reagent("r1", "Buffer", LiquidType::Buffer, 1.0, 10.0), water("r2")],
    };
    let result = NaatWorklistBuilder::new()
        .with_experiment(experiment(1, 1, 50.0, 0.0))
        .with_mastermixes(vec![mastermix])
        .include_mixing_and_aliquoting(false)
        .build()
        .unwrap()
        .run()
        .unwrap();

    let buffer = &result.worklist[0];
    assert_eq!(buffer.volume_ul, 5.0);
    assert_eq!(buffer.tip_type, 50);
    assert_eq!(buffer.liquid_class, "RoboNAAT_tip50_buffer_SurfaceEmpty");
    let water = &result.worklist[1];
    assert_eq!(water.volume_ul, 45.0);
    assert_eq!(water.tip_type, 1000);

    assert_eq!(result.sample_worklist.len(), 1);
    let solutions: Vec<(&str, &str, f64)> = result
        .user_solutions
        .iter()
        .map(|s| (s.solution.as_str(), s.plate_well.as_str(), s.user_input))
        .collect();
    assert_eq!(
        solutions,
        vec![
            ("Buffer", "ivl_96_flat_v1_0001|1", 10.0),
            ("Water", "ivl_96_flat_v1_0001|2", 50.0),
            ("sample00", "pcr_96_0001|1", 10.0),
        ]
    );
}

#[test]
fn large_mastermix_is_built_over_three_wells() {
    // 13 x 5 x 20 uL = 1300 uL of mastermix
    let mastermix = Mastermix {
        id: "mm-1".to_string(),
        name: "MM1".to_string(),
        reagents: vec![reagent("r1", "Buffer", LiquidType::Buffer, 1.0, 10.0), water("r2")],
    };
    let rows = generate_mastermix_worklist(
        &[mastermix],
        &experiment(13, 5, 20.0, 0.0),
        &standard_catalogue(),
        true,
    )
    .unwrap();

    let buffer: Vec<&WorklistRow> = rows.iter().filter(|r| r.source == "Buffer").collect();
    assert_eq!(buffer.iter().map(|r| r.to_well).collect::<Vec<_>>(), vec![1, 2, 3]);
    let buffer_total: f64 = buffer.iter().map(|r| r.volume_ul).sum();
    assert!((buffer_total - 130.0).abs() < 1e-9);

    let water_total: f64 = rows.iter().filter(|r| r.source == "Water").map(|r| r.volume_ul).sum();
    assert!((water_total - 1170.0).abs() < 1e-9);

    let mixing: Vec<&WorklistRow> = rows.iter().filter(|r| r.source == "mixing").collect();
    assert_eq!(mixing.len(), 3);
    assert!(mixing.iter().all(|r| r.to_plate == MASTERMIX_PLATE));

    let aliquots: Vec<&WorklistRow> = rows.iter().filter(|r| r.source == "MM_aq").collect();
    assert_eq!(aliquots.len(), 65);
    let from_wells: BTreeSet<u32> = aliquots.iter().map(|r| r.from_well).collect();
    assert_eq!(from_wells, BTreeSet::from([1, 2, 3]));
}

#[test]
fn oversized_mastermix_is_spread_over_wells() {
    let mastermix = Mastermix {
        id: "mm-1".to_string(),
        name: "MM1".to_string(),
        reagents: vec![reagent("r1", "Buffer", LiquidType::Buffer, 1.0, 1.0)],
    };
    // 1 x 1 x 2400 uL, split over 4 wells of 600 uL
    let rows = generate_mastermix_worklist(
        &[mastermix],
        &experiment(1, 1, 2400.0, 0.0),
        &standard_catalogue(),
        false,
    )
    .unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.tip_type == 1000 && r.volume_ul == 600.0));
}

fn mastermix_strategy(index: usize) -> impl Strategy<Value = Mastermix> {
    prop::collection::btree_set(0usize..SOURCES.len(), 1..=SOURCES.len()).prop_flat_map(move |picked| {
        let picked: Vec<usize> = picked.into_iter().collect();
        let count = picked.len();
        (
            Just(picked),
            prop::collection::vec((1u32..=10, 10u32..=40), count),
            any::<bool>(),
        )
            .prop_map(move |(picked, concentrations, with_water)| {
                let mut reagents: Vec<Reagent> = picked
                    .iter()
                    .zip(concentrations)
                    .map(|(&source, (final_c, ratio))| {
                        let (name, liquid_type) = &SOURCES[source];
                        reagent(
                            &format!("r{source}"),
                            name,
                            liquid_type.clone(),
                            f64::from(final_c),
                            f64::from(final_c * ratio),
                        )
                    })
                    .collect();
                if with_water {
                    reagents.push(water("rw"));
                }
                Mastermix {
                    id: format!("mm-{index}"),
                    name: format!("MM{index}"),
                    reagents,
                }
            })
    })
}

fn mastermixes_strategy() -> impl Strategy<Value = Vec<Mastermix>> {
    (1usize..=4).prop_flat_map(|count| {
        (0..count)
            .map(mastermix_strategy)
            .collect::<Vec<_>>()
    })
}

fn drawn_per_source_well(rows: &[WorklistRow]) -> BTreeMap<(String, u32), f64> {
    let mut drawn: BTreeMap<(String, u32), f64> = BTreeMap::new();
    for row in rows {
        *drawn.entry((row.from_plate.clone(), row.from_well)).or_insert(0.0) += row.volume_ul;
    }
    drawn
}

fn large_experiment_strategy() -> impl Strategy<Value = NaatExperiment> {
    (1u32..=13, 1u32..=5, 5u32..=100, 0u32..=5).prop_map(|(samples, replicates, mastermix, sample)| {
        experiment(samples, replicates, f64::from(mastermix), f64::from(sample))
    })
}

fn experiment_strategy() -> impl Strategy<Value = NaatExperiment> {
    (1u32..=4, 1u32..=3, 5u32..=25, 0u32..=5).prop_map(|(samples, replicates, mastermix, sample)| {
        experiment(samples, replicates, f64::from(mastermix), f64::from(sample))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn each_source_owns_one_contiguous_block(
        mastermixes in mastermixes_strategy(),
        experiment in experiment_strategy(),
    ) {
        let rows = generate_mastermix_worklist(&mastermixes, &experiment, &standard_catalogue(), false).unwrap();

        let mut wells: BTreeMap<(String, String), BTreeSet<u32>> = BTreeMap::new();
        for row in &rows {
            wells
                .entry((row.from_plate.clone(), row.source.to_lowercase()))
                .or_default()
                .insert(row.from_well);
        }

        let mut owner_by_well: BTreeMap<(String, u32), String> = BTreeMap::new();
        for ((plate, source), used) in &wells {
            let first = *used.iter().next().unwrap();
            let last = *used.iter().next_back().unwrap();
            prop_assert_eq!((last - first + 1) as usize, used.len(), "{} has gaps on {}", source, plate);
            for &well in used {
                let previous = owner_by_well.insert((plate.clone(), well), source.clone());
                prop_assert!(previous.is_none(), "well {} on {} shared", well, plate);
            }
        }
    }

    #[test]
    fn group_numbers_step_by_one_at_each_tip_change(
        mastermixes in mastermixes_strategy(),
        experiment in experiment_strategy(),
    ) {
        let rows = generate_mastermix_worklist(&mastermixes, &experiment, &standard_catalogue(), false).unwrap();
        prop_assert_eq!(rows[0].group_number, 1);
        for pair in rows.windows(2) {
            let changed = pair[0].liquid_class != pair[1].liquid_class
                || pair[0].source.to_lowercase() != pair[1].source.to_lowercase();
            let expected = pair[0].group_number + u32::from(changed);
            prop_assert_eq!(pair[1].group_number, expected);
        }
    }

    #[test]
    fn mastermix_wells_hold_the_mastermix_volume_when_water_fills(
        mastermixes in mastermixes_strategy(),
        experiment in experiment_strategy(),
    ) {
        let rows = generate_mastermix_worklist(&mastermixes, &experiment, &standard_catalogue(), false).unwrap();
        let target = f64::from(experiment.wells_per_mastermix()) * experiment.mastermix_volume_per_reaction;
        for (index, mastermix) in mastermixes.iter().enumerate() {
            if !mastermix.reagents.iter().any(|r| r.is_water()) {
                continue;
            }
            let total: f64 = rows
                .iter()
                .filter(|r| r.to_plate == MASTERMIX_PLATE && r.to_well == index as u32 + 1)
                .map(|r| r.volume_ul)
                .sum();
            prop_assert!((total - target).abs() <= 0.1 * (mastermix.reagents.len() as f64) + 1e-6,
                "{} holds {} of {}", mastermix.name, total, target);
        }
    }

    #[test]
    fn source_wells_stay_within_their_usable_volume(
        mastermixes in mastermixes_strategy(),
        experiment in large_experiment_strategy(),
    ) {
        let catalogue = standard_catalogue();
        let rows = generate_mastermix_worklist(&mastermixes, &experiment, &catalogue, false).unwrap();
        for ((plate, well), drawn) in drawn_per_source_well(&rows) {
            let entry = catalogue.get(&plate).unwrap();
            prop_assert!(
                drawn + entry.holdover_volume_ul <= entry.well_capacity_ul + 1e-6,
                "{}|{} draws {} of {}", plate, well, drawn, entry.well_capacity_ul
            );
        }
    }

    #[test]
    fn identical_input_gives_identical_csv(
        mastermixes in mastermixes_strategy(),
        experiment in experiment_strategy(),
    ) {
        let first = generate_mastermix_worklist(&mastermixes, &experiment, &standard_catalogue(), true).unwrap();
        let second = generate_mastermix_worklist(&mastermixes, &experiment, &standard_catalogue(), true).unwrap();
        prop_assert_eq!(to_csv_string(&first).unwrap(), to_csv_string(&second).unwrap());
    }
}

#[test]
fn small_sources_share_the_flat_plate_without_overlap() {
    let mastermixes: Vec<Mastermix> = (0..2)
        .map(|i| Mastermix {
            id: format!("mm-{i}"),
            name: format!("MM{i}"),
            reagents: vec![
                reagent("p", "Primer mix", LiquidType::Primers, 1.0, 20.0),
                reagent("e", "Polymerase", LiquidType::Enzymes, 1.0, 10.0),
                water("w"),
            ],
        })
        .collect();
    let rows =
        generate_mastermix_worklist(&mastermixes, &experiment(2, 2, 20.0, 5.0), &standard_catalogue(), false)
            .unwrap();
    let layout: Vec<(&str, &str, u32)> = rows
        .iter()
        .map(|r| (r.source.as_str(), r.from_plate.as_str(), r.from_well))
        .collect();
    assert_eq!(
        layout,
        vec![
            ("Primer mix", NAAT_FLAT_PLATE, 1),
            ("Primer mix", NAAT_FLAT_PLATE, 1),
            ("Polymerase", NAAT_FLAT_PLATE, 2),
            ("Polymerase", NAAT_FLAT_PLATE, 2),
            // 130 uL of water needs two flat wells with overage
            ("Water", NAAT_FLAT_PLATE, 3),
            ("Water", NAAT_FLAT_PLATE, 4),
        ]
    );
}

#[test]
fn water_rows_never_overfill_a_deep_well() {
    // 4 x 1300 uL of water: 12 rows of ~433 uL, at most one per 700 uL well
    let mastermixes: Vec<Mastermix> = (0..4)
        .map(|i| Mastermix {
            id: format!("mm-{i}"),
            name: format!("MM{i}"),
            reagents: vec![water("w")],
        })
        .collect();
    let result = NaatWorklistBuilder::new()
        .with_experiment(experiment(13, 1, 100.0, 0.0))
        .with_mastermixes(mastermixes)
        .include_mixing_and_aliquoting(false)
        .build()
        .unwrap()
        .run()
        .unwrap();

    let drawn = drawn_per_source_well(&result.worklist);
    assert_eq!(drawn.len(), 12);
    assert!(drawn.values().all(|&volume| volume <= 700.0), "{drawn:?}");
    assert!(result
        .user_solutions
        .iter()
        .filter(|s| s.plate_well.starts_with(NAAT_DEEP_WELL_PLATE))
        .all(|s| s.user_input <= 750.0));
}
