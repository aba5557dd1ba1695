use proptest::prelude::*;
use roboforge_core::{
    liquid_class::TipSize,
    volume::{
        distribute_across_wells, round_to_tenth, split_across_wells, split_for_tip,
        water_fill_volume,
    },
};
use roboforge_schemas::reagent::{DispenseType, LiquidType};

fn tip_capacity() -> impl Strategy<Value = f64> {
    prop_oneof![Just(50.0), Just(300.0), Just(1000.0)]
}

proptest! {
    #[test]
    fn well_shares_reconstruct_the_rounded_total(wells in 1u32..=12, per_well in 1.0f64..600.0) {
        let exact = per_well * f64::from(wells);
        let shares = split_across_wells(wells, exact).unwrap();
        prop_assert_eq!(shares.len(), wells as usize);
        let sum: f64 = shares.iter().sum();
        prop_assert!((sum - round_to_tenth(exact)).abs() < 1e-6, "sum {} vs {}", sum, exact);
        prop_assert!(shares.iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn tip_split_conserves_volume(volume in 0.1f64..5000.0, tip in tip_capacity()) {
        let parts = split_for_tip(volume, tip).unwrap();
        let sum: f64 = parts.iter().sum();
        prop_assert!((sum - volume).abs() <= 0.1 + 1e-9, "sum {} vs {}", sum, volume);
        if volume >= tip {
            prop_assert_eq!(parts.len(), (volume / tip).ceil() as usize);
        } else {
            prop_assert_eq!(parts, vec![volume]);
        }
    }

    #[test]
    fn water_tops_up_to_the_mastermix_volume(mastermix in 10.0f64..3000.0, fraction in 0.0f64..1.0) {
        let others = round_to_tenth(mastermix * fraction);
        prop_assume!(others <= mastermix);
        let water = water_fill_volume(mastermix, others).unwrap();
        prop_assert!(water >= 0.0);
        prop_assert!((water + others - mastermix).abs() <= 0.1 + 1e-9);
    }

    #[test]
    fn distributed_steps_pick_a_tip_that_fits_or_split(
        wells in 1u32..=4,
        total in 100.0f64..2400.0,
        final_c in 0.1f64..10.0,
        ratio in 1.0f64..20.0,
    ) {
        let steps = distribute_across_wells(
            wells,
            total,
            final_c,
            final_c * ratio,
            &LiquidType::Buffer,
            DispenseType::JetEmpty,
        )
        .unwrap();
        for step in &steps {
            prop_assert!(step.well_index < wells);
            let expected = TipSize::smallest_for(step.volume_ul);
            prop_assert!(step.tip >= expected || step.tip == TipSize::largest());
        }
        let sum: f64 = steps.iter().map(|s| s.volume_ul).sum();
        let exact = total * final_c / (final_c * ratio);
        prop_assert!((sum - round_to_tenth(exact)).abs() <= 0.1 * f64::from(wells) + 1e-6);
    }
}

#[test]
fn thirteen_hundred_microlitres_need_three_wells() {
    let wells = roboforge_core::volume::number_of_wells_required(1300.0);
    assert_eq!(wells, 3);
    let shares = split_across_wells(wells, 1300.0).unwrap();
    assert_eq!(shares.len(), 3);
    assert!((shares.iter().sum::<f64>() - 1300.0).abs() < 1e-9);
}
