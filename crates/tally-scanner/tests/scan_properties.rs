//! Property tests: the result never depends on how the tree is traversed.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use regex::Regex;
use tally_core::TraversalOrder;
use tally_scanner::{ScanConfig, Scanner};

fn arb_order() -> impl Strategy<Value = TraversalOrder> {
    prop_oneof![
        Just(TraversalOrder::Listed),
        Just(TraversalOrder::Sorted),
        any::<u64>().prop_map(|seed| TraversalOrder::Shuffled { seed }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn result_is_independent_of_order_and_parallelism(
        fixture_seed in any::<u64>(),
        order in arb_order(),
        parallel in any::<bool>(),
        threads in proptest::option::of(1usize..=4),
    ) {
        let mut rng = StdRng::seed_from_u64(fixture_seed);
        let pattern = Regex::new("[a-m][0-9]").unwrap();
        let fixture = tally_fixture::generate(&pattern, &mut rng).unwrap();

        let config = ScanConfig::new(fixture.root())
            .with_order(order)
            .with_parallel(parallel)
            .with_threads(threads);
        let report = Scanner::new(config).unwrap().scan(&pattern).unwrap();

        prop_assert_eq!(&report.result, fixture.ground_truth());
        prop_assert_eq!(report.stats.matches as usize, fixture.ground_truth().total_matches());
    }

    #[test]
    fn shuffled_sequential_scans_agree_across_seeds(
        fixture_seed in any::<u64>(),
        a in any::<u64>(),
        b in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(fixture_seed);
        let pattern = Regex::new("[A-Z]").unwrap();
        let fixture = tally_fixture::generate(&pattern, &mut rng).unwrap();

        let scan = |seed| {
            let config = ScanConfig::new(fixture.root())
                .with_parallel(false)
                .with_order(TraversalOrder::Shuffled { seed });
            Scanner::new(config).unwrap().scan(&pattern).unwrap().result
        };

        prop_assert_eq!(scan(a), scan(b));
    }
}
