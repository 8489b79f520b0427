use wmethod::{DerivationConfig, MachineBuilder, TestSuite};

fn main() {
    // Prints INFO events to STDOUT.
    tracing_subscriber::fmt::init();

    // Two states that swap on 'x' and stay on 'y', each answering differently.
    let machine = MachineBuilder::new()
        .with_transition("A", 'x', "B", 0)
        .with_transition("A", 'y', "A", 1)
        .with_transition("B", 'x', "A", 1)
        .with_transition("B", 'y', "B", 0)
        .with_initial("A")
        .build()
        .unwrap();

    let suite = TestSuite::derive(&machine, &DerivationConfig::default()).unwrap();

    for (state, path) in suite.state_cover.iter() {
        println!("reach {:?} with {:?}", state, path);
    }
    for word in suite.characterization.words() {
        println!("W contains {:?}", word);
    }
    for (word, outputs) in suite.test_set.expected_outputs(&machine).unwrap() {
        println!("{:?} -> {:?}", word, outputs);
    }
}
