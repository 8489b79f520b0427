use std::error::Error;
use tracing::info;
use wmethod::reader::read_table_from_path;
use wmethod::{load, responses, separation_table, DerivationConfig, TestSuite, Traversal};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    // Usage: from_csv [table.csv] [extra states]
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/demos/data/coffee.csv").into());
    let extra_states: usize = args
        .next()
        .map(|n| n.parse::<usize>())
        .transpose()?
        .unwrap_or(0);

    let table = read_table_from_path(&path)?;
    let machine = load(&table)?;
    info!("loaded {} with {} states", path, machine.size());

    let config = DerivationConfig::default()
        .with_traversal(Traversal::BreadthFirst)
        .with_extra_states(extra_states);
    let suite = TestSuite::derive(&machine, &config)?;

    for (k, round) in suite.partitions.iter().enumerate() {
        println!("round {}: {} classes", k, round.len());
    }
    for ((q1, q2), round) in separation_table(&machine, &suite.partitions)? {
        if q1 < q2 {
            println!("{} / {} separate in round {}", q1, q2, round);
        }
    }
    for (state, outputs) in responses(&machine, &suite.characterization)? {
        println!("{} answers W with {:?}", state, outputs);
    }
    for word in &suite.edge_cover {
        println!("edge cover: {}", word.join(" "));
    }
    for word in suite.test_set.words() {
        println!("test: {}", word.join(" "));
    }

    Ok(())
}
