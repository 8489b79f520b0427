use std::fs::write;
use wmethod::gviz::GvGraph;
use wmethod::MachineBuilder;

fn main() {
    tracing_subscriber::fmt::init();

    // A counter modulo three that reports when it wraps around.
    let machine = MachineBuilder::new()
        .with_transition(0, '+', 1, false)
        .with_transition(1, '+', 2, false)
        .with_transition(2, '+', 0, true)
        .with_transition(0, '0', 0, false)
        .with_transition(1, '0', 0, false)
        .with_transition(2, '0', 0, false)
        .with_initial(0)
        .with_final(0)
        .build()
        .unwrap();

    let gv = GvGraph::from(&machine);
    write::<_, String>("machine.gv", gv.into()).unwrap();
}
