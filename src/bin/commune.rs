//! commune CLI: load an edge list, then explore it interactively.
//! Print the network or its communities, run the optimizers, contract,
//! or remove nodes and edges.

use std::io::{self, BufRead, Write};
use std::process;

use clap::Parser;

use commune::{load_network_csv, merge_communities, ConstantPotts, Modularity, Network};

#[derive(Parser)]
#[command(name = "commune")]
#[command(version)]
#[command(about = "Community detection on weighted edge lists")]
struct Cli {
    /// Edge-list CSV file: header row, then origin,destiny,weight
    #[arg(value_name = "FILE")]
    file: String,

    /// Resolution for CPM runs
    #[arg(long, default_value_t = 1.0)]
    resolution: f64,

    /// Minimum gain threshold for all optimizer runs
    #[arg(long, default_value_t = 1e-6)]
    min_gain: f64,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut net = match load_network_csv(&cli.file) {
        Ok(net) => net,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    println!(
        "loaded {} nodes and {} edges from '{}'",
        net.node_count(),
        net.edge_count(),
        cli.file
    );

    let stdin = io::stdin();
    loop {
        print_menu();
        let Some(choice) = read_line(&stdin) else { break };
        match choice.as_str() {
            "1" => print_network(&net),
            "2" => print_communities(&net),
            "3" => {
                if let Some(id) = prompt_id(&stdin, "node id to remove") {
                    if net.node(id).is_some() {
                        net.remove_node(id);
                        println!("node {id} and its incident edges removed");
                    } else {
                        println!("node {id} does not exist");
                    }
                }
            }
            "4" => {
                if let Some(id) = prompt_id(&stdin, "edge id to remove") {
                    if net.edge(id).is_some() {
                        net.remove_edge(id);
                        println!("edge {id} removed");
                    } else {
                        println!("edge {id} does not exist");
                    }
                }
            }
            "5" => {
                let engine = Modularity::new().with_min_gain(cli.min_gain);
                match engine.run(&mut net) {
                    Ok(()) => print_communities(&net),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "6" => {
                let engine = ConstantPotts::new()
                    .with_resolution(cli.resolution)
                    .with_min_gain(cli.min_gain);
                match engine.run(&mut net) {
                    Ok(()) => print_communities(&net),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "7" => run_parallel(&mut net, cli.resolution, cli.min_gain),
            "8" => {
                merge_communities(&mut net);
                println!(
                    "contracted to {} nodes and {} edges",
                    net.node_count(),
                    net.edge_count()
                );
            }
            "9" | "q" => break,
            other => println!("unrecognized option '{other}'"),
        }
    }
}

#[cfg(feature = "parallel")]
fn run_parallel(net: &mut Network, resolution: f64, min_gain: f64) {
    use commune::ParallelPotts;

    let engine = ParallelPotts::new()
        .with_resolution(resolution)
        .with_min_gain(min_gain);
    match engine.run(net) {
        Ok(()) => print_communities(net),
        Err(e) => eprintln!("error: {e}"),
    }
}

#[cfg(not(feature = "parallel"))]
fn run_parallel(_net: &mut Network, _resolution: f64, _min_gain: f64) {
    println!("parallel support was not compiled in");
}

fn print_menu() {
    println!();
    println!("1. print network");
    println!("2. print communities");
    println!("3. remove a node");
    println!("4. remove an edge");
    println!("5. run modularity");
    println!("6. run CPM");
    println!("7. run CPM (parallel)");
    println!("8. merge communities");
    println!("9. quit");
    print!("> ");
    let _ = io::stdout().flush();
}

fn read_line(stdin: &io::Stdin) -> Option<String> {
    let mut line = String::new();
    match stdin.lock().read_line(&mut line) {
        Ok(0) | Err(_) => None, // EOF or broken input: leave cleanly
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn prompt_id(stdin: &io::Stdin, label: &str) -> Option<u32> {
    print!("{label}: ");
    let _ = io::stdout().flush();
    let line = read_line(stdin)?;
    match line.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            println!("'{line}' is not a valid id");
            None
        }
    }
}

fn print_network(net: &Network) {
    println!(
        "--- network: {} nodes, {} edges ---",
        net.node_count(),
        net.edge_count()
    );
    for node in net.nodes() {
        println!(
            "node {} (community {}, degree {})",
            node.id(),
            node.community(),
            node.degree()
        );
        for &eid in node.adjacency() {
            if let Some(edge) = net.edge(eid) {
                if let Some(opposite) = edge.opposite(node.id()) {
                    println!(
                        "  -> node {} (edge {}, weight {})",
                        opposite,
                        edge.id(),
                        edge.weight()
                    );
                }
            }
        }
    }
}

fn print_communities(net: &Network) {
    let groups = net.communities();
    println!("--- {} communities ---", groups.len());
    for (community, members) in groups {
        let ids: Vec<String> = members.iter().map(u32::to_string).collect();
        println!("  {community}: {{ {} }}", ids.join(" "));
    }
}
