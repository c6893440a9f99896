mod config;
mod mobility;
mod offloader;

use std::io::Write;

use clap::Parser;
use env_logger::Builder;
use log::info;
use sugars::{rc, refcell};

use edgesim_core::Simulation;
use edgesim_network::{AccessPointMap, NetworkEngine, NodeFailed, NodeTier, StopNetwork, TransferKind};

use crate::config::ScenarioConfig;
use crate::mobility::Mobility;
use crate::offloader::Offloader;

/// Mobile devices offloading tasks to edge datacenters and the cloud over shared links
#[derive(Parser, Debug)]
#[clap(about, long_about = None)]
struct Args {
    /// Path to YAML scenario config, built-in defaults are used if not set
    #[clap(short, long)]
    config: Option<String>,

    /// Random seed
    #[clap(long, default_value_t = 123)]
    seed: u64,

    /// Print network statistics as JSON
    #[clap(long)]
    json: bool,
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(file_name) => ScenarioConfig::from_file(file_name),
        None => ScenarioConfig::default(),
    };

    let mut sim = Simulation::new(args.seed);
    let net = match NetworkEngine::new(config.network.clone(), sim.create_context("net")) {
        Ok(net) => rc!(refcell!(net)),
        Err(err) => {
            eprintln!("Invalid network config: {}", err);
            std::process::exit(1);
        }
    };
    let net_id = sim.add_handler("net", net.clone());

    let cloud = net.borrow_mut().add_node("cloud", NodeTier::Cloud);
    let edges: Vec<_> = (0..config.edge_datacenters)
        .map(|i| net.borrow_mut().add_node(&format!("edge_{}", i), NodeTier::Edge))
        .collect();
    let devices: Vec<_> = (0..config.devices)
        .map(|i| net.borrow_mut().add_node(&format!("device_{}", i), NodeTier::Device))
        .collect();

    let location = rc!(refcell!(AccessPointMap::new()));
    for (i, device) in devices.iter().enumerate() {
        location.borrow_mut().attach(*device, edges[i % edges.len()]);
    }
    net.borrow_mut().set_location_model(location.clone());

    let offloader = rc!(refcell!(Offloader::new(
        net.clone(),
        location.clone(),
        cloud,
        config.clone(),
        sim.create_context("offloader"),
    )));
    let offloader_id = sim.add_handler("offloader", offloader.clone());
    offloader.borrow_mut().start(&devices);

    let mobility = rc!(refcell!(Mobility::new(
        location,
        devices.clone(),
        edges,
        config.mobility_interval,
        config.duration,
        sim.create_context("mobility"),
    )));
    sim.add_handler("mobility", mobility.clone());
    mobility.borrow_mut().start();

    let mut control = sim.create_context("control");
    if let Some(time) = config.device_failure_time {
        control.emit(NodeFailed { node: devices[0] }, net_id, time);
        control.emit(NodeFailed { node: devices[0] }, offloader_id, time);
    }

    net.borrow_mut().start();
    // let the tasks generated near the end finish before teardown
    let drain_time = config.duration * 2.;
    control.emit(StopNetwork {}, net_id, drain_time);
    sim.step_until_no_events();
    info!("Simulation finished at {:.3}", sim.time());

    let net = net.borrow();
    let stats = net.stats();
    println!(
        "Transfers: {} submitted, {} completed, {} abandoned, {} unfinished",
        stats.submitted,
        stats.completed,
        stats.abandoned,
        net.active_transfers().len() + net.pending_transfers().len()
    );
    for kind in TransferKind::ALL {
        println!(
            "  {:?}: {} completed, {:.1} kbit moved",
            kind,
            stats.completed_by_kind.get(&kind).copied().unwrap_or(0),
            stats.volume_by_kind.get(&kind).copied().unwrap_or(0.)
        );
    }
    println!("LAN usage time: {:.3} s", stats.lan_usage_time);
    println!("WAN usage time: {:.3} s", stats.wan_usage_time);
    println!("Average transfer bandwidth: {:.3} kbit/s", stats.average_transfer_bandwidth());
    println!("Average WAN utilization: {:.3} %", net.average_wan_utilization());

    let offloader = offloader.borrow();
    let latencies = offloader.latencies();
    let mean_latency = if latencies.is_empty() {
        0.
    } else {
        latencies.iter().sum::<f64>() / latencies.len() as f64
    };
    println!(
        "Tasks: {} generated, {} finished, mean latency {:.3} s",
        offloader.generated_tasks(),
        latencies.len(),
        mean_latency
    );

    if args.json {
        match serde_json::to_string_pretty(stats) {
            Ok(json) => println!("{}", json),
            Err(err) => eprintln!("Can't serialize statistics: {}", err),
        }
    }
}
