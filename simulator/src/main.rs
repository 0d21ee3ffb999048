use anyhow::Context;
use clap::Parser;
use generator::profile::ScenarioStream;
use generator::template::ScenarioKind;
use gui_bridge::bridge::{bridge_bind_address, GuiBridge};
use gui_bridge::model::AlertBoard;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

fn parse_scenario(value: &str) -> Result<ScenarioKind, String> {
    serde_yaml::from_str(value).map_err(|_| {
        format!(
            "unknown scenario '{}' (head_on, overtaking, crossing, diverging, multi_threat)",
            value
        )
    })
}

#[derive(Parser)]
#[command(author, version, about = "Scenario driver and alert bridge for the TCAS core")]
struct Args {
    /// Run the scenario once offline and emit an alert summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load engine and scenario configuration from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value = "head_on", value_parser = parse_scenario)]
    scenario: ScenarioKind,
    #[arg(long, default_value_t = 600)]
    cycles: usize,
    #[arg(long, default_value_t = 30.0)]
    rate_hz: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Serve the alert board over HTTP and run the scenario live until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.scenario, args.cycles, args.rate_hz, args.seed)
    };

    let runner = Arc::new(Runner::new(workflow_config.engine.clone())?);
    let gui_bridge = GuiBridge::new(runner.clone());

    if args.offline {
        run_offline(&workflow_config, &gui_bridge)?;
    }
    if args.serve {
        serve(&workflow_config, &runner, &gui_bridge)?;
    }
    if !args.offline && !args.serve {
        gui_bridge.publish_status("Nothing to do; pass --offline and/or --serve.");
    }

    Ok(())
}

fn run_offline(config: &WorkflowConfig, gui_bridge: &GuiBridge) -> anyhow::Result<()> {
    let frames = generator::profile::build_frames(&config.scenario, config.cycles)
        .context("generating offline scenario")?;
    // Separate engine so a following --serve run starts from empty tracks.
    let runner = Runner::new(config.engine.clone())?;
    let result = runner.execute(&frames)?;

    println!(
        "Offline run {} -> cycles {}, alerts {}, no-ownship cycles {}, peaks {:?}",
        config.scenario.name(),
        result.reports.len(),
        result.alert_count,
        result.no_ownship_cycles,
        result.peak_levels
    );

    if let Some(last) = result.last() {
        log::info!("final cycle: {}", last.to_json_line().context("serializing final cycle")?);
        gui_bridge.publish(AlertBoard::from_report(last, result.metrics).with_scenario(config.scenario.name()))?;
    }
    gui_bridge.publish_status("Offline scenario results ready.");

    let report = format!(
        "scenario={} cycles={} alerts={} peaks={:?} metrics={}\n",
        config.scenario.name(),
        result.reports.len(),
        result.alert_count,
        result.peak_levels,
        serde_json::to_string(&result.metrics).context("serializing metrics")?
    );
    let report_path = PathBuf::from("tools/data/offline_alerts.log");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&report_path)
        .with_context(|| format!("opening {}", report_path.display()))?;
    file.write_all(report.as_bytes())?;
    Ok(())
}

fn serve(config: &WorkflowConfig, runner: &Runner, gui_bridge: &GuiBridge) -> anyhow::Result<()> {
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the alert bridge")?;

    runtime.block_on(async {
        let (addr, server) = gui_bridge.bind(bridge_bind_address())?;
        tokio::spawn(server);
        gui_bridge.publish_status(&format!(
            "HTTP bridge on http://{} running {} at {:.0} Hz (Ctrl+C to stop)...",
            addr,
            config.scenario.name(),
            config.scenario.rate_hz
        ));

        let mut stream = ScenarioStream::new(config.scenario.clone())?;
        let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / config.scenario.rate_hz));
        let shutdown = signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(frame) = stream.next() else { break };
                    let report = runner.step(&frame)?;
                    gui_bridge.publish(AlertBoard::from_report(&report, runner.metrics()?))?;
                }
                result = &mut shutdown => {
                    result.context("awaiting Ctrl+C to exit")?;
                    break;
                }
            }
        }
        gui_bridge.publish_status("Alert bridge stopped.");
        Ok::<(), anyhow::Error>(())
    })
}
