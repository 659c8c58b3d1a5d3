//! Panel sessions against the in-process host

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use deck_control::{Notice, SerialPanel, TransitionOutcome, WebsocketPanel};
use deck_gateway::CommandGateway;
use deck_host::{FixedPorts, HostBackend, PortSource, SystemPorts};
use tokio::sync::mpsc;

use crate::settings::Settings;

/// Build the host the panels talk to
fn build_host(settings: &Settings) -> Arc<HostBackend> {
    let ports: Box<dyn PortSource> = if settings.use_system_ports {
        Box::new(SystemPorts::new(settings.host.skip_patterns.clone()))
    } else {
        Box::new(FixedPorts::new(settings.simulated_ports.iter().cloned()))
    };
    Arc::new(HostBackend::new(settings.host.clone(), ports))
}

/// Report a notice via tracing
fn report_notice(notice: &Notice) {
    if notice.is_error() {
        tracing::warn!(source = "Notice", "{}", notice);
    } else {
        tracing::info!(source = "Notice", "{}", notice);
    }
}

/// Report a start or stop outcome that did not complete
fn report_outcome(source: &str, outcome: &TransitionOutcome) {
    match outcome {
        TransitionOutcome::Completed(_) => {}
        TransitionOutcome::Failed(message) => tracing::error!(source = source, "{}", message),
        TransitionOutcome::Rejected(err) => tracing::warn!(source = source, "{}", err),
    }
}

fn drain(notices: &mut mpsc::UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        report_notice(&notice);
    }
}

/// Refresh the catalog and print it
pub async fn list_ports(settings: &Settings) -> Result<()> {
    let host = build_host(settings);
    let mut panel = SerialPanel::mount(
        CommandGateway::new(host.clone()),
        Arc::new(host.events()),
        &settings.controller_config(),
    );

    let ports = panel.refresh_ports().await?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}", port);
    }

    panel.unmount();
    Ok(())
}

/// Start both services, print readings for `duration`, then stop them
pub async fn run(settings: &Settings, duration: Duration) -> Result<()> {
    let host = build_host(settings);
    let gateway = CommandGateway::new(host.clone());
    let controller_config = settings.controller_config();
    let (notice_tx, mut notices) = mpsc::unbounded_channel();

    let mut serial = SerialPanel::mount(gateway.clone(), Arc::new(host.events()), &controller_config)
        .with_notices(notice_tx.clone());
    let mut ws = WebsocketPanel::mount(gateway, &controller_config).with_notices(notice_tx);

    serial.refresh_ports().await?;
    let port = match &settings.serial_port {
        Some(port) => port.clone(),
        None => serial
            .ports()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("No serial ports available"))?,
    };
    serial.select_port(&port)?;
    serial.set_baud_rate(settings.baud_rate)?;
    ws.set_port(settings.ws_port)?;

    let (serial_started, ws_started) = tokio::join!(serial.start(), ws.start());
    report_outcome("Serial", &serial_started);
    report_outcome("Websocket", &ws_started);
    drain(&mut notices);

    if let Some(address) = ws.address() {
        println!("Websocket server at {}", address);
    }

    if serial.state().is_running() {
        println!("Reading {} at {} baud", port, serial.baud_rate());
        let mut readings = serial.watch_reading();
        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                _ = tokio::signal::ctrl_c() => break,
                changed = readings.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    println!("{}", *readings.borrow_and_update());
                }
                Some(notice) = notices.recv() => report_notice(&notice),
            }
        }
    }

    if serial.state().is_running() {
        report_outcome("Serial", &serial.stop().await);
    }
    if ws.state().is_running() {
        report_outcome("Websocket", &ws.stop().await);
    }
    drain(&mut notices);

    let failure = serial.state().last_error;
    serial.unmount();
    ws.unmount();

    match (serial_started, failure) {
        (TransitionOutcome::Completed(_), _) => Ok(()),
        (_, Some(message)) => bail!("Serial bridge did not start: {}", message),
        (outcome, None) => bail!("Serial bridge did not start: {:?}", outcome),
    }
}
